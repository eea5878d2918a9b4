use std::fmt::Display;

/// Kind of work a heartbeat is attributed to. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Browsing,
    Coding,
    Communicating,
    Debugging,
    Designing,
    Meeting,
    WritingDocs,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Browsing => "browsing",
            Category::Coding => "coding",
            Category::Communicating => "communicating",
            Category::Debugging => "debugging",
            Category::Designing => "designing",
            Category::Meeting => "meeting",
            Category::WritingDocs => "writing docs",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    App,
    Url,
    Domain,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::App => "app",
            EntityType::Url => "url",
            EntityType::Domain => "domain",
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a window is showing, in the terms heartbeats are reported in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub entity: String,
    pub entity_type: EntityType,
    /// `None` for applications without a known category.
    pub category: Option<Category>,
    pub language: Option<&'static str>,
    pub project: Option<String>,
}
