use crate::classifier::{Category, EntityType};

/// Identifies this agent to the reporting tool, for example `linux-deskbeat/0.1.0`.
pub fn plugin() -> String {
    format!(
        "{}-{}/{}",
        std::env::consts::OS,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

/// A single heartbeat, as handed to the reporting tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatArgs {
    pub entity: String,
    pub entity_type: EntityType,
    pub category: Category,
    pub plugin: String,
    pub project: Option<String>,
    pub language: Option<String>,
    pub is_write: bool,
    pub api_key: Option<String>,
}

impl HeartbeatArgs {
    pub fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "--entity".to_string(),
            self.entity.clone(),
            "--entity-type".to_string(),
            self.entity_type.to_string(),
            "--category".to_string(),
            self.category.to_string(),
            "--plugin".to_string(),
            self.plugin.clone(),
        ];
        if let Some(project) = &self.project {
            args.extend(["--project".to_string(), project.clone()]);
        }
        if let Some(language) = &self.language {
            args.extend(["--language".to_string(), language.clone()]);
        }
        if self.is_write {
            args.push("--write".to_string());
        }
        if let Some(key) = &self.api_key {
            args.extend(["--key".to_string(), key.clone()]);
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::{plugin, HeartbeatArgs};
    use crate::classifier::{Category, EntityType};

    #[test]
    fn test_cli_args() {
        let mut args = HeartbeatArgs {
            entity: "Logo".into(),
            entity_type: EntityType::App,
            category: Category::Designing,
            plugin: "linux-deskbeat/0.1.0".into(),
            project: None,
            language: Some("Image (svg)".into()),
            is_write: false,
            api_key: None,
        };
        assert_eq!(
            args.to_cli_args(),
            [
                "--entity",
                "Logo",
                "--entity-type",
                "app",
                "--category",
                "designing",
                "--plugin",
                "linux-deskbeat/0.1.0",
                "--language",
                "Image (svg)",
            ]
        );

        args.is_write = true;
        args.project = Some("team/repo".into());
        args.api_key = Some("waka_0000".into());
        let rendered = args.to_cli_args();
        assert!(rendered.ends_with(&[
            "--language".to_string(),
            "Image (svg)".to_string(),
            "--write".to_string(),
            "--key".to_string(),
            "waka_0000".to_string(),
        ]));
        assert!(rendered.contains(&"team/repo".to_string()));
    }

    #[test]
    fn test_plugin_names_the_agent() {
        let plugin = plugin();
        assert!(plugin.starts_with(std::env::consts::OS));
        assert!(plugin.contains("-deskbeat/"));
    }
}
