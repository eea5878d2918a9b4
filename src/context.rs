use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    apps::{enumeration::AppEnumerator, AppRegistry},
    settings::{LogSink, Settings},
    utils::dir::internal_config_path,
};

/// State shared by everything that runs inside one agent process.
pub struct AgentContext {
    pub settings: Arc<Settings>,
    pub registry: AppRegistry,
}

impl AgentContext {
    pub fn new(settings: Arc<Settings>, registry: AppRegistry) -> Self {
        Self { settings, registry }
    }

    /// Builds the context over the files kept in `app_dir` and the user config at `user_config`.
    pub fn open(
        app_dir: &Path,
        user_config: PathBuf,
        enumerator: Box<dyn AppEnumerator>,
        log_sink: Option<Arc<dyn LogSink>>,
    ) -> Self {
        let mut settings = Settings::new(user_config, internal_config_path(app_dir));
        if let Some(sink) = log_sink {
            settings = settings.with_log_sink(sink);
        }
        let settings = Arc::new(settings);
        let registry = AppRegistry::new(settings.clone(), enumerator, app_dir);
        Self::new(settings, registry)
    }
}
