//! Decides when activity is reported.
//!
//! [HeartbeatEngine] remembers the last heartbeat and lets a new one through when something
//! changed, when the user wrote something, or when enough time passed since the last one.
//! Everything else is dropped, so callers may offer activity as often as they like.

pub mod args;
pub mod sender;

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::{
    apps::AppData,
    classifier::{Category, Classification},
    context::AgentContext,
    window_api::WindowInfo,
};

pub use args::{plugin, HeartbeatArgs};
pub use sender::{CliHeartbeatSender, HeartbeatSender};

/// Longest time the same activity goes unreported.
pub const HEARTBEAT_INTERVAL_SECONDS: i64 = 120;

/// A classified window, ready to be reported.
#[derive(Debug, Clone)]
pub struct Activity {
    pub app_path: String,
    pub app_name: Option<String>,
    pub classification: Classification,
}

impl Activity {
    pub fn new(window: &WindowInfo, app: Option<&AppData>, classification: Classification) -> Self {
        let app_name = app
            .map(|v| v.name.clone())
            .or_else(|| Some(window.display_name.clone()))
            .filter(|v| !v.is_empty());
        Self {
            app_path: window.process_path.clone(),
            app_name,
            classification,
        }
    }

    fn category(&self) -> Category {
        self.classification.category.unwrap_or(Category::Coding)
    }
}

#[derive(Debug, Default)]
struct HeartbeatState {
    last_entity: String,
    last_category: Option<Category>,
    last_sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    Emit(HeartbeatArgs),
    /// Same activity as the last heartbeat, which is still recent.
    Throttled,
    NotMonitored,
    Unnamed,
}

pub struct HeartbeatEngine {
    state: HeartbeatState,
    sender: Arc<dyn HeartbeatSender>,
    plugin: String,
}

impl HeartbeatEngine {
    pub fn new(sender: Arc<dyn HeartbeatSender>) -> Self {
        Self {
            state: HeartbeatState::default(),
            sender,
            plugin: plugin(),
        }
    }

    /// Updates the state as if the heartbeat was already sent when the result is
    /// [Decision::Emit].
    pub fn decide(
        &mut self,
        ctx: &AgentContext,
        activity: &Activity,
        is_write: bool,
        now: DateTime<Utc>,
    ) -> Decision {
        if !ctx.registry.is_monitored(&activity.app_path) {
            return Decision::NotMonitored;
        }
        if activity.app_name.is_none() {
            return Decision::Unnamed;
        }

        let entity = &activity.classification.entity;
        let category = activity.category();
        let expired = self
            .state
            .last_sent_at
            .map_or(true, |v| now - v >= TimeDelta::seconds(HEARTBEAT_INTERVAL_SECONDS));
        let should_emit = is_write
            || self.state.last_category != Some(category)
            || (!entity.is_empty() && *entity != self.state.last_entity)
            || expired;
        if !should_emit {
            return Decision::Throttled;
        }

        self.state = HeartbeatState {
            last_entity: entity.clone(),
            last_category: Some(category),
            last_sent_at: Some(now),
        };
        let classification = &activity.classification;
        Decision::Emit(HeartbeatArgs {
            entity: entity.clone(),
            entity_type: classification.entity_type,
            category,
            plugin: self.plugin.clone(),
            project: classification.project.clone(),
            language: classification.language.map(str::to_string),
            is_write,
            api_key: ctx.settings.api_key(),
        })
    }

    /// Sends the heartbeat in the background when [HeartbeatEngine::decide] lets it through.
    /// Failed sends are logged and dropped.
    pub fn maybe_emit(
        &mut self,
        ctx: &AgentContext,
        activity: &Activity,
        is_write: bool,
        now: DateTime<Utc>,
    ) -> Option<JoinHandle<()>> {
        let args = match self.decide(ctx, activity, is_write, now) {
            Decision::Emit(args) => args,
            decision => {
                debug!("Skipping heartbeat for {}: {decision:?}", activity.app_path);
                return None;
            }
        };

        info!("Sending heartbeat {} ({})", args.entity, args.category);
        let sender = self.sender.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = sender.send(args).await {
                error!("Failed to send heartbeat: {e:?}");
            }
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use anyhow::{anyhow, Result};
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use tempfile::TempDir;

    use super::{sender::MockHeartbeatSender, Activity, Decision, HeartbeatEngine};
    use crate::{
        apps::{catalog::find_by_id, enumeration::MockAppEnumerator, AppData, AppRegistry},
        classifier::{Category, Classification, EntityType},
        context::AgentContext,
        settings::tests::temp_settings,
    };

    pub(crate) const EDITOR_PATH: &str = "/usr/bin/editor";
    pub(crate) const ZOOM_PATH: &str = "/usr/bin/zoom";

    /// Context where the editor is monitored and zoom isn't.
    pub(crate) fn test_context() -> Result<(TempDir, AgentContext)> {
        let (dir, settings) = temp_settings()?;
        let settings = Arc::new(settings);
        let mut enumerator = MockAppEnumerator::new();
        enumerator.expect_installed_apps().returning(|| {
            Ok(vec![
                AppData::unknown(EDITOR_PATH, "Editor"),
                find_by_id("zoom").unwrap().to_app_data(ZOOM_PATH),
            ])
        });
        let registry = AppRegistry::new(settings.clone(), Box::new(enumerator), dir.path());
        registry.set_monitored_path(EDITOR_PATH, true)?;
        Ok((dir, AgentContext::new(settings, registry)))
    }

    fn activity(path: &str, entity: &str, category: Option<Category>) -> Activity {
        Activity {
            app_path: path.into(),
            app_name: Some("Editor".into()),
            classification: Classification {
                entity: entity.into(),
                entity_type: EntityType::App,
                category,
                language: None,
                project: None,
            },
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 7, 4, 12, 0, 0).unwrap()
    }

    fn engine() -> HeartbeatEngine {
        HeartbeatEngine::new(Arc::new(MockHeartbeatSender::new()))
    }

    #[test]
    fn test_engine_deduplicates() -> Result<()> {
        let (_dir, ctx) = test_context()?;
        let mut engine = engine();
        let activity = activity(EDITOR_PATH, "main.rs", None);

        let Decision::Emit(args) = engine.decide(&ctx, &activity, false, start()) else {
            panic!("first heartbeat should be emitted");
        };
        assert_eq!(args.category, Category::Coding);
        assert_eq!(args.entity, "main.rs");

        let later = start() + TimeDelta::seconds(30);
        assert_eq!(engine.decide(&ctx, &activity, false, later), Decision::Throttled);
        Ok(())
    }

    #[test]
    fn test_engine_write_forces_emit() -> Result<()> {
        let (_dir, ctx) = test_context()?;
        let mut engine = engine();
        let activity = activity(EDITOR_PATH, "main.rs", None);

        engine.decide(&ctx, &activity, false, start());
        let Decision::Emit(args) =
            engine.decide(&ctx, &activity, true, start() + TimeDelta::seconds(1))
        else {
            panic!("write should force a heartbeat");
        };
        assert!(args.is_write);
        Ok(())
    }

    #[test]
    fn test_engine_category_change_emits() -> Result<()> {
        let (_dir, ctx) = test_context()?;
        let mut engine = engine();

        engine.decide(&ctx, &activity(EDITOR_PATH, "main.rs", None), false, start());
        let decision = engine.decide(
            &ctx,
            &activity(EDITOR_PATH, "main.rs", Some(Category::Debugging)),
            false,
            start() + TimeDelta::seconds(1),
        );
        assert!(matches!(decision, Decision::Emit(_)));
        Ok(())
    }

    #[test]
    fn test_engine_entity_change_emits_unless_empty() -> Result<()> {
        let (_dir, ctx) = test_context()?;
        let mut engine = engine();
        let now = start() + TimeDelta::seconds(1);

        engine.decide(&ctx, &activity(EDITOR_PATH, "main.rs", None), false, start());
        assert!(matches!(
            engine.decide(&ctx, &activity(EDITOR_PATH, "lib.rs", None), false, now),
            Decision::Emit(_)
        ));
        assert_eq!(
            engine.decide(&ctx, &activity(EDITOR_PATH, "", None), false, now),
            Decision::Throttled
        );
        Ok(())
    }

    #[test]
    fn test_engine_interval_expiry() -> Result<()> {
        let (_dir, ctx) = test_context()?;
        let mut engine = engine();
        let activity = activity(EDITOR_PATH, "main.rs", None);

        engine.decide(&ctx, &activity, false, start());
        assert_eq!(
            engine.decide(&ctx, &activity, false, start() + TimeDelta::seconds(119)),
            Decision::Throttled
        );
        assert!(matches!(
            engine.decide(&ctx, &activity, false, start() + TimeDelta::seconds(120)),
            Decision::Emit(_)
        ));
        Ok(())
    }

    #[test]
    fn test_engine_guard() -> Result<()> {
        let (_dir, ctx) = test_context()?;
        let mut engine = engine();

        assert_eq!(
            engine.decide(&ctx, &activity(ZOOM_PATH, "Standup", None), true, start()),
            Decision::NotMonitored
        );

        let mut unnamed = activity(EDITOR_PATH, "main.rs", None);
        unnamed.app_name = None;
        assert_eq!(
            engine.decide(&ctx, &unnamed, true, start()),
            Decision::Unnamed
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_engine_maybe_emit_sends_in_background() -> Result<()> {
        let (_dir, ctx) = test_context()?;
        ctx.settings.set_api_key("waka_0000")?;
        let mut sender = MockHeartbeatSender::new();
        sender
            .expect_send()
            .withf(|args| args.entity == "main.rs" && args.api_key.as_deref() == Some("waka_0000"))
            .times(1)
            .returning(|_| Err(anyhow!("offline")));
        let mut engine = HeartbeatEngine::new(Arc::new(sender));
        let activity = activity(EDITOR_PATH, "main.rs", None);

        let handle = engine.maybe_emit(&ctx, &activity, false, start());
        handle.expect("heartbeat should be emitted").await?;

        assert!(engine
            .maybe_emit(&ctx, &activity, false, start() + TimeDelta::seconds(5))
            .is_none());
        Ok(())
    }
}
