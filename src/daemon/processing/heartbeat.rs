use std::sync::Arc;

use anyhow::Result;
use tokio::task::{self, JoinHandle};
use tracing::{debug, warn};

use crate::{
    classifier::classify,
    context::AgentContext,
    daemon::collection::collector::ActivityEvent,
    heartbeat::{Activity, HeartbeatEngine},
};

use super::module::EventProcessor;

/// Classifies collected windows and feeds them to the [HeartbeatEngine].
pub struct HeartbeatProcessor {
    ctx: Arc<AgentContext>,
    engine: HeartbeatEngine,
    in_flight: Vec<JoinHandle<()>>,
}

impl HeartbeatProcessor {
    pub fn new(ctx: Arc<AgentContext>, engine: HeartbeatEngine) -> Self {
        Self {
            ctx,
            engine,
            in_flight: vec![],
        }
    }
}

impl EventProcessor for HeartbeatProcessor {
    async fn process_next(&mut self, message: ActivityEvent) -> Result<()> {
        // Resolving may enumerate applications and reads the config files.
        let ctx = self.ctx.clone();
        let window = message.window.clone();
        let (app, classification) = task::spawn_blocking(move || {
            let app = ctx.registry.resolve(&window);
            let classification = classify(&ctx.settings, &window, app.as_ref());
            (app, classification)
        })
        .await?;

        let window = &message.window;
        let Some(classification) = classification else {
            debug!("Nothing to report for {}", window.process_path);
            return Ok(());
        };

        let activity = Activity::new(window, app.as_ref(), classification);
        self.in_flight.retain(|handle| !handle.is_finished());
        if let Some(handle) =
            self.engine
                .maybe_emit(&self.ctx, &activity, message.is_write, message.timestamp)
        {
            self.in_flight.push(handle);
        }
        Ok(())
    }

    /// Waits for heartbeats that are still being sent.
    async fn finalize(&mut self) -> Result<()> {
        for handle in self.in_flight.drain(..) {
            if let Err(e) = handle.await {
                warn!("Heartbeat task failed: {e:?}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        thread,
    };

    use anyhow::Result;
    use chrono::Utc;

    use super::HeartbeatProcessor;
    use crate::{
        apps::{enumeration::MockAppEnumerator, AppData, AppRegistry},
        context::AgentContext,
        daemon::{
            collection::collector::{ActivityEvent, Trigger},
            processing::module::EventProcessor,
        },
        heartbeat::{sender::MockHeartbeatSender, tests::EDITOR_PATH, HeartbeatEngine},
        settings::tests::temp_settings,
        utils::logging::TEST_LOGGING,
        window_api::WindowInfo,
    };

    #[tokio::test]
    async fn test_application_lookup_leaves_the_runtime_thread() -> Result<()> {
        *TEST_LOGGING;
        let (dir, settings) = temp_settings()?;
        let settings = Arc::new(settings);
        settings.set_monitored_flag(EDITOR_PATH, true)?;

        let runtime_thread = thread::current().id();
        let lookups = Arc::new(Mutex::new(vec![]));
        let seen = lookups.clone();
        let mut enumerator = MockAppEnumerator::new();
        enumerator.expect_installed_apps().returning(move || {
            seen.lock().unwrap().push(thread::current().id());
            Ok(vec![AppData::unknown(EDITOR_PATH, "Editor")])
        });
        let registry = AppRegistry::new(settings.clone(), Box::new(enumerator), dir.path());
        let ctx = Arc::new(AgentContext::new(settings, registry));

        let mut sender = MockHeartbeatSender::new();
        sender
            .expect_send()
            .withf(|args| args.entity == "main.rs")
            .times(1)
            .returning(|_| Ok(()));
        let mut processor = HeartbeatProcessor::new(ctx, HeartbeatEngine::new(Arc::new(sender)));

        processor
            .process_next(ActivityEvent {
                window: WindowInfo {
                    process_path: EDITOR_PATH.into(),
                    display_name: "editor".into(),
                    title: "main.rs - Editor".into(),
                    ..Default::default()
                },
                trigger: Trigger::FocusChange,
                is_write: false,
                timestamp: Utc::now(),
            })
            .await?;
        processor.finalize().await?;

        let lookups = lookups.lock().unwrap();
        assert!(!lookups.is_empty());
        assert!(lookups.iter().all(|v| *v != runtime_thread));
        Ok(())
    }
}
