use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use collection::{
    afk::AfkEvaluator,
    collector::{ActivityEvent, CollectorTimings, DataCollectionModule},
};
use processing::{heartbeat::HeartbeatProcessor, ProcessingModule};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    apps::enumeration::RunningProcessEnumerator,
    context::AgentContext,
    heartbeat::{CliHeartbeatSender, HeartbeatEngine, HeartbeatSender},
    settings::LogSink,
    utils::clock::{Clock, DefaultClock},
    window_api::{GenericWindowManager, WindowManager},
};

pub mod args;
pub mod collection;
pub mod processing;
pub mod shutdown;

const FOCUS_CHECK_INTERVAL: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_secs(5);
const IDLE_THRESHOLD_SECONDS: u32 = 120;

/// Where the daemon keeps its state and how it reports.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub app_dir: PathBuf,
    pub user_config: PathBuf,
    pub cli: PathBuf,
}

/// Represents the starting point for the daemon
pub async fn start_daemon(config: DaemonConfig, log_sink: Option<Arc<dyn LogSink>>) -> Result<()> {
    std::env::set_current_dir("/")?;
    info!("Starting daemon with {config:?}");

    let ctx = Arc::new(AgentContext::open(
        &config.app_dir,
        config.user_config.clone(),
        Box::new(RunningProcessEnumerator),
        log_sink,
    ));
    if let Err(e) = ctx.registry.initialize_defaults() {
        warn!("Failed to enable default applications: {e:?}");
    }
    if ctx.settings.api_key().is_none() {
        warn!("No api key configured, heartbeats rely on the reporting tool's own config");
    }

    let (sender, receiver) = mpsc::channel::<ActivityEvent>(10);
    let manager = GenericWindowManager::new()?;

    let shutdown_token = CancellationToken::new();

    // Platform key listeners feed this channel. None is compiled in yet, so only focus changes
    // and polls produce activity.
    let collector = create_collector(sender, manager, None, &shutdown_token, DefaultClock);

    let processor = create_processor(ctx, Arc::new(CliHeartbeatSender::new(config.cli)), receiver);

    let (_, collection_result, processing_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        collector.run(),
        processor.run(),
    );

    if let Err(collection_result) = collection_result {
        error!("Collection module got an error {:?}", collection_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    info!("Daemon stopped");
    Ok(())
}

fn create_collector(
    sender: mpsc::Sender<ActivityEvent>,
    manager: impl WindowManager + 'static,
    key_presses: Option<mpsc::Receiver<()>>,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
) -> DataCollectionModule {
    DataCollectionModule::new(
        sender,
        Box::new(manager),
        key_presses,
        shutdown_token.clone(),
        AfkEvaluator::from_seconds(IDLE_THRESHOLD_SECONDS),
        CollectorTimings {
            focus_frequency: FOCUS_CHECK_INTERVAL,
            poll_frequency: POLL_INTERVAL,
        },
        Box::new(clock),
    )
}

fn create_processor(
    ctx: Arc<AgentContext>,
    sender: Arc<dyn HeartbeatSender>,
    receiver: mpsc::Receiver<ActivityEvent>,
) -> ProcessingModule<HeartbeatProcessor> {
    let engine = HeartbeatEngine::new(sender);
    ProcessingModule::new(receiver, HeartbeatProcessor::new(ctx, engine))
}
