use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Trips the token once the process is asked to stop. The token may also be cancelled elsewhere,
/// which ends the wait.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(_) => {
                    info!("Received shutdown signal");
                    cancelation.cancel();
                }
                Err(e) => {
                    warn!("Can't listen for shutdown signals: {e:?}");
                    cancelation.cancelled().await;
                }
            }
        },
        _ = cancelation.cancelled() => (),
    };
}
