use anyhow::Result;

use crate::daemon::collection::collector::ActivityEvent;

/// Represents an event processor. Implementations decide what collected activity turns into,
/// for example heartbeats handed to the reporting tool.
pub trait EventProcessor {
    fn process_next(
        &mut self,
        message: ActivityEvent,
    ) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
