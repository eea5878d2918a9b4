use anyhow::Result;
use module::EventProcessor;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, trace};

use super::collection::collector::ActivityEvent;

pub mod heartbeat;
pub mod module;

/// Receives collected activity and hands it to a processor one event at a time, so the
/// processor never observes two events concurrently.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<ActivityEvent>,
    processor: Processor,
}

impl<P: EventProcessor> ProcessingModule<P> {
    pub fn new(receiver: Receiver<ActivityEvent>, processor: P) -> Self {
        Self {
            receiver,
            processor,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.receiver.recv().await {
            trace!("Processing event {:?}", event);
            let trigger = event.trigger;
            match self.processor.process_next(event).await {
                Ok(_) => {
                    debug!("Processed {:?} event", trigger)
                }
                Err(e) => {
                    error!("Error processing {:?} event: {e:?}", trigger)
                }
            }
        }

        let result = self.processor.finalize().await;
        self.receiver.close();
        result
    }
}
