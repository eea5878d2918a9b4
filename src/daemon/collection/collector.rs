use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, trace, Instrument};

use crate::{
    utils::clock::Clock,
    window_api::{WindowInfo, WindowManager},
};

use super::afk::AfkEvaluator;

/// What made the collector look at the focused window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    FocusChange,
    KeyPress,
    Poll,
}

#[derive(Debug, Clone)]
pub struct ActivityEvent {
    pub window: WindowInfo,
    pub trigger: Trigger,
    pub is_write: bool,
    pub timestamp: DateTime<Utc>,
}

pub struct CollectorTimings {
    /// How often the focused window is compared to the previous one.
    pub focus_frequency: Duration,
    /// How often the focused window is reported while the user is present.
    pub poll_frequency: Duration,
}

pub struct DataCollectionModule {
    next: mpsc::Sender<ActivityEvent>,
    producer: Box<dyn WindowManager>,
    key_presses: Option<mpsc::Receiver<()>>,
    shutdown: CancellationToken,
    afk_evaluator: AfkEvaluator,
    timings: CollectorTimings,
    time_provider: Box<dyn Clock>,
    last_window: Option<WindowInfo>,
}

impl DataCollectionModule {
    pub fn new(
        next: mpsc::Sender<ActivityEvent>,
        producer: Box<dyn WindowManager>,
        key_presses: Option<mpsc::Receiver<()>>,
        shutdown: CancellationToken,
        afk_evaluator: AfkEvaluator,
        timings: CollectorTimings,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            producer,
            key_presses,
            shutdown,
            afk_evaluator,
            timings,
            time_provider,
            last_window: None,
        }
    }

    fn event(&self, window: WindowInfo, trigger: Trigger) -> ActivityEvent {
        ActivityEvent {
            window,
            trigger,
            is_write: false,
            timestamp: self.time_provider.time(),
        }
    }

    fn check_focus(&mut self) -> Result<Option<ActivityEvent>> {
        let window = self.producer.get_active_window()?;
        let changed = self
            .last_window
            .as_ref()
            .map_or(true, |last| last.differs_from(&window));
        if !changed {
            return Ok(None);
        }
        debug!(
            "Focus moved from {:?} to {:?}",
            self.last_window.as_ref().map(|v| &v.display_name),
            window.display_name
        );
        self.last_window = Some(window.clone());
        Ok(Some(self.event(window, Trigger::FocusChange)))
    }

    fn poll(&mut self) -> Result<Option<ActivityEvent>> {
        let idle_ms = self.producer.get_idle_time()?;
        if self.afk_evaluator.is_afk(idle_ms) {
            trace!("User is away for {idle_ms}ms, skipping poll");
            return Ok(None);
        }
        let window = self.producer.get_active_window()?;
        Ok(Some(self.event(window, Trigger::Poll)))
    }

    /// Keys are never inspected, a press only means the user is working in the focused window.
    fn key_press(&mut self) -> Result<Option<ActivityEvent>> {
        let window = self.producer.get_active_window()?;
        Ok(Some(self.event(window, Trigger::KeyPress)))
    }

    async fn next_key_press(keys: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
        match keys {
            Some(receiver) => receiver.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Executes the collector event loop.
    pub async fn run(mut self) -> Result<()> {
        let start = self.time_provider.instant();
        let mut focus_point = start;
        let mut poll_point = start + self.timings.poll_frequency;
        let mut keys = self.key_presses.take();

        loop {
            let collected = tokio::select! {
                // Cancelation means we stop execution of the event loop. Which means we also drop
                // the sender channel and consequently stop processing module.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(focus_point) => {
                    focus_point += self.timings.focus_frequency;
                    self.check_focus()
                }
                _ = self.time_provider.sleep_until(poll_point) => {
                    poll_point += self.timings.poll_frequency;
                    self.poll()
                }
                pressed = Self::next_key_press(&mut keys) => {
                    if pressed.is_none() {
                        debug!("Key listener went away");
                        keys = None;
                        continue;
                    }
                    self.key_press()
                }
            };

            match collected {
                Ok(Some(event)) => {
                    let span = info_span!("Processing collected data", trigger = ?event.trigger);
                    self.next
                        .send(event)
                        .instrument(span)
                        .await
                        .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
                }
                Ok(None) => (),
                Err(e) => {
                    error!("Encountered an error during collection {:?}", e)
                }
            }
        }
    }
}
