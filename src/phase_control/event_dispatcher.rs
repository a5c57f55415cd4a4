use super::commander::{CommanderError, SharedCommander};
use crate::flight_control::{TrackingError, TrackingEvent, TrackingMessage, TrackingSource};
use crate::{error, event, fatal, info, warn};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tokio_util::sync::CancellationToken;

/// Depth of the queue between the tracking source and the dispatcher.
pub const TRACKING_QUEUE_DEPTH: usize = 32;

/// Creates the bounded single-consumer queue that decouples tracker traffic
/// from dispatching.
pub fn tracking_queue() -> (Sender<TrackingMessage>, Receiver<TrackingMessage>) {
    mpsc::channel(TRACKING_QUEUE_DEPTH)
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct DispatchSummary {
    pub delivered: u64,
    pub rejected: u64,
    pub overflowed: u64,
    pub link_errors: u64,
}

/// Pumps a [`TrackingSource`] into the tracking queue.
///
/// Undecodable messages are dropped here. When the dispatcher falls behind,
/// new messages are dropped rather than queued: a tracking signal only
/// matters while it is fresh.
pub struct TrackingListener<S: TrackingSource> {
    source: S,
    tx: Sender<TrackingMessage>,
}

impl<S: TrackingSource> TrackingListener<S> {
    pub fn new(source: S, tx: Sender<TrackingMessage>) -> Self { Self { source, tx } }

    pub async fn run(mut self, c_tok: CancellationToken) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        loop {
            let next = tokio::select! {
                () = c_tok.cancelled() => break,
                next = self.source.next_message() => next,
            };
            match next {
                Some(Ok(msg)) => match self.tx.try_send(msg) {
                    Ok(()) => summary.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        summary.overflowed += 1;
                        event!("Tracking queue full, dropping message.");
                    }
                    Err(TrySendError::Closed(_)) => {
                        info!("Tracking queue closed. Stopping listener.");
                        break;
                    }
                },
                Some(Err(e @ TrackingError::Io { .. })) => {
                    summary.link_errors += 1;
                    error!("{e}");
                }
                Some(Err(e)) => {
                    summary.rejected += 1;
                    warn!("InvalidTrackingEvent dropped: {e}");
                }
                None => {
                    info!("Tracking source closed. Stopping listener.");
                    break;
                }
            }
        }
        summary
    }
}

/// Delivers tracking events to whichever controller is active at delivery
/// time.
pub struct EventDispatcher {
    commander: SharedCommander,
    rx: Receiver<TrackingMessage>,
}

impl EventDispatcher {
    pub fn new(commander: SharedCommander, rx: Receiver<TrackingMessage>) -> Self {
        Self { commander, rx }
    }

    pub async fn run(mut self, c_tok: CancellationToken) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        loop {
            let msg = tokio::select! {
                () = c_tok.cancelled() => break,
                msg = self.rx.recv() => msg,
            };
            let Some(msg) = msg else {
                info!("Tracking queue closed. Stopping dispatcher.");
                break;
            };
            if self.deliver(msg).await {
                summary.delivered += 1;
            } else {
                summary.rejected += 1;
            }
        }
        summary
    }

    /// Validates and delivers a single message.
    ///
    /// # Returns
    /// `false` if the message was dropped as invalid.
    pub async fn deliver(&self, msg: TrackingMessage) -> bool {
        let tracking_event = match TrackingEvent::try_from(msg) {
            Ok(ev) => ev,
            Err(e) => {
                warn!("InvalidTrackingEvent dropped: {e}");
                return false;
            }
        };
        match self.commander.lock().await.dispatch(&tracking_event) {
            Ok(()) => true,
            Err(CommanderError::NoActiveController { phase }) => {
                fatal!("Tracking event found no active controller in {phase}!")
            }
            Err(e) => {
                warn!("Tracking event not delivered: {e}");
                false
            }
        }
    }
}
