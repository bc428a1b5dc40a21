use crate::error::InterviewError;
use crate::models::TranscriptEntry;
use crate::registry::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Periodically replaces the registry transcript with the live, cumulative one
///
/// Each flush writes the whole list, so a dropped flush is repaired by the next. Flushes
/// run sequentially in one task; stopping waits for an in-flight flush to finish.
pub struct TranscriptSynchronizer {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TranscriptSynchronizer {
    pub fn spawn(
        room_id: String,
        registry: Arc<dyn SessionRegistry>,
        period: Duration,
        transcript: watch::Receiver<Vec<TranscriptEntry>>,
    ) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(run(room_id, registry, period, transcript, stop_rx));
        Self { stop_tx, handle }
    }

    /// Cancel the interval; returns once no flush can run any more
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.handle.await {
            error!("Transcript synchronizer panicked: {}", e);
        }
    }
}

async fn run(
    room_id: String,
    registry: Arc<dyn SessionRegistry>,
    period: Duration,
    mut transcript: watch::Receiver<Vec<TranscriptEntry>>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    let mut retry = false;

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {
                let changed = match transcript.has_changed() {
                    Ok(changed) => changed,
                    Err(_) => break,
                };
                if !changed && !retry {
                    continue;
                }

                let entries = transcript.borrow_and_update().clone();
                let count = entries.len();

                match registry.replace_transcript(&room_id, entries).await {
                    Ok(()) => {
                        retry = false;
                        debug!("Flushed {} transcript entries for room {}", count, room_id);
                    }
                    Err(e @ InterviewError::Conflict { .. }) | Err(e @ InterviewError::NotFound(_)) => {
                        warn!("Stopping transcript sync for room {}: {}", room_id, e);
                        break;
                    }
                    Err(e) => {
                        retry = true;
                        warn!("Transcript flush failed for room {}, retrying: {}", room_id, e);
                    }
                }
            }
        }
    }

    info!("Transcript synchronizer stopped for room {}", room_id);
}
