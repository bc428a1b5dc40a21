use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// A full snapshot of the candidate's editor buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEdit {
    pub code: String,
    pub language: String,
}

/// Coalesces bursts of code edits into one "settled" notification per idle window
///
/// Every edit replaces the buffered snapshot and restarts the idle timer. When the timer
/// fires and the buffer is longer than the minimum, the snapshot is forwarded on the output
/// channel. Cancelling drops any pending snapshot.
///
/// The inbox only ever holds the latest snapshot, so `push` never waits on the timer task.
pub struct Debouncer {
    edits: watch::Sender<Option<CodeEdit>>,
    handle: JoinHandle<()>,
}

impl Debouncer {
    pub fn spawn<T, F>(window: Duration, min_chars: usize, out: mpsc::Sender<T>, wrap: F) -> Self
    where
        T: Send + 'static,
        F: Fn(CodeEdit) -> T + Send + 'static,
    {
        let (edits, rx) = watch::channel(None);
        let handle = tokio::spawn(run(rx, window, min_chars, out, wrap));
        Self { edits, handle }
    }

    /// Replace the buffered snapshot. Returns false once the debouncer has stopped.
    pub fn push(&self, edit: CodeEdit) -> bool {
        self.edits.send(Some(edit)).is_ok()
    }

    /// Stop the timer, discarding any snapshot that has not settled yet
    pub fn cancel(self) {
        drop(self.edits);
        self.handle.abort();
    }
}

async fn run<T, F>(
    mut rx: watch::Receiver<Option<CodeEdit>>,
    window: Duration,
    min_chars: usize,
    out: mpsc::Sender<T>,
    wrap: F,
) where
    F: Fn(CodeEdit) -> T,
{
    let mut armed = false;
    let timer = tokio::time::sleep(window);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    if armed {
                        debug!("Debouncer closed with an unsettled snapshot");
                    }
                    break;
                }
                if rx.borrow_and_update().is_some() {
                    armed = true;
                    timer.as_mut().reset(Instant::now() + window);
                }
            }
            () = &mut timer, if armed => {
                armed = false;
                let Some(edit) = rx.borrow_and_update().clone() else { continue };

                if edit.code.trim().chars().count() <= min_chars {
                    debug!("Settled snapshot below {} chars, skipping analysis", min_chars);
                    continue;
                }

                if out.send(wrap(edit)).await.is_err() {
                    break;
                }
            }
        }
    }
}
