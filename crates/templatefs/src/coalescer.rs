//! Event coalescer - trailing debounce of change notifications
//!
//! A single task owns the pending buffer and the timer. Every event that
//! arrives is appended and restarts the delay; when the delay elapses with
//! no new event the whole buffer is broadcast as one batch. Sustained
//! activity therefore postpones delivery until a quiet period.

use std::mem;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};

use crate::events::{ChangeBatch, FileChangeEvent};
use crate::provider::Disposable;

/// Default quiet period before a batch is delivered
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(10);

/// Default number of batches a subscriber may fall behind
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Debounces change events into ordered batches
///
/// Must be created inside a tokio runtime. Dropping the coalescer flushes
/// any buffered events and stops its task.
pub struct EventCoalescer {
    events_tx: mpsc::UnboundedSender<FileChangeEvent>,
    batch_tx: broadcast::Sender<ChangeBatch>,
}

impl Default for EventCoalescer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE, DEFAULT_CHANNEL_CAPACITY)
    }
}

impl EventCoalescer {
    /// Spawn a coalescer with the given delay and subscriber capacity
    pub fn new(delay: Duration, capacity: usize) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (batch_tx, _) = broadcast::channel(capacity.max(1));
        tokio::spawn(run(events_rx, batch_tx.clone(), delay));
        Self {
            events_tx,
            batch_tx,
        }
    }

    /// Queue an event for the next batch
    pub fn enqueue(&self, event: FileChangeEvent) {
        if self.events_tx.send(event).is_err() {
            tracing::warn!("Event coalescer task stopped, dropping event");
        }
    }

    /// Subscribe to delivered batches
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeBatch> {
        self.batch_tx.subscribe()
    }

    /// Invoke `callback` for every delivered batch until disposed
    pub fn on_batch<F>(&self, mut callback: F) -> Disposable
    where
        F: FnMut(ChangeBatch) + Send + 'static,
    {
        let mut rx = self.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(batch) => callback(batch),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped = skipped, "Change subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Disposable::new(move || handle.abort())
    }
}

async fn run(
    mut events_rx: mpsc::UnboundedReceiver<FileChangeEvent>,
    batch_tx: broadcast::Sender<ChangeBatch>,
    delay: Duration,
) {
    let mut buffer: ChangeBatch = Vec::new();

    // Idle: wait for the first event of a burst
    while let Some(event) = events_rx.recv().await {
        buffer.push(event);

        let timer = time::sleep(delay);
        tokio::pin!(timer);

        // Pending: every event restarts the timer
        loop {
            tokio::select! {
                biased;
                next = events_rx.recv() => {
                    let Some(event) = next else {
                        flush(&batch_tx, &mut buffer);
                        return;
                    };
                    buffer.push(event);
                    timer.as_mut().reset(Instant::now() + delay);
                }
                () = &mut timer => {
                    flush(&batch_tx, &mut buffer);
                    break;
                }
            }
        }
    }
}

fn flush(batch_tx: &broadcast::Sender<ChangeBatch>, buffer: &mut ChangeBatch) {
    let batch = mem::take(buffer);
    tracing::debug!(events = batch.len(), "Delivering change batch");
    // No subscribers is fine
    let _ = batch_tx.send(batch);
}
