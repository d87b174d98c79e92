//! WriteBehind - debounced, coalescing writer in front of a Persistence.
//!
//! Every collection change hands the writer the full serialized collection.
//! Writes to the same key within the debounce window coalesce to a single
//! `save` carrying the latest payload, so rapid-fire edits do not amplify
//! into one write per keystroke. Reads never go through here; they always
//! come from in-memory state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::Persistence;

enum Command {
    Write { key: String, value: String },
    Flush(oneshot::Sender<()>),
}

/// Handle to the background write-behind task.
///
/// Dropping the handle closes the command channel; the task flushes every
/// dirty key before exiting, so queued writes survive teardown. Call
/// [`shutdown`](WriteBehind::shutdown) instead when the caller needs to wait
/// for that final flush.
pub struct WriteBehind {
    tx: mpsc::UnboundedSender<Command>,
    handle: Option<JoinHandle<()>>,
}

impl WriteBehind {
    /// Spawn the writer task. Must be called within a tokio runtime.
    pub fn spawn<P>(persistence: Arc<P>, window: Duration) -> Self
    where
        P: Persistence + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(persistence, window, rx));
        WriteBehind {
            tx,
            handle: Some(handle),
        }
    }

    /// Queue a write. The latest value per key wins once the key is quiet
    /// for a full debounce window.
    pub fn write(&self, key: &str, value: String) {
        let _ = self.tx.send(Command::Write {
            key: key.to_string(),
            value,
        });
    }

    /// Force all dirty keys out immediately and wait for them.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Flush remaining writes and stop the background task.
    pub async fn shutdown(mut self) {
        drop(self.tx);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn run<P>(persistence: Arc<P>, window: Duration, mut rx: mpsc::UnboundedReceiver<Command>)
where
    P: Persistence + 'static,
{
    let mut dirty: HashMap<String, String> = HashMap::new();
    let mut due: HashMap<String, Instant> = HashMap::new();

    loop {
        let next = due.values().min().copied();
        let timer = async {
            match next {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Write { key, value }) => {
                    due.insert(key.clone(), Instant::now() + window);
                    dirty.insert(key, value);
                }
                Some(Command::Flush(ack)) => {
                    flush_all(&*persistence, &mut dirty);
                    due.clear();
                    let _ = ack.send(());
                }
                // Channel closed: final flush, then exit
                None => {
                    flush_all(&*persistence, &mut dirty);
                    break;
                }
            },
            _ = timer => {
                let now = Instant::now();
                let ready: Vec<String> = due
                    .iter()
                    .filter(|(_, at)| **at <= now)
                    .map(|(key, _)| key.clone())
                    .collect();
                for key in ready {
                    due.remove(&key);
                    if let Some(value) = dirty.remove(&key) {
                        save(&*persistence, &key, &value);
                    }
                }
            }
        }
    }
}

fn flush_all<P: Persistence>(persistence: &P, dirty: &mut HashMap<String, String>) {
    for (key, value) in dirty.drain() {
        save(persistence, &key, &value);
    }
}

fn save<P: Persistence>(persistence: &P, key: &str, value: &str) {
    // Durability is best-effort: log and move on
    if let Err(err) = persistence.save(key, value) {
        tracing::warn!(key, %err, "write-behind save failed");
    }
}
