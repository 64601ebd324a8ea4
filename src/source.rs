//! External numeric source: reads newline-delimited numbers from a device or
//! file and forwards them as link events for one receiver.
//!
//! The reader runs as its own task and talks to the frame loop only through
//! the event channel. A serial device opened as a file behaves the same as a
//! pipe or a plain text file here; `baudRate` is carried for display only.

use std::path::PathBuf;

use scene::{EntityId, LinkEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Event tagged with the receiver it belongs to.
pub type SourceEvent = (EntityId, LinkEvent);

/// Decodes one line of source output into a sample.
///
/// Lines are trimmed; blank lines and anything that is not a finite number
/// are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineDecoder {
    dropped: u64,
}

impl LineDecoder {
    pub fn decode(&mut self, line: &str) -> Option<f64> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match line.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                self.dropped += 1;
                trace!(line, "dropped malformed source line");
                None
            }
        }
    }

    /// Number of non-blank lines that failed to decode.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Spawn a reader for `path` feeding `receiver_id`. The task ends on EOF,
/// on a read error, or when the channel closes. Abort the handle to
/// disconnect early.
pub fn spawn_source(path: PathBuf, receiver_id: EntityId, tx: mpsc::Sender<SourceEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(receiver = %receiver_id, path = %path.display(), error = %e, "external source open failed");
                send(&tx, receiver_id, LinkEvent::Failed(e.to_string())).await;
                return;
            }
        };
        let port_info = path.display().to_string();
        info!(receiver = %receiver_id, path = %port_info, "external source connected");
        if !send(&tx, receiver_id, LinkEvent::Connected { port_info }).await {
            return;
        }

        let mut decoder = LineDecoder::default();
        let mut lines = BufReader::new(file).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(value) = decoder.decode(&line) else {
                        continue;
                    };
                    if !send(&tx, receiver_id, LinkEvent::Sample(value)).await {
                        return;
                    }
                }
                Ok(None) => {
                    debug!(receiver = %receiver_id, dropped = decoder.dropped(), "external source reached end");
                    send(&tx, receiver_id, LinkEvent::Closed).await;
                    return;
                }
                Err(e) => {
                    warn!(receiver = %receiver_id, error = %e, "external source read failed");
                    send(&tx, receiver_id, LinkEvent::Failed(e.to_string())).await;
                    return;
                }
            }
        }
    })
}

/// Returns `false` once the frame loop has gone away.
async fn send(tx: &mpsc::Sender<SourceEvent>, receiver_id: EntityId, event: LinkEvent) -> bool {
    tx.send((receiver_id, event)).await.is_ok()
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
