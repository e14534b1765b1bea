use bytes::Bytes;
use dossier_core::{now_millis, StreamEvent, KEEPALIVE_FRAME};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Outbound half of one SSE response.
///
/// Frames go through a bounded channel to the response body. The first
/// failed send means the client went away: the writer marks itself closed
/// and every later write is a silent no-op. A client that stays connected but
/// stops reading is treated the same way once the stream deadline passes.
/// Event timestamps are stamped here and never go backwards within one
/// stream.
pub struct StreamWriter {
    tx: mpsc::Sender<Bytes>,
    closed: bool,
    last_timestamp: i64,
    deadline: Option<Instant>,
    active: bool,
}

impl StreamWriter {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self {
            tx,
            closed: false,
            last_timestamp: 0,
            deadline: None,
            active: false,
        }
    }

    /// A writer plus the receiver that feeds the response body.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Bounds every later write: a send still blocked on a full channel at
    /// `deadline` gives up and closes the writer.
    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    /// True if an event frame was delivered since the previous call.
    pub fn take_activity(&mut self) -> bool {
        std::mem::take(&mut self.active)
    }

    /// Stamps and sends one event. Returns false if nothing was delivered.
    pub async fn send_event(&mut self, mut event: StreamEvent) -> bool {
        if self.closed {
            return false;
        }
        let ts = now_millis().max(self.last_timestamp);
        self.last_timestamp = ts;
        event.set_timestamp(ts);

        match event.to_sse_frame() {
            Ok(frame) => {
                let sent = self.write(Bytes::from(frame)).await;
                self.active |= sent;
                sent
            }
            Err(e) => {
                error!(error = %e, kind = event.kind(), "Failed to serialize stream event");
                false
            }
        }
    }

    /// Sends a `: keepalive` comment frame.
    pub async fn keepalive(&mut self) -> bool {
        self.write(Bytes::from_static(KEEPALIVE_FRAME.as_bytes()))
            .await
    }

    async fn write(&mut self, frame: Bytes) -> bool {
        if self.closed {
            return false;
        }
        let sent = match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, self.tx.send(frame)).await {
                Ok(result) => result.is_ok(),
                Err(_) => {
                    warn!("Client stopped reading before the deadline; suppressing further writes");
                    self.closed = true;
                    return false;
                }
            },
            None => self.tx.send(frame).await.is_ok(),
        };
        if !sent {
            debug!("Client disconnected; suppressing further writes");
            self.closed = true;
        }
        sent
    }
}
