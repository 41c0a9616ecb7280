//! Cancellation of in-flight sends.

use tokio::sync::broadcast;

/// Broadcast handle that cancels every `send_until` subscribed to it.
///
/// Cancelling drops the in-flight future, which closes its socket.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: broadcast::Sender<()>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to pass to `HttpClient::send_until`.
    pub fn token(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Sends that have not subscribed yet are unaffected.
    pub fn cancel(&self) {
        let _ = self.tx.send(());
    }

    /// Number of sends still waiting on this signal.
    pub fn pending(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}
