//! Cooperative shutdown shared by every background task.

use std::sync::Arc;

use tokio::sync::watch;

/// A one-way latch: once triggered it stays triggered.
///
/// Blocking code polls [`StopSignal::is_triggered`] between reads; async
/// tasks await [`StopSignal::triggered`] alongside their timers.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`StopSignal::trigger`] has been called on any clone.
    pub async fn triggered(&mut self) {
        // The sender lives as long as any clone, so this cannot fail while
        // `self` exists.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}
