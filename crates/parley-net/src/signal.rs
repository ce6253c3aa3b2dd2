//! Process-wide error signal.
//!
//! Holds at most one current error message. Writers overwrite (last write
//! wins, no queue); readers subscribe and get woken on every change. The
//! app creates one instance at start-up and hands clones to every component
//! that needs to announce or display errors.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ErrorSignal {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl ErrorSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current error message.
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(error = %message, "Error signal set");
        self.tx.send_replace(Some(message));
    }

    pub fn clear_error(&self) {
        self.tx.send_if_modified(|current| current.take().is_some());
    }

    pub fn current(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

impl Default for ErrorSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let signal = ErrorSignal::new();
        assert_eq!(signal.current(), None);

        signal.set_error("first");
        signal.set_error("second");
        assert_eq!(signal.current().as_deref(), Some("second"));

        signal.clear_error();
        assert_eq!(signal.current(), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let signal = ErrorSignal::new();
        let mut rx = signal.subscribe();

        let writer = signal.clone();
        writer.set_error("boom");

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_deref(), Some("boom"));

        // Clearing an already empty signal does not wake subscribers.
        signal.clear_error();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), None);
        signal.clear_error();
        assert!(!rx.has_changed().unwrap());
    }
}
