//! Error banner: shows the current error signal message and clears it a
//! fixed time after the latest message was set.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use parley_net::ErrorSignal;

pub struct ErrorBanner {
    signal: ErrorSignal,
    task: JoinHandle<()>,
}

impl ErrorBanner {
    /// Start the expiry task. Must be called inside a tokio runtime.
    pub fn spawn(signal: ErrorSignal, ttl: Duration) -> Self {
        let rx = signal.subscribe();
        let task = tokio::spawn(expire_loop(signal.clone(), rx, ttl));
        Self { signal, task }
    }

    pub fn current(&self) -> Option<String> {
        self.signal.current()
    }

    /// Manual dismissal.
    pub fn dismiss(&self) {
        self.signal.clear_error();
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.signal.subscribe()
    }
}

impl Drop for ErrorBanner {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn expire_loop(signal: ErrorSignal, mut rx: watch::Receiver<Option<String>>, ttl: Duration) {
    let mut deadline: Option<Instant> = rx.borrow_and_update().as_ref().map(|_| Instant::now() + ttl);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                // Every new message restarts the timer.
                deadline = rx
                    .borrow_and_update()
                    .as_ref()
                    .map(|_| Instant::now() + ttl);
            }
            _ = async {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            } => {
                debug!("Error banner expired");
                deadline = None;
                signal.clear_error();
            }
        }
    }
}
