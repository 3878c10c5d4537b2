//! Coalescing of rapid input into one settled value.
//!
//! Values pushed into a [`Debouncer`] are held until no newer value has
//! arrived for the quiet period; only the last one is delivered. Used for
//! search text and for bursts of preset changes.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debounce task. `on_settle` runs once per quiet period with
    /// the last value pushed before it.
    pub fn spawn<F, Fut>(quiet: Duration, mut on_settle: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                let mut pending = tokio::select! {
                    _ = token.cancelled() => return,
                    value = rx.recv() => match value {
                        Some(value) => value,
                        None => return,
                    },
                };

                loop {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        value = rx.recv() => match value {
                            Some(value) => pending = value,
                            // Sender dropped: flush what we have and stop.
                            None => {
                                on_settle(pending).await;
                                return;
                            }
                        },
                        _ = tokio::time::sleep(quiet) => {
                            on_settle(pending).await;
                            break;
                        }
                    }
                }
            }
        });

        Self { tx, cancel, handle }
    }

    /// Queue a value. Returns `false` if the debouncer has stopped.
    pub fn push(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }

    /// Drop any pending value and stop the task.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Deliver the pending value, if any, and wait for the task to end.
    pub async fn flush(self) {
        let Self { tx, handle, .. } = self;
        drop(tx);
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Debounce task ended abnormally");
        }
    }
}
