//! Periodic balance refresh for the active wallet.
//!
//! The poller owns a dedicated thread running a current-thread tokio runtime.
//! Each tick hands the blocking custody call to `spawn_blocking` and publishes
//! the result on a channel that the UI thread drains.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use stablepay_wallet_core::{Amount, CustodyServicePort, PortError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub address: String,
    pub result: Result<Amount, PortError>,
}

pub struct BalancePoller {
    address: String,
    cancel: watch::Sender<bool>,
    updates: mpsc::UnboundedReceiver<BalanceUpdate>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for BalancePoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalancePoller")
            .field("address", &self.address)
            .field("cancelled", &*self.cancel.borrow())
            .finish()
    }
}

impl BalancePoller {
    /// Starts polling `address`. The first fetch runs immediately; `notify`
    /// is called after every published update.
    pub fn spawn<S, F>(
        service: Arc<S>,
        address: impl Into<String>,
        interval: Duration,
        notify: F,
    ) -> Result<Self, PortError>
    where
        S: CustodyServicePort + Send + Sync + 'static,
        F: Fn() + Send + 'static,
    {
        let address = address.into();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| PortError::Transport(format!("balance poller runtime: {e}")))?;
        let (cancel, mut cancelled) = watch::channel(false);
        let (tx, updates) = mpsc::unbounded_channel();

        let poll_address = address.clone();
        let handle = std::thread::Builder::new()
            .name("balance-poller".to_owned())
            .spawn(move || {
                // Borrowed so the last handle to a blocking HTTP client is never
                // dropped inside the runtime.
                let service = &service;
                runtime.block_on(async move {
                    let mut ticker = tokio::time::interval(interval);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        tokio::select! {
                            // Also fires when the sender is dropped.
                            _ = cancelled.changed() => break,
                            _ = ticker.tick() => {}
                        }
                        if *cancelled.borrow() {
                            break;
                        }

                        let svc = Arc::clone(&service);
                        let addr = poll_address.clone();
                        let result =
                            match tokio::task::spawn_blocking(move || svc.fetch_balance(&addr))
                                .await
                            {
                                Ok(result) => result,
                                Err(e) => Err(PortError::Transport(format!(
                                    "balance poll task failed: {e}"
                                ))),
                            };
                        if *cancelled.borrow() {
                            break;
                        }
                        if let Err(err) = &result {
                            tracing::warn!(address = %poll_address, error = %err, "balance poll failed");
                        }
                        let update = BalanceUpdate {
                            address: poll_address.clone(),
                            result,
                        };
                        if tx.send(update).is_err() {
                            break;
                        }
                        notify();
                    }
                    tracing::debug!(address = %poll_address, "balance poller stopped");
                });
            })
            .map_err(|e| PortError::Transport(format!("balance poller thread: {e}")))?;

        tracing::debug!(%address, ?interval, "balance poller started");
        Ok(Self {
            address,
            cancel,
            updates,
            handle: Some(handle),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    pub fn try_recv(&mut self) -> Option<BalanceUpdate> {
        self.updates.try_recv().ok()
    }

    /// Cancels and waits for the polling thread to exit.
    pub fn shutdown(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(address = %self.address, "balance poller thread panicked");
            }
        }
    }
}

impl Drop for BalancePoller {
    fn drop(&mut self) {
        self.cancel();
    }
}
