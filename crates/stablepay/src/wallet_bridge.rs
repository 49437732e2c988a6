//! Bridge between the egui shell and the wallet workspace crates.
//! This must remain the only shell-facing boundary for custody operations.
//!
//! Custody calls run on worker threads and come back over a channel; the
//! results are applied on the UI thread in [`WalletBridge::pump`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use stablepay_wallet_adapters::{BalancePoller, CustodyServiceAdapter};
use stablepay_wallet_core::{
    dispatch, CommandOutcome, CustodyResponse, PendingCall, PortError, Step, WalletCommand,
    WalletController, WalletState, WorkflowProfile,
};

/// Asks the UI to redraw. Called from worker threads.
pub type Repaint = Arc<dyn Fn() + Send + Sync>;

struct Settled {
    call: PendingCall,
    result: Result<CustodyResponse, PortError>,
}

pub struct WalletBridge {
    controller: WalletController<CustodyServiceAdapter>,
    results_tx: Sender<Settled>,
    results_rx: Receiver<Settled>,
    poller: Option<BalancePoller>,
    /// Balance generation the running poller was started at.
    poll_generation: u64,
    poll_interval: Duration,
    repaint: Repaint,
}

impl WalletBridge {
    pub fn new(
        service: CustodyServiceAdapter,
        profile: WorkflowProfile,
        poll_interval: Duration,
        repaint: Repaint,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            controller: WalletController::new(service, profile),
            results_tx,
            results_rx,
            poller: None,
            poll_generation: 0,
            poll_interval,
            repaint,
        }
    }

    pub fn state(&self) -> &WalletState {
        self.controller.state()
    }

    pub fn profile(&self) -> &WorkflowProfile {
        self.controller.profile()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_some()
    }

    /// Validates `command` and starts its custody call in the background.
    /// Returns the outcome directly when no call was needed.
    pub fn submit(&mut self, command: WalletCommand) -> Result<Option<CommandOutcome>, PortError> {
        match self.controller.begin(command)? {
            Step::Settled(outcome) => Ok(Some(outcome)),
            Step::Dispatch(call) => {
                self.spawn_call(call);
                Ok(None)
            }
        }
    }

    /// Applies finished calls and poller updates. Returns the results of calls
    /// the user started; follow-up refreshes are applied silently.
    pub fn pump(&mut self) -> Vec<Result<CommandOutcome, PortError>> {
        let mut events = Vec::new();
        while let Ok(Settled { call, result }) = self.results_rx.try_recv() {
            let user_call = !call.follow_up;
            match self.controller.complete(call, result) {
                Ok(completion) => {
                    if let Some(next) = completion.follow_up {
                        self.spawn_call(next);
                    }
                    if let CommandOutcome::WalletCreated { address } = &completion.outcome {
                        self.start_poller(address.clone());
                    }
                    if user_call {
                        events.push(Ok(completion.outcome));
                    }
                }
                Err(err) => {
                    if user_call {
                        events.push(Err(err));
                    }
                }
            }
        }
        self.restart_stale_poller();
        self.drain_poller();
        events
    }

    pub fn set_owner_address(&mut self, address: &str) {
        if let Err(err) = self.controller.set_owner_address(address) {
            tracing::warn!(error = %err, "owner address update rejected");
        }
    }

    pub fn approve_amount_changed(&mut self) {
        if let Err(err) = self.controller.approve_amount_changed() {
            tracing::warn!(error = %err, "approve amount update rejected");
        }
    }

    pub fn logout(&mut self) {
        self.stop_poller();
        if let Err(err) = self.controller.logout() {
            tracing::warn!(error = %err, "logout failed");
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.controller.dismiss_notice();
    }

    fn spawn_call(&self, call: PendingCall) {
        let service = self.controller.service().clone();
        let tx = self.results_tx.clone();
        let repaint = Arc::clone(&self.repaint);
        std::thread::spawn(move || {
            let result = dispatch(&service, &call.request);
            // The receiver is gone only when the app is shutting down.
            let _ = tx.send(Settled { call, result });
            repaint();
        });
    }

    fn start_poller(&mut self, address: String) {
        self.stop_poller();
        let service = Arc::new(self.controller.service().clone());
        let repaint = Arc::clone(&self.repaint);
        self.poll_generation = self.controller.state().balance_generation;
        match BalancePoller::spawn(service, address, self.poll_interval, move || repaint()) {
            Ok(poller) => self.poller = Some(poller),
            Err(err) => tracing::warn!(error = %err, "balance polling unavailable"),
        }
    }

    /// Reads queued by a poller started before the last deposit or transfer
    /// predate it. Replacing the poller drops them.
    fn restart_stale_poller(&mut self) {
        let Some(poller) = &self.poller else {
            return;
        };
        if self.poll_generation == self.controller.state().balance_generation {
            return;
        }
        let address = poller.address().to_owned();
        self.start_poller(address);
    }

    fn stop_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
    }

    fn drain_poller(&mut self) {
        let Some(poller) = self.poller.as_mut() else {
            return;
        };
        while let Some(update) = poller.try_recv() {
            let Ok(balance) = update.result else {
                continue;
            };
            if let Err(err) = self.controller.observe_balance(&update.address, balance) {
                tracing::warn!(error = %err, "polled balance rejected");
            }
        }
    }
}
