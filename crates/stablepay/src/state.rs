//! Form input state
//!
//! Workflow state lives in the controller; these structs only hold what the
//! user is typing.

use std::time::{Duration, Instant};

use stablepay_wallet_core::{CoinType, Customer, Notice, WorkflowProfile};

/// How long a notice stays on screen before it is dismissed.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct WalletForms {
    pub email: String,
    pub deposit_amount: String,
    pub deposit_coin: CoinType,
    /// Mirrors the controller's owner address; edits are forwarded to it.
    pub owner_address: String,
    pub approve_amount: String,
    pub approve_coin: CoinType,
    pub transfer_amount: String,
    pub transfer_coin: CoinType,
    pub target_address: String,
    pub customers: Vec<Customer>,
}

impl WalletForms {
    pub fn new(profile: &WorkflowProfile) -> Self {
        Self {
            email: String::new(),
            deposit_amount: String::new(),
            deposit_coin: profile.default_coin,
            owner_address: String::new(),
            approve_amount: String::new(),
            approve_coin: profile.default_coin,
            transfer_amount: String::new(),
            transfer_coin: profile.default_coin,
            target_address: profile.custodial_targets.first().cloned().unwrap_or_default(),
            customers: Vec::new(),
        }
    }

    /// Resets the approve and transfer inputs for a newly loaded wallet.
    pub fn wallet_changed(&mut self, profile: &WorkflowProfile, owner_address: &str) {
        let customers = std::mem::take(&mut self.customers);
        let email = std::mem::take(&mut self.email);
        *self = Self::new(profile);
        self.customers = customers;
        self.email = email;
        self.owner_address = owner_address.to_owned();
    }

    pub fn logged_out(&mut self, profile: &WorkflowProfile) {
        let customers = std::mem::take(&mut self.customers);
        *self = Self::new(profile);
        self.customers = customers;
    }
}

/// Tracks how long the current notice has been visible.
#[derive(Debug, Default)]
pub struct NoticeTimer {
    shown: Option<(Notice, Instant)>,
}

impl NoticeTimer {
    /// Returns true once `current` has been on screen for [`NOTICE_TTL`].
    /// A different notice restarts the clock.
    pub fn expired(&mut self, current: Option<&Notice>, now: Instant) -> bool {
        let Some(notice) = current else {
            self.shown = None;
            return false;
        };
        match &self.shown {
            Some((shown, since)) if shown == notice => now.duration_since(*since) >= NOTICE_TTL,
            _ => {
                self.shown = Some((notice.clone(), now));
                false
            }
        }
    }
}
