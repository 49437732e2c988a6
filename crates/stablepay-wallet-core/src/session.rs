//! Wallet workflow state and its transitions.
//!
//! Every `apply_*` function takes the current state by reference and returns
//! the next one, so the workflow can be driven and tested without a UI.

use std::collections::BTreeSet;

use crate::domain::{
    Allowance, Amount, CoinType, Notice, OwnerCredentials, PendingAction, WalletSession,
};
use crate::ports::PortError;
use crate::state_machine::{flow_transition, FlowAction, StateTransition, WalletFlowState};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletState {
    pub flow: WalletFlowState,
    pub session: Option<WalletSession>,
    /// Owner address input of the approve form. Seeded from the session.
    pub owner_address: String,
    pub balance: Amount,
    pub allowance: Option<Allowance>,
    pub pending: BTreeSet<PendingAction>,
    pub notice: Option<Notice>,
    /// Bumped whenever the session is replaced or cleared.
    pub session_generation: u64,
    /// Bumped whenever an allowance or its preconditions are invalidated.
    pub approval_generation: u64,
    pub last_transition: Option<StateTransition>,
    /// Bumped whenever a settled call changes the server-side balance.
    /// Balance reads started before the bump are stale.
    pub balance_generation: u64,
    /// A follow-up refresh was due while another refresh was in flight.
    pub refresh_owed: bool,
    /// Sum of simulated transfers. Never known to the custody service, so it
    /// is subtracted from every balance read.
    pub simulated_debit: Amount,
}

impl WalletState {
    pub fn allowance_amount(&self) -> Amount {
        self.allowance.map(|a| a.amount).unwrap_or(Amount::ZERO)
    }

    pub fn is_pending(&self, action: PendingAction) -> bool {
        self.pending.contains(&action)
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    fn transition(&mut self, action: FlowAction) -> Result<(), PortError> {
        let (to, transition) = flow_transition(self.flow, action)?;
        tracing::debug!(
            from = ?transition.from,
            to = ?transition.to,
            reason = transition.reason,
            "wallet flow transition"
        );
        self.flow = to;
        self.last_transition = Some(transition);
        Ok(())
    }

    fn invalidate_allowance(&mut self) -> Result<(), PortError> {
        self.allowance = None;
        self.approval_generation = self.approval_generation.wrapping_add(1);
        if self.session.is_some() {
            self.transition(FlowAction::InvalidateApproval)?;
        }
        Ok(())
    }
}

pub fn apply_wallet_created(
    state: &WalletState,
    identifier: &str,
    credentials: OwnerCredentials,
) -> Result<WalletState, PortError> {
    let mut next = state.clone();
    next.transition(FlowAction::Create)?;
    next.owner_address = credentials.address.clone();
    next.session = Some(WalletSession::new(
        identifier.to_owned(),
        credentials.address,
        credentials.private_key,
    ));
    next.balance = Amount::ZERO;
    next.allowance = None;
    next.simulated_debit = Amount::ZERO;
    next.refresh_owed = false;
    next.pending.retain(|a| *a == PendingAction::LoadingCustomers);
    next.session_generation = next.session_generation.wrapping_add(1);
    next.approval_generation = next.approval_generation.wrapping_add(1);
    next.balance_generation = next.balance_generation.wrapping_add(1);
    Ok(next)
}

pub fn apply_balance(state: &WalletState, balance: Amount) -> Result<WalletState, PortError> {
    let mut next = state.clone();
    next.balance = balance.saturating_sub(next.simulated_debit);
    if !next.balance.is_zero() && next.session.is_some() {
        next.transition(FlowAction::ObserveFunds)?;
    }
    Ok(next)
}

/// A deposit clears the allowance whether or not the mint went through.
pub fn apply_deposit_settled(
    state: &WalletState,
    succeeded: bool,
) -> Result<WalletState, PortError> {
    let mut next = state.clone();
    if succeeded {
        next.allowance = None;
        next.approval_generation = next.approval_generation.wrapping_add(1);
        next.balance_generation = next.balance_generation.wrapping_add(1);
        next.transition(FlowAction::Deposit)?;
    } else {
        next.invalidate_allowance()?;
    }
    Ok(next)
}

pub fn apply_approve_succeeded(
    state: &WalletState,
    amount: Amount,
    coin_type: CoinType,
) -> Result<WalletState, PortError> {
    let mut next = state.clone();
    next.transition(FlowAction::Approve)?;
    next.allowance = Some(Allowance { amount, coin_type });
    Ok(next)
}

pub fn apply_approve_failed(state: &WalletState) -> Result<WalletState, PortError> {
    let mut next = state.clone();
    next.invalidate_allowance()?;
    Ok(next)
}

/// Checks a transfer against the cached balance and the live allowance.
pub fn check_transfer(
    state: &WalletState,
    amount: Amount,
    coin_type: CoinType,
) -> Result<(), PortError> {
    let allowance = match state.allowance {
        Some(a) if !a.amount.is_zero() => a,
        _ => {
            return Err(PortError::Validation(
                "Please approve tokens first before transferring.".to_owned(),
            ))
        }
    };
    if allowance.coin_type != coin_type {
        return Err(PortError::Validation(format!(
            "The current approval covers {} only.",
            allowance.coin_type
        )));
    }
    if amount > state.balance {
        return Err(PortError::Validation(
            "Insufficient tokens in your wallet for this transfer.".to_owned(),
        ));
    }
    if amount > allowance.amount {
        return Err(PortError::Validation(format!(
            "You can only transfer up to the approved amount of {} {}.",
            allowance.amount, allowance.coin_type
        )));
    }
    Ok(())
}

/// Debits the cached balance and consumes the allowance.
pub fn apply_transfer(state: &WalletState, amount: Amount) -> Result<WalletState, PortError> {
    let mut next = state.clone();
    next.balance = next.balance.saturating_sub(amount);
    next.allowance = None;
    next.approval_generation = next.approval_generation.wrapping_add(1);
    next.balance_generation = next.balance_generation.wrapping_add(1);
    if next.flow == WalletFlowState::Approved {
        next.transition(FlowAction::Transfer)?;
    } else if next.session.is_some() {
        next.transition(FlowAction::InvalidateApproval)?;
    }
    Ok(next)
}

/// A transfer that only exists locally. The debit is remembered so later
/// balance reads from the custody service do not undo it.
pub fn apply_simulated_transfer(
    state: &WalletState,
    amount: Amount,
) -> Result<WalletState, PortError> {
    let mut next = apply_transfer(state, amount)?;
    next.simulated_debit = next
        .simulated_debit
        .checked_add(amount)
        .ok_or_else(|| PortError::Validation("Transfer amount is too large.".to_owned()))?;
    Ok(next)
}

pub fn apply_owner_address_changed(
    state: &WalletState,
    address: &str,
) -> Result<WalletState, PortError> {
    let mut next = state.clone();
    if next.owner_address != address {
        next.owner_address = address.to_owned();
        next.invalidate_allowance()?;
    }
    Ok(next)
}

pub fn apply_approve_amount_changed(state: &WalletState) -> Result<WalletState, PortError> {
    let mut next = state.clone();
    next.invalidate_allowance()?;
    Ok(next)
}

pub fn apply_logout(state: &WalletState) -> Result<WalletState, PortError> {
    let mut pending = state.pending.clone();
    pending.retain(|a| *a == PendingAction::LoadingCustomers);
    let mut next = WalletState {
        flow: state.flow,
        pending,
        session_generation: state.session_generation.wrapping_add(1),
        approval_generation: state.approval_generation.wrapping_add(1),
        balance_generation: state.balance_generation.wrapping_add(1),
        ..WalletState::default()
    };
    next.transition(FlowAction::Logout)?;
    Ok(next)
}
