pub mod controller;
pub mod domain;
pub mod ports;
pub mod profile;
pub mod session;
pub mod state_machine;
pub mod validation;

pub use controller::{
    dispatch, CommandOutcome, Completion, CustodyRequest, CustodyResponse, PendingCall, Step,
    WalletCommand, WalletController,
};
pub use domain::{
    Allowance, Amount, ApproveRequest, CoinType, CreateOwnerAddressRequest, Customer, MintRequest,
    Notice, NoticeLevel, OwnerCredentials, PendingAction, TransactionKind, TransferRequest,
    WalletSession,
};
pub use ports::{CustodyServicePort, PortError};
pub use profile::{TransferMode, WorkflowProfile};
pub use session::{
    apply_approve_amount_changed, apply_approve_failed, apply_approve_succeeded, apply_balance,
    apply_deposit_settled, apply_logout, apply_owner_address_changed, apply_simulated_transfer,
    apply_transfer, apply_wallet_created, check_transfer, WalletState,
};
pub use state_machine::{flow_transition, FlowAction, StateTransition, WalletFlowState};
pub use validation::{parse_amount_value, parse_positive_amount, require_non_empty, AmountField};
