use crate::ports::PortError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WalletFlowState {
    #[default]
    Uninitialized,
    Created,
    Funded,
    Approved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    Create,
    ObserveFunds,
    Deposit,
    Approve,
    InvalidateApproval,
    Transfer,
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: WalletFlowState,
    pub to: WalletFlowState,
    pub reason: &'static str,
}

pub fn flow_transition(
    state: WalletFlowState,
    action: FlowAction,
) -> Result<(WalletFlowState, StateTransition), PortError> {
    use FlowAction as A;
    use WalletFlowState as S;

    let (to, reason) = match (state, action) {
        (S::Uninitialized, A::Create) => (S::Created, "wallet_created"),
        (S::Created | S::Funded | S::Approved, A::Create) => (S::Created, "wallet_replaced"),
        (S::Created | S::Funded, A::ObserveFunds) => (S::Funded, "funds_observed"),
        (S::Approved, A::ObserveFunds) => (S::Approved, "funds_observed"),
        (S::Created | S::Funded | S::Approved, A::Deposit) => (S::Funded, "deposit_settled"),
        (S::Funded | S::Approved, A::Approve) => (S::Approved, "allowance_set"),
        (S::Created, A::InvalidateApproval) => (S::Created, "allowance_cleared"),
        (S::Funded | S::Approved, A::InvalidateApproval) => (S::Funded, "allowance_cleared"),
        (S::Approved, A::Transfer) => (S::Funded, "transferred"),
        (_, A::Logout) => (S::Uninitialized, "logout"),
        _ => {
            return Err(PortError::Policy(format!(
                "illegal wallet flow transition: {state:?} -> {action:?}"
            )))
        }
    };

    Ok((
        to,
        StateTransition {
            from: state,
            to,
            reason,
        },
    ))
}
