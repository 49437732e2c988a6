use crate::domain::{
    Amount, ApproveRequest, CoinType, CreateOwnerAddressRequest, Customer, MintRequest, Notice,
    OwnerCredentials, PendingAction, TransactionKind, TransferRequest, WalletSession,
};
use crate::ports::{CustodyServicePort, PortError};
use crate::profile::{TransferMode, WorkflowProfile};
use crate::session::{
    apply_approve_amount_changed, apply_approve_failed, apply_approve_succeeded, apply_balance,
    apply_deposit_settled, apply_logout, apply_owner_address_changed, apply_simulated_transfer,
    apply_transfer, apply_wallet_created, check_transfer, WalletState,
};
use crate::state_machine::{flow_transition, FlowAction};
use crate::validation::{parse_positive_amount, require_non_empty, AmountField};

const NO_WALLET: &str = "Please create or connect your wallet first.";

#[derive(Debug, Clone)]
pub enum WalletCommand {
    CreateWallet {
        identifier: String,
    },
    ResumeWallet {
        identifier: String,
    },
    Deposit {
        amount: String,
        coin_type: CoinType,
    },
    Approve {
        amount: String,
        coin_type: CoinType,
    },
    Transfer {
        target_address: String,
        amount: String,
        coin_type: CoinType,
    },
    RefreshBalance,
    LoadCustomers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustodyRequest {
    CreateOwnerAddress(CreateOwnerAddressRequest),
    LookupOwnerAddress { user_name: String },
    FetchBalance { address: String },
    Mint(MintRequest),
    Approve(ApproveRequest),
    TransferFrom(TransferRequest),
    ListCustomers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustodyResponse {
    OwnerCredentials(OwnerCredentials),
    Balance(Amount),
    Accepted,
    Customers(Vec<Customer>),
}

/// A request that passed local validation and is waiting to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    pub action: PendingAction,
    pub request: CustodyRequest,
    pub coin_type: Option<CoinType>,
    pub session_generation: u64,
    pub approval_generation: u64,
    pub balance_generation: u64,
    /// Issued by the controller itself after another call settled.
    pub follow_up: bool,
}

#[derive(Debug, Clone)]
pub enum Step {
    Dispatch(PendingCall),
    Settled(CommandOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    WalletCreated {
        address: String,
    },
    BalanceRefreshed(Amount),
    Deposited {
        amount: Amount,
        coin_type: CoinType,
    },
    Approved {
        amount: Amount,
        coin_type: CoinType,
    },
    Transferred {
        amount: Amount,
        coin_type: CoinType,
        target_address: String,
        remaining: Amount,
    },
    CustomersLoaded(Vec<Customer>),
    /// The result belonged to a session or approval that no longer exists.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub outcome: CommandOutcome,
    pub follow_up: Option<PendingCall>,
}

impl Completion {
    fn settled(outcome: CommandOutcome) -> Self {
        Self {
            outcome,
            follow_up: None,
        }
    }
}

/// Runs one custody call. Holds no controller state, so it can run on a worker thread.
pub fn dispatch<S>(service: &S, request: &CustodyRequest) -> Result<CustodyResponse, PortError>
where
    S: CustodyServicePort + ?Sized,
{
    match request {
        CustodyRequest::CreateOwnerAddress(req) => service
            .create_owner_address(req)
            .map(CustodyResponse::OwnerCredentials),
        CustodyRequest::LookupOwnerAddress { user_name } => service
            .lookup_owner_address(user_name)
            .map(CustodyResponse::OwnerCredentials),
        CustodyRequest::FetchBalance { address } => {
            service.fetch_balance(address).map(CustodyResponse::Balance)
        }
        CustodyRequest::Mint(req) => service.mint(req).map(|_| CustodyResponse::Accepted),
        CustodyRequest::Approve(req) => service.approve(req).map(|_| CustodyResponse::Accepted),
        CustodyRequest::TransferFrom(req) => service
            .transfer_from(req)
            .map(|_| CustodyResponse::Accepted),
        CustodyRequest::ListCustomers => service.list_customers().map(CustodyResponse::Customers),
    }
}

pub struct WalletController<S>
where
    S: CustodyServicePort,
{
    service: S,
    profile: WorkflowProfile,
    state: WalletState,
}

impl<S> WalletController<S>
where
    S: CustodyServicePort,
{
    pub fn new(service: S, profile: WorkflowProfile) -> Self {
        Self {
            service,
            profile,
            state: WalletState::default(),
        }
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn profile(&self) -> &WorkflowProfile {
        &self.profile
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Runs a command to completion on the calling thread, follow-ups included.
    pub fn handle(&mut self, command: WalletCommand) -> Result<CommandOutcome, PortError> {
        let call = match self.begin(command)? {
            Step::Settled(outcome) => return Ok(outcome),
            Step::Dispatch(call) => call,
        };
        let result = dispatch(&self.service, &call.request);
        let completion = self.complete(call, result)?;

        let mut next = completion.follow_up;
        while let Some(call) = next.take() {
            let result = dispatch(&self.service, &call.request);
            match self.complete(call, result) {
                Ok(c) => next = c.follow_up,
                Err(err) => tracing::warn!(error = %err, "follow-up custody call failed"),
            }
        }
        Ok(completion.outcome)
    }

    /// Validates a command and reserves its pending slot. Nothing is sent yet.
    pub fn begin(&mut self, command: WalletCommand) -> Result<Step, PortError> {
        let result = self.begin_inner(command);
        if let Err(err) = &result {
            tracing::debug!(error = %err, "command rejected locally");
            self.state.notice = Some(Notice::error(err.to_string()));
        }
        result
    }

    fn begin_inner(&mut self, command: WalletCommand) -> Result<Step, PortError> {
        match command {
            WalletCommand::CreateWallet { identifier } => {
                let user_name = require_non_empty(&identifier, "Please enter your email.")?;
                self.reserve(PendingAction::CreatingWallet)?;
                Ok(Step::Dispatch(self.call(
                    PendingAction::CreatingWallet,
                    CustodyRequest::CreateOwnerAddress(CreateOwnerAddressRequest { user_name }),
                    None,
                )))
            }
            WalletCommand::ResumeWallet { identifier } => {
                let user_name = require_non_empty(&identifier, "Please enter your email.")?;
                self.reserve(PendingAction::CreatingWallet)?;
                Ok(Step::Dispatch(self.call(
                    PendingAction::CreatingWallet,
                    CustodyRequest::LookupOwnerAddress { user_name },
                    None,
                )))
            }
            WalletCommand::Deposit { amount, coin_type } => {
                let session = self.session()?;
                let amount = parse_positive_amount(&amount, AmountField::Deposit)?;
                self.check_coin(coin_type)?;
                self.reserve(PendingAction::Depositing)?;
                Ok(Step::Dispatch(self.call(
                    PendingAction::Depositing,
                    CustodyRequest::Mint(MintRequest {
                        to_address: session.address,
                        amount,
                        user_name: session.identifier,
                        coin_type,
                    }),
                    Some(coin_type),
                )))
            }
            WalletCommand::Approve { amount, coin_type } => {
                let session = self.session()?;
                let owner_address = require_non_empty(
                    &self.state.owner_address,
                    "Please enter a valid owner address.",
                )?;
                let amount = parse_positive_amount(&amount, AmountField::Approval)?;
                self.check_coin(coin_type)?;
                if amount > self.state.balance {
                    return Err(PortError::Validation(format!(
                        "Insufficient tokens for approval. Available: {} {}",
                        self.state.balance, coin_type
                    )));
                }
                flow_transition(self.state.flow, FlowAction::Approve).map_err(|_| {
                    PortError::Policy("Deposit tokens before approving.".to_owned())
                })?;
                self.reserve(PendingAction::Approving)?;
                Ok(Step::Dispatch(self.call(
                    PendingAction::Approving,
                    CustodyRequest::Approve(ApproveRequest {
                        user_name: session.identifier.clone(),
                        owner_private_key: session.private_key().map(str::to_owned),
                        owner_address,
                        amount,
                    }),
                    Some(coin_type),
                )))
            }
            WalletCommand::Transfer {
                target_address,
                amount,
                coin_type,
            } => {
                let session = self.session()?;
                if self.state.allowance_amount().is_zero() {
                    return Err(PortError::Validation(
                        "Please approve tokens first before transferring.".to_owned(),
                    ));
                }
                let amount = parse_positive_amount(&amount, AmountField::Transfer)?;
                check_transfer(&self.state, amount, coin_type)?;
                let target_address = require_non_empty(
                    &target_address,
                    "Please select a target custodial address.",
                )?;
                match self.profile.transfer_mode {
                    TransferMode::Simulated => {
                        self.state = apply_simulated_transfer(&self.state, amount)?;
                        self.state.notice = Some(Notice::success(transfer_message(
                            amount,
                            coin_type,
                            &target_address,
                            self.state.balance,
                        )));
                        Ok(Step::Settled(CommandOutcome::Transferred {
                            amount,
                            coin_type,
                            target_address,
                            remaining: self.state.balance,
                        }))
                    }
                    TransferMode::Remote => {
                        self.reserve(PendingAction::Transferring)?;
                        Ok(Step::Dispatch(self.call(
                            PendingAction::Transferring,
                            CustodyRequest::TransferFrom(TransferRequest {
                                user_name: session.identifier,
                                from_address: session.address,
                                to_address: target_address,
                                amount,
                                tnx_type: TransactionKind::Transfer,
                            }),
                            Some(coin_type),
                        )))
                    }
                }
            }
            WalletCommand::RefreshBalance => {
                let session = self.session()?;
                self.reserve(PendingAction::RefreshingBalance)?;
                Ok(Step::Dispatch(self.call(
                    PendingAction::RefreshingBalance,
                    CustodyRequest::FetchBalance {
                        address: session.address,
                    },
                    None,
                )))
            }
            WalletCommand::LoadCustomers => {
                self.reserve(PendingAction::LoadingCustomers)?;
                Ok(Step::Dispatch(self.call(
                    PendingAction::LoadingCustomers,
                    CustodyRequest::ListCustomers,
                    None,
                )))
            }
        }
    }

    /// Applies the result of a dispatched call and releases its pending slot.
    pub fn complete(
        &mut self,
        call: PendingCall,
        result: Result<CustodyResponse, PortError>,
    ) -> Result<Completion, PortError> {
        // Customer lists do not belong to a session.
        if call.session_generation != self.state.session_generation
            && call.action != PendingAction::LoadingCustomers
        {
            tracing::debug!(action = ?call.action, "dropping result from a previous session");
            return Ok(Completion::settled(CommandOutcome::Discarded));
        }
        self.state.pending.remove(&call.action);

        let completion = self.complete_inner(&call, result);
        if let Err(err) = &completion {
            tracing::warn!(action = ?call.action, error = %err, "custody call failed");
            if !call.follow_up {
                self.state.notice = Some(Notice::error(err.to_string()));
            }
        }
        completion
    }

    fn complete_inner(
        &mut self,
        call: &PendingCall,
        result: Result<CustodyResponse, PortError>,
    ) -> Result<Completion, PortError> {
        match &call.request {
            CustodyRequest::CreateOwnerAddress(CreateOwnerAddressRequest { user_name })
            | CustodyRequest::LookupOwnerAddress { user_name } => {
                let credentials = match result? {
                    CustodyResponse::OwnerCredentials(c) => c,
                    other => return Err(unexpected(call, &other)),
                };
                let address = credentials.address.clone();
                self.state = apply_wallet_created(&self.state, user_name, credentials)?;
                let message = match call.request {
                    CustodyRequest::LookupOwnerAddress { .. } => "Wallet loaded successfully!",
                    _ => "Wallet created successfully!",
                };
                self.state.notice = Some(Notice::success(message));
                tracing::info!(%address, "wallet session started");
                Ok(Completion {
                    outcome: CommandOutcome::WalletCreated { address },
                    follow_up: self.follow_up_refresh(),
                })
            }
            CustodyRequest::FetchBalance { address } => {
                if call.balance_generation != self.state.balance_generation {
                    tracing::debug!(
                        %address,
                        "dropping balance read taken before the last balance change"
                    );
                    let follow_up = if std::mem::take(&mut self.state.refresh_owed) {
                        self.follow_up_refresh()
                    } else {
                        None
                    };
                    return Ok(Completion {
                        outcome: CommandOutcome::Discarded,
                        follow_up,
                    });
                }
                let balance = match result? {
                    CustodyResponse::Balance(b) => b,
                    other => return Err(unexpected(call, &other)),
                };
                if !self.is_session_address(address) {
                    return Ok(Completion::settled(CommandOutcome::Discarded));
                }
                self.state = apply_balance(&self.state, balance)?;
                Ok(Completion::settled(CommandOutcome::BalanceRefreshed(balance)))
            }
            CustodyRequest::Mint(req) => match result {
                Ok(_) => {
                    self.state = apply_deposit_settled(&self.state, true)?;
                    self.state.notice = Some(Notice::success("Tokens minted successfully!"));
                    Ok(Completion {
                        outcome: CommandOutcome::Deposited {
                            amount: req.amount,
                            coin_type: req.coin_type,
                        },
                        follow_up: self.follow_up_refresh(),
                    })
                }
                Err(err) => {
                    self.state = apply_deposit_settled(&self.state, false)?;
                    Err(err)
                }
            },
            CustodyRequest::Approve(req) => match result {
                Ok(_) => {
                    let coin_type = call.coin_type.unwrap_or(self.profile.default_coin);
                    if call.approval_generation != self.state.approval_generation {
                        self.state.notice = Some(Notice::info(
                            "Approval inputs changed while the request was in flight. \
                             Approve again to continue.",
                        ));
                        return Ok(Completion::settled(CommandOutcome::Discarded));
                    }
                    self.state = apply_approve_succeeded(&self.state, req.amount, coin_type)?;
                    self.state.notice = Some(Notice::success("Tokens approved successfully!"));
                    Ok(Completion::settled(CommandOutcome::Approved {
                        amount: req.amount,
                        coin_type,
                    }))
                }
                Err(err) => {
                    self.state = apply_approve_failed(&self.state)?;
                    Err(err)
                }
            },
            CustodyRequest::TransferFrom(req) => {
                result?;
                let coin_type = call.coin_type.unwrap_or(self.profile.default_coin);
                self.state = apply_transfer(&self.state, req.amount)?;
                self.state.notice = Some(Notice::success(transfer_message(
                    req.amount,
                    coin_type,
                    &req.to_address,
                    self.state.balance,
                )));
                Ok(Completion {
                    outcome: CommandOutcome::Transferred {
                        amount: req.amount,
                        coin_type,
                        target_address: req.to_address.clone(),
                        remaining: self.state.balance,
                    },
                    follow_up: self.follow_up_refresh(),
                })
            }
            CustodyRequest::ListCustomers => match result? {
                CustodyResponse::Customers(customers) => {
                    Ok(Completion::settled(CommandOutcome::CustomersLoaded(customers)))
                }
                other => Err(unexpected(call, &other)),
            },
        }
    }

    /// Applies a balance read outside the controller (the poller). Ignored when
    /// `address` is no longer the session address.
    pub fn observe_balance(&mut self, address: &str, balance: Amount) -> Result<bool, PortError> {
        if !self.is_session_address(address) {
            return Ok(false);
        }
        self.state = apply_balance(&self.state, balance)?;
        Ok(true)
    }

    pub fn set_owner_address(&mut self, address: &str) -> Result<(), PortError> {
        self.state = apply_owner_address_changed(&self.state, address)?;
        Ok(())
    }

    pub fn approve_amount_changed(&mut self) -> Result<(), PortError> {
        if self.state.allowance.is_some() || self.state.is_pending(PendingAction::Approving) {
            self.state = apply_approve_amount_changed(&self.state)?;
        }
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), PortError> {
        self.state = apply_logout(&self.state)?;
        tracing::info!("wallet session cleared");
        Ok(())
    }

    pub fn dismiss_notice(&mut self) {
        self.state.notice = None;
    }

    fn session(&self) -> Result<WalletSession, PortError> {
        self.state
            .session
            .clone()
            .ok_or_else(|| PortError::Policy(NO_WALLET.to_owned()))
    }

    fn is_session_address(&self, address: &str) -> bool {
        self.state
            .session
            .as_ref()
            .is_some_and(|s| s.address == address)
    }

    fn check_coin(&self, coin_type: CoinType) -> Result<(), PortError> {
        if !self.profile.coin_types.contains(&coin_type) {
            return Err(PortError::Validation(format!(
                "{coin_type} is not offered on {}.",
                self.profile.title
            )));
        }
        Ok(())
    }

    fn reserve(&mut self, action: PendingAction) -> Result<(), PortError> {
        if !self.state.pending.insert(action) {
            return Err(PortError::Conflict(format!(
                "{} Please wait for the current request to finish.",
                action.label()
            )));
        }
        Ok(())
    }

    fn call(
        &self,
        action: PendingAction,
        request: CustodyRequest,
        coin_type: Option<CoinType>,
    ) -> PendingCall {
        PendingCall {
            action,
            request,
            coin_type,
            session_generation: self.state.session_generation,
            approval_generation: self.state.approval_generation,
            balance_generation: self.state.balance_generation,
            follow_up: false,
        }
    }

    /// Schedules a balance read after a call that moved funds. When a read is
    /// already in flight it is stale, so the refresh is issued once it lands.
    fn follow_up_refresh(&mut self) -> Option<PendingCall> {
        let address = self.state.session.as_ref()?.address.clone();
        if self.reserve(PendingAction::RefreshingBalance).is_err() {
            self.state.refresh_owed = true;
            return None;
        }
        let mut call = self.call(
            PendingAction::RefreshingBalance,
            CustodyRequest::FetchBalance { address },
            None,
        );
        call.follow_up = true;
        Some(call)
    }
}

fn transfer_message(amount: Amount, coin_type: CoinType, target: &str, remaining: Amount) -> String {
    format!(
        "{amount} {coin_type} transferred to custodial wallet ({target}). \
         Remaining: {remaining} {coin_type}."
    )
}

fn unexpected(call: &PendingCall, response: &CustodyResponse) -> PortError {
    PortError::Transport(format!(
        "unexpected response for {:?}: {response:?}",
        call.action
    ))
}
