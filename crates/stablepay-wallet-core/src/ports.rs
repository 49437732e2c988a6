use thiserror::Error;

use crate::domain::{
    Amount, ApproveRequest, CreateOwnerAddressRequest, Customer, MintRequest, OwnerCredentials,
    TransferRequest,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Policy(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("not found: {0}")]
    NotFound(String),
}

impl PortError {
    /// True when the error was raised before anything reached the custody service.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            PortError::Validation(_) | PortError::Policy(_) | PortError::Conflict(_)
        )
    }
}

/// Remote custody backend consumed by the wallet workflow.
pub trait CustodyServicePort {
    fn create_owner_address(
        &self,
        request: &CreateOwnerAddressRequest,
    ) -> Result<OwnerCredentials, PortError>;
    fn lookup_owner_address(&self, user_name: &str) -> Result<OwnerCredentials, PortError>;
    fn fetch_balance(&self, address: &str) -> Result<Amount, PortError>;
    fn mint(&self, request: &MintRequest) -> Result<(), PortError>;
    fn approve(&self, request: &ApproveRequest) -> Result<(), PortError>;
    fn transfer_from(&self, request: &TransferRequest) -> Result<(), PortError>;
    fn list_customers(&self) -> Result<Vec<Customer>, PortError>;
}
