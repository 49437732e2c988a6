#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use stablepay_wallet_core::{
    Amount, ApproveRequest, CreateOwnerAddressRequest, CustodyServicePort, Customer, MintRequest,
    OwnerCredentials, PortError, TransferRequest, WalletCommand, WalletController,
    WorkflowProfile,
};

pub const ALICE: &str = "alice@example.com";
pub const ALICE_ADDRESS: &str = "0xAAA0000000000000000000000000000000000001";
pub const ALICE_KEY: &str = "0xKEY0000000000000000000000000000000000000000000000000000000000001";

/// Ledger-backed port that records every call it receives.
#[derive(Debug, Default)]
pub struct RecordingCustody {
    calls: Mutex<Vec<String>>,
    balances: Mutex<HashMap<String, Amount>>,
    failures: Mutex<HashMap<&'static str, PortError>>,
}

impl RecordingCustody {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    /// Makes every later call of `op` fail with `err`.
    pub fn fail(&self, op: &'static str, err: PortError) {
        self.failures.lock().expect("failures lock").insert(op, err);
    }

    pub fn heal(&self, op: &'static str) {
        self.failures.lock().expect("failures lock").remove(op);
    }

    pub fn set_balance(&self, address: &str, amount: Amount) {
        self.balances
            .lock()
            .expect("balances lock")
            .insert(address.to_owned(), amount);
    }

    fn record(&self, op: &'static str) -> Result<(), PortError> {
        self.calls.lock().expect("calls lock").push(op.to_owned());
        match self.failures.lock().expect("failures lock").get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn balance_of(&self, address: &str) -> Amount {
        self.balances
            .lock()
            .expect("balances lock")
            .get(address)
            .copied()
            .unwrap_or(Amount::ZERO)
    }
}

impl CustodyServicePort for RecordingCustody {
    fn create_owner_address(
        &self,
        _request: &CreateOwnerAddressRequest,
    ) -> Result<OwnerCredentials, PortError> {
        self.record("create")?;
        Ok(OwnerCredentials {
            address: ALICE_ADDRESS.to_owned(),
            private_key: Some(ALICE_KEY.to_owned()),
        })
    }

    fn lookup_owner_address(&self, _user_name: &str) -> Result<OwnerCredentials, PortError> {
        self.record("lookup")?;
        Ok(OwnerCredentials {
            address: ALICE_ADDRESS.to_owned(),
            private_key: None,
        })
    }

    fn fetch_balance(&self, address: &str) -> Result<Amount, PortError> {
        self.record("balance")?;
        Ok(self.balance_of(address))
    }

    fn mint(&self, request: &MintRequest) -> Result<(), PortError> {
        self.record("mint")?;
        let current = self.balance_of(&request.to_address);
        self.set_balance(
            &request.to_address,
            Amount::new(current.value() + request.amount.value()),
        );
        Ok(())
    }

    fn approve(&self, _request: &ApproveRequest) -> Result<(), PortError> {
        self.record("approve")
    }

    fn transfer_from(&self, request: &TransferRequest) -> Result<(), PortError> {
        self.record("transfer")?;
        let from = self.balance_of(&request.from_address);
        self.set_balance(&request.from_address, from.saturating_sub(request.amount));
        let to = self.balance_of(&request.to_address);
        self.set_balance(
            &request.to_address,
            Amount::new(to.value() + request.amount.value()),
        );
        Ok(())
    }

    fn list_customers(&self) -> Result<Vec<Customer>, PortError> {
        self.record("customers")?;
        Ok(vec![Customer {
            id: "1".to_owned(),
            email: ALICE.to_owned(),
            name: Some("Alice".to_owned()),
        }])
    }
}

pub type TestController = WalletController<RecordingCustody>;

pub fn new_controller() -> TestController {
    WalletController::new(RecordingCustody::default(), WorkflowProfile::dexi())
}

pub fn new_controller_with(profile: WorkflowProfile) -> TestController {
    WalletController::new(RecordingCustody::default(), profile)
}

pub fn create_wallet(ctl: &mut TestController) {
    ctl.handle(WalletCommand::CreateWallet {
        identifier: ALICE.to_owned(),
    })
    .expect("create wallet");
}

pub fn funded_wallet(ctl: &mut TestController, amount: &str) {
    create_wallet(ctl);
    ctl.handle(WalletCommand::Deposit {
        amount: amount.to_owned(),
        coin_type: stablepay_wallet_core::CoinType::Usdc,
    })
    .expect("deposit");
}
