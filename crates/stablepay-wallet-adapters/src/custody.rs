use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value;

use stablepay_wallet_core::{
    parse_amount_value, Amount, ApproveRequest, CreateOwnerAddressRequest, CustodyServicePort,
    Customer, MintRequest, OwnerCredentials, PortError, TransferRequest,
};

use crate::config::{CustodyAdapterConfig, CustodyEndpoints};

const CREATE_FAILED: &str = "Failed to create wallet";
const LOOKUP_FAILED: &str = "Failed to fetch owner address";
const BALANCE_FAILED: &str = "Failed to fetch balance";
const MINT_FAILED: &str = "Failed to mint tokens";
const APPROVE_FAILED: &str = "Failed to approve tokens";
const TRANSFER_FAILED: &str = "Transfer failed";
const CUSTOMERS_FAILED: &str = "Failed to load customers";

/// Custody backend client. Cloning shares the underlying HTTP client or
/// in-memory ledger.
#[derive(Debug, Clone)]
pub struct CustodyServiceAdapter {
    mode: CustodyMode,
}

#[derive(Debug, Clone)]
enum CustodyMode {
    Disabled(String),
    InMemory(Arc<Mutex<Ledger>>),
    Http(HttpRuntime),
}

#[derive(Debug, Clone)]
struct HttpRuntime {
    base_url: String,
    client: reqwest::blocking::Client,
    endpoints: CustodyEndpoints,
}

#[derive(Debug, Default)]
struct Ledger {
    next_wallet: u64,
    owners: HashMap<String, OwnerCredentials>,
    balances: HashMap<String, Amount>,
    allowances: HashMap<String, Amount>,
    customers: Vec<Customer>,
}

impl Default for CustodyServiceAdapter {
    fn default() -> Self {
        Self::with_config(CustodyAdapterConfig::from_env())
    }
}

impl CustodyServiceAdapter {
    pub fn with_config(config: CustodyAdapterConfig) -> Self {
        let mode = if let Some(ref base_url) = config.base_url {
            match reqwest::blocking::Client::builder()
                .timeout(config.timeout())
                .build()
            {
                Ok(client) => CustodyMode::Http(HttpRuntime {
                    base_url: base_url.trim_end_matches('/').to_owned(),
                    client,
                    endpoints: config.endpoints.clone(),
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        CustodyMode::Disabled(format!(
                            "failed to initialize custody HTTP client in production profile: {e}"
                        ))
                    } else {
                        tracing::warn!(error = %e, "custody HTTP client unavailable, using in-memory ledger");
                        CustodyMode::InMemory(Arc::default())
                    }
                }
            }
        } else if config.strict_runtime_required() {
            CustodyMode::Disabled(
                "custody API base URL not configured in production runtime profile".to_owned(),
            )
        } else {
            CustodyMode::InMemory(Arc::default())
        };

        Self { mode }
    }

    pub fn in_memory() -> Self {
        Self {
            mode: CustodyMode::InMemory(Arc::default()),
        }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            mode: CustodyMode::Disabled(reason.into()),
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self.mode {
            CustodyMode::Disabled(_) => "disabled",
            CustodyMode::InMemory(_) => "in-memory",
            CustodyMode::Http(_) => "http",
        }
    }

    /// Adds a customer to the in-memory ledger. Ignored in other modes.
    pub fn seed_customer(&self, customer: Customer) -> Result<(), PortError> {
        if let CustodyMode::InMemory(ledger) = &self.mode {
            lock(ledger)?.customers.push(customer);
        }
        Ok(())
    }

    /// Allowance recorded by the in-memory ledger for `owner_address`.
    pub fn ledger_allowance(&self, owner_address: &str) -> Result<Option<Amount>, PortError> {
        match &self.mode {
            CustodyMode::InMemory(ledger) => {
                Ok(lock(ledger)?.allowances.get(owner_address).copied())
            }
            _ => Ok(None),
        }
    }

    fn ledger(&self) -> Result<Option<MutexGuard<'_, Ledger>>, PortError> {
        match &self.mode {
            CustodyMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            CustodyMode::InMemory(ledger) => lock(ledger).map(Some),
            CustodyMode::Http(_) => Ok(None),
        }
    }

    fn http(&self) -> Result<&HttpRuntime, PortError> {
        match &self.mode {
            CustodyMode::Http(http) => Ok(http),
            CustodyMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            CustodyMode::InMemory(_) => Err(PortError::Policy(
                "custody HTTP runtime not enabled".to_owned(),
            )),
        }
    }
}

impl CustodyServicePort for CustodyServiceAdapter {
    fn create_owner_address(
        &self,
        request: &CreateOwnerAddressRequest,
    ) -> Result<OwnerCredentials, PortError> {
        if let Some(mut ledger) = self.ledger()? {
            return Ok(ledger.create_owner(&request.user_name));
        }
        let http = self.http()?;
        let body = http.post(&http.endpoints.create_owner_address, request, CREATE_FAILED)?;
        parse_credentials(&body, CREATE_FAILED)
    }

    fn lookup_owner_address(&self, user_name: &str) -> Result<OwnerCredentials, PortError> {
        if let Some(ledger) = self.ledger()? {
            return ledger
                .owners
                .get(user_name)
                .cloned()
                .ok_or_else(|| PortError::NotFound(format!("owner address for {user_name}")));
        }
        let http = self.http()?;
        let body = http.get(
            &http.endpoints.owner_lookup,
            &[("username", user_name)],
            LOOKUP_FAILED,
        )?;
        parse_credentials(&body, LOOKUP_FAILED)
    }

    fn fetch_balance(&self, address: &str) -> Result<Amount, PortError> {
        if let Some(ledger) = self.ledger()? {
            return Ok(ledger.balance(address));
        }
        let http = self.http()?;
        let body = http.get(&http.endpoints.balance_path(address), &[], BALANCE_FAILED)?;
        Ok(body
            .get("balance")
            .map(parse_amount_value)
            .unwrap_or(Amount::ZERO))
    }

    fn mint(&self, request: &MintRequest) -> Result<(), PortError> {
        if let Some(mut ledger) = self.ledger()? {
            return ledger.credit(&request.to_address, request.amount, MINT_FAILED);
        }
        let http = self.http()?;
        http.post(&http.endpoints.mint, request, MINT_FAILED)
            .map(|_| ())
    }

    fn approve(&self, request: &ApproveRequest) -> Result<(), PortError> {
        if let Some(mut ledger) = self.ledger()? {
            if request.amount > ledger.balance(&request.owner_address) {
                return Err(PortError::Rejected {
                    status: 400,
                    message: APPROVE_FAILED.to_owned(),
                });
            }
            ledger
                .allowances
                .insert(request.owner_address.clone(), request.amount);
            return Ok(());
        }
        let http = self.http()?;
        http.post(&http.endpoints.approve, request, APPROVE_FAILED)
            .map(|_| ())
    }

    fn transfer_from(&self, request: &TransferRequest) -> Result<(), PortError> {
        if let Some(mut ledger) = self.ledger()? {
            return ledger.transfer(request);
        }
        let http = self.http()?;
        http.post(&http.endpoints.transfer_from, request, TRANSFER_FAILED)
            .map(|_| ())
    }

    fn list_customers(&self) -> Result<Vec<Customer>, PortError> {
        if let Some(ledger) = self.ledger()? {
            return Ok(ledger.customers.clone());
        }
        let http = self.http()?;
        let body = http.get(&http.endpoints.customers, &[], CUSTOMERS_FAILED)?;
        parse_customers(body)
    }
}

impl HttpRuntime {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        fallback: &'static str,
    ) -> Result<Value, PortError> {
        let response = self
            .client
            .get(self.url(path))
            .header("accept", "*/*")
            .query(query)
            .send()
            .map_err(|e| PortError::Transport(format!("{fallback}: {e}")))?;
        read_response("GET", path, response, fallback)
    }

    fn post<B>(&self, path: &str, body: &B, fallback: &'static str) -> Result<Value, PortError>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .map_err(|e| PortError::Transport(format!("{fallback}: {e}")))?;
        read_response("POST", path, response, fallback)
    }
}

/// Decodes the body and maps non-2xx statuses to `Rejected`, preferring the
/// server's `message` over `fallback`.
fn read_response(
    method: &'static str,
    path: &str,
    response: reqwest::blocking::Response,
    fallback: &'static str,
) -> Result<Value, PortError> {
    let status = response.status();
    tracing::debug!(method, path, status = status.as_u16(), "custody response");
    let text = response
        .text()
        .map_err(|e| PortError::Transport(format!("{fallback}: {e}")))?;
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    if !status.is_success() {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_owned();
        return Err(PortError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(body)
}

fn parse_credentials(body: &Value, fallback: &'static str) -> Result<OwnerCredentials, PortError> {
    let address = body
        .get("address")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| PortError::Transport(format!("{fallback}: invalid wallet data returned")))?;
    let private_key = body
        .get("privateKey")
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
        .map(str::to_owned);
    Ok(OwnerCredentials {
        address: address.to_owned(),
        private_key,
    })
}

fn parse_customers(body: Value) -> Result<Vec<Customer>, PortError> {
    let list = match body {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(list)
        .map_err(|e| PortError::Transport(format!("{CUSTOMERS_FAILED}: {e}")))
}

fn overflow(fallback: &str) -> PortError {
    PortError::Rejected {
        status: 400,
        message: format!("{fallback}: balance overflow"),
    }
}

fn lock(ledger: &Mutex<Ledger>) -> Result<MutexGuard<'_, Ledger>, PortError> {
    ledger
        .lock()
        .map_err(|e| PortError::Transport(format!("custody ledger lock poisoned: {e}")))
}

impl Ledger {
    fn create_owner(&mut self, user_name: &str) -> OwnerCredentials {
        self.next_wallet += 1;
        let credentials = OwnerCredentials {
            address: format!("0x{:040x}", self.next_wallet),
            private_key: Some(format!("0x{:064x}", self.next_wallet)),
        };
        self.owners.insert(user_name.to_owned(), credentials.clone());
        credentials
    }

    fn balance(&self, address: &str) -> Amount {
        self.balances.get(address).copied().unwrap_or(Amount::ZERO)
    }

    fn credit(&mut self, address: &str, amount: Amount, fallback: &str) -> Result<(), PortError> {
        let next = self
            .balance(address)
            .checked_add(amount)
            .ok_or_else(|| overflow(fallback))?;
        self.balances.insert(address.to_owned(), next);
        Ok(())
    }

    fn transfer(&mut self, request: &TransferRequest) -> Result<(), PortError> {
        let allowance = self
            .allowances
            .get(&request.from_address)
            .copied()
            .unwrap_or(Amount::ZERO);
        if request.amount > allowance || request.amount > self.balance(&request.from_address) {
            return Err(PortError::Rejected {
                status: 400,
                message: TRANSFER_FAILED.to_owned(),
            });
        }
        // Checked up front so an overflow leaves both balances untouched.
        if self
            .balance(&request.to_address)
            .checked_add(request.amount)
            .is_none()
        {
            return Err(overflow(TRANSFER_FAILED));
        }
        let remaining = self.balance(&request.from_address).saturating_sub(request.amount);
        self.balances.insert(request.from_address.clone(), remaining);
        self.allowances.remove(&request.from_address);
        self.credit(&request.to_address, request.amount, TRANSFER_FAILED)
    }
}
