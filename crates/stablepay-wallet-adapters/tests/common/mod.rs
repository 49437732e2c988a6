#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use stablepay_wallet_adapters::{CustodyAdapterConfig, CustodyServiceAdapter};
use stablepay_wallet_core::{parse_amount_value, Amount};

pub const ALICE: &str = "alice@example.com";
pub const ALICE_ADDRESS: &str = "0xAAA0000000000000000000000000000000000001";
pub const ALICE_KEY: &str = "0xKEY0000000000000000000000000000000000000000000000000000000000001";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: Value,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}

pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, Value) + Send + 'static,
    {
        let server = Server::http("127.0.0.1:0").expect("start server");
        let base_url = format!("http://{}", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        thread::spawn(move || {
            for mut req in server.incoming_requests() {
                let mut raw = String::new();
                let _ = req.as_reader().read_to_string(&mut raw);
                let recorded_req = RecordedRequest {
                    method: req.method().to_string(),
                    url: req.url().to_owned(),
                    body: serde_json::from_str(&raw).unwrap_or(Value::Null),
                };
                let (code, payload) = handler(&recorded_req);
                if let Ok(mut g) = recorded.lock() {
                    g.push(recorded_req);
                }
                let body = match payload {
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                let response = Response::from_string(body).with_status_code(StatusCode(code));
                let _ = req.respond(response);
            }
        });

        Self { base_url, requests }
    }

    /// A backend that answers every endpoint like the custody API would.
    pub fn custody_backend() -> Self {
        let balances = Mutex::new(HashMap::<String, Amount>::new());
        Self::start(move |req| {
            let mut balances = balances.lock().expect("balances lock");
            match (req.method.as_str(), req.path()) {
                ("POST", "/api/wallet/createOwnerAddress") => (
                    200,
                    json!({"address": ALICE_ADDRESS, "privateKey": ALICE_KEY}),
                ),
                ("GET", "/api/bankAdmin/getOwnerAddress") => (
                    200,
                    json!({"address": ALICE_ADDRESS, "privateKey": ALICE_KEY}),
                ),
                ("POST", "/api/mint") => {
                    let to = req.body["toAddress"].as_str().unwrap_or_default().to_owned();
                    let amount = parse_amount_value(&req.body["amount"]);
                    let current = balances.get(&to).copied().unwrap_or(Amount::ZERO);
                    balances.insert(to, Amount::new(current.value() + amount.value()));
                    (200, json!({"success": true}))
                }
                ("POST", "/api/wallet/approve") => (200, json!({"success": true})),
                ("POST", "/api/dex/transferFrom") => {
                    let from = req.body["fromAddress"].as_str().unwrap_or_default().to_owned();
                    let amount = parse_amount_value(&req.body["amount"]);
                    let current = balances.get(&from).copied().unwrap_or(Amount::ZERO);
                    balances.insert(from, current.saturating_sub(amount));
                    (200, json!({"txHash": "0x01"}))
                }
                ("GET", "/api/customers") => (
                    200,
                    json!({"data": [{"CUST_ID": 1, "email": ALICE, "name": "Alice"}]}),
                ),
                ("GET", path) if path.ends_with("/balance") => {
                    let address = path
                        .trim_start_matches("/api/")
                        .trim_end_matches("/balance");
                    let balance = balances.get(address).copied().unwrap_or(Amount::ZERO);
                    (200, json!({"balance": balance.value().to_string()}))
                }
                _ => (404, json!({"message": "no such route"})),
            }
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path()))
            .collect()
    }

    pub fn config(&self) -> CustodyAdapterConfig {
        CustodyAdapterConfig {
            base_url: Some(self.base_url.clone()),
            timeout_ms: 5_000,
            ..CustodyAdapterConfig::default()
        }
    }

    pub fn adapter(&self) -> CustodyServiceAdapter {
        CustodyServiceAdapter::with_config(self.config())
    }
}
