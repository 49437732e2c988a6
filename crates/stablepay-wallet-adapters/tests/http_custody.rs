mod common;

use serde_json::json;

use common::{MockServer, ALICE, ALICE_ADDRESS, ALICE_KEY};
use stablepay_wallet_adapters::{CustodyEndpoints, CustodyServiceAdapter};
use stablepay_wallet_core::{
    Amount, CoinType, CommandOutcome, CreateOwnerAddressRequest, CustodyServicePort, MintRequest,
    PortError, WalletCommand, WalletController, WorkflowProfile,
};

#[test]
fn workflow_runs_against_http_backend() {
    let server = MockServer::custody_backend();
    let mut ctl = WalletController::new(server.adapter(), WorkflowProfile::dexi());

    ctl.handle(WalletCommand::CreateWallet {
        identifier: ALICE.to_owned(),
    })
    .expect("create");
    ctl.handle(WalletCommand::Deposit {
        amount: "100".to_owned(),
        coin_type: CoinType::Usdc,
    })
    .expect("deposit");
    assert_eq!(ctl.state().balance.to_string(), "100.00");

    ctl.handle(WalletCommand::Approve {
        amount: "40".to_owned(),
        coin_type: CoinType::Usdc,
    })
    .expect("approve");
    let outcome = ctl
        .handle(WalletCommand::Transfer {
            target_address: "0xCUST1".to_owned(),
            amount: "40".to_owned(),
            coin_type: CoinType::Usdc,
        })
        .expect("transfer");
    assert!(matches!(outcome, CommandOutcome::Transferred { .. }));
    assert_eq!(ctl.state().balance.to_string(), "60.00");
    assert_eq!(ctl.state().allowance_amount().to_string(), "0.00");

    let balance_path = format!("GET /api/{ALICE_ADDRESS}/balance");
    assert_eq!(
        server.paths(),
        vec![
            "POST /api/wallet/createOwnerAddress".to_owned(),
            balance_path.clone(),
            "POST /api/mint".to_owned(),
            balance_path.clone(),
            "POST /api/wallet/approve".to_owned(),
            "POST /api/dex/transferFrom".to_owned(),
            balance_path,
        ]
    );
}

#[test]
fn request_bodies_match_backend_contract() {
    let server = MockServer::custody_backend();
    let mut ctl = WalletController::new(server.adapter(), WorkflowProfile::dexi());
    ctl.handle(WalletCommand::CreateWallet {
        identifier: ALICE.to_owned(),
    })
    .expect("create");
    ctl.handle(WalletCommand::Deposit {
        amount: "25.5".to_owned(),
        coin_type: CoinType::Usdc,
    })
    .expect("deposit");
    ctl.handle(WalletCommand::Approve {
        amount: "10".to_owned(),
        coin_type: CoinType::Usdc,
    })
    .expect("approve");

    let requests = server.requests();
    let create = &requests[0];
    assert_eq!(create.body, json!({"user_name": ALICE}));

    let mint = requests
        .iter()
        .find(|r| r.path() == "/api/mint")
        .expect("mint request");
    assert_eq!(mint.body["toAddress"], ALICE_ADDRESS);
    assert_eq!(mint.body["user_name"], ALICE);
    assert_eq!(mint.body["coinType"], "USDC");
    assert_eq!(mint.body["amount"], "25.5");

    let approve = requests
        .iter()
        .find(|r| r.path() == "/api/wallet/approve")
        .expect("approve request");
    assert_eq!(approve.body["ownerAddress"], ALICE_ADDRESS);
    assert_eq!(approve.body["ownerPrivateKey"], ALICE_KEY);
    assert_eq!(approve.body["amount"], "10");
}

#[test]
fn error_message_from_body_is_surfaced() {
    let server = MockServer::start(|_| (400, json!({"message": "Insufficient funds on chain"})));
    let adapter = server.adapter();

    let err = adapter
        .mint(&MintRequest {
            to_address: ALICE_ADDRESS.to_owned(),
            amount: Amount::from(1),
            user_name: ALICE.to_owned(),
            coin_type: CoinType::Usdc,
        })
        .expect_err("rejected");
    assert_eq!(
        err,
        PortError::Rejected {
            status: 400,
            message: "Insufficient funds on chain".to_owned()
        }
    );
}

#[test]
fn missing_error_message_uses_operation_fallback() {
    let server = MockServer::start(|_| (500, serde_json::Value::Null));
    let adapter = server.adapter();

    let err = adapter
        .create_owner_address(&CreateOwnerAddressRequest {
            user_name: ALICE.to_owned(),
        })
        .expect_err("rejected");
    assert_eq!(err.to_string(), "Failed to create wallet");

    let err = adapter.fetch_balance(ALICE_ADDRESS).expect_err("rejected");
    assert_eq!(err.to_string(), "Failed to fetch balance");

    let err = adapter.list_customers().expect_err("rejected");
    assert_eq!(err.to_string(), "Failed to load customers");
}

#[test]
fn balance_accepts_strings_numbers_and_missing_field() {
    let server = MockServer::start(|req| match req.path() {
        "/api/0xA/balance" => (200, json!({"balance": "12.5"})),
        "/api/0xB/balance" => (200, json!({"balance": 7})),
        _ => (200, json!({})),
    });
    let adapter = server.adapter();

    assert_eq!(
        adapter.fetch_balance("0xA").expect("string").to_string(),
        "12.50"
    );
    assert_eq!(adapter.fetch_balance("0xB").expect("number"), Amount::from(7));
    assert!(adapter.fetch_balance("0xC").expect("missing").is_zero());
}

#[test]
fn balance_address_is_encoded_as_one_path_segment() {
    let server = MockServer::start(|_| (200, json!({"balance": "3"})));
    let adapter = server.adapter();

    adapter.fetch_balance("0xA B/C").expect("balance");
    assert_eq!(server.paths(), vec!["GET /api/0xA%20B%2FC/balance"]);
}

#[test]
fn customers_accept_bare_array_and_data_envelope() {
    let bare = MockServer::start(|_| {
        (
            200,
            json!([{"id": "c-9", "email": "bob@example.com", "name": "Bob"}]),
        )
    });
    let customers = bare.adapter().list_customers().expect("bare array");
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].id, "c-9");

    let wrapped = MockServer::start(|_| {
        (
            200,
            json!({"data": [{"CUST_ID": 3, "email": "carol@example.com"}]}),
        )
    });
    let customers = wrapped.adapter().list_customers().expect("envelope");
    assert_eq!(customers[0].id, "3");
    assert_eq!(customers[0].email, "carol@example.com");
}

#[test]
fn owner_lookup_encodes_username_query() {
    let server = MockServer::custody_backend();
    let credentials = server
        .adapter()
        .lookup_owner_address(ALICE)
        .expect("lookup");
    assert_eq!(credentials.address, ALICE_ADDRESS);

    let requests = server.requests();
    assert_eq!(requests[0].path(), "/api/bankAdmin/getOwnerAddress");
    assert_eq!(requests[0].url, "/api/bankAdmin/getOwnerAddress?username=alice%40example.com");
}

#[test]
fn create_without_address_is_rejected() {
    let server = MockServer::start(|_| (200, json!({"privateKey": "0xKEY"})));
    let err = server
        .adapter()
        .create_owner_address(&CreateOwnerAddressRequest {
            user_name: ALICE.to_owned(),
        })
        .expect_err("invalid payload");
    assert!(matches!(err, PortError::Transport(_)));
    assert!(err.to_string().contains("invalid wallet data returned"));
}

#[test]
fn create_without_private_key_still_yields_session() {
    let server = MockServer::start(|_| (200, json!({"address": "0xABC"})));
    let credentials = server
        .adapter()
        .create_owner_address(&CreateOwnerAddressRequest {
            user_name: ALICE.to_owned(),
        })
        .expect("address only");
    assert_eq!(credentials.address, "0xABC");
    assert!(credentials.private_key.is_none());
}

#[test]
fn create_wallet_path_is_configurable() {
    let server = MockServer::start(|req| match req.path() {
        "/api/wallet/createOwnerAddress1" => (200, json!({"address": "0xDEF"})),
        _ => (404, json!({"message": "wrong path"})),
    });
    let mut config = server.config();
    config.endpoints = CustodyEndpoints {
        create_owner_address: "/api/wallet/createOwnerAddress1".to_owned(),
        ..CustodyEndpoints::default()
    };
    let adapter = CustodyServiceAdapter::with_config(config);
    assert_eq!(adapter.mode_name(), "http");

    let credentials = adapter
        .create_owner_address(&CreateOwnerAddressRequest {
            user_name: ALICE.to_owned(),
        })
        .expect("custom path");
    assert_eq!(credentials.address, "0xDEF");
}

#[test]
fn unreachable_backend_is_a_transport_error() {
    let adapter = CustodyServiceAdapter::with_config(stablepay_wallet_adapters::CustodyAdapterConfig {
        base_url: Some("http://127.0.0.1:9".to_owned()),
        timeout_ms: 500,
        ..Default::default()
    });
    let err = adapter.fetch_balance(ALICE_ADDRESS).expect_err("unreachable");
    assert!(matches!(err, PortError::Transport(_)));
}
