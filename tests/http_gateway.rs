//! HTTP gateway against a mock node REST API.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cresca::config::NetworkConfig;
use cresca::error::WalletError;
use cresca::keys::{Address, KeyPair};
use cresca::network::{HttpGateway, NetworkGateway, ViewRequest};
use cresca::transaction::{
    EntryFunctionPayload, ModuleId, MoveArg, RawTransaction, SignedTransaction, TransactionSigner,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const KNOWN: &str = "0x00000000000000000000000000000000000000000000000000000000000000a1";

/// Request bodies and queries seen by the mock node.
#[derive(Default)]
struct Seen {
    submitted: Vec<Value>,
    simulated: Vec<Value>,
    views: Vec<Value>,
    queries: Vec<HashMap<String, String>>,
}

type Shared = Arc<Mutex<Seen>>;

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": message, "error_code": "not_found"})),
    )
        .into_response()
}

async fn account(Path(address): Path<String>) -> Response {
    if address == KNOWN {
        Json(json!({"sequence_number": "7", "authentication_key": KNOWN})).into_response()
    } else {
        not_found("Account not found by Address")
    }
}

async fn resource(Path((_address, _resource_type)): Path<(String, String)>) -> Response {
    not_found("Resource not found")
}

async fn account_transactions(
    State(seen): State<Shared>,
    Path(_address): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    seen.lock().unwrap().queries.push(query);
    Json(json!([{
        "type": "user_transaction",
        "hash": "0x01",
        "sender": KNOWN,
        "sequence_number": "0",
        "success": true,
        "vm_status": "Executed successfully",
        "gas_used": "9",
        "timestamp": "1700000000000000"
    }]))
}

async fn submit(State(seen): State<Shared>, Json(body): Json<Value>) -> Response {
    seen.lock().unwrap().submitted.push(body.clone());
    if body["sequence_number"] == "7" {
        (
            StatusCode::ACCEPTED,
            Json(json!({
                "hash": "0xabc",
                "sender": body["sender"],
                "sequence_number": body["sequence_number"],
                "payload": body["payload"]
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Invalid transaction: SEQUENCE_NUMBER_TOO_OLD",
                "error_code": "vm_error",
                "vm_error_code": 3
            })),
        )
            .into_response()
    }
}

async fn simulate(State(seen): State<Shared>, Json(body): Json<Value>) -> Response {
    let stale = body["sequence_number"] != "7";
    seen.lock().unwrap().simulated.push(body);
    if stale {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Invalid transaction: SEQUENCE_NUMBER_TOO_OLD",
                "error_code": "vm_error"
            })),
        )
            .into_response();
    }
    Json(json!([{"success": true, "gas_used": "12", "vm_status": "Executed successfully"}])).into_response()
}

async fn by_hash(Path(hash): Path<String>) -> Response {
    match hash.as_str() {
        "0xbroken" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream unavailable").into_response(),
        "0xpending" => Json(json!({
            "type": "pending_transaction",
            "hash": hash,
            "sender": KNOWN,
            "sequence_number": "7"
        }))
        .into_response(),
        "0xabc" => Json(json!({
            "type": "user_transaction",
            "hash": hash,
            "sender": KNOWN,
            "sequence_number": "7",
            "success": false,
            "vm_status": "Move abort: EINSUFFICIENT_BALANCE",
            "gas_used": "15",
            "timestamp": "1700000000000000"
        }))
        .into_response(),
        _ => not_found("Transaction not found"),
    }
}

async fn view(State(seen): State<Shared>, Json(body): Json<Value>) -> Response {
    let function = body["function"].as_str().unwrap_or_default().to_string();
    seen.lock().unwrap().views.push(body);
    if function.ends_with("::bogus") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "function not found", "error_code": "invalid_input"})),
        )
            .into_response();
    }
    Json(json!([true])).into_response()
}

async fn start_node() -> (HttpGateway, Shared) {
    let seen = Shared::default();
    let app = Router::new()
        .route("/v1/accounts/{address}", get(account))
        .route("/v1/accounts/{address}/resource/{resource_type}", get(resource))
        .route("/v1/accounts/{address}/transactions", get(account_transactions))
        .route("/v1/transactions", post(submit))
        .route("/v1/transactions/simulate", post(simulate))
        .route("/v1/transactions/by_hash/{hash}", get(by_hash))
        .route("/v1/view", post(view))
        .with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = NetworkConfig {
        url: format!("http://{}/v1", addr),
        request_timeout_secs: 5,
        ..Default::default()
    };
    (HttpGateway::new(&config).unwrap(), seen)
}

fn signed(sequence_number: u64) -> SignedTransaction {
    let keypair = KeyPair::from_private_key([3u8; 32]);
    let raw = RawTransaction {
        sender: keypair.address(),
        sequence_number,
        max_gas_amount: 200_000,
        gas_unit_price: 100,
        expiration_timestamp_secs: 1_700_000_030,
        payload: EntryFunctionPayload::new(
            ModuleId::new(Address::new([0xf5; 32]), "payments"),
            "tap_to_pay",
            vec![MoveArg::Address(Address::new([0xbb; 32])), MoveArg::U64(25)],
        ),
        chain_id: 250,
    };
    TransactionSigner::new().sign(&raw, &keypair)
}

#[tokio::test]
async fn account_lookup_distinguishes_absent_accounts() {
    let (gateway, _) = start_node().await;

    let known: Address = KNOWN.parse().unwrap();
    let account = gateway.get_account(&known).await.unwrap().unwrap();
    assert_eq!(account.sequence_number, 7);

    let unknown = Address::new([0x99; 32]);
    assert!(gateway.get_account(&unknown).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_resource_is_none() {
    let (gateway, _) = start_node().await;
    let known: Address = KNOWN.parse().unwrap();
    let resource = gateway
        .get_account_resource(&known, "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>")
        .await
        .unwrap();
    assert!(resource.is_none());
}

#[tokio::test]
async fn submission_uses_string_integers_and_no_chain_id() {
    let (gateway, seen) = start_node().await;
    let tx = signed(7);

    let pending = gateway.submit_transaction(&tx).await.unwrap();
    assert_eq!(pending.hash, "0xabc");
    assert_eq!(pending.sequence_number, 7);
    assert_eq!(pending.sender, tx.raw.sender);

    let seen = seen.lock().unwrap();
    let body = &seen.submitted[0];
    assert_eq!(body["sequence_number"], "7");
    assert_eq!(body["max_gas_amount"], "200000");
    assert_eq!(body["expiration_timestamp_secs"], "1700000030");
    assert!(body.get("chain_id").is_none());
    assert_eq!(body["payload"]["type"], "entry_function_payload");
    assert_eq!(body["payload"]["arguments"][1], "25");
    assert_eq!(body["signature"]["type"], "ed25519_signature");
    assert_eq!(body["signature"]["signature"], tx.authenticator.signature_hex());
}

#[tokio::test]
async fn rejected_submission_carries_node_message() {
    let (gateway, _) = start_node().await;

    let err = gateway.submit_transaction(&signed(2)).await.unwrap_err();
    match err {
        WalletError::SubmissionRejected(message) => {
            assert!(message.contains("SEQUENCE_NUMBER_TOO_OLD"));
            assert!(message.contains("vm error 3"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn simulation_sends_zeroed_signature() {
    let (gateway, seen) = start_node().await;

    let results = gateway.simulate_transaction(&signed(7)).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].gas_used, 12);

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.simulated[0]["signature"]["signature"],
        format!("0x{}", "00".repeat(64))
    );
    assert!(seen.submitted.is_empty());
}

#[tokio::test]
async fn rejected_simulation_is_a_simulation_failure() {
    let (gateway, seen) = start_node().await;

    let err = gateway.simulate_transaction(&signed(2)).await.unwrap_err();
    match err {
        WalletError::SimulationFailure { vm_status } => {
            assert!(vm_status.contains("SEQUENCE_NUMBER_TOO_OLD"));
        }
        other => panic!("expected simulation failure, got {:?}", other),
    }
    assert!(seen.lock().unwrap().submitted.is_empty());
}

#[tokio::test]
async fn transaction_by_hash_states() {
    let (gateway, _) = start_node().await;

    let pending = gateway.get_transaction("0xpending").await.unwrap();
    assert!(pending.is_pending());
    assert!(pending.to_result().is_none());

    let failed = gateway.get_transaction("0xabc").await.unwrap();
    let result = failed.to_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.gas_used, 15);

    assert!(matches!(
        gateway.get_transaction("0xmissing").await,
        Err(WalletError::ResourceNotFound(_))
    ));
}

#[tokio::test]
async fn server_errors_are_network_failures() {
    let (gateway, _) = start_node().await;
    let err = gateway.get_transaction("0xbroken").await.unwrap_err();
    assert!(matches!(err, WalletError::Network(ref msg) if msg.contains("upstream unavailable")));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn account_history_passes_paging() {
    let (gateway, seen) = start_node().await;
    let known: Address = KNOWN.parse().unwrap();

    let history = gateway
        .get_account_transactions(&known, Some(25), Some(10))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].gas_used, Some(9));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.queries[0].get("limit").map(String::as_str), Some("25"));
    assert_eq!(seen.queries[0].get("start").map(String::as_str), Some("10"));
}

#[tokio::test]
async fn view_call_round_trip() {
    let (gateway, seen) = start_node().await;
    let module = ModuleId::new(Address::new([0xf5; 32]), "wallet");
    let owner: Address = KNOWN.parse().unwrap();

    let request = ViewRequest::for_address(&module, "is_wallet_initialized", &owner);
    let values = gateway.view_function(&request).await.unwrap();
    assert_eq!(values, vec![json!(true)]);

    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.views[0]["arguments"], json!([KNOWN]));
        assert_eq!(seen.views[0]["type_arguments"], json!([]));
    }

    let bogus = ViewRequest::for_address(&module, "bogus", &owner);
    assert!(matches!(
        gateway.view_function(&bogus).await,
        Err(WalletError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn unreachable_node_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = HttpGateway::new(&NetworkConfig {
        url: format!("http://{}/v1", addr),
        request_timeout_secs: 2,
        ..Default::default()
    })
    .unwrap();
    let err = gateway.get_account(&Address::new([1; 32])).await.unwrap_err();
    assert!(matches!(err, WalletError::Network(_)));
}
