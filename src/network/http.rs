use super::types::{AccountInfo, AccountResource, OnChainTransaction, ViewRequest};
use super::NetworkGateway;
use crate::config::NetworkConfig;
use crate::error::{WalletError, WalletResult};
use crate::keys::Address;
use crate::transaction::{EntryFunctionPayload, PendingTransaction, SignedTransaction, SimulationResult};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

/// Signature section of a submission body.
#[derive(Debug, Serialize)]
struct SignatureBody {
    #[serde(rename = "type")]
    scheme: &'static str,
    public_key: String,
    signature: String,
}

/// JSON submission body; the chain id travels only inside the signed bytes.
#[derive(Debug, Serialize)]
struct SubmitTransactionRequest<'a> {
    sender: String,
    sequence_number: String,
    max_gas_amount: String,
    gas_unit_price: String,
    expiration_timestamp_secs: String,
    payload: &'a EntryFunctionPayload,
    signature: SignatureBody,
}

impl<'a> SubmitTransactionRequest<'a> {
    fn new(tx: &'a SignedTransaction, zero_signature: bool) -> Self {
        let raw = &tx.raw;
        let auth = &tx.authenticator;
        let signature = if zero_signature {
            format!("0x{}", hex::encode([0u8; 64]))
        } else {
            auth.signature_hex()
        };
        Self {
            sender: raw.sender.to_hex(),
            sequence_number: raw.sequence_number.to_string(),
            max_gas_amount: raw.max_gas_amount.to_string(),
            gas_unit_price: raw.gas_unit_price.to_string(),
            expiration_timestamp_secs: raw.expiration_timestamp_secs.to_string(),
            payload: &raw.payload,
            signature: SignatureBody {
                scheme: auth.scheme.api_name(),
                public_key: auth.public_key_hex(),
                signature,
            },
        }
    }
}

/// Error body returned by the node.
#[derive(Debug, Deserialize)]
struct NodeError {
    message: String,
    #[serde(default)]
    vm_error_code: Option<u64>,
}

/// How a non-success status is surfaced for a given call.
#[derive(Debug, Clone, Copy)]
enum Call {
    Read,
    Submit,
    Simulate,
}

/// REST client for a Movement/Aptos-compatible fullnode
pub struct HttpGateway {
    http: Client,
    config: NetworkConfig,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("url", &self.config.url)
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    pub fn new(config: &NetworkConfig) -> WalletResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| WalletError::network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> WalletResult<T> {
        let url = self.config.endpoint(path);
        debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        let response = check_status(response, what, Call::Read).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        what: &str,
        call: Call,
    ) -> WalletResult<T> {
        let url = self.config.endpoint(path);
        debug!("POST {}", url);
        let response = self.http.post(&url).json(body).send().await?;
        let response = check_status(response, what, call).await?;
        Ok(response.json().await?)
    }
}

/// Map HTTP status codes onto the wallet error taxonomy.
async fn check_status(response: Response, what: &str, call: Call) -> WalletResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<NodeError>(&body) {
        Ok(err) => match err.vm_error_code {
            Some(code) => format!("{} (vm error {})", err.message, code),
            None => err.message,
        },
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) => body,
    };

    if status == StatusCode::NOT_FOUND {
        debug!("{} not found", what);
        return Err(WalletError::not_found(what));
    }

    if status.is_server_error() {
        error!("{} failed with status {}: {}", what, status, message);
        return Err(WalletError::network(format!("{} returned {}: {}", what, status, message)));
    }

    warn!("{} rejected with status {}: {}", what, status, message);
    Err(match call {
        Call::Submit => WalletError::SubmissionRejected(message),
        Call::Simulate => WalletError::SimulationFailure { vm_status: message },
        Call::Read => WalletError::invalid_argument(format!("{} rejected: {}", what, message)),
    })
}

/// Turn `ResourceNotFound` into an absent value.
fn optional<T>(result: WalletResult<T>) -> WalletResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(WalletError::ResourceNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl NetworkGateway for HttpGateway {
    async fn get_account(&self, address: &Address) -> WalletResult<Option<AccountInfo>> {
        optional(
            self.get_json(&format!("accounts/{}", address), &format!("account {}", address))
                .await,
        )
    }

    async fn get_account_resource(
        &self,
        address: &Address,
        resource_type: &str,
    ) -> WalletResult<Option<AccountResource>> {
        optional(
            self.get_json(
                &format!("accounts/{}/resource/{}", address, resource_type),
                &format!("resource {} of {}", resource_type, address),
            )
            .await,
        )
    }

    async fn get_account_resources(&self, address: &Address) -> WalletResult<Vec<AccountResource>> {
        self.get_json(
            &format!("accounts/{}/resources", address),
            &format!("account {}", address),
        )
        .await
    }

    async fn submit_transaction(&self, tx: &SignedTransaction) -> WalletResult<PendingTransaction> {
        let body = SubmitTransactionRequest::new(tx, false);
        self.post_json("transactions", &body, "transaction submission", Call::Submit)
            .await
    }

    async fn simulate_transaction(&self, tx: &SignedTransaction) -> WalletResult<Vec<SimulationResult>> {
        // the simulation endpoint refuses transactions carrying a valid signature
        let body = SubmitTransactionRequest::new(tx, true);
        self.post_json("transactions/simulate", &body, "transaction simulation", Call::Simulate)
            .await
    }

    async fn get_transaction(&self, hash: &str) -> WalletResult<OnChainTransaction> {
        self.get_json(&format!("transactions/by_hash/{}", hash), &format!("transaction {}", hash))
            .await
    }

    async fn get_account_transactions(
        &self,
        address: &Address,
        limit: Option<u32>,
        start: Option<u64>,
    ) -> WalletResult<Vec<OnChainTransaction>> {
        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(format!("limit={}", limit));
        }
        if let Some(start) = start {
            query.push(format!("start={}", start));
        }
        let mut path = format!("accounts/{}/transactions", address);
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }
        self.get_json(&path, &format!("transactions of {}", address))
            .await
    }

    async fn view_function(&self, request: &ViewRequest) -> WalletResult<Vec<Value>> {
        self.post_json("view", request, &format!("view {}", request.function), Call::Read)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyPair, SignatureScheme};
    use crate::transaction::{Authenticator, ModuleId, MoveArg, RawTransaction};

    fn signed() -> SignedTransaction {
        let pair = KeyPair::from_private_key([3u8; 32]);
        SignedTransaction {
            raw: RawTransaction {
                sender: pair.address(),
                sequence_number: 9,
                max_gas_amount: 200_000,
                gas_unit_price: 100,
                expiration_timestamp_secs: 1_700_000_030,
                payload: EntryFunctionPayload::new(
                    ModuleId::new(Address::new([0xab; 32]), "payments"),
                    "initialize",
                    vec![MoveArg::U64(1)],
                ),
                chain_id: 250,
            },
            authenticator: Authenticator {
                scheme: SignatureScheme::Ed25519,
                public_key: *pair.public_key(),
                signature: [7u8; 64],
            },
        }
    }

    #[test]
    fn submission_body_shape() {
        let tx = signed();
        let value = serde_json::to_value(SubmitTransactionRequest::new(&tx, false)).unwrap();
        assert_eq!(value["sequence_number"], "9");
        assert_eq!(value["max_gas_amount"], "200000");
        assert_eq!(value["payload"]["type"], "entry_function_payload");
        assert_eq!(value["signature"]["type"], "ed25519_signature");
        assert_eq!(value["signature"]["signature"], format!("0x{}", "07".repeat(64)));
        assert!(value.get("chain_id").is_none());
    }

    #[test]
    fn simulation_body_zeroes_signature() {
        let tx = signed();
        let value = serde_json::to_value(SubmitTransactionRequest::new(&tx, true)).unwrap();
        assert_eq!(value["signature"]["signature"], format!("0x{}", "00".repeat(64)));
        assert_eq!(value["signature"]["public_key"], tx.authenticator.public_key_hex());
    }

    #[test]
    fn optional_only_absorbs_not_found() {
        assert_eq!(optional::<u8>(Err(WalletError::not_found("x"))).unwrap(), None);
        assert!(optional::<u8>(Err(WalletError::network("503"))).is_err());
    }
}
