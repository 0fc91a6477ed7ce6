//! Node RPC surface consumed by the wallet core.
//!
//! [`NetworkGateway`] is the seam: the pipeline and wallet service only talk
//! to the trait, [`HttpGateway`] is the REST implementation and tests swap in
//! in-process fakes.

pub mod http;
mod types;

pub use http::HttpGateway;
pub use types::{AccountInfo, AccountResource, OnChainTransaction, ViewRequest};

use crate::error::WalletResult;
use crate::keys::Address;
use crate::transaction::{PendingTransaction, SignedTransaction, SimulationResult};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait NetworkGateway: Send + Sync {
    /// Account record; `None` when the account does not exist on-chain yet.
    async fn get_account(&self, address: &Address) -> WalletResult<Option<AccountInfo>>;

    /// Single resource; `None` when the account or resource is absent.
    async fn get_account_resource(
        &self,
        address: &Address,
        resource_type: &str,
    ) -> WalletResult<Option<AccountResource>>;

    /// All resources; fails with `ResourceNotFound` when the account is absent.
    async fn get_account_resources(&self, address: &Address) -> WalletResult<Vec<AccountResource>>;

    async fn submit_transaction(&self, tx: &SignedTransaction) -> WalletResult<PendingTransaction>;

    async fn simulate_transaction(&self, tx: &SignedTransaction) -> WalletResult<Vec<SimulationResult>>;

    /// Committed or pending transaction; `ResourceNotFound` while not yet indexed.
    async fn get_transaction(&self, hash: &str) -> WalletResult<OnChainTransaction>;

    async fn get_account_transactions(
        &self,
        address: &Address,
        limit: Option<u32>,
        start: Option<u64>,
    ) -> WalletResult<Vec<OnChainTransaction>>;

    /// Read-only contract call.
    async fn view_function(&self, request: &ViewRequest) -> WalletResult<Vec<Value>>;
}
