//! In-process fake of the node RPC surface.
#![allow(dead_code)]

use async_trait::async_trait;
use cresca::config::{AppConfig, KdfConfig};
use cresca::error::{WalletError, WalletResult};
use cresca::keys::Address;
use cresca::network::{AccountInfo, AccountResource, NetworkGateway, OnChainTransaction, ViewRequest};
use cresca::transaction::{PendingTransaction, SignedTransaction, SimulationResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// How an indexed transaction resolves.
#[derive(Debug, Clone)]
pub struct Landing {
    /// Delay after indexing before the node reports a terminal state
    pub after: Duration,
    pub success: bool,
    pub vm_status: String,
}

impl Landing {
    pub fn success_after(after: Duration) -> Self {
        Self {
            after,
            success: true,
            vm_status: "Executed successfully".to_string(),
        }
    }

    pub fn failure_after(after: Duration, vm_status: &str) -> Self {
        Self {
            after,
            success: false,
            vm_status: vm_status.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct FakeGateway {
    accounts: Mutex<HashMap<Address, u64>>,
    resources: Mutex<HashMap<(Address, String), Value>>,
    views: Mutex<HashMap<String, WalletResult<Vec<Value>>>>,
    history: Mutex<Vec<OnChainTransaction>>,
    indexed: Mutex<HashMap<String, (Instant, Landing)>>,
    simulation: Mutex<SimulationResult>,
    reject_submission: Mutex<Option<String>>,
    submission_outage: Mutex<Option<String>>,
    landing: Mutex<Landing>,
    pub submitted: Mutex<Vec<SignedTransaction>>,
    pub simulated: Mutex<Vec<SignedTransaction>>,
    pub calls: AtomicUsize,
    pub polls: AtomicUsize,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            accounts: Mutex::default(),
            resources: Mutex::default(),
            views: Mutex::default(),
            history: Mutex::default(),
            indexed: Mutex::default(),
            simulation: Mutex::new(SimulationResult {
                success: true,
                gas_used: 1_000,
                vm_status: "Executed successfully".to_string(),
            }),
            reject_submission: Mutex::default(),
            submission_outage: Mutex::default(),
            landing: Mutex::new(Landing::success_after(Duration::ZERO)),
            submitted: Mutex::default(),
            simulated: Mutex::default(),
            calls: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
        }
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, address: Address, sequence_number: u64) -> Self {
        self.set_sequence(address, sequence_number);
        self
    }

    pub fn set_sequence(&self, address: Address, sequence_number: u64) {
        self.accounts.lock().unwrap().insert(address, sequence_number);
    }

    pub fn set_resource(&self, address: Address, resource_type: &str, data: Value) {
        self.resources
            .lock()
            .unwrap()
            .insert((address, resource_type.to_string()), data);
    }

    /// Register a view result keyed by the bare function name.
    pub fn set_view(&self, function: &str, result: WalletResult<Vec<Value>>) {
        self.views.lock().unwrap().insert(function.to_string(), result);
    }

    pub fn set_simulation(&self, success: bool, gas_used: u64, vm_status: &str) {
        *self.simulation.lock().unwrap() = SimulationResult {
            success,
            gas_used,
            vm_status: vm_status.to_string(),
        };
    }

    pub fn reject_submissions(&self, reason: &str) {
        *self.reject_submission.lock().unwrap() = Some(reason.to_string());
    }

    /// Fail submissions with a transport error, as if the node were unreachable.
    pub fn fail_submissions(&self, reason: &str) {
        *self.submission_outage.lock().unwrap() = Some(reason.to_string());
    }

    /// How transactions submitted from now on resolve.
    pub fn set_landing(&self, landing: Landing) {
        *self.landing.lock().unwrap() = landing;
    }

    /// Make `hash` known to the node, resolving per `landing`.
    pub fn index(&self, hash: &str, landing: Landing) {
        self.indexed
            .lock()
            .unwrap()
            .insert(hash.to_string(), (Instant::now(), landing));
    }

    pub fn push_history(&self, tx: Value) {
        self.history
            .lock()
            .unwrap()
            .push(serde_json::from_value(tx).unwrap());
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NetworkGateway for FakeGateway {
    async fn get_account(&self, address: &Address) -> WalletResult<Option<AccountInfo>> {
        self.hit();
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(address)
            .map(|&sequence_number| AccountInfo {
                sequence_number,
                authentication_key: address.to_hex(),
            }))
    }

    async fn get_account_resource(
        &self,
        address: &Address,
        resource_type: &str,
    ) -> WalletResult<Option<AccountResource>> {
        self.hit();
        Ok(self
            .resources
            .lock()
            .unwrap()
            .get(&(*address, resource_type.to_string()))
            .map(|data| AccountResource {
                resource_type: resource_type.to_string(),
                data: data.clone(),
            }))
    }

    async fn get_account_resources(&self, address: &Address) -> WalletResult<Vec<AccountResource>> {
        self.hit();
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|((owner, _), _)| owner == address)
            .map(|((_, resource_type), data)| AccountResource {
                resource_type: resource_type.clone(),
                data: data.clone(),
            })
            .collect())
    }

    async fn submit_transaction(&self, tx: &SignedTransaction) -> WalletResult<PendingTransaction> {
        self.hit();
        if let Some(reason) = self.reject_submission.lock().unwrap().clone() {
            return Err(WalletError::SubmissionRejected(reason));
        }
        if let Some(reason) = self.submission_outage.lock().unwrap().clone() {
            return Err(WalletError::network(reason));
        }

        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(tx.clone());
        let hash = format!("0x{:064x}", submitted.len());
        let landing = self.landing.lock().unwrap().clone();
        self.index(&hash, landing);

        Ok(PendingTransaction {
            hash,
            sender: tx.raw.sender,
            sequence_number: tx.raw.sequence_number,
            payload: serde_json::to_value(&tx.raw.payload).unwrap(),
        })
    }

    async fn simulate_transaction(&self, tx: &SignedTransaction) -> WalletResult<Vec<SimulationResult>> {
        self.hit();
        self.simulated.lock().unwrap().push(tx.clone());
        Ok(vec![self.simulation.lock().unwrap().clone()])
    }

    async fn get_transaction(&self, hash: &str) -> WalletResult<OnChainTransaction> {
        self.hit();
        self.polls.fetch_add(1, Ordering::SeqCst);

        let indexed = self.indexed.lock().unwrap();
        let Some((since, landing)) = indexed.get(hash) else {
            return Err(WalletError::not_found(format!("transaction {}", hash)));
        };
        if since.elapsed() < landing.after {
            return Err(WalletError::not_found(format!("transaction {}", hash)));
        }

        Ok(OnChainTransaction {
            tx_type: "user_transaction".to_string(),
            hash: hash.to_string(),
            sender: None,
            sequence_number: None,
            success: Some(landing.success),
            vm_status: Some(landing.vm_status.clone()),
            gas_used: Some(850),
            timestamp: Some(1_700_000_000_000_000),
            payload: None,
        })
    }

    async fn get_account_transactions(
        &self,
        _address: &Address,
        limit: Option<u32>,
        start: Option<u64>,
    ) -> WalletResult<Vec<OnChainTransaction>> {
        self.hit();
        let history = self.history.lock().unwrap();
        let start = start.unwrap_or(0) as usize;
        let limit = limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(history.iter().skip(start).take(limit).cloned().collect())
    }

    async fn view_function(&self, request: &ViewRequest) -> WalletResult<Vec<Value>> {
        self.hit();
        let name = request.function.rsplit("::").next().unwrap_or_default();
        match self.views.lock().unwrap().get(name) {
            Some(Ok(values)) => Ok(values.clone()),
            Some(Err(WalletError::Network(msg))) => Err(WalletError::network(msg.clone())),
            Some(Err(e)) => Err(WalletError::invalid_argument(e.to_string())),
            None => Err(WalletError::not_found(format!("view {}", request.function))),
        }
    }
}

/// Defaults with cheap key stretching and a short confirmation window.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.kdf = KdfConfig {
        m_cost: 64,
        t_cost: 1,
        p_cost: 1,
    };
    config.confirmation.poll_interval_ms = 1_000;
    config.confirmation.timeout_ms = 10_000;
    config
}

pub const PHRASE: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Address derived from [`PHRASE`] at account 0.
pub const PHRASE_ADDRESS: &str = "0xeb663b681209e7087d681c5d3eed12aaa8e1915e7c87794542c3f96e94b3d3bf";
