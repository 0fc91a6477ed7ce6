use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Network endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    /// REST API base URL (including the `/v1` suffix)
    #[serde(default = "default_network_url")]
    pub url: String,
    /// Chain id the gateway is expected to serve; signed into every transaction
    #[serde(default = "default_chain_id")]
    pub chain_id: u8,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_faucet_url")]
    pub faucet_url: String,
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,
}

fn default_network_url() -> String {
    "https://testnet.movementnetwork.xyz/v1".to_string()
}

fn default_chain_id() -> u8 {
    250
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_faucet_url() -> String {
    "https://faucet.testnet.movementnetwork.xyz".to_string()
}

fn default_explorer_url() -> String {
    "https://explorer.movementnetwork.xyz/?network=bardock+testnet".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            url: default_network_url(),
            chain_id: default_chain_id(),
            request_timeout_secs: default_request_timeout_secs(),
            faucet_url: default_faucet_url(),
            explorer_url: default_explorer_url(),
        }
    }
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Join a path onto the API base URL
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

/// Deployed Move contract holding the payments and wallet modules
#[derive(Debug, Deserialize, Clone)]
pub struct ContractConfig {
    #[serde(default = "default_contract_address")]
    pub address: String,
    #[serde(default = "default_payments_module")]
    pub payments_module: String,
    #[serde(default = "default_wallet_module")]
    pub wallet_module: String,
}

fn default_contract_address() -> String {
    "0xf5fe51c654d6475b8bf41bd0697a81fec15dbfb5488e83970d98badcaaec97a1".to_string()
}

fn default_payments_module() -> String {
    "payments".to_string()
}

fn default_wallet_module() -> String {
    "wallet".to_string()
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: default_contract_address(),
            payments_module: default_payments_module(),
            wallet_module: default_wallet_module(),
        }
    }
}

/// Static transaction parameters
#[derive(Debug, Deserialize, Clone)]
pub struct TransactionConfig {
    #[serde(default = "default_max_gas_amount")]
    pub max_gas_amount: u64,
    #[serde(default = "default_gas_unit_price")]
    pub gas_unit_price: u64,
    /// Resource type holding the account's native coin balance
    #[serde(default = "default_coin_store")]
    pub coin_store: String,
    /// Expiration window added to the build time
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Dry-run every transaction before submitting it
    #[serde(default = "default_true")]
    pub simulate_before_submit: bool,
    /// Replace the static gas limit with a simulated estimate before signing
    #[serde(default)]
    pub estimate_gas: bool,
    /// Safety margin applied to simulated gas usage, in percent
    #[serde(default = "default_gas_estimate_multiplier_pct")]
    pub gas_estimate_multiplier_pct: u64,
    #[serde(default = "default_memo")]
    pub default_memo: String,
}

fn default_max_gas_amount() -> u64 {
    200_000
}

fn default_gas_unit_price() -> u64 {
    100
}

fn default_coin_store() -> String {
    "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_gas_estimate_multiplier_pct() -> u64 {
    150
}

fn default_memo() -> String {
    "Payment from Cresca Wallet".to_string()
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_gas_amount: default_max_gas_amount(),
            gas_unit_price: default_gas_unit_price(),
            coin_store: default_coin_store(),
            timeout_secs: default_timeout_secs(),
            simulate_before_submit: true,
            estimate_gas: false,
            gas_estimate_multiplier_pct: default_gas_estimate_multiplier_pct(),
            default_memo: default_memo(),
        }
    }
}

/// Confirmation polling policy
#[derive(Debug, Deserialize, Clone)]
pub struct ConfirmationConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_confirmation_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_confirmation_timeout_ms() -> u64 {
    60_000
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_ms: default_confirmation_timeout_ms(),
        }
    }
}

impl ConfirmationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Argon2id cost parameters for password-derived keys
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct KdfConfig {
    /// Memory cost in KiB
    #[serde(default = "default_m_cost")]
    pub m_cost: u32,
    #[serde(default = "default_t_cost")]
    pub t_cost: u32,
    #[serde(default = "default_p_cost")]
    pub p_cost: u32,
}

fn default_m_cost() -> u32 {
    19_456
}

fn default_t_cost() -> u32 {
    2
}

fn default_p_cost() -> u32 {
    1
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            m_cost: default_m_cost(),
            t_cost: default_t_cost(),
            p_cost: default_p_cost(),
        }
    }
}

/// Local key custody settings
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Wallet-scoped namespace prefixed to every credential entry
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Directory for the file-backed credential store; platform config dir when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub kdf: KdfConfig,
}

fn default_namespace() -> String {
    "crescaWallet".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            dir: None,
            kdf: KdfConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    #[serde(default = "default_pin_length")]
    pub pin_length: usize,
}

fn default_pin_length() -> usize {
    6
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            pin_length: default_pin_length(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Page size when the caller does not pass a limit
    #[serde(default = "default_transaction_limit")]
    pub transaction_limit: u32,
    /// How many recent transactions are scanned for pending entries
    #[serde(default = "default_pending_scan")]
    pub pending_scan: u32,
}

fn default_transaction_limit() -> u32 {
    50
}

fn default_pending_scan() -> u32 {
    10
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            transaction_limit: default_transaction_limit(),
            pending_scan: default_pending_scan(),
        }
    }
}

/// Root wallet configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub transaction: TransactionConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CRESCA_NETWORK__URL, CRESCA_TRANSACTION__MAX_GAS_AMOUNT
            .add_source(
                Environment::with_prefix("CRESCA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
