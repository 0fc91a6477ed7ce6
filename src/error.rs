use thiserror::Error;

/// Wallet-wide error types
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid recovery phrase")]
    InvalidPhrase,

    #[error("Key derivation failed: {0}")]
    DerivationFailure(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailure(String),

    #[error("Wrong password")]
    WrongPassword,

    #[error("Argument mismatch: {0}")]
    ArgumentMismatch(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported authentication scheme: 0x{0:02x}")]
    UnsupportedScheme(u8),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    ResourceNotFound(String),

    #[error("Simulation failed: {vm_status}")]
    SimulationFailure { vm_status: String },

    #[error("Transaction rejected: {0}")]
    SubmissionRejected(String),

    #[error("Transaction {hash} not confirmed before the deadline")]
    ConfirmationTimeout { hash: String },

    #[error("Transaction {hash} failed on-chain: {vm_status}")]
    ExecutionFailed { hash: String, vm_status: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("No wallet found on this device")]
    NoWallet,

    #[error("Secure storage error: {0}")]
    Storage(String),
}

impl WalletError {
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::ResourceNotFound(what.into())
    }

    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Short, stable code the presentation layer can switch on.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::InvalidPhrase => "invalid_phrase",
            Self::DerivationFailure(_) => "derivation_failure",
            Self::EncryptionFailure(_) => "encryption_failure",
            Self::WrongPassword => "wrong_password",
            Self::ArgumentMismatch(_) => "argument_mismatch",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::UnsupportedScheme(_) => "unsupported_scheme",
            Self::Network(_) => "network",
            Self::ResourceNotFound(_) => "not_found",
            Self::SimulationFailure { .. } => "simulation_failure",
            Self::SubmissionRejected(_) => "submission_rejected",
            Self::ConfirmationTimeout { .. } => "confirmation_timeout",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::Cancelled => "cancelled",
            Self::NoWallet => "no_wallet",
            Self::Storage(_) => "storage",
        }
    }

    /// Whether the caller may retry the same call unchanged.
    ///
    /// A confirmation timeout is retryable by re-polling the hash, never by
    /// resubmitting.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::WrongPassword | Self::ConfirmationTimeout { .. }
        )
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {}", err))
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type alias using WalletError
pub type WalletResult<T> = Result<T, WalletError>;
