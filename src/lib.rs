pub mod config;
pub mod error;
pub mod keys;
pub mod network;
pub mod pipeline;
pub mod storage;
pub mod transaction;
pub mod wallet;

pub use config::AppConfig;
pub use error::{WalletError, WalletResult};
pub use wallet::{CreatedWallet, WalletService};
