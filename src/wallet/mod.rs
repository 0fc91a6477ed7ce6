//! Wallet service composing key custody, the builder and the pipeline.
//!
//! Every collaborator is passed in at construction; nothing here is global.

mod baskets;
mod history;
mod payments;
mod queries;
mod scheduled;

pub use history::to_record;

use crate::config::AppConfig;
use crate::error::{WalletError, WalletResult};
use crate::keys::{parse_public_key, Address, KeyDerivation, KeyPair, RecoveryPhrase};
use crate::network::NetworkGateway;
use crate::pipeline::{SequenceLeases, SubmissionPipeline};
use crate::storage::{hash_secret, verify_secret, CredentialStore, EncryptedKeyStore, SecretKind};
use crate::transaction::TransactionBuilder;
use chrono::Utc;
use cresca_types::WalletAccount;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Result of creating a wallet: the account plus the phrase to back up.
#[derive(Debug)]
pub struct CreatedWallet {
    pub account: WalletAccount,
    pub phrase: RecoveryPhrase,
}

pub struct WalletService {
    config: AppConfig,
    derivation: KeyDerivation,
    keystore: EncryptedKeyStore,
    gateway: Arc<dyn NetworkGateway>,
    builder: TransactionBuilder,
    pipeline: SubmissionPipeline,
}

impl std::fmt::Debug for WalletService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletService")
            .field("keystore", &self.keystore)
            .field("builder", &self.builder)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl WalletService {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn CredentialStore>,
        gateway: Arc<dyn NetworkGateway>,
    ) -> WalletResult<Self> {
        let leases = Arc::new(SequenceLeases::with_expiry(Duration::from_secs(
            config.transaction.timeout_secs,
        )));
        let keystore = EncryptedKeyStore::new(store, config.storage.namespace.clone(), config.storage.kdf);
        let builder = TransactionBuilder::new(gateway.clone(), leases.clone(), &config)?;
        let pipeline = SubmissionPipeline::new(gateway.clone(), leases, &config);

        Ok(Self {
            config,
            derivation: KeyDerivation::new(),
            keystore,
            gateway,
            builder,
            pipeline,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn builder(&self) -> &TransactionBuilder {
        &self.builder
    }

    pub fn pipeline(&self) -> &SubmissionPipeline {
        &self.pipeline
    }

    /// Create a wallet from a fresh phrase.
    ///
    /// The caller must show `phrase` to the user for backup; it is only
    /// stored encrypted.
    pub fn create_wallet(&self, password: &str) -> WalletResult<CreatedWallet> {
        check_password(password)?;
        let phrase = self.derivation.generate_phrase()?;
        let keypair = self.derivation.derive(&phrase, 0)?;
        self.persist(&phrase, &keypair, password)?;

        info!(address = %keypair.address(), "Wallet created");
        Ok(CreatedWallet {
            account: WalletAccount {
                address: keypair.address().to_hex(),
                public_key: keypair.public_key_hex(),
                balance: "0".to_string(),
                transaction_count: 0,
                created_at: Utc::now(),
                is_initialized: false,
            },
            phrase,
        })
    }

    /// Restore a wallet from an existing phrase and load its on-chain state.
    pub async fn import_wallet(&self, phrase: &RecoveryPhrase, password: &str) -> WalletResult<WalletAccount> {
        check_password(password)?;
        if !self.derivation.validate_phrase(phrase) {
            return Err(WalletError::InvalidPhrase);
        }
        let keypair = self.derivation.derive(phrase, 0)?;
        self.persist(phrase, &keypair, password)?;
        info!(address = %keypair.address(), "Wallet imported");

        self.account_summary(&keypair.address(), keypair.public_key_hex())
            .await
    }

    /// Wallet stored on this device with its current on-chain state.
    pub async fn current_wallet(&self) -> WalletResult<Option<WalletAccount>> {
        let Some(address) = self.keystore.get_public(SecretKind::Address)? else {
            return Ok(None);
        };
        let Some(public_key) = self.keystore.get_public(SecretKind::PublicKey)? else {
            return Ok(None);
        };
        let address: Address = address.parse()?;
        self.account_summary(&address, public_key).await.map(Some)
    }

    pub fn has_wallet(&self) -> WalletResult<bool> {
        self.keystore.has_wallet()
    }

    /// Stored wallet address, readable without the password.
    pub fn address(&self) -> WalletResult<Address> {
        self.keystore
            .get_public(SecretKind::Address)?
            .ok_or(WalletError::NoWallet)?
            .parse()
    }

    /// Decrypt the signing key for one operation.
    ///
    /// The key is checked against the stored public key so a corrupted or
    /// swapped entry is never used to sign.
    pub fn unlock(&self, password: &str) -> WalletResult<KeyPair> {
        let private_key = self
            .keystore
            .get(SecretKind::PrivateKey, password)?
            .ok_or(WalletError::NoWallet)?;
        let keypair = KeyPair::from_private_key_hex(&private_key)?;

        if let Some(stored) = self.keystore.get_public(SecretKind::PublicKey)? {
            if parse_public_key(&stored)? != *keypair.public_key() {
                warn!("Stored public key does not match the decrypted private key");
                return Err(WalletError::storage("stored keys do not match"));
            }
        }
        Ok(keypair)
    }

    pub fn export_private_key(&self, password: &str) -> WalletResult<Zeroizing<String>> {
        let keypair = self.unlock(password)?;
        Ok(keypair.private_key_hex())
    }

    pub fn reveal_phrase(&self, password: &str) -> WalletResult<RecoveryPhrase> {
        let phrase = self
            .keystore
            .get(SecretKind::Mnemonic, password)?
            .ok_or(WalletError::NoWallet)?;
        Ok(RecoveryPhrase::new(&phrase))
    }

    /// Remove every stored entry. Safe to retry after a partial failure.
    pub fn delete_wallet(&self) -> WalletResult<()> {
        self.keystore.delete_all()?;
        info!("Wallet deleted");
        Ok(())
    }

    pub fn set_pin(&self, pin: &str) -> WalletResult<()> {
        let expected = self.config.security.pin_length;
        if pin.len() != expected || !pin.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WalletError::invalid_argument(format!(
                "PIN must be exactly {} digits",
                expected
            )));
        }
        self.keystore.put_public(SecretKind::PinHash, &hash_secret(pin))
    }

    pub fn has_pin(&self) -> WalletResult<bool> {
        Ok(self.keystore.get_public(SecretKind::PinHash)?.is_some())
    }

    /// `false` when no PIN has been set.
    pub fn verify_pin(&self, pin: &str) -> WalletResult<bool> {
        Ok(self
            .keystore
            .get_public(SecretKind::PinHash)?
            .is_some_and(|stored| verify_secret(pin, &stored)))
    }

    /// Write every entry for a new wallet; the address goes last so a
    /// half-written wallet is never reported as present.
    fn persist(&self, phrase: &RecoveryPhrase, keypair: &KeyPair, password: &str) -> WalletResult<()> {
        let result = self.write_entries(phrase, keypair, password);
        if let Err(e) = &result {
            warn!(error = %e, "Failed to store wallet, rolling back");
            if let Err(cleanup) = self.keystore.delete_all() {
                warn!(error = %cleanup, "Rollback incomplete");
            }
        }
        result
    }

    fn write_entries(&self, phrase: &RecoveryPhrase, keypair: &KeyPair, password: &str) -> WalletResult<()> {
        self.keystore.put(SecretKind::Mnemonic, phrase.as_str(), password)?;
        self.keystore
            .put(SecretKind::PrivateKey, &keypair.private_key_hex(), password)?;
        self.keystore
            .put_public(SecretKind::PublicKey, &keypair.public_key_hex())?;
        self.keystore
            .put_public(SecretKind::Address, &keypair.address().to_hex())
    }

    async fn account_summary(&self, address: &Address, public_key: String) -> WalletResult<WalletAccount> {
        let (balance, is_initialized) =
            futures::try_join!(self.balance(address), self.is_wallet_initialized(address))?;
        let transaction_count = if is_initialized {
            self.transaction_count(address).await?
        } else {
            0
        };

        Ok(WalletAccount {
            address: address.to_hex(),
            public_key,
            balance,
            transaction_count,
            created_at: Utc::now(),
            is_initialized,
        })
    }
}

fn check_password(password: &str) -> WalletResult<()> {
    if password.is_empty() {
        return Err(WalletError::invalid_argument("password must not be empty"));
    }
    Ok(())
}

/// Numbers in view results and resources arrive as strings or JSON numbers.
pub(crate) fn json_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

pub(crate) fn json_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_from_strings_or_numbers() {
        assert_eq!(json_u64(&json!("42")), Some(42));
        assert_eq!(json_u64(&json!(42)), Some(42));
        assert_eq!(json_u64(&json!(true)), None);
        assert_eq!(json_string(&json!(7)), Some("7".to_string()));
        assert_eq!(json_string(&json!(null)), None);
    }
}
