use super::blob::EncryptedBlob;
use super::credential::{Accessibility, CredentialStore};
use crate::config::KdfConfig;
use crate::error::{WalletError, WalletResult};
use crate::keys::{KeyDerivation, KeyPair, RecoveryPhrase};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Entries kept per wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKind {
    Mnemonic,
    PrivateKey,
    PublicKey,
    Address,
    PinHash,
}

impl SecretKind {
    pub const ALL: [SecretKind; 5] = [
        SecretKind::Mnemonic,
        SecretKind::PrivateKey,
        SecretKind::PublicKey,
        SecretKind::Address,
        SecretKind::PinHash,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Mnemonic => "mnemonic",
            Self::PrivateKey => "private_key",
            Self::PublicKey => "public_key",
            Self::Address => "address",
            Self::PinHash => "pin_hash",
        }
    }

    /// Confidential kinds are only ever stored sealed under the user password.
    pub fn is_confidential(self) -> bool {
        matches!(self, Self::Mnemonic | Self::PrivateKey)
    }

    fn accessibility(self) -> Accessibility {
        if self.is_confidential() {
            Accessibility::WhenUnlockedThisDeviceOnly
        } else {
            Accessibility::Always
        }
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Encrypted-at-rest key custody on top of a [`CredentialStore`].
pub struct EncryptedKeyStore {
    store: Arc<dyn CredentialStore>,
    namespace: String,
    kdf: KdfConfig,
}

impl fmt::Debug for EncryptedKeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedKeyStore")
            .field("namespace", &self.namespace)
            .field("kdf", &self.kdf)
            .finish_non_exhaustive()
    }
}

impl EncryptedKeyStore {
    pub fn new(store: Arc<dyn CredentialStore>, namespace: impl Into<String>, kdf: KdfConfig) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            kdf,
        }
    }

    fn entry_name(&self, kind: SecretKind) -> String {
        format!("{}_{}", self.namespace, kind.label())
    }

    /// Seal `secret` under `password` and store it, replacing any previous entry.
    ///
    /// The plaintext is validated first: a phrase must pass its checksum and
    /// a private key must parse, so an unusable secret is never persisted.
    pub fn put(&self, kind: SecretKind, secret: &str, password: &str) -> WalletResult<()> {
        if !kind.is_confidential() {
            return Err(WalletError::invalid_argument(format!(
                "{} is not a confidential entry",
                kind
            )));
        }
        validate_plaintext(kind, secret)?;

        let blob = EncryptedBlob::seal(secret.as_bytes(), password, kind.label(), self.kdf)?;
        self.store
            .set_secret(&self.entry_name(kind), &blob.to_json()?, kind.accessibility())?;
        debug!(kind = %kind, "Sealed secret stored");
        Ok(())
    }

    /// Decrypt a confidential entry.
    ///
    /// `Ok(None)` when the entry does not exist; `WrongPassword` when
    /// authentication fails. Never returns partially decrypted data.
    pub fn get(&self, kind: SecretKind, password: &str) -> WalletResult<Option<Zeroizing<String>>> {
        if !kind.is_confidential() {
            return Err(WalletError::invalid_argument(format!(
                "{} is not a confidential entry",
                kind
            )));
        }
        let Some(stored) = self.store.get_secret(&self.entry_name(kind))? else {
            return Ok(None);
        };
        let stored = Zeroizing::new(stored);
        let blob = EncryptedBlob::from_json(&stored)?;
        let plaintext = blob.open(password, kind.label())?;
        let text = std::str::from_utf8(&plaintext)
            .map_err(|_| WalletError::EncryptionFailure(format!("{} is not valid UTF-8", kind)))?;
        Ok(Some(Zeroizing::new(text.to_string())))
    }

    /// Store a non-secret value readable without the password.
    pub fn put_public(&self, kind: SecretKind, value: &str) -> WalletResult<()> {
        if kind.is_confidential() {
            return Err(WalletError::invalid_argument(format!(
                "{} must be stored encrypted",
                kind
            )));
        }
        self.store
            .set_secret(&self.entry_name(kind), value, kind.accessibility())
    }

    pub fn get_public(&self, kind: SecretKind) -> WalletResult<Option<String>> {
        if kind.is_confidential() {
            return Err(WalletError::invalid_argument(format!(
                "{} must be read with a password",
                kind
            )));
        }
        self.store.get_secret(&self.entry_name(kind))
    }

    /// Whether a wallet address is present.
    pub fn has_wallet(&self) -> WalletResult<bool> {
        Ok(self.get_public(SecretKind::Address)?.is_some())
    }

    /// Remove every entry under the namespace.
    ///
    /// Every removal is attempted; if any fails the call reports the failing
    /// kinds so the caller can retry. Entries already removed stay removed.
    pub fn delete_all(&self) -> WalletResult<()> {
        let mut failures = Vec::new();
        for kind in SecretKind::ALL {
            if let Err(e) = self.store.reset_secret(&self.entry_name(kind)) {
                warn!(kind = %kind, error = %e, "Failed to remove wallet entry");
                failures.push(format!("{}: {}", kind, e));
            }
        }

        if failures.is_empty() {
            info!(namespace = %self.namespace, "Wallet entries removed");
            Ok(())
        } else {
            Err(WalletError::storage(format!(
                "failed to remove {} of {} entries ({})",
                failures.len(),
                SecretKind::ALL.len(),
                failures.join("; ")
            )))
        }
    }
}

fn validate_plaintext(kind: SecretKind, secret: &str) -> WalletResult<()> {
    match kind {
        SecretKind::Mnemonic => {
            if KeyDerivation::new().validate_phrase(&RecoveryPhrase::new(secret)) {
                Ok(())
            } else {
                Err(WalletError::InvalidPhrase)
            }
        }
        SecretKind::PrivateKey => KeyPair::from_private_key_hex(secret).map(|_| ()),
        _ => Ok(()),
    }
}

/// One-way hash used for PIN storage, hex encoded.
pub fn hash_secret(candidate: &str) -> String {
    hex::encode(Sha256::digest(candidate.as_bytes()))
}

/// Compare a candidate against a stored hash without handling the plaintext twice.
pub fn verify_secret(candidate: &str, stored_hash: &str) -> bool {
    let computed = hash_secret(candidate);
    let stored = stored_hash.trim().to_ascii_lowercase();
    if computed.len() != stored.len() {
        return false;
    }
    computed
        .bytes()
        .zip(stored.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
