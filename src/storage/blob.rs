//! Password-sealed secrets.
//!
//! Uses:
//! - Argon2id to stretch the password with a random per-blob salt
//! - HKDF-SHA256 to bind the stretched key to the entry's context label
//! - AES-256-GCM for authenticated encryption, with the context as AAD

use crate::config::KdfConfig;
use crate::error::{WalletError, WalletResult};
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

const BLOB_VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const HKDF_INFO_PREFIX: &[u8] = b"cresca-wallet/v1/";

/// Ciphertext plus everything needed to re-derive its key, except the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    pub version: u8,
    pub kdf: KdfConfig,
    /// base64
    pub salt: String,
    /// base64
    pub nonce: String,
    /// base64, includes the GCM tag
    pub ciphertext: String,
}

impl EncryptedBlob {
    /// Encrypt `plaintext` under `password`, bound to `context`.
    pub fn seal(plaintext: &[u8], password: &str, context: &str, kdf: KdfConfig) -> WalletResult<Self> {
        if password.is_empty() {
            return Err(WalletError::invalid_argument("password must not be empty"));
        }

        let mut salt = [0u8; SALT_LEN];
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce_bytes);

        let cipher = derive_cipher(password, &salt, context, &kdf)?;
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: context.as_bytes(),
                },
            )
            .map_err(|_| WalletError::EncryptionFailure("encryption failed".to_string()))?;

        Ok(Self {
            version: BLOB_VERSION,
            kdf,
            salt: BASE64.encode(salt),
            nonce: BASE64.encode(nonce_bytes),
            ciphertext: BASE64.encode(ciphertext),
        })
    }

    /// Decrypt with `password`; a wrong password or a blob sealed for another
    /// context fails authentication and yields [`WalletError::WrongPassword`].
    pub fn open(&self, password: &str, context: &str) -> WalletResult<Zeroizing<Vec<u8>>> {
        if self.version != BLOB_VERSION {
            return Err(WalletError::EncryptionFailure(format!(
                "unsupported blob version {}",
                self.version
            )));
        }

        let salt = decode_field("salt", &self.salt)?;
        let nonce_bytes = decode_field("nonce", &self.nonce)?;
        let ciphertext = decode_field("ciphertext", &self.ciphertext)?;
        if salt.len() != SALT_LEN || nonce_bytes.len() != NONCE_LEN {
            return Err(WalletError::EncryptionFailure("corrupted blob parameters".to_string()));
        }

        let cipher = derive_cipher(password, &salt, context, &self.kdf)?;
        cipher
            .decrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &ciphertext,
                    aad: context.as_bytes(),
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| WalletError::WrongPassword)
    }

    pub fn to_json(&self) -> WalletResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> WalletResult<Self> {
        serde_json::from_str(data)
            .map_err(|e| WalletError::EncryptionFailure(format!("corrupted blob: {}", e)))
    }
}

fn decode_field(name: &str, value: &str) -> WalletResult<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|e| WalletError::EncryptionFailure(format!("corrupted blob {}: {}", name, e)))
}

fn derive_cipher(password: &str, salt: &[u8], context: &str, kdf: &KdfConfig) -> WalletResult<Aes256Gcm> {
    let params = Params::new(kdf.m_cost, kdf.t_cost, kdf.p_cost, Some(32))
        .map_err(|e| WalletError::EncryptionFailure(format!("invalid KDF parameters: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut stretched = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut stretched[..])
        .map_err(|e| WalletError::EncryptionFailure(format!("key stretching failed: {}", e)))?;

    let mut info = HKDF_INFO_PREFIX.to_vec();
    info.extend_from_slice(context.as_bytes());

    let hk = Hkdf::<Sha256>::new(None, &stretched[..]);
    let mut key = [0u8; 32];
    hk.expand(&info, &mut key)
        .map_err(|e| WalletError::EncryptionFailure(format!("key expansion failed: {}", e)))?;
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| WalletError::EncryptionFailure(format!("cipher init failed: {}", e)));
    key.zeroize();
    cipher
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Cheap parameters so tests stay fast.
    pub(crate) fn test_kdf() -> KdfConfig {
        KdfConfig {
            m_cost: 64,
            t_cost: 1,
            p_cost: 1,
        }
    }

    #[test]
    fn seal_open_roundtrip() {
        let blob = EncryptedBlob::seal(b"secret phrase", "hunter2", "mnemonic", test_kdf()).unwrap();
        let opened = blob.open("hunter2", "mnemonic").unwrap();
        assert_eq!(opened.as_slice(), b"secret phrase");
    }

    #[test]
    fn wrong_password_fails_authentication() {
        let blob = EncryptedBlob::seal(b"secret", "correct", "private_key", test_kdf()).unwrap();
        assert!(matches!(
            blob.open("wrong", "private_key"),
            Err(WalletError::WrongPassword)
        ));
    }

    #[test]
    fn blob_is_bound_to_its_context() {
        let blob = EncryptedBlob::seal(b"secret", "pw", "mnemonic", test_kdf()).unwrap();
        assert!(blob.open("pw", "private_key").is_err());
    }

    #[test]
    fn salts_and_nonces_are_fresh() {
        let a = EncryptedBlob::seal(b"same", "pw", "ctx", test_kdf()).unwrap();
        let b = EncryptedBlob::seal(b"same", "pw", "ctx", test_kdf()).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let mut blob = EncryptedBlob::seal(b"secret", "pw", "ctx", test_kdf()).unwrap();
        let mut raw = BASE64.decode(&blob.ciphertext).unwrap();
        raw[0] ^= 0x01;
        blob.ciphertext = BASE64.encode(raw);
        assert!(blob.open("pw", "ctx").is_err());
    }

    #[test]
    fn json_roundtrip_and_corruption() {
        let blob = EncryptedBlob::seal(b"x", "pw", "ctx", test_kdf()).unwrap();
        let restored = EncryptedBlob::from_json(&blob.to_json().unwrap()).unwrap();
        assert_eq!(restored, blob);
        assert!(matches!(
            EncryptedBlob::from_json("{}"),
            Err(WalletError::EncryptionFailure(_))
        ));
    }

    #[test]
    fn empty_password_is_refused() {
        assert!(matches!(
            EncryptedBlob::seal(b"x", "", "ctx", test_kdf()),
            Err(WalletError::InvalidArgument(_))
        ));
    }
}
