//! Local key custody.
//!
//! ## Security Model
//!
//! - The recovery phrase and private key are stored only as password-sealed
//!   [`EncryptedBlob`]s (Argon2id → HKDF-SHA256 → AES-256-GCM)
//! - Public key, address and PIN hash are stored unencrypted; they are not
//!   secret and are needed before the user authenticates
//! - Every entry lives under a wallet-scoped namespace in a
//!   [`CredentialStore`], an opaque capability that may be backed by files,
//!   memory or the platform keychain
//! - Decrypted material is returned in `Zeroizing` buffers

pub mod blob;
pub mod credential;
pub mod keystore;

pub use blob::EncryptedBlob;
#[cfg(feature = "keychain")]
pub use credential::KeychainCredentialStore;
pub use credential::{Accessibility, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use keystore::{hash_secret, verify_secret, EncryptedKeyStore, SecretKind};
