//! Wallet identity: recovery phrases, hierarchical key derivation and
//! account addresses.
//!
//! ```text
//! RecoveryPhrase ──(BIP-39)──▶ Seed ──(SLIP-0010, m/44'/637'/a'/0'/0')──▶ KeyPair
//!                                                                          │
//!                                    Address = SHA3-256(pk ‖ 0x00) ◀────────┘
//! ```
//!
//! Seeds never leave [`KeyDerivation::derive`]; phrases and keypairs wipe
//! their memory on drop.

pub mod address;
pub mod derivation;
pub mod keypair;
pub mod phrase;

pub use address::{address_of, authentication_key, Address, SignatureScheme};
pub use derivation::{DerivationPath, KeyDerivation};
pub use keypair::{parse_public_key, KeyPair};
pub use phrase::RecoveryPhrase;
