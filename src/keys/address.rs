use crate::error::{WalletError, WalletResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;

/// Authentication key schemes understood by the wallet.
///
/// Only single-signer ed25519 accounts are supported; any other tag byte is
/// an incompatible scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SignatureScheme {
    Ed25519 = 0x00,
}

impl SignatureScheme {
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Name used by the REST API for the transaction authenticator.
    pub fn api_name(self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519_signature",
        }
    }
}

impl TryFrom<u8> for SignatureScheme {
    type Error = WalletError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0x00 => Ok(Self::Ed25519),
            other => Err(WalletError::UnsupportedScheme(other)),
        }
    }
}

/// 32-byte on-chain account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    pub const LENGTH: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

/// Derive the account address of a single-signer ed25519 public key.
pub fn address_of(public_key: &[u8; 32]) -> Address {
    derive_with_tag(public_key, SignatureScheme::Ed25519)
}

/// Derive an authentication key for an explicit scheme tag byte.
///
/// Fails with [`WalletError::UnsupportedScheme`] for any tag other than the
/// single-signature ed25519 tag.
pub fn authentication_key(public_key: &[u8; 32], scheme_tag: u8) -> WalletResult<Address> {
    let scheme = SignatureScheme::try_from(scheme_tag)?;
    Ok(derive_with_tag(public_key, scheme))
}

fn derive_with_tag(public_key: &[u8; 32], scheme: SignatureScheme) -> Address {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key);
    hasher.update([scheme.tag()]);
    Address(hasher.finalize().into())
}

impl FromStr for Address {
    type Err = WalletError;

    /// Accepts `0x`-prefixed or bare hex; short forms such as `0x1` are
    /// left-padded with zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches("0x");
        if digits.is_empty() || digits.len() > Self::LENGTH * 2 {
            return Err(WalletError::invalid_argument(format!("invalid address: {}", s)));
        }
        let padded = format!("{:0>64}", digits);
        let raw = hex::decode(&padded)
            .map_err(|_| WalletError::invalid_argument(format!("invalid address: {}", s)))?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
