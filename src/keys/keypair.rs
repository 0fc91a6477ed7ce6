use crate::error::{WalletError, WalletResult};
use crate::keys::address::{address_of, Address};
use ed25519_dalek::{SigningKey, VerifyingKey};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Ed25519 signing pair owned by the wallet.
///
/// `private_key` is the 32-byte seed, `public_key` the 32-byte compressed
/// Edwards point. Both are wiped on drop; the type is deliberately not `Clone`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    private_key: [u8; 32],
    public_key: [u8; 32],
}

impl KeyPair {
    /// Rebuild the pair from a private key seed.
    pub fn from_private_key(private_key: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&private_key);
        let public_key = signing_key.verifying_key().to_bytes();
        Self {
            private_key,
            public_key,
        }
    }

    /// Parse a `0x`-optional hex private key, as exported by the wallet.
    pub fn from_private_key_hex(hex_key: &str) -> WalletResult<Self> {
        let raw = Zeroizing::new(
            hex::decode(hex_key.trim().trim_start_matches("0x"))
                .map_err(|_| WalletError::invalid_argument("private key is not valid hex"))?,
        );
        if raw.len() != 32 {
            return Err(WalletError::invalid_argument(format!(
                "private key must be 32 bytes, got {}",
                raw.len()
            )));
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&raw);
        let pair = Self::from_private_key(seed);
        seed.zeroize();
        Ok(pair)
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }

    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }

    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.public_key))
    }

    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.private_key))
    }

    pub fn address(&self) -> Address {
        address_of(&self.public_key)
    }

    /// Short-lived dalek signing key; dropped (and wiped) by the caller.
    pub(crate) fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.private_key)
    }

    pub fn verifying_key(&self) -> WalletResult<VerifyingKey> {
        VerifyingKey::from_bytes(&self.public_key)
            .map_err(|e| WalletError::DerivationFailure(format!("invalid public key: {}", e)))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Parse a `0x`-optional hex ed25519 public key.
pub fn parse_public_key(hex_key: &str) -> WalletResult<[u8; 32]> {
    let raw = hex::decode(hex_key.trim().trim_start_matches("0x"))
        .map_err(|_| WalletError::invalid_argument("public key is not valid hex"))?;
    raw.as_slice()
        .try_into()
        .map_err(|_| WalletError::invalid_argument(format!("public key must be 32 bytes, got {}", raw.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_preserves_identity() {
        let pair = KeyPair::from_private_key([7u8; 32]);
        let restored = KeyPair::from_private_key_hex(&pair.private_key_hex()).unwrap();
        assert_eq!(pair.public_key(), restored.public_key());
        assert_eq!(pair.address(), restored.address());
        assert_eq!(parse_public_key(&pair.public_key_hex()).unwrap(), *pair.public_key());
    }

    #[test]
    fn rejects_short_private_key() {
        assert!(matches!(
            KeyPair::from_private_key_hex("0xdeadbeef"),
            Err(WalletError::InvalidArgument(_))
        ));
    }

    #[test]
    fn debug_hides_private_key() {
        let pair = KeyPair::from_private_key([9u8; 32]);
        let printed = format!("{:?}", pair);
        assert!(!printed.contains(&hex::encode([9u8; 32])));
    }
}
