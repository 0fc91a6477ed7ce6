use super::bcs::BcsEncode;
use super::{Authenticator, RawTransaction, SignedTransaction};
use crate::keys::{KeyPair, SignatureScheme};
use ed25519_dalek::{Signature, Signer, VerifyingKey};
use sha3::{Digest, Sha3_256};
use tracing::debug;

/// Domain separation tag for raw transactions, hashed into the message prefix.
const RAW_TRANSACTION_SALT: &[u8] = b"APTOS::RawTransaction";

/// Produces detached ed25519 signatures over canonical transaction bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionSigner;

impl TransactionSigner {
    pub fn new() -> Self {
        Self
    }

    /// `SHA3-256(salt) ‖ canonical(raw)`, the exact bytes validators verify.
    pub fn canonical_message(&self, raw: &RawTransaction) -> Vec<u8> {
        let prefix = Sha3_256::digest(RAW_TRANSACTION_SALT);
        let body = raw.to_bcs();
        let mut message = Vec::with_capacity(prefix.len() + body.len());
        message.extend_from_slice(&prefix);
        message.extend_from_slice(&body);
        message
    }

    /// Sign a copy of `raw`; the input is left untouched.
    pub fn sign(&self, raw: &RawTransaction, keypair: &KeyPair) -> SignedTransaction {
        let message = self.canonical_message(raw);
        let signing_key = keypair.signing_key();
        let signature = signing_key.sign(&message);

        debug!(
            sender = %raw.sender,
            sequence_number = raw.sequence_number,
            "Signed transaction"
        );

        SignedTransaction {
            raw: raw.clone(),
            authenticator: Authenticator {
                scheme: SignatureScheme::Ed25519,
                public_key: *keypair.public_key(),
                signature: signature.to_bytes(),
            },
        }
    }

    /// Strict detached-signature verification.
    pub fn verify(&self, public_key: &[u8; 32], message: &[u8], signature: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(public_key) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        key.verify_strict(message, &signature).is_ok()
    }

    /// Check a signed transaction against its own canonical message.
    pub fn verify_signed(&self, signed: &SignedTransaction) -> bool {
        let message = self.canonical_message(&signed.raw);
        self.verify(
            &signed.authenticator.public_key,
            &message,
            &signed.authenticator.signature,
        )
    }
}
