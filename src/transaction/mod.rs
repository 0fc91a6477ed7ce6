//! Transaction data model, canonical encoding, construction and signing.

pub mod bcs;
pub mod builder;
pub mod payload;
pub mod signer;

pub use builder::TransactionBuilder;
pub use payload::{EntryFunctionPayload, ModuleId, MoveArg};
pub use signer::TransactionSigner;

use crate::keys::{Address, SignatureScheme};
use bcs::{BcsEncode, BcsWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unsigned transaction envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTransaction {
    pub sender: Address,
    #[serde(with = "u64_string")]
    pub sequence_number: u64,
    #[serde(with = "u64_string")]
    pub max_gas_amount: u64,
    #[serde(with = "u64_string")]
    pub gas_unit_price: u64,
    #[serde(with = "u64_string")]
    pub expiration_timestamp_secs: u64,
    pub payload: EntryFunctionPayload,
    pub chain_id: u8,
}

impl BcsEncode for RawTransaction {
    fn encode(&self, writer: &mut BcsWriter) {
        writer.write_fixed(self.sender.as_bytes());
        writer.write_u64(self.sequence_number);
        self.payload.encode(writer);
        writer.write_u64(self.max_gas_amount);
        writer.write_u64(self.gas_unit_price);
        writer.write_u64(self.expiration_timestamp_secs);
        writer.write_u8(self.chain_id);
    }
}

/// Detached signature plus the key that produced it.
#[derive(Clone, PartialEq, Eq)]
pub struct Authenticator {
    pub scheme: SignatureScheme,
    pub public_key: [u8; 32],
    pub signature: [u8; 64],
}

impl Authenticator {
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.public_key))
    }

    pub fn signature_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signature))
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("scheme", &self.scheme)
            .field("public_key", &self.public_key_hex())
            .field("signature", &self.signature_hex())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: RawTransaction,
    pub authenticator: Authenticator,
}

impl SignedTransaction {
    pub fn sender(&self) -> &Address {
        &self.raw.sender
    }

    pub fn sequence_number(&self) -> u64 {
        self.raw.sequence_number
    }
}

/// Node acknowledgement of an accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
    pub sender: Address,
    #[serde(with = "u64_string")]
    pub sequence_number: u64,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Dry-run outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub success: bool,
    #[serde(with = "u64_string")]
    pub gas_used: u64,
    pub vm_status: String,
}

/// Terminal on-chain outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub success: bool,
    pub hash: String,
    pub gas_used: u64,
    pub vm_status: String,
    /// Commit time in microseconds since the epoch
    pub timestamp: u64,
}

/// Lifecycle of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Built,
    Signed,
    Simulated,
    Pending,
    Confirmed,
    Failed,
    TimedOut,
}

impl TransactionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::TimedOut)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Built => "built",
            Self::Signed => "signed",
            Self::Simulated => "simulated",
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        };
        f.write_str(name)
    }
}

/// The REST API encodes u64 values as decimal strings.
pub(crate) mod u64_string {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        struct U64Visitor;

        impl<'de> Visitor<'de> for U64Visitor {
            type Value = u64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a u64 as a decimal string or number")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
                Ok(v)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(U64Visitor)
    }
}
