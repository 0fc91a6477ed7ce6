//! Plain data records produced by the Cresca wallet core.
//!
//! These are the values the presentation layer (screens, state containers)
//! consumes. They carry no behaviour and no key material.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wallet account summary shown on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    /// `0x`-prefixed account address
    pub address: String,
    /// `0x`-prefixed ed25519 public key
    pub public_key: String,
    /// Balance in octas, decimal string
    pub balance: String,
    pub transaction_count: u64,
    pub created_at: DateTime<Utc>,
    /// Whether the wallet module has been initialized on-chain
    pub is_initialized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Send,
    Receive,
    Basket,
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// One entry of the account's transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub timestamp: DateTime<Utc>,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A payment scheduled through the wallet contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPayment {
    pub id: String,
    pub recipient_address: String,
    pub amount: String,
    pub execution_time: DateTime<Utc>,
    /// Repeat interval in seconds, `None` for one-time payments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    pub is_executed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScheduledPayment {
    /// A payment is due once its execution time has passed and it has not run yet.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_executed && self.execution_time <= now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketAsset {
    pub symbol: String,
    pub amount: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basket {
    pub id: String,
    pub name: String,
    pub total_value: String,
    pub created_at: DateTime<Utc>,
    pub owner_address: String,
    #[serde(default)]
    pub assets: Vec<BasketAsset>,
}

/// Number of payments sent and received through the payments module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCount {
    pub sent: u64,
    pub received: u64,
}

/// Total payment volume in octas, sent and received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVolume {
    pub sent: String,
    pub received: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn scheduled_payment_due_only_when_past_and_unexecuted() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let mut payment = ScheduledPayment {
            id: "1".to_string(),
            recipient_address: "0x1".to_string(),
            amount: "10".to_string(),
            execution_time: now - Duration::minutes(1),
            interval: None,
            is_executed: false,
            created_at: now - Duration::days(1),
            description: None,
        };
        assert!(payment.is_due(now));

        payment.is_executed = true;
        assert!(!payment.is_due(now));

        payment.is_executed = false;
        payment.execution_time = now + Duration::minutes(1);
        assert!(!payment.is_due(now));
    }

    #[test]
    fn records_serialize_in_camel_case() {
        let account = WalletAccount {
            address: "0xabc".to_string(),
            public_key: "0xdef".to_string(),
            balance: "0".to_string(),
            transaction_count: 0,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            is_initialized: false,
        };
        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains("publicKey"));
        assert!(json.contains("isInitialized"));
    }
}
