use super::{json_string, json_u64, WalletService};
use crate::error::{WalletError, WalletResult};
use crate::keys::Address;
use crate::transaction::TransactionResult;
use chrono::{DateTime, Utc};
use cresca_types::ScheduledPayment;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

impl WalletService {
    /// Schedule a payment; `interval` in seconds repeats it, `None` runs it once.
    pub async fn schedule_payment(
        &self,
        password: &str,
        recipient: &Address,
        amount: &str,
        execution_time: DateTime<Utc>,
        interval: Option<u64>,
        cancel: &CancellationToken,
    ) -> WalletResult<TransactionResult> {
        let keypair = self.unlock(password)?;
        let raw = self
            .builder
            .build_schedule_payment(
                &keypair.address(),
                recipient,
                amount,
                execution_time,
                interval.unwrap_or(0),
            )
            .await?;
        let result = self.pipeline.execute(raw, &keypair, cancel).await?;
        info!(hash = %result.hash, recipient = %recipient, "Payment scheduled");
        Ok(result)
    }

    pub async fn execute_scheduled_payment(
        &self,
        password: &str,
        payment_id: &str,
        cancel: &CancellationToken,
    ) -> WalletResult<TransactionResult> {
        let keypair = self.unlock(password)?;
        let raw = self
            .builder
            .build_execute_scheduled(&keypair.address(), payment_id)
            .await?;
        let result = self.pipeline.execute(raw, &keypair, cancel).await?;
        info!(hash = %result.hash, payment_id, "Scheduled payment executed");
        Ok(result)
    }

    /// Payments stored in the account's `ScheduledPayments` resource.
    pub async fn scheduled_payments(&self, address: &Address) -> WalletResult<Vec<ScheduledPayment>> {
        let resource_type = format!("{}::ScheduledPayments", self.builder.wallet_module());
        let Some(resource) = self.gateway.get_account_resource(address, &resource_type).await? else {
            return Ok(Vec::new());
        };

        let Some(entries) = resource.data.get("payments").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let payment = map_payment(entry);
                if payment.is_none() {
                    warn!(address = %address, "Skipping malformed scheduled payment");
                }
                payment
            })
            .collect())
    }

    pub async fn due_payments(&self, address: &Address, now: DateTime<Utc>) -> WalletResult<Vec<ScheduledPayment>> {
        Ok(self
            .scheduled_payments(address)
            .await?
            .into_iter()
            .filter(|p| p.is_due(now))
            .collect())
    }

    pub async fn scheduled_payment(&self, address: &Address, payment_id: &str) -> WalletResult<ScheduledPayment> {
        self.scheduled_payments(address)
            .await?
            .into_iter()
            .find(|p| p.id == payment_id)
            .ok_or_else(|| WalletError::not_found(format!("scheduled payment {}", payment_id)))
    }
}

fn map_payment(entry: &Value) -> Option<ScheduledPayment> {
    let secs = |field: &str| {
        entry
            .get(field)
            .and_then(json_u64)
            .and_then(|s| i64::try_from(s).ok())
            .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
    };

    Some(ScheduledPayment {
        id: entry.get("id").and_then(json_string)?,
        recipient_address: entry.get("recipient").and_then(json_string)?,
        amount: entry.get("amount").and_then(json_string)?,
        execution_time: secs("execution_time")?,
        interval: entry
            .get("interval")
            .and_then(json_u64)
            .filter(|&interval| interval > 0),
        is_executed: entry.get("executed").and_then(Value::as_bool).unwrap_or(false),
        created_at: secs("created_at").unwrap_or_default(),
        description: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_contract_entry() {
        let payment = map_payment(&json!({
            "id": "3",
            "recipient": "0x2",
            "amount": "500",
            "execution_time": "1700000000",
            "interval": "0",
            "executed": false,
            "created_at": "1699990000"
        }))
        .unwrap();
        assert_eq!(payment.id, "3");
        assert_eq!(payment.interval, None);
        assert_eq!(payment.execution_time.timestamp(), 1_700_000_000);
        assert_eq!(payment.created_at.timestamp(), 1_699_990_000);
    }

    #[test]
    fn recurring_interval_is_kept() {
        let payment = map_payment(&json!({
            "id": 4,
            "recipient": "0x2",
            "amount": 1,
            "execution_time": 1700000000u64,
            "interval": 86400,
            "executed": true
        }))
        .unwrap();
        assert_eq!(payment.id, "4");
        assert_eq!(payment.interval, Some(86_400));
        assert!(payment.is_executed);
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert!(map_payment(&json!({"id": "1"})).is_none());
    }
}
