use super::{json_u64, WalletService};
use crate::error::{WalletError, WalletResult};
use crate::keys::Address;
use crate::network::OnChainTransaction;
use crate::pipeline::ConfirmationOutcome;
use chrono::{DateTime, Utc};
use cresca_types::{TransactionKind, TransactionRecord, TransactionStatus};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

impl WalletService {
    /// Page of the account's transactions, oldest first as returned by the node.
    pub async fn transaction_history(
        &self,
        address: &Address,
        limit: Option<u32>,
        start: Option<u64>,
    ) -> WalletResult<Vec<TransactionRecord>> {
        let limit = limit.unwrap_or(self.config.history.transaction_limit);
        let transactions = self
            .gateway
            .get_account_transactions(address, Some(limit), start)
            .await?;
        Ok(transactions
            .iter()
            .map(|tx| to_record(tx, Some(address)))
            .collect())
    }

    pub async fn transaction_by_hash(&self, hash: &str) -> WalletResult<TransactionRecord> {
        let tx = self.gateway.get_transaction(hash).await?;
        Ok(to_record(&tx, None))
    }

    /// Recent transactions that have not executed yet.
    pub async fn pending_transactions(&self, address: &Address) -> WalletResult<Vec<TransactionRecord>> {
        let transactions = self
            .gateway
            .get_account_transactions(address, Some(self.config.history.pending_scan), None)
            .await?;
        Ok(transactions
            .iter()
            .filter(|tx| tx.is_pending())
            .map(|tx| to_record(tx, Some(address)))
            .collect())
    }

    /// Wait for a known hash and return its record.
    ///
    /// Fails with `ConfirmationTimeout` if the deadline passes first.
    pub async fn wait_for_transaction(
        &self,
        hash: &str,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> WalletResult<TransactionRecord> {
        let timeout = timeout.unwrap_or_else(|| self.pipeline.confirmation_timeout());
        let outcome = self.pipeline.await_confirmation(hash, timeout, cancel).await?;
        if let ConfirmationOutcome::TimedOut { hash } = outcome {
            return Err(WalletError::ConfirmationTimeout { hash });
        }
        self.transaction_by_hash(hash).await
    }
}

/// Map a node transaction into a history record.
///
/// With `owner` set, transactions sent by someone else are classified as
/// received.
pub fn to_record(tx: &OnChainTransaction, owner: Option<&Address>) -> TransactionRecord {
    let sender = tx.sender.clone().unwrap_or_default();
    let args = tx.arguments();

    let to = match args.first() {
        Some(Value::String(recipient)) => recipient.clone(),
        Some(Value::Array(recipients)) => recipients
            .first()
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| sender.clone()),
        _ => sender.clone(),
    };

    let amount = match args.get(1) {
        Some(Value::Array(amounts)) => amounts.iter().filter_map(json_u64).sum::<u64>().to_string(),
        Some(value) => json_u64(value).map(|a| a.to_string()).unwrap_or_else(|| "0".to_string()),
        None => "0".to_string(),
    };

    let status = match tx.success {
        None => TransactionStatus::Pending,
        Some(true) => TransactionStatus::Completed,
        Some(false) => TransactionStatus::Failed,
    };

    let timestamp = tx
        .timestamp
        .and_then(|micros| i64::try_from(micros).ok())
        .and_then(DateTime::<Utc>::from_timestamp_micros)
        .unwrap_or_default();

    TransactionRecord {
        hash: tx.hash.clone(),
        kind: classify(tx.function(), &sender, owner),
        from: sender,
        to,
        amount,
        timestamp,
        status,
        gas_fee: tx.gas_used.map(|g| g.to_string()),
        error_message: match tx.success {
            Some(false) => tx.vm_status.clone(),
            _ => None,
        },
    }
}

fn classify(function: Option<&str>, sender: &str, owner: Option<&Address>) -> TransactionKind {
    let function = function.unwrap_or_default();
    if function.contains("basket") {
        return TransactionKind::Basket;
    }
    if function.contains("schedule") || function.contains("execute_scheduled") {
        return TransactionKind::Scheduled;
    }
    let sent_by_owner = match (owner, sender.parse::<Address>()) {
        (Some(owner), Ok(sender)) => *owner == sender,
        _ => true,
    };
    if sent_by_owner {
        TransactionKind::Send
    } else {
        TransactionKind::Receive
    }
}
