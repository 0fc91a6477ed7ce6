use super::WalletService;
use crate::error::WalletResult;
use crate::keys::Address;
use crate::transaction::TransactionResult;
use tokio_util::sync::CancellationToken;
use tracing::info;

impl WalletService {
    /// Register the account with the payments module.
    pub async fn initialize_on_chain(
        &self,
        password: &str,
        cancel: &CancellationToken,
    ) -> WalletResult<TransactionResult> {
        let keypair = self.unlock(password)?;
        let raw = self.builder.build_initialize_wallet(&keypair.address()).await?;
        let result = self.pipeline.execute(raw, &keypair, cancel).await?;
        info!(hash = %result.hash, "Wallet initialized on-chain");
        Ok(result)
    }

    /// Transfer with a memo; the configured default memo when `None`.
    pub async fn send_coins(
        &self,
        password: &str,
        recipient: &Address,
        amount: &str,
        memo: Option<&str>,
        cancel: &CancellationToken,
    ) -> WalletResult<TransactionResult> {
        let keypair = self.unlock(password)?;
        let raw = self
            .builder
            .build_transfer(&keypair.address(), recipient, amount, memo)
            .await?;
        let result = self.pipeline.execute(raw, &keypair, cancel).await?;
        info!(hash = %result.hash, recipient = %recipient, amount, "Coins sent");
        Ok(result)
    }

    pub async fn tap_to_pay(
        &self,
        password: &str,
        recipient: &Address,
        amount: &str,
        cancel: &CancellationToken,
    ) -> WalletResult<TransactionResult> {
        let keypair = self.unlock(password)?;
        let raw = self
            .builder
            .build_tap_to_pay(&keypair.address(), recipient, amount)
            .await?;
        let result = self.pipeline.execute(raw, &keypair, cancel).await?;
        info!(hash = %result.hash, recipient = %recipient, amount, "Tap-to-pay sent");
        Ok(result)
    }

    pub async fn batch_send(
        &self,
        password: &str,
        recipients: &[Address],
        amounts: &[String],
        cancel: &CancellationToken,
    ) -> WalletResult<TransactionResult> {
        let keypair = self.unlock(password)?;
        let raw = self
            .builder
            .build_batch_send(&keypair.address(), recipients, amounts)
            .await?;
        let result = self.pipeline.execute(raw, &keypair, cancel).await?;
        info!(hash = %result.hash, recipients = recipients.len(), "Batch sent");
        Ok(result)
    }

    /// Simulated gas for a transfer, without submitting anything.
    pub async fn estimate_transfer_gas(
        &self,
        password: &str,
        recipient: &Address,
        amount: &str,
    ) -> WalletResult<u64> {
        let keypair = self.unlock(password)?;
        let sender = keypair.address();
        let raw = self
            .builder
            .build_transfer(&sender, recipient, amount, None)
            .await?;
        let estimate = self.pipeline.estimate_gas(&raw, &keypair).await;
        self.pipeline.leases().release(&sender, raw.sequence_number);
        estimate
    }
}
