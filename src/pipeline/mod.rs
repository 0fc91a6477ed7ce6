//! Simulate, submit and confirm signed transactions.

mod sequence;

pub use sequence::SequenceLeases;

use crate::config::AppConfig;
use crate::error::{WalletError, WalletResult};
use crate::keys::KeyPair;
use crate::network::NetworkGateway;
use crate::transaction::{
    PendingTransaction, RawTransaction, SignedTransaction, SimulationResult, TransactionResult,
    TransactionSigner, TransactionState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How polling for a submitted transaction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed(TransactionResult),
    /// Executed on-chain but aborted; the sequence number is consumed.
    Failed(TransactionResult),
    /// Not observed before the deadline; it may still land later.
    TimedOut { hash: String },
}

impl ConfirmationOutcome {
    pub fn state(&self) -> TransactionState {
        match self {
            Self::Confirmed(_) => TransactionState::Confirmed,
            Self::Failed(_) => TransactionState::Failed,
            Self::TimedOut { .. } => TransactionState::TimedOut,
        }
    }
}

/// Drives a transaction from `Built` to a terminal state.
pub struct SubmissionPipeline {
    gateway: Arc<dyn NetworkGateway>,
    signer: TransactionSigner,
    leases: Arc<SequenceLeases>,
    chain_id: u8,
    simulate_before_submit: bool,
    estimate_gas: bool,
    gas_multiplier_pct: u64,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl std::fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPipeline")
            .field("chain_id", &self.chain_id)
            .field("simulate_before_submit", &self.simulate_before_submit)
            .field("poll_interval", &self.poll_interval)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .finish_non_exhaustive()
    }
}

impl SubmissionPipeline {
    pub fn new(gateway: Arc<dyn NetworkGateway>, leases: Arc<SequenceLeases>, config: &AppConfig) -> Self {
        Self {
            gateway,
            signer: TransactionSigner::new(),
            leases,
            chain_id: config.network.chain_id,
            simulate_before_submit: config.transaction.simulate_before_submit,
            estimate_gas: config.transaction.estimate_gas,
            gas_multiplier_pct: config.transaction.gas_estimate_multiplier_pct,
            poll_interval: config.confirmation.poll_interval(),
            confirmation_timeout: config.confirmation.timeout(),
        }
    }

    pub fn leases(&self) -> &Arc<SequenceLeases> {
        &self.leases
    }

    pub fn confirmation_timeout(&self) -> Duration {
        self.confirmation_timeout
    }

    pub fn sign(&self, raw: &RawTransaction, keypair: &KeyPair) -> SignedTransaction {
        self.signer.sign(raw, keypair)
    }

    /// Dry-run a signed transaction.
    ///
    /// A `success = false` result is returned as a value; callers must not
    /// submit it.
    pub async fn simulate(&self, signed: &SignedTransaction) -> WalletResult<SimulationResult> {
        let results = self.gateway.simulate_transaction(signed).await?;
        let result = results.into_iter().next().ok_or_else(|| WalletError::SimulationFailure {
            vm_status: "node returned no simulation result".to_string(),
        })?;

        debug!(
            sender = %signed.sender(),
            sequence_number = signed.sequence_number(),
            success = result.success,
            gas_used = result.gas_used,
            vm_status = %result.vm_status,
            "Simulated transaction"
        );
        Ok(result)
    }

    /// Send a signed transaction to the mempool.
    ///
    /// Any failure drops the sender's leases so the next build resyncs.
    pub async fn submit(&self, signed: &SignedTransaction) -> WalletResult<PendingTransaction> {
        if signed.raw.chain_id != self.chain_id {
            self.leases.forget(signed.sender());
            return Err(WalletError::invalid_argument(format!(
                "transaction targets chain {} but the gateway serves chain {}",
                signed.raw.chain_id, self.chain_id
            )));
        }

        match self.gateway.submit_transaction(signed).await {
            Ok(pending) => {
                info!(
                    sender = %signed.sender(),
                    sequence_number = signed.sequence_number(),
                    hash = %pending.hash,
                    "Transaction submitted"
                );
                Ok(pending)
            }
            Err(e) => {
                warn!(
                    sender = %signed.sender(),
                    sequence_number = signed.sequence_number(),
                    error = %e,
                    "Transaction submission failed"
                );
                // the transaction may or may not have reached the mempool
                self.leases.forget(signed.sender());
                Err(e)
            }
        }
    }

    /// Poll until the transaction reaches a terminal state or `timeout` elapses.
    ///
    /// "Not found" and transport errors are treated as not-yet-indexed. On
    /// cancellation no further polls are issued and `Cancelled` is returned;
    /// the transaction itself is unaffected.
    pub async fn await_confirmation(
        &self,
        hash: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> WalletResult<ConfirmationOutcome> {
        let deadline = Instant::now() + timeout;
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(WalletError::Cancelled);
            }
            attempt += 1;

            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WalletError::Cancelled),
                _ = sleep_until(deadline) => None,
                polled = self.gateway.get_transaction(hash) => Some(polled),
            };

            match polled {
                Some(Ok(tx)) => {
                    if let Some(result) = tx.to_result() {
                        let outcome = if result.success {
                            ConfirmationOutcome::Confirmed(result)
                        } else {
                            ConfirmationOutcome::Failed(result)
                        };
                        info!(hash, attempt, state = %outcome.state(), "Transaction finalized");
                        return Ok(outcome);
                    }
                    debug!(hash, attempt, "Transaction still pending");
                }
                Some(Err(WalletError::ResourceNotFound(_))) => {
                    debug!(hash, attempt, "Transaction not indexed yet");
                }
                Some(Err(WalletError::Network(e))) => {
                    warn!(hash, attempt, error = %e, "Transient error while polling");
                }
                Some(Err(e)) => return Err(e),
                None => {}
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(hash, attempt, "Transaction not confirmed before the deadline");
                return Ok(ConfirmationOutcome::TimedOut {
                    hash: hash.to_string(),
                });
            }

            let pause = self.poll_interval.min(deadline - now);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WalletError::Cancelled),
                _ = sleep(pause) => {}
            }
        }
    }

    /// Simulated gas usage scaled by the configured safety margin.
    pub async fn estimate_gas(&self, raw: &RawTransaction, keypair: &KeyPair) -> WalletResult<u64> {
        let signed = self.sign(raw, keypair);
        let simulation = self.simulate(&signed).await?;
        if !simulation.success {
            return Err(WalletError::SimulationFailure {
                vm_status: simulation.vm_status,
            });
        }

        let estimate = simulation
            .gas_used
            .saturating_mul(self.gas_multiplier_pct)
            / 100;
        let estimate = estimate.max(simulation.gas_used).max(1);
        debug!(gas_used = simulation.gas_used, estimate, "Estimated gas");
        Ok(estimate)
    }

    /// Full flow: (estimate) → sign → (simulate) → submit → confirm.
    ///
    /// Terminal failures surface as errors: an aborted transaction as
    /// `ExecutionFailed`, a missed deadline as `ConfirmationTimeout`.
    pub async fn execute(
        &self,
        mut raw: RawTransaction,
        keypair: &KeyPair,
        cancel: &CancellationToken,
    ) -> WalletResult<TransactionResult> {
        let sender = raw.sender;
        let sequence_number = raw.sequence_number;
        debug!(sender = %sender, sequence_number, state = %TransactionState::Built, "Executing transaction");

        if self.estimate_gas {
            match self.estimate_gas(&raw, keypair).await {
                Ok(gas) => raw.max_gas_amount = gas,
                Err(e) => {
                    self.leases.forget(&sender);
                    return Err(e);
                }
            }
        }

        let signed = self.sign(&raw, keypair);

        if self.simulate_before_submit {
            let simulation = match self.simulate(&signed).await {
                Ok(simulation) => simulation,
                Err(e) => {
                    self.leases.forget(&sender);
                    return Err(e);
                }
            };
            if !simulation.success {
                warn!(
                    sender = %sender,
                    sequence_number,
                    vm_status = %simulation.vm_status,
                    "Simulation failed, not submitting"
                );
                self.leases.forget(&sender);
                return Err(WalletError::SimulationFailure {
                    vm_status: simulation.vm_status,
                });
            }
        }

        let pending = self.submit(&signed).await?;

        let outcome = match self
            .await_confirmation(&pending.hash, self.confirmation_timeout, cancel)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.leases.forget(&sender);
                return Err(e);
            }
        };

        match outcome {
            ConfirmationOutcome::Confirmed(result) => {
                self.leases.confirm(&sender, sequence_number);
                Ok(result)
            }
            ConfirmationOutcome::Failed(result) => {
                self.leases.confirm(&sender, sequence_number);
                Err(WalletError::ExecutionFailed {
                    hash: result.hash,
                    vm_status: result.vm_status,
                })
            }
            ConfirmationOutcome::TimedOut { hash } => {
                self.leases.forget(&sender);
                Err(WalletError::ConfirmationTimeout { hash })
            }
        }
    }
}
