use super::payload::{EntryFunctionPayload, ModuleId, MoveArg};
use super::RawTransaction;
use crate::config::AppConfig;
use crate::error::{WalletError, WalletResult};
use crate::keys::Address;
use crate::network::NetworkGateway;
use crate::pipeline::SequenceLeases;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Parse a decimal amount in octas.
pub fn parse_amount(amount: &str) -> WalletResult<u64> {
    amount
        .trim()
        .parse::<u64>()
        .map_err(|_| WalletError::invalid_argument(format!("invalid amount: {:?}", amount)))
}

/// Assembles unsigned transactions for the wallet's fixed set of operations.
///
/// Every build reads the sender's sequence number from the gateway and leases
/// it through [`SequenceLeases`], so nothing is cached between builds.
pub struct TransactionBuilder {
    gateway: Arc<dyn NetworkGateway>,
    leases: Arc<SequenceLeases>,
    payments: ModuleId,
    wallet: ModuleId,
    chain_id: u8,
    max_gas_amount: u64,
    gas_unit_price: u64,
    timeout_secs: u64,
    default_memo: String,
}

impl std::fmt::Debug for TransactionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionBuilder")
            .field("payments", &self.payments.to_string())
            .field("wallet", &self.wallet.to_string())
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl TransactionBuilder {
    pub fn new(
        gateway: Arc<dyn NetworkGateway>,
        leases: Arc<SequenceLeases>,
        config: &AppConfig,
    ) -> WalletResult<Self> {
        let contract: Address = config.contract.address.parse()?;
        if config.transaction.timeout_secs == 0 {
            return Err(WalletError::invalid_argument(
                "transaction timeout must be at least one second",
            ));
        }

        Ok(Self {
            gateway,
            leases,
            payments: ModuleId::new(contract, config.contract.payments_module.clone()),
            wallet: ModuleId::new(contract, config.contract.wallet_module.clone()),
            chain_id: config.network.chain_id,
            max_gas_amount: config.transaction.max_gas_amount,
            gas_unit_price: config.transaction.gas_unit_price,
            timeout_secs: config.transaction.timeout_secs,
            default_memo: config.transaction.default_memo.clone(),
        })
    }

    pub fn payments_module(&self) -> &ModuleId {
        &self.payments
    }

    pub fn wallet_module(&self) -> &ModuleId {
        &self.wallet
    }

    /// `payments::send_payment(recipient, amount, memo)`
    pub async fn build_transfer(
        &self,
        sender: &Address,
        recipient: &Address,
        amount: &str,
        memo: Option<&str>,
    ) -> WalletResult<RawTransaction> {
        let amount = parse_amount(amount)?;
        let memo = memo.unwrap_or(&self.default_memo).to_string();
        let payload = EntryFunctionPayload::new(
            self.payments.clone(),
            "send_payment",
            vec![MoveArg::Address(*recipient), MoveArg::U64(amount), MoveArg::String(memo)],
        );
        self.prepare(sender, payload).await
    }

    /// `payments::initialize()`
    pub async fn build_initialize_wallet(&self, sender: &Address) -> WalletResult<RawTransaction> {
        let payload = EntryFunctionPayload::new(self.payments.clone(), "initialize", vec![]);
        self.prepare(sender, payload).await
    }

    /// `wallet::schedule_payment(recipient, amount, execution_time, interval)`
    ///
    /// `interval` is in seconds; zero schedules a one-time payment.
    pub async fn build_schedule_payment(
        &self,
        sender: &Address,
        recipient: &Address,
        amount: &str,
        execution_time: DateTime<Utc>,
        interval: u64,
    ) -> WalletResult<RawTransaction> {
        let amount = parse_amount(amount)?;
        let execution_time = u64::try_from(execution_time.timestamp()).map_err(|_| {
            WalletError::invalid_argument("execution time must not precede the epoch")
        })?;
        let payload = EntryFunctionPayload::new(
            self.wallet.clone(),
            "schedule_payment",
            vec![
                MoveArg::Address(*recipient),
                MoveArg::U64(amount),
                MoveArg::U64(execution_time),
                MoveArg::U64(interval),
            ],
        );
        self.prepare(sender, payload).await
    }

    /// `wallet::execute_scheduled_payment(payment_id)`
    pub async fn build_execute_scheduled(
        &self,
        sender: &Address,
        payment_id: &str,
    ) -> WalletResult<RawTransaction> {
        let payment_id = payment_id
            .trim()
            .parse::<u64>()
            .map_err(|_| WalletError::invalid_argument(format!("invalid payment id: {:?}", payment_id)))?;
        let payload = EntryFunctionPayload::new(
            self.wallet.clone(),
            "execute_scheduled_payment",
            vec![MoveArg::U64(payment_id)],
        );
        self.prepare(sender, payload).await
    }

    /// `wallet::create_basket(name: vector<u8>, initial_value)`
    pub async fn build_create_basket(
        &self,
        sender: &Address,
        name: &str,
        initial_value: &str,
    ) -> WalletResult<RawTransaction> {
        if name.trim().is_empty() {
            return Err(WalletError::invalid_argument("basket name must not be empty"));
        }
        let initial_value = parse_amount(initial_value)?;
        let payload = EntryFunctionPayload::new(
            self.wallet.clone(),
            "create_basket",
            vec![MoveArg::Bytes(name.as_bytes().to_vec()), MoveArg::U64(initial_value)],
        );
        self.prepare(sender, payload).await
    }

    /// `payments::tap_to_pay(recipient, amount)`, no memo.
    pub async fn build_tap_to_pay(
        &self,
        sender: &Address,
        recipient: &Address,
        amount: &str,
    ) -> WalletResult<RawTransaction> {
        let amount = parse_amount(amount)?;
        let payload = EntryFunctionPayload::new(
            self.payments.clone(),
            "tap_to_pay",
            vec![MoveArg::Address(*recipient), MoveArg::U64(amount)],
        );
        self.prepare(sender, payload).await
    }

    /// `payments::batch_send(recipients, amounts)`
    ///
    /// Argument validation happens before any network call.
    pub async fn build_batch_send(
        &self,
        sender: &Address,
        recipients: &[Address],
        amounts: &[String],
    ) -> WalletResult<RawTransaction> {
        if recipients.len() != amounts.len() {
            return Err(WalletError::ArgumentMismatch(format!(
                "{} recipients but {} amounts",
                recipients.len(),
                amounts.len()
            )));
        }
        if recipients.is_empty() {
            return Err(WalletError::invalid_argument("batch send needs at least one recipient"));
        }
        let amounts = amounts
            .iter()
            .map(|a| parse_amount(a))
            .collect::<WalletResult<Vec<_>>>()?;

        let payload = EntryFunctionPayload::new(
            self.payments.clone(),
            "batch_send",
            vec![MoveArg::AddressVector(recipients.to_vec()), MoveArg::U64Vector(amounts)],
        );
        self.prepare(sender, payload).await
    }

    /// Fill the envelope around `payload` with a fresh sequence number.
    async fn prepare(&self, sender: &Address, payload: EntryFunctionPayload) -> WalletResult<RawTransaction> {
        let account = self
            .gateway
            .get_account(sender)
            .await?
            .ok_or_else(|| WalletError::not_found(format!("account {}", sender)))?;

        let sequence_number = self.leases.reserve(sender, account.sequence_number);
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();

        let raw = RawTransaction {
            sender: *sender,
            sequence_number,
            max_gas_amount: self.max_gas_amount,
            gas_unit_price: self.gas_unit_price,
            expiration_timestamp_secs: now + self.timeout_secs,
            payload,
            chain_id: self.chain_id,
        };

        debug!(
            sender = %sender,
            sequence_number,
            function = %raw.payload.function_id(),
            "Built transaction"
        );
        Ok(raw)
    }
}
