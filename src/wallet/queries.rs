use super::{json_string, json_u64, WalletService};
use crate::error::{WalletError, WalletResult};
use crate::keys::Address;
use crate::network::{AccountResource, ViewRequest};
use crate::transaction::ModuleId;
use cresca_types::{PaymentCount, PaymentVolume};
use serde_json::Value;
use tracing::debug;

impl WalletService {
    /// Native coin balance in octas.
    ///
    /// An account or coin store that does not exist yet reads as zero; any
    /// other failure propagates.
    pub async fn balance(&self, address: &Address) -> WalletResult<String> {
        let coin_store = &self.config.transaction.coin_store;
        let Some(resource) = self.gateway.get_account_resource(address, coin_store).await? else {
            debug!(address = %address, "No coin store, balance is zero");
            return Ok("0".to_string());
        };

        resource
            .data
            .pointer("/coin/value")
            .and_then(json_string)
            .ok_or_else(|| WalletError::network(format!("malformed coin store for {}", address)))
    }

    pub async fn is_wallet_initialized(&self, address: &Address) -> WalletResult<bool> {
        let module = self.builder.wallet_module().clone();
        let values = self.view(&module, "is_wallet_initialized", address).await?;
        decode_view(values, "is_wallet_initialized", false, |v| v.first().and_then(Value::as_bool))
    }

    pub async fn transaction_count(&self, address: &Address) -> WalletResult<u64> {
        let module = self.builder.wallet_module().clone();
        let values = self.view(&module, "get_transaction_count", address).await?;
        decode_view(values, "get_transaction_count", 0, |v| v.first().and_then(json_u64))
    }

    pub async fn is_payment_initialized(&self, address: &Address) -> WalletResult<bool> {
        let module = self.builder.payments_module().clone();
        let values = self.view(&module, "is_initialized", address).await?;
        decode_view(values, "is_initialized", false, |v| v.first().and_then(Value::as_bool))
    }

    pub async fn payment_count(&self, address: &Address) -> WalletResult<PaymentCount> {
        let module = self.builder.payments_module().clone();
        let values = self.view(&module, "get_payment_count", address).await?;
        decode_view(values, "get_payment_count", PaymentCount::default(), |v| {
            Some(PaymentCount {
                sent: json_u64(v.first()?)?,
                received: json_u64(v.get(1)?)?,
            })
        })
    }

    pub async fn total_volume(&self, address: &Address) -> WalletResult<PaymentVolume> {
        let module = self.builder.payments_module().clone();
        let values = self.view(&module, "get_total_volume", address).await?;
        let absent = PaymentVolume {
            sent: "0".to_string(),
            received: "0".to_string(),
        };
        decode_view(values, "get_total_volume", absent, |v| {
            Some(PaymentVolume {
                sent: json_string(v.first()?)?,
                received: json_string(v.get(1)?)?,
            })
        })
    }

    /// Raw payment history resource, `None` when payments were never initialized.
    pub async fn payment_history(&self, address: &Address) -> WalletResult<Option<AccountResource>> {
        let resource_type = format!("{}::PaymentHistory", self.builder.payments_module());
        self.gateway.get_account_resource(address, &resource_type).await
    }

    /// Run a single-address view function.
    ///
    /// `None` when the node reports the function or account as absent.
    pub(crate) async fn view(
        &self,
        module: &ModuleId,
        function: &str,
        address: &Address,
    ) -> WalletResult<Option<Vec<Value>>> {
        let request = ViewRequest::for_address(module, function, address);
        match self.gateway.view_function(&request).await {
            Ok(values) => Ok(Some(values)),
            Err(WalletError::ResourceNotFound(what)) => {
                debug!(function = %request.function, %what, "View target absent");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Decode a view result, defaulting only when the view target is absent.
///
/// A result that is present but does not have the expected shape is an error.
pub(crate) fn decode_view<T>(
    values: Option<Vec<Value>>,
    function: &str,
    absent: T,
    decode: impl FnOnce(&[Value]) -> Option<T>,
) -> WalletResult<T> {
    let Some(values) = values else {
        return Ok(absent);
    };
    decode(&values).ok_or_else(|| {
        WalletError::network(format!(
            "malformed result from view {}: {}",
            function,
            Value::Array(values.clone())
        ))
    })
}
