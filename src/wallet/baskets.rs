use super::queries::decode_view;
use super::{json_string, json_u64, WalletService};
use crate::error::{WalletError, WalletResult};
use crate::keys::Address;
use crate::transaction::TransactionResult;
use chrono::{DateTime, Utc};
use cresca_types::Basket;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

impl WalletService {
    pub async fn create_basket(
        &self,
        password: &str,
        name: &str,
        initial_value: &str,
        cancel: &CancellationToken,
    ) -> WalletResult<TransactionResult> {
        let keypair = self.unlock(password)?;
        let raw = self
            .builder
            .build_create_basket(&keypair.address(), name, initial_value)
            .await?;
        let result = self.pipeline.execute(raw, &keypair, cancel).await?;
        info!(hash = %result.hash, name, "Basket created");
        Ok(result)
    }

    /// Baskets stored in the account's `Baskets` resource.
    pub async fn baskets(&self, address: &Address) -> WalletResult<Vec<Basket>> {
        let resource_type = format!("{}::Baskets", self.builder.wallet_module());
        let Some(resource) = self.gateway.get_account_resource(address, &resource_type).await? else {
            return Ok(Vec::new());
        };
        let Some(entries) = resource.data.get("owned_baskets").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let basket = map_basket(entry);
                if basket.is_none() {
                    warn!(address = %address, "Skipping malformed basket");
                }
                basket
            })
            .collect())
    }

    pub async fn basket(&self, address: &Address, basket_id: &str) -> WalletResult<Basket> {
        self.baskets(address)
            .await?
            .into_iter()
            .find(|b| b.id == basket_id)
            .ok_or_else(|| WalletError::not_found(format!("basket {}", basket_id)))
    }

    pub async fn basket_count(&self, address: &Address) -> WalletResult<u64> {
        let module = self.builder.wallet_module().clone();
        let values = self.view(&module, "get_basket_count", address).await?;
        decode_view(values, "get_basket_count", 0, |v| v.first().and_then(json_u64))
    }
}

/// Basket names are stored on-chain as hex-encoded UTF-8 bytes.
fn decode_name(raw: &str) -> Option<String> {
    let bytes = hex::decode(raw.trim_start_matches("0x")).ok()?;
    String::from_utf8(bytes).ok()
}

fn map_basket(entry: &Value) -> Option<Basket> {
    let created_at = entry
        .get("created_at")
        .and_then(json_u64)
        .and_then(|s| i64::try_from(s).ok())
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .unwrap_or_default();

    Some(Basket {
        id: entry.get("id").and_then(json_string)?,
        name: entry.get("name").and_then(Value::as_str).and_then(decode_name)?,
        total_value: entry.get("total_value").and_then(json_string)?,
        created_at,
        owner_address: entry.get("owner").and_then(json_string).unwrap_or_default(),
        assets: Vec::new(),
    })
}
