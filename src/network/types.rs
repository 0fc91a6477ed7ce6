use crate::keys::Address;
use crate::transaction::{u64_string, ModuleId, TransactionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(with = "u64_string")]
    pub sequence_number: u64,
    #[serde(default)]
    pub authentication_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub data: Value,
}

/// Transaction as returned by the by-hash and account history endpoints.
///
/// Pending transactions carry no `success` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnChainTransaction {
    #[serde(rename = "type", default)]
    pub tx_type: String,
    pub hash: String,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default, with = "opt_u64_string")]
    pub sequence_number: Option<u64>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub vm_status: Option<String>,
    #[serde(default, with = "opt_u64_string")]
    pub gas_used: Option<u64>,
    /// Microseconds since the epoch
    #[serde(default, with = "opt_u64_string")]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl OnChainTransaction {
    pub fn is_pending(&self) -> bool {
        self.success.is_none()
    }

    /// Terminal result once the transaction has executed.
    pub fn to_result(&self) -> Option<TransactionResult> {
        let success = self.success?;
        Some(TransactionResult {
            success,
            hash: self.hash.clone(),
            gas_used: self.gas_used.unwrap_or_default(),
            vm_status: self.vm_status.clone().unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_default(),
        })
    }

    /// Fully qualified entry function name, if any.
    pub fn function(&self) -> Option<&str> {
        self.payload.as_ref()?.get("function")?.as_str()
    }

    pub fn arguments(&self) -> &[Value] {
        self.payload
            .as_ref()
            .and_then(|p| p.get("arguments"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Body of a `/view` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRequest {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

impl ViewRequest {
    pub fn new(module: &ModuleId, function: &str, type_arguments: Vec<String>, arguments: Vec<Value>) -> Self {
        Self {
            function: format!("{}::{}", module, function),
            type_arguments,
            arguments,
        }
    }

    /// Common shape: a single address argument, no type arguments.
    pub fn for_address(module: &ModuleId, function: &str, address: &Address) -> Self {
        Self::new(module, function, Vec::new(), vec![Value::String(address.to_hex())])
    }
}

mod opt_u64_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom("expected unsigned integer")),
            Some(Value::String(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
            Some(other) => Err(serde::de::Error::custom(format!("unexpected value {}", other))),
        }
    }
}
