use super::bcs::{BcsEncode, BcsWriter};
use crate::keys::Address;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Payload variant tag for entry-function calls.
const ENTRY_FUNCTION_VARIANT: u64 = 2;

/// Typed Move call argument.
///
/// Each value has both a JSON form (for the REST API) and a canonical binary
/// form (for the signing message).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveArg {
    Address(Address),
    U64(u64),
    String(String),
    Bytes(Vec<u8>),
    AddressVector(Vec<Address>),
    U64Vector(Vec<u64>),
}

impl MoveArg {
    /// JSON form: u64 values as decimal strings, bytes as `0x` hex.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Address(addr) => Value::String(addr.to_hex()),
            Self::U64(n) => Value::String(n.to_string()),
            Self::String(s) => Value::String(s.clone()),
            Self::Bytes(b) => Value::String(format!("0x{}", hex::encode(b))),
            Self::AddressVector(addrs) => {
                Value::Array(addrs.iter().map(|a| Value::String(a.to_hex())).collect())
            }
            Self::U64Vector(values) => {
                Value::Array(values.iter().map(|n| Value::String(n.to_string())).collect())
            }
        }
    }
}

impl BcsEncode for MoveArg {
    fn encode(&self, writer: &mut BcsWriter) {
        match self {
            Self::Address(addr) => writer.write_fixed(addr.as_bytes()),
            Self::U64(n) => writer.write_u64(*n),
            Self::String(s) => writer.write_str(s),
            Self::Bytes(b) => writer.write_bytes(b),
            Self::AddressVector(addrs) => {
                writer.write_seq(addrs, |w, a| w.write_fixed(a.as_bytes()))
            }
            Self::U64Vector(values) => writer.write_seq(values, |w, n| w.write_u64(*n)),
        }
    }
}

/// `address::module` pair identifying a published Move module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleId {
    pub address: Address,
    pub name: String,
}

impl ModuleId {
    pub fn new(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.address, self.name)
    }
}

/// Call of a public entry function, the only payload the wallet issues.
///
/// Type arguments are always empty for the fixed set of payment operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFunctionPayload {
    pub module: ModuleId,
    pub function: String,
    pub args: Vec<MoveArg>,
}

impl EntryFunctionPayload {
    pub fn new(module: ModuleId, function: impl Into<String>, args: Vec<MoveArg>) -> Self {
        Self {
            module,
            function: function.into(),
            args,
        }
    }

    /// Fully qualified `0x…::module::function` name.
    pub fn function_id(&self) -> String {
        format!("{}::{}", self.module, self.function)
    }

    pub fn arguments_json(&self) -> Vec<Value> {
        self.args.iter().map(MoveArg::to_json).collect()
    }
}

impl BcsEncode for EntryFunctionPayload {
    fn encode(&self, writer: &mut BcsWriter) {
        writer.write_uleb128(ENTRY_FUNCTION_VARIANT);
        writer.write_fixed(self.module.address.as_bytes());
        writer.write_str(&self.module.name);
        writer.write_str(&self.function);
        // no type arguments
        writer.write_uleb128(0);
        writer.write_seq(&self.args, |w, arg| w.write_bytes(&arg.to_bcs()));
    }
}

impl Serialize for EntryFunctionPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EntryFunctionPayload", 4)?;
        state.serialize_field("type", "entry_function_payload")?;
        state.serialize_field("function", &self.function_id())?;
        state.serialize_field("type_arguments", &Vec::<String>::new())?;
        state.serialize_field("arguments", &self.arguments_json())?;
        state.end()
    }
}
