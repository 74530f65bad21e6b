//! Terraform State Encoding
//!
//! Terraform exchanges resource state as msgpack-encoded cty values.
//! Unknown values (not yet known during planning) travel as msgpack
//! extension type 0.

use std::collections::BTreeMap;

use crate::error::{ProviderError, Result};
use crate::tfplugin6;

/// msgpack extension type cty uses for unknown values
const UNKNOWN_EXT_TYPE: i8 = 0;

/// Dynamic value decoded from Terraform state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DynamicValue {
    #[default]
    Null,
    Unknown,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<DynamicValue>),
    Map(BTreeMap<String, DynamicValue>),
}

impl DynamicValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, DynamicValue::Unknown)
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DynamicValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, DynamicValue>> {
        match self {
            DynamicValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Attribute lookup; absent attributes and non-objects read as null.
    pub fn get(&self, key: &str) -> &DynamicValue {
        static NULL: DynamicValue = DynamicValue::Null;
        self.as_map().and_then(|m| m.get(key)).unwrap_or(&NULL)
    }

    /// Convert a JSON value, as found in stored raw state.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DynamicValue::Null,
            serde_json::Value::Bool(b) => DynamicValue::Bool(b),
            serde_json::Value::Number(n) => DynamicValue::Number(n),
            serde_json::Value::String(s) => DynamicValue::String(s),
            serde_json::Value::Array(items) => {
                DynamicValue::List(items.into_iter().map(DynamicValue::from_json).collect())
            }
            serde_json::Value::Object(map) => DynamicValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, DynamicValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    fn from_msgpack(value: rmpv::Value) -> Result<Self> {
        Ok(match value {
            rmpv::Value::Nil => DynamicValue::Null,
            rmpv::Value::Boolean(b) => DynamicValue::Bool(b),
            rmpv::Value::Integer(i) => {
                let number = if let Some(n) = i.as_i64() {
                    serde_json::Number::from(n)
                } else if let Some(n) = i.as_u64() {
                    serde_json::Number::from(n)
                } else {
                    return Err(ProviderError::State(format!("integer out of range: {i}")));
                };
                DynamicValue::Number(number)
            }
            rmpv::Value::F32(f) => float_value(f as f64),
            rmpv::Value::F64(f) => float_value(f),
            rmpv::Value::String(s) => match s.into_str() {
                Some(s) => DynamicValue::String(s),
                None => return Err(ProviderError::State("string is not valid UTF-8".to_string())),
            },
            rmpv::Value::Binary(_) => {
                return Err(ProviderError::State("unexpected binary value".to_string()))
            }
            rmpv::Value::Array(items) => DynamicValue::List(
                items
                    .into_iter()
                    .map(DynamicValue::from_msgpack)
                    .collect::<Result<_>>()?,
            ),
            rmpv::Value::Map(entries) => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    let key = match key {
                        rmpv::Value::String(s) => s.into_str().ok_or_else(|| {
                            ProviderError::State("object key is not valid UTF-8".to_string())
                        })?,
                        other => {
                            return Err(ProviderError::State(format!(
                                "object key must be a string, got {other}"
                            )))
                        }
                    };
                    map.insert(key, DynamicValue::from_msgpack(value)?);
                }
                DynamicValue::Map(map)
            }
            rmpv::Value::Ext(UNKNOWN_EXT_TYPE, _) => DynamicValue::Unknown,
            rmpv::Value::Ext(kind, _) => {
                return Err(ProviderError::State(format!("unsupported msgpack extension {kind}")))
            }
        })
    }

    fn to_msgpack(&self) -> rmpv::Value {
        match self {
            DynamicValue::Null => rmpv::Value::Nil,
            DynamicValue::Unknown => rmpv::Value::Ext(UNKNOWN_EXT_TYPE, vec![0]),
            DynamicValue::Bool(b) => rmpv::Value::Boolean(*b),
            DynamicValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    rmpv::Value::from(i)
                } else if let Some(u) = n.as_u64() {
                    rmpv::Value::from(u)
                } else {
                    rmpv::Value::F64(n.as_f64().unwrap_or_default())
                }
            }
            DynamicValue::String(s) => rmpv::Value::from(s.as_str()),
            DynamicValue::List(items) => {
                rmpv::Value::Array(items.iter().map(DynamicValue::to_msgpack).collect())
            }
            DynamicValue::Map(map) => rmpv::Value::Map(
                map.iter()
                    .map(|(k, v)| (rmpv::Value::from(k.as_str()), v.to_msgpack()))
                    .collect(),
            ),
        }
    }
}

/// Decode a Terraform DynamicValue from msgpack bytes
pub fn decode_dynamic_value(data: &[u8]) -> Result<DynamicValue> {
    if data.is_empty() {
        return Ok(DynamicValue::Null);
    }

    let mut reader = data;
    let value = rmpv::decode::read_value(&mut reader)
        .map_err(|e| ProviderError::State(format!("invalid msgpack: {e}")))?;
    DynamicValue::from_msgpack(value)
}

/// Encode a value to Terraform DynamicValue bytes
pub fn encode_dynamic_value(value: &DynamicValue) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, &value.to_msgpack())
        .map_err(|e| ProviderError::State(format!("failed to encode msgpack: {e}")))?;
    Ok(buf)
}

/// Decode an optional protocol value; absent values are null.
pub fn decode_optional(value: Option<&tfplugin6::DynamicValue>) -> Result<DynamicValue> {
    match value {
        Some(v) if !v.msgpack.is_empty() => decode_dynamic_value(&v.msgpack),
        Some(v) if !v.json.is_empty() => {
            let json: serde_json::Value = serde_json::from_slice(&v.json)
                .map_err(|e| ProviderError::State(format!("invalid JSON value: {e}")))?;
            Ok(DynamicValue::from_json(json))
        }
        _ => Ok(DynamicValue::Null),
    }
}

/// Wrap an encoded value for the protocol
pub fn to_proto(value: &DynamicValue) -> Result<tfplugin6::DynamicValue> {
    Ok(tfplugin6::DynamicValue {
        msgpack: encode_dynamic_value(value)?,
        json: vec![],
    })
}

/// Create a DynamicValue map with the given attributes
pub fn make_state(attrs: Vec<(&str, DynamicValue)>) -> DynamicValue {
    DynamicValue::Map(
        attrs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

/// Create a string DynamicValue
pub fn string_value(s: impl Into<String>) -> DynamicValue {
    DynamicValue::String(s.into())
}

/// Create a number DynamicValue from i64
pub fn int_value(n: i64) -> DynamicValue {
    DynamicValue::Number(serde_json::Number::from(n))
}

/// Create a number DynamicValue from f64
pub fn float_value(n: f64) -> DynamicValue {
    serde_json::Number::from_f64(n)
        .map(DynamicValue::Number)
        .unwrap_or(DynamicValue::Null)
}

/// Create a bool DynamicValue
pub fn bool_value(b: bool) -> DynamicValue {
    DynamicValue::Bool(b)
}
