//! Byte-level codecs for stored documents.
//!
//! Instances are compact JSON. Template configurations decode as HOCON
//! (plain JSON parses as a HOCON subset, so either spelling of
//! `template.conf` loads through the same path) and encode as either
//! pretty JSON or HOCON text, chosen per run.

use hocon::{Hocon, HoconLoader};
use serde_json::{Map, Number, Value};

use crate::hocon_text;
use crate::StoreError;

/// Encode and decode one stored document format.
pub trait DocumentCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Value, StoreError>;
    fn encode(&self, document: &Value) -> Result<Vec<u8>, StoreError>;
}

/// JSON with a choice of compact or pretty output. Object keys serialize
/// in sorted order either way.
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Single-line output, no padding. The instance format.
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// Two-space indent with a trailing newline. The configuration format.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl DocumentCodec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Value, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn encode(&self, document: &Value) -> Result<Vec<u8>, StoreError> {
        if self.pretty {
            let mut bytes = serde_json::to_vec_pretty(document)?;
            bytes.push(b'\n');
            Ok(bytes)
        } else {
            Ok(serde_json::to_vec(document)?)
        }
    }
}

/// The `template.conf` format.
pub struct HoconCodec;

impl DocumentCodec for HoconCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Value, StoreError> {
        let text = std::str::from_utf8(bytes).map_err(|_| StoreError::NotUtf8)?;
        let root = HoconLoader::new().load_str(text)?.hocon()?;
        hocon_to_value(&root, "")
    }

    fn encode(&self, document: &Value) -> Result<Vec<u8>, StoreError> {
        Ok(hocon_text::render(document).into_bytes())
    }
}

/// Lower a parsed HOCON tree into a JSON value. Hash keys are emitted in
/// sorted order; `path` labels errors with the offending key.
fn hocon_to_value(node: &Hocon, path: &str) -> Result<Value, StoreError> {
    match node {
        Hocon::Null => Ok(Value::Null),
        Hocon::Boolean(flag) => Ok(Value::Bool(*flag)),
        Hocon::Integer(number) => Ok(Value::Number((*number).into())),
        Hocon::Real(number) => Number::from_f64(*number)
            .map(Value::Number)
            .ok_or(StoreError::UnrepresentableNumber { value: *number }),
        Hocon::String(text) => Ok(Value::String(text.clone())),
        Hocon::Array(items) => {
            let mut array = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                array.push(hocon_to_value(item, &format!("{path}[{index}]"))?);
            }
            Ok(Value::Array(array))
        }
        Hocon::Hash(fields) => {
            let mut entries: Vec<(&String, &Hocon)> = fields.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut object = Map::new();
            for (key, child) in entries {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                object.insert(key.clone(), hocon_to_value(child, &child_path)?);
            }
            Ok(Value::Object(object))
        }
        Hocon::BadValue(_) => Err(StoreError::UnresolvedValue {
            key: path.to_string(),
        }),
    }
}
