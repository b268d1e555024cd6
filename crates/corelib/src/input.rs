//! Decoding node records from loosely-typed input.
//!
//! Records arrive as JSON objects of the shape
//! `{"node": "name", "weight": 100, "status": "alive"}`, either alone or in an
//! array. Decoding only checks shape; name presence is enforced when the spec
//! is staged so every staging path reports the same error.

use serde_json::Value;

use crate::error::{Error, Result, ValidationError};
use crate::node::{NodeSpec, NodeStatus};

impl NodeSpec {
    /// Decode a single `{"node", "weight", "status"}` object.
    pub fn from_json(value: &Value) -> Result<NodeSpec> {
        let fields = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput(describe(value)))?;

        let node = match fields.get("node") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(other) => {
                return Err(Error::InvalidInput(format!(
                    "node name must be a string, got {}",
                    other
                )))
            }
        };

        let weight = match fields.get("weight") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(coerce_weight(raw)?),
        };

        let status = match fields.get("status") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.parse::<NodeStatus>()?),
            Some(other) => return Err(Error::UnknownStatus(other.to_string())),
        };

        Ok(NodeSpec {
            node,
            weight,
            status,
        })
    }

    /// Decode either one record object or an array of them.
    pub fn batch_from_json(value: &Value) -> Result<Vec<NodeSpec>> {
        match value {
            Value::Array(items) => items.iter().map(NodeSpec::from_json).collect(),
            Value::Object(_) => Ok(vec![NodeSpec::from_json(value)?]),
            other => Err(Error::InvalidInput(describe(other))),
        }
    }
}

fn coerce_weight(raw: &Value) -> Result<u32> {
    let invalid = || Error::from(ValidationError::InvalidWeight(raw.to_string()));
    match raw {
        Value::Number(n) => {
            if let Some(w) = n.as_u64() {
                u32::try_from(w).map_err(|_| invalid())
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f >= 0.0 && f <= f64::from(u32::MAX) => {
                        Ok(f.trunc() as u32)
                    }
                    _ => Err(invalid()),
                }
            }
        }
        Value::String(s) => s.trim().parse::<u32>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn describe(value: &Value) -> String {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("expected a node object or an array of them, got {}", kind)
}
