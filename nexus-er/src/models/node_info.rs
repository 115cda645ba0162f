//! Attribute snapshots attached to a comparison
//!
//! Imported records carry whatever fields the source happened to provide
//! (name, company, location, profile URL, ...). Snapshots are therefore an
//! open mapping from field name to a small closed set of scalar values
//! rather than a fixed schema.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute snapshot for one node: field name -> scalar value
pub type NodeInfo = BTreeMap<String, AttrValue>;

/// Scalar attribute value
///
/// Untagged so snapshots round-trip plain JSON objects from the import
/// pipeline ({"firstName": "Jon", "endorsements": 12, "verified": true}).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttrValue {
    /// Render the value as text, the way loosely-typed source data is
    /// compared: numbers and booleans stringify, text passes through.
    pub fn as_text_lossy(&self) -> String {
        match self {
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Number(n) => n.to_string(),
            AttrValue::Text(s) => s.clone(),
        }
    }
}

/// Fetch a field from a snapshot as text, if present
pub fn field_text(info: &NodeInfo, key: &str) -> Option<String> {
    info.get(key).map(AttrValue::as_text_lossy)
}
