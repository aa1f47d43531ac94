//! Validation summaries.
//!
//! A summary copies the validation keywords off a node and computes two
//! aggregate flags: `has_validations` (any check at all applies, including
//! presence of the value itself) and `has_collection_validations` (checks
//! that apply to the container rather than its elements). Parents OR their
//! children's `has_validations` in during synthesis, so the flag is monotone
//! from the leaves up.

use serde::Serialize;
use serde_json::Value;

use crate::schema::SchemaNode;

/// Formats whose value space already pins down length and shape; length and
/// pattern keywords carry no extra information and are dropped.
const EXACT_FORMATS: &[&str] = &[
    "date", "datetime", "uuid", "uuid3", "uuid4", "uuid5", "byte", "duration",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Validations {
    pub required: bool,

    pub maximum: Option<f64>,
    pub exclusive_maximum: bool,
    pub minimum: Option<f64>,
    pub exclusive_minimum: bool,
    pub multiple_of: Option<f64>,

    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub pattern: Option<String>,

    pub max_items: Option<u64>,
    pub min_items: Option<u64>,
    pub unique_items: bool,

    #[serde(rename = "enum")]
    pub enum_: Vec<Value>,

    pub has_validations: bool,
    pub has_collection_validations: bool,
}

/// Builds the summary for one node. `required` is decided by the parent
/// (membership in its `required` list) and seeds `has_validations`.
pub fn summarize(node: &SchemaNode, required: bool) -> Validations {
    let mut v = Validations {
        required,
        maximum: node.maximum,
        exclusive_maximum: node.exclusive_maximum,
        minimum: node.minimum,
        exclusive_minimum: node.exclusive_minimum,
        multiple_of: node.multiple_of,
        max_length: node.max_length,
        min_length: node.min_length,
        pattern: node.pattern.clone(),
        max_items: node.max_items,
        min_items: node.min_items,
        unique_items: node.unique_items,
        enum_: node.enum_.clone(),
        ..Validations::default()
    };

    if let Some(format) = normalized_format(node) {
        if EXACT_FORMATS.contains(&format.as_str()) {
            v.max_length = None;
            v.min_length = None;
            v.pattern = None;
        }
    }

    v.has_collection_validations =
        v.unique_items || v.max_items.is_some() || v.min_items.is_some();

    v.has_validations = v.required
        || v.maximum.is_some()
        || v.minimum.is_some()
        || v.multiple_of.is_some()
        || v.max_length.is_some()
        || v.min_length.is_some()
        || v.pattern.is_some()
        || v.has_collection_validations
        || !v.enum_.is_empty();

    v
}

fn normalized_format(node: &SchemaNode) -> Option<String> {
    node.format.as_deref().map(|f| f.replace('-', "").to_ascii_lowercase())
}
