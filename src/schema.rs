//! Read-only input graph.
//!
//! The engine receives a schema document that has already been parsed and
//! reference-resolved upstream: a flat table of named definitions plus the
//! node tree under each one. Nothing in this crate ever mutates these values;
//! `$ref` strings are only looked up against [`Document::definitions`].
//!
//! All name→node maps are insertion-ordered (`IndexMap`) because synthesized
//! output must follow document order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub definitions: IndexMap<String, SchemaNode>,
}

impl Document {
    pub fn definition(&self, name: &str) -> Option<&SchemaNode> {
        self.definitions.get(name)
    }
}

/// Primitive/structural kind hint. Absent kind means "untyped" and is treated
/// as `object` downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    File,
    Null,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Integer => "integer",
            Kind::Boolean => "boolean",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::File => "file",
            Kind::Null => "null",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Number | Kind::Integer)
    }
}

/// `items`: either one schema for every element, or a fixed slot list (tuple).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    One(Box<SchemaNode>),
    Tuple(Vec<SchemaNode>),
}

/// Policy for keys/elements beyond the declared ones:
/// `false` = disallowed, `true` = anything goes, schema = constrained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Policy {
    Allow(bool),
    Schema(Box<SchemaNode>),
}

impl Policy {
    /// True when extra members are permitted at all.
    pub fn wants(&self) -> bool {
        matches!(self, Policy::Allow(true) | Policy::Schema(_))
    }

    pub fn schema(&self) -> Option<&SchemaNode> {
        match self {
            Policy::Schema(s) => Some(s),
            Policy::Allow(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaNode {
    /// Reference to a named definition (`#/definitions/Name` or bare name).
    #[serde(rename = "$ref")]
    pub reference: Option<String>,

    #[serde(rename = "type")]
    pub kind: Option<Kind>,
    pub format: Option<String>,

    pub title: Option<String>,
    pub description: Option<String>,

    pub properties: IndexMap<String, SchemaNode>,
    pub required: Vec<String>,
    pub all_of: Vec<SchemaNode>,
    pub items: Option<Items>,
    pub additional_items: Option<Policy>,
    pub additional_properties: Option<Policy>,

    /// Discriminator field name; only meaningful on base-type definitions.
    pub discriminator: Option<String>,

    pub default: Option<Value>,
    pub read_only: bool,

    // validation keywords
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

    // extension flags
    #[serde(rename = "x-nullable")]
    pub x_nullable: Option<bool>,
    #[serde(rename = "x-isnullable")]
    pub x_is_nullable: Option<bool>,
    #[serde(rename = "x-omitempty")]
    pub x_omit_empty: Option<bool>,
}

impl SchemaNode {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    /// The structural kind used for dispatch; untyped nodes count as objects.
    pub fn effective_kind(&self) -> Kind {
        self.kind.unwrap_or(Kind::Object)
    }

    /// Strips the definitions prefix from a reference string, if present.
    pub fn reference_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .map(|r| r.strip_prefix(DEFINITIONS_PREFIX).unwrap_or(r))
    }
}
