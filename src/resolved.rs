//! Resolved types.
//!
//! `ResolvedType` is the classification a schema node resolves to: the target
//! identifier, where it came from, whether absence must be representable, and
//! the structural shape. The shape is a tagged union so consumers match
//! exhaustively; adding a variant is a compile error everywhere it matters.

use serde::Serialize;

use crate::format::FormatRegistry;
use crate::schema::Kind;

/// Target identifier for values with no usable shape information.
pub const ANY: &str = "interface{}";

/// Kind/format pair the resolution was derived from, kept for emitters that
/// branch on the source rather than the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceType {
    pub kind: Kind,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedType {
    /// Composed target identifier, e.g. `[]map[string]strfmt.UUID`.
    pub target: String,
    pub source: SourceType,
    /// Absence must be representable distinctly from the zero value.
    pub nullable: bool,
    pub shape: TypeShape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeShape {
    /// Scalar. `custom_format` marks library types (emitters track imports).
    Primitive { custom_format: bool },
    /// Reference to a named definition. `base` marks discriminator bases,
    /// which render as interfaces and are never nullable.
    NamedObject { name: String, base: bool },
    /// Inline object promoted to a synthesized model; `name` is the
    /// synthesized model's name (empty until promotion assigns it).
    AnonymousObject { name: String },
    Array {
        elem: Box<ResolvedType>,
        /// `min_items == max_items`: length is pinned.
        fixed_size: bool,
    },
    Tuple {
        slots: Vec<ResolvedType>,
        /// Schema for elements past the declared slots, when permitted.
        tail: Option<Box<ResolvedType>>,
    },
    Map { value: Box<ResolvedType> },
    /// Named definition whose body is a non-object: the name wraps the
    /// underlying resolution.
    Alias {
        name: String,
        underlying: Box<ResolvedType>,
    },
    /// No usable shape information; accepts anything.
    Interface,
    /// Raw byte stream (file payloads, `format: binary`).
    Stream,
}

impl ResolvedType {
    pub fn interface() -> Self {
        ResolvedType {
            target: ANY.to_string(),
            source: SourceType { kind: Kind::Object, format: None },
            nullable: false,
            shape: TypeShape::Interface,
        }
    }

    /// Composes an array over an element resolution; the registry owns leaf
    /// identifiers, composition happens here.
    pub fn array_of(elem: ResolvedType, fixed_size: bool) -> Self {
        ResolvedType {
            target: format!("[]{}", elem.target),
            source: SourceType { kind: Kind::Array, format: None },
            nullable: false,
            shape: TypeShape::Array { elem: Box::new(elem), fixed_size },
        }
    }

    pub fn map_of(value: ResolvedType) -> Self {
        ResolvedType {
            target: format!("map[string]{}", value.target),
            source: SourceType { kind: Kind::Object, format: None },
            nullable: false,
            shape: TypeShape::Map { value: Box::new(value) },
        }
    }

    pub fn is_aliased(&self) -> bool {
        matches!(self.shape, TypeShape::Alias { .. })
    }

    /// Unwraps alias layers down to the real shape.
    pub fn underlying(&self) -> &ResolvedType {
        match &self.shape {
            TypeShape::Alias { underlying, .. } => underlying.underlying(),
            _ => self,
        }
    }

    /// True for resolutions an emitter checks with the target type's own
    /// validator rather than inline keyword checks.
    pub fn delegates_validation(&self) -> bool {
        matches!(
            self.shape,
            TypeShape::NamedObject { .. }
                | TypeShape::AnonymousObject { .. }
                | TypeShape::Alias { .. }
        )
    }

    /// Zero-value literal for this resolution in the target language.
    pub fn zero_value(&self, registry: &FormatRegistry) -> String {
        match &self.shape {
            TypeShape::Primitive { .. } => {
                let entry = self
                    .source
                    .format
                    .as_deref()
                    .and_then(|f| registry.format(f))
                    .or_else(|| registry.primitive(self.source.kind));
                match entry {
                    Some(e) => e.zero.clone(),
                    None => format!("{}{{}}", self.target),
                }
            }
            TypeShape::Interface | TypeShape::Stream => "nil".to_string(),
            TypeShape::Array { .. } | TypeShape::Map { .. } => {
                format!("make({}, 0, 50)", self.target)
            }
            TypeShape::NamedObject { .. }
            | TypeShape::AnonymousObject { .. }
            | TypeShape::Tuple { .. } => {
                if self.nullable {
                    format!("new({})", self.target)
                } else {
                    format!("{}{{}}", self.target)
                }
            }
            TypeShape::Alias { underlying, .. } => underlying.zero_value(registry),
        }
    }
}
