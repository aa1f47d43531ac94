//! Type resolution.
//!
//! Classifies one schema node into a [`ResolvedType`]: reference, scalar
//! (with format table lookup), array/tuple, object/map, or interface
//! fallback. Anonymous inline objects come back as `AnonymousObject` with an
//! empty name; the synthesis driver promotes them to named models and fills
//! the name in. Resolution fails only on contradictory input — a dangling
//! reference, a format registered for a different primitive family, or
//! nesting past the depth cap. Everything else degrades to `Interface`.

pub mod nullable;

use crate::error::{NodePath, ResolveError, Result};
use crate::format::FormatRegistry;
use crate::naming::Namer;
use crate::resolved::{ResolvedType, SourceType, TypeShape};
use crate::schema::{Document, Items, Kind, Policy, SchemaNode};

use nullable::Position;

pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Positional context threaded through the recursion.
#[derive(Debug, Clone)]
pub struct ResolveCtx {
    pub position: Position,
    pub required: bool,
    /// Set only when resolving the body of a named definition; drives
    /// aliasing and self-naming.
    pub model_name: Option<String>,
    pub path: NodePath,
    pub depth: usize,
}

impl ResolveCtx {
    pub fn standalone(name: &str) -> Self {
        ResolveCtx {
            position: Position::Standalone,
            required: false,
            model_name: Some(name.to_string()),
            path: NodePath::root(name),
            depth: 0,
        }
    }

    /// Context for an unnamed body at the root of a path; used for promoted
    /// anonymous models and by tests.
    pub fn anonymous(path: NodePath) -> Self {
        ResolveCtx {
            position: Position::Standalone,
            required: false,
            model_name: None,
            path,
            depth: 0,
        }
    }

    pub fn nested(&self, position: Position, required: bool, segment: impl Into<String>) -> Self {
        ResolveCtx {
            position,
            required,
            model_name: None,
            path: self.path.child(segment),
            depth: self.depth + 1,
        }
    }

    /// Keeps the path/depth but renames the body; used when a promoted
    /// model re-resolves under its synthesized name.
    pub fn named(&self, name: &str) -> Self {
        ResolveCtx {
            position: Position::Standalone,
            required: false,
            model_name: Some(name.to_string()),
            path: self.path.clone(),
            depth: self.depth,
        }
    }
}

pub struct TypeResolver<'a> {
    pub doc: &'a Document,
    pub formats: &'a FormatRegistry,
    pub namer: &'a dyn Namer,
    pub max_depth: usize,
}

impl<'a> TypeResolver<'a> {
    pub fn new(doc: &'a Document, formats: &'a FormatRegistry, namer: &'a dyn Namer) -> Self {
        TypeResolver { doc, formats, namer, max_depth: DEFAULT_MAX_DEPTH }
    }

    pub fn resolve(&self, node: &SchemaNode, ctx: &ResolveCtx) -> Result<ResolvedType> {
        if ctx.depth > self.max_depth {
            return Err(ResolveError::TooDeeplyNested {
                limit: self.max_depth,
                path: ctx.path.clone(),
            });
        }
        if node.reference.is_some() {
            return self.resolve_reference(node, ctx);
        }
        match node.effective_kind() {
            Kind::File => Ok(self.alias_if_named(self.stream(node, Kind::File), ctx)),
            Kind::Null => Ok(self.alias_if_named(ResolvedType::interface(), ctx)),
            kind @ (Kind::String | Kind::Integer | Kind::Number | Kind::Boolean) => {
                self.resolve_scalar(node, kind, ctx)
            }
            Kind::Array => self.resolve_array(node, ctx),
            Kind::Object => self.resolve_object(node, ctx),
        }
    }

    /// Looks the target definition up and classifies the reference. The
    /// nullability decision treats the referenced body as if it were inlined
    /// at this position, without recursing into it (ref cycles stay safe).
    fn resolve_reference(&self, node: &SchemaNode, ctx: &ResolveCtx) -> Result<ResolvedType> {
        let raw = node.reference_name().unwrap_or_default();
        let target = self.doc.definition(raw).ok_or_else(|| {
            ResolveError::UnresolvableReference {
                reference: node.reference.clone().unwrap_or_default(),
                path: ctx.path.clone(),
            }
        })?;

        let base = target.discriminator.is_some();
        let nullable = if base {
            // base references render as interfaces; nil already means absent
            false
        } else {
            nullable::decide(target, ctx.position, ctx.required, &ctx.path)?
        };
        let name = self.namer.type_name(raw);
        Ok(ResolvedType {
            target: name.clone(),
            source: SourceType {
                kind: target.effective_kind(),
                format: target.format.clone(),
            },
            nullable,
            shape: TypeShape::NamedObject { name, base },
        })
    }

    fn stream(&self, node: &SchemaNode, kind: Kind) -> ResolvedType {
        let target = self
            .formats
            .format("binary")
            .map(|e| e.target.clone())
            .unwrap_or_else(|| "io.ReadCloser".to_string());
        ResolvedType {
            target,
            source: SourceType { kind, format: node.format.clone() },
            nullable: false,
            shape: TypeShape::Stream,
        }
    }

    fn resolve_scalar(
        &self,
        node: &SchemaNode,
        kind: Kind,
        ctx: &ResolveCtx,
    ) -> Result<ResolvedType> {
        let nullable = nullable::decide(node, ctx.position, ctx.required, &ctx.path)?;

        if let Some(raw) = node.format.as_deref() {
            if let Some(entry) = self.formats.format(raw) {
                let compatible = entry.kind == kind
                    || (entry.kind.is_numeric() && kind.is_numeric());
                if !compatible {
                    return Err(ResolveError::InvalidConstraintCombination {
                        kind: kind.as_str().to_string(),
                        format: raw.to_string(),
                        path: ctx.path.clone(),
                    });
                }
                if entry.stream {
                    return Ok(self.alias_if_named(self.stream(node, kind), ctx));
                }
                let rt = ResolvedType {
                    target: entry.target.clone(),
                    source: SourceType { kind, format: node.format.clone() },
                    nullable,
                    shape: TypeShape::Primitive { custom_format: entry.custom },
                };
                return Ok(self.alias_if_named(rt, ctx));
            }
            // unknown format: keep it in the source pair, use the bare
            // primitive representation
        }

        let target = self
            .formats
            .primitive(kind)
            .map(|e| e.target.clone())
            .unwrap_or_else(|| kind.as_str().to_string());
        let rt = ResolvedType {
            target,
            source: SourceType { kind, format: node.format.clone() },
            nullable,
            shape: TypeShape::Primitive { custom_format: false },
        };
        Ok(self.alias_if_named(rt, ctx))
    }

    fn resolve_array(&self, node: &SchemaNode, ctx: &ResolveCtx) -> Result<ResolvedType> {
        if let Some(Items::Tuple(slots)) = &node.items {
            return self.resolve_tuple(node, slots, ctx);
        }

        let elem = match &node.items {
            Some(Items::One(s)) => {
                self.resolve(s, &ctx.nested(Position::ArrayElement, false, "items"))?
            }
            // no element schema: array of anything
            _ => ResolvedType::interface(),
        };
        let fixed_size = node.min_items.is_some() && node.min_items == node.max_items;
        let mut rt = ResolvedType::array_of(elem, fixed_size);
        rt.nullable = nullable::decide(node, ctx.position, ctx.required, &ctx.path)?;
        Ok(self.alias_if_named(rt, ctx))
    }

    fn resolve_tuple(
        &self,
        node: &SchemaNode,
        slots: &[SchemaNode],
        ctx: &ResolveCtx,
    ) -> Result<ResolvedType> {
        let mut resolved = Vec::with_capacity(slots.len());
        for (i, slot) in slots.iter().enumerate() {
            resolved.push(self.resolve(slot, &ctx.nested(Position::TupleSlot, true, i.to_string()))?);
        }
        let tail = match &node.additional_items {
            Some(Policy::Schema(s)) => Some(Box::new(self.resolve(
                s,
                &ctx.nested(Position::AdditionalItem, false, "additionalItems"),
            )?)),
            Some(Policy::Allow(true)) => Some(Box::new(ResolvedType::interface())),
            Some(Policy::Allow(false)) | None => None,
        };

        // tuples render as structs; anonymous ones get their target filled
        // in at promotion time
        let target = ctx
            .model_name
            .as_deref()
            .map(|n| self.namer.type_name(n))
            .unwrap_or_default();
        Ok(ResolvedType {
            target,
            source: SourceType { kind: Kind::Array, format: None },
            nullable: nullable::decide(node, ctx.position, ctx.required, &ctx.path)?,
            shape: TypeShape::Tuple { slots: resolved, tail },
        })
    }

    fn resolve_object(&self, node: &SchemaNode, ctx: &ResolveCtx) -> Result<ResolvedType> {
        if !node.all_of.is_empty() {
            // composed object; the synthesis driver walks the members
            let name = ctx
                .model_name
                .as_deref()
                .map(|n| self.namer.type_name(n))
                .unwrap_or_default();
            return Ok(ResolvedType {
                target: name.clone(),
                source: SourceType { kind: Kind::Object, format: None },
                nullable: false,
                shape: TypeShape::NamedObject { name, base: node.discriminator.is_some() },
            });
        }

        if node.has_properties() {
            let nullable = nullable::decide(node, ctx.position, ctx.required, &ctx.path)?;
            return Ok(match ctx.model_name.as_deref() {
                Some(raw) => {
                    let name = self.namer.type_name(raw);
                    ResolvedType {
                        target: name.clone(),
                        source: SourceType { kind: Kind::Object, format: None },
                        nullable,
                        shape: TypeShape::NamedObject {
                            name,
                            base: node.discriminator.is_some(),
                        },
                    }
                }
                None => ResolvedType {
                    target: String::new(),
                    source: SourceType { kind: Kind::Object, format: None },
                    nullable,
                    shape: TypeShape::AnonymousObject { name: String::new() },
                },
            });
        }

        match &node.additional_properties {
            Some(Policy::Schema(s)) => {
                let value =
                    self.resolve(s, &ctx.nested(Position::MapValue, false, "additionalProperties"))?;
                let mut rt = ResolvedType::map_of(value);
                rt.nullable = nullable::decide(node, ctx.position, ctx.required, &ctx.path)?;
                Ok(self.alias_if_named(rt, ctx))
            }
            // no declared shape at all: accepts anything
            _ => Ok(self.alias_if_named(ResolvedType::interface(), ctx)),
        }
    }

    /// Wraps the resolution of a named definition whose body is not an
    /// object: the name becomes a distinct type over the underlying
    /// representation.
    fn alias_if_named(&self, rt: ResolvedType, ctx: &ResolveCtx) -> ResolvedType {
        let aliasable = matches!(
            rt.shape,
            TypeShape::Primitive { .. }
                | TypeShape::Array { .. }
                | TypeShape::Map { .. }
                | TypeShape::Interface
                | TypeShape::Stream
        );
        match ctx.model_name.as_deref() {
            Some(raw) if ctx.position == Position::Standalone && aliasable => {
                let name = self.namer.type_name(raw);
                ResolvedType {
                    target: name.clone(),
                    source: rt.source.clone(),
                    nullable: rt.nullable,
                    shape: TypeShape::Alias { name, underlying: Box::new(rt) },
                }
            }
            _ => rt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::DefaultNamer;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Document {
        serde_json::from_value(v).unwrap()
    }

    fn node(v: serde_json::Value) -> SchemaNode {
        serde_json::from_value(v).unwrap()
    }

    fn resolve_one(doc: &Document, node: &SchemaNode, ctx: &ResolveCtx) -> Result<ResolvedType> {
        let formats = FormatRegistry::default();
        let namer = DefaultNamer;
        let resolver = TypeResolver::new(doc, &formats, &namer);
        resolver.resolve(node, ctx)
    }

    fn field_ctx() -> ResolveCtx {
        ResolveCtx::anonymous(NodePath::root("T")).nested(Position::Field, false, "p")
    }

    #[test]
    fn scalar_mapping() {
        let empty = Document::default();
        let rt = resolve_one(&empty, &node(json!({ "type": "integer" })), &field_ctx()).unwrap();
        assert_eq!(rt.target, "int64");
        assert!(matches!(rt.shape, TypeShape::Primitive { custom_format: false }));
        assert!(rt.nullable); // optional field

        let rt = resolve_one(
            &empty,
            &node(json!({ "type": "string", "format": "uuid" })),
            &field_ctx(),
        )
        .unwrap();
        assert_eq!(rt.target, "strfmt.UUID");
        assert!(matches!(rt.shape, TypeShape::Primitive { custom_format: true }));
    }

    #[test]
    fn format_for_wrong_kind_fails() {
        let empty = Document::default();
        let err = resolve_one(
            &empty,
            &node(json!({ "type": "integer", "format": "uuid" })),
            &field_ctx(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConstraintCombination { .. }));

        // integer/number families are interchangeable
        let ok = resolve_one(
            &empty,
            &node(json!({ "type": "number", "format": "int64" })),
            &field_ctx(),
        )
        .unwrap();
        assert_eq!(ok.target, "int64");
    }

    #[test]
    fn unknown_format_degrades_to_primitive() {
        let empty = Document::default();
        let rt = resolve_one(
            &empty,
            &node(json!({ "type": "string", "format": "no-such" })),
            &field_ctx(),
        )
        .unwrap();
        assert_eq!(rt.target, "string");
        assert_eq!(rt.source.format.as_deref(), Some("no-such"));
    }

    #[test]
    fn untyped_and_shapeless_objects_become_interface() {
        let empty = Document::default();
        for case in [
            json!({}),
            json!({ "type": "object" }),
            json!({ "type": "object", "additionalProperties": true }),
            json!({ "type": "object", "additionalProperties": false }),
            json!({ "type": "null" }),
        ] {
            let rt = resolve_one(&empty, &node(case.clone()), &field_ctx()).unwrap();
            assert!(
                matches!(rt.shape, TypeShape::Interface),
                "expected interface for {case}"
            );
            assert_eq!(rt.target, crate::resolved::ANY);
        }
    }

    #[test]
    fn binary_and_file_are_streams() {
        let empty = Document::default();
        for case in [
            json!({ "type": "file" }),
            json!({ "type": "string", "format": "binary" }),
        ] {
            let rt = resolve_one(&empty, &node(case), &field_ctx()).unwrap();
            assert!(matches!(rt.shape, TypeShape::Stream));
            assert_eq!(rt.target, "io.ReadCloser");
            assert!(!rt.nullable);
        }
    }

    #[test]
    fn array_of_strings_in_field_position() {
        let empty = Document::default();
        let rt = resolve_one(
            &empty,
            &node(json!({ "type": "array", "items": { "type": "string" } })),
            &field_ctx(),
        )
        .unwrap();
        assert_eq!(rt.target, "[]string");
        assert!(rt.nullable);
        match rt.shape {
            TypeShape::Array { elem, fixed_size } => {
                assert!(!fixed_size);
                assert!(!elem.nullable);
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn pinned_item_count_marks_fixed_size() {
        let empty = Document::default();
        let rt = resolve_one(
            &empty,
            &node(json!({
                "type": "array",
                "items": { "type": "integer" },
                "minItems": 3,
                "maxItems": 3
            })),
            &field_ctx(),
        )
        .unwrap();
        assert!(matches!(rt.shape, TypeShape::Array { fixed_size: true, .. }));
    }

    #[test]
    fn tuple_with_open_tail() {
        let empty = Document::default();
        let rt = resolve_one(
            &empty,
            &node(json!({
                "type": "array",
                "items": [{ "type": "integer" }, { "type": "string" }],
                "additionalItems": true
            })),
            &ResolveCtx::standalone("Pair"),
        )
        .unwrap();
        match rt.shape {
            TypeShape::Tuple { slots, tail } => {
                assert_eq!(slots.len(), 2);
                assert_eq!(slots[0].target, "int64");
                assert!(matches!(tail.unwrap().shape, TypeShape::Interface));
            }
            other => panic!("expected tuple, got {other:?}"),
        }
        assert_eq!(rt.target, "Pair");
    }

    #[test]
    fn references_resolve_against_definitions() {
        let d = doc(json!({
            "definitions": {
                "Pet": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } }
                }
            }
        }));
        let rt = resolve_one(&d, &node(json!({ "$ref": "#/definitions/Pet" })), &field_ctx())
            .unwrap();
        assert_eq!(rt.target, "Pet");
        assert!(rt.nullable); // optional field position
        assert!(matches!(rt.shape, TypeShape::NamedObject { base: false, .. }));

        let err = resolve_one(&d, &node(json!({ "$ref": "#/definitions/Ghost" })), &field_ctx())
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvableReference { .. }));
    }

    #[test]
    fn base_references_are_never_nullable() {
        let d = doc(json!({
            "definitions": {
                "Animal": {
                    "type": "object",
                    "discriminator": "kind",
                    "properties": { "name": { "type": "string" } }
                }
            }
        }));
        let rt = resolve_one(&d, &node(json!({ "$ref": "#/definitions/Animal" })), &field_ctx())
            .unwrap();
        assert!(matches!(rt.shape, TypeShape::NamedObject { base: true, .. }));
        assert!(!rt.nullable);
    }

    #[test]
    fn named_primitive_definitions_alias() {
        let empty = Document::default();
        let body = node(json!({ "type": "string", "format": "date" }));
        let rt = resolve_one(&empty, &body, &ResolveCtx::standalone("birth-date")).unwrap();
        assert_eq!(rt.target, "BirthDate");
        assert!(rt.is_aliased());

        // the recorded underlying equals the anonymous resolution of the body
        let anon =
            resolve_one(&empty, &body, &ResolveCtx::anonymous(NodePath::root("x"))).unwrap();
        assert!(!anon.is_aliased());
        assert_eq!(rt.underlying(), &anon);
    }

    #[test]
    fn named_stream_and_untyped_definitions_alias() {
        let empty = Document::default();
        let raw = resolve_one(
            &empty,
            &node(json!({ "type": "string", "format": "binary" })),
            &ResolveCtx::standalone("Raw"),
        )
        .unwrap();
        assert_eq!(raw.target, "Raw");
        assert!(raw.is_aliased());
        assert!(matches!(raw.underlying().shape, TypeShape::Stream));
        assert_eq!(raw.underlying().target, "io.ReadCloser");

        let upload = resolve_one(
            &empty,
            &node(json!({ "type": "file" })),
            &ResolveCtx::standalone("Upload"),
        )
        .unwrap();
        assert_eq!(upload.target, "Upload");
        assert!(matches!(upload.underlying().shape, TypeShape::Stream));

        let nothing = resolve_one(
            &empty,
            &node(json!({ "type": "null" })),
            &ResolveCtx::standalone("Nothing"),
        )
        .unwrap();
        assert_eq!(nothing.target, "Nothing");
        assert!(matches!(nothing.underlying().shape, TypeShape::Interface));
    }

    #[test]
    fn named_map_definitions_alias() {
        let empty = Document::default();
        let rt = resolve_one(
            &empty,
            &node(json!({
                "type": "object",
                "additionalProperties": { "type": "integer" }
            })),
            &ResolveCtx::standalone("Counters"),
        )
        .unwrap();
        assert_eq!(rt.target, "Counters");
        match &rt.underlying().shape {
            TypeShape::Map { value } => assert_eq!(value.target, "int64"),
            other => panic!("expected map, got {other:?}"),
        }
        assert_eq!(rt.underlying().target, "map[string]int64");
    }

    #[test]
    fn nesting_past_the_cap_fails() {
        // built programmatically: a JSON fixture this deep would overflow
        // the deserializer before the guard ever runs
        let mut deep = SchemaNode { kind: Some(Kind::String), ..SchemaNode::default() };
        for _ in 0..(DEFAULT_MAX_DEPTH + 2) {
            deep = SchemaNode {
                kind: Some(Kind::Array),
                items: Some(Items::One(Box::new(deep))),
                ..SchemaNode::default()
            };
        }
        let empty = Document::default();
        let err = resolve_one(&empty, &deep, &field_ctx()).unwrap_err();
        assert!(matches!(err, ResolveError::TooDeeplyNested { .. }));
    }

    #[test]
    fn anonymous_objects_wait_for_promotion() {
        let empty = Document::default();
        let rt = resolve_one(
            &empty,
            &node(json!({
                "type": "object",
                "properties": { "x": { "type": "integer" } }
            })),
            &field_ctx(),
        )
        .unwrap();
        assert!(matches!(rt.shape, TypeShape::AnonymousObject { ref name } if name.is_empty()));
        assert!(rt.nullable);
    }
}
