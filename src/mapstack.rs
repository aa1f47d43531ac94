//! Map-chain flattening.
//!
//! A definition shaped `map[string]map[string]...T` arrives as a chain of
//! object schemas linked through `additionalProperties`. The chain is walked
//! down to the first value that is not itself a map, that terminal is
//! resolved (promoting an anonymous object to a named model when needed), and
//! the `Map` wrappers are rebuilt bottom-up, one per level. The whole chain
//! resolves or none of it does.
//!
//! Two behaviors ride along on the way back up: when the terminal delegates
//! validation to a named type, every level is marked as having validations
//! (consumers must call into that type's validator), and an explicit
//! nullability override found on any level is pushed onto array elements
//! nested below, keeping mixed map/array nesting consistent.
//!
//! A single-level map takes the same path with an empty intermediate list;
//! the short circuit is structural, not behavioral.

use crate::error::{NodePath, Result};
use crate::resolved::{ResolvedType, TypeShape};
use crate::resolver::nullable::{self, Position};
use crate::resolver::ResolveCtx;
use crate::schema::{Kind, Policy, SchemaNode};
use crate::synth::{Model, Synthesizer};
use crate::validation;

pub struct Flattened {
    /// The full chain resolution for the root node (unaliased).
    pub resolved: ResolvedType,
    /// The root's direct additional-properties child, with deeper levels
    /// nested inside it.
    pub child: Model,
}

/// The value schema of a chain link: `Some` only for an object with no
/// other shape whose extra values are themselves schema-constrained.
fn map_level_value(node: &SchemaNode) -> Option<&SchemaNode> {
    if node.reference.is_none()
        && node.all_of.is_empty()
        && !node.has_properties()
        && node.effective_kind() == Kind::Object
    {
        node.additional_properties.as_ref().and_then(Policy::schema)
    } else {
        None
    }
}

/// Flattens the chain rooted at `node`; the caller has verified the root is
/// a map level, so the chain is never empty and the terminal always exists.
/// `hint` is the naming context for a promoted terminal.
pub fn flatten(
    synth: &mut Synthesizer<'_>,
    hint: &str,
    node: &SchemaNode,
    ctx: &ResolveCtx,
) -> Result<Flattened> {
    // walk down: collect the map levels, outermost first; stop at the first
    // value that is not itself a map
    let mut chain: Vec<&SchemaNode> = Vec::new();
    let mut cursor = node;
    let terminal = loop {
        match map_level_value(cursor) {
            Some(value) => {
                chain.push(cursor);
                cursor = value;
            }
            None => break cursor,
        }
    };

    // an explicit override anywhere on the chain governs nested elements;
    // the outermost one wins, conflicts on a single node still fail
    let mut override_ = None;
    let mut value_paths: Vec<NodePath> = Vec::with_capacity(chain.len());
    let mut path = ctx.path.clone();
    for level in &chain {
        if override_.is_none() {
            override_ = nullable::explicit_override(level, &path)?;
        }
        path = path.child("additionalProperties");
        value_paths.push(path.clone());
    }

    // terminal context sits one map-value position per level deep
    let mut tctx = ctx.clone();
    for _ in &chain {
        tctx = tctx.nested(Position::MapValue, false, "additionalProperties");
    }

    let terminal_model =
        synth.build("additionalProperties", &format!("{hint}Anon"), terminal, &tctx)?;
    let lift = terminal_model.resolved.delegates_validation();

    // rebuild bottom-up: one Map wrapper per level
    let mut rt = terminal_model.resolved.clone();
    let mut child = terminal_model;
    if lift {
        child.validations.has_validations = true;
    }
    for i in (1..chain.len()).rev() {
        rt = ResolvedType::map_of(rt);
        let mut level_model = Model::shell("additionalProperties", &value_paths[i - 1], rt.clone());
        level_model.validations = validation::summarize(chain[i], false);
        level_model.validations.has_validations |= lift || child.validations.has_validations;
        level_model.additional_properties = Some(Box::new(child));
        child = level_model;
    }

    let mut resolved = ResolvedType::map_of(rt);
    resolved.nullable = nullable::decide(node, ctx.position, ctx.required, &ctx.path)?;
    if let Some(forced) = override_ {
        push_element_override(&mut resolved, forced);
    }

    Ok(Flattened { resolved, child })
}

/// Forces the captured nullability override onto every array element nested
/// under the chain.
fn push_element_override(rt: &mut ResolvedType, forced: bool) {
    match &mut rt.shape {
        TypeShape::Map { value } => push_element_override(value, forced),
        TypeShape::Alias { underlying, .. } => push_element_override(underlying, forced),
        TypeShape::Array { elem, .. } => {
            elem.nullable = forced;
            push_element_override(elem, forced);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::nullable::Position;
    use crate::schema::Document;
    use crate::synth::Options;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Document {
        serde_json::from_value(v).unwrap()
    }

    fn flatten_def(d: &Document, name: &str, options: &Options) -> Flattened {
        let mut synth = Synthesizer::new(d, options).unwrap();
        let node = d.definition(name).unwrap();
        let ctx = ResolveCtx::standalone(name);
        flatten(&mut synth, name, node, &ctx).unwrap()
    }

    #[test]
    fn three_levels_rebuild_one_wrapper_each() {
        let d = doc(json!({
            "definitions": {
                "Deep": {
                    "type": "object",
                    "additionalProperties": {
                        "type": "object",
                        "additionalProperties": {
                            "type": "object",
                            "additionalProperties": { "type": "integer", "format": "int32" }
                        }
                    }
                }
            }
        }));
        let options = Options::default();
        let flat = flatten_def(&d, "Deep", &options);
        assert_eq!(flat.resolved.target, "map[string]map[string]map[string]int32");

        // the terminal equals resolving the innermost primitive on its own
        let mut synth = Synthesizer::new(&d, &options).unwrap();
        let inner: crate::schema::SchemaNode =
            serde_json::from_value(json!({ "type": "integer", "format": "int32" })).unwrap();
        let ctx = ResolveCtx::standalone("Deep")
            .nested(Position::MapValue, false, "additionalProperties")
            .nested(Position::MapValue, false, "additionalProperties")
            .nested(Position::MapValue, false, "additionalProperties");
        let manual = synth.resolver().resolve(&inner, &ctx).unwrap();

        let mut cursor = &flat.child;
        let mut depth = 1;
        while let Some(next) = cursor.additional_properties.as_deref() {
            cursor = next;
            depth += 1;
        }
        assert_eq!(depth, 3);
        assert_eq!(cursor.resolved, manual);
    }

    #[test]
    fn anonymous_terminal_is_promoted() {
        let d = doc(json!({
            "definitions": {
                "Index": {
                    "type": "object",
                    "additionalProperties": {
                        "type": "object",
                        "additionalProperties": {
                            "type": "object",
                            "properties": { "score": { "type": "number" } }
                        }
                    }
                }
            }
        }));
        let options = Options::default();
        let mut synth = Synthesizer::new(&d, &options).unwrap();
        let node = d.definition("Index").unwrap();
        let ctx = ResolveCtx::standalone("Index");
        let flat = flatten(&mut synth, "Index", node, &ctx).unwrap();

        assert_eq!(flat.resolved.target, "map[string]map[string]IndexAnon");
        let discovered = synth.take_discovered();
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].name, "IndexAnon");
        assert_eq!(discovered[0].properties[0].name, "score");

        // delegated validation is lifted through every level
        assert!(flat.child.validations.has_validations);
        assert!(
            flat.child
                .additional_properties
                .as_ref()
                .unwrap()
                .validations
                .has_validations
        );
    }

    #[test]
    fn reference_terminal_lifts_validations() {
        let d = doc(json!({
            "definitions": {
                "Name": { "type": "string", "minLength": 1 },
                "Names": {
                    "type": "object",
                    "additionalProperties": { "$ref": "#/definitions/Name" }
                }
            }
        }));
        let flat = flatten_def(&d, "Names", &Options::default());
        assert_eq!(flat.resolved.target, "map[string]Name");
        assert!(flat.child.validations.has_validations);
    }

    #[test]
    fn open_tail_degrades_to_interface_values() {
        let d = doc(json!({
            "definitions": {
                "Loose": {
                    "type": "object",
                    "additionalProperties": {
                        "type": "object",
                        "additionalProperties": true
                    }
                }
            }
        }));
        let flat = flatten_def(&d, "Loose", &Options::default());
        assert_eq!(flat.resolved.target, "map[string]interface{}");
        assert!(matches!(flat.child.resolved.shape, TypeShape::Interface));
    }

    #[test]
    fn chain_override_reaches_array_elements() {
        let d = doc(json!({
            "definitions": {
                "Buckets": {
                    "type": "object",
                    "x-nullable": true,
                    "additionalProperties": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                }
            }
        }));
        let flat = flatten_def(&d, "Buckets", &Options::default());
        assert!(flat.resolved.nullable);
        match &flat.resolved.shape {
            TypeShape::Map { value } => match &value.shape {
                TypeShape::Array { elem, .. } => assert!(elem.nullable),
                other => panic!("expected array values, got {other:?}"),
            },
            other => panic!("expected map, got {other:?}"),
        }
    }
}
