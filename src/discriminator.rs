//! Discriminator analysis.
//!
//! Two closed passes over the definitions table, no recursion. Pass one
//! records every definition declaring a discriminator field as a base type.
//! Pass two scans `allOf` members: a definition composing a recorded base
//! becomes a subtype, its discriminator value is its own definition name,
//! and the base accumulates it as a child in document order.
//!
//! The discriminator field is injected by the downstream emitter; a base
//! that also declares it as an ordinary property is a collision and is
//! reported, never silently merged.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{NodePath, ResolveError, Result};
use crate::naming::Namer;
use crate::schema::Document;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtypeRef {
    /// Definition name of the subtype.
    pub name: String,
    /// Discriminator value selecting this subtype.
    pub value: String,
    /// Target-language identifier of the subtype.
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseInfo {
    pub field: String,
    pub target: String,
    /// Subtypes in document order.
    pub children: Vec<SubtypeRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtypeInfo {
    /// Definition name of the base.
    pub base: String,
    /// Field name inherited from the base.
    pub field: String,
    /// This subtype's own definition name.
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Discrimination {
    pub bases: IndexMap<String, BaseInfo>,
    pub subtypes: IndexMap<String, SubtypeInfo>,
}

pub fn analyze(doc: &Document, namer: &dyn Namer) -> Result<Discrimination> {
    let mut out = Discrimination::default();

    for (name, node) in &doc.definitions {
        if let Some(field) = &node.discriminator {
            if node.properties.contains_key(field) {
                return Err(ResolveError::DiscriminatorFieldCollision {
                    type_name: name.clone(),
                    field: field.clone(),
                    path: NodePath::root(name.clone()),
                });
            }
            out.bases.insert(
                name.clone(),
                BaseInfo {
                    field: field.clone(),
                    target: namer.type_name(name),
                    children: Vec::new(),
                },
            );
        }
    }

    for (name, node) in &doc.definitions {
        for member in &node.all_of {
            let Some(reference) = member.reference_name() else {
                continue;
            };
            // first composed base wins; a second one is ignored
            if out.subtypes.contains_key(name) {
                break;
            }
            if let Some(base) = out.bases.get_mut(reference) {
                base.children.push(SubtypeRef {
                    name: name.clone(),
                    value: name.clone(),
                    target: namer.type_name(name),
                });
                out.subtypes.insert(
                    name.clone(),
                    SubtypeInfo {
                        base: reference.to_string(),
                        field: base.field.clone(),
                        value: name.clone(),
                    },
                );
            }
        }
    }

    Ok(out)
}
