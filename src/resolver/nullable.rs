//! Nullability precedence.
//!
//! "Nullable" means absence must be representable distinctly from the zero
//! value. The rules, in order:
//!   1. an explicit extension override wins (conflicting overrides are an
//!      error, never a silent pick);
//!   2. read-only with a default is guaranteed a value, so not nullable;
//!   3. required without a default is guaranteed present, so not nullable;
//!   4. any default gives absence a representation, so not nullable;
//!   5. otherwise the node's position decides.

use crate::error::{NodePath, ResolveError, Result};
use crate::schema::SchemaNode;

/// Where a node sits relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// A named top-level definition body.
    Standalone,
    /// Declared property of an object.
    Field,
    ArrayElement,
    MapValue,
    TupleSlot,
    AdditionalItem,
}

/// Reads the explicit extension pair. `Ok(None)` when neither is present;
/// an error when the two disagree.
pub fn explicit_override(node: &SchemaNode, path: &NodePath) -> Result<Option<bool>> {
    match (node.x_nullable, node.x_is_nullable) {
        (Some(a), Some(b)) if a != b => {
            Err(ResolveError::AmbiguousNullability { path: path.clone() })
        }
        (Some(a), _) => Ok(Some(a)),
        (_, Some(b)) => Ok(Some(b)),
        (None, None) => Ok(None),
    }
}

/// Full precedence chain for one node.
pub fn decide(
    node: &SchemaNode,
    position: Position,
    required: bool,
    path: &NodePath,
) -> Result<bool> {
    if let Some(explicit) = explicit_override(node, path)? {
        return Ok(explicit);
    }
    if node.read_only && node.default.is_some() {
        return Ok(false);
    }
    if required && node.default.is_none() {
        return Ok(false);
    }
    if node.default.is_some() {
        return Ok(false);
    }
    Ok(match position {
        Position::Field => true,
        // container members carry no presence bit; only nested objects with
        // their own fields keep the distinction
        Position::ArrayElement
        | Position::MapValue
        | Position::TupleSlot
        | Position::AdditionalItem => node.has_properties(),
        Position::Standalone => false,
    })
}
