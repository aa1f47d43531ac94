//! Structured failures. Every error carries the node path where resolution
//! stopped; the caller decides whether to abort the run or skip the model.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Trail from a top-level definition down to the failing node:
/// property names, composition branches (`allOf[1]`), item positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodePath(Vec<String>);

impl NodePath {
    pub fn root(name: impl Into<String>) -> Self {
        NodePath(vec![name.into()])
    }

    /// Returns an extended copy. Paths are short, cloning is fine.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        NodePath(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("unresolvable reference `{reference}` at `{path}`")]
    UnresolvableReference { reference: String, path: NodePath },

    #[error("conflicting explicit nullability overrides at `{path}`")]
    AmbiguousNullability { path: NodePath },

    #[error("discriminator field `{field}` collides with a declared property of `{type_name}` at `{path}`")]
    DiscriminatorFieldCollision {
        type_name: String,
        field: String,
        path: NodePath,
    },

    #[error("format `{format}` is not valid for kind `{kind}` at `{path}`")]
    InvalidConstraintCombination {
        kind: String,
        format: String,
        path: NodePath,
    },

    #[error("schema nesting exceeds {limit} levels at `{path}`")]
    TooDeeplyNested { limit: usize, path: NodePath },
}

pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display_joins_segments() {
        let path = NodePath::root("Order").child("lines").child("0").child("sku");
        assert_eq!(path.to_string(), "Order.lines.0.sku");
    }

    #[test]
    fn child_does_not_mutate_parent() {
        let parent = NodePath::root("Pet");
        let _ = parent.child("tags");
        assert_eq!(parent.segments(), ["Pet"]);
    }
}
