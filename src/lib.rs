//! Schema type resolution and model synthesis.
//!
//! Walks a reference-resolved schema document (named definitions, properties,
//! `allOf` composition, validation keywords) and synthesizes one [`Model`]
//! per named type: its resolved target type, nullability, validation summary,
//! children, and discriminator role. Anonymous inline objects are promoted to
//! named models along the way. The output is plain serializable data for a
//! downstream code emitter; this crate performs no I/O of its own outside the
//! `dump` CLI.
//!
//! ```no_run
//! use typesynth::{schema::Document, synth};
//!
//! # fn main() -> Result<(), typesynth::ResolveError> {
//! let document: Document = serde_json::from_value(serde_json::json!({
//!     "definitions": {
//!         "Item": {
//!             "type": "object",
//!             "properties": { "id": { "type": "integer" } },
//!             "required": ["id"]
//!         }
//!     }
//! })).unwrap();
//!
//! let models = synth::synthesize_document(&document, &synth::Options::default())?;
//! assert_eq!(models[0].name, "Item");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod discriminator;
pub mod error;
pub mod format;
pub mod mapstack;
pub mod naming;
pub mod resolved;
pub mod resolver;
pub mod schema;
pub mod synth;
pub mod validation;

pub use error::{NodePath, ResolveError};
pub use resolved::{ResolvedType, SourceType, TypeShape};
pub use synth::{synthesize, synthesize_document, Model, Options, Property};
