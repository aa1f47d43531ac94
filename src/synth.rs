//! Model synthesis.
//!
//! The driver walks each named definition, invokes the resolver for the node
//! and every structural child, and assembles the per-type [`Model`] records a
//! code emitter consumes. Anonymous inline objects and tuples found along the
//! way are promoted to named models; promoted models accumulate in a
//! per-run `discovered` list so independent runs never share naming state.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::discriminator::{self, Discrimination, SubtypeRef};
use crate::error::{NodePath, ResolveError, Result};
use crate::format::FormatRegistry;
use crate::mapstack;
use crate::naming::{DefaultNamer, Namer};
use crate::resolved::{ResolvedType, SourceType, TypeShape};
use crate::resolver::nullable::{self, Position};
use crate::resolver::{ResolveCtx, TypeResolver, DEFAULT_MAX_DEPTH};
use crate::schema::{Document, Items, Kind, Policy, SchemaNode};
use crate::validation::{self, Validations};

/// Per-run configuration: the format table, the identifier policy and the
/// recursion cap. Injected, never global.
pub struct Options {
    pub formats: FormatRegistry,
    pub namer: Box<dyn Namer>,
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            formats: FormatRegistry::default(),
            namer: Box::new(DefaultNamer),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    /// Wire name.
    pub name: String,
    /// Target-language accessor identifier.
    pub accessor: String,
    pub required: bool,
    pub model: Model,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum DiscriminatorRole {
    #[default]
    None,
    Base {
        field: String,
        subtypes: Vec<SubtypeRef>,
    },
    Subtype {
        /// Target identifier of the base type.
        base: String,
        field: String,
        /// The value selecting this subtype: its own definition name.
        value: String,
    },
}

/// The synthesized record for one named or promoted type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    pub name: String,
    /// Access path from the root definition, for diagnostics.
    pub path: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub resolved: ResolvedType,
    pub validations: Validations,
    pub default: Option<Value>,
    pub read_only: bool,
    pub omit_empty: bool,
    pub properties: Vec<Property>,
    pub all_of: Vec<Model>,
    pub items: Option<Box<Model>>,
    pub additional_items: Option<Box<Model>>,
    pub additional_properties: Option<Box<Model>>,
    pub discriminator: DiscriminatorRole,
}

impl Model {
    pub(crate) fn shell(name: &str, path: &NodePath, resolved: ResolvedType) -> Model {
        Model {
            name: name.to_string(),
            path: path.to_string(),
            title: None,
            description: None,
            resolved,
            validations: Validations::default(),
            default: None,
            read_only: false,
            omit_empty: false,
            properties: Vec::new(),
            all_of: Vec::new(),
            items: None,
            additional_items: None,
            additional_properties: None,
            discriminator: DiscriminatorRole::None,
        }
    }
}

/// Synthesizes one named definition; returns its model plus the anonymous
/// models promoted while building it, sorted by name.
pub fn synthesize(doc: &Document, name: &str, options: &Options) -> Result<(Model, Vec<Model>)> {
    let mut synth = Synthesizer::new(doc, options)?;
    let model = synth.model(name)?;
    Ok((model, synth.take_discovered()))
}

/// Synthesizes every definition in document order, each followed by the
/// models it promoted.
pub fn synthesize_document(doc: &Document, options: &Options) -> Result<Vec<Model>> {
    let mut synth = Synthesizer::new(doc, options)?;
    let names: Vec<String> = doc.definitions.keys().cloned().collect();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        out.push(synth.model(&name)?);
        out.extend(synth.take_discovered());
    }
    Ok(out)
}

pub struct Synthesizer<'a> {
    doc: &'a Document,
    options: &'a Options,
    discrimination: Discrimination,
    used_names: BTreeSet<String>,
    discovered: Vec<Model>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(doc: &'a Document, options: &'a Options) -> Result<Self> {
        let discrimination = discriminator::analyze(doc, options.namer.as_ref())?;
        let used_names = doc
            .definitions
            .keys()
            .map(|k| options.namer.type_name(k))
            .collect();
        Ok(Synthesizer {
            doc,
            options,
            discrimination,
            used_names,
            discovered: Vec::new(),
        })
    }

    pub fn model(&mut self, name: &str) -> Result<Model> {
        let node = self.doc.definition(name).ok_or_else(|| {
            ResolveError::UnresolvableReference {
                reference: name.to_string(),
                path: NodePath::root(name),
            }
        })?;
        let ctx = ResolveCtx::standalone(name);
        let type_name = self.options.namer.type_name(name);
        let mut model = self.assemble(name, &type_name, node, &ctx)?;
        model.name = type_name;
        self.apply_discriminator(name, &mut model);
        Ok(model)
    }

    /// Drains the promoted-model accumulator, sorted by name.
    pub fn take_discovered(&mut self) -> Vec<Model> {
        let mut out = std::mem::take(&mut self.discovered);
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub(crate) fn resolver(&self) -> TypeResolver<'a> {
        TypeResolver {
            doc: self.doc,
            formats: &self.options.formats,
            namer: self.options.namer.as_ref(),
            max_depth: self.options.max_depth,
        }
    }

    /// Builds a child model, promoting anonymous objects and tuples to named
    /// models first. `hint` is the naming context (`{Parent}{Label}`).
    pub(crate) fn build(
        &mut self,
        label: &str,
        hint: &str,
        node: &SchemaNode,
        ctx: &ResolveCtx,
    ) -> Result<Model> {
        if ctx.model_name.is_none() && needs_promotion(node) {
            let (promoted, delegated) = self.promote(hint, node, ctx)?;
            let nullable = nullable::decide(node, ctx.position, ctx.required, &ctx.path)?;
            let resolved = ResolvedType {
                target: promoted.clone(),
                source: SourceType { kind: node.effective_kind(), format: None },
                nullable,
                shape: TypeShape::AnonymousObject { name: promoted },
            };
            let mut model = Model::shell(label, &ctx.path, resolved);
            model.title = node.title.clone();
            model.description = node.description.clone();
            model.default = node.default.clone();
            model.read_only = node.read_only;
            model.omit_empty = node.x_omit_empty.unwrap_or(false);
            model.validations = validation::summarize(node, ctx.required);
            // consumers call the promoted type's validator
            model.validations.has_validations |= delegated;
            return Ok(model);
        }
        self.assemble(label, hint, node, ctx)
    }

    /// Synthesizes a named model for an anonymous node. Returns the assigned
    /// name and whether the promoted model carries validations.
    pub(crate) fn promote(
        &mut self,
        hint: &str,
        node: &SchemaNode,
        ctx: &ResolveCtx,
    ) -> Result<(String, bool)> {
        let name = self.unique_name(hint);
        let pctx = ctx.named(&name);
        let mut model = self.assemble(&name, &name, node, &pctx)?;
        model.name = name.clone();
        let delegated = model.validations.has_validations;
        self.discovered.push(model);
        Ok((name, delegated))
    }

    fn unique_name(&mut self, hint: &str) -> String {
        let base = self.options.namer.type_name(hint);
        let mut candidate = base.clone();
        let mut ordinal = 1usize;
        while self.used_names.contains(&candidate) {
            ordinal += 1;
            candidate = format!("{base}{ordinal}");
        }
        self.used_names.insert(candidate.clone());
        candidate
    }

    /// The regular assembly path: resolve this node, then walk composition
    /// members, properties, items and additional properties.
    fn assemble(
        &mut self,
        label: &str,
        hint: &str,
        node: &SchemaNode,
        ctx: &ResolveCtx,
    ) -> Result<Model> {
        let mut resolved = self.resolver().resolve(node, ctx)?;
        let mut validations = validation::summarize(node, ctx.required);

        // a reference delegates validation to its target's validator
        if node.reference.is_some() {
            if let Some(target) = node.reference_name().and_then(|n| self.doc.definition(n)) {
                if target.has_properties()
                    || validation::summarize(target, false).has_validations
                {
                    validations.has_validations = true;
                }
            }
        }

        let mut properties = Vec::new();
        let mut all_of = Vec::new();
        let mut items = None;
        let mut additional_items = None;
        let mut additional_properties = None;

        // composition members are inline branches, never promoted
        for (i, member) in node.all_of.iter().enumerate() {
            let mctx = ctx.nested(Position::Standalone, false, format!("allOf.{i}"));
            let member_model =
                self.assemble(&format!("allOf.{i}"), &format!("{hint}AllOf{i}"), member, &mctx)?;
            validations.has_validations |= member_model.validations.has_validations;
            all_of.push(member_model);
        }

        for (pname, pnode) in &node.properties {
            let required = node.is_required(pname);
            let pctx = ctx.nested(Position::Field, required, pname.clone());
            let phint = format!("{hint}{}", self.options.namer.type_name(pname));
            let pmodel = self.build(pname, &phint, pnode, &pctx)?;
            validations.has_validations |= pmodel.validations.has_validations;
            properties.push(Property {
                name: pname.clone(),
                accessor: self.options.namer.member_name(pname),
                required,
                model: pmodel,
            });
        }

        match &node.items {
            Some(Items::One(s)) => {
                let ictx = ctx.nested(Position::ArrayElement, false, "items");
                let imodel = self.build("items", &format!("{hint}Items"), s, &ictx)?;
                validations.has_validations |= imodel.validations.has_validations;
                patch_array_elem(&mut resolved, imodel.resolved.clone());
                items = Some(Box::new(imodel));
            }
            Some(Items::Tuple(slots)) => {
                let mut resolved_slots = Vec::with_capacity(slots.len());
                for (i, slot) in slots.iter().enumerate() {
                    let sctx = ctx.nested(Position::TupleSlot, true, i.to_string());
                    let smodel =
                        self.build(&format!("p{i}"), &format!("{hint}P{i}"), slot, &sctx)?;
                    validations.has_validations |= smodel.validations.has_validations;
                    resolved_slots.push(smodel.resolved.clone());
                    properties.push(Property {
                        name: format!("p{i}"),
                        accessor: format!("p{i}"),
                        required: true,
                        model: smodel,
                    });
                }
                let mut tail = None;
                match &node.additional_items {
                    Some(Policy::Schema(s)) => {
                        let actx = ctx.nested(Position::AdditionalItem, false, "additionalItems");
                        let amodel =
                            self.build("additionalItems", &format!("{hint}Items"), s, &actx)?;
                        validations.has_validations |= amodel.validations.has_validations;
                        tail = Some(Box::new(amodel.resolved.clone()));
                        additional_items = Some(Box::new(amodel));
                    }
                    Some(Policy::Allow(true)) => {
                        let path = ctx.path.child("additionalItems");
                        tail = Some(Box::new(ResolvedType::interface()));
                        additional_items = Some(Box::new(Model::shell(
                            "additionalItems",
                            &path,
                            ResolvedType::interface(),
                        )));
                    }
                    _ => {}
                }
                patch_tuple(&mut resolved, resolved_slots, tail);
            }
            None => {}
        }

        // additional properties: a pure map flattens its whole chain,
        // an object with declared properties gets a typed extras child
        if node.reference.is_none()
            && node.all_of.is_empty()
            && node.effective_kind() == Kind::Object
        {
            match &node.additional_properties {
                Some(Policy::Schema(_)) if !node.has_properties() => {
                    let flat = mapstack::flatten(self, hint, node, ctx)?;
                    validations.has_validations |= flat.child.validations.has_validations;
                    resolved = reapply_alias(resolved, flat.resolved);
                    additional_properties = Some(Box::new(flat.child));
                }
                Some(Policy::Schema(s)) => {
                    let actx = ctx.nested(Position::MapValue, false, "additionalProperties");
                    let amodel =
                        self.build("additionalProperties", &format!("{hint}Anon"), s, &actx)?;
                    validations.has_validations |= amodel.validations.has_validations;
                    additional_properties = Some(Box::new(amodel));
                }
                Some(Policy::Allow(true)) => {
                    let path = ctx.path.child("additionalProperties");
                    additional_properties = Some(Box::new(Model::shell(
                        "additionalProperties",
                        &path,
                        ResolvedType::interface(),
                    )));
                }
                _ => {}
            }
        }

        Ok(Model {
            name: label.to_string(),
            path: ctx.path.to_string(),
            title: node.title.clone(),
            description: node.description.clone(),
            resolved,
            validations,
            default: node.default.clone(),
            read_only: node.read_only,
            omit_empty: node.x_omit_empty.unwrap_or(false),
            properties,
            all_of,
            items,
            additional_items,
            additional_properties,
            discriminator: DiscriminatorRole::None,
        })
    }

    fn apply_discriminator(&self, name: &str, model: &mut Model) {
        if let Some(info) = self.discrimination.bases.get(name) {
            model.discriminator = DiscriminatorRole::Base {
                field: info.field.clone(),
                subtypes: info.children.clone(),
            };
            return;
        }
        let Some(info) = self.discrimination.subtypes.get(name) else {
            return;
        };
        model.discriminator = DiscriminatorRole::Subtype {
            base: self.options.namer.type_name(&info.base),
            field: info.field.clone(),
            value: info.value.clone(),
        };
        // the subtype re-declares nothing the base already owns, and a
        // property seen in one member is dropped from later ones
        let mut seen: BTreeSet<String> = self
            .doc
            .definition(&info.base)
            .map(|b| b.properties.keys().cloned().collect())
            .unwrap_or_default();
        seen.insert(info.field.clone());
        model.properties.retain(|p| seen.insert(p.name.clone()));
        for member in &mut model.all_of {
            member.properties.retain(|p| seen.insert(p.name.clone()));
        }
    }
}

/// Anonymous complex shapes that must become named models before they can be
/// referenced: inline objects with properties, inline composed (`allOf`)
/// objects and inline tuples.
fn needs_promotion(node: &SchemaNode) -> bool {
    if node.reference.is_some() {
        return false;
    }
    if !node.all_of.is_empty() {
        return true;
    }
    match node.effective_kind() {
        Kind::Object => node.has_properties(),
        Kind::Array => matches!(node.items, Some(Items::Tuple(_))),
        _ => false,
    }
}

/// Substitutes a promoted element resolution into an array (possibly behind
/// an alias) and recomposes the target identifier.
fn patch_array_elem(rt: &mut ResolvedType, elem: ResolvedType) {
    match &mut rt.shape {
        TypeShape::Alias { underlying, .. } => patch_array_elem(underlying, elem),
        TypeShape::Array { elem: slot, .. } => {
            rt.target = format!("[]{}", elem.target);
            **slot = elem;
        }
        _ => {}
    }
}

fn patch_tuple(rt: &mut ResolvedType, slots: Vec<ResolvedType>, tail: Option<Box<ResolvedType>>) {
    if let TypeShape::Tuple { slots: s, tail: t } = &mut rt.shape {
        *s = slots;
        *t = tail;
    }
}

/// Keeps the alias wrapper of a named map definition around the flattened
/// chain resolution.
fn reapply_alias(original: ResolvedType, chain: ResolvedType) -> ResolvedType {
    match original.shape {
        TypeShape::Alias { name, .. } => ResolvedType {
            target: original.target,
            source: chain.source.clone(),
            nullable: original.nullable,
            shape: TypeShape::Alias { name, underlying: Box::new(chain) },
        },
        _ => chain,
    }
}
