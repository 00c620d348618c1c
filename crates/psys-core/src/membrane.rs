//! Membrane tree state (`spec.md` §3, component C3).
use std::collections::BTreeMap;

use crate::ident::{Label, MembId};
use crate::multiset::Multiset;
use crate::rule::Rule;

/// One node of the membrane tree: a multiset of resources and the rules
/// that rewrite it.
///
/// `parent`/`children` are id references only (no language-level cycles are
/// possible), matching the teacher's "arena of membranes keyed by id" Design
/// Note in `spec.md` §9.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Membrane {
    /// Stable identifier, unique within the owning `System`.
    pub id: MembId,
    /// Current resource multiset.
    pub resources: Multiset,
    /// Rules available to this membrane.
    pub rules: Vec<Rule>,
    /// Parent membrane id, `None` for the root.
    pub parent: Option<MembId>,
    /// Child membrane ids, in insertion order.
    pub children: Vec<MembId>,
}

impl Membrane {
    /// Builds a new, childless, rule-less membrane.
    #[must_use]
    pub fn new(id: impl Into<MembId>, resources: Multiset) -> Self {
        Self {
            id: id.into(),
            resources,
            rules: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Appends a rule to this membrane.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }
}

/// A membrane tree plus the registry of prototypes creator rules may
/// instantiate from (`spec.md` §3).
///
/// Membranes are stored in a `BTreeMap` keyed by id. `spec.md` §4.4's
/// "iteration order = insertion order, stable across a step" refers to
/// *authoring* order, not to traversal of this map: `engine::step` records
/// its own insertion-ordered membrane list at `System` build time and reuses
/// it every step, exactly as the teacher's `GraphStore` keeps a `BTreeMap`
/// for deterministic lookup while a separate ordered structure governs
/// traversal.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct System {
    membranes: BTreeMap<MembId, Membrane>,
    /// Insertion order of membrane ids, preserved across steps.
    order: Vec<MembId>,
    prototypes: BTreeMap<Label, Vec<Rule>>,
    /// Distinguished id that `engine::step` never dissolves (`spec.md` I4).
    pub output_id: Option<MembId>,
}

impl System {
    /// Builds an empty system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `membrane` to the system, linking it under `parent` if given.
    ///
    /// # Panics
    /// Panics if `membrane.id` is already present, or if `parent` does not
    /// name a live membrane — both indicate a caller bug building the
    /// system, not a runtime condition (`spec.md` I5 is a build-time
    /// invariant this enforces at construction).
    pub fn add_membrane(&mut self, mut membrane: Membrane, parent: Option<MembId>) {
        assert!(
            !self.membranes.contains_key(&membrane.id),
            "duplicate membrane id {:?}",
            membrane.id
        );
        membrane.parent = parent.clone();
        let id = membrane.id.clone();
        if let Some(parent_id) = &parent {
            let parent_memb = self
                .membranes
                .get_mut(parent_id)
                .unwrap_or_else(|| panic!("parent membrane {parent_id:?} not found"));
            parent_memb.children.push(id.clone());
        }
        self.order.push(id.clone());
        self.membranes.insert(id, membrane);
    }

    /// Registers a prototype rule list under `label`, for use by creator
    /// rules (`spec.md` I3).
    pub fn register_prototype(&mut self, label: impl Into<Label>, rules: Vec<Rule>) {
        self.prototypes.insert(label.into(), rules);
    }

    /// Looks up a prototype's rule list.
    #[must_use]
    pub fn prototype(&self, label: &Label) -> Option<&Vec<Rule>> {
        self.prototypes.get(label)
    }

    /// Clones every registered `(label, rules)` pair, for use by
    /// [`crate::merge::merge`] when folding prototypes from several systems
    /// into one.
    #[must_use]
    pub fn prototypes_owned(&self) -> Vec<(Label, Vec<Rule>)> {
        self.prototypes.iter().map(|(label, rules)| (label.clone(), rules.clone())).collect()
    }

    /// Returns a shared reference to a membrane.
    #[must_use]
    pub fn membrane(&self, id: &MembId) -> Option<&Membrane> {
        self.membranes.get(id)
    }

    /// Returns a mutable reference to a membrane.
    pub fn membrane_mut(&mut self, id: &MembId) -> Option<&mut Membrane> {
        self.membranes.get_mut(id)
    }

    /// Returns `true` if `id` names a currently live membrane.
    #[must_use]
    pub fn is_live(&self, id: &MembId) -> bool {
        self.membranes.contains_key(id)
    }

    /// Iterates membrane ids in stable insertion order (`spec.md` §4.4,
    /// §5's "stable insertion order of the membrane map").
    pub fn ids_in_order(&self) -> impl Iterator<Item = &MembId> {
        self.order.iter().filter(|id| self.membranes.contains_key(*id))
    }

    /// Iterates live membranes in stable insertion order.
    pub fn membranes_in_order(&self) -> impl Iterator<Item = &Membrane> {
        self.ids_in_order().map(move |id| &self.membranes[id])
    }

    /// Number of currently live membranes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.membranes.len()
    }

    /// Returns `true` if the system has no membranes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.membranes.is_empty()
    }

    pub(crate) fn insert_raw(&mut self, membrane: Membrane) {
        let id = membrane.id.clone();
        self.order.push(id.clone());
        self.membranes.insert(id, membrane);
    }

    pub(crate) fn remove_raw(&mut self, id: &MembId) -> Option<Membrane> {
        self.membranes.remove(id)
    }
}
