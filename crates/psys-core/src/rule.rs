//! Rewrite rule definitions (`spec.md` §3-4.2, component C2).
use crate::ident::{Label, MembId};
use crate::multiset::Multiset;

/// The four structurally-determined rule behaviors (`spec.md` §4.2).
///
/// Per the Design Note in `spec.md` §9 ("Rule polymorphism by attribute
/// inspection" → "encode the four behaviors as a tagged variant on `Rule`"),
/// [`Rule::kind`] names which single variant a rule is for classification
/// purposes (tests, reporting). The step engine itself checks `divide`/
/// `create`/`dissolve` directly rather than branching once on `kind()`,
/// since a rule built with [`Rule::with_create`]/[`Rule::with_dissolve`]
/// can act as more than one variant in the same application (§9 Q4).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RuleKind {
    /// `divide` unset, `create` empty, `dissolve` empty: consume `left`,
    /// deposit `right` per routing.
    Rewrite,
    /// `divide` unset, `create` non-empty: instantiate prototypes as children.
    Creator,
    /// `divide` unset, `dissolve` non-empty: remove target membranes.
    Dissolver,
    /// `divide` set: the executing membrane splits into two siblings.
    /// `right`, `create`, and `dissolve` are ignored when this variant fires.
    Divider,
}

/// One rewrite rule as described by `spec.md` §3.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    /// Reactants. May be empty (see `spec.md` §4.1's empty-left edge case).
    pub left: Multiset,
    /// Products. Keys may carry routing suffixes (`_out`, `_in_<mid>`).
    /// Ignored when [`Rule::kind`] is [`RuleKind::Divider`].
    pub right: Multiset,
    /// Higher priority wins within a membrane (`spec.md` §4.4).
    pub priority: i64,
    /// `(prototype_label, initial_resources)` pairs, one instantiation per
    /// application. Ignored when [`Rule::kind`] is [`RuleKind::Divider`].
    pub create: Vec<(Label, Multiset)>,
    /// Target membrane ids to remove, one dissolution per application.
    /// Ignored when [`Rule::kind`] is [`RuleKind::Divider`].
    pub dissolve: Vec<MembId>,
    /// `(v, w)` multisets credited to the two division offspring. When
    /// `Some`, this rule is structural and `right`/`create`/`dissolve` are
    /// ignored (`spec.md` §4.2).
    pub divide: Option<(Multiset, Multiset)>,
}

impl Rule {
    /// Builds a plain rewrite rule.
    #[must_use]
    pub fn rewrite(left: Multiset, right: Multiset, priority: i64) -> Self {
        Self {
            left,
            right,
            priority,
            create: Vec::new(),
            dissolve: Vec::new(),
            divide: None,
        }
    }

    /// Builds a creator rule: consumes `left`, instantiates each prototype
    /// entry as a child of the executing membrane per application.
    #[must_use]
    pub fn creator(left: Multiset, priority: i64, create: Vec<(Label, Multiset)>) -> Self {
        Self {
            left,
            right: Multiset::new(),
            priority,
            create,
            dissolve: Vec::new(),
            divide: None,
        }
    }

    /// Builds a dissolver rule: consumes `left`, removes each named target
    /// membrane per application.
    #[must_use]
    pub fn dissolver(left: Multiset, priority: i64, dissolve: Vec<MembId>) -> Self {
        Self {
            left,
            right: Multiset::new(),
            priority,
            create: Vec::new(),
            dissolve,
            divide: None,
        }
    }

    /// Builds a divider rule: the executing membrane is replaced by two
    /// siblings under its former parent when this rule applies.
    #[must_use]
    pub fn divider(left: Multiset, priority: i64, v: Multiset, w: Multiset) -> Self {
        Self {
            left,
            right: Multiset::new(),
            priority,
            create: Vec::new(),
            dissolve: Vec::new(),
            divide: Some((v, w)),
        }
    }

    /// Also allow a rewrite rule to create and/or dissolve in the same
    /// application (`spec.md` §9 Q4: both are accepted; commit ordering,
    /// not authoring order, decides which runs first).
    #[must_use]
    pub fn with_create(mut self, create: Vec<(Label, Multiset)>) -> Self {
        self.create = create;
        self
    }

    /// See [`Rule::with_create`].
    #[must_use]
    pub fn with_dissolve(mut self, dissolve: Vec<MembId>) -> Self {
        self.dissolve = dissolve;
        self
    }

    /// Classifies this rule into one of the four behaviors of `spec.md`
    /// §4.2. A rule with `divide` set is always [`RuleKind::Divider`]
    /// regardless of what `create`/`dissolve` also carry, matching the
    /// spec's "divide... is structural and its right/create/dissolve are
    /// ignored."
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        if self.divide.is_some() {
            RuleKind::Divider
        } else if !self.create.is_empty() {
            RuleKind::Creator
        } else if !self.dissolve.is_empty() {
            RuleKind::Dissolver
        } else {
            RuleKind::Rewrite
        }
    }
}
