//! Multiset primitives (`spec.md` §4.1, component C1).
use std::collections::BTreeMap;
use std::collections::btree_map::Iter;

use crate::ident::Symbol;

/// A finite mapping from [`Symbol`] to a positive count.
///
/// Canonical form carries no zero-valued entries (`spec.md` I2); every
/// constructor and combinator here maintains that invariant, matching the
/// teacher's `BTreeMap`-backed stores (`graph.rs`, `snapshot.rs`), which rely
/// on `BTreeMap`'s ascending iteration order for deterministic encoding.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Multiset(BTreeMap<Symbol, u64>);

/// Result of [`Multiset::max_apps`]: how many times a rule's left side fits.
///
/// Per the Design Note in `spec.md` §9, this replaces the source's reuse of
/// a float "infinity" sentinel with a tagged result the caller must match
/// on explicitly.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MaxApps {
    /// The left side is non-empty and fits at most `n` times in the bag.
    Bounded(u64),
    /// The left side is empty: the rule is applicable, unconstrained by
    /// resources, but per `spec.md` §4.1 callers must treat this as a
    /// single-shot application, never a multi-application.
    Unconstrained,
}

impl Multiset {
    /// Returns an empty multiset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a multiset from `(symbol, count)` pairs, dropping zero counts.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<Symbol>,
    {
        let mut out = BTreeMap::new();
        for (sym, count) in pairs {
            if count > 0 {
                out.insert(sym.into(), count);
            }
        }
        Self(out)
    }

    /// Returns the count for `symbol` (0 if absent).
    #[must_use]
    pub fn get(&self, symbol: &Symbol) -> u64 {
        self.0.get(symbol).copied().unwrap_or(0)
    }

    /// Returns `true` if every symbol has a count of 0.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(symbol, count)` pairs in ascending symbol order.
    pub fn iter(&self) -> Iter<'_, Symbol, u64> {
        self.0.iter()
    }

    /// `add(a, b) -> c`: `c[s] = a[s] + b[s]` for every symbol.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        let mut out = self.0.clone();
        for (sym, count) in &other.0 {
            *out.entry(sym.clone()).or_insert(0) += count;
        }
        Self(out)
    }

    /// `sub_floor(a, b) -> c`: `c[s] = max(0, a[s] - b[s])`, dropping zeros.
    #[must_use]
    pub fn sub_floor(&self, other: &Self) -> Self {
        let mut out = BTreeMap::new();
        for (sym, count) in &self.0 {
            let subtracted = count.saturating_sub(other.get(sym));
            if subtracted > 0 {
                out.insert(sym.clone(), subtracted);
            }
        }
        Self(out)
    }

    /// `scale(a, k) -> c`: `c[s] = k * a[s]`. `k = 0` yields the empty multiset.
    #[must_use]
    pub fn scale(&self, k: u64) -> Self {
        if k == 0 {
            return Self::new();
        }
        let out = self.0.iter().map(|(sym, count)| (sym.clone(), count * k)).collect();
        Self(out)
    }

    /// `max_apps(bag, rule_left) -> n`.
    ///
    /// `n = min over s in keys(rule_left) of floor(bag[s] / rule_left[s])`.
    /// An empty `rule_left` yields [`MaxApps::Unconstrained`] (`spec.md`
    /// §4.1's empty-left edge case), never a numeric bound.
    #[must_use]
    pub fn max_apps(&self, rule_left: &Self) -> MaxApps {
        if rule_left.0.is_empty() {
            return MaxApps::Unconstrained;
        }
        let bound = rule_left
            .0
            .iter()
            .map(|(sym, need)| self.get(sym) / need)
            .min()
            .unwrap_or(0);
        MaxApps::Bounded(bound)
    }

    /// Returns a human-readable `[(s1,n1),(s2,n2)]` rendering in ascending
    /// symbol order, used by the recorder's `applications`/`residual_resources`
    /// columns (`spec.md` §6).
    #[must_use]
    pub fn to_bracket_list(&self) -> String {
        let mut out = String::from("[");
        for (i, (sym, count)) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&format!("({sym},{count})"));
        }
        out.push(']');
        out
    }
}

impl FromIterator<(Symbol, u64)> for Multiset {
    fn from_iter<I: IntoIterator<Item = (Symbol, u64)>>(iter: I) -> Self {
        let mut out = BTreeMap::new();
        for (sym, count) in iter {
            if count > 0 {
                out.insert(sym, count);
            }
        }
        Self(out)
    }
}
