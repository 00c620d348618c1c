//! Identifier and routing-suffix utilities.
//!
//! Three distinct newtypes guard against mixing up the three string
//! namespaces a [`crate::membrane::System`] deals in: objects ([`Symbol`]),
//! membranes ([`MembId`]), and prototype templates ([`Label`]). None
//! converts into another without an explicit constructor.
use std::fmt;
use std::sync::Arc;

/// An opaque, interned object identifier (`spec.md` §3's "Symbol").
///
/// Equality and hashing are by string content. Cloning is cheap (`Arc`
/// refcount bump), matching the teacher's identifier newtypes, which are
/// likewise `Clone + Eq + Hash` value types cheap enough to pass by value.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Interns `label` as a symbol.
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self(label.into())
    }

    /// Returns the symbol text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Stable identifier for a membrane, unique within a [`crate::membrane::System`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MembId(Arc<str>);

impl MembId {
    /// Builds an identifier from a caller-chosen label.
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self(label.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives a fresh id for a prototype instantiation: `"<parent>_<label>_<hex8>"`.
    #[must_use]
    pub fn derive_for_prototype(&self, label: &Label, hex8: &str) -> Self {
        Self::new(format!("{}_{}_{}", self.0, label.as_str(), hex8))
    }

    /// Derives a fresh id for a division offspring: `"<parent>_<hex8>"`.
    #[must_use]
    pub fn derive_for_division(&self, hex8: &str) -> Self {
        Self::new(format!("{}_{}", self.0, hex8))
    }
}

impl fmt::Display for MembId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MembId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MembId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Name of a registered membrane prototype (`spec.md` §3, `System.prototypes`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label(Arc<str>);

impl Label {
    /// Builds a prototype label.
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self(label.into())
    }

    /// Returns the label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Where a product symbol is credited once routing suffixes are stripped.
///
/// Built from the raw product key at snapshot time (`spec.md` §4.2): a
/// trailing `_out` routes to the parent, an infix `_in_<mid>` routes to a
/// named membrane, and anything else stays local.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RouteTarget {
    /// Deposit in the executing membrane.
    Local,
    /// Deposit in the executing membrane's parent (no-op if there is none).
    Parent,
    /// Deposit in the named membrane (no-op if it is not live at snapshot time).
    Named(MembId),
}

/// Splits a raw product key into its base [`Symbol`] and [`RouteTarget`].
///
/// Returns `Err` only when the key contains the `_in_` infix but splits into
/// an empty base or an empty target, per `spec.md` §7's
/// `MalformedRoutingKey` error kind.
pub fn parse_route(raw: &str) -> Result<(Symbol, RouteTarget), &str> {
    if let Some(base) = raw.strip_suffix("_out") {
        if base.is_empty() {
            return Err(raw);
        }
        return Ok((Symbol::new(base), RouteTarget::Parent));
    }
    if let Some(pos) = raw.find("_in_") {
        let base = &raw[..pos];
        let target = &raw[pos + 4..];
        if base.is_empty() || target.is_empty() {
            return Err(raw);
        }
        return Ok((Symbol::new(base), RouteTarget::Named(MembId::new(target))));
    }
    Ok((Symbol::new(raw), RouteTarget::Local))
}
