//! Engine error kinds (`spec.md` §7).
use thiserror::Error;

use crate::ident::Label;

/// Errors the step engine can return. Per `spec.md` §7, each is fatal to the
/// *step* that raised it (no partial commit); missing dissolve targets,
/// missing routing targets, and dissolving the root are documented no-ops,
/// not errors, and never appear here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A `create` entry named a prototype label not present in
    /// `System.prototypes` (`spec.md` I3).
    #[error("rule references unregistered prototype {0:?}")]
    PrototypeMissing(Label),
    /// A product key contained the `_in_` infix but split into an empty
    /// base or an empty target (`spec.md` §4.2).
    #[error("malformed routing key {0:?}")]
    MalformedRoutingKey(String),
    /// A structural invariant (tree well-formedness, I1/I5) was found
    /// violated at commit time; this indicates a bug in a caller that built
    /// the `System` outside the `build` constructors.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// Wraps a step failure with the recorder's progress up to that point
/// (`spec.md` §7: "the recorder surfaces the step index that failed and
/// retains the rows written before it").
#[derive(Debug, Error)]
#[error("recording failed at step {step}: {source}")]
pub struct RecordError {
    /// 1-indexed step at which `source` occurred.
    pub step: usize,
    /// The underlying engine failure.
    #[source]
    pub source: EngineError,
    /// Rows produced by steps `1..step` (every membrane's `consumed` row,
    /// per the iteration order of `spec.md` §4.6), so callers keep partial
    /// progress instead of discarding it.
    pub rows_so_far: crate::recorder::Table,
}
