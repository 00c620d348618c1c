//! psys-core: a deterministic, maximally-parallel P-system (membrane
//! computing) simulator core.
//!
//! A [`membrane::System`] is a tree of [`membrane::Membrane`]s, each holding
//! a [`multiset::Multiset`] of resources and a list of [`rule::Rule`]s.
//! [`engine::step`] advances the whole tree by one maximal-parallel
//! timestep: every membrane independently selects a maximal set of rule
//! applications, consumes and routes resources, then the tree commits
//! dissolutions and creations/divisions, in that fixed order. Two calls
//! with the same `(system, seed)` always produce the same result.
//!
//! [`recorder::record`] runs a system for a fixed number of steps and
//! returns a [`recorder::Table`] of per-membrane, per-step statistics.
//! [`merge::merge`] combines several systems into one tree under a fresh
//! root.

pub mod config;
pub mod engine;
pub mod enumerator;
pub mod error;
pub mod ident;
pub mod membrane;
pub mod merge;
pub mod multiset;
pub mod recorder;
pub mod rng;
pub mod rule;
pub mod telemetry;

pub use config::SimulationConfig;
pub use engine::{step, StepResult};
pub use enumerator::{enumerate_maximals, AppVector};
pub use error::{EngineError, RecordError};
pub use ident::{Label, MembId, RouteTarget, Symbol};
pub use membrane::{Membrane, System};
pub use merge::merge;
pub use multiset::{MaxApps, Multiset};
pub use recorder::{record, Row, Table};
pub use rng::Prng;
pub use rule::{Rule, RuleKind};
