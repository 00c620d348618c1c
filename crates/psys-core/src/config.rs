//! Run configuration (`spec.md` §6, ambient configuration per `SPEC_FULL.md` §8).
use std::path::PathBuf;

/// Parameters for one simulation run: how many steps, what seed, and where
/// (if anywhere) to persist the recorded table.
///
/// Mirrors the teacher's plain, field-public config struct style rather than
/// a builder: every field is meaningful on its own and there is no invalid
/// combination to guard against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of [`crate::engine::step`] calls `crate::recorder::record` runs.
    pub steps: usize,
    /// Seed for step 1; step `k` uses `base_seed + k - 1` (`spec.md` §4.6).
    pub base_seed: u64,
    /// If set, the recorded table is written here as CSV after the run.
    pub csv_output: Option<PathBuf>,
}

impl SimulationConfig {
    /// Builds a config with no CSV output.
    #[must_use]
    pub fn new(steps: usize, base_seed: u64) -> Self {
        Self { steps, base_seed, csv_output: None }
    }

    /// Sets the CSV output path.
    #[must_use]
    pub fn with_csv_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_output = Some(path.into());
        self
    }
}
