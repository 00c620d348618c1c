//! Tabular statistics recording (`spec.md` §6, component C6).
use std::fmt::Write as _;
use std::path::Path;

use crate::engine;
use crate::error::RecordError;
use crate::ident::MembId;
use crate::membrane::System;
use crate::rule::Rule;

/// One row of the recorded table: a single membrane's state after one step.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    /// 1-indexed step this row was recorded after.
    pub step: usize,
    /// Membrane this row describes.
    pub membrane: MembId,
    /// `[(symbol,count)]` rendering of the membrane's post-consumption,
    /// pre-production resources (`spec.md` §4.6's "string of the consumed
    /// map"). Falls back to the membrane's current resources for a
    /// membrane created this step, which has no pre-step consumed entry.
    pub residual_resources: String,
    /// `[(symbol,count)]` rendering of this step's net production for the
    /// membrane (products routed in minus reactants consumed).
    pub productions: String,
    /// Semicolon-joined `left_items->right_items × count` for each rule
    /// this membrane selected this step (`spec.md` §4.6).
    pub applications: String,
    /// Semicolon-joined `parent->new_id` across every membrane created
    /// system-wide this step (`spec.md` §4.6). The same string on every
    /// row of a given step.
    pub created_global: String,
    /// Semicolon-joined ids of every membrane dissolved system-wide this
    /// step (`spec.md` §4.6). The same string on every row of a given step.
    pub dissolved_global: String,
}

/// An in-memory, append-only table of [`Row`]s, one per membrane per step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// Builds an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows recorded so far, in `(step, membrane insertion order)`.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The exact header `spec.md` §6 requires, in column order.
    #[must_use]
    pub fn header() -> &'static str {
        "step,membrane,residual_resources,productions,applications,created_global,dissolved_global"
    }

    /// Renders the table as CSV text, header first.
    ///
    /// Hand-rolled rather than pulled from a crate: the only fields needing
    /// quoting are the bracket-list and semicolon-joined columns (they may
    /// contain commas), and `spec.md` §6 pins the quoting rule exactly
    /// (wrap in `"`, double any embedded `"`), so a dependency buys nothing
    /// here.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(Self::header());
        out.push('\n');
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{}",
                row.step,
                csv_field(row.membrane.as_str()),
                csv_field(&row.residual_resources),
                csv_field(&row.productions),
                csv_field(&row.applications),
                csv_field(&row.created_global),
                csv_field(&row.dissolved_global),
            );
        }
        out
    }

    /// Writes [`Table::to_csv`] to `path`.
    ///
    /// # Errors
    /// Returns the underlying I/O error on write failure.
    pub fn write_csv(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }
}

fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Runs `n_steps` of [`engine::step`] against `system`, recording one
/// [`Row`] per live membrane per step, and returns the accumulated table.
///
/// Step `k` (1-indexed) is seeded with `base_seed + k - 1` per `spec.md`
/// §4.6. On the first [`EngineError`], recording stops and the error is
/// returned wrapped in [`RecordError`] together with every row produced by
/// steps `1..k`, so a caller never loses partial progress.
///
/// # Errors
/// Returns [`RecordError`] if any step fails.
pub fn record(mut system: System, n_steps: usize, base_seed: u64) -> Result<Table, RecordError> {
    let mut table = Table::new();
    #[cfg(feature = "telemetry")]
    let (mut created_total, mut dissolved_total) = (0u64, 0u64);

    for step_index in 0..n_steps {
        let step_no = step_index + 1;
        let seed = base_seed.wrapping_add(step_index as u64);
        let result = engine::step(&mut system, seed).map_err(|source| RecordError {
            step: step_no,
            source,
            rows_so_far: table.clone(),
        })?;

        #[cfg(feature = "telemetry")]
        {
            for (_, new_id) in &result.created {
                crate::telemetry::created(step_no, new_id);
            }
            for id in &result.dissolved {
                crate::telemetry::dissolved(step_no, id);
            }
            created_total += result.created.len() as u64;
            dissolved_total += result.dissolved.len() as u64;
        }

        tracing::debug!(step = step_no, created = result.created.len(), dissolved = result.dissolved.len(), "step recorded");

        let created_global = result
            .created
            .iter()
            .map(|(parent, new_id)| format!("{parent}->{new_id}"))
            .collect::<Vec<_>>()
            .join(";");
        let dissolved_global = result.dissolved.iter().map(MembId::to_string).collect::<Vec<_>>().join(";");

        for memb in system.membranes_in_order() {
            let applications = result
                .applications
                .get(&memb.id)
                .map(|vector| render_app_vector(vector, &memb.rules))
                .unwrap_or_default();
            let productions = result
                .net_production
                .get(&memb.id)
                .map(crate::multiset::Multiset::to_bracket_list)
                .unwrap_or_else(|| "[]".to_string());
            let residual_resources = result
                .consumed
                .get(&memb.id)
                .map(crate::multiset::Multiset::to_bracket_list)
                .unwrap_or_else(|| memb.resources.to_bracket_list());

            table.rows.push(Row {
                step: step_no,
                membrane: memb.id.clone(),
                residual_resources,
                productions,
                applications,
                created_global: created_global.clone(),
                dissolved_global: dissolved_global.clone(),
            });
        }
    }

    #[cfg(feature = "telemetry")]
    crate::telemetry::summary(n_steps, created_total, dissolved_total);

    Ok(table)
}

/// Renders `vector` as `spec.md` §4.6's application column: each selected
/// `(rule_index, count)` pair as `left->right × count`, semicolon-joined.
fn render_app_vector(vector: &[(usize, u64)], rules: &[Rule]) -> String {
    let mut out = String::new();
    for (i, &(idx, count)) in vector.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        let rule = &rules[idx];
        let _ = write!(out, "{}->{} × {count}", rule.left.to_bracket_list(), rule.right.to_bracket_list());
    }
    out
}
