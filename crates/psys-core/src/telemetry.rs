#![allow(missing_docs)]
//! Best-effort JSON-line event emission, gated behind the `telemetry`
//! feature (`SPEC_FULL.md` §8). Structured `tracing` events cover the same
//! ground for consumers with a subscriber attached; this module is for
//! callers that just want to pipe stdout into `jq`.

#[cfg(feature = "telemetry")]
use serde::Serialize;

#[cfg(feature = "telemetry")]
use crate::ident::MembId;

#[cfg(feature = "telemetry")]
#[derive(Serialize)]
struct StepEvent<'a> {
    timestamp_micros: u128,
    step: usize,
    event: &'a str,
    membrane: String,
}

#[cfg(feature = "telemetry")]
fn ts_micros() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the unix epoch")
        .as_micros()
}

#[cfg(feature = "telemetry")]
fn emit(kind: &str, step: usize, membrane: &MembId) {
    let ev = StepEvent {
        timestamp_micros: ts_micros(),
        step,
        event: kind,
        membrane: membrane.as_str().to_string(),
    };
    let _ = serde_json::to_writer(std::io::stdout(), &ev);
    let _ = std::io::Write::write_all(&mut std::io::stdout(), b"\n");
}

/// Emits a `created` event for `membrane` at `step`.
#[cfg(feature = "telemetry")]
pub fn created(step: usize, membrane: &MembId) {
    emit("created", step, membrane);
}

/// Emits a `dissolved` event for `membrane` at `step`.
#[cfg(feature = "telemetry")]
pub fn dissolved(step: usize, membrane: &MembId) {
    emit("dissolved", step, membrane);
}

/// Emits a run summary after `record` finishes.
#[cfg(feature = "telemetry")]
pub fn summary(steps_run: usize, created_total: u64, dissolved_total: u64) {
    #[derive(Serialize)]
    struct Summary {
        timestamp_micros: u128,
        event: &'static str,
        steps_run: usize,
        created_total: u64,
        dissolved_total: u64,
    }
    let s = Summary {
        timestamp_micros: ts_micros(),
        event: "summary",
        steps_run,
        created_total,
        dissolved_total,
    };
    let _ = serde_json::to_writer(std::io::stdout(), &s);
    let _ = std::io::Write::write_all(&mut std::io::stdout(), b"\n");
}
