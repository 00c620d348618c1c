//! Scenarios S1-S2: small P-systems computing integer division and parity
//! by repeated rewriting, run to a fixed point via `record`.
#![allow(clippy::unwrap_used, clippy::expect_used)]
mod common;

use common::ms;
use psys_core::{record, Membrane, Rule, System};

#[test]
fn pairwise_consumption_computes_floor_division_by_two() {
    // Each step, as many (a,a) pairs as available are rewritten to one b;
    // a lone leftover a (if count is odd) can never pair again.
    let mut sys = System::new();
    let mut root = Membrane::new("root", ms(&[("a", 17)]));
    root.add_rule(Rule::rewrite(ms(&[("a", 2)]), ms(&[("b", 1)]), 1));
    sys.add_membrane(root, None);

    let table = record(sys, 1, 1).unwrap();
    let row = &table.rows()[0];
    // residual_resources is the post-consumption, pre-production map: the
    // lone leftover `a` with the freshly produced `b`s not yet merged in.
    assert_eq!(row.residual_resources, "[(a,1)]");
    assert_eq!(row.productions, "[(b,8)]");
}

#[test]
fn toggle_rule_reports_parity_after_fully_consuming_input() {
    // Consumes one `a` per step, flipping between `even`/`odd` markers;
    // after consuming all of `a`, the marker left standing names the
    // parity of the original count.
    let mut sys = System::new();
    let mut root = Membrane::new("root", ms(&[("a", 6), ("even", 1)]));
    root.add_rule(Rule::rewrite(ms(&[("a", 1), ("even", 1)]), ms(&[("odd", 1)]), 2));
    root.add_rule(Rule::rewrite(ms(&[("a", 1), ("odd", 1)]), ms(&[("even", 1)]), 2));
    sys.add_membrane(root, None);

    let table = record(sys, 6, 1).unwrap();
    let last = table.rows().last().unwrap();
    // The last `a` and its matching marker are fully consumed, leaving the
    // consumed map empty; the resulting parity marker shows up as this
    // step's production instead.
    assert_eq!(last.residual_resources, "[]");
    assert_eq!(last.productions, "[(even,1)]");
}
