//! `record`'s CSV rendering and partial-progress error semantics.
#![allow(clippy::unwrap_used, clippy::expect_used)]
mod common;

use common::ms;
use psys_core::{record, Label, Membrane, Rule, System};

#[test]
fn csv_output_has_the_exact_header_and_one_row_per_membrane_per_step() {
    let mut sys = System::new();
    let mut root = Membrane::new("root", ms(&[("a", 4)]));
    root.add_rule(Rule::rewrite(ms(&[("a", 1)]), ms(&[("b", 1)]), 1));
    sys.add_membrane(root, None);

    let table = record(sys, 3, 1).unwrap();
    let csv = table.to_csv();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "step,membrane,residual_resources,productions,applications,created_global,dissolved_global"
    );
    assert_eq!(lines.count(), 3);
    assert_eq!(table.rows().len(), 3);
}

#[test]
fn failure_on_a_missing_prototype_preserves_rows_from_earlier_steps() {
    let mut sys = System::new();
    let mut root = Membrane::new("root", ms(&[("a", 1), ("trigger", 1)]));
    root.add_rule(Rule::rewrite(ms(&[("a", 1)]), ms(&[("b", 1)]), 5));
    root.add_rule(Rule::creator(ms(&[("trigger", 1)]), 1, vec![(Label::new("ghost"), ms(&[]))]));
    sys.add_membrane(root, None);

    // Step 1 only fires the higher-priority rewrite (trigger's class is
    // lower priority and a's class wins), step 2 then has nothing left to
    // beat the creator rule's class, so it fires and fails on the missing
    // prototype.
    let err = record(sys, 2, 1).unwrap_err();
    assert_eq!(err.step, 2);
    assert_eq!(err.rows_so_far.rows().len(), 1);
}
