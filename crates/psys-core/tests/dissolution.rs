//! Scenario S4: dissolution with resource inheritance and reparenting.
#![allow(clippy::unwrap_used, clippy::expect_used)]
mod common;

use common::ms;
use psys_core::{step, MembId, Membrane, Rule, System};

#[test]
fn dissolved_membrane_s_resources_move_to_its_parent() {
    let mut sys = System::new();
    let mut root = Membrane::new("root", ms(&[("d", 1)]));
    root.add_rule(Rule::dissolver(ms(&[("d", 1)]), 1, vec![MembId::new("mid")]));
    sys.add_membrane(root, None);
    sys.add_membrane(Membrane::new("mid", ms(&[("r", 9)])), Some(MembId::new("root")));

    let result = step(&mut sys, 1).unwrap();
    assert_eq!(result.dissolved, vec![MembId::new("mid")]);
    assert!(!sys.is_live(&MembId::new("mid")));
    let root = sys.membrane(&MembId::new("root")).unwrap();
    assert_eq!(root.resources.get(&psys_core::Symbol::new("r")), 9);
}

#[test]
fn dissolved_membrane_s_children_are_reparented_to_its_parent() {
    let mut sys = System::new();
    let mut root = Membrane::new("root", ms(&[("d", 1)]));
    root.add_rule(Rule::dissolver(ms(&[("d", 1)]), 1, vec![MembId::new("mid")]));
    sys.add_membrane(root, None);
    sys.add_membrane(Membrane::new("mid", ms(&[])), Some(MembId::new("root")));
    sys.add_membrane(Membrane::new("leaf1", ms(&[])), Some(MembId::new("mid")));
    sys.add_membrane(Membrane::new("leaf2", ms(&[])), Some(MembId::new("mid")));

    step(&mut sys, 1).unwrap();

    let root = sys.membrane(&MembId::new("root")).unwrap();
    assert!(root.children.contains(&MembId::new("leaf1")));
    assert!(root.children.contains(&MembId::new("leaf2")));
    assert!(!root.children.contains(&MembId::new("mid")));
    assert_eq!(sys.membrane(&MembId::new("leaf1")).unwrap().parent, Some(MembId::new("root")));
    assert_eq!(sys.membrane(&MembId::new("leaf2")).unwrap().parent, Some(MembId::new("root")));
}

#[test]
fn dissolving_a_missing_target_is_a_silent_no_op() {
    let mut sys = System::new();
    let mut root = Membrane::new("root", ms(&[("d", 1)]));
    root.add_rule(Rule::dissolver(ms(&[("d", 1)]), 1, vec![MembId::new("ghost")]));
    sys.add_membrane(root, None);

    let result = step(&mut sys, 1).unwrap();
    assert!(result.dissolved.is_empty());
    assert!(sys.is_live(&MembId::new("root")));
}

#[test]
fn dissolving_the_root_is_a_silent_no_op() {
    let mut sys = System::new();
    let mut root = Membrane::new("root", ms(&[("d", 1)]));
    root.add_rule(Rule::dissolver(ms(&[("d", 1)]), 1, vec![MembId::new("root")]));
    sys.add_membrane(root, None);

    let result = step(&mut sys, 1).unwrap();
    assert!(result.dissolved.is_empty());
    assert!(sys.is_live(&MembId::new("root")));
}

#[test]
fn dissolving_the_designated_output_membrane_is_a_silent_no_op() {
    let mut sys = System::new();
    let mut root = Membrane::new("root", ms(&[("d", 1)]));
    root.add_rule(Rule::dissolver(ms(&[("d", 1)]), 1, vec![MembId::new("out")]));
    sys.add_membrane(root, None);
    sys.add_membrane(Membrane::new("out", ms(&[])), Some(MembId::new("root")));
    sys.output_id = Some(MembId::new("out"));

    let result = step(&mut sys, 1).unwrap();
    assert!(result.dissolved.is_empty());
    assert!(sys.is_live(&MembId::new("out")));
}
