//! The maximal-parallel step engine (`spec.md` §4.4-4.6, component C5).
use std::collections::BTreeMap;

use tracing::instrument;

use crate::enumerator::{enumerate_maximals, AppVector};
use crate::error::EngineError;
use crate::ident::{Label, MembId, RouteTarget};
use crate::membrane::{Membrane, System};
use crate::multiset::{MaxApps, Multiset};
use crate::rng::Prng;
use crate::rule::Rule;

/// What one [`step`] call committed, keyed by membrane for the recorder
/// (`spec.md` §6).
#[derive(Clone, Debug, Default)]
pub struct StepResult {
    /// Application vector each membrane committed this step (original rule
    /// indices into that membrane's rule list), keyed by the membrane's
    /// pre-step (snapshot) id.
    pub applications: BTreeMap<MembId, AppVector>,
    /// Resources routed into each membrane this step.
    pub net_production: BTreeMap<MembId, Multiset>,
    /// Post-consumption, pre-production resources for each membrane that
    /// existed at the start of the step (`spec.md` §4.5), keyed by its
    /// snapshot id. A membrane dissolved or divided away this step still
    /// has an entry here.
    pub consumed: BTreeMap<MembId, Multiset>,
    /// `(parent_id, new_id)` pairs, one per membrane instantiated this step
    /// — prototype creations and division offspring alike (`spec.md` §4.5).
    pub created: Vec<(MembId, MembId)>,
    /// Ids of membranes dissolved this step, including divided-away
    /// membranes (`spec.md` §4.5's `division_victims`).
    pub dissolved: Vec<MembId>,
}

/// Advances `system` by one maximal-parallel timestep, seeded by `seed`.
///
/// Runs the four commit phases of `spec.md` §4.5 in order — select, produce
/// & route, dissolve, create/divide — each phase reading only state
/// committed by the phase before it. The same `(system, seed)` always
/// produces the same result (`spec.md` §5, property P6).
///
/// # Errors
/// Returns [`EngineError`] if a creator rule names an unregistered
/// prototype, or a product key fails to parse (`spec.md` §7). Neither
/// failure leaves `system` partially mutated: both are detected during
/// phase 1/2 validation before any phase commits.
#[instrument(skip(system), fields(step_seed = seed))]
pub fn step(system: &mut System, seed: u64) -> Result<StepResult, EngineError> {
    let mut prng = Prng::from_seed_u64(seed);

    let ids: Vec<MembId> = system.ids_in_order().cloned().collect();

    // Phase 1: select, independently per membrane, off pre-step resources.
    // The pre-step snapshot is also kept around for phase 4: a divider
    // rule's offspring are seeded from the membrane's resources as they
    // stood here, not from anything phase 2 writes back.
    let mut selected: BTreeMap<MembId, AppVector> = BTreeMap::new();
    let mut pre_step: BTreeMap<MembId, Multiset> = BTreeMap::new();
    for id in &ids {
        let memb = system.membrane(id).expect("id came from ids_in_order");
        let vector = select_for_membrane(&memb.rules, &memb.resources, &mut prng);
        selected.insert(id.clone(), vector);
        pre_step.insert(id.clone(), memb.resources.clone());
    }

    // Validate routing keys and prototype references before committing
    // anything, so a malformed rule never leaves the system half-stepped.
    for id in &ids {
        let memb = system.membrane(id).expect("id came from ids_in_order");
        let vector = &selected[id];
        for &(idx, count) in vector {
            if count == 0 {
                continue;
            }
            let rule = &memb.rules[idx];
            if rule.divide.is_some() {
                continue;
            }
            for (key, _) in rule.right.iter() {
                crate::ident::parse_route(key.as_str())
                    .map_err(|bad| EngineError::MalformedRoutingKey(bad.to_string()))?;
            }
            for (label, _) in &rule.create {
                if system.prototype(label).is_none() {
                    return Err(EngineError::PrototypeMissing(label.clone()));
                }
            }
        }
    }

    // Phase 2: consume reactants, route products.
    let mut incoming: BTreeMap<MembId, Multiset> = ids.iter().map(|id| (id.clone(), Multiset::new())).collect();
    let mut net_production: BTreeMap<MembId, Multiset> = BTreeMap::new();
    let mut consumed_map: BTreeMap<MembId, Multiset> = BTreeMap::new();

    for id in &ids {
        let vector = selected[id].clone();
        let memb = system.membrane(id).expect("id came from ids_in_order");
        let parent = memb.parent.clone();

        let mut consumed = Multiset::new();
        for &(idx, count) in &vector {
            if count == 0 {
                continue;
            }
            let rule = &memb.rules[idx];
            if rule.divide.is_some() {
                continue;
            }
            consumed = consumed.add(&rule.left.scale(count));

            for (key, amount) in rule.right.iter() {
                let (base, target) = crate::ident::parse_route(key.as_str())
                    .expect("validated in the pre-commit pass above");
                let dest = match target {
                    RouteTarget::Local => Some(id.clone()),
                    RouteTarget::Parent => parent.clone(),
                    RouteTarget::Named(mid) => system.is_live(&mid).then_some(mid),
                };
                let Some(dest) = dest else { continue };
                let produced = Multiset::from_pairs([(base.as_str(), *amount * count)]);
                incoming.entry(dest).and_modify(|m| *m = m.add(&produced)).or_insert(produced);
            }
        }

        let memb_mut = system.membrane_mut(id).expect("id came from ids_in_order");
        memb_mut.resources = memb_mut.resources.sub_floor(&consumed);
        consumed_map.insert(id.clone(), memb_mut.resources.clone());
    }

    for (id, produced) in &incoming {
        if let Some(memb_mut) = system.membrane_mut(id) {
            memb_mut.resources = memb_mut.resources.add(produced);
        }
        net_production.insert(id.clone(), produced.clone());
    }

    // Phase 3: dissolve. Targets are collected in membrane/vector order,
    // then committed once each; dissolving a missing id, the root, or the
    // designated output membrane is a documented no-op (`spec.md` §7, I4).
    let mut dissolve_targets: Vec<MembId> = Vec::new();
    for id in &ids {
        let memb = system.membrane(id).expect("id came from ids_in_order");
        for &(idx, count) in &selected[id] {
            if count == 0 {
                continue;
            }
            let rule = &memb.rules[idx];
            if rule.divide.is_some() {
                continue;
            }
            for target in &rule.dissolve {
                if !dissolve_targets.contains(target) {
                    dissolve_targets.push(target.clone());
                }
            }
        }
    }

    let mut dissolved = Vec::new();
    for target in dissolve_targets {
        if dissolve_one(system, &target) {
            dissolved.push(target);
        }
    }

    // Phase 4: create and divide, both reading only post-dissolve state.
    // A membrane dissolved in phase 3 no longer exists here, so its create
    // entries never fire (`spec.md` §9 Q4: dissolve commits before create).
    let mut created: Vec<(MembId, MembId)> = Vec::new();
    for id in &ids {
        if !system.is_live(id) {
            continue;
        }
        let vector = selected[id].clone();
        let rules: Vec<Rule> = system.membrane(id).expect("checked live above").rules.clone();

        for &(idx, count) in &vector {
            if count == 0 {
                continue;
            }
            let rule = &rules[idx];
            if rule.divide.is_some() {
                if system.is_live(id) {
                    if let Some((child_a, child_b)) =
                        divide_membrane(system, id, rule, count, &pre_step[id], &mut prng)
                    {
                        dissolved.push(id.clone());
                        created.push(child_a);
                        created.push(child_b);
                    }
                }
            } else {
                for _ in 0..count {
                    for (label, initial) in &rule.create {
                        let new_id = create_child(system, id, label, initial, &mut prng)?;
                        created.push((id.clone(), new_id));
                    }
                }
            }
            if !system.is_live(id) {
                // A divider rule just replaced this membrane; the rest of
                // its application vector has nothing left to act on.
                break;
            }
        }
    }

    Ok(StepResult { applications: selected, net_production, consumed: consumed_map, created, dissolved })
}

fn select_for_membrane(rules: &[Rule], bag: &Multiset, prng: &mut Prng) -> AppVector {
    let mut priorities: Vec<i64> = rules.iter().map(|r| r.priority).collect();
    priorities.sort_unstable_by(|a, b| b.cmp(a));
    priorities.dedup();

    for priority in priorities {
        let indices: Vec<usize> =
            rules.iter().enumerate().filter(|(_, r)| r.priority == priority).map(|(i, _)| i).collect();
        let class_rules: Vec<Rule> = indices.iter().map(|&i| rules[i].clone()).collect();

        let any_applicable = class_rules
            .iter()
            .any(|r| !matches!(bag.max_apps(&r.left), MaxApps::Bounded(0)));
        if !any_applicable {
            continue;
        }

        let vectors: Vec<AppVector> =
            enumerate_maximals(&class_rules, bag).into_iter().filter(|v| !v.is_empty()).collect();
        if vectors.is_empty() {
            continue;
        }

        let choice = prng.next_int(0, (vectors.len() - 1) as i32) as usize;
        return vectors[choice].iter().map(|&(local, count)| (indices[local], count)).collect();
    }

    Vec::new()
}

/// Dissolves `target` if live, not the root, and not the designated output
/// membrane: merges its resources into its parent and reparents its
/// children. Returns `true` if a dissolution actually happened.
fn dissolve_one(system: &mut System, target: &MembId) -> bool {
    if !system.is_live(target) {
        return false;
    }
    if system.output_id.as_ref() == Some(target) {
        return false;
    }
    let Some(memb) = system.membrane(target) else { return false };
    let Some(parent_id) = memb.parent.clone() else { return false };
    let children = memb.children.clone();
    let resources = memb.resources.clone();

    if let Some(parent) = system.membrane_mut(&parent_id) {
        parent.resources = parent.resources.add(&resources);
        parent.children.retain(|c| c != target);
        for child in &children {
            parent.children.push(child.clone());
        }
    }
    for child in &children {
        if let Some(child_memb) = system.membrane_mut(child) {
            child_memb.parent = Some(parent_id.clone());
        }
    }
    system.remove_raw(target);
    true
}

/// Draws ids from `gen` until one names neither a live membrane nor a
/// member of `avoid`, per `spec.md` §4.5's "generators must be
/// collision-free against the live id set (retry on collision)".
fn fresh_id(system: &System, avoid: &[MembId], mut gen: impl FnMut() -> MembId) -> MembId {
    loop {
        let candidate = gen();
        if !system.is_live(&candidate) && !avoid.contains(&candidate) {
            return candidate;
        }
    }
}

fn create_child(
    system: &mut System,
    parent_id: &MembId,
    label: &Label,
    initial: &Multiset,
    prng: &mut Prng,
) -> Result<MembId, EngineError> {
    let proto_rules = system
        .prototype(label)
        .ok_or_else(|| EngineError::PrototypeMissing(label.clone()))?
        .clone();
    let new_id = fresh_id(system, &[], || parent_id.derive_for_prototype(label, &prng.next_hex8()));

    let mut child = Membrane::new(new_id.clone(), initial.clone());
    child.rules = proto_rules;
    child.parent = Some(parent_id.clone());
    system.insert_raw(child);
    if let Some(parent) = system.membrane_mut(parent_id) {
        parent.children.push(new_id.clone());
    }
    Ok(new_id)
}

/// Replaces `target` with two siblings under `target`'s former parent, each
/// seeded with `base = sub_floor(pre_step_resources, scale(rule.left,
/// count))` augmented by the divider's `v`/`w` shares and inheriting
/// `target`'s rules (`spec.md` §4.2, §4.5). Returns the `(parent, new_id)`
/// pair for each offspring. A rootless `target` (no parent) cannot divide
/// without producing two tree roots, so division at the root is a
/// documented no-op.
fn divide_membrane(
    system: &mut System,
    target: &MembId,
    rule: &Rule,
    count: u64,
    pre_step_resources: &Multiset,
    prng: &mut Prng,
) -> Option<((MembId, MembId), (MembId, MembId))> {
    let (v, w) = rule.divide.clone()?;
    let memb = system.membrane(target)?;
    let parent_id = memb.parent.clone()?;
    let rules = memb.rules.clone();

    let base = pre_step_resources.sub_floor(&rule.left.scale(count));
    let resources_a = base.add(&v);
    let resources_b = base.add(&w);

    let id_a = fresh_id(system, &[], || target.derive_for_division(&prng.next_hex8()));
    let id_b = fresh_id(system, std::slice::from_ref(&id_a), || target.derive_for_division(&prng.next_hex8()));

    let mut child_a = Membrane::new(id_a.clone(), resources_a);
    child_a.rules = rules.clone();
    child_a.parent = Some(parent_id.clone());
    let mut child_b = Membrane::new(id_b.clone(), resources_b);
    child_b.rules = rules;
    child_b.parent = Some(parent_id.clone());

    system.remove_raw(target);
    if let Some(parent) = system.membrane_mut(&parent_id) {
        parent.children.retain(|c| c != target);
        parent.children.push(id_a.clone());
        parent.children.push(id_b.clone());
    }
    system.insert_raw(child_a);
    system.insert_raw(child_b);

    Some(((parent_id.clone(), id_a), (parent_id, id_b)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::multiset::Multiset;

    fn ms(pairs: &[(&str, u64)]) -> Multiset {
        Multiset::from_pairs(pairs.iter().map(|(s, n)| (*s, *n)))
    }

    #[test]
    fn plain_rewrite_consumes_and_produces_locally() {
        let mut sys = System::new();
        let mut root = Membrane::new("root", ms(&[("a", 4)]));
        root.add_rule(Rule::rewrite(ms(&[("a", 1)]), ms(&[("b", 2)]), 1));
        sys.add_membrane(root, None);

        let result = step(&mut sys, 1).unwrap();
        let root = sys.membrane(&MembId::new("root")).unwrap();
        assert_eq!(root.resources.get(&crate::ident::Symbol::new("a")), 0);
        assert_eq!(root.resources.get(&crate::ident::Symbol::new("b")), 8);
        assert!(result.dissolved.is_empty());
        assert!(result.created.is_empty());
    }

    #[test]
    fn out_routes_to_parent() {
        let mut sys = System::new();
        sys.add_membrane(Membrane::new("root", ms(&[])), None);
        let mut child = Membrane::new("child", ms(&[("a", 1)]));
        child.add_rule(Rule::rewrite(ms(&[("a", 1)]), ms(&[("x_out", 1)]), 1));
        sys.add_membrane(child, Some(MembId::new("root")));

        step(&mut sys, 1).unwrap();
        let root = sys.membrane(&MembId::new("root")).unwrap();
        assert_eq!(root.resources.get(&crate::ident::Symbol::new("x")), 1);
    }

    #[test]
    fn dissolve_merges_resources_into_parent_and_reparents_children() {
        let mut sys = System::new();
        let mut root = Membrane::new("root", ms(&[("d", 1)]));
        root.add_rule(Rule::dissolver(ms(&[("d", 1)]), 1, vec![MembId::new("mid")]));
        sys.add_membrane(root, None);
        sys.add_membrane(Membrane::new("mid", ms(&[("r", 3)])), Some(MembId::new("root")));
        sys.add_membrane(Membrane::new("leaf", ms(&[])), Some(MembId::new("mid")));

        let result = step(&mut sys, 1).unwrap();
        assert_eq!(result.dissolved, vec![MembId::new("mid")]);
        assert!(!sys.is_live(&MembId::new("mid")));
        let root = sys.membrane(&MembId::new("root")).unwrap();
        assert_eq!(root.resources.get(&crate::ident::Symbol::new("r")), 3);
        assert!(root.children.contains(&MembId::new("leaf")));
        let leaf = sys.membrane(&MembId::new("leaf")).unwrap();
        assert_eq!(leaf.parent, Some(MembId::new("root")));
    }

    #[test]
    fn creator_rule_instantiates_registered_prototype() {
        let mut sys = System::new();
        sys.register_prototype("cell", vec![Rule::rewrite(ms(&[("p", 1)]), ms(&[("q", 1)]), 1)]);
        let mut root = Membrane::new("root", ms(&[("c", 1)]));
        root.add_rule(Rule::creator(
            ms(&[("c", 1)]),
            1,
            vec![(crate::ident::Label::new("cell"), ms(&[("p", 5)]))],
        ));
        sys.add_membrane(root, None);

        let result = step(&mut sys, 1).unwrap();
        assert_eq!(result.created.len(), 1);
        assert_eq!(result.created[0].0, MembId::new("root"));
        assert_eq!(sys.len(), 2);
        let root = sys.membrane(&MembId::new("root")).unwrap();
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn missing_prototype_is_rejected_before_any_commit() {
        let mut sys = System::new();
        let mut root = Membrane::new("root", ms(&[("c", 1)]));
        root.add_rule(Rule::creator(
            ms(&[("c", 1)]),
            1,
            vec![(crate::ident::Label::new("ghost"), ms(&[]))],
        ));
        sys.add_membrane(root, None);

        let err = step(&mut sys, 1).unwrap_err();
        assert_eq!(err, EngineError::PrototypeMissing(crate::ident::Label::new("ghost")));
        let root = sys.membrane(&MembId::new("root")).unwrap();
        assert_eq!(root.resources.get(&crate::ident::Symbol::new("c")), 1);
    }

    #[test]
    fn divider_offspring_inherit_the_pre_step_base_plus_their_own_share() {
        let mut sys = System::new();
        sys.add_membrane(Membrane::new("root", ms(&[])), None);
        let mut cell = Membrane::new("cell", ms(&[("a", 4)]));
        cell.add_rule(Rule::divider(ms(&[("a", 2)]), 1, ms(&[("b", 1)]), ms(&[("c", 1)])));
        sys.add_membrane(cell, Some(MembId::new("root")));

        let result = step(&mut sys, 1).unwrap();
        assert_eq!(result.dissolved, vec![MembId::new("cell")]);
        assert_eq!(result.created.len(), 2);

        let root = sys.membrane(&MembId::new("root")).unwrap();
        assert_eq!(root.children.len(), 2);
        let mut saw_b = false;
        let mut saw_c = false;
        for child_id in &root.children {
            let child = sys.membrane(child_id).unwrap();
            assert_eq!(child.resources.get(&crate::ident::Symbol::new("a")), 2);
            if child.resources.get(&crate::ident::Symbol::new("b")) == 1 {
                saw_b = true;
            }
            if child.resources.get(&crate::ident::Symbol::new("c")) == 1 {
                saw_c = true;
            }
        }
        assert!(saw_b && saw_c);
    }

    #[test]
    fn same_seed_same_result() {
        let build = || {
            let mut sys = System::new();
            let mut root = Membrane::new("root", ms(&[("a", 9), ("b", 9)]));
            root.add_rule(Rule::rewrite(ms(&[("a", 1)]), ms(&[("x", 1)]), 1));
            root.add_rule(Rule::rewrite(ms(&[("b", 1)]), ms(&[("y", 1)]), 1));
            sys.add_membrane(root, None);
            sys
        };

        let mut a = build();
        let mut b = build();
        step(&mut a, 7).unwrap();
        step(&mut b, 7).unwrap();
        assert_eq!(a.membrane(&MembId::new("root")), b.membrane(&MembId::new("root")));
    }
}
