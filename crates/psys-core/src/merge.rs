//! System merger (`spec.md` §4.7, component C7).
use crate::ident::{Label, MembId};
use crate::membrane::{Membrane, System};
use crate::multiset::Multiset;

/// Merges `systems` into one: each input system's tree becomes a child
/// subtree of a fresh root labelled `root_id`, and every membrane id and
/// prototype label is renamed `"<root_label>_<i>_<old>"` (`i` = the input
/// system's position) to keep ids unique across the merged tree.
///
/// `output_id`, if given, is recorded on the merged root per `spec.md` §4.7
/// step 3 so the merged system still names an output membrane afterward.
///
/// `spec.md` §9 Q3: routing keys embedded in `right` multisets are **not**
/// rewritten by this pass. A product key like `x_in_m2` still names the
/// pre-merge id `m2`, which after renaming no longer resolves to a live
/// membrane; `engine::step` treats that the same as any other missing
/// routing target (a documented no-op). Callers who need cross-system
/// routing after a merge must rewrite those keys themselves before merging.
#[must_use]
pub fn merge(
    systems: Vec<System>,
    root_id: impl Into<MembId>,
    root_label: &str,
    output_id: Option<MembId>,
) -> System {
    let root_id = root_id.into();
    let mut merged = System::new();
    merged.add_membrane(Membrane::new(root_id.clone(), Multiset::new()), None);
    merged.output_id = output_id;

    for (i, system) in systems.into_iter().enumerate() {
        let prefix = format!("{root_label}_{i}_");
        let rename_memb = |old: &MembId| MembId::new(format!("{prefix}{}", old.as_str()));
        let rename_label = |old: &Label| Label::new(format!("{prefix}{}", old.as_str()));

        for (label, rules) in system.prototypes_owned() {
            merged.register_prototype(rename_label(&label), rules);
        }

        let mut roots_of_input = Vec::new();
        for memb in system.membranes_in_order() {
            let mut renamed = memb.clone();
            renamed.id = rename_memb(&memb.id);
            renamed.parent = memb.parent.as_ref().map(&rename_memb).or_else(|| Some(root_id.clone()));
            renamed.children = memb.children.iter().map(&rename_memb).collect();
            if memb.parent.is_none() {
                roots_of_input.push(renamed.id.clone());
            }
            merged.insert_raw(renamed);
        }
        for root_of_input in roots_of_input {
            if let Some(root) = merged.membrane_mut(&root_id) {
                root.children.push(root_of_input);
            }
        }
    }

    merged
}
