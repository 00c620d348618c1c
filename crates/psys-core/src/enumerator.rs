//! Maximal application vector enumeration (`spec.md` §4.3, component C4).
use crate::multiset::{MaxApps, Multiset};
use crate::rule::Rule;

/// One maximal application vector: `(rule_index, times_applied)` pairs for
/// every rule that fires at least once, in ascending rule-index order.
pub type AppVector = Vec<(usize, u64)>;

/// Enumerates every maximal application vector for `rules` against `bag`.
///
/// A vector `v` is *applicable* if its weighted sum of left-hand sides fits
/// in `bag`, and *maximal* if no single rule's count in `v` could be
/// incremented by one without exceeding `bag`. This is depth-first
/// backtracking over rule indices: at each rule, try every count from its
/// resource bound down to zero against the bag remaining after earlier
/// rules in the list, then at a complete assignment verify no rule can
/// still be incremented.
///
/// Per `spec.md` §9's Design Note, duplicate vectors reachable by different
/// branch orderings are **not** deduplicated: the caller picks uniformly at
/// random from the raw list, so duplicates are a (documented) bias toward
/// vectors reachable by more orderings, not a correctness bug.
///
/// An empty-left rule ([`MaxApps::Unconstrained`]) contributes at most a
/// single application per vector, never more (`spec.md` §4.1).
#[must_use]
pub fn enumerate_maximals(rules: &[Rule], bag: &Multiset) -> Vec<AppVector> {
    let mut out = Vec::new();
    let mut acc = vec![0u64; rules.len()];
    backtrack(rules, bag, 0, &mut acc, &mut out);
    out
}

fn backtrack(
    rules: &[Rule],
    remaining: &Multiset,
    index: usize,
    acc: &mut Vec<u64>,
    out: &mut Vec<AppVector>,
) {
    if index == rules.len() {
        if is_maximal(rules, remaining, acc) {
            let vector = acc
                .iter()
                .enumerate()
                .filter(|(_, &n)| n > 0)
                .map(|(i, &n)| (i, n))
                .collect();
            out.push(vector);
        }
        return;
    }

    let bound = match remaining.max_apps(&rules[index].left) {
        MaxApps::Bounded(n) => n,
        MaxApps::Unconstrained => 1,
    };

    for k in (0..=bound).rev() {
        let consumed = rules[index].left.scale(k);
        let next_bag = remaining.sub_floor(&consumed);
        acc[index] = k;
        backtrack(rules, &next_bag, index + 1, acc, out);
    }
    acc[index] = 0;
}

/// `true` if no rule in `rules` could have its count in `acc` raised by one
/// given `remaining` (the bag left after every rule in `acc` has fired its
/// assigned count).
fn is_maximal(rules: &[Rule], remaining: &Multiset, acc: &[u64]) -> bool {
    rules.iter().enumerate().all(|(i, rule)| match remaining.max_apps(&rule.left) {
        MaxApps::Bounded(extra) => extra == 0,
        // An empty-left rule is always "incrementable" by its own bound,
        // but spec.md caps it at one shot per vector: treat a vector that
        // already applied it once as exhausted.
        MaxApps::Unconstrained => acc[i] >= 1,
    })
}
