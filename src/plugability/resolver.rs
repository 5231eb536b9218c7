//! Ordering Resolver
//!
//! Pure function from one point's extensions to a single valid total order.
//!
//! ## Algorithm
//!
//! 1. Keep active extensions. A `Single` point only considers fallbacks when
//!    no concrete extension is active; a `Multi` point keeps fallbacks as a
//!    trailing tier.
//! 2. Edge `A -> B` (A precedes B) for `A.before ∋ B`, `B.after ∋ A`, and for
//!    every concrete/fallback pair.
//! 3. Kahn's algorithm, always taking the ready node declared first.
//! 4. Leftover nodes mean a cycle, reported with its identity chain.
//! 5. `Single` points must end with exactly one extension.
//!
//! Constraints naming an identity that is absent or inactive at the point are
//! satisfied vacuously.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::point::Cardinality;
use crate::types::{ExtensionId, PluginError, PointId};

/// One extension as seen by the resolver, in declaration order
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub id: &'a ExtensionId,
    pub fallback: bool,
    pub active: bool,
    pub before: &'a [ExtensionId],
    pub after: &'a [ExtensionId],
}

/// Resolve the order of `candidates` (given in declaration order).
///
/// Returns indices into `candidates`.
pub fn resolve_order(
    point: &PointId,
    cardinality: Cardinality,
    candidates: &[Candidate<'_>],
) -> Result<Vec<usize>, PluginError> {
    let selected = select_participants(cardinality, candidates);
    let graph = PrecedenceGraph::build(point, candidates, &selected);

    let order = match graph.topological_order() {
        Ok(order) => order,
        Err(remaining) => {
            let cycle = graph
                .find_cycle(&remaining)
                .into_iter()
                .map(|node| candidates[selected[node]].id.to_string())
                .collect();
            return Err(PluginError::CyclicOrdering {
                point: point.to_string(),
                cycle,
            });
        }
    };

    let order: Vec<usize> = order.into_iter().map(|node| selected[node]).collect();

    if cardinality == Cardinality::Single && order.len() != 1 {
        if order.is_empty() {
            return Err(PluginError::NoActiveExtension {
                point: point.to_string(),
                inactive: candidates
                    .iter()
                    .filter(|c| !c.active)
                    .map(|c| c.id.to_string())
                    .collect(),
            });
        }
        return Err(PluginError::AmbiguousSingleExtension {
            point: point.to_string(),
            candidates: order
                .iter()
                .map(|&i| candidates[i].id.to_string())
                .collect(),
        });
    }

    Ok(order)
}

/// Indices of the extensions taking part in ordering, in declaration order
fn select_participants(cardinality: Cardinality, candidates: &[Candidate<'_>]) -> Vec<usize> {
    let active = candidates.iter().enumerate().filter(|(_, c)| c.active);

    match cardinality {
        Cardinality::Multi => active.map(|(i, _)| i).collect(),
        Cardinality::Single => {
            let (concrete, fallbacks): (Vec<_>, Vec<_>) = active.partition(|(_, c)| !c.fallback);
            let tier = if concrete.is_empty() { fallbacks } else { concrete };
            tier.into_iter().map(|(i, _)| i).collect()
        }
    }
}

/// Precedence graph over selected participants; node = position in `selected`
struct PrecedenceGraph {
    successors: Vec<BTreeSet<usize>>,
    predecessors: Vec<BTreeSet<usize>>,
}

impl PrecedenceGraph {
    fn build(point: &PointId, candidates: &[Candidate<'_>], selected: &[usize]) -> Self {
        let n = selected.len();
        let mut graph = Self {
            successors: vec![BTreeSet::new(); n],
            predecessors: vec![BTreeSet::new(); n],
        };

        let position: HashMap<&ExtensionId, usize> = selected
            .iter()
            .enumerate()
            .map(|(node, &i)| (candidates[i].id, node))
            .collect();

        for (node, &i) in selected.iter().enumerate() {
            let candidate = &candidates[i];

            for target in candidate.before {
                match position.get(target) {
                    Some(&other) => graph.add_edge(node, other),
                    None => debug!(
                        "{}: '{}' before '{}' is vacuous (not an active participant)",
                        point, candidate.id, target
                    ),
                }
            }

            for target in candidate.after {
                match position.get(target) {
                    Some(&other) => graph.add_edge(other, node),
                    None => debug!(
                        "{}: '{}' after '{}' is vacuous (not an active participant)",
                        point, candidate.id, target
                    ),
                }
            }

            if !candidate.fallback {
                for (other, &j) in selected.iter().enumerate() {
                    if candidates[j].fallback {
                        graph.add_edge(node, other);
                    }
                }
            }
        }

        graph
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        self.successors[from].insert(to);
        self.predecessors[to].insert(from);
    }

    /// Kahn's algorithm with declaration-order tie breaking.
    ///
    /// On failure returns the nodes that could not be placed.
    fn topological_order(&self) -> Result<Vec<usize>, BTreeSet<usize>> {
        let n = self.successors.len();
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(BTreeSet::len).collect();
        let mut ready: BTreeSet<usize> = (0..n).filter(|&node| in_degree[node] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for &next in &self.successors[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        if order.len() == n {
            Ok(order)
        } else {
            Err((0..n).filter(|&node| in_degree[node] > 0).collect())
        }
    }

    /// Find one cycle among nodes left over by Kahn's algorithm.
    ///
    /// Every leftover node has a leftover predecessor, so walking predecessors
    /// must revisit a node. Returned in precedence order, first node repeated
    /// at the end.
    fn find_cycle(&self, remaining: &BTreeSet<usize>) -> Vec<usize> {
        let Some(&start) = remaining.first() else {
            return Vec::new();
        };

        let mut walk = vec![start];
        let mut seen_at: HashMap<usize, usize> = HashMap::from([(start, 0)]);
        let mut current = start;

        loop {
            let Some(&previous) = self.predecessors[current]
                .iter()
                .find(|node| remaining.contains(node))
            else {
                return walk;
            };

            if let Some(&index) = seen_at.get(&previous) {
                let mut cycle: Vec<usize> = walk[index..].to_vec();
                cycle.reverse();
                cycle.push(cycle[0]);
                return cycle;
            }

            seen_at.insert(previous, walk.len());
            walk.push(previous);
            current = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug)]
    struct Spec {
        id: ExtensionId,
        fallback: bool,
        active: bool,
        before: Vec<ExtensionId>,
        after: Vec<ExtensionId>,
    }

    fn ext(name: &str) -> Spec {
        Spec {
            id: id(name),
            fallback: false,
            active: true,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    fn id(name: &str) -> ExtensionId {
        ExtensionId::new("test", name)
    }

    impl Spec {
        fn fallback(mut self) -> Self {
            self.fallback = true;
            self
        }

        fn inactive(mut self) -> Self {
            self.active = false;
            self
        }

        fn before(mut self, name: &str) -> Self {
            self.before.push(id(name));
            self
        }

        fn after(mut self, name: &str) -> Self {
            self.after.push(id(name));
            self
        }
    }

    fn resolve(cardinality: Cardinality, specs: &[Spec]) -> Result<Vec<String>, PluginError> {
        let candidates: Vec<Candidate<'_>> = specs
            .iter()
            .map(|s| Candidate {
                id: &s.id,
                fallback: s.fallback,
                active: s.active,
                before: &s.before,
                after: &s.after,
            })
            .collect();
        let point = PointId::new("test", "point");
        resolve_order(&point, cardinality, &candidates).map(|order| {
            order
                .into_iter()
                .map(|i| specs[i].id.name().to_string())
                .collect()
        })
    }

    #[test]
    fn test_multi_scenario_before_and_fallback() {
        let specs = [ext("X"), ext("Y").before("X"), ext("Z").fallback()];
        assert_eq!(resolve(Cardinality::Multi, &specs).unwrap(), ["Y", "X", "Z"]);
    }

    #[test]
    fn test_after_constraint() {
        let specs = [ext("A").after("B"), ext("B")];
        assert_eq!(resolve(Cardinality::Multi, &specs).unwrap(), ["B", "A"]);
    }

    #[test]
    fn test_single_prefers_concrete_over_fallback() {
        let specs = [ext("F").fallback(), ext("C")];
        assert_eq!(resolve(Cardinality::Single, &specs).unwrap(), ["C"]);
    }

    #[test]
    fn test_single_uses_lone_fallback() {
        let specs = [ext("F").fallback()];
        assert_eq!(resolve(Cardinality::Single, &specs).unwrap(), ["F"]);
    }

    #[test]
    fn test_single_ambiguous() {
        let specs = [ext("F").fallback(), ext("C"), ext("C2")];
        let err = resolve(Cardinality::Single, &specs).unwrap_err();
        assert_eq!(
            err,
            PluginError::AmbiguousSingleExtension {
                point: "test/point".to_string(),
                candidates: vec!["test/C".to_string(), "test/C2".to_string()],
            }
        );
    }

    #[test]
    fn test_single_with_two_fallbacks_is_ambiguous() {
        let specs = [ext("F1").fallback(), ext("F2").fallback()];
        assert!(matches!(
            resolve(Cardinality::Single, &specs),
            Err(PluginError::AmbiguousSingleExtension { .. })
        ));
    }

    #[test]
    fn test_single_without_active_extension() {
        let specs = [ext("C").inactive()];
        assert_eq!(
            resolve(Cardinality::Single, &specs).unwrap_err(),
            PluginError::NoActiveExtension {
                point: "test/point".to_string(),
                inactive: vec!["test/C".to_string()],
            }
        );
    }

    #[test]
    fn test_multi_may_be_empty() {
        assert!(resolve(Cardinality::Multi, &[]).unwrap().is_empty());
        let specs = [ext("A").inactive()];
        assert!(resolve(Cardinality::Multi, &specs).unwrap().is_empty());
    }

    #[test]
    fn test_inactive_constraint_is_vacuous() {
        let specs = [ext("D").inactive().before("E"), ext("E")];
        assert_eq!(resolve(Cardinality::Multi, &specs).unwrap(), ["E"]);
    }

    #[test]
    fn test_unknown_constraint_is_vacuous() {
        let specs = [ext("A").before("ghost").after("phantom"), ext("B")];
        assert_eq!(resolve(Cardinality::Multi, &specs).unwrap(), ["A", "B"]);
    }

    #[test]
    fn test_cycle_is_reported_with_chain() {
        let specs = [ext("A").before("B"), ext("B").before("A")];
        let (point, cycle) = match resolve(Cardinality::Multi, &specs) {
            Err(PluginError::CyclicOrdering { point, cycle }) => (point, cycle),
            other => panic!("expected cyclic ordering, got {other:?}"),
        };
        assert_eq!(point, "test/point");
        assert_eq!(cycle.len(), 3);
        assert_eq!(cycle.first(), cycle.last());
        assert!(cycle.contains(&"test/A".to_string()));
        assert!(cycle.contains(&"test/B".to_string()));
    }

    #[test]
    fn test_cycle_chain_follows_edges() {
        let specs = [
            ext("A").before("B"),
            ext("B").before("C"),
            ext("C").before("A"),
            ext("D"),
        ];
        let Err(PluginError::CyclicOrdering { cycle, .. }) = resolve(Cardinality::Multi, &specs)
        else {
            panic!("expected cyclic ordering");
        };
        let successor = |name: &str| match name {
            "test/A" => "test/B",
            "test/B" => "test/C",
            _ => "test/A",
        };
        for pair in cycle.windows(2) {
            assert_eq!(successor(&pair[0]), pair[1]);
        }
        assert!(!cycle.contains(&"test/D".to_string()));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let specs = [ext("A").before("A")];
        assert!(matches!(
            resolve(Cardinality::Multi, &specs),
            Err(PluginError::CyclicOrdering { .. })
        ));
    }

    #[test]
    fn test_fallback_ordered_ahead_of_concrete_is_a_cycle() {
        let specs = [ext("C"), ext("F").fallback().before("C")];
        assert!(matches!(
            resolve(Cardinality::Multi, &specs),
            Err(PluginError::CyclicOrdering { .. })
        ));
    }

    #[test]
    fn test_chained_preprocessors() {
        let specs = [
            ext("style"),
            ext("resources").before("style"),
            ext("search").before("resources"),
            ext("navigation").before("search"),
            ext("root").before("navigation"),
        ];
        assert_eq!(
            resolve(Cardinality::Multi, &specs).unwrap(),
            ["root", "navigation", "search", "resources", "style"]
        );
    }

    fn arbitrary_specs() -> impl Strategy<Value = Vec<Spec>> {
        (1usize..8).prop_flat_map(|n| {
            (
                proptest::collection::vec(any::<bool>(), n),
                proptest::collection::vec((0..n, 0..n), 0..12),
                Just(n),
            )
                .prop_map(|(fallbacks, pairs, n)| {
                    let mut specs: Vec<Spec> = (0..n)
                        .map(|i| {
                            let mut spec = ext(&format!("e{}", i));
                            spec.fallback = fallbacks[i];
                            spec
                        })
                        .collect();
                    // only lower index before higher index, so the constraints stay acyclic
                    for (a, b) in pairs {
                        if a < b {
                            let target = specs[b].id.name().to_string();
                            specs[a] = std::mem::replace(&mut specs[a], ext("tmp")).before(&target);
                        }
                    }
                    specs
                })
        })
    }

    proptest! {
        #[test]
        fn prop_unconstrained_order_is_declaration_order(n in 0usize..10) {
            let specs: Vec<Spec> = (0..n).map(|i| ext(&format!("e{}", i))).collect();
            let expected: Vec<String> = (0..n).map(|i| format!("e{}", i)).collect();
            prop_assert_eq!(resolve(Cardinality::Multi, &specs).unwrap(), expected);
        }

        #[test]
        fn prop_before_constraints_hold(specs in arbitrary_specs()) {
            if let Ok(order) = resolve(Cardinality::Multi, &specs) {
                let position = |name: &str| order.iter().position(|n| n == name);
                for spec in &specs {
                    for target in &spec.before {
                        let (Some(a), Some(b)) = (position(spec.id.name()), position(target.name())) else {
                            continue;
                        };
                        prop_assert!(a < b);
                    }
                }
            }
        }

        #[test]
        fn prop_fallbacks_never_precede_concrete(specs in arbitrary_specs()) {
            match resolve(Cardinality::Multi, &specs) {
                Ok(order) => {
                    let is_fallback = |name: &String| {
                        specs.iter().any(|s| s.id.name() == name && s.fallback)
                    };
                    let first_fallback = order.iter().position(is_fallback).unwrap_or(order.len());
                    prop_assert!(order[first_fallback..].iter().all(is_fallback));
                    prop_assert_eq!(order.len(), specs.len());
                }
                Err(err) => prop_assert!(
                    matches!(err, PluginError::CyclicOrdering { .. }),
                    "unexpected error"
                ),
            }
        }

        #[test]
        fn prop_resolution_is_deterministic(specs in arbitrary_specs()) {
            prop_assert_eq!(
                resolve(Cardinality::Multi, &specs),
                resolve(Cardinality::Multi, &specs)
            );
        }
    }
}
