//! Cycle membership in a directed graph.
//!
//! The traversal is an iterative depth-first search. Every stack entry
//! carries its own copy of the path that led to it, so backtracking needs
//! no bookkeeping. Reaching a node already on the current path marks every
//! node from its first occurrence on that path through the tip. Marked
//! nodes are never explored again and are not used as new starting points.
//!
//! The result is the union of all marked nodes: which nodes take part in
//! some cycle, not how they partition into distinct cycles.

use std::collections::{BTreeMap, BTreeSet};

/// Returns every node that lies on at least one cycle. Self-loops count.
///
/// Only nodes present as keys of `graph` are used as starting points;
/// neighbors missing from the keys are treated as having no outgoing edges.
///
/// # Example
/// ```rust
/// use schemadiag_core::cycles::nodes_in_cycles;
/// use std::collections::{BTreeMap, BTreeSet};
///
/// let graph = BTreeMap::from([
///     ("a", BTreeSet::from(["b"])),
///     ("b", BTreeSet::from(["a"])),
///     ("c", BTreeSet::from(["a"])),
/// ]);
/// assert_eq!(nodes_in_cycles(&graph), BTreeSet::from(["a", "b"]));
/// ```
pub fn nodes_in_cycles<N>(graph: &BTreeMap<N, BTreeSet<N>>) -> BTreeSet<N>
where
    N: Ord + Clone,
{
    let mut in_cycle: BTreeSet<N> = BTreeSet::new();

    for start in graph.keys() {
        if in_cycle.contains(start) {
            continue;
        }

        let mut stack: Vec<(N, Vec<N>)> = vec![(start.clone(), Vec::new())];
        while let Some((node, path)) = stack.pop() {
            if let Some(position) = path.iter().position(|n| *n == node) {
                in_cycle.extend(path[position..].iter().cloned());
                continue;
            }
            if in_cycle.contains(&node) {
                continue;
            }

            let Some(neighbors) = graph.get(&node) else {
                continue;
            };
            let mut next_path = path;
            next_path.push(node);
            // Reverse so neighbors are explored in ascending order.
            for neighbor in neighbors.iter().rev() {
                stack.push((neighbor.clone(), next_path.clone()));
            }
        }
    }

    in_cycle
}
