//! Small graph utilities.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Order `nodes` so that every node comes after the nodes it depends on.
///
/// `deps` returns the dependencies of a node; dependencies that are not part of `nodes` are
/// ignored, so a node whose only dependencies are unknown is treated as a root. Ties are broken
/// by the original position in `nodes`, which keeps the result deterministic.
///
/// Returns `Err` with the nodes left over when the dependency graph has a cycle.
pub fn topological_sort<T, F, I>(nodes: &[T], mut deps: F) -> Result<Vec<T>, Vec<T>>
where
    T: Clone + Eq + Hash,
    F: FnMut(&T) -> I,
    I: IntoIterator<Item = T>,
{
    let index: HashMap<&T, usize> = nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();

    // in_degree[i] = number of known dependencies of nodes[i]
    let mut in_degree = vec![0usize; nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        for dep in deps(node) {
            let Some(&d) = index.get(&dep) else {
                continue;
            };
            if d == i {
                continue;
            }
            in_degree[i] += 1;
            dependents[d].push(i);
        }
    }

    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(i) = queue.pop_front() {
        order.push(i);
        let mut ready = Vec::new();
        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.push(dependent);
            }
        }
        ready.sort_unstable();
        queue.extend(ready);
    }

    if order.len() != nodes.len() {
        let remaining = (0..nodes.len())
            .filter(|i| in_degree[*i] > 0)
            .map(|i| nodes[i].clone())
            .collect();
        return Err(remaining);
    }

    Ok(order.into_iter().map(|i| nodes[i].clone()).collect())
}
