//! Structural validation of genomes.
//!
//! A genome is valid when:
//!
//! 1. it declares at least one node,
//! 2. every connection references nodes in `0..node_count`,
//! 3. every connection uses an operation from the genome's catalog,
//! 4. the connections form a DAG (a topological order exists),
//! 5. every node is reachable from the input node 0.
//!
//! Checks run in that order and the first failure is reported.

use super::types::{Genome, Operation};
use std::collections::VecDeque;

/// Reasons a genome is structurally unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenomeValidationError {
    #[error("genome declares zero nodes")]
    ZeroNodes,
    #[error("connection {connection} references node {node}, but the genome has {node_count} nodes")]
    DanglingNode {
        connection: usize,
        node: usize,
        node_count: usize,
    },
    #[error("connection {connection} uses {operation}, which is not in the genome's catalog")]
    UnknownOperation {
        connection: usize,
        operation: Operation,
    },
    #[error("connections contain a cycle through node {node}")]
    Cycle { node: usize },
    #[error("node {node} is not reachable from the input node")]
    Disconnected { node: usize },
}

/// Validates `genome` and returns a topological order of its nodes.
///
/// Ties in the order are broken by lowest node index, so the result is
/// deterministic.
pub fn validate(genome: &Genome) -> Result<Vec<usize>, GenomeValidationError> {
    let n = genome.node_count;
    if n == 0 {
        return Err(GenomeValidationError::ZeroNodes);
    }

    for (i, c) in genome.connections.iter().enumerate() {
        for node in [c.from, c.to] {
            if node >= n {
                return Err(GenomeValidationError::DanglingNode {
                    connection: i,
                    node,
                    node_count: n,
                });
            }
        }
        if !genome.operations.contains(&c.operation) {
            return Err(GenomeValidationError::UnknownOperation {
                connection: i,
                operation: c.operation,
            });
        }
    }

    let order = topological_order(genome)?;

    let reachable = reachable_from_input(genome);
    if let Some(node) = reachable.iter().position(|&r| !r) {
        return Err(GenomeValidationError::Disconnected { node });
    }

    Ok(order)
}

/// Kahn's algorithm with a min-index ready set.
fn topological_order(genome: &Genome) -> Result<Vec<usize>, GenomeValidationError> {
    let n = genome.node_count;
    let mut in_degree = vec![0usize; n];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for c in &genome.connections {
        in_degree[c.to] += 1;
        successors[c.from].push(c.to);
    }

    let mut ready: std::collections::BTreeSet<usize> =
        (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &next in &successors[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() < n {
        let node = (0..n)
            .find(|&i| in_degree[i] > 0)
            .expect("an unordered node always has remaining in-degree");
        return Err(GenomeValidationError::Cycle { node });
    }
    Ok(order)
}

fn reachable_from_input(genome: &Genome) -> Vec<bool> {
    let n = genome.node_count;
    let mut seen = vec![false; n];
    let mut queue = VecDeque::from([0usize]);
    seen[0] = true;
    while let Some(node) = queue.pop_front() {
        for c in genome.connections.iter().filter(|c| c.from == node) {
            if !seen[c.to] {
                seen[c.to] = true;
                queue.push_back(c.to);
            }
        }
    }
    seen
}

/// Length of the longest path from the input node, in non-skip edges.
///
/// `order` must be a topological order of `genome`, as returned by
/// [`validate`].
pub fn cell_depth(genome: &Genome, order: &[usize]) -> usize {
    let mut depth = vec![0usize; genome.node_count];
    for &node in order {
        for c in genome.incoming(node) {
            let step = usize::from(c.operation != Operation::Skip);
            depth[node] = depth[node].max(depth[c.from] + step);
        }
    }
    depth.into_iter().max().unwrap_or(0)
}
