//! Genetic operators for architecture genomes.
//!
//! All operators draw from a caller-supplied random source and never touch
//! global state, so a seeded run is reproducible.
//!
//! # Initialization
//!
//! - [`random_genome`]: forward-wired random DAG, valid by construction
//!
//! # Crossover
//!
//! - [`crossover`]: per-node uniform crossover of incoming connection sets.
//!   Each node of the child inherits all of its incoming edges (and their
//!   operations) from one parent, so the child stays connected whenever the
//!   parents are forward-wired.
//!
//! # Mutation
//!
//! - [`mutate`]: one of (a) swap the operation of one connection, (b) rewire
//!   the source endpoint of one connection, (c) grow or shrink the node count
//!   by one.

use super::types::{Activation, Connection, Genome, GenomeId, Operation};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Bounds of the architecture space sampled by [`random_genome`] and kept by
/// [`mutate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSpace {
    /// Minimum nodes per cell (inclusive).
    pub min_nodes: usize,
    /// Maximum nodes per cell (inclusive).
    pub max_nodes: usize,
    /// Minimum stacked cells (inclusive).
    pub min_cells: usize,
    /// Maximum stacked cells (inclusive).
    pub max_cells: usize,
    /// Channel widths a genome may use.
    pub channel_choices: Vec<usize>,
    /// Operation catalog new genomes draw from.
    pub operations: Vec<Operation>,
    /// Probability of one extra incoming edge per node at initialization.
    pub extra_edge_probability: f64,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            min_nodes: 3,
            max_nodes: 10,
            min_cells: 3,
            max_cells: 7,
            channel_choices: vec![16, 32, 48, 64, 96, 128],
            operations: Operation::DEFAULT_CATALOG.to_vec(),
            extra_edge_probability: 0.3,
        }
    }
}

impl SearchSpace {
    /// Checks the bounds; returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_nodes < 2 {
            return Err("min_nodes must be at least 2".into());
        }
        if self.min_nodes > self.max_nodes {
            return Err("min_nodes exceeds max_nodes".into());
        }
        if self.min_cells == 0 || self.min_cells > self.max_cells {
            return Err("cell range must be non-empty and start at 1 or more".into());
        }
        if self.channel_choices.is_empty() || self.channel_choices.contains(&0) {
            return Err("channel_choices must be non-empty and positive".into());
        }
        if self.operations.is_empty() {
            return Err("operation catalog is empty".into());
        }
        for (i, op) in self.operations.iter().enumerate() {
            if self.operations[..i].contains(op) {
                return Err(format!("operation catalog lists {op:?} twice"));
            }
        }
        if !(0.0..=1.0).contains(&self.extra_edge_probability) {
            return Err("extra_edge_probability must be within [0, 1]".into());
        }
        Ok(())
    }
}

/// Which variation [`mutate`] applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Operation,
    Endpoint,
    GrowNode,
    ShrinkNode,
    /// Nothing could be changed (e.g. a one-operation catalog on a genome
    /// already at both node bounds).
    None,
}

fn pick<T: Copy, R: Rng>(items: &[T], rng: &mut R) -> T {
    items[rng.random_range(0..items.len())]
}

/// Samples a random, valid genome from `space`.
///
/// Every node `t > 0` receives one edge from a uniformly chosen earlier
/// node, plus (with `extra_edge_probability`) a second one, so the result
/// is acyclic and fully reachable from node 0.
///
/// # Panics
/// Panics if `space` fails [`SearchSpace::validate`].
pub fn random_genome<R: Rng>(id: GenomeId, space: &SearchSpace, rng: &mut R) -> Genome {
    debug_assert!(space.validate().is_ok(), "invalid search space");

    let node_count = rng.random_range(space.min_nodes..=space.max_nodes);
    let mut genome = Genome::new(id, node_count, space.operations.clone())
        .with_cells(rng.random_range(space.min_cells..=space.max_cells))
        .with_channels(pick(&space.channel_choices, rng))
        .with_activation(pick(&Activation::ALL, rng))
        .with_batch_norm(rng.random_bool(0.7));

    for to in 1..node_count {
        let from = rng.random_range(0..to);
        genome
            .connections
            .push(Connection::new(from, to, pick(&space.operations, rng)));

        if to > 1 && rng.random_bool(space.extra_edge_probability) {
            let extra = rng.random_range(0..to);
            if extra != from {
                genome
                    .connections
                    .push(Connection::new(extra, to, pick(&space.operations, rng)));
            }
        }
    }

    genome
}

/// Produces one child from two parents.
///
/// The child's node count comes from one parent; each node's incoming
/// connection set comes from either parent (falling back to the other when
/// the chosen one has no forward edge into that node). Cells, width,
/// activation and normalization are each inherited from a random parent.
/// The child's catalog is the union of both catalogs.
pub fn crossover<R: Rng>(id: GenomeId, a: &Genome, b: &Genome, rng: &mut R) -> Genome {
    let node_count = if rng.random_bool(0.5) {
        a.node_count
    } else {
        b.node_count
    };

    let mut operations: Vec<Operation> = a
        .operations
        .iter()
        .chain(b.operations.iter())
        .copied()
        .collect();
    operations.sort();
    operations.dedup();

    let mut child = Genome::new(id, node_count, operations)
        .with_cells(if rng.random_bool(0.5) { a.cells } else { b.cells })
        .with_channels(if rng.random_bool(0.5) { a.channels } else { b.channels })
        .with_activation(if rng.random_bool(0.5) {
            a.activation
        } else {
            b.activation
        })
        .with_batch_norm(if rng.random_bool(0.5) {
            a.batch_norm
        } else {
            b.batch_norm
        });

    for to in 1..node_count {
        let (first, second) = if rng.random_bool(0.5) { (a, b) } else { (b, a) };
        let mut inherited = forward_incoming(first, to);
        if inherited.is_empty() {
            inherited = forward_incoming(second, to);
        }
        if inherited.is_empty() {
            let op = pick(&child.operations, rng);
            inherited.push(Connection::new(to - 1, to, op));
        }
        child.connections.extend(inherited);
    }

    child
}

fn forward_incoming(genome: &Genome, to: usize) -> Vec<Connection> {
    genome
        .incoming(to)
        .filter(|c| c.from < to)
        .copied()
        .collect()
}

/// Applies one random structural mutation in place.
///
/// The three mutation families (operation, endpoint, node count) are
/// equally likely. A family that cannot apply falls through to the next
/// one that can.
pub fn mutate<R: Rng>(genome: &mut Genome, space: &SearchSpace, rng: &mut R) -> MutationKind {
    let start = rng.random_range(0..3usize);
    for offset in 0..3 {
        let applied = match (start + offset) % 3 {
            0 => mutate_operation(genome, rng),
            1 => mutate_endpoint(genome, rng),
            _ => mutate_node_count(genome, space, rng),
        };
        if applied != MutationKind::None {
            return applied;
        }
    }
    MutationKind::None
}

fn mutate_operation<R: Rng>(genome: &mut Genome, rng: &mut R) -> MutationKind {
    if genome.connections.is_empty() || genome.operations.len() < 2 {
        return MutationKind::None;
    }
    let idx = rng.random_range(0..genome.connections.len());
    let current = genome.connections[idx].operation;
    let choices: Vec<Operation> = genome
        .operations
        .iter()
        .copied()
        .filter(|&op| op != current)
        .collect();
    if choices.is_empty() {
        return MutationKind::None;
    }
    genome.connections[idx].operation = pick(&choices, rng);
    MutationKind::Operation
}

/// Rewires the source of a connection to another earlier node, which keeps
/// a forward-wired genome acyclic and connected.
fn mutate_endpoint<R: Rng>(genome: &mut Genome, rng: &mut R) -> MutationKind {
    let candidates: Vec<usize> = genome
        .connections
        .iter()
        .enumerate()
        .filter(|(_, c)| c.to > 1 && c.from < c.to)
        .map(|(i, _)| i)
        .collect();
    if candidates.is_empty() {
        return MutationKind::None;
    }
    let idx = pick(&candidates, rng);
    let conn = genome.connections[idx];
    let mut from = rng.random_range(0..conn.to - 1);
    if from >= conn.from {
        from += 1;
    }
    genome.connections[idx].from = from;
    MutationKind::Endpoint
}

fn mutate_node_count<R: Rng>(genome: &mut Genome, space: &SearchSpace, rng: &mut R) -> MutationKind {
    let can_grow = genome.node_count < space.max_nodes && !genome.operations.is_empty();
    let can_shrink = genome.node_count > space.min_nodes.max(1);

    let grow = match (can_grow, can_shrink) {
        (false, false) => return MutationKind::None,
        (true, false) => true,
        (false, true) => false,
        (true, true) => rng.random_bool(0.5),
    };

    if grow {
        let new_node = genome.node_count;
        let from = rng.random_range(0..new_node);
        let op = pick(&genome.operations, rng);
        genome.node_count += 1;
        genome.connections.push(Connection::new(from, new_node, op));
        MutationKind::GrowNode
    } else {
        let removed = genome.node_count - 1;
        genome.node_count -= 1;
        genome
            .connections
            .retain(|c| c.from != removed && c.to != removed);
        MutationKind::ShrinkNode
    }
}
