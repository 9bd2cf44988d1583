//! Structural description of one candidate architecture.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenomeId(pub u64);

impl fmt::Display for GenomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "genome_{}", self.0)
    }
}

/// Operation applied along a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Conv1x1,
    Conv3x3,
    Conv5x5,
    SepConv3x3,
    DilConv3x3,
    MaxPool,
    AvgPool,
    Skip,
}

impl Operation {
    /// Every operation the search space knows about.
    pub const ALL: [Operation; 8] = [
        Operation::Conv1x1,
        Operation::Conv3x3,
        Operation::Conv5x5,
        Operation::SepConv3x3,
        Operation::DilConv3x3,
        Operation::MaxPool,
        Operation::AvgPool,
        Operation::Skip,
    ];

    /// The default catalog: conv3x3, conv5x5, max-pool, avg-pool, skip.
    pub const DEFAULT_CATALOG: [Operation; 5] = [
        Operation::Conv3x3,
        Operation::Conv5x5,
        Operation::MaxPool,
        Operation::AvgPool,
        Operation::Skip,
    ];

    /// Spatial kernel size, or `None` for parameter-free identity.
    pub fn kernel_size(self) -> Option<usize> {
        match self {
            Operation::Conv1x1 => Some(1),
            Operation::Conv3x3 | Operation::SepConv3x3 | Operation::MaxPool | Operation::AvgPool => {
                Some(3)
            }
            Operation::DilConv3x3 => Some(5),
            Operation::Conv5x5 => Some(5),
            Operation::Skip => None,
        }
    }

    pub fn is_pooling(self) -> bool {
        matches!(self, Operation::MaxPool | Operation::AvgPool)
    }

    pub fn is_convolution(self) -> bool {
        matches!(
            self,
            Operation::Conv1x1
                | Operation::Conv3x3
                | Operation::Conv5x5
                | Operation::SepConv3x3
                | Operation::DilConv3x3
        )
    }

    /// Short name used in logs and exports.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Conv1x1 => "conv1x1",
            Operation::Conv3x3 => "conv3x3",
            Operation::Conv5x5 => "conv5x5",
            Operation::SepConv3x3 => "sep_conv3x3",
            Operation::DilConv3x3 => "dil_conv3x3",
            Operation::MaxPool => "maxpool",
            Operation::AvgPool => "avgpool",
            Operation::Skip => "skip",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Activation used throughout the cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Swish,
    Gelu,
}

impl Activation {
    pub const ALL: [Activation; 3] = [Activation::Relu, Activation::Swish, Activation::Gelu];

    /// Whether the activation is smooth (non-piecewise-linear).
    pub fn is_smooth(self) -> bool {
        !matches!(self, Activation::Relu)
    }
}

/// Directed edge `from -> to` carrying an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from: usize,
    pub to: usize,
    pub operation: Operation,
}

impl Connection {
    pub fn new(from: usize, to: usize, operation: Operation) -> Self {
        Self { from, to, operation }
    }
}

/// One candidate architecture.
///
/// The cell graph is a DAG over node indices `0..node_count` where node 0
/// is the cell input. The same cell is stacked `cells` times. `operations`
/// is the catalog this genome may draw from; every connection must use an
/// operation from it.
///
/// The identifier is fixed at creation; the structure is mutated in place
/// by the variation operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genome {
    id: GenomeId,
    pub cells: usize,
    pub node_count: usize,
    pub channels: usize,
    pub activation: Activation,
    pub batch_norm: bool,
    pub operations: Vec<Operation>,
    pub connections: Vec<Connection>,
}

impl Genome {
    /// Creates a genome with the given identity and no connections.
    pub fn new(id: GenomeId, node_count: usize, operations: Vec<Operation>) -> Self {
        Self {
            id,
            cells: 1,
            node_count,
            channels: 16,
            activation: Activation::Relu,
            batch_norm: true,
            operations,
            connections: Vec::new(),
        }
    }

    pub fn with_cells(mut self, cells: usize) -> Self {
        self.cells = cells;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_batch_norm(mut self, batch_norm: bool) -> Self {
        self.batch_norm = batch_norm;
        self
    }

    /// Adds a connection. No validation happens here; see
    /// [`validate`](crate::genome::validate).
    pub fn connect(mut self, from: usize, to: usize, operation: Operation) -> Self {
        self.connections.push(Connection::new(from, to, operation));
        self
    }

    pub fn id(&self) -> GenomeId {
        self.id
    }

    /// Returns a copy of this structure under a new identity.
    pub fn clone_as(&self, id: GenomeId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    /// Connections entering `node`, in declaration order.
    pub fn incoming(&self, node: usize) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.to == node)
    }

    /// The structure without the identifier. Equal keys mean the same
    /// architecture.
    pub fn structure_key(&self) -> StructureKey {
        StructureKey {
            cells: self.cells,
            node_count: self.node_count,
            channels: self.channels,
            activation: self.activation,
            batch_norm: self.batch_norm,
            operations: self.operations.clone(),
            connections: self.connections.clone(),
        }
    }
}

/// Identity-free copy of a genome's structure, usable as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructureKey {
    cells: usize,
    node_count: usize,
    channels: usize,
    activation: Activation,
    batch_norm: bool,
    operations: Vec<Operation>,
    connections: Vec<Connection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(id: u64) -> Genome {
        Genome::new(GenomeId(id), 3, Operation::DEFAULT_CATALOG.to_vec())
            .connect(0, 1, Operation::Conv3x3)
            .connect(1, 2, Operation::MaxPool)
    }

    #[test]
    fn test_structure_key_ignores_identity() {
        assert_eq!(chain(1).structure_key(), chain(2).structure_key());
    }

    #[test]
    fn test_structure_key_tracks_structure() {
        let a = chain(1);
        let b = chain(1).connect(0, 2, Operation::Skip);
        assert_ne!(a.structure_key(), b.structure_key());
        let mut wide = chain(1);
        wide.channels = 64;
        assert_ne!(a.structure_key(), wide.structure_key());
    }

    #[test]
    fn test_clone_as_keeps_structure() {
        let a = chain(1);
        let b = a.clone_as(GenomeId(9));
        assert_eq!(b.id(), GenomeId(9));
        assert_eq!(a.connections, b.connections);
    }

    #[test]
    fn test_incoming() {
        let g = chain(1).connect(0, 2, Operation::Skip);
        let into_two: Vec<_> = g.incoming(2).map(|c| c.from).collect();
        assert_eq!(into_two, vec![1, 0]);
    }

    #[test]
    fn test_operation_traits() {
        assert!(Operation::MaxPool.is_pooling());
        assert!(!Operation::Skip.is_convolution());
        assert_eq!(Operation::Conv5x5.kernel_size(), Some(5));
        assert_eq!(Operation::Skip.kernel_size(), None);
    }
}
