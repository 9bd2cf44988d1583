//! Architectural features and structural traits of a genome.

use crate::genome::{cell_depth, validate, Genome, Operation};
use serde::Serialize;

/// Feature categories scored by the explainability ranker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Feature {
    #[serde(rename = "Depth")]
    Depth,
    #[serde(rename = "Width")]
    Width,
    #[serde(rename = "Skip Connections")]
    SkipConnections,
    #[serde(rename = "Conv Kernel Size")]
    KernelSize,
    #[serde(rename = "Pooling Strategy")]
    Pooling,
    #[serde(rename = "Activation Function")]
    Activation,
    #[serde(rename = "Batch Normalization")]
    Normalization,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::Depth,
        Feature::Width,
        Feature::SkipConnections,
        Feature::KernelSize,
        Feature::Pooling,
        Feature::Activation,
        Feature::Normalization,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Depth => "Depth",
            Feature::Width => "Width",
            Feature::SkipConnections => "Skip Connections",
            Feature::KernelSize => "Conv Kernel Size",
            Feature::Pooling => "Pooling Strategy",
            Feature::Activation => "Activation Function",
            Feature::Normalization => "Batch Normalization",
        }
    }

    /// Base importance before population evidence is applied.
    pub fn prior(self) -> f64 {
        match self {
            Feature::Depth => 0.35,
            Feature::Width => 0.275,
            Feature::SkipConnections => 0.25,
            Feature::KernelSize => 0.2,
            Feature::Pooling => 0.155,
            Feature::Activation => 0.1,
            Feature::Normalization => 0.1,
        }
    }

    /// Numeric value of the feature for `genome`.
    pub fn value(self, genome: &Genome) -> f64 {
        match self {
            Feature::Depth => network_depth(genome) as f64,
            Feature::Width => genome.channels as f64,
            Feature::SkipConnections => count(genome, |op| op == Operation::Skip) as f64,
            Feature::KernelSize => {
                let kernels: Vec<usize> = genome
                    .connections
                    .iter()
                    .filter(|c| c.operation.is_convolution())
                    .filter_map(|c| c.operation.kernel_size())
                    .collect();
                if kernels.is_empty() {
                    0.0
                } else {
                    kernels.iter().sum::<usize>() as f64 / kernels.len() as f64
                }
            }
            Feature::Pooling => {
                if genome.connections.is_empty() {
                    0.0
                } else {
                    count(genome, Operation::is_pooling) as f64 / genome.connections.len() as f64
                }
            }
            Feature::Activation => f64::from(u8::from(genome.activation.is_smooth())),
            Feature::Normalization => f64::from(u8::from(genome.batch_norm)),
        }
    }
}

fn count(genome: &Genome, pred: impl Fn(Operation) -> bool) -> usize {
    genome.connections.iter().filter(|c| pred(c.operation)).count()
}

/// Longest weighted path through a cell times the number of cells; 0 for
/// structurally invalid genomes.
pub fn network_depth(genome: &Genome) -> usize {
    validate(genome)
        .map(|order| cell_depth(genome, &order) * genome.cells)
        .unwrap_or(0)
}

/// Structural traits used as attribution tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trait {
    DeepLayers,
    ShallowLayers,
    SkipConnections,
    EfficientKernels,
    LargeKernels,
    ExcessiveWidth,
    CompactWidth,
    RedundantPooling,
    SmoothActivation,
    BatchNormalization,
}

impl Trait {
    pub const ALL: [Trait; 10] = [
        Trait::DeepLayers,
        Trait::ShallowLayers,
        Trait::SkipConnections,
        Trait::EfficientKernels,
        Trait::LargeKernels,
        Trait::ExcessiveWidth,
        Trait::CompactWidth,
        Trait::RedundantPooling,
        Trait::SmoothActivation,
        Trait::BatchNormalization,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Trait::DeepLayers => "deep_layers",
            Trait::ShallowLayers => "shallow_layers",
            Trait::SkipConnections => "skip_connections",
            Trait::EfficientKernels => "efficient_kernels",
            Trait::LargeKernels => "large_kernels",
            Trait::ExcessiveWidth => "excessive_width",
            Trait::CompactWidth => "compact_width",
            Trait::RedundantPooling => "redundant_pooling",
            Trait::SmoothActivation => "smooth_activation",
            Trait::BatchNormalization => "batch_normalization",
        }
    }

    pub fn holds(self, genome: &Genome) -> bool {
        match self {
            Trait::DeepLayers => network_depth(genome) >= 12,
            Trait::ShallowLayers => network_depth(genome) <= 6,
            Trait::SkipConnections => count(genome, |op| op == Operation::Skip) > 0,
            Trait::EfficientKernels => {
                count(genome, |op| {
                    matches!(op, Operation::Conv1x1 | Operation::SepConv3x3 | Operation::DilConv3x3)
                }) > 0
            }
            Trait::LargeKernels => count(genome, |op| op == Operation::Conv5x5) > 0,
            Trait::ExcessiveWidth => genome.channels >= 96,
            Trait::CompactWidth => genome.channels <= 32,
            Trait::RedundantPooling => count(genome, Operation::is_pooling) >= 2,
            Trait::SmoothActivation => genome.activation.is_smooth(),
            Trait::BatchNormalization => genome.batch_norm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Activation, GenomeId};

    fn genome() -> Genome {
        Genome::new(GenomeId(1), 4, Operation::ALL.to_vec())
            .with_cells(3)
            .with_channels(128)
            .with_activation(Activation::Swish)
            .with_batch_norm(false)
            .connect(0, 1, Operation::Conv5x5)
            .connect(1, 2, Operation::MaxPool)
            .connect(2, 3, Operation::AvgPool)
            .connect(0, 3, Operation::Skip)
    }

    #[test]
    fn test_priors_descend_in_declaration_order() {
        for w in Feature::ALL.windows(2) {
            assert!(w[0].prior() >= w[1].prior());
        }
    }

    #[test]
    fn test_feature_values() {
        let g = genome();
        assert_eq!(Feature::Depth.value(&g), 9.0);
        assert_eq!(Feature::Width.value(&g), 128.0);
        assert_eq!(Feature::SkipConnections.value(&g), 1.0);
        assert_eq!(Feature::KernelSize.value(&g), 5.0);
        assert_eq!(Feature::Pooling.value(&g), 0.5);
        assert_eq!(Feature::Activation.value(&g), 1.0);
        assert_eq!(Feature::Normalization.value(&g), 0.0);
    }

    #[test]
    fn test_traits() {
        let g = genome();
        let tags: Vec<&str> = Trait::ALL
            .into_iter()
            .filter(|t| t.holds(&g))
            .map(Trait::tag)
            .collect();
        assert_eq!(
            tags,
            vec!["skip_connections", "large_kernels", "excessive_width", "redundant_pooling", "smooth_activation"]
        );
    }

    #[test]
    fn test_invalid_genome_has_zero_depth() {
        let g = Genome::new(GenomeId(2), 3, Operation::DEFAULT_CATALOG.to_vec()).connect(0, 5, Operation::Skip);
        assert_eq!(network_depth(&g), 0);
    }
}
