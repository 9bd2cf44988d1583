//! Deterministic analytic cost model.
//!
//! [`ProxyEvaluator`] estimates objectives from structure alone:
//!
//! - **params**: per-edge operation weight × channels² per cell, plus a
//!   classifier head
//! - **FLOPs**: per-edge compute cost × channels² × feature-map area per cell
//! - **latency**: fixed overhead + FLOPs throughput term + sequential depth term
//! - **accuracy**: saturating score of depth, capacity, skip connections,
//!   normalization and activation
//!
//! It is a stand-in for a trained surrogate, used by tests, demos and
//! benchmarks. It does not model any real device.

use super::types::{EvaluationError, FitnessEvaluator};
use crate::genome::{cell_depth, validate, Activation, Genome, ObjectiveVector, Operation};

/// Feature-map area (16×16) used for FLOPs.
const FEATURE_MAP_AREA: f64 = 256.0;
/// Output classes of the classifier head.
const HEAD_CLASSES: f64 = 10.0;

/// Analytic proxy for a surrogate evaluator.
#[derive(Debug, Clone, Default)]
pub struct ProxyEvaluator;

impl ProxyEvaluator {
    pub fn new() -> Self {
        Self
    }
}

/// Parameter weight of one edge, in units of channels².
fn param_weight(op: Operation, channels: f64) -> f64 {
    match op {
        Operation::Conv1x1 => 1.0,
        Operation::Conv3x3 => 9.0,
        Operation::Conv5x5 => 25.0,
        Operation::SepConv3x3 => 1.0 + 9.0 / channels,
        Operation::DilConv3x3 => 1.0 + 9.0 / channels,
        Operation::MaxPool | Operation::AvgPool | Operation::Skip => 0.0,
    }
}

/// Compute weight of one edge, in units of channels² × area.
fn flop_weight(op: Operation, channels: f64) -> f64 {
    match op {
        Operation::MaxPool | Operation::AvgPool => 9.0 / channels,
        Operation::Skip => 0.0,
        other => param_weight(other, channels),
    }
}

impl FitnessEvaluator for ProxyEvaluator {
    fn evaluate(&self, genome: &Genome) -> Result<ObjectiveVector, EvaluationError> {
        let order = validate(genome)?;

        let channels = genome.channels.max(1) as f64;
        let cells = genome.cells.max(1) as f64;
        let c2 = channels * channels;

        let edge_params: f64 = genome
            .connections
            .iter()
            .map(|c| param_weight(c.operation, channels))
            .sum();
        let edge_flops: f64 = genome
            .connections
            .iter()
            .map(|c| flop_weight(c.operation, channels))
            .sum();

        let norm_params = if genome.batch_norm {
            2.0 * channels * genome.node_count as f64
        } else {
            0.0
        };
        let params = (cells * (edge_params * c2 + norm_params) + channels * HEAD_CLASSES) / 1e6
            + 0.01;
        let flops = cells * edge_flops * c2 * FEATURE_MAP_AREA / 1e6 + 0.5;

        let depth = cell_depth(genome, &order) as f64 * cells;
        let latency = 0.5 + flops * 0.02 + depth * 0.3;

        let skip_edges = genome
            .connections
            .iter()
            .filter(|c| c.operation == Operation::Skip)
            .count() as f64;
        let skip_ratio = if genome.connections.is_empty() {
            0.0
        } else {
            skip_edges / genome.connections.len() as f64
        };

        let activation_bonus = match genome.activation {
            Activation::Relu => 0.0,
            Activation::Swish => 0.02,
            Activation::Gelu => 0.03,
        };
        let score = 0.35 * (depth / 12.0).tanh()
            + 0.25 * (params / 3.0).tanh()
            + 0.10 * (2.0 * skip_ratio).min(1.0)
            + if genome.batch_norm { 0.05 } else { 0.0 }
            + activation_bonus;
        let accuracy = (0.55 + 0.4 * score / 0.78).clamp(0.0, 1.0);

        Ok(ObjectiveVector::new(accuracy, flops, params, latency))
    }

    fn name(&self) -> &str {
        "proxy"
    }
}
