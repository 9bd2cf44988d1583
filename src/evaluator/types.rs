//! The fitness evaluation contract.

use crate::genome::{Genome, GenomeValidationError, ObjectiveVector};

/// Why a genome could not be evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// The genome is structurally unusable.
    #[error("invalid genome: {0}")]
    Invalid(#[from] GenomeValidationError),

    /// The backend produced an objective vector outside the valid domain.
    #[error("invalid objective vector: {0}")]
    InvalidObjectives(String),

    /// The backend itself failed (crash, timeout, unavailable model).
    #[error("evaluation backend failed: {0}")]
    Backend(String),
}

/// Maps a genome to its measured objectives.
///
/// This is the only place objective values come from; the search core
/// never fabricates them. Implementations are called concurrently from the
/// controller's worker pool, so they must be `Send + Sync`, and they must
/// be deterministic for a run to be reproducible.
///
/// # Implementing
///
/// ```
/// use u_nas::evaluator::{EvaluationError, FitnessEvaluator};
/// use u_nas::genome::{validate, Genome, ObjectiveVector};
///
/// struct EdgeCount;
///
/// impl FitnessEvaluator for EdgeCount {
///     fn evaluate(&self, genome: &Genome) -> Result<ObjectiveVector, EvaluationError> {
///         validate(genome)?;
///         let edges = genome.connections.len() as f64;
///         Ok(ObjectiveVector::new(edges / (edges + 1.0), edges * 10.0, edges, edges))
///     }
/// }
/// ```
pub trait FitnessEvaluator: Send + Sync {
    /// Evaluates one genome.
    ///
    /// Fails with [`EvaluationError::Invalid`] when the genome is
    /// structurally invalid (zero nodes, dangling node reference, cycle,
    /// disconnected node).
    fn evaluate(&self, genome: &Genome) -> Result<ObjectiveVector, EvaluationError>;

    /// Short backend name for logs.
    fn name(&self) -> &str {
        "evaluator"
    }
}

impl<E: FitnessEvaluator + ?Sized> FitnessEvaluator for Box<E> {
    fn evaluate(&self, genome: &Genome) -> Result<ObjectiveVector, EvaluationError> {
        (**self).evaluate(genome)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<E: FitnessEvaluator + ?Sized> FitnessEvaluator for std::sync::Arc<E> {
    fn evaluate(&self, genome: &Genome) -> Result<ObjectiveVector, EvaluationError> {
        (**self).evaluate(genome)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Checks that an objective vector lies in its domain: accuracy in
/// `[0, 1]`, costs finite and strictly positive.
pub fn check_objectives(objectives: &ObjectiveVector) -> Result<(), EvaluationError> {
    if !objectives.is_finite() {
        return Err(EvaluationError::InvalidObjectives(format!(
            "non-finite component in {objectives:?}"
        )));
    }
    if !(0.0..=1.0).contains(&objectives.accuracy) {
        return Err(EvaluationError::InvalidObjectives(format!(
            "accuracy {} outside [0, 1]",
            objectives.accuracy
        )));
    }
    for (name, value) in [
        ("flops", objectives.flops),
        ("params", objectives.params),
        ("latency", objectives.latency),
    ] {
        if value <= 0.0 {
            return Err(EvaluationError::InvalidObjectives(format!(
                "{name} must be positive, got {value}"
            )));
        }
    }
    Ok(())
}
