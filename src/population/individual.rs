//! Individuals: a genome plus its evaluation and ranking state.

use crate::genome::{Genome, ObjectiveVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an individual, unique within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndividualId(pub u64);

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model_{}", self.0)
    }
}

/// Evaluation status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Viability {
    /// Not evaluated yet in its generation.
    Pending,
    /// Evaluated successfully.
    Viable,
    /// Validation or evaluation failed. Excluded from fronts and elitism,
    /// kept in lineage.
    NonViable { reason: String },
}

/// A candidate in the population.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub id: IndividualId,
    pub genome: Genome,
    pub objectives: Option<ObjectiveVector>,
    /// Scalar fitness derived from `objectives`; higher is better.
    pub fitness: Option<f64>,
    pub viability: Viability,
    /// Generation in which the individual was created.
    pub generation: usize,
    /// Parent ids (back-references only).
    pub parents: Vec<IndividualId>,
    /// Non-domination rank from the latest ranking (0 = Pareto front).
    pub front_rank: Option<usize>,
    pub crowding_distance: Option<f64>,
}

impl Individual {
    /// Creates a pending, unranked individual.
    pub fn new(id: IndividualId, genome: Genome, generation: usize, parents: Vec<IndividualId>) -> Self {
        Self {
            id,
            genome,
            objectives: None,
            fitness: None,
            viability: Viability::Pending,
            generation,
            parents,
            front_rank: None,
            crowding_distance: None,
        }
    }

    /// Builds an already evaluated individual; mainly for tests and imports.
    pub fn evaluated(id: IndividualId, genome: Genome, objectives: ObjectiveVector, fitness: f64) -> Self {
        let mut ind = Self::new(id, genome, 0, Vec::new());
        ind.record(objectives, fitness);
        ind
    }

    pub fn is_pending(&self) -> bool {
        self.viability == Viability::Pending
    }

    pub fn is_viable(&self) -> bool {
        self.viability == Viability::Viable
    }

    /// Stores a successful evaluation.
    pub fn record(&mut self, objectives: ObjectiveVector, fitness: f64) {
        self.objectives = Some(objectives);
        self.fitness = Some(fitness);
        self.viability = Viability::Viable;
    }

    /// Marks the individual as failed; clears objectives and ranking.
    pub fn mark_non_viable(&mut self, reason: impl Into<String>) {
        self.objectives = None;
        self.fitness = None;
        self.viability = Viability::NonViable {
            reason: reason.into(),
        };
        self.clear_ranking();
    }

    pub fn clear_ranking(&mut self) {
        self.front_rank = None;
        self.crowding_distance = None;
    }

    pub fn is_pareto_optimal(&self) -> bool {
        self.front_rank == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{GenomeId, Operation};

    fn genome() -> Genome {
        Genome::new(GenomeId(1), 2, Operation::DEFAULT_CATALOG.to_vec())
            .connect(0, 1, Operation::Conv3x3)
    }

    #[test]
    fn test_lifecycle() {
        let mut ind = Individual::new(IndividualId(1), genome(), 0, vec![]);
        assert!(ind.is_pending());
        ind.record(ObjectiveVector::new(0.9, 10.0, 1.0, 2.0), 0.8);
        assert!(ind.is_viable());
        ind.front_rank = Some(0);
        ind.crowding_distance = Some(f64::INFINITY);
        assert!(ind.is_pareto_optimal());
        ind.mark_non_viable("backend timeout");
        assert!(!ind.is_viable());
        assert!(ind.objectives.is_none());
        assert!(ind.front_rank.is_none());
    }

    #[test]
    fn test_display_id() {
        assert_eq!(IndividualId(42).to_string(), "model_42");
    }
}
