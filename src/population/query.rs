//! Population query records for external consumers.

use super::individual::{Individual, IndividualId};
use super::store::GenerationSnapshot;
use crate::genome::{GenomeId, ObjectiveVector};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;

/// One row of the population query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationRecord {
    pub id: IndividualId,
    pub genome_id: GenomeId,
    pub objective_vector: Option<ObjectiveVector>,
    pub fitness: Option<f64>,
    pub generation: usize,
    pub front_rank: Option<usize>,
    #[serde(serialize_with = "serialize_distance")]
    pub crowding_distance: Option<f64>,
}

impl From<&Individual> for PopulationRecord {
    fn from(ind: &Individual) -> Self {
        Self {
            id: ind.id,
            genome_id: ind.genome.id(),
            objective_vector: ind.objectives,
            fitness: ind.fitness,
            generation: ind.generation,
            front_rank: ind.front_rank,
            crowding_distance: ind.crowding_distance,
        }
    }
}

/// JSON has no infinity; boundary points are written as `"Infinity"`.
fn serialize_distance<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) if d.is_infinite() => serializer.serialize_str("Infinity"),
        Some(d) => serializer.serialize_f64(*d),
        None => serializer.serialize_none(),
    }
}

/// Query order: front rank, then crowding distance descending, then id.
/// Unranked individuals come last, by id.
pub fn query_order(a: &Individual, b: &Individual) -> Ordering {
    let rank = |i: &Individual| i.front_rank.unwrap_or(usize::MAX);
    let crowd = |i: &Individual| i.crowding_distance.unwrap_or(f64::NEG_INFINITY);
    rank(a)
        .cmp(&rank(b))
        .then_with(|| crowd(b).total_cmp(&crowd(a)))
        .then(a.id.cmp(&b.id))
}

impl GenerationSnapshot {
    /// The population as ordered query records.
    pub fn records(&self) -> Vec<PopulationRecord> {
        let mut sorted: Vec<&Individual> = self.individuals.iter().collect();
        sorted.sort_by(|a, b| query_order(a, b));
        sorted.into_iter().map(PopulationRecord::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Genome, Operation};

    fn ranked(id: u64, rank: Option<usize>, crowding: Option<f64>) -> Individual {
        let genome = Genome::new(GenomeId(id * 10), 2, Operation::DEFAULT_CATALOG.to_vec())
            .connect(0, 1, Operation::Conv3x3);
        let mut ind = Individual::new(IndividualId(id), genome, 0, vec![]);
        match rank {
            Some(_) => ind.record(ObjectiveVector::new(0.8, 10.0, 1.0, 2.0), 0.5),
            None => ind.mark_non_viable("cycle"),
        }
        ind.front_rank = rank;
        ind.crowding_distance = crowding;
        ind
    }

    #[test]
    fn test_record_order() {
        let snap = GenerationSnapshot {
            generation: 3,
            version: 7,
            individuals: vec![
                ranked(1, Some(1), Some(f64::INFINITY)),
                ranked(2, None, None),
                ranked(3, Some(0), Some(0.4)),
                ranked(4, Some(0), Some(f64::INFINITY)),
                ranked(5, Some(0), Some(0.4)),
            ],
        };
        let ids: Vec<u64> = snap.records().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![4, 3, 5, 1, 2]);
    }

    #[test]
    fn test_json_shape() {
        let record = PopulationRecord::from(&ranked(4, Some(0), Some(f64::INFINITY)));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["genomeId"], 40);
        assert_eq!(json["frontRank"], 0);
        assert_eq!(json["crowdingDistance"], "Infinity");
        assert_eq!(json["objectiveVector"]["accuracy"], 0.8);
    }
}
