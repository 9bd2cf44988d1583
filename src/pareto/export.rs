//! Pareto front export as JSON and CSV.

use crate::population::GenerationSnapshot;
use serde::Serialize;
use std::fmt::Write as _;

/// Export failure.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// One exported row. Field order is part of the format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParetoRecord {
    pub model_id: String,
    pub accuracy: f64,
    pub flops: f64,
    pub params: f64,
    pub latency: f64,
    pub is_pareto_optimal: bool,
}

/// Which individuals to export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrontSelection {
    /// Front 0 only.
    #[default]
    ParetoOptimal,
    /// Every ranked individual, front 0 first.
    AllFronts,
}

pub const CSV_HEADER: &str = "modelId,accuracy,flops,params,latency,isParetoOptimal";

/// Builds export rows from a ranked snapshot.
///
/// `isParetoOptimal` is true exactly for front-0 members. Unranked or
/// unevaluated individuals are never exported.
pub fn pareto_records(snapshot: &GenerationSnapshot, selection: FrontSelection) -> Vec<ParetoRecord> {
    snapshot
        .records()
        .into_iter()
        .filter_map(|r| {
            let rank = r.front_rank?;
            let objectives = r.objective_vector?;
            if selection == FrontSelection::ParetoOptimal && rank != 0 {
                return None;
            }
            Some(ParetoRecord {
                model_id: r.id.to_string(),
                accuracy: objectives.accuracy,
                flops: objectives.flops,
                params: objectives.params,
                latency: objectives.latency,
                is_pareto_optimal: rank == 0,
            })
        })
        .collect()
}

pub fn to_json(records: &[ParetoRecord]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn to_csv(records: &[ParetoRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for r in records {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{},{},{},{},{},{}",
            r.model_id, r.accuracy, r.flops, r.params, r.latency, r.is_pareto_optimal
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Genome, GenomeId, ObjectiveVector, Operation};
    use crate::pareto::ParetoRanker;
    use crate::population::{Individual, IndividualId};

    fn snapshot() -> GenerationSnapshot {
        let genome = Genome::new(GenomeId(0), 2, Operation::DEFAULT_CATALOG.to_vec())
            .connect(0, 1, Operation::Conv3x3);
        let objs = [
            ObjectiveVector::new(0.90, 100.0, 2.0, 10.0),
            ObjectiveVector::new(0.95, 400.0, 8.0, 30.0),
            ObjectiveVector::new(0.85, 150.0, 3.0, 12.0),
        ];
        let mut individuals: Vec<Individual> = objs
            .iter()
            .enumerate()
            .map(|(i, o)| Individual::evaluated(IndividualId(i as u64 + 1), genome.clone(), *o, 0.0))
            .collect();
        let mut broken = Individual::new(IndividualId(9), genome, 0, vec![]);
        broken.mark_non_viable("dangling node");
        individuals.push(broken);
        ParetoRanker::default().rank_in_place(&mut individuals).unwrap();
        GenerationSnapshot {
            generation: 1,
            version: 2,
            individuals,
        }
    }

    #[test]
    fn test_front_zero_only() {
        let records = pareto_records(&snapshot(), FrontSelection::ParetoOptimal);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.is_pareto_optimal));
    }

    #[test]
    fn test_all_fronts_flags_by_dominance() {
        let records = pareto_records(&snapshot(), FrontSelection::AllFronts);
        assert_eq!(records.len(), 3);
        let dominated = records.iter().find(|r| r.model_id == "model_3").unwrap();
        assert!(!dominated.is_pareto_optimal);
        assert_eq!(records.last().map(|r| r.model_id.as_str()), Some("model_3"));
    }

    #[test]
    fn test_csv_layout() {
        let records = pareto_records(&snapshot(), FrontSelection::AllFronts);
        let csv = to_csv(&records);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert!(lines.any(|l| l == "model_3,0.85,150,3,12,false"));
    }

    #[test]
    fn test_json_field_order() {
        let records = pareto_records(&snapshot(), FrontSelection::ParetoOptimal);
        let json = to_json(&records).unwrap();
        let positions: Vec<usize> = ["modelId", "accuracy", "flops", "params", "latency", "isParetoOptimal"]
            .iter()
            .map(|k| json.find(k).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
    }
}
