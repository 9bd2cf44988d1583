//! Scalar fitness per search objective.
//!
//! Each objective component is mapped into `[0, 1]` (higher is better):
//!
//! | component | mapping                   |
//! |-----------|---------------------------|
//! | accuracy  | `accuracy`                |
//! | FLOPs     | `1 / (1 + flops / 300)`   |
//! | params    | `1 / (1 + params / 5)`    |
//! | latency   | `1 / (1 + latency / 30)`  |
//!
//! and combined with a fixed weight table per [`SearchObjective`]. Every
//! mapping is monotone in its objective's preferred direction and every
//! weight is non-negative, so `a.dominates(b)` implies
//! `score(a) >= score(b)`. Elitism relies on that.

use crate::genome::ObjectiveVector;
use serde::{Deserialize, Serialize};

const FLOPS_SCALE: f64 = 300.0;
const PARAMS_SCALE: f64 = 5.0;
const LATENCY_SCALE: f64 = 30.0;

/// Primary objective of a search run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchObjective {
    /// Maximize accuracy.
    Accuracy,
    /// Accuracy traded against FLOPs.
    Efficiency,
    /// Accuracy traded against parameter count.
    Size,
    /// Accuracy traded against latency.
    Latency,
    /// Even trade-off across all four objectives.
    #[default]
    Balanced,
}

impl SearchObjective {
    /// Weights over `[accuracy, flops, params, latency]`; each row sums to 1.
    pub fn weights(self) -> [f64; 4] {
        match self {
            SearchObjective::Accuracy => [1.0, 0.0, 0.0, 0.0],
            SearchObjective::Efficiency => [0.5, 0.5, 0.0, 0.0],
            SearchObjective::Size => [0.5, 0.0, 0.5, 0.0],
            SearchObjective::Latency => [0.5, 0.0, 0.0, 0.5],
            SearchObjective::Balanced => [0.4, 0.2, 0.2, 0.2],
        }
    }

    /// Scalar fitness in `[0, 1]`, higher is better.
    ///
    /// ```
    /// use u_nas::evaluator::SearchObjective;
    /// use u_nas::genome::ObjectiveVector;
    ///
    /// let cheap = ObjectiveVector::new(0.90, 50.0, 1.0, 5.0);
    /// let heavy = ObjectiveVector::new(0.92, 900.0, 20.0, 80.0);
    ///
    /// assert!(SearchObjective::Accuracy.score(&heavy) > SearchObjective::Accuracy.score(&cheap));
    /// assert!(SearchObjective::Balanced.score(&cheap) > SearchObjective::Balanced.score(&heavy));
    /// ```
    pub fn score(self, objectives: &ObjectiveVector) -> f64 {
        let components = [
            objectives.accuracy,
            1.0 / (1.0 + objectives.flops / FLOPS_SCALE),
            1.0 / (1.0 + objectives.params / PARAMS_SCALE),
            1.0 / (1.0 + objectives.latency / LATENCY_SCALE),
        ];
        self.weights()
            .iter()
            .zip(components.iter())
            .map(|(w, c)| w * c)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SearchObjective; 5] = [
        SearchObjective::Accuracy,
        SearchObjective::Efficiency,
        SearchObjective::Size,
        SearchObjective::Latency,
        SearchObjective::Balanced,
    ];

    #[test]
    fn test_weights_sum_to_one() {
        for obj in ALL {
            let sum: f64 = obj.weights().iter().sum();
            assert!((sum - 1.0).abs() < 1e-12, "{obj:?} sums to {sum}");
        }
    }

    #[test]
    fn test_score_respects_dominance() {
        let a = ObjectiveVector::new(0.9, 100.0, 2.0, 10.0);
        let b = ObjectiveVector::new(0.85, 150.0, 3.0, 12.0);
        assert!(a.dominates(&b));
        for obj in ALL {
            assert!(obj.score(&a) >= obj.score(&b), "{obj:?}");
        }
    }

    #[test]
    fn test_score_bounds() {
        let v = ObjectiveVector::new(1.0, 1e-9, 1e-9, 1e-9);
        for obj in ALL {
            let s = obj.score(&v);
            assert!(s > 0.99 && s <= 1.0 + 1e-12, "{obj:?}: {s}");
        }
    }

    #[test]
    fn test_serde_names() {
        let parsed: SearchObjective = serde_json::from_str("\"efficiency\"").unwrap();
        assert_eq!(parsed, SearchObjective::Efficiency);
    }
}
