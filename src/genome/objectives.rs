//! Objective vectors and hard constraints.

use serde::{Deserialize, Serialize};

/// Number of objectives tracked per genome.
pub const OBJECTIVE_COUNT: usize = 4;

/// Measured objectives of one genome.
///
/// Accuracy is maximized; FLOPs (millions), parameters (millions) and
/// latency (milliseconds) are minimized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveVector {
    pub accuracy: f64,
    pub flops: f64,
    pub params: f64,
    pub latency: f64,
}

impl ObjectiveVector {
    pub fn new(accuracy: f64, flops: f64, params: f64, latency: f64) -> Self {
        Self {
            accuracy,
            flops,
            params,
            latency,
        }
    }

    /// The vector in all-minimize form: `[-accuracy, flops, params, latency]`.
    pub fn as_minimization(&self) -> [f64; OBJECTIVE_COUNT] {
        [-self.accuracy, self.flops, self.params, self.latency]
    }

    /// Whether every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.accuracy.is_finite()
            && self.flops.is_finite()
            && self.params.is_finite()
            && self.latency.is_finite()
    }

    /// Whether `self` Pareto-dominates `other`.
    ///
    /// `self` must be no worse in every objective and strictly better in at
    /// least one, accounting for the direction of each objective.
    pub fn dominates(&self, other: &ObjectiveVector) -> bool {
        let a = self.as_minimization();
        let b = other.as_minimization();
        let mut strictly_better = false;
        for (va, vb) in a.iter().zip(b.iter()) {
            if va > vb {
                return false;
            }
            if va < vb {
                strictly_better = true;
            }
        }
        strictly_better
    }
}

/// Optional upper bounds on the cost objectives.
///
/// A genome whose objective vector exceeds any declared bound is infeasible
/// and never enters front 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Constraints {
    pub max_params: Option<f64>,
    pub max_flops: Option<f64>,
    pub max_latency: Option<f64>,
}

impl Constraints {
    /// No bounds at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_params(mut self, max: f64) -> Self {
        self.max_params = Some(max);
        self
    }

    pub fn with_max_flops(mut self, max: f64) -> Self {
        self.max_flops = Some(max);
        self
    }

    pub fn with_max_latency(mut self, max: f64) -> Self {
        self.max_latency = Some(max);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.max_params.is_none() && self.max_flops.is_none() && self.max_latency.is_none()
    }

    /// Names of the bounds `objectives` exceeds, in params/FLOPs/latency order.
    pub fn violations(&self, objectives: &ObjectiveVector) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.max_params.is_some_and(|max| objectives.params > max) {
            out.push("params");
        }
        if self.max_flops.is_some_and(|max| objectives.flops > max) {
            out.push("flops");
        }
        if self.max_latency.is_some_and(|max| objectives.latency > max) {
            out.push("latency");
        }
        out
    }

    pub fn is_satisfied_by(&self, objectives: &ObjectiveVector) -> bool {
        self.violations(objectives).is_empty()
    }

    /// Keeps the tighter FLOPs bound of `self` and `max`.
    pub fn tighten_flops(&mut self, max: f64) {
        self.max_flops = Some(self.max_flops.map_or(max, |current| current.min(max)));
    }

    /// Declared bounds as `(name, value)` pairs.
    pub(crate) fn declared(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("maxParams", self.max_params),
            ("maxFlops", self.max_flops),
            ("maxLatency", self.max_latency),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| (name, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominance_directions() {
        let a = ObjectiveVector::new(0.9, 100.0, 2.0, 10.0);
        let b = ObjectiveVector::new(0.8, 120.0, 2.0, 10.0);
        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
    }

    #[test]
    fn test_equal_vectors_do_not_dominate() {
        let a = ObjectiveVector::new(0.9, 100.0, 2.0, 10.0);
        assert!(!a.dominates(&a));
    }

    #[test]
    fn test_trade_off_is_not_dominance() {
        let a = ObjectiveVector::new(0.95, 300.0, 2.0, 10.0);
        let b = ObjectiveVector::new(0.90, 100.0, 2.0, 10.0);
        assert!(!a.dominates(&b));
        assert!(!b.dominates(&a));
    }

    #[test]
    fn test_constraint_violations() {
        let c = Constraints::none().with_max_params(5.0).with_max_latency(20.0);
        let ok = ObjectiveVector::new(0.9, 900.0, 4.0, 19.0);
        let bad = ObjectiveVector::new(0.9, 900.0, 6.0, 21.0);
        assert!(c.is_satisfied_by(&ok));
        assert_eq!(c.violations(&bad), vec!["params", "latency"]);
    }

    #[test]
    fn test_tighten_flops() {
        let mut c = Constraints::none();
        c.tighten_flops(500.0);
        assert_eq!(c.max_flops, Some(500.0));
        c.tighten_flops(800.0);
        assert_eq!(c.max_flops, Some(500.0));
        c.tighten_flops(100.0);
        assert_eq!(c.max_flops, Some(100.0));
    }
}
