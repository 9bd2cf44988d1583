//! Feature attribution for evaluated individuals.

use super::features::{Feature, Trait};
use crate::population::{GenerationSnapshot, Individual, IndividualId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExplainError {
    #[error("no individual {0} in the current generation")]
    UnknownIndividual(IndividualId),
    #[error("individual {0} has not been evaluated")]
    NotEvaluated(IndividualId),
}

/// Where base importance weights come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportanceStrategy {
    /// Prior × (1 + |Pearson correlation of the feature with fitness|)
    /// across the evaluated population.
    #[default]
    GlobalSensitivity,
    /// Prior × (1 + |z-score| of the individual's own feature value),
    /// with the z-score capped at 3.
    LocalApproximation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: Feature,
    pub importance: f64,
}

/// Explanation of one individual.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAttribution {
    pub individual_id: IndividualId,
    pub method: ImportanceStrategy,
    /// Sums to 1, sorted by importance descending.
    pub features: Vec<FeatureImportance>,
    /// Traits of this individual associated with higher fitness.
    pub positive: Vec<String>,
    /// Traits of this individual associated with lower fitness.
    pub negative: Vec<String>,
    /// 1-based position by fitness among evaluated individuals.
    pub fitness_rank: usize,
    /// Share of the other evaluated individuals with lower fitness.
    pub percentile: f64,
    pub explanation: String,
}

const Z_CAP: f64 = 3.0;

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

fn std_dev(xs: &[f64]) -> f64 {
    let m = mean(xs);
    (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len().max(1) as f64).sqrt()
}

/// Pearson correlation; 0 when either side is constant.
fn correlation(xs: &[f64], ys: &[f64]) -> f64 {
    let (mx, my) = (mean(xs), mean(ys));
    let cov: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let vx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    let vy: f64 = ys.iter().map(|y| (y - my).powi(2)).sum();
    if vx <= f64::EPSILON || vy <= f64::EPSILON {
        0.0
    } else {
        (cov / (vx * vy).sqrt()).clamp(-1.0, 1.0)
    }
}

/// Normalizes raw weights to sum to 1 and sorts them descending.
///
/// Ties keep [`Feature::ALL`] order.
fn normalize(raw: Vec<(Feature, f64)>) -> Vec<FeatureImportance> {
    let total: f64 = raw.iter().map(|(_, w)| w).sum();
    let mut features: Vec<FeatureImportance> = raw
        .into_iter()
        .map(|(feature, w)| FeatureImportance {
            feature,
            importance: w / total,
        })
        .collect();
    features.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    features
}

/// Computes [`FeatureAttribution`]s against a generation snapshot.
///
/// Read-only: works on an immutable snapshot and never touches the store.
///
/// ```
/// use u_nas::evaluator::ProxyEvaluator;
/// use u_nas::explain::ExplainabilityRanker;
/// use u_nas::search::{EvolutionController, SearchConfig};
///
/// let mut controller = EvolutionController::new(ProxyEvaluator::new());
/// controller.initialize(SearchConfig::default().with_population_size(10).with_seed(1)).unwrap();
/// controller.run(2).unwrap();
///
/// let snapshot = controller.snapshot();
/// let best = snapshot.best().unwrap().id;
/// let attribution = ExplainabilityRanker::default().explain(&snapshot, best).unwrap();
///
/// let total: f64 = attribution.features.iter().map(|f| f.importance).sum();
/// assert!((total - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplainabilityRanker {
    strategy: ImportanceStrategy,
}

impl ExplainabilityRanker {
    pub fn new(strategy: ImportanceStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ImportanceStrategy {
        self.strategy
    }

    /// Explains individual `id` of `snapshot`.
    pub fn explain(
        &self,
        snapshot: &GenerationSnapshot,
        id: IndividualId,
    ) -> Result<FeatureAttribution, ExplainError> {
        let target = snapshot.get(id).ok_or(ExplainError::UnknownIndividual(id))?;
        let target_fitness = target
            .fitness
            .filter(|_| target.is_viable())
            .ok_or(ExplainError::NotEvaluated(id))?;

        let reference: Vec<(&Individual, f64)> = snapshot
            .individuals
            .iter()
            .filter(|ind| ind.is_viable())
            .filter_map(|ind| ind.fitness.map(|f| (ind, f)))
            .collect();
        let fitness: Vec<f64> = reference.iter().map(|(_, f)| *f).collect();

        let raw: Vec<(Feature, f64)> = Feature::ALL
            .into_iter()
            .map(|feature| {
                let values: Vec<f64> = reference.iter().map(|(ind, _)| feature.value(&ind.genome)).collect();
                let evidence = match self.strategy {
                    ImportanceStrategy::GlobalSensitivity => correlation(&values, &fitness).abs(),
                    ImportanceStrategy::LocalApproximation => {
                        let sd = std_dev(&values);
                        if sd <= f64::EPSILON {
                            0.0
                        } else {
                            ((feature.value(&target.genome) - mean(&values)) / sd)
                                .abs()
                                .min(Z_CAP)
                        }
                    }
                };
                (feature, feature.prior() * (1.0 + evidence))
            })
            .collect();
        let features = normalize(raw);

        let n = reference.len();
        let better = fitness.iter().filter(|&&f| f > target_fitness).count();
        let worse = fitness.iter().filter(|&&f| f < target_fitness).count();
        let fitness_rank = better + 1;
        let percentile = if n <= 1 { 1.0 } else { worse as f64 / (n - 1) as f64 };

        let (positive, negative) = partition_traits(target, &reference, percentile);
        let explanation = describe(id, fitness_rank, n, percentile, &features, &positive, &negative);

        Ok(FeatureAttribution {
            individual_id: id,
            method: self.strategy,
            features,
            positive,
            negative,
            fitness_rank,
            percentile,
            explanation,
        })
    }

    /// Population-level importance from feature/fitness correlation.
    pub fn population_importance(&self, snapshot: &GenerationSnapshot) -> Vec<FeatureImportance> {
        let reference: Vec<&Individual> = snapshot
            .individuals
            .iter()
            .filter(|ind| ind.is_viable() && ind.fitness.is_some())
            .collect();
        let fitness: Vec<f64> = reference.iter().filter_map(|ind| ind.fitness).collect();
        normalize(
            Feature::ALL
                .into_iter()
                .map(|feature| {
                    let values: Vec<f64> = reference.iter().map(|ind| feature.value(&ind.genome)).collect();
                    (feature, feature.prior() * (1.0 + correlation(&values, &fitness).abs()))
                })
                .collect(),
        )
    }
}

/// Splits the target's traits by how trait holders fare against the rest.
///
/// Without a contrast (everyone or no one else shares the trait), the trait
/// follows the target's own standing: positive in the upper half.
fn partition_traits(
    target: &Individual,
    reference: &[(&Individual, f64)],
    percentile: f64,
) -> (Vec<String>, Vec<String>) {
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for t in Trait::ALL.into_iter().filter(|t| t.holds(&target.genome)) {
        let mut with = Vec::new();
        let mut without = Vec::new();
        for (ind, f) in reference {
            if t.holds(&ind.genome) {
                with.push(*f);
            } else {
                without.push(*f);
            }
        }
        let contrast = if with.is_empty() || without.is_empty() {
            0.0
        } else {
            mean(&with) - mean(&without)
        };
        let is_positive = if contrast.abs() > f64::EPSILON {
            contrast > 0.0
        } else {
            percentile >= 0.5
        };
        if is_positive {
            positive.push(t.tag().to_string());
        } else {
            negative.push(t.tag().to_string());
        }
    }
    (positive, negative)
}

fn describe(
    id: IndividualId,
    rank: usize,
    n: usize,
    percentile: f64,
    features: &[FeatureImportance],
    positive: &[String],
    negative: &[String],
) -> String {
    let list = |tags: &[String]| {
        if tags.is_empty() {
            "none".to_string()
        } else {
            tags.join(", ")
        }
    };
    let top = features
        .first()
        .map(|f| format!("{} ({:.0}%)", f.feature.name(), f.importance * 100.0))
        .unwrap_or_else(|| "none".to_string());
    format!(
        "{id} ranks {rank} of {n} by fitness (percentile {:.0}). Most influential feature: {top}. \
         Helping: {}. Hurting: {}.",
        percentile * 100.0,
        list(positive),
        list(negative)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Activation, Genome, GenomeId, ObjectiveVector, Operation};

    fn member(id: u64, cells: usize, channels: usize, skip: bool, fitness: f64) -> Individual {
        let mut genome = Genome::new(GenomeId(id), 3, Operation::DEFAULT_CATALOG.to_vec())
            .with_cells(cells)
            .with_channels(channels)
            .with_activation(Activation::Relu)
            .connect(0, 1, Operation::Conv3x3)
            .connect(1, 2, Operation::Conv3x3);
        if skip {
            genome = genome.connect(0, 2, Operation::Skip);
        }
        Individual::evaluated(
            IndividualId(id),
            genome,
            ObjectiveVector::new(fitness, 100.0, 1.0, 10.0),
            fitness,
        )
    }

    fn snapshot() -> GenerationSnapshot {
        let mut individuals = vec![
            member(1, 7, 32, true, 0.92),
            member(2, 6, 48, true, 0.88),
            member(3, 3, 128, false, 0.61),
            member(4, 4, 96, false, 0.70),
            member(5, 5, 64, true, 0.80),
        ];
        let mut broken = member(6, 3, 16, false, 0.0);
        broken.mark_non_viable("cycle");
        individuals.push(broken);
        GenerationSnapshot {
            generation: 2,
            version: 3,
            individuals,
        }
    }

    fn check_invariants(a: &FeatureAttribution) {
        let total: f64 = a.features.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-6, "weights sum to {total}");
        assert_eq!(a.features.len(), Feature::ALL.len());
        for w in a.features.windows(2) {
            assert!(w[0].importance >= w[1].importance, "{:?}", a.features);
        }
    }

    #[test]
    fn test_weights_normalized_and_sorted_for_every_member() {
        let snap = snapshot();
        for strategy in [ImportanceStrategy::GlobalSensitivity, ImportanceStrategy::LocalApproximation] {
            let ranker = ExplainabilityRanker::new(strategy);
            for id in 1..=5 {
                check_invariants(&ranker.explain(&snap, IndividualId(id)).unwrap());
            }
        }
    }

    #[test]
    fn test_rank_and_percentile() {
        let snap = snapshot();
        let ranker = ExplainabilityRanker::default();
        let best = ranker.explain(&snap, IndividualId(1)).unwrap();
        assert_eq!(best.fitness_rank, 1);
        assert!((best.percentile - 1.0).abs() < 1e-12);
        let worst = ranker.explain(&snap, IndividualId(3)).unwrap();
        assert_eq!(worst.fitness_rank, 5);
        assert_eq!(worst.percentile, 0.0);
        assert!(worst.explanation.starts_with("model_3 ranks 5 of 5"));
    }

    #[test]
    fn test_trait_tags_follow_fitness_contrast() {
        let snap = snapshot();
        let ranker = ExplainabilityRanker::default();
        // Skip holders (1, 2, 5) average higher fitness than the rest.
        let best = ranker.explain(&snap, IndividualId(1)).unwrap();
        assert!(best.positive.contains(&"skip_connections".to_string()));
        // Wide networks (3, 4) do worse.
        let wide = ranker.explain(&snap, IndividualId(3)).unwrap();
        assert!(wide.negative.contains(&"excessive_width".to_string()));
        assert!(!wide.positive.contains(&"excessive_width".to_string()));
    }

    #[test]
    fn test_depth_correlates_with_fitness() {
        let snap = snapshot();
        let importance = ExplainabilityRanker::default().population_importance(&snap);
        assert_eq!(importance[0].feature, Feature::Depth);
        let total: f64 = importance.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_errors() {
        let snap = snapshot();
        let ranker = ExplainabilityRanker::default();
        assert_eq!(
            ranker.explain(&snap, IndividualId(99)),
            Err(ExplainError::UnknownIndividual(IndividualId(99)))
        );
        assert_eq!(
            ranker.explain(&snap, IndividualId(6)),
            Err(ExplainError::NotEvaluated(IndividualId(6)))
        );
    }

    #[test]
    fn test_single_member_population() {
        let snap = GenerationSnapshot {
            generation: 0,
            version: 1,
            individuals: vec![member(1, 3, 16, false, 0.5)],
        };
        let a = ExplainabilityRanker::new(ImportanceStrategy::LocalApproximation)
            .explain(&snap, IndividualId(1))
            .unwrap();
        check_invariants(&a);
        assert_eq!(a.fitness_rank, 1);
        // No evidence: weights are the normalized priors.
        assert_eq!(a.features[0].feature, Feature::Depth);
    }
}
