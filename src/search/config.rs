//! Search configuration.
//!
//! [`SearchConfig`] holds every parameter of the evolutionary loop. The
//! camelCase JSON form accepts the external search request directly:
//!
//! ```
//! use u_nas::search::SearchConfig;
//! use u_nas::evaluator::SearchObjective;
//!
//! let config: SearchConfig = serde_json::from_str(r#"{
//!     "populationSize": 20,
//!     "mutationRate": 0.1,
//!     "crossoverRate": 0.7,
//!     "generations": 5,
//!     "objective": "efficiency",
//!     "eliteCount": 2
//! }"#).unwrap();
//!
//! assert_eq!(config.population_size, 20);
//! assert_eq!(config.objective, SearchObjective::Efficiency);
//! assert!(config.validate().is_ok());
//! ```

use super::selection::SelectionPolicy;
use crate::evaluator::SearchObjective;
use crate::genome::{Constraints, SearchSpace};
use crate::hardware::HardwareClass;
use serde::{Deserialize, Serialize};

/// A configuration was rejected before any state changed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("population size must be at least 2, got {0}")]
    PopulationSize(usize),
    #[error("{name} must be within [0, 1], got {value}")]
    Rate { name: &'static str, value: f64 },
    #[error("generation count must be at least 1")]
    ZeroGenerations,
    #[error("elite count {elite} must be smaller than the population size {population}")]
    EliteCount { elite: usize, population: usize },
    #[error("worker count must be positive")]
    ZeroWorkers,
    #[error("tournament size must be positive")]
    TournamentSize,
    #[error("{name} must be positive and finite, got {value}")]
    Constraint { name: &'static str, value: f64 },
    #[error("invalid search space: {0}")]
    SearchSpace(String),
}

/// Configuration for an evolutionary search run.
///
/// # Defaults
///
/// ```
/// use u_nas::search::SearchConfig;
///
/// let config = SearchConfig::default();
/// assert_eq!(config.population_size, 50);
/// assert_eq!(config.generations, 10);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_nas::search::{SearchConfig, SelectionPolicy};
/// use u_nas::hardware::HardwareClass;
///
/// let config = SearchConfig::default()
///     .with_population_size(30)
///     .with_selection(SelectionPolicy::Tournament(3))
///     .with_hardware(HardwareClass::EdgeCpu)
///     .with_seed(7);
/// assert_eq!(config.effective_constraints().max_flops, Some(500.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Number of individuals per generation.
    pub population_size: usize,

    /// Probability of mutating an offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// Probability of producing an offspring by crossover (0.0–1.0).
    ///
    /// When crossover is not applied, the child is a copy of one parent.
    pub crossover_rate: f64,

    /// Generation target used by
    /// [`run_configured`](super::EvolutionController::run_configured).
    pub generations: usize,

    /// Objective that turns objective vectors into scalar fitness.
    pub objective: SearchObjective,

    /// Members of front 0 carried unchanged into the next generation.
    pub elite_count: usize,

    /// Parent selection policy.
    pub selection: SelectionPolicy,

    /// Random seed for reproducibility.
    ///
    /// `None` draws a seed at initialization; the controller reports it.
    pub seed: Option<u64>,

    /// Evaluation worker threads. `None` uses all available compute units.
    pub workers: Option<usize>,

    /// Hard bounds; violating individuals never enter front 0.
    pub constraints: Constraints,

    /// Architecture space sampled by initialization and mutation.
    pub search_space: SearchSpace,

    /// Target device. Restricts the operation catalog and caps FLOPs.
    pub hardware: Option<HardwareClass>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            mutation_rate: 0.1,
            crossover_rate: 0.7,
            generations: 10,
            objective: SearchObjective::Balanced,
            elite_count: 2,
            selection: SelectionPolicy::default(),
            seed: None,
            workers: None,
            constraints: Constraints::none(),
            search_space: SearchSpace::default(),
            hardware: None,
        }
    }
}

impl SearchConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    pub fn with_objective(mut self, objective: SearchObjective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_elite_count(mut self, n: usize) -> Self {
        self.elite_count = n;
        self
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_search_space(mut self, space: SearchSpace) -> Self {
        self.search_space = space;
        self
    }

    pub fn with_hardware(mut self, hardware: HardwareClass) -> Self {
        self.hardware = Some(hardware);
        self
    }

    /// Preset for edge devices: small population, FLOPs-aware fitness.
    ///
    /// - Population: 30, Generations: 15
    /// - Mutation: 0.15, Crossover: 0.6
    pub fn edge_search() -> Self {
        Self {
            population_size: 30,
            mutation_rate: 0.15,
            crossover_rate: 0.6,
            generations: 15,
            objective: SearchObjective::Efficiency,
            ..Self::default()
        }
    }

    /// Preset for maximum accuracy: large population, low mutation.
    ///
    /// - Population: 100, Generations: 20
    /// - Mutation: 0.05, Crossover: 0.8
    pub fn high_accuracy() -> Self {
        Self {
            population_size: 100,
            mutation_rate: 0.05,
            crossover_rate: 0.8,
            generations: 20,
            objective: SearchObjective::Accuracy,
            ..Self::default()
        }
    }

    /// Preset matching [`Default`]: population 50, 10 generations, balanced.
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Search space after applying the hardware profile.
    pub fn effective_search_space(&self) -> SearchSpace {
        let mut space = self.search_space.clone();
        if let Some(hw) = self.hardware {
            space.operations = hw.profile().allowed_operations.to_vec();
        }
        space
    }

    /// Constraints after applying the hardware FLOPs ceiling.
    pub fn effective_constraints(&self) -> Constraints {
        let mut constraints = self.constraints;
        if let Some(hw) = self.hardware {
            constraints.tighten_flops(hw.profile().max_flops);
        }
        constraints
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.population_size < 2 {
            return Err(ConfigurationError::PopulationSize(self.population_size));
        }
        for (name, value) in [
            ("mutationRate", self.mutation_rate),
            ("crossoverRate", self.crossover_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::Rate { name, value });
            }
        }
        if self.generations == 0 {
            return Err(ConfigurationError::ZeroGenerations);
        }
        if self.elite_count >= self.population_size {
            return Err(ConfigurationError::EliteCount {
                elite: self.elite_count,
                population: self.population_size,
            });
        }
        if self.workers == Some(0) {
            return Err(ConfigurationError::ZeroWorkers);
        }
        if self.selection.tournament_size() == Some(0) {
            return Err(ConfigurationError::TournamentSize);
        }
        for (name, value) in self.constraints.declared() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::Constraint { name, value });
            }
        }
        self.effective_search_space()
            .validate()
            .map_err(ConfigurationError::SearchSpace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Operation;

    #[test]
    fn test_default_is_valid() {
        assert!(SearchConfig::default().validate().is_ok());
        assert!(SearchConfig::edge_search().validate().is_ok());
        assert!(SearchConfig::high_accuracy().validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let edge = SearchConfig::edge_search();
        assert_eq!(
            (edge.population_size, edge.generations, edge.objective),
            (30, 15, SearchObjective::Efficiency)
        );
        let acc = SearchConfig::high_accuracy();
        assert_eq!(acc.population_size, 100);
        assert!((acc.mutation_rate - 0.05).abs() < 1e-12);
        assert_eq!(SearchConfig::balanced(), SearchConfig::default());
    }

    #[test]
    fn test_rejects_small_population() {
        let err = SearchConfig::default()
            .with_population_size(1)
            .with_elite_count(0)
            .validate();
        assert_eq!(err, Err(ConfigurationError::PopulationSize(1)));
    }

    #[test]
    fn test_rejects_rates_outside_unit_interval() {
        let err = SearchConfig::default().with_mutation_rate(1.5).validate();
        assert!(matches!(err, Err(ConfigurationError::Rate { name: "mutationRate", .. })));
        let err = SearchConfig::default().with_crossover_rate(f64::NAN).validate();
        assert!(matches!(err, Err(ConfigurationError::Rate { name: "crossoverRate", .. })));
    }

    #[test]
    fn test_rejects_zero_generations_and_large_elite() {
        assert_eq!(
            SearchConfig::default().with_generations(0).validate(),
            Err(ConfigurationError::ZeroGenerations)
        );
        assert!(matches!(
            SearchConfig::default().with_population_size(4).with_elite_count(4).validate(),
            Err(ConfigurationError::EliteCount { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_constraints_and_workers() {
        let err = SearchConfig::default()
            .with_constraints(Constraints::none().with_max_latency(-1.0))
            .validate();
        assert!(matches!(err, Err(ConfigurationError::Constraint { name: "maxLatency", .. })));
        assert_eq!(
            SearchConfig::default().with_workers(0).validate(),
            Err(ConfigurationError::ZeroWorkers)
        );
        assert_eq!(
            SearchConfig::default()
                .with_selection(SelectionPolicy::Crowded(0))
                .validate(),
            Err(ConfigurationError::TournamentSize)
        );
    }

    #[test]
    fn test_hardware_profile_applied() {
        let config = SearchConfig::default()
            .with_constraints(Constraints::none().with_max_flops(2000.0))
            .with_hardware(HardwareClass::MobileArm);
        assert_eq!(config.effective_constraints().max_flops, Some(100.0));
        let ops = config.effective_search_space().operations;
        assert!(ops.contains(&Operation::SepConv3x3));
        assert!(!ops.contains(&Operation::Conv5x5));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"populationSize": 8, "hardware": "Raspberry Pi"}"#).unwrap();
        assert_eq!(config.population_size, 8);
        assert_eq!(config.hardware, Some(HardwareClass::RaspberryPi));
        assert_eq!(config.generations, 10);
    }
}
