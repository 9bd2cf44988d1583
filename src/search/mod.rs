//! Evolutionary search.
//!
//! [`EvolutionController`] runs the NSGA-II generation loop over a
//! [`PopulationStore`](crate::population::PopulationStore), delegating
//! scoring to a [`FitnessEvaluator`](crate::evaluator::FitnessEvaluator)
//! and ranking to a [`ParetoRanker`](crate::pareto::ParetoRanker).
//!
//! # Configuration
//!
//! [`SearchConfig`] with presets [`edge_search`](SearchConfig::edge_search),
//! [`high_accuracy`](SearchConfig::high_accuracy) and
//! [`balanced`](SearchConfig::balanced).
//!
//! # Selection
//!
//! - [`SelectionPolicy::Tournament`]: scalar-fitness tournament
//! - [`SelectionPolicy::Crowded`]: front rank + crowding tournament
//! - [`SelectionPolicy::Rank`]: linear ranking
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//! - Real et al. (2019), "Regularized Evolution for Image Classifier Architecture Search"

mod config;
mod controller;
mod selection;
mod state;

pub use config::{ConfigurationError, SearchConfig};
pub use controller::{EvolutionController, GenerationStats, RunSummary, SearchError};
pub use selection::SelectionPolicy;
pub use state::SearchState;
