//! Multi-objective neural architecture search core.
//!
//! Evolves a population of candidate network architectures under four
//! competing objectives (accuracy, FLOPs, parameter count, latency) and
//! exposes ranked, explainable results:
//!
//! - **Genome**: cell-based DAG representation, validation and genetic
//!   operators.
//! - **Evaluator**: pluggable fitness capability, plus an analytic proxy
//!   model and a memoizing cache.
//! - **Pareto**: NSGA-II non-dominated sorting, crowding distance,
//!   constraint-aware ranking and front export.
//! - **Population**: versioned store with per-generation snapshots and
//!   lineage.
//! - **Search**: the evolution controller state machine with seeded,
//!   reproducible runs and parallel evaluation.
//! - **Explain**: normalized feature importance and trait attribution.
//! - **Advisor**: declarative rule table mapping requirements to an
//!   architecture plan.
//!
//! # Example
//!
//! ```
//! use u_nas::evaluator::ProxyEvaluator;
//! use u_nas::pareto::{pareto_records, to_csv, FrontSelection};
//! use u_nas::search::{EvolutionController, SearchConfig};
//!
//! let config = SearchConfig::edge_search()
//!     .with_population_size(16)
//!     .with_seed(42);
//! let mut controller = EvolutionController::new(ProxyEvaluator::new());
//! controller.initialize(config).unwrap();
//! controller.run(3).unwrap();
//!
//! let records = pareto_records(&controller.snapshot(), FrontSelection::ParetoOptimal);
//! assert!(!records.is_empty());
//! assert!(to_csv(&records).starts_with("modelId,accuracy"));
//! ```

pub mod advisor;
pub mod evaluator;
pub mod explain;
pub mod genome;
pub mod hardware;
pub mod pareto;
pub mod population;
pub mod random;
pub mod search;
