//! Pluggable fitness evaluation.
//!
//! The search core depends on evaluation only through the
//! [`FitnessEvaluator`] contract: one method mapping a genome to an
//! [`ObjectiveVector`](crate::genome::ObjectiveVector), with a declared
//! failure mode ([`EvaluationError`]). Training, hardware measurement and
//! surrogate models all live behind it.
//!
//! # Provided implementations
//!
//! - [`ProxyEvaluator`]: deterministic analytic cost model
//! - [`CachedEvaluator`]: memoizing wrapper keyed by genome structure
//!
//! [`SearchObjective`] turns an objective vector into the scalar fitness
//! used for tournaments, elitism and progress reporting.

mod cache;
mod fitness;
mod proxy;
mod types;

pub use cache::CachedEvaluator;
pub use fitness::SearchObjective;
pub use proxy::ProxyEvaluator;
pub use types::{check_objectives, EvaluationError, FitnessEvaluator};
