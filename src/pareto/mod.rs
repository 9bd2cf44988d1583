//! Multi-objective ranking (NSGA-II).
//!
//! - [`non_dominated_sort`] and [`crowding_distance`] work on raw
//!   minimization vectors.
//! - [`ParetoRanker`] applies them to a population, with the hard-constraint
//!   policy and the selection tie-break order.
//! - [`pareto_records`], [`to_json`] and [`to_csv`] export ranked fronts.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"

mod dominance;
mod export;
mod ranker;

pub use dominance::{crowding_distance, dominance, non_dominated_sort, Dominance, SortedFronts};
pub use export::{pareto_records, to_csv, to_json, ExportError, FrontSelection, ParetoRecord, CSV_HEADER};
pub use ranker::{assign_fronts, crowded_cmp, Front, FrontMember, ParetoRanker, RankingError};
