//! Population model and store.
//!
//! An [`Individual`] wraps a genome with its evaluation and ranking state.
//! The [`PopulationStore`] owns the live generation, keeps one immutable
//! [`GenerationSnapshot`] per committed generation and a lineage record for
//! every individual ever committed. Other threads read through a
//! [`StoreReader`].

mod individual;
mod query;
mod store;

pub use individual::{Individual, IndividualId, Viability};
pub use query::{query_order, PopulationRecord};
pub use store::{GenerationSnapshot, LineageRecord, PopulationStore, StoreReader};
