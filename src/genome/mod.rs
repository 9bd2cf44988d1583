//! Genome model.
//!
//! A [`Genome`] is the structural description of one candidate architecture:
//! a cell DAG over node indices `0..node_count` whose edges carry
//! [`Operation`]s, stacked `cells` times at a given channel width.
//! Its measured outcome is an [`ObjectiveVector`].
//!
//! # Submodules
//!
//! - [`operators`]: random initialization, crossover and mutation
//! - [`validate()`]: structural checks and topological order
//!
//! # Example
//!
//! ```
//! use u_nas::genome::{validate, Genome, GenomeId, Operation};
//!
//! let genome = Genome::new(GenomeId(1), 3, Operation::DEFAULT_CATALOG.to_vec())
//!     .connect(0, 1, Operation::Conv3x3)
//!     .connect(1, 2, Operation::MaxPool)
//!     .connect(0, 2, Operation::Skip);
//!
//! assert_eq!(validate(&genome).unwrap(), vec![0, 1, 2]);
//! ```

mod objectives;
pub mod operators;
mod types;
mod validate;

pub use objectives::{Constraints, ObjectiveVector, OBJECTIVE_COUNT};
pub use operators::{MutationKind, SearchSpace};
pub use types::{Activation, Connection, Genome, GenomeId, Operation, StructureKey};
pub use validate::{cell_depth, validate, GenomeValidationError};
