//! Rule-based architecture advisor.
//!
//! Maps a [`Requirements`] vector (task, dataset size, priorities, target
//! hardware, optional hard constraints) to a [`Plan`]: base architecture,
//! modifications, data strategy, training recipe, compression and
//! deployment notes.
//!
//! The mapping is a declarative [`RuleTable`]; [`AdvisorEngine`] only walks
//! it and assembles the plan. The advisor is independent of the live
//! population and has no side effects.

mod engine;
mod rules;
mod types;

pub use engine::{footprint, AdvisorEngine, AdvisorThresholds, Footprint};
pub use rules::{Condition, Effect, Rule, RuleContext, RuleTable, DISTILLATION, PRUNING, QUANTIZATION};
pub use types::{
    AdvisorError, CompressionStep, DatasetSize, Deployment, Plan, Priority, Requirements, TaskType,
    TrainingRecipe,
};
