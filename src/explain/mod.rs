//! Explainability: which architectural features drive fitness.
//!
//! [`ExplainabilityRanker::explain`] scores the seven feature categories of
//! [`Feature`] for one individual, normalizes the scores to sum to 1 and
//! sorts them, then tags the individual's structural [`Trait`]s as positive
//! or negative contributors. Base weights come from an
//! [`ImportanceStrategy`].

mod features;
mod ranker;

pub use features::{network_depth, Feature, Trait};
pub use ranker::{
    ExplainError, ExplainabilityRanker, FeatureAttribution, FeatureImportance, ImportanceStrategy,
};
