//! Search lifecycle states.

use serde::Serialize;
use std::fmt;

/// Lifecycle of an [`EvolutionController`](super::EvolutionController).
///
/// ```text
/// Uninitialized -> Initialized -> Evaluating -> Ranking -> Selecting
///     -> Varying -> Replaced -> (Evaluating ...) -> Completed
/// ```
///
/// `Failed` is entered on a fatal error (population collapse or ranking
/// inconsistency); only `initialize` leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    Uninitialized,
    Initialized,
    Evaluating,
    Ranking,
    Selecting,
    Varying,
    Replaced,
    Completed,
    Failed,
}

impl SearchState {
    /// Whether `step_generation` may be called.
    pub fn can_step(self) -> bool {
        matches!(self, SearchState::Initialized | SearchState::Replaced)
    }

    /// Whether `run` may be called.
    pub fn can_run(self) -> bool {
        self.can_step() || self == SearchState::Completed
    }

    pub fn name(self) -> &'static str {
        match self {
            SearchState::Uninitialized => "uninitialized",
            SearchState::Initialized => "initialized",
            SearchState::Evaluating => "evaluating",
            SearchState::Ranking => "ranking",
            SearchState::Selecting => "selecting",
            SearchState::Varying => "varying",
            SearchState::Replaced => "replaced",
            SearchState::Completed => "completed",
            SearchState::Failed => "failed",
        }
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_permissions() {
        assert!(SearchState::Initialized.can_step());
        assert!(SearchState::Replaced.can_step());
        assert!(!SearchState::Uninitialized.can_step());
        assert!(!SearchState::Completed.can_step());
        assert!(SearchState::Completed.can_run());
        assert!(!SearchState::Failed.can_run());
    }
}
