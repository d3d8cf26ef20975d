use thiserror::Error;

/// Ledger rule violations surfaced to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GoalError {
    #[error("Invalid goal: {0}")]
    InvalidGoalSpec(String),

    #[error("Goal not found: {0}")]
    GoalNotFound(String),

    #[error("Invalid contribution: {0}")]
    InvalidContribution(String),

    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("Invalid goal update: {0}")]
    InvalidGoalUpdate(String),
}
