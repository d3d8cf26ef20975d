//! SQLite storage implementation for savings goals and contributions.

mod model;
mod repository;

pub use model::{SavingsContributionDB, SavingsGoalDB};
pub use repository::GoalRepository;
