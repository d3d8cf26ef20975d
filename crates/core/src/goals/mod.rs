//! Goals module - savings goals, contributions, the ledger service, and traits.

mod goals_calculations;
mod goals_errors;
mod goals_model;
mod goals_service;
mod goals_traits;


pub use goals_calculations::{
    aggregate_progress, contribution_totals, monthly_target, months_to_save, progress_percent,
    projected_completion_date, required_monthly_savings, required_monthly_savings_for,
    rollover_amount, saved_previous_month,
};
pub use goals_errors::GoalError;
pub use goals_model::{
    AllocateSavingsRequest, EventGoalCategory, GoalMetadataUpdate, GoalPriority, LedgerSnapshot,
    NewContribution, NewSavingsGoal, SavingsAllocation, SavingsContribution, SavingsGoal,
    SavingsGoalStatus, SavingsGoalType, SavingsProgress,
};
pub use goals_service::GoalService;
pub use goals_traits::{GoalRepositoryTrait, GoalServiceTrait};
