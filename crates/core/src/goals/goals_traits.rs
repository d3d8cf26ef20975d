use crate::errors::Result;
use crate::goals::goals_model::{
    AllocateSavingsRequest, GoalMetadataUpdate, LedgerSnapshot, NewContribution, NewSavingsGoal,
    SavingsContribution, SavingsGoal, SavingsGoalStatus, SavingsProgress,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Trait for savings ledger persistence.
///
/// Storage holds the records; it enforces no business rules. Every async
/// method is one write unit: implementations must apply all of its effects or
/// none of them.
#[async_trait]
pub trait GoalRepositoryTrait: Send + Sync {
    fn load_goals(&self) -> Result<Vec<SavingsGoal>>;
    fn get_goal(&self, goal_id: &str) -> Result<Option<SavingsGoal>>;
    async fn insert_new_goal(&self, goal: SavingsGoal) -> Result<SavingsGoal>;
    async fn update_goal(&self, goal: SavingsGoal) -> Result<SavingsGoal>;
    async fn update_goals(&self, goals: Vec<SavingsGoal>) -> Result<usize>;
    /// Deletes the goal together with its contributions. Returns the number of
    /// goal rows removed.
    async fn delete_goal(&self, goal_id: String) -> Result<usize>;

    fn load_contributions(&self) -> Result<Vec<SavingsContribution>>;
    fn load_contributions_for_goal(&self, goal_id: &str) -> Result<Vec<SavingsContribution>>;
    fn load_contributions_for_expense(&self, expense_id: &str)
        -> Result<Vec<SavingsContribution>>;
    /// Inserts the contributions and writes the goals they moved.
    async fn insert_contributions(
        &self,
        contributions: Vec<SavingsContribution>,
        goals: Vec<SavingsGoal>,
    ) -> Result<Vec<SavingsContribution>>;
    /// Deletes every contribution of `expense_id` and writes the goals they
    /// moved. Returns the number of contributions removed.
    async fn delete_contributions_for_expense(
        &self,
        expense_id: String,
        goals: Vec<SavingsGoal>,
    ) -> Result<usize>;

    /// Replaces both collections with the snapshot contents.
    async fn replace_ledger(&self, snapshot: LedgerSnapshot) -> Result<()>;
}

/// Trait for savings ledger operations
#[async_trait]
pub trait GoalServiceTrait: Send + Sync {
    fn get_goals(&self, status: Option<SavingsGoalStatus>) -> Result<Vec<SavingsGoal>>;
    fn get_goal(&self, goal_id: &str) -> Result<Option<SavingsGoal>>;
    async fn create_goal(&self, new_goal: NewSavingsGoal) -> Result<SavingsGoal>;
    /// Returns `None` when the goal does not exist.
    async fn update_goal_metadata(
        &self,
        goal_id: &str,
        update: GoalMetadataUpdate,
    ) -> Result<Option<SavingsGoal>>;
    async fn delete_goal(&self, goal_id: &str) -> Result<usize>;

    fn get_contributions(&self, goal_id: Option<&str>) -> Result<Vec<SavingsContribution>>;
    async fn add_contribution(&self, contribution: NewContribution) -> Result<SavingsContribution>;
    async fn allocate_savings(
        &self,
        request: AllocateSavingsRequest,
    ) -> Result<Vec<SavingsContribution>>;
    /// Rolls back everything an expense contributed. Returns the number of
    /// contributions removed.
    async fn remove_contributions_for_expense(&self, expense_id: &str) -> Result<usize>;
    /// Recomputes every goal from its contributions. Returns the goals that
    /// had to be rewritten.
    async fn recalculate(&self) -> Result<Vec<SavingsGoal>>;

    fn get_required_monthly_savings(&self, goal_id: &str) -> Result<Decimal>;
    fn get_aggregate_progress(&self, status: SavingsGoalStatus) -> Result<SavingsProgress>;
    fn get_monthly_target(&self) -> Result<Decimal>;
    /// The date month arithmetic is anchored to.
    fn today(&self) -> NaiveDate;

    fn export_snapshot(&self) -> Result<LedgerSnapshot>;
    async fn import_snapshot(&self, snapshot: LedgerSnapshot) -> Result<Vec<SavingsGoal>>;
}
