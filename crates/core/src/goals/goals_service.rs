use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::goals::goals_calculations::{
    aggregate_progress, contribution_totals, monthly_target, required_monthly_savings,
    required_monthly_savings_for,
};
use crate::goals::goals_model::{
    AllocateSavingsRequest, GoalMetadataUpdate, LedgerSnapshot, NewContribution, NewSavingsGoal,
    SavingsContribution, SavingsGoal, SavingsGoalStatus, SavingsGoalType, SavingsProgress,
};
use crate::goals::goals_traits::{GoalRepositoryTrait, GoalServiceTrait};
use crate::goals::GoalError;
use crate::utils::time_utils::{local_today, month_id};

type TodayFn = dyn Fn() -> NaiveDate + Send + Sync;

/// The savings ledger.
///
/// Owns goal and contribution bookkeeping. Construct one per process and hand
/// it to every caller. Amount-moving operations are serialized so that the
/// read-modify-write of `current_amount` never interleaves.
pub struct GoalService {
    goal_repo: Arc<dyn GoalRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    today: Arc<TodayFn>,
    write_lock: Mutex<()>,
}

impl GoalService {
    pub fn new(goal_repo: Arc<dyn GoalRepositoryTrait>) -> Self {
        GoalService {
            goal_repo,
            event_sink: Arc::new(NoOpDomainEventSink),
            today: Arc::new(local_today),
            write_lock: Mutex::new(()),
        }
    }

    /// Sets the domain event sink notified after each mutation.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    /// Overrides the source of "today" used for month arithmetic.
    pub fn with_today<F>(mut self, today: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.today = Arc::new(today);
        self
    }

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    fn load_goal(&self, goal_id: &str) -> Result<SavingsGoal> {
        self.goal_repo
            .get_goal(goal_id)?
            .ok_or_else(|| GoalError::GoalNotFound(goal_id.to_string()).into())
    }

    fn new_contribution(
        expense_id: &str,
        goal_id: &str,
        amount: Decimal,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> SavingsContribution {
        SavingsContribution {
            id: Uuid::new_v4().to_string(),
            expense_id: expense_id.to_string(),
            goal_id: goal_id.to_string(),
            amount,
            date,
            created_at: now,
        }
    }

    /// Recomputes goals from contributions. Caller must hold the write lock.
    async fn recalculate_locked(&self) -> Result<Vec<SavingsGoal>> {
        let goals = self.goal_repo.load_goals()?;
        let contributions = self.goal_repo.load_contributions()?;

        let totals = contribution_totals(&contributions).ok_or_else(|| {
            GoalError::InvalidContribution("contribution total overflows".to_string())
        })?;

        let now = Self::now();
        let repaired: Vec<SavingsGoal> = goals
            .into_iter()
            .filter_map(|mut goal| {
                let contributed = totals
                    .get(goal.id.as_str())
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                let stored = goal.current_amount;
                if goal.reconcile(contributed, now) {
                    warn!(
                        "Goal {} drifted: stored {} but contributions sum to {}",
                        goal.id, stored, contributed
                    );
                    Some(goal)
                } else {
                    None
                }
            })
            .collect();

        if !repaired.is_empty() {
            self.goal_repo.update_goals(repaired.clone()).await?;
        }
        info!(
            "Recalculated {} contributions, repaired {} goals",
            contributions.len(),
            repaired.len()
        );
        Ok(repaired)
    }

    fn validate_snapshot(snapshot: &LedgerSnapshot) -> Result<()> {
        let goal_ids: HashSet<&str> = snapshot.goals.iter().map(|g| g.id.as_str()).collect();
        if let Some(goal) = snapshot
            .goals
            .iter()
            .find(|g| g.target_amount <= Decimal::ZERO)
        {
            return Err(GoalError::InvalidGoalSpec(format!(
                "goal {} has a non-positive target amount",
                goal.id
            ))
            .into());
        }
        for contribution in &snapshot.contributions {
            if contribution.amount <= Decimal::ZERO {
                return Err(GoalError::InvalidContribution(format!(
                    "contribution {} has a non-positive amount",
                    contribution.id
                ))
                .into());
            }
            if !goal_ids.contains(contribution.goal_id.as_str()) {
                return Err(GoalError::GoalNotFound(contribution.goal_id.clone()).into());
            }
        }
        if contribution_totals(&snapshot.contributions).is_none() {
            return Err(GoalError::InvalidContribution(
                "contribution total overflows".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl GoalServiceTrait for GoalService {
    fn get_goals(&self, status: Option<SavingsGoalStatus>) -> Result<Vec<SavingsGoal>> {
        let goals = self.goal_repo.load_goals()?;
        Ok(match status {
            Some(status) => goals.into_iter().filter(|g| g.status == status).collect(),
            None => goals,
        })
    }

    fn get_goal(&self, goal_id: &str) -> Result<Option<SavingsGoal>> {
        self.goal_repo.get_goal(goal_id)
    }

    async fn create_goal(&self, new_goal: NewSavingsGoal) -> Result<SavingsGoal> {
        new_goal.validate()?;

        let today = (self.today)();
        let now = Self::now();
        let required_monthly_savings = match (new_goal.goal_type, new_goal.target_date) {
            (SavingsGoalType::Event, Some(target_date)) => Some(required_monthly_savings_for(
                new_goal.target_amount,
                today,
                target_date,
            )),
            _ => None,
        };

        let goal = SavingsGoal {
            id: Uuid::new_v4().to_string(),
            goal_type: new_goal.goal_type,
            name: new_goal.name,
            description: new_goal.description,
            target_amount: new_goal.target_amount,
            current_amount: Decimal::ZERO,
            status: new_goal.status.unwrap_or(SavingsGoalStatus::Active),
            rollover_enabled: new_goal.rollover_enabled,
            start_month: new_goal.start_month.unwrap_or_else(|| month_id(today)),
            category: new_goal.category,
            target_date: new_goal.target_date,
            priority: new_goal.priority,
            required_monthly_savings,
            created_at: now,
            updated_at: now,
        };

        let created = self.goal_repo.insert_new_goal(goal).await?;
        info!(
            "Created {} goal {} with target {}",
            created.goal_type, created.id, created.target_amount
        );
        self.event_sink
            .emit(DomainEvent::goals_changed(vec![created.id.clone()]));
        Ok(created)
    }

    async fn update_goal_metadata(
        &self,
        goal_id: &str,
        update: GoalMetadataUpdate,
    ) -> Result<Option<SavingsGoal>> {
        let _guard = self.write_lock.lock().await;

        let Some(mut goal) = self.goal_repo.get_goal(goal_id)? else {
            debug!("Ignoring update for unknown goal {}", goal_id);
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(goal));
        }

        update.apply_to(&mut goal, Self::now())?;
        let updated = self.goal_repo.update_goal(goal).await?;
        self.event_sink
            .emit(DomainEvent::goals_changed(vec![updated.id.clone()]));
        Ok(Some(updated))
    }

    async fn delete_goal(&self, goal_id: &str) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let deleted = self.goal_repo.delete_goal(goal_id.to_string()).await?;
        if deleted > 0 {
            info!("Deleted goal {} and its contributions", goal_id);
            self.event_sink
                .emit(DomainEvent::goals_changed(vec![goal_id.to_string()]));
        } else {
            debug!("Goal {} already absent", goal_id);
        }
        Ok(deleted)
    }

    fn get_contributions(&self, goal_id: Option<&str>) -> Result<Vec<SavingsContribution>> {
        match goal_id {
            Some(goal_id) => self.goal_repo.load_contributions_for_goal(goal_id),
            None => self.goal_repo.load_contributions(),
        }
    }

    async fn add_contribution(&self, contribution: NewContribution) -> Result<SavingsContribution> {
        if contribution.amount <= Decimal::ZERO {
            return Err(GoalError::InvalidContribution(format!(
                "amount must be positive, got {}",
                contribution.amount
            ))
            .into());
        }

        let _guard = self.write_lock.lock().await;

        let mut goal = self.load_goal(&contribution.goal_id)?;
        let now = Self::now();
        let record = Self::new_contribution(
            &contribution.expense_id,
            &contribution.goal_id,
            contribution.amount,
            contribution.date,
            now,
        );
        goal.credit(contribution.amount, now)?;
        let completed = goal.status == SavingsGoalStatus::Completed;

        let saved = self
            .goal_repo
            .insert_contributions(vec![record], vec![goal])
            .await?
            .pop()
            .ok_or_else(|| Error::Unexpected("contribution was not stored".to_string()))?;

        info!(
            "Contributed {} from expense {} to goal {}{}",
            saved.amount,
            saved.expense_id,
            saved.goal_id,
            if completed { " (completed)" } else { "" }
        );
        self.event_sink.emit(DomainEvent::contributions_changed(
            vec![saved.goal_id.clone()],
            vec![saved.expense_id.clone()],
        ));
        Ok(saved)
    }

    async fn allocate_savings(
        &self,
        request: AllocateSavingsRequest,
    ) -> Result<Vec<SavingsContribution>> {
        if request.expense_amount <= Decimal::ZERO {
            return Err(GoalError::InvalidAllocation(format!(
                "deposit must be positive, got {}",
                request.expense_amount
            ))
            .into());
        }
        let slices: Vec<_> = request
            .allocations
            .iter()
            .filter(|a| !a.amount.is_zero())
            .collect();
        if let Some(negative) = slices.iter().find(|a| a.amount < Decimal::ZERO) {
            return Err(GoalError::InvalidAllocation(format!(
                "negative amount {} for goal {}",
                negative.amount, negative.goal_id
            ))
            .into());
        }
        let allocated = slices
            .iter()
            .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a.amount))
            .ok_or_else(|| GoalError::InvalidAllocation("allocation total overflows".to_string()))?;
        if allocated > request.expense_amount {
            return Err(GoalError::InvalidAllocation(format!(
                "allocated {} exceeds deposit {}",
                allocated, request.expense_amount
            ))
            .into());
        }
        if slices.is_empty() {
            return Ok(Vec::new());
        }

        let _guard = self.write_lock.lock().await;

        let mut goals: HashMap<String, SavingsGoal> = HashMap::new();
        for slice in &slices {
            if let Entry::Vacant(entry) = goals.entry(slice.goal_id.clone()) {
                entry.insert(self.load_goal(&slice.goal_id)?);
            }
        }

        let now = Self::now();
        let mut records = Vec::with_capacity(slices.len());
        for slice in &slices {
            if let Some(goal) = goals.get_mut(&slice.goal_id) {
                goal.credit(slice.amount, now)?;
            }
            records.push(Self::new_contribution(
                &request.expense_id,
                &slice.goal_id,
                slice.amount,
                request.date,
                now,
            ));
        }

        let goal_ids: Vec<String> = goals.keys().cloned().collect();
        let saved = self
            .goal_repo
            .insert_contributions(records, goals.into_values().collect())
            .await?;

        info!(
            "Allocated {} of {} from expense {} across {} goals",
            allocated,
            request.expense_amount,
            request.expense_id,
            goal_ids.len()
        );
        self.event_sink.emit(DomainEvent::contributions_changed(
            goal_ids,
            vec![request.expense_id.clone()],
        ));
        Ok(saved)
    }

    async fn remove_contributions_for_expense(&self, expense_id: &str) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let contributions = self.goal_repo.load_contributions_for_expense(expense_id)?;
        if contributions.is_empty() {
            debug!("Expense {} has no contributions", expense_id);
            return Ok(0);
        }

        let now = Self::now();
        let mut goals: HashMap<String, SavingsGoal> = HashMap::new();
        for contribution in &contributions {
            let goal = match goals.entry(contribution.goal_id.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => match self.goal_repo.get_goal(&contribution.goal_id)? {
                    Some(goal) => entry.insert(goal),
                    None => {
                        warn!(
                            "Contribution {} references missing goal {}",
                            contribution.id, contribution.goal_id
                        );
                        continue;
                    }
                },
            };
            if goal.debit(contribution.amount, now) {
                warn!(
                    "Goal {} amount floored at zero while removing contribution {}",
                    goal.id, contribution.id
                );
            }
        }

        let goal_ids: Vec<String> = goals.keys().cloned().collect();
        let removed = self
            .goal_repo
            .delete_contributions_for_expense(expense_id.to_string(), goals.into_values().collect())
            .await?;

        info!(
            "Removed {} contributions of expense {} from {} goals",
            removed,
            expense_id,
            goal_ids.len()
        );
        self.event_sink.emit(DomainEvent::contributions_changed(
            goal_ids,
            vec![expense_id.to_string()],
        ));
        Ok(removed)
    }

    async fn recalculate(&self) -> Result<Vec<SavingsGoal>> {
        let _guard = self.write_lock.lock().await;

        let repaired = self.recalculate_locked().await?;
        self.event_sink.emit(DomainEvent::ledger_recalculated(
            repaired.iter().map(|g| g.id.clone()).collect(),
        ));
        Ok(repaired)
    }

    fn get_required_monthly_savings(&self, goal_id: &str) -> Result<Decimal> {
        let goal = self.load_goal(goal_id)?;
        Ok(required_monthly_savings(&goal, self.today()))
    }

    fn get_aggregate_progress(&self, status: SavingsGoalStatus) -> Result<SavingsProgress> {
        let goals = self.goal_repo.load_goals()?;
        aggregate_progress(&goals, status)
            .ok_or_else(|| Error::Unexpected(format!("{} goal totals overflow", status)))
    }

    fn get_monthly_target(&self) -> Result<Decimal> {
        let goals = self.goal_repo.load_goals()?;
        monthly_target(&goals, self.today())
            .ok_or_else(|| Error::Unexpected("monthly target overflows".to_string()))
    }

    fn today(&self) -> NaiveDate {
        (self.today)()
    }

    fn export_snapshot(&self) -> Result<LedgerSnapshot> {
        Ok(LedgerSnapshot {
            goals: self.goal_repo.load_goals()?,
            contributions: self.goal_repo.load_contributions()?,
        })
    }

    async fn import_snapshot(&self, snapshot: LedgerSnapshot) -> Result<Vec<SavingsGoal>> {
        Self::validate_snapshot(&snapshot)?;

        let _guard = self.write_lock.lock().await;

        let goal_count = snapshot.goals.len();
        let contribution_count = snapshot.contributions.len();
        self.goal_repo.replace_ledger(snapshot).await?;
        info!(
            "Imported {} goals and {} contributions",
            goal_count, contribution_count
        );

        let repaired = self.recalculate_locked().await?;
        self.event_sink
            .emit(DomainEvent::ledger_imported(goal_count, contribution_count));
        Ok(repaired)
    }
}
