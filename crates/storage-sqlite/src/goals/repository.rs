use savings_ledger_core::goals::{
    GoalRepositoryTrait, LedgerSnapshot, SavingsContribution, SavingsGoal,
};
use savings_ledger_core::Result;

use super::model::{SavingsContributionDB, SavingsGoalDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{savings_contributions, savings_goals};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;

use std::sync::Arc;

pub struct GoalRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

fn to_goals(rows: Vec<SavingsGoalDB>) -> Result<Vec<SavingsGoal>> {
    rows.into_iter().map(SavingsGoal::try_from).collect()
}

fn to_contributions(rows: Vec<SavingsContributionDB>) -> Result<Vec<SavingsContribution>> {
    rows.into_iter().map(SavingsContribution::try_from).collect()
}

fn write_goal(conn: &mut SqliteConnection, goal: SavingsGoal) -> Result<usize> {
    let goal_db = SavingsGoalDB::from(goal);
    diesel::update(savings_goals::table.find(&goal_db.id))
        .set(&goal_db)
        .execute(conn)
        .into_core()
}

fn insert_contribution_rows(
    conn: &mut SqliteConnection,
    contributions: &[SavingsContribution],
) -> Result<()> {
    for contribution in contributions {
        diesel::insert_into(savings_contributions::table)
            .values(SavingsContributionDB::from(contribution.clone()))
            .execute(conn)
            .into_core()?;
    }
    Ok(())
}

impl GoalRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        GoalRepository { pool, writer }
    }

    fn load_contributions_where<F>(&self, filter: F) -> Result<Vec<SavingsContribution>>
    where
        F: FnOnce(
            savings_contributions::BoxedQuery<'static, diesel::sqlite::Sqlite>,
        ) -> savings_contributions::BoxedQuery<'static, diesel::sqlite::Sqlite>,
    {
        let mut conn = get_connection(&self.pool)?;
        let rows = filter(savings_contributions::table.into_boxed())
            .order((savings_contributions::date.asc(), savings_contributions::created_at.asc()))
            .select(SavingsContributionDB::as_select())
            .load::<SavingsContributionDB>(&mut conn)
            .into_core()?;
        to_contributions(rows)
    }
}

#[async_trait]
impl GoalRepositoryTrait for GoalRepository {
    fn load_goals(&self) -> Result<Vec<SavingsGoal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = savings_goals::table
            .order(savings_goals::created_at.asc())
            .select(SavingsGoalDB::as_select())
            .load::<SavingsGoalDB>(&mut conn)
            .into_core()?;
        to_goals(rows)
    }

    fn get_goal(&self, goal_id: &str) -> Result<Option<SavingsGoal>> {
        let mut conn = get_connection(&self.pool)?;
        savings_goals::table
            .find(goal_id)
            .select(SavingsGoalDB::as_select())
            .first::<SavingsGoalDB>(&mut conn)
            .optional()
            .into_core()?
            .map(SavingsGoal::try_from)
            .transpose()
    }

    async fn insert_new_goal(&self, goal: SavingsGoal) -> Result<SavingsGoal> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SavingsGoal> {
                let goal_db = SavingsGoalDB::from(goal);
                let result_db = diesel::insert_into(savings_goals::table)
                    .values(&goal_db)
                    .returning(SavingsGoalDB::as_returning())
                    .get_result(conn)
                    .into_core()?;
                SavingsGoal::try_from(result_db)
            })
            .await
    }

    async fn update_goal(&self, goal: SavingsGoal) -> Result<SavingsGoal> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SavingsGoal> {
                let goal_id = goal.id.clone();
                write_goal(conn, goal)?;
                let result_db = savings_goals::table
                    .find(goal_id)
                    .select(SavingsGoalDB::as_select())
                    .first::<SavingsGoalDB>(conn)
                    .into_core()?;
                SavingsGoal::try_from(result_db)
            })
            .await
    }

    async fn update_goals(&self, goals: Vec<SavingsGoal>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut affected_rows = 0;
                for goal in goals {
                    affected_rows += write_goal(conn, goal)?;
                }
                Ok(affected_rows)
            })
            .await
    }

    async fn delete_goal(&self, goal_id: String) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let contributions = diesel::delete(
                    savings_contributions::table
                        .filter(savings_contributions::goal_id.eq(&goal_id)),
                )
                .execute(conn)
                .into_core()?;
                let goals = diesel::delete(savings_goals::table.find(&goal_id))
                    .execute(conn)
                    .into_core()?;
                debug!(
                    "Deleted goal {} ({} rows) with {} contributions",
                    goal_id, goals, contributions
                );
                Ok(goals)
            })
            .await
    }

    fn load_contributions(&self) -> Result<Vec<SavingsContribution>> {
        self.load_contributions_where(|query| query)
    }

    fn load_contributions_for_goal(&self, goal_id: &str) -> Result<Vec<SavingsContribution>> {
        let goal_id = goal_id.to_string();
        self.load_contributions_where(move |query| {
            query.filter(savings_contributions::goal_id.eq(goal_id))
        })
    }

    fn load_contributions_for_expense(
        &self,
        expense_id: &str,
    ) -> Result<Vec<SavingsContribution>> {
        let expense_id = expense_id.to_string();
        self.load_contributions_where(move |query| {
            query.filter(savings_contributions::expense_id.eq(expense_id))
        })
    }

    async fn insert_contributions(
        &self,
        contributions: Vec<SavingsContribution>,
        goals: Vec<SavingsGoal>,
    ) -> Result<Vec<SavingsContribution>> {
        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<Vec<SavingsContribution>> {
                    insert_contribution_rows(conn, &contributions)?;
                    for goal in goals {
                        write_goal(conn, goal)?;
                    }
                    Ok(contributions)
                },
            )
            .await
    }

    async fn delete_contributions_for_expense(
        &self,
        expense_id: String,
        goals: Vec<SavingsGoal>,
    ) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let removed = diesel::delete(
                    savings_contributions::table
                        .filter(savings_contributions::expense_id.eq(&expense_id)),
                )
                .execute(conn)
                .into_core()?;
                for goal in goals {
                    write_goal(conn, goal)?;
                }
                Ok(removed)
            })
            .await
    }

    async fn replace_ledger(&self, snapshot: LedgerSnapshot) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::delete(savings_contributions::table)
                    .execute(conn)
                    .into_core()?;
                diesel::delete(savings_goals::table)
                    .execute(conn)
                    .into_core()?;
                for goal in snapshot.goals {
                    diesel::insert_into(savings_goals::table)
                        .values(SavingsGoalDB::from(goal))
                        .execute(conn)
                        .into_core()?;
                }
                insert_contribution_rows(conn, &snapshot.contributions)
            })
            .await
    }
}
