//! Database models for savings goals and contributions.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use savings_ledger_core::goals::{SavingsContribution, SavingsGoal};
use savings_ledger_core::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database model for savings goals
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::savings_goals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoalDB {
    pub id: String,
    pub goal_type: String,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: String,
    pub current_amount: String,
    pub status: String,
    pub rollover_enabled: bool,
    pub start_month: String,
    pub category: Option<String>,
    pub target_date: Option<String>,
    pub priority: Option<String>,
    pub required_monthly_savings: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for savings contributions
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    Associations,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(belongs_to(SavingsGoalDB, foreign_key = goal_id))]
#[diesel(table_name = crate::schema::savings_contributions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SavingsContributionDB {
    pub id: String,
    pub expense_id: String,
    pub goal_id: String,
    pub amount: String,
    pub date: String,
    pub created_at: NaiveDateTime,
}

fn parse_date(value: &str) -> Result<NaiveDate, Error> {
    Ok(NaiveDate::parse_from_str(value, DATE_FORMAT)?)
}

// Conversion to domain models

impl TryFrom<SavingsGoalDB> for SavingsGoal {
    type Error = Error;

    fn try_from(db: SavingsGoalDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            goal_type: db.goal_type.parse()?,
            name: db.name,
            description: db.description,
            target_amount: Decimal::from_str(&db.target_amount)?,
            current_amount: Decimal::from_str(&db.current_amount)?,
            status: db.status.parse()?,
            rollover_enabled: db.rollover_enabled,
            start_month: db.start_month,
            category: db.category.as_deref().map(str::parse).transpose()?,
            target_date: db.target_date.as_deref().map(parse_date).transpose()?,
            priority: db.priority.as_deref().map(str::parse).transpose()?,
            required_monthly_savings: db
                .required_monthly_savings
                .as_deref()
                .map(Decimal::from_str)
                .transpose()?,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl TryFrom<SavingsContributionDB> for SavingsContribution {
    type Error = Error;

    fn try_from(db: SavingsContributionDB) -> Result<Self, Self::Error> {
        Ok(Self {
            amount: Decimal::from_str(&db.amount)?,
            date: parse_date(&db.date)?,
            id: db.id,
            expense_id: db.expense_id,
            goal_id: db.goal_id,
            created_at: db.created_at,
        })
    }
}

// Amounts are stored as exact decimal text; no rounding on the way in.

impl From<SavingsGoal> for SavingsGoalDB {
    fn from(domain: SavingsGoal) -> Self {
        Self {
            id: domain.id,
            goal_type: domain.goal_type.as_str().to_string(),
            name: domain.name,
            description: domain.description,
            target_amount: domain.target_amount.normalize().to_string(),
            current_amount: domain.current_amount.normalize().to_string(),
            status: domain.status.as_str().to_string(),
            rollover_enabled: domain.rollover_enabled,
            start_month: domain.start_month,
            category: domain.category.map(|c| c.as_str().to_string()),
            target_date: domain
                .target_date
                .map(|d| d.format(DATE_FORMAT).to_string()),
            priority: domain.priority.map(|p| p.as_str().to_string()),
            required_monthly_savings: domain
                .required_monthly_savings
                .map(|r| r.normalize().to_string()),
            created_at: domain.created_at,
            updated_at: domain.updated_at,
        }
    }
}

impl From<SavingsContribution> for SavingsContributionDB {
    fn from(domain: SavingsContribution) -> Self {
        Self {
            id: domain.id,
            expense_id: domain.expense_id,
            goal_id: domain.goal_id,
            amount: domain.amount.normalize().to_string(),
            date: domain.date.format(DATE_FORMAT).to_string(),
            created_at: domain.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SavingsGoalDB {
        let created = NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        SavingsGoalDB {
            id: "g1".to_string(),
            goal_type: "event".to_string(),
            name: "Car".to_string(),
            description: None,
            target_amount: "1200".to_string(),
            current_amount: "200.50".to_string(),
            status: "active".to_string(),
            rollover_enabled: false,
            start_month: "2026-01".to_string(),
            category: Some("emergency_fund".to_string()),
            target_date: Some("2026-07-01".to_string()),
            priority: Some("high".to_string()),
            required_monthly_savings: Some("200".to_string()),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_goal_row_converts_to_domain() {
        let goal = SavingsGoal::try_from(row()).unwrap();
        assert_eq!(goal.current_amount, Decimal::new(20050, 2));
        assert_eq!(goal.target_date, NaiveDate::from_ymd_opt(2026, 7, 1));
        assert_eq!(goal.category.map(|c| c.as_str()), Some("emergency_fund"));

        let back = SavingsGoalDB::from(goal);
        assert_eq!(back.current_amount, "200.5");
        assert_eq!(back.target_date.as_deref(), Some("2026-07-01"));
    }

    #[test]
    fn test_malformed_row_is_an_error() {
        let mut bad = row();
        bad.status = "finished".to_string();
        assert!(SavingsGoal::try_from(bad).is_err());

        let mut bad = row();
        bad.current_amount = "lots".to_string();
        assert!(SavingsGoal::try_from(bad).is_err());
    }
}
