//! Savings goal domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::goals::GoalError;
use crate::utils::time_utils::month_id;

/// Kind of savings goal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SavingsGoalType {
    /// A recurring target, conceptually reset each month
    Monthly,
    /// A one-time target amount, usually by a target date
    Event,
}

/// Lifecycle status of a savings goal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SavingsGoalStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
}

/// Planning category of an event goal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventGoalCategory {
    Vacation,
    Vehicle,
    EmergencyFund,
    HomeImprovement,
    Electronics,
    Education,
    Wedding,
    Medical,
    Custom,
}

/// Priority of an event goal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    Low,
    Medium,
    High,
}

macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                        "Unknown {} '{}'",
                        stringify!($ty),
                        other
                    )))),
                }
            }
        }
    };
}

text_enum!(SavingsGoalType {
    Monthly => "monthly",
    Event => "event",
});

text_enum!(SavingsGoalStatus {
    Active => "active",
    Paused => "paused",
    Completed => "completed",
    Cancelled => "cancelled",
});

text_enum!(EventGoalCategory {
    Vacation => "vacation",
    Vehicle => "vehicle",
    EmergencyFund => "emergency_fund",
    HomeImprovement => "home_improvement",
    Electronics => "electronics",
    Education => "education",
    Wedding => "wedding",
    Medical => "medical",
    Custom => "custom",
});

text_enum!(GoalPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl EventGoalCategory {
    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            EventGoalCategory::Vacation => "Vacation",
            EventGoalCategory::Vehicle => "Vehicle",
            EventGoalCategory::EmergencyFund => "Emergency Fund",
            EventGoalCategory::HomeImprovement => "Home Improvement",
            EventGoalCategory::Electronics => "Electronics",
            EventGoalCategory::Education => "Education",
            EventGoalCategory::Wedding => "Wedding",
            EventGoalCategory::Medical => "Medical",
            EventGoalCategory::Custom => "Custom",
        }
    }
}

impl GoalPriority {
    pub fn label(&self) -> &'static str {
        match self {
            GoalPriority::Low => "Low",
            GoalPriority::Medium => "Medium",
            GoalPriority::High => "High",
        }
    }
}

/// Domain model representing a savings goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: String,
    #[serde(rename = "type")]
    pub goal_type: SavingsGoalType,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: Decimal,
    /// Running total of contributions referencing this goal
    pub current_amount: Decimal,
    pub status: SavingsGoalStatus,
    pub rollover_enabled: bool,
    /// Period identifier ("YYYY-MM") the goal started in
    pub start_month: String,
    pub category: Option<EventGoalCategory>,
    pub target_date: Option<NaiveDate>,
    pub priority: Option<GoalPriority>,
    /// Fixed at creation for event goals with a target date
    pub required_monthly_savings: Option<Decimal>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SavingsGoal {
    pub fn is_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    /// Amount still missing, never negative.
    pub fn remaining(&self) -> Decimal {
        (self.target_amount - self.current_amount).max(Decimal::ZERO)
    }

    /// Adds a contribution amount and completes the goal once the target is
    /// reached. Cancelled goals keep their status.
    ///
    /// Fails without touching the goal when the new total is not representable.
    pub(crate) fn credit(&mut self, amount: Decimal, now: NaiveDateTime) -> Result<()> {
        self.current_amount = self.current_amount.checked_add(amount).ok_or_else(|| {
            GoalError::InvalidContribution(format!(
                "adding {} to goal {} overflows its saved amount",
                amount, self.id
            ))
        })?;
        if self.is_reached() && self.status != SavingsGoalStatus::Cancelled {
            self.status = SavingsGoalStatus::Completed;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Rolls back a contribution amount, flooring at zero. A completed goal
    /// that drops below target becomes active again.
    ///
    /// Returns `true` when the floor was hit, i.e. the stored amount had
    /// drifted below what the contribution claims.
    pub(crate) fn debit(&mut self, amount: Decimal, now: NaiveDateTime) -> bool {
        let next = self.current_amount - amount;
        let clamped = next < Decimal::ZERO;
        self.current_amount = next.max(Decimal::ZERO);
        if self.status == SavingsGoalStatus::Completed && !self.is_reached() {
            self.status = SavingsGoalStatus::Active;
        }
        self.updated_at = now;
        clamped
    }

    /// Overwrites the amount with the contribution total and derives the
    /// Active/Completed status from it. Paused and Cancelled are left alone.
    ///
    /// Returns `true` if amount or status changed.
    pub(crate) fn reconcile(&mut self, contributed: Decimal, now: NaiveDateTime) -> bool {
        let status = match self.status {
            SavingsGoalStatus::Paused | SavingsGoalStatus::Cancelled => self.status,
            _ if contributed >= self.target_amount => SavingsGoalStatus::Completed,
            _ => SavingsGoalStatus::Active,
        };
        if contributed == self.current_amount && status == self.status {
            return false;
        }
        self.current_amount = contributed;
        self.status = status;
        self.updated_at = now;
        true
    }
}

/// Input model for creating a new savings goal
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSavingsGoal {
    #[serde(rename = "type")]
    pub goal_type: SavingsGoalType,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: Decimal,
    #[serde(default)]
    pub status: Option<SavingsGoalStatus>,
    #[serde(default)]
    pub rollover_enabled: bool,
    /// Defaults to the creation month
    #[serde(default)]
    pub start_month: Option<String>,
    #[serde(default)]
    pub category: Option<EventGoalCategory>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<GoalPriority>,
}

impl NewSavingsGoal {
    pub fn validate(&self) -> Result<()> {
        if self.target_amount <= Decimal::ZERO {
            return Err(GoalError::InvalidGoalSpec(format!(
                "target amount must be positive, got {}",
                self.target_amount
            ))
            .into());
        }
        if self.name.trim().is_empty() {
            return Err(GoalError::InvalidGoalSpec("name must not be empty".to_string()).into());
        }
        if self.status == Some(SavingsGoalStatus::Completed) {
            return Err(GoalError::InvalidGoalSpec(
                "a new goal cannot start completed".to_string(),
            )
            .into());
        }
        if self.goal_type == SavingsGoalType::Monthly
            && (self.category.is_some() || self.target_date.is_some() || self.priority.is_some())
        {
            return Err(GoalError::InvalidGoalSpec(
                "category, target date and priority only apply to event goals".to_string(),
            )
            .into());
        }
        if let Some(start_month) = &self.start_month {
            let first_day = format!("{}-01", start_month);
            if start_month.len() != 7
                || NaiveDate::parse_from_str(&first_day, "%Y-%m-%d").is_err()
            {
                return Err(GoalError::InvalidGoalSpec(format!(
                    "start month '{}' is not YYYY-MM",
                    start_month
                ))
                .into());
            }
        }
        if self.goal_type == SavingsGoalType::Event && self.rollover_enabled {
            return Err(GoalError::InvalidGoalSpec(
                "rollover only applies to monthly goals".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Event goal pre-filled for a trip.
    pub fn vacation_preset(
        name: &str,
        target_amount: Decimal,
        target_date: NaiveDate,
        today: NaiveDate,
    ) -> Self {
        Self {
            goal_type: SavingsGoalType::Event,
            name: name.to_string(),
            description: Some(format!("Save for {}", name)),
            target_amount,
            status: Some(SavingsGoalStatus::Active),
            rollover_enabled: false,
            start_month: Some(month_id(today)),
            category: Some(EventGoalCategory::Vacation),
            target_date: Some(target_date),
            priority: Some(GoalPriority::High),
        }
    }
}

/// Partial update of the user-editable goal fields.
///
/// Amount fields are deliberately absent: `current_amount` only moves through
/// contributions and recalculation, and `target_amount` is fixed at creation.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GoalMetadataUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<SavingsGoalStatus>,
    pub rollover_enabled: Option<bool>,
    pub category: Option<EventGoalCategory>,
    pub priority: Option<GoalPriority>,
}

impl GoalMetadataUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.rollover_enabled.is_none()
            && self.category.is_none()
            && self.priority.is_none()
    }

    /// Applies the update to `goal`. Completed cannot be requested directly;
    /// asking for Active on a goal that already reached its target keeps it
    /// Completed.
    pub(crate) fn apply_to(self, goal: &mut SavingsGoal, now: NaiveDateTime) -> Result<()> {
        if let Some(name) = self.name {
            if name.trim().is_empty() {
                return Err(
                    GoalError::InvalidGoalUpdate("name must not be empty".to_string()).into(),
                );
            }
            goal.name = name;
        }
        if let Some(description) = self.description {
            goal.description = Some(description);
        }
        if let Some(status) = self.status {
            goal.status = match status {
                SavingsGoalStatus::Completed => {
                    return Err(GoalError::InvalidGoalUpdate(
                        "completed is derived from contributions".to_string(),
                    )
                    .into())
                }
                SavingsGoalStatus::Active if goal.is_reached() => SavingsGoalStatus::Completed,
                other => other,
            };
        }
        if let Some(rollover) = self.rollover_enabled {
            if goal.goal_type != SavingsGoalType::Monthly && rollover {
                return Err(GoalError::InvalidGoalUpdate(
                    "rollover only applies to monthly goals".to_string(),
                )
                .into());
            }
            goal.rollover_enabled = rollover;
        }
        if self.category.is_some() || self.priority.is_some() {
            if goal.goal_type != SavingsGoalType::Event {
                return Err(GoalError::InvalidGoalUpdate(
                    "category and priority only apply to event goals".to_string(),
                )
                .into());
            }
            if let Some(category) = self.category {
                goal.category = Some(category);
            }
            if let Some(priority) = self.priority {
                goal.priority = Some(priority);
            }
        }
        goal.updated_at = now;
        Ok(())
    }
}

/// Domain model for a transfer of money from an expense into a goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingsContribution {
    pub id: String,
    pub expense_id: String,
    pub goal_id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// Input model for adding a contribution
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewContribution {
    pub expense_id: String,
    pub goal_id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// One slice of a savings deposit
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingsAllocation {
    pub goal_id: String,
    pub amount: Decimal,
}

/// Splits one savings expense across several goals
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AllocateSavingsRequest {
    pub expense_id: String,
    pub expense_amount: Decimal,
    pub date: NaiveDate,
    pub allocations: Vec<SavingsAllocation>,
}

/// Summed progress across a set of goals
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SavingsProgress {
    pub current: Decimal,
    pub target: Decimal,
}

/// Full contents of the ledger, used for backup export and import
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub goals: Vec<SavingsGoal>,
    pub contributions: Vec<SavingsContribution>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn goal(target: Decimal, current: Decimal, status: SavingsGoalStatus) -> SavingsGoal {
        SavingsGoal {
            id: "g1".to_string(),
            goal_type: SavingsGoalType::Event,
            name: "Bike".to_string(),
            description: None,
            target_amount: target,
            current_amount: current,
            status,
            rollover_enabled: false,
            start_month: "2026-03".to_string(),
            category: None,
            target_date: None,
            priority: None,
            required_monthly_savings: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_enum_text_round_trip() {
        assert_eq!(
            "emergency_fund".parse::<EventGoalCategory>().unwrap(),
            EventGoalCategory::EmergencyFund
        );
        assert_eq!(SavingsGoalStatus::Cancelled.as_str(), "cancelled");
        assert!("finished".parse::<SavingsGoalStatus>().is_err());
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(EventGoalCategory::HomeImprovement.label(), "Home Improvement");
        assert_eq!(GoalPriority::Medium.label(), "Medium");
    }

    #[test]
    fn test_credit_completes_goal() {
        let mut g = goal(dec!(100), dec!(60), SavingsGoalStatus::Paused);
        g.credit(dec!(40), now()).unwrap();
        assert_eq!(g.current_amount, dec!(100));
        assert_eq!(g.status, SavingsGoalStatus::Completed);
    }

    #[test]
    fn test_credit_keeps_cancelled() {
        let mut g = goal(dec!(100), dec!(90), SavingsGoalStatus::Cancelled);
        g.credit(dec!(50), now()).unwrap();
        assert_eq!(g.current_amount, dec!(140));
        assert_eq!(g.status, SavingsGoalStatus::Cancelled);
    }

    #[test]
    fn test_credit_overflow_leaves_goal_untouched() {
        let mut g = goal(dec!(100), Decimal::MAX, SavingsGoalStatus::Completed);
        let before = g.clone();
        let err = g.credit(dec!(1), now()).unwrap_err();
        assert!(matches!(err, Error::Goal(GoalError::InvalidContribution(_))));
        assert_eq!(g, before);
    }

    #[test]
    fn test_debit_floors_at_zero_and_reopens() {
        let mut g = goal(dec!(100), dec!(30), SavingsGoalStatus::Completed);
        assert!(g.debit(dec!(50), now()));
        assert_eq!(g.current_amount, Decimal::ZERO);
        assert_eq!(g.status, SavingsGoalStatus::Active);
    }

    #[test]
    fn test_debit_leaves_paused_alone() {
        let mut g = goal(dec!(100), dec!(80), SavingsGoalStatus::Paused);
        assert!(!g.debit(dec!(30), now()));
        assert_eq!(g.current_amount, dec!(50));
        assert_eq!(g.status, SavingsGoalStatus::Paused);
    }

    #[test]
    fn test_reconcile_preserves_paused_and_cancelled() {
        let mut paused = goal(dec!(100), dec!(10), SavingsGoalStatus::Paused);
        assert!(paused.reconcile(dec!(150), now()));
        assert_eq!(paused.status, SavingsGoalStatus::Paused);

        let mut cancelled = goal(dec!(100), dec!(10), SavingsGoalStatus::Cancelled);
        assert!(cancelled.reconcile(dec!(0), now()));
        assert_eq!(cancelled.status, SavingsGoalStatus::Cancelled);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut g = goal(dec!(100), dec!(70), SavingsGoalStatus::Active);
        assert!(!g.reconcile(dec!(70), now()));
        assert!(g.reconcile(dec!(120), now()));
        assert_eq!(g.status, SavingsGoalStatus::Completed);
        assert!(!g.reconcile(dec!(120), now()));
    }

    #[test]
    fn test_new_goal_rejects_non_positive_target() {
        let spec = NewSavingsGoal::vacation_preset(
            "Lisbon",
            dec!(0),
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        );
        let err = spec.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::Goal(GoalError::InvalidGoalSpec(_))
        ));
    }

    #[test]
    fn test_vacation_preset() {
        let spec = NewSavingsGoal::vacation_preset(
            "Lisbon",
            dec!(1500),
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        );
        assert!(spec.validate().is_ok());
        assert_eq!(spec.description.as_deref(), Some("Save for Lisbon"));
        assert_eq!(spec.start_month.as_deref(), Some("2026-03"));
        assert_eq!(spec.category, Some(EventGoalCategory::Vacation));
        assert_eq!(spec.priority, Some(GoalPriority::High));
    }

    #[test]
    fn test_metadata_update_rejects_amount_fields() {
        let json = r#"{"status":"paused","currentAmount":5000}"#;
        assert!(serde_json::from_str::<GoalMetadataUpdate>(json).is_err());
    }

    #[test]
    fn test_metadata_update_rejects_completed() {
        let mut g = goal(dec!(100), dec!(10), SavingsGoalStatus::Active);
        let update = GoalMetadataUpdate {
            status: Some(SavingsGoalStatus::Completed),
            ..Default::default()
        };
        assert!(update.apply_to(&mut g, now()).is_err());
    }

    #[test]
    fn test_metadata_update_resume_reached_goal_stays_completed() {
        let mut g = goal(dec!(100), dec!(100), SavingsGoalStatus::Paused);
        let update = GoalMetadataUpdate {
            status: Some(SavingsGoalStatus::Active),
            description: Some("almost there".to_string()),
            ..Default::default()
        };
        update.apply_to(&mut g, now()).unwrap();
        assert_eq!(g.status, SavingsGoalStatus::Completed);
        assert_eq!(g.description.as_deref(), Some("almost there"));
    }
}
