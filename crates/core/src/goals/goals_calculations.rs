//! Figures derived from goals: required monthly savings, progress, targets.

use std::collections::HashMap;

use chrono::{Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::constants::{DECIMAL_PRECISION, MAX_PROGRESS_PERCENT};
use crate::goals::goals_model::{
    SavingsContribution, SavingsGoal, SavingsGoalStatus, SavingsGoalType, SavingsProgress,
};
use crate::utils::time_utils::{
    add_months, first_day_of_month, first_day_of_next_month, months_between,
};

/// Number of months available to save for a target date, counting from the
/// month after `starting_from` up to and including the target month.
///
/// Zero or negative when the target falls in the current month or earlier.
pub fn months_to_save(starting_from: NaiveDate, target_date: NaiveDate) -> i32 {
    let next_month = first_day_of_next_month(starting_from);
    let target_month = first_day_of_month(target_date);
    months_between(next_month, target_month) + 1
}

/// Per-month amount needed to put `remaining` aside by `target_date`.
///
/// Rounded up to the whole currency unit. Everything is due at once when no
/// full month is left.
pub fn required_monthly_savings_for(
    remaining: Decimal,
    starting_from: NaiveDate,
    target_date: NaiveDate,
) -> Decimal {
    if remaining <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let months = months_to_save(starting_from, target_date);
    if months <= 0 {
        return remaining;
    }
    (remaining / Decimal::from(months)).ceil()
}

/// Monthly savings figure shown for a goal.
///
/// Event goals use the amount fixed at creation; goals created without it are
/// computed on the fly from `today` (the result is not stored). Monthly goals
/// need their full target every month.
pub fn required_monthly_savings(goal: &SavingsGoal, today: NaiveDate) -> Decimal {
    match goal.goal_type {
        SavingsGoalType::Monthly => goal.target_amount,
        SavingsGoalType::Event => {
            if goal.is_reached() {
                return Decimal::ZERO;
            }
            match (goal.required_monthly_savings, goal.target_date) {
                (Some(fixed), _) => fixed,
                (None, Some(target_date)) => {
                    required_monthly_savings_for(goal.remaining(), today, target_date)
                }
                (None, None) => Decimal::ZERO,
            }
        }
    }
}

/// Share of the target already saved, in percent, capped at 100.
pub fn progress_percent(goal: &SavingsGoal) -> Decimal {
    if goal.target_amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let cap = Decimal::from(MAX_PROGRESS_PERCENT);
    // Only a ratio far above the cap can overflow.
    goal.current_amount
        .checked_div(goal.target_amount)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(cap, |percent| percent.min(cap))
        .round_dp(DECIMAL_PRECISION)
}

/// Date the goal would be reached when saving `monthly_contribution` per
/// month from `today`.
pub fn projected_completion_date(
    goal: &SavingsGoal,
    monthly_contribution: Decimal,
    today: NaiveDate,
) -> Option<NaiveDate> {
    if monthly_contribution <= Decimal::ZERO {
        return None;
    }
    let remaining = goal.remaining();
    if remaining <= Decimal::ZERO {
        return Some(today);
    }
    let months = remaining.checked_div(monthly_contribution)?.ceil().to_u32()?;
    Some(add_months(today, months))
}

/// Shortfall of a month that carries into the next one for rollover goals.
pub fn rollover_amount(goal: &SavingsGoal, monthly_target: Decimal, actual_saved: Decimal) -> Decimal {
    if !goal.rollover_enabled {
        return Decimal::ZERO;
    }
    (monthly_target - actual_saved).max(Decimal::ZERO)
}

/// Sum of contributions dated in the calendar month before `today`.
///
/// `None` if the sum overflows.
pub fn saved_previous_month(
    contributions: &[SavingsContribution],
    today: NaiveDate,
) -> Option<Decimal> {
    let this_month = first_day_of_month(today);
    let previous_month = this_month.checked_sub_months(Months::new(1))?;
    contributions
        .iter()
        .filter(|c| c.date >= previous_month && c.date < this_month)
        .try_fold(Decimal::ZERO, |acc, c| acc.checked_add(c.amount))
}

/// Contribution total per goal id. `None` if any total overflows.
pub fn contribution_totals(
    contributions: &[SavingsContribution],
) -> Option<HashMap<&str, Decimal>> {
    let mut totals: HashMap<&str, Decimal> = HashMap::new();
    for contribution in contributions {
        let total = totals
            .entry(contribution.goal_id.as_str())
            .or_insert(Decimal::ZERO);
        *total = total.checked_add(contribution.amount)?;
    }
    Some(totals)
}

/// Sums current and target amounts across goals with `status`.
///
/// `None` if either sum overflows.
pub fn aggregate_progress(
    goals: &[SavingsGoal],
    status: SavingsGoalStatus,
) -> Option<SavingsProgress> {
    goals
        .iter()
        .filter(|g| g.status == status)
        .try_fold(SavingsProgress::default(), |acc, g| {
            Some(SavingsProgress {
                current: acc.current.checked_add(g.current_amount)?,
                target: acc.target.checked_add(g.target_amount)?,
            })
        })
}

/// Total that should be saved this month across every active goal.
///
/// `None` if the total overflows.
pub fn monthly_target(goals: &[SavingsGoal], today: NaiveDate) -> Option<Decimal> {
    goals
        .iter()
        .filter(|g| g.status == SavingsGoalStatus::Active)
        .map(|g| match g.goal_type {
            SavingsGoalType::Monthly => g.target_amount,
            SavingsGoalType::Event if g.target_date.is_some() => required_monthly_savings(g, today),
            SavingsGoalType::Event => Decimal::ZERO,
        })
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event_goal(target: Decimal, current: Decimal, target_date: Option<NaiveDate>) -> SavingsGoal {
        let created = d(2026, 1, 15).and_hms_opt(12, 0, 0).unwrap();
        SavingsGoal {
            id: "evt".to_string(),
            goal_type: SavingsGoalType::Event,
            name: "Trip".to_string(),
            description: None,
            target_amount: target,
            current_amount: current,
            status: SavingsGoalStatus::Active,
            rollover_enabled: false,
            start_month: "2026-01".to_string(),
            category: None,
            target_date,
            priority: None,
            required_monthly_savings: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn monthly_goal(target: Decimal, status: SavingsGoalStatus) -> SavingsGoal {
        SavingsGoal {
            goal_type: SavingsGoalType::Monthly,
            status,
            ..event_goal(target, Decimal::ZERO, None)
        }
    }

    #[test]
    fn test_months_to_save_counts_target_month() {
        // Feb..Jul inclusive
        assert_eq!(months_to_save(d(2026, 1, 15), d(2026, 7, 10)), 6);
        assert_eq!(months_to_save(d(2026, 1, 15), d(2026, 2, 1)), 1);
        assert_eq!(months_to_save(d(2026, 1, 15), d(2026, 1, 31)), 0);
        assert_eq!(months_to_save(d(2026, 1, 15), d(2025, 11, 30)), -2);
    }

    #[test]
    fn test_required_monthly_savings_even_split() {
        assert_eq!(
            required_monthly_savings_for(dec!(1200), d(2026, 1, 15), d(2026, 7, 1)),
            dec!(200)
        );
    }

    #[test]
    fn test_required_monthly_savings_rounds_up() {
        // Feb, Mar, Apr
        assert_eq!(
            required_monthly_savings_for(dec!(1000), d(2026, 1, 15), d(2026, 4, 20)),
            dec!(334)
        );
    }

    #[test]
    fn test_required_monthly_savings_due_this_month() {
        assert_eq!(
            required_monthly_savings_for(dec!(750.50), d(2026, 1, 15), d(2026, 1, 28)),
            dec!(750.50)
        );
        assert_eq!(
            required_monthly_savings_for(dec!(750), d(2026, 1, 15), d(2025, 6, 1)),
            dec!(750)
        );
    }

    #[test]
    fn test_required_monthly_savings_prefers_stored_value() {
        let mut goal = event_goal(dec!(1200), dec!(200), Some(d(2026, 7, 1)));
        goal.required_monthly_savings = Some(dec!(200));
        // Lazily computed value would be ceil(1000 / 3) in April
        assert_eq!(required_monthly_savings(&goal, d(2026, 4, 2)), dec!(200));
    }

    #[test]
    fn test_required_monthly_savings_lazy_fallback() {
        let goal = event_goal(dec!(1200), dec!(300), Some(d(2026, 7, 1)));
        // May, Jun, Jul
        assert_eq!(required_monthly_savings(&goal, d(2026, 4, 2)), dec!(300));
    }

    #[test]
    fn test_required_monthly_savings_zero_when_reached() {
        let mut goal = event_goal(dec!(500), dec!(500), Some(d(2026, 7, 1)));
        goal.required_monthly_savings = Some(dec!(100));
        assert_eq!(required_monthly_savings(&goal, d(2026, 4, 2)), Decimal::ZERO);
    }

    #[test]
    fn test_required_monthly_savings_monthly_goal() {
        let goal = monthly_goal(dec!(250), SavingsGoalStatus::Active);
        assert_eq!(required_monthly_savings(&goal, d(2026, 4, 2)), dec!(250));
    }

    #[test]
    fn test_progress_percent_caps_at_hundred() {
        assert_eq!(progress_percent(&event_goal(dec!(200), dec!(50), None)), dec!(25));
        assert_eq!(progress_percent(&event_goal(dec!(200), dec!(300), None)), dec!(100));
        assert_eq!(progress_percent(&event_goal(dec!(300), dec!(100), None)), dec!(33.33));
    }

    #[test]
    fn test_progress_percent_huge_ratio_is_capped() {
        let goal = event_goal(dec!(0.0001), Decimal::MAX, None);
        assert_eq!(progress_percent(&goal), dec!(100));
    }

    #[test]
    fn test_projected_completion_date() {
        let goal = event_goal(dec!(1000), dec!(100), None);
        assert_eq!(projected_completion_date(&goal, dec!(0), d(2026, 1, 31)), None);
        // 900 / 200 -> 5 months
        assert_eq!(
            projected_completion_date(&goal, dec!(200), d(2026, 1, 31)),
            Some(d(2026, 6, 30))
        );
        let done = event_goal(dec!(1000), dec!(1000), None);
        assert_eq!(
            projected_completion_date(&done, dec!(50), d(2026, 1, 31)),
            Some(d(2026, 1, 31))
        );
    }

    #[test]
    fn test_projected_completion_date_unreachable_pace() {
        let goal = event_goal(Decimal::MAX, dec!(0), None);
        assert_eq!(
            projected_completion_date(&goal, dec!(0.0000001), d(2026, 1, 31)),
            None
        );
    }

    #[test]
    fn test_rollover_amount() {
        let mut goal = monthly_goal(dec!(300), SavingsGoalStatus::Active);
        assert_eq!(rollover_amount(&goal, dec!(300), dec!(120)), Decimal::ZERO);
        goal.rollover_enabled = true;
        assert_eq!(rollover_amount(&goal, dec!(300), dec!(120)), dec!(180));
        assert_eq!(rollover_amount(&goal, dec!(300), dec!(400)), Decimal::ZERO);
    }

    #[test]
    fn test_aggregate_progress_filters_status() {
        let goals = vec![
            event_goal(dec!(1000), dec!(250), None),
            event_goal(dec!(500), dec!(100), None),
            SavingsGoal {
                status: SavingsGoalStatus::Paused,
                ..event_goal(dec!(9000), dec!(9), None)
            },
        ];
        assert_eq!(
            aggregate_progress(&goals, SavingsGoalStatus::Active),
            Some(SavingsProgress {
                current: dec!(350),
                target: dec!(1500)
            })
        );
        assert_eq!(
            aggregate_progress(&goals, SavingsGoalStatus::Paused).map(|p| p.target),
            Some(dec!(9000))
        );
    }

    #[test]
    fn test_aggregate_progress_overflow() {
        let big = Decimal::from_scientific("5e28").unwrap();
        let goals = vec![event_goal(big, big, None), event_goal(big, dec!(1), None)];
        assert_eq!(aggregate_progress(&goals, SavingsGoalStatus::Active), None);
    }

    fn contribution(goal_id: &str, amount: Decimal, date: NaiveDate) -> SavingsContribution {
        SavingsContribution {
            id: format!("{}-{}", goal_id, date),
            expense_id: "exp".to_string(),
            goal_id: goal_id.to_string(),
            amount,
            date,
            created_at: d(2026, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_contribution_totals() {
        let contributions = vec![
            contribution("a", dec!(0.1), d(2026, 1, 2)),
            contribution("a", dec!(0.2), d(2026, 1, 3)),
            contribution("b", dec!(7), d(2026, 1, 3)),
        ];
        let totals = contribution_totals(&contributions).unwrap();
        assert_eq!(totals["a"], dec!(0.3));
        assert_eq!(totals["b"], dec!(7));

        let big = Decimal::from_scientific("5e28").unwrap();
        let overflowing = vec![
            contribution("a", big, d(2026, 1, 2)),
            contribution("a", big, d(2026, 1, 3)),
        ];
        assert!(contribution_totals(&overflowing).is_none());
    }

    #[test]
    fn test_saved_previous_month() {
        let contributions = vec![
            contribution("a", dec!(40), d(2026, 1, 31)),
            contribution("a", dec!(60), d(2026, 2, 1)),
            contribution("a", dec!(25), d(2026, 2, 28)),
            contribution("a", dec!(500), d(2026, 3, 1)),
        ];
        assert_eq!(
            saved_previous_month(&contributions, d(2026, 3, 15)),
            Some(dec!(85))
        );
        assert_eq!(saved_previous_month(&[], d(2026, 3, 15)), Some(Decimal::ZERO));
    }

    #[test]
    fn test_monthly_target_mixes_goal_types() {
        let mut event = event_goal(dec!(1200), dec!(0), Some(d(2026, 7, 1)));
        event.required_monthly_savings = Some(dec!(200));
        let goals = vec![
            monthly_goal(dec!(150), SavingsGoalStatus::Active),
            monthly_goal(dec!(999), SavingsGoalStatus::Paused),
            event,
            event_goal(dec!(800), dec!(0), None),
        ];
        assert_eq!(monthly_target(&goals, d(2026, 2, 3)), Some(dec!(350)));
    }
}
