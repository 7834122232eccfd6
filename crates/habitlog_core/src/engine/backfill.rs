//! Instance generator / backfill planning.
//!
//! # Responsibility
//! - Compute the instances that must exist for a habit up to a bound date.
//!
//! # Invariants
//! - Planning is idempotent: periods already present are never re-planned.
//! - No instance is planned for a period starting after the bound.
//! - Invalid habits fail with `InvalidHabitState`; they are never skipped.

use crate::engine::EngineError;
use crate::model::habit::Habit;
use crate::model::instance::HabitInstance;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Returns new open instances for every period of `habit` between its first
/// period and `through` (inclusive) that has no entry in `existing`.
///
/// `existing` may contain instances of other habits; they are ignored.
///
/// # Errors
/// - `EngineError::InvalidHabitState` when `habit.validate()` fails.
pub fn plan_backfill(
    habit: &Habit,
    existing: &[HabitInstance],
    through: NaiveDate,
) -> Result<Vec<HabitInstance>, EngineError> {
    habit
        .validate()
        .map_err(|reason| EngineError::InvalidHabitState {
            habit_id: habit.id,
            reason,
        })?;

    let present: HashSet<NaiveDate> = existing
        .iter()
        .filter(|instance| instance.habit_id == habit.id)
        .map(|instance| instance.period_start)
        .collect();

    let periodicity = habit.periodicity;
    let planned = periodicity
        .periods(habit.date_created, through)
        .filter(|start| !present.contains(start))
        .map(|start| HabitInstance::new(habit.id, start, periodicity.due_date(start)))
        .collect();

    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::plan_backfill;
    use crate::engine::EngineError;
    use crate::model::habit::{Habit, HabitValidationError, Periodicity};
    use chrono::{Duration, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_backfill_covers_every_day_through_bound() {
        let habit = Habit::new("read", Periodicity::Daily, date(2024, 1, 1));
        let planned = plan_backfill(&habit, &[], date(2024, 1, 5)).unwrap();

        let starts: Vec<_> = planned.iter().map(|i| i.period_start).collect();
        assert_eq!(
            starts,
            (1..=5).map(|d| date(2024, 1, d)).collect::<Vec<_>>()
        );
        assert!(planned.iter().all(|i| i.due_date == i.period_start));
        assert!(planned.iter().all(|i| i.habit_id == habit.id && !i.is_completed()));
    }

    #[test]
    fn weekly_backfill_starts_at_first_matching_weekday() {
        let habit = Habit::new("gym", Periodicity::Weekly { weekday: 2 }, date(2024, 1, 1));
        let planned = plan_backfill(&habit, &[], date(2024, 1, 20)).unwrap();

        let starts: Vec<_> = planned.iter().map(|i| i.period_start).collect();
        assert_eq!(starts, vec![date(2024, 1, 3), date(2024, 1, 10), date(2024, 1, 17)]);
        for instance in &planned {
            assert_eq!(instance.due_date, instance.period_start + Duration::days(6));
        }
    }

    #[test]
    fn existing_periods_are_not_planned_again() {
        let habit = Habit::new("read", Periodicity::Daily, date(2024, 1, 1));
        let first = plan_backfill(&habit, &[], date(2024, 1, 3)).unwrap();
        let again = plan_backfill(&habit, &first, date(2024, 1, 3)).unwrap();
        assert!(again.is_empty());

        let extended = plan_backfill(&habit, &first, date(2024, 1, 5)).unwrap();
        let starts: Vec<_> = extended.iter().map(|i| i.period_start).collect();
        assert_eq!(starts, vec![date(2024, 1, 4), date(2024, 1, 5)]);
    }

    #[test]
    fn gaps_in_existing_history_are_filled() {
        let habit = Habit::new("read", Periodicity::Daily, date(2024, 1, 1));
        let all = plan_backfill(&habit, &[], date(2024, 1, 4)).unwrap();
        let partial = vec![all[0].clone(), all[3].clone()];

        let planned = plan_backfill(&habit, &partial, date(2024, 1, 4)).unwrap();
        let starts: Vec<_> = planned.iter().map(|i| i.period_start).collect();
        assert_eq!(starts, vec![date(2024, 1, 2), date(2024, 1, 3)]);
    }

    #[test]
    fn instances_of_other_habits_are_ignored() {
        let habit = Habit::new("read", Periodicity::Daily, date(2024, 1, 1));
        let other = Habit::new("walk", Periodicity::Daily, date(2024, 1, 1));
        let foreign = plan_backfill(&other, &[], date(2024, 1, 2)).unwrap();

        let planned = plan_backfill(&habit, &foreign, date(2024, 1, 2)).unwrap();
        assert_eq!(planned.len(), 2);
    }

    #[test]
    fn bound_before_creation_plans_nothing() {
        let habit = Habit::new("read", Periodicity::Daily, date(2024, 3, 1));
        assert!(plan_backfill(&habit, &[], date(2024, 2, 1)).unwrap().is_empty());
    }

    #[test]
    fn invalid_weekday_fails_with_invalid_habit_state() {
        let habit = Habit::new("broken", Periodicity::Weekly { weekday: 9 }, date(2024, 1, 1));
        let err = plan_backfill(&habit, &[], date(2024, 1, 31)).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidHabitState {
                habit_id: habit.id,
                reason: HabitValidationError::WeekdayOutOfRange(9),
            }
        );
    }
}
