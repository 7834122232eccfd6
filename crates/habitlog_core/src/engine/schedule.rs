//! Habit schedule model.
//!
//! Maps a periodicity rule to period starts and due dates. All functions are
//! total and side-effect-free. Weekly rules are expected to be validated; an
//! out-of-range weekday wraps modulo 7 instead of panicking.
//!
//! Near the ends of the calendar the plain functions saturate at
//! `NaiveDate::MAX` (forward) or `NaiveDate::MIN` (backward). The `checked_*`
//! variants return `None` there instead, and `PeriodIter` simply ends.

use crate::model::habit::Periodicity;
use chrono::{Datelike, Duration, NaiveDate};

impl Periodicity {
    /// Earliest valid period start on or after `after`.
    ///
    /// Daily rules accept every date. Weekly rules move forward to the next
    /// matching weekday and keep `after` when it already matches.
    pub fn first_period_start(&self, after: NaiveDate) -> NaiveDate {
        self.checked_first_period_start(after)
            .unwrap_or(NaiveDate::MAX)
    }

    /// `first_period_start`, or `None` when no matching date is representable.
    pub fn checked_first_period_start(&self, after: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Daily => Some(after),
            Self::Weekly { weekday } => {
                let current = after.weekday().num_days_from_monday();
                let target = u32::from(*weekday) % 7;
                shift(after, i64::from((target + 7 - current) % 7))
            }
        }
    }

    /// Period start immediately following `current`.
    pub fn next_period_start(&self, current: NaiveDate) -> NaiveDate {
        self.checked_next_period_start(current)
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn checked_next_period_start(&self, current: NaiveDate) -> Option<NaiveDate> {
        shift(current, self.step_days())
    }

    /// Last day of the period beginning at `period_start`.
    pub fn due_date(&self, period_start: NaiveDate) -> NaiveDate {
        shift(period_start, self.step_days() - 1).unwrap_or(NaiveDate::MAX)
    }

    /// Start of the period whose window contains `date`.
    ///
    /// The result may precede a habit's first period; callers bound it.
    pub fn period_start_containing(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date,
            Self::Weekly { weekday } => {
                let current = date.weekday().num_days_from_monday();
                let target = u32::from(*weekday) % 7;
                let back = (current + 7 - target) % 7;
                shift(date, -i64::from(back)).unwrap_or(NaiveDate::MIN)
            }
        }
    }

    /// Returns whether `current` is the period right after `previous`.
    pub fn is_successor(&self, previous: NaiveDate, current: NaiveDate) -> bool {
        self.checked_next_period_start(previous) == Some(current)
    }

    /// Iterates period starts from `first_period_start(from)` through `through`,
    /// inclusive.
    pub fn periods(&self, from: NaiveDate, through: NaiveDate) -> PeriodIter {
        PeriodIter {
            periodicity: *self,
            next: self.checked_first_period_start(from),
            through,
        }
    }
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
}

/// Iterator over consecutive period starts with an inclusive upper bound.
#[derive(Debug, Clone)]
pub struct PeriodIter {
    periodicity: Periodicity,
    next: Option<NaiveDate>,
    through: NaiveDate,
}

impl Iterator for PeriodIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|start| *start <= self.through)?;
        self.next = self.periodicity.checked_next_period_start(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::habit::Periodicity;
    use chrono::{Datelike, Duration, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn next_period_start_steps_one_day_or_one_week() {
        let mut day = date(2023, 12, 25);
        for _ in 0..40 {
            assert_eq!(Periodicity::Daily.next_period_start(day), day + Duration::days(1));
            assert_eq!(
                Periodicity::Weekly { weekday: 4 }.next_period_start(day),
                day + Duration::days(7)
            );
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn weekly_first_period_start_is_minimal_matching_weekday() {
        let base = date(2024, 2, 26);
        for weekday in 0..=6u8 {
            let rule = Periodicity::Weekly { weekday };
            for shift in 0..14 {
                let after = base + Duration::days(shift);
                let start = rule.first_period_start(after);
                assert_eq!(start.weekday().num_days_from_monday(), u32::from(weekday));
                assert!(start >= after);
                assert!(start - after < Duration::days(7));
            }
        }
    }

    #[test]
    fn weekly_first_period_start_keeps_matching_date() {
        // 2024-01-03 is a Wednesday.
        let rule = Periodicity::Weekly { weekday: 2 };
        assert_eq!(rule.first_period_start(date(2024, 1, 3)), date(2024, 1, 3));
        assert_eq!(rule.first_period_start(date(2024, 1, 1)), date(2024, 1, 3));
        assert_eq!(rule.first_period_start(date(2024, 1, 4)), date(2024, 1, 10));
    }

    #[test]
    fn daily_first_period_start_is_identity() {
        assert_eq!(Periodicity::Daily.first_period_start(date(2024, 5, 17)), date(2024, 5, 17));
    }

    #[test]
    fn due_date_closes_the_period() {
        assert_eq!(Periodicity::Daily.due_date(date(2024, 1, 1)), date(2024, 1, 1));
        assert_eq!(
            Periodicity::Weekly { weekday: 2 }.due_date(date(2024, 1, 3)),
            date(2024, 1, 9)
        );
    }

    #[test]
    fn period_start_containing_finds_window_start() {
        let rule = Periodicity::Weekly { weekday: 2 };
        assert_eq!(rule.period_start_containing(date(2024, 1, 3)), date(2024, 1, 3));
        assert_eq!(rule.period_start_containing(date(2024, 1, 9)), date(2024, 1, 3));
        assert_eq!(rule.period_start_containing(date(2024, 1, 10)), date(2024, 1, 10));
        assert_eq!(Periodicity::Daily.period_start_containing(date(2024, 1, 9)), date(2024, 1, 9));
    }

    #[test]
    fn periods_iterates_inclusive_bound() {
        let starts: Vec<_> = Periodicity::Weekly { weekday: 2 }
            .periods(date(2024, 1, 1), date(2024, 1, 17))
            .collect();
        assert_eq!(starts, vec![date(2024, 1, 3), date(2024, 1, 10), date(2024, 1, 17)]);

        let empty: Vec<_> = Periodicity::Daily
            .periods(date(2024, 1, 5), date(2024, 1, 4))
            .collect();
        assert!(empty.is_empty());
    }

    #[test]
    fn arithmetic_saturates_at_calendar_limits() {
        let weekly = Periodicity::Weekly { weekday: 2 };

        assert_eq!(weekly.first_period_start(NaiveDate::MAX), NaiveDate::MAX);
        assert_eq!(Periodicity::Daily.next_period_start(NaiveDate::MAX), NaiveDate::MAX);
        assert_eq!(weekly.due_date(NaiveDate::MAX), NaiveDate::MAX);
        assert_eq!(weekly.period_start_containing(NaiveDate::MIN), NaiveDate::MIN);
        assert_eq!(Periodicity::Daily.checked_next_period_start(NaiveDate::MAX), None);
        assert!(!Periodicity::Daily.is_successor(NaiveDate::MAX, NaiveDate::MAX));
    }

    #[test]
    fn periods_stop_at_the_last_representable_date() {
        let last: Vec<_> = Periodicity::Daily
            .periods(NaiveDate::MAX, NaiveDate::MAX)
            .collect();
        assert_eq!(last, vec![NaiveDate::MAX]);

        let tail_from = NaiveDate::MAX - Duration::days(20);
        let weekly: Vec<_> = Periodicity::Weekly { weekday: 2 }
            .periods(tail_from, NaiveDate::MAX)
            .collect();
        assert_eq!(weekly.len(), 3);
        assert!(weekly.iter().all(|start| start.weekday().num_days_from_monday() == 2));

        let daily_tail = Periodicity::Daily
            .periods(NaiveDate::MAX - Duration::days(2), NaiveDate::MAX)
            .count();
        assert_eq!(daily_tail, 3);
    }
}
