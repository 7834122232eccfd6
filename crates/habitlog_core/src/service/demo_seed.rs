//! Sample habits with fixed completion patterns.
//!
//! Each habit gets four periods ending with the one that contains today.
//! The last period is always left open.

use crate::clock::Clock;
use crate::model::habit::{Habit, Periodicity};
use crate::repo::habit_repo::HabitRepository;
use crate::service::habit_service::{CreateHabitRequest, HabitService, ServiceResult};
use chrono::{Duration, NaiveDate};
use log::info;

const HISTORY_PERIODS: i64 = 4;

struct DemoHabit {
    name: &'static str,
    description: &'static str,
    periodicity: Periodicity,
    /// Completion flag per period, oldest first.
    pattern: [bool; HISTORY_PERIODS as usize],
}

const DEMO_HABITS: [DemoHabit; 5] = [
    DemoHabit {
        name: "Brush Teeth",
        description: "Morning and night",
        periodicity: Periodicity::Daily,
        pattern: [true, true, true, false],
    },
    DemoHabit {
        name: "Meditate",
        description: "10 minutes daily",
        periodicity: Periodicity::Daily,
        pattern: [true, true, false, false],
    },
    DemoHabit {
        name: "Water Plants",
        description: "Every Monday",
        periodicity: Periodicity::Weekly { weekday: 0 },
        pattern: [true, true, true, false],
    },
    DemoHabit {
        name: "Grocery Shopping",
        description: "Weekend shopping",
        periodicity: Periodicity::Weekly { weekday: 5 },
        pattern: [true, false, true, false],
    },
    DemoHabit {
        name: "Review Goals",
        description: "Every Sunday",
        periodicity: Periodicity::Weekly { weekday: 6 },
        pattern: [true, false, true, false],
    },
];

/// Creates the demo habits and completes their sample periods.
///
/// Expects a store without habits of the same names.
///
/// # Errors
/// - `DuplicateName` when a demo habit name is already taken.
pub fn seed_demo<R: HabitRepository, C: Clock>(
    service: &HabitService<R, C>,
) -> ServiceResult<Vec<Habit>> {
    let today = service.today();
    let mut habits = Vec::with_capacity(DEMO_HABITS.len());

    for demo in &DEMO_HABITS {
        let start = history_start(demo.periodicity, today);
        let habit = service.create_habit(&CreateHabitRequest {
            name: demo.name.to_string(),
            description: Some(demo.description.to_string()),
            periodicity: demo.periodicity,
            start_date: Some(start),
        })?;

        let periods = demo.periodicity.periods(start, today);
        for (period_start, done) in periods.zip(demo.pattern) {
            if done {
                service.complete(&habit.name, Some(period_start))?;
            }
        }
        habits.push(habit);
    }

    info!(
        "event=seed_demo module=service status=ok habits={} today={today}",
        habits.len()
    );
    Ok(habits)
}

fn history_start(periodicity: Periodicity, today: NaiveDate) -> NaiveDate {
    let current = periodicity.period_start_containing(today);
    let back = Duration::days(periodicity.step_days() * (HISTORY_PERIODS - 1));
    current.checked_sub_signed(back).unwrap_or(NaiveDate::MIN)
}
