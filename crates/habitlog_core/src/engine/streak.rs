//! Streak analysis over habit instances.
//!
//! # Invariants
//! - A streak only counts completed periods that follow each other by exactly
//!   one periodicity step. Missed periods and missing periods both break it.
//! - Cross-habit ties resolve to the habit that comes first in input order.

use crate::model::habit::{Habit, HabitId, Periodicity};
use crate::model::instance::HabitInstance;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Longest streak of one habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitStreak {
    pub habit_id: HabitId,
    pub name: String,
    pub streak: u32,
}

/// Longest streaks of a set of habits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    /// One entry per habit, in input order.
    pub per_habit: Vec<HabitStreak>,
    /// Highest streak; the first habit in input order wins ties.
    /// `None` when there are no habits.
    pub best: Option<HabitStreak>,
}

impl StreakSummary {
    /// Looks up a habit's streak by name.
    pub fn streak_of(&self, name: &str) -> Option<u32> {
        self.per_habit
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.streak)
    }
}

/// Longest run of consecutive completed periods.
///
/// Instances may be passed in any order. Returns `0` for an empty slice or
/// when nothing is completed.
pub fn longest_streak_for_habit(periodicity: Periodicity, instances: &[HabitInstance]) -> u32 {
    let mut previous: Option<NaiveDate> = None;
    let mut current = 0u32;
    let mut best = 0u32;

    for instance in sorted_by_period(instances) {
        if !instance.is_completed() {
            current = 0;
        } else if previous.is_some_and(|prev| periodicity.is_successor(prev, instance.period_start)) {
            current += 1;
        } else {
            current = 1;
        }
        best = best.max(current);
        previous = Some(instance.period_start);
    }

    best
}

/// Run of consecutive completed periods ending at the most recent settled
/// period.
///
/// Open periods at the end of the history (not completed, due date not yet
/// passed at `reference_date`) are skipped instead of breaking the run.
/// Periods starting after `reference_date` are ignored, even when completed
/// ahead of time.
pub fn current_streak_for_habit(
    periodicity: Periodicity,
    instances: &[HabitInstance],
    reference_date: NaiveDate,
) -> u32 {
    let mut later: Option<NaiveDate> = None;
    let mut streak = 0u32;

    let settled = sorted_by_period(instances)
        .into_iter()
        .rev()
        .filter(|instance| instance.period_start <= reference_date);
    for instance in settled {
        if let Some(later_start) = later {
            if !periodicity.is_successor(instance.period_start, later_start) {
                break;
            }
        }
        if !instance.is_completed() {
            if streak == 0 && instance.due_date >= reference_date {
                later = Some(instance.period_start);
                continue;
            }
            break;
        }
        streak += 1;
        later = Some(instance.period_start);
    }

    streak
}

/// Longest streak for every habit plus the overall best.
///
/// `instances` may mix habits; each is matched to its owner by `habit_id`.
/// Instances of habits not in `habits` are ignored.
pub fn longest_streak_all(habits: &[Habit], instances: &[HabitInstance]) -> StreakSummary {
    let mut by_habit: HashMap<HabitId, Vec<HabitInstance>> = HashMap::new();
    for instance in instances {
        by_habit
            .entry(instance.habit_id)
            .or_default()
            .push(instance.clone());
    }

    let mut summary = StreakSummary::default();
    for habit in habits {
        let streak = by_habit
            .get(&habit.id)
            .map_or(0, |owned| longest_streak_for_habit(habit.periodicity, owned));
        let entry = HabitStreak {
            habit_id: habit.id,
            name: habit.name.clone(),
            streak,
        };
        // Strict comparison keeps the earliest habit on ties.
        if summary.best.as_ref().map_or(true, |best| entry.streak > best.streak) {
            summary.best = Some(entry.clone());
        }
        summary.per_habit.push(entry);
    }

    summary
}

fn sorted_by_period(instances: &[HabitInstance]) -> Vec<&HabitInstance> {
    let mut sorted: Vec<&HabitInstance> = instances.iter().collect();
    sorted.sort_by_key(|instance| instance.period_start);
    sorted
}
