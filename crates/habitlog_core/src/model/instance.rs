//! Habit instance model.
//!
//! # Responsibility
//! - Define one occurrence (period) of a habit and its completion state.
//!
//! # Invariants
//! - At most one instance exists per `(habit_id, period_start)`.
//! - `completed_at` is set at most once; presence means completed.
//! - `due_date >= period_start`.

use crate::model::habit::HabitId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a habit instance.
pub type InstanceId = Uuid;

/// Derived display state of an instance. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    /// Not completed and the due date has not passed.
    Pending,
    Completed,
    /// Not completed and the due date has passed.
    Missed,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Missed => "missed",
        }
    }
}

/// One period of a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitInstance {
    pub id: InstanceId,
    /// Owning habit. Deleting the habit deletes the instance.
    pub habit_id: HabitId,
    /// First calendar day of the period; natural key per habit.
    pub period_start: NaiveDate,
    /// Last calendar day on which completion still counts.
    pub due_date: NaiveDate,
    pub completed_at: Option<NaiveDate>,
}

impl HabitInstance {
    /// Creates an open instance with a generated stable ID.
    pub fn new(habit_id: HabitId, period_start: NaiveDate, due_date: NaiveDate) -> Self {
        Self::with_id(Uuid::new_v4(), habit_id, period_start, due_date)
    }

    /// Creates an open instance with a caller-provided ID.
    pub fn with_id(
        id: InstanceId,
        habit_id: HabitId,
        period_start: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            habit_id,
            period_start,
            due_date,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
