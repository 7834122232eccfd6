//! Period-scheduling and streak-analysis engine.
//!
//! # Responsibility
//! - Map periodicity rules to period boundaries and due dates (`schedule`).
//! - Plan missing instances between habit creation and a bound (`backfill`).
//! - Classify and complete instances (`status`).
//! - Compute longest and current streaks (`streak`).
//!
//! # Invariants
//! - Engine functions are pure over in-memory records; no storage access.
//! - Every step of a period walk strictly advances the date.

use crate::model::habit::{HabitId, HabitValidationError};
use crate::model::instance::InstanceId;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod backfill;
pub mod schedule;
pub mod status;
pub mod streak;

/// Engine-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Habit definition is malformed; processing of this habit stops.
    InvalidHabitState {
        habit_id: HabitId,
        reason: HabitValidationError,
    },
    /// Instance already carries a completion date.
    AlreadyCompleted {
        instance_id: InstanceId,
        completed_at: NaiveDate,
    },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHabitState { habit_id, reason } => {
                write!(f, "invalid habit state for {habit_id}: {reason}")
            }
            Self::AlreadyCompleted {
                instance_id,
                completed_at,
            } => write!(
                f,
                "habit instance {instance_id} is already completed (at {completed_at})"
            ),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidHabitState { reason, .. } => Some(reason),
            Self::AlreadyCompleted { .. } => None,
        }
    }
}
