//! Completion and status evaluation.
//!
//! # Invariants
//! - `completed_at` is written at most once; a second completion is rejected
//!   and leaves the stored date untouched.
//! - Completion is permitted before the period starts or after it is due.

use crate::engine::EngineError;
use crate::model::instance::{HabitInstance, InstanceStatus};
use chrono::NaiveDate;

impl HabitInstance {
    /// Classifies this instance relative to `reference_date`.
    ///
    /// `Completed` wins; otherwise `Missed` once `reference_date` is past the
    /// due date, else `Pending`.
    pub fn status_at(&self, reference_date: NaiveDate) -> InstanceStatus {
        if self.is_completed() {
            InstanceStatus::Completed
        } else if reference_date > self.due_date {
            InstanceStatus::Missed
        } else {
            InstanceStatus::Pending
        }
    }

    /// Records completion on `at_date`.
    ///
    /// # Errors
    /// - `EngineError::AlreadyCompleted` when a completion date is already set.
    pub fn mark_completed(&mut self, at_date: NaiveDate) -> Result<(), EngineError> {
        if let Some(completed_at) = self.completed_at {
            return Err(EngineError::AlreadyCompleted {
                instance_id: self.id,
                completed_at,
            });
        }
        self.completed_at = Some(at_date);
        Ok(())
    }
}
