//! In-memory habit repository.
//!
//! Mirrors the SQLite contract (unique names, unique periods, cascading
//! deletes) without a database. Suited to tests and embedding callers that
//! keep their own persistence.

use crate::model::habit::{Habit, HabitId, HabitRecord, PeriodicityKind};
use crate::model::instance::{HabitInstance, InstanceId};
use crate::repo::habit_repo::{HabitRepository, RepoError, RepoResult};
use chrono::NaiveDate;
use std::cell::RefCell;

#[derive(Debug, Default)]
struct MemoryState {
    /// Creation order is insertion order.
    habits: Vec<Habit>,
    instances: Vec<HabitInstance>,
}

/// `HabitRepository` backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryHabitRepository {
    state: RefCell<MemoryState>,
}

impl MemoryHabitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a habit without validation, for staging malformed fixtures.
    ///
    /// Reads return such a habit as `HabitRecord::Invalid`.
    pub fn insert_habit_unchecked(&self, habit: Habit) {
        self.state.borrow_mut().habits.push(habit);
    }

    /// Total number of stored instances across all habits.
    pub fn instance_count(&self) -> usize {
        self.state.borrow().instances.len()
    }
}

impl HabitRepository for MemoryHabitRepository {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit.validate()?;
        let mut state = self.state.borrow_mut();
        if state.habits.iter().any(|existing| existing.name == habit.name) {
            return Err(RepoError::DuplicateName(habit.name.clone()));
        }
        state.habits.push(habit.clone());
        Ok(habit.id)
    }

    fn fetch_habit(&self, name: &str) -> RepoResult<Option<HabitRecord>> {
        Ok(self
            .state
            .borrow()
            .habits
            .iter()
            .find(|habit| habit.name == name)
            .cloned()
            .map(HabitRecord::checked))
    }

    fn fetch_all_habits(&self, filter: Option<PeriodicityKind>) -> RepoResult<Vec<HabitRecord>> {
        Ok(self
            .state
            .borrow()
            .habits
            .iter()
            .filter(|habit| filter.map_or(true, |kind| habit.periodicity.kind() == kind))
            .cloned()
            .map(HabitRecord::checked)
            .collect())
    }

    fn delete_habit(&self, habit_id: HabitId) -> RepoResult<()> {
        let mut state = self.state.borrow_mut();
        let before = state.habits.len();
        state.habits.retain(|habit| habit.id != habit_id);
        if state.habits.len() == before {
            return Err(RepoError::HabitNotFound(habit_id));
        }
        state.instances.retain(|instance| instance.habit_id != habit_id);
        Ok(())
    }

    fn fetch_instances(&self, habit_id: HabitId) -> RepoResult<Vec<HabitInstance>> {
        let mut instances: Vec<HabitInstance> = self
            .state
            .borrow()
            .instances
            .iter()
            .filter(|instance| instance.habit_id == habit_id)
            .cloned()
            .collect();
        instances.sort_by_key(|instance| instance.period_start);
        Ok(instances)
    }

    fn fetch_all_instances(&self) -> RepoResult<Vec<HabitInstance>> {
        let mut instances = self.state.borrow().instances.clone();
        instances.sort_by_key(|instance| (instance.habit_id, instance.period_start));
        Ok(instances)
    }

    fn persist_instance(&self, instance: &HabitInstance) -> RepoResult<InstanceId> {
        let mut state = self.state.borrow_mut();
        if !state.habits.iter().any(|habit| habit.id == instance.habit_id) {
            return Err(RepoError::HabitNotFound(instance.habit_id));
        }
        let duplicate = state.instances.iter().any(|existing| {
            existing.habit_id == instance.habit_id && existing.period_start == instance.period_start
        });
        if duplicate {
            return Err(RepoError::DuplicatePeriod {
                habit_id: instance.habit_id,
                period_start: instance.period_start,
            });
        }
        state.instances.push(instance.clone());
        Ok(instance.id)
    }

    fn persist_completion(
        &self,
        instance_id: InstanceId,
        completed_at: NaiveDate,
    ) -> RepoResult<()> {
        let mut state = self.state.borrow_mut();
        let instance = state
            .instances
            .iter_mut()
            .find(|instance| instance.id == instance_id)
            .ok_or(RepoError::InstanceNotFound(instance_id))?;
        if instance.completed_at.is_some() {
            return Err(RepoError::AlreadyCompleted(instance_id));
        }
        instance.completed_at = Some(completed_at);
        Ok(())
    }
}
