//! Habit use-case service.
//!
//! # Responsibility
//! - Provide the entry points used by the CLI collaborator: create/delete,
//!   backfill-and-list, completion and streak reports.
//! - Bring a habit's history up to date before reading it.
//!
//! # Invariants
//! - Backfill never creates a second instance for a period; a storage-level
//!   `DuplicatePeriod` is skipped, not reported.
//! - An invalid habit stops processing of that habit only when listing many.
//! - A habit whose first backfill fails is removed again.
//! - Completion never overwrites an existing completion date.
//! - The service remains storage-agnostic.

use crate::clock::{Clock, SystemClock};
use crate::engine::backfill::plan_backfill;
use crate::engine::streak::{
    current_streak_for_habit, longest_streak_all, longest_streak_for_habit, HabitStreak,
    StreakSummary,
};
use crate::engine::EngineError;
use crate::model::habit::{
    Habit, HabitRecord, HabitValidationError, Periodicity, PeriodicityKind,
};
use crate::model::instance::{HabitInstance, InstanceId, InstanceStatus};
use crate::repo::habit_repo::{HabitRepository, RepoError};
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, HabitServiceError>;

/// Service error for habit use-cases.
#[derive(Debug)]
pub enum HabitServiceError {
    /// No habit carries this name.
    HabitNotFound(String),
    /// The habit has no period covering `date` (before its first period).
    InstanceNotFound { habit: String, date: NaiveDate },
    /// Habit definition is malformed.
    InvalidHabitState {
        habit: String,
        reason: HabitValidationError,
    },
    /// The period was already completed; nothing was changed.
    AlreadyCompleted {
        habit: String,
        instance_id: InstanceId,
        completed_at: Option<NaiveDate>,
    },
    /// Another habit already uses this name.
    DuplicateName(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for HabitServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HabitNotFound(name) => write!(f, "habit not found: `{name}`"),
            Self::InstanceNotFound { habit, date } => {
                write!(f, "habit `{habit}` has no period covering {date}")
            }
            Self::InvalidHabitState { habit, reason } => {
                write!(f, "habit `{habit}` is in an invalid state: {reason}")
            }
            Self::AlreadyCompleted {
                habit,
                completed_at: Some(completed_at),
                ..
            } => write!(f, "habit `{habit}` was already completed on {completed_at}"),
            Self::AlreadyCompleted { habit, .. } => {
                write!(f, "habit `{habit}` was already completed for this period")
            }
            Self::DuplicateName(name) => write!(f, "a habit named `{name}` already exists"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HabitServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidHabitState { reason, .. } => Some(reason),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for HabitServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateName(name) => Self::DuplicateName(name),
            other => Self::Repo(other),
        }
    }
}

/// Input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateHabitRequest {
    pub name: String,
    pub description: Option<String>,
    pub periodicity: Periodicity,
    /// Anchor of the first period. Defaults to today.
    pub start_date: Option<NaiveDate>,
}

impl CreateHabitRequest {
    pub fn new(name: impl Into<String>, periodicity: Periodicity) -> Self {
        Self {
            name: name.into(),
            description: None,
            periodicity,
            start_date: None,
        }
    }
}

/// Which habits `backfill_and_list` should cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitSelection {
    All,
    Named(String),
    Periodicity(PeriodicityKind),
}

/// Instance paired with its status at the listing date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceView {
    pub instance: HabitInstance,
    pub status: InstanceStatus,
}

/// One habit with its up-to-date history.
///
/// An invalid record was not backfilled; its stored instances are listed
/// as they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitOverview {
    pub record: HabitRecord,
    /// Ordered by `period_start`.
    pub instances: Vec<InstanceView>,
}

impl HabitOverview {
    /// Why the habit was skipped, if it was.
    pub fn invalid(&self) -> Option<&HabitValidationError> {
        self.record.invalid_reason()
    }
}

/// Result of a streak query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreakReport {
    Habit(HabitStreak),
    All(StreakSummary),
}

/// Habit service facade over a repository and a clock.
pub struct HabitService<R: HabitRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: HabitRepository> HabitService<R> {
    /// Creates a service using the local system date as "today".
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: HabitRepository, C: Clock> HabitService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Creates a habit and backfills its periods through today.
    pub fn create_habit(&self, request: &CreateHabitRequest) -> ServiceResult<Habit> {
        let today = self.clock.today();
        let mut habit = Habit::new(
            request.name.trim(),
            request.periodicity,
            request.start_date.unwrap_or(today),
        );
        habit.description = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        habit
            .validate()
            .map_err(|reason| HabitServiceError::InvalidHabitState {
                habit: habit.name.clone(),
                reason,
            })?;
        self.repo.create_habit(&habit)?;
        info!(
            "event=habit_create module=service status=ok habit_id={} periodicity={} date_created={}",
            habit.id,
            habit.periodicity.kind(),
            habit.date_created
        );

        if let Err(err) = self.backfill_habit(&habit, today) {
            error!(
                "event=habit_create module=service status=error habit_id={} error={err}",
                habit.id
            );
            if let Err(cleanup) = self.repo.delete_habit(habit.id) {
                error!(
                    "event=habit_create_rollback module=service status=error habit_id={} error={cleanup}",
                    habit.id
                );
            }
            return Err(err);
        }
        Ok(habit)
    }

    /// Deletes a habit and every instance it owns.
    ///
    /// Works for habits with an invalid stored definition too.
    pub fn delete_habit(&self, name: &str) -> ServiceResult<HabitRecord> {
        let record = self
            .repo
            .fetch_habit(name)?
            .ok_or_else(|| HabitServiceError::HabitNotFound(name.to_string()))?;
        self.repo.delete_habit(record.id())?;
        info!(
            "event=habit_delete module=service status=ok habit_id={}",
            record.id()
        );
        Ok(record)
    }

    /// Lists stored habits in creation order.
    pub fn list_habits(&self, filter: Option<PeriodicityKind>) -> ServiceResult<Vec<HabitRecord>> {
        self.repo.fetch_all_habits(filter).map_err(Into::into)
    }

    /// Persists every missing instance of `habit` through `through` and
    /// returns the habit's full instance list.
    ///
    /// # Errors
    /// - `InvalidHabitState` when the habit fails validation.
    pub fn backfill_habit(
        &self,
        habit: &Habit,
        through: NaiveDate,
    ) -> ServiceResult<Vec<HabitInstance>> {
        let existing = self.repo.fetch_instances(habit.id)?;
        let planned =
            plan_backfill(habit, &existing, through).map_err(|err| engine_error(habit, err))?;
        if planned.is_empty() {
            return Ok(existing);
        }

        let mut created = 0usize;
        for instance in &planned {
            match self.repo.persist_instance(instance) {
                Ok(_) => created += 1,
                Err(RepoError::DuplicatePeriod { period_start, .. }) => debug!(
                    "event=backfill module=service status=skip habit_id={} period_start={period_start}",
                    habit.id
                ),
                Err(err) => return Err(err.into()),
            }
        }
        info!(
            "event=backfill module=service status=ok habit_id={} through={through} created={created}",
            habit.id
        );

        self.repo.fetch_instances(habit.id).map_err(Into::into)
    }

    /// Backfills the selected habits through today and lists their history
    /// with derived status.
    ///
    /// With `HabitSelection::Named` an invalid habit fails the call. For
    /// multi-habit selections it is reported through `HabitOverview::invalid`
    /// and the remaining habits are still processed.
    pub fn backfill_and_list(&self, selection: &HabitSelection) -> ServiceResult<Vec<HabitOverview>> {
        let today = self.clock.today();
        let records = match selection {
            HabitSelection::Named(name) => vec![HabitRecord::Valid(self.require_habit(name)?)],
            HabitSelection::All => self.repo.fetch_all_habits(None)?,
            HabitSelection::Periodicity(kind) => self.repo.fetch_all_habits(Some(*kind))?,
        };

        let mut overviews = Vec::with_capacity(records.len());
        for record in records {
            let instances = match &record {
                HabitRecord::Valid(habit) => self.backfill_habit(habit, today)?,
                HabitRecord::Invalid(invalid) => {
                    warn!(
                        "event=backfill module=service status=error habit_id={} error_code=invalid_habit_state error={}",
                        invalid.id, invalid.reason
                    );
                    self.repo.fetch_instances(invalid.id)?
                }
            };

            let instances = instances
                .into_iter()
                .map(|instance| InstanceView {
                    status: instance.status_at(today),
                    instance,
                })
                .collect();
            overviews.push(HabitOverview { record, instances });
        }

        Ok(overviews)
    }

    /// Completes the period of `name` that contains `date` (default: today).
    ///
    /// Periods are backfilled through the later of today and `date` first, so
    /// a future period can be completed ahead of time.
    ///
    /// # Errors
    /// - `HabitNotFound` for an unknown name.
    /// - `InstanceNotFound` when `date` precedes the habit's first period.
    /// - `AlreadyCompleted` when the period already has a completion date.
    pub fn complete(&self, name: &str, date: Option<NaiveDate>) -> ServiceResult<HabitInstance> {
        let today = self.clock.today();
        let date = date.unwrap_or(today);
        let habit = self.require_habit(name)?;
        let instances = self.backfill_habit(&habit, date.max(today))?;

        let period_start = habit.periodicity.period_start_containing(date);
        let mut instance = instances
            .into_iter()
            .find(|instance| instance.period_start == period_start)
            .ok_or_else(|| HabitServiceError::InstanceNotFound {
                habit: habit.name.clone(),
                date,
            })?;

        if let Err(err) = instance.mark_completed(date) {
            warn!(
                "event=complete module=service status=skip habit_id={} instance_id={} reason=already_completed",
                habit.id, instance.id
            );
            return Err(engine_error(&habit, err));
        }
        self.repo
            .persist_completion(instance.id, date)
            .map_err(|err| match err {
                RepoError::AlreadyCompleted(instance_id) => HabitServiceError::AlreadyCompleted {
                    habit: habit.name.clone(),
                    instance_id,
                    completed_at: None,
                },
                other => other.into(),
            })?;
        info!(
            "event=complete module=service status=ok habit_id={} instance_id={} period_start={}",
            habit.id, instance.id, instance.period_start
        );

        Ok(instance)
    }

    /// Longest streak of one habit, or of every habit when `name` is `None`.
    ///
    /// Habits with an invalid stored definition are left out of the
    /// all-habit summary.
    pub fn longest_streak(&self, name: Option<&str>) -> ServiceResult<StreakReport> {
        match name {
            Some(name) => {
                let habit = self.require_habit(name)?;
                let instances = self.repo.fetch_instances(habit.id)?;
                Ok(StreakReport::Habit(HabitStreak {
                    habit_id: habit.id,
                    streak: longest_streak_for_habit(habit.periodicity, &instances),
                    name: habit.name,
                }))
            }
            None => {
                let habits: Vec<Habit> = self
                    .repo
                    .fetch_all_habits(None)?
                    .into_iter()
                    .filter_map(|record| match record.into_habit() {
                        Ok(habit) => Some(habit),
                        Err(invalid) => {
                            warn!(
                                "event=streak module=service status=skip habit_id={} error_code=invalid_habit_state",
                                invalid.id
                            );
                            None
                        }
                    })
                    .collect();
                let instances = self.repo.fetch_all_instances()?;
                Ok(StreakReport::All(longest_streak_all(&habits, &instances)))
            }
        }
    }

    /// Streak ending at the habit's most recent settled period.
    pub fn current_streak(&self, name: &str) -> ServiceResult<u32> {
        let habit = self.require_habit(name)?;
        let instances = self.repo.fetch_instances(habit.id)?;
        Ok(current_streak_for_habit(
            habit.periodicity,
            &instances,
            self.clock.today(),
        ))
    }

    fn require_habit(&self, name: &str) -> ServiceResult<Habit> {
        match self.repo.fetch_habit(name)? {
            Some(HabitRecord::Valid(habit)) => Ok(habit),
            Some(HabitRecord::Invalid(invalid)) => Err(HabitServiceError::InvalidHabitState {
                habit: invalid.name,
                reason: invalid.reason,
            }),
            None => Err(HabitServiceError::HabitNotFound(name.to_string())),
        }
    }
}

fn engine_error(habit: &Habit, err: EngineError) -> HabitServiceError {
    match err {
        EngineError::InvalidHabitState { reason, .. } => HabitServiceError::InvalidHabitState {
            habit: habit.name.clone(),
            reason,
        },
        EngineError::AlreadyCompleted {
            instance_id,
            completed_at,
        } => HabitServiceError::AlreadyCompleted {
            habit: habit.name.clone(),
            instance_id,
            completed_at: Some(completed_at),
        },
    }
}
