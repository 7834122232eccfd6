//! Habit definition model.
//!
//! # Responsibility
//! - Define the recurring habit record and its periodicity rule.
//! - Provide validation used by storage writes and the scheduling engine.
//!
//! # Invariants
//! - `id` is stable and never reused for another habit.
//! - `Periodicity::Weekly` carries a weekday in `0..=6` (0 = Monday).
//! - `periodicity` and `date_created` never change after creation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a habit definition.
pub type HabitId = Uuid;

/// Highest valid weekday number (Sunday).
pub const MAX_WEEKDAY: u8 = 6;

/// Recurrence rule of a habit.
///
/// Weekdays are numbered from Monday (`0`) to Sunday (`6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Periodicity {
    /// One period per calendar day.
    Daily,
    /// One seven-day period starting on `weekday`.
    Weekly { weekday: u8 },
}

/// Periodicity without its parameters, used as a list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodicityKind {
    Daily,
    Weekly,
}

impl Periodicity {
    /// Returns the parameterless kind of this rule.
    pub fn kind(&self) -> PeriodicityKind {
        match self {
            Self::Daily => PeriodicityKind::Daily,
            Self::Weekly { .. } => PeriodicityKind::Weekly,
        }
    }

    /// Returns the configured weekday for weekly rules.
    pub fn weekday(&self) -> Option<u8> {
        match self {
            Self::Daily => None,
            Self::Weekly { weekday } => Some(*weekday),
        }
    }

    /// Number of days between two consecutive period starts.
    pub fn step_days(&self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly { .. } => 7,
        }
    }
}

impl PeriodicityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Parses `daily` / `weekly`, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

impl Display for PeriodicityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failure for a habit definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    /// Name is empty after trim.
    BlankName,
    /// Weekly rule with a weekday outside `0..=6`.
    WeekdayOutOfRange(i64),
    /// Stored creation date is missing or not a calendar date.
    InvalidCreationDate(String),
    /// Stored periodicity is unknown or inconsistent with its weekday.
    InvalidPeriodicity(String),
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "habit name must not be blank"),
            Self::WeekdayOutOfRange(weekday) => write!(
                f,
                "weekday {weekday} is out of range; expected 0 (Monday) through {MAX_WEEKDAY} (Sunday)"
            ),
            Self::InvalidCreationDate(raw) if raw.is_empty() => {
                write!(f, "creation date is missing")
            }
            Self::InvalidCreationDate(raw) => {
                write!(f, "creation date `{raw}` is not a YYYY-MM-DD date")
            }
            Self::InvalidPeriodicity(detail) => write!(f, "invalid periodicity: {detail}"),
        }
    }
}

impl Error for HabitValidationError {}

/// Recurring habit definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    /// Unique label. Uniqueness is enforced by storage.
    pub name: String,
    pub description: Option<String>,
    /// Creation date; anchor of the first period.
    pub date_created: NaiveDate,
    pub periodicity: Periodicity,
}

impl Habit {
    /// Creates a habit with a generated stable ID and no description.
    pub fn new(name: impl Into<String>, periodicity: Periodicity, date_created: NaiveDate) -> Self {
        Self::with_id(Uuid::new_v4(), name, periodicity, date_created)
    }

    /// Creates a habit with a caller-provided ID.
    ///
    /// Used by storage read paths where identity already exists.
    pub fn with_id(
        id: HabitId,
        name: impl Into<String>,
        periodicity: Periodicity,
        date_created: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            date_created,
            periodicity,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the periodicity and name invariants.
    ///
    /// # Errors
    /// - `BlankName` when `name` is empty after trim.
    /// - `WeekdayOutOfRange` for a weekly rule with weekday > 6.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.name.trim().is_empty() {
            return Err(HabitValidationError::BlankName);
        }
        if let Periodicity::Weekly { weekday } = self.periodicity {
            if weekday > MAX_WEEKDAY {
                return Err(HabitValidationError::WeekdayOutOfRange(i64::from(weekday)));
            }
        }
        Ok(())
    }
}

/// Stored habit whose definition failed to decode or validate.
///
/// Keeps the row's identity so it can be reported and deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidHabit {
    pub id: HabitId,
    pub name: String,
    pub reason: HabitValidationError,
}

/// One habit row as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitRecord {
    Valid(Habit),
    Invalid(InvalidHabit),
}

impl HabitRecord {
    /// Classifies a decoded habit by running `Habit::validate`.
    pub fn checked(habit: Habit) -> Self {
        match habit.validate() {
            Ok(()) => Self::Valid(habit),
            Err(reason) => Self::Invalid(InvalidHabit {
                id: habit.id,
                name: habit.name,
                reason,
            }),
        }
    }

    pub fn id(&self) -> HabitId {
        match self {
            Self::Valid(habit) => habit.id,
            Self::Invalid(invalid) => invalid.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Valid(habit) => &habit.name,
            Self::Invalid(invalid) => &invalid.name,
        }
    }

    pub fn habit(&self) -> Option<&Habit> {
        match self {
            Self::Valid(habit) => Some(habit),
            Self::Invalid(_) => None,
        }
    }

    pub fn invalid_reason(&self) -> Option<&HabitValidationError> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(invalid) => Some(&invalid.reason),
        }
    }

    pub fn into_habit(self) -> Result<Habit, InvalidHabit> {
        match self {
            Self::Valid(habit) => Ok(habit),
            Self::Invalid(invalid) => Err(invalid),
        }
    }
}
