//! Core domain logic for Habitlog.
//!
//! Derives habit periods from a periodicity rule, backfills missing
//! instances, classifies them, and computes streaks. Storage is injected
//! through [`HabitRepository`]; command-line surfaces live outside this crate.

pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use engine::backfill::plan_backfill;
pub use engine::schedule::PeriodIter;
pub use engine::streak::{
    current_streak_for_habit, longest_streak_all, longest_streak_for_habit, HabitStreak,
    StreakSummary,
};
pub use engine::EngineError;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::habit::{
    Habit, HabitId, HabitRecord, HabitValidationError, InvalidHabit, Periodicity,
    PeriodicityKind, MAX_WEEKDAY,
};
pub use model::instance::{HabitInstance, InstanceId, InstanceStatus};
pub use repo::habit_repo::{HabitRepository, RepoError, RepoResult, SqliteHabitRepository};
pub use repo::memory_repo::MemoryHabitRepository;
pub use service::demo_seed::seed_demo;
pub use service::habit_service::{
    CreateHabitRequest, HabitOverview, HabitSelection, HabitService, HabitServiceError,
    InstanceView, ServiceResult, StreakReport,
};

/// Startup failure from [`bootstrap`].
#[derive(Debug)]
pub enum BootstrapError {
    Logging(LoggingError),
    Db(db::DbError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

/// Starts logging (when `log_dir` is configured) and opens the migrated
/// habit database.
pub fn bootstrap(config: &CoreConfig) -> Result<rusqlite::Connection, BootstrapError> {
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir).map_err(BootstrapError::Logging)?;
    }
    db::open_db(&config.database_path).map_err(BootstrapError::Db)
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
