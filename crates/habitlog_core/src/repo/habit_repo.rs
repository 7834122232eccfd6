//! Habit storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the storage capability the service layer is built on.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Habit writes call `Habit::validate()` before SQL mutations.
//! - A habit row with a malformed definition is returned as
//!   `HabitRecord::Invalid` so one bad row never hides the others.
//! - Rows without a decodable identity fail with `InvalidData`.
//! - Instances are returned ordered by `period_start`.

use crate::db::DbError;
use crate::model::habit::{
    Habit, HabitId, HabitRecord, HabitValidationError, InvalidHabit, Periodicity,
    PeriodicityKind, MAX_WEEKDAY,
};
use crate::model::instance::{HabitInstance, InstanceId};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

const HABIT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    date_created,
    periodicity,
    weekday
FROM habits";

const INSTANCE_SELECT_SQL: &str = "SELECT
    id,
    habit_id,
    period_start,
    due_date,
    completed_at
FROM habit_instances";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level error for habit and instance operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(HabitValidationError),
    Db(DbError),
    HabitNotFound(HabitId),
    InstanceNotFound(InstanceId),
    /// Another habit already uses this name.
    DuplicateName(String),
    /// The habit already has an instance for this period.
    DuplicatePeriod {
        habit_id: HabitId,
        period_start: NaiveDate,
    },
    /// Completion was already stored for this instance.
    AlreadyCompleted(InstanceId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::InstanceNotFound(id) => write!(f, "habit instance not found: {id}"),
            Self::DuplicateName(name) => write!(f, "a habit named `{name}` already exists"),
            Self::DuplicatePeriod {
                habit_id,
                period_start,
            } => write!(
                f,
                "habit {habit_id} already has an instance for period {period_start}"
            ),
            Self::AlreadyCompleted(id) => write!(f, "habit instance already completed: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted habit data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HabitValidationError> for RepoError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage capability consumed by the habit service.
///
/// Implementations must keep `(habit_id, period_start)` unique and delete a
/// habit's instances together with the habit.
pub trait HabitRepository {
    /// Stores a new habit. Fails with `DuplicateName` when the name is taken.
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId>;
    /// Finds a habit by its exact name.
    fn fetch_habit(&self, name: &str) -> RepoResult<Option<HabitRecord>>;
    /// Lists habits in creation order, optionally filtered by periodicity.
    ///
    /// Habits whose stored definition is malformed come back as
    /// `HabitRecord::Invalid` in their usual position.
    fn fetch_all_habits(&self, filter: Option<PeriodicityKind>)
        -> RepoResult<Vec<HabitRecord>>;
    /// Deletes a habit and all of its instances.
    fn delete_habit(&self, habit_id: HabitId) -> RepoResult<()>;
    /// Lists one habit's instances ordered by `period_start`.
    fn fetch_instances(&self, habit_id: HabitId) -> RepoResult<Vec<HabitInstance>>;
    /// Lists instances of every habit ordered by habit, then `period_start`.
    fn fetch_all_instances(&self) -> RepoResult<Vec<HabitInstance>>;
    /// Stores a new instance. Fails with `DuplicatePeriod` when the period
    /// already exists for the habit.
    fn persist_instance(&self, instance: &HabitInstance) -> RepoResult<InstanceId>;
    /// Stores the completion date of an open instance.
    fn persist_completion(&self, instance_id: InstanceId, completed_at: NaiveDate)
        -> RepoResult<()>;
}

impl<T: HabitRepository + ?Sized> HabitRepository for &T {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        (**self).create_habit(habit)
    }

    fn fetch_habit(&self, name: &str) -> RepoResult<Option<HabitRecord>> {
        (**self).fetch_habit(name)
    }

    fn fetch_all_habits(&self, filter: Option<PeriodicityKind>) -> RepoResult<Vec<HabitRecord>> {
        (**self).fetch_all_habits(filter)
    }

    fn delete_habit(&self, habit_id: HabitId) -> RepoResult<()> {
        (**self).delete_habit(habit_id)
    }

    fn fetch_instances(&self, habit_id: HabitId) -> RepoResult<Vec<HabitInstance>> {
        (**self).fetch_instances(habit_id)
    }

    fn fetch_all_instances(&self) -> RepoResult<Vec<HabitInstance>> {
        (**self).fetch_all_instances()
    }

    fn persist_instance(&self, instance: &HabitInstance) -> RepoResult<InstanceId> {
        (**self).persist_instance(instance)
    }

    fn persist_completion(
        &self,
        instance_id: InstanceId,
        completed_at: NaiveDate,
    ) -> RepoResult<()> {
        (**self).persist_completion(instance_id, completed_at)
    }
}

/// SQLite-backed habit repository over a migrated connection.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit.validate()?;

        let result = self.conn.execute(
            "INSERT INTO habits (
                id,
                name,
                description,
                date_created,
                periodicity,
                weekday
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                habit.id.to_string(),
                habit.name.as_str(),
                habit.description.as_deref(),
                format_date(habit.date_created),
                habit.periodicity.kind().as_str(),
                habit.periodicity.weekday().map(i64::from),
            ],
        );

        match result {
            Ok(_) => Ok(habit.id),
            Err(err) if is_constraint(&err, ffi::SQLITE_CONSTRAINT_UNIQUE) => {
                Err(RepoError::DuplicateName(habit.name.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn fetch_habit(&self, name: &str) -> RepoResult<Option<HabitRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{HABIT_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_habit_row(row)?));
        }
        Ok(None)
    }

    fn fetch_all_habits(&self, filter: Option<PeriodicityKind>) -> RepoResult<Vec<HabitRecord>> {
        let mut sql = format!("{HABIT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(kind) = filter {
            sql.push_str(" AND periodicity = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }
        sql.push_str(" ORDER BY rowid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }
        Ok(habits)
    }

    fn delete_habit(&self, habit_id: HabitId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1;", [habit_id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::HabitNotFound(habit_id));
        }
        Ok(())
    }

    fn fetch_instances(&self, habit_id: HabitId) -> RepoResult<Vec<HabitInstance>> {
        let mut stmt = self.conn.prepare(&format!(
            "{INSTANCE_SELECT_SQL}
             WHERE habit_id = ?1
             ORDER BY period_start ASC;"
        ))?;
        let mut rows = stmt.query([habit_id.to_string()])?;
        let mut instances = Vec::new();
        while let Some(row) = rows.next()? {
            instances.push(parse_instance_row(row)?);
        }
        Ok(instances)
    }

    fn fetch_all_instances(&self) -> RepoResult<Vec<HabitInstance>> {
        let mut stmt = self.conn.prepare(&format!(
            "{INSTANCE_SELECT_SQL} ORDER BY habit_id ASC, period_start ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut instances = Vec::new();
        while let Some(row) = rows.next()? {
            instances.push(parse_instance_row(row)?);
        }
        Ok(instances)
    }

    fn persist_instance(&self, instance: &HabitInstance) -> RepoResult<InstanceId> {
        let result = self.conn.execute(
            "INSERT INTO habit_instances (
                id,
                habit_id,
                period_start,
                due_date,
                completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                instance.id.to_string(),
                instance.habit_id.to_string(),
                format_date(instance.period_start),
                format_date(instance.due_date),
                instance.completed_at.map(format_date),
            ],
        );

        match result {
            Ok(_) => Ok(instance.id),
            Err(err) if is_constraint(&err, ffi::SQLITE_CONSTRAINT_UNIQUE) => {
                Err(RepoError::DuplicatePeriod {
                    habit_id: instance.habit_id,
                    period_start: instance.period_start,
                })
            }
            Err(err) if is_constraint(&err, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                Err(RepoError::HabitNotFound(instance.habit_id))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn persist_completion(
        &self,
        instance_id: InstanceId,
        completed_at: NaiveDate,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE habit_instances
             SET completed_at = ?2
             WHERE id = ?1
               AND completed_at IS NULL;",
            params![instance_id.to_string(), format_date(completed_at)],
        )?;
        if changed > 0 {
            return Ok(());
        }

        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM habit_instances WHERE id = ?1);",
            [instance_id.to_string()],
            |row| row.get(0),
        )?;
        if exists == 1 {
            Err(RepoError::AlreadyCompleted(instance_id))
        } else {
            Err(RepoError::InstanceNotFound(instance_id))
        }
    }
}

fn is_constraint(err: &rusqlite::Error, extended_code: i32) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.extended_code == extended_code
    )
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<HabitRecord> {
    let id = parse_uuid(row, "id", "habits.id")?;
    let name: String = row.get("name")?;
    let raw_date: Value = row.get("date_created")?;
    let raw_kind: Value = row.get("periodicity")?;
    let raw_weekday: Value = row.get("weekday")?;

    let definition = decode_date_created(raw_date).and_then(|date_created| {
        decode_periodicity(raw_kind, raw_weekday).map(|periodicity| (date_created, periodicity))
    });
    let (date_created, periodicity) = match definition {
        Ok(parts) => parts,
        Err(reason) => return Ok(HabitRecord::Invalid(InvalidHabit { id, name, reason })),
    };

    Ok(HabitRecord::checked(Habit {
        id,
        name,
        description: row.get("description")?,
        date_created,
        periodicity,
    }))
}

fn decode_date_created(value: Value) -> Result<NaiveDate, HabitValidationError> {
    match value {
        Value::Text(text) => NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .map_err(|_| HabitValidationError::InvalidCreationDate(text)),
        Value::Null => Err(HabitValidationError::InvalidCreationDate(String::new())),
        other => Err(HabitValidationError::InvalidCreationDate(format!("{other:?}"))),
    }
}

fn decode_periodicity(kind: Value, weekday: Value) -> Result<Periodicity, HabitValidationError> {
    let kind_text = match kind {
        Value::Text(text) => text,
        other => {
            return Err(HabitValidationError::InvalidPeriodicity(format!(
                "unexpected periodicity value {other:?}"
            )))
        }
    };

    match (PeriodicityKind::parse(&kind_text), weekday) {
        (Some(PeriodicityKind::Daily), Value::Null) => Ok(Periodicity::Daily),
        (Some(PeriodicityKind::Weekly), Value::Integer(value)) => u8::try_from(value)
            .ok()
            .filter(|weekday| *weekday <= MAX_WEEKDAY)
            .map(|weekday| Periodicity::Weekly { weekday })
            .ok_or(HabitValidationError::WeekdayOutOfRange(value)),
        (Some(kind), weekday) => Err(HabitValidationError::InvalidPeriodicity(format!(
            "{kind} rule with weekday {weekday:?}"
        ))),
        (None, _) => Err(HabitValidationError::InvalidPeriodicity(format!(
            "unknown kind `{kind_text}`"
        ))),
    }
}

fn parse_instance_row(row: &Row<'_>) -> RepoResult<HabitInstance> {
    let completed_at = match row.get::<_, Option<String>>("completed_at")? {
        Some(text) => Some(parse_date_text(&text, "habit_instances.completed_at")?),
        None => None,
    };

    Ok(HabitInstance {
        id: parse_uuid(row, "id", "habit_instances.id")?,
        habit_id: parse_uuid(row, "habit_id", "habit_instances.habit_id")?,
        period_start: parse_date(row, "period_start", "habit_instances.period_start")?,
        due_date: parse_date(row, "due_date", "habit_instances.due_date")?,
        completed_at,
    })
}

fn parse_uuid(row: &Row<'_>, column: &str, label: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {label}")))
}

fn parse_date(row: &Row<'_>, column: &str, label: &str) -> RepoResult<NaiveDate> {
    let text: Option<String> = row.get(column)?;
    let text = text.ok_or_else(|| RepoError::InvalidData(format!("missing date in {label}")))?;
    parse_date_text(&text, label)
}

fn parse_date_text(text: &str, label: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{text}` in {label}")))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
