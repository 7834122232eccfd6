use chrono::NaiveDate;
use habitlog_core::{Habit, HabitInstance, HabitValidationError, Periodicity, PeriodicityKind};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn habit_new_sets_defaults() {
    let habit = Habit::new("read", Periodicity::Daily, date(2024, 1, 1));

    assert!(!habit.id.is_nil());
    assert_eq!(habit.name, "read");
    assert_eq!(habit.description, None);
    assert_eq!(habit.date_created, date(2024, 1, 1));
    assert_eq!(habit.periodicity.kind(), PeriodicityKind::Daily);
    assert_eq!(habit.periodicity.weekday(), None);
    assert!(habit.validate().is_ok());
}

#[test]
fn validate_rejects_blank_name_and_bad_weekday() {
    let blank = Habit::new("   ", Periodicity::Daily, date(2024, 1, 1));
    assert_eq!(blank.validate().unwrap_err(), HabitValidationError::BlankName);

    let sunday = Habit::new("rest", Periodicity::Weekly { weekday: 6 }, date(2024, 1, 1));
    assert!(sunday.validate().is_ok());

    let bad = Habit::new("rest", Periodicity::Weekly { weekday: 7 }, date(2024, 1, 1));
    assert_eq!(
        bad.validate().unwrap_err(),
        HabitValidationError::WeekdayOutOfRange(7)
    );
}

#[test]
fn habit_serialization_uses_expected_wire_fields() {
    let habit_id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let habit = Habit::with_id(
        habit_id,
        "gym",
        Periodicity::Weekly { weekday: 2 },
        date(2024, 1, 1),
    )
    .with_description("leg day");

    let json = serde_json::to_value(&habit).unwrap();
    assert_eq!(json["id"], habit_id.to_string());
    assert_eq!(json["name"], "gym");
    assert_eq!(json["description"], "leg day");
    assert_eq!(json["date_created"], "2024-01-01");
    assert_eq!(json["periodicity"]["kind"], "weekly");
    assert_eq!(json["periodicity"]["weekday"], 2);

    let decoded: Habit = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, habit);
}

#[test]
fn daily_periodicity_serializes_without_weekday() {
    let json = serde_json::to_value(Periodicity::Daily).unwrap();
    assert_eq!(json, serde_json::json!({ "kind": "daily" }));
}

#[test]
fn instance_starts_open() {
    let instance = HabitInstance::new(Uuid::new_v4(), date(2024, 1, 3), date(2024, 1, 9));

    assert!(!instance.is_completed());
    assert_eq!(instance.period_start, date(2024, 1, 3));
    assert_eq!(instance.due_date, date(2024, 1, 9));
}

#[test]
fn periodicity_kind_parses_case_insensitively() {
    assert_eq!(PeriodicityKind::parse("Weekly"), Some(PeriodicityKind::Weekly));
    assert_eq!(PeriodicityKind::parse(" daily "), Some(PeriodicityKind::Daily));
    assert_eq!(PeriodicityKind::parse("monthly"), None);
    assert_eq!(PeriodicityKind::Weekly.to_string(), "weekly");
}
