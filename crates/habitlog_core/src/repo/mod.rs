//! Repository layer: storage contract and implementations.
//!
//! # Responsibility
//! - Define the `HabitRepository` capability injected into services.
//! - Provide SQLite and in-memory implementations.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`HabitNotFound`,
//!   `DuplicatePeriod`, ...) in addition to DB transport errors.

pub mod habit_repo;
pub mod memory_repo;
