//! Habit domain model.
//!
//! # Responsibility
//! - Define the records exchanged with storage and callers.
//! - Validate habit definitions before they reach scheduling logic.
//!
//! # Invariants
//! - Every habit and instance is identified by a stable UUID.
//! - Instances are owned by exactly one habit and never outlive it.

pub mod habit;
pub mod instance;
