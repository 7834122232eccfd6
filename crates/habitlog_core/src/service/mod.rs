//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository reads/writes around the scheduling engine.
//! - Keep callers (CLI, UI) decoupled from storage details.

pub mod habit_service;
pub mod demo_seed;
