//! Meal recommendation engine with safety-first filtering and per-user exploration.

pub mod config;
pub mod error;
pub mod recommendation;
pub mod telemetry;
