//! Shared HTTP handlers.

pub mod health;

pub use health::{AlwaysReady, ReadinessProbe, health_check, readiness_check};
