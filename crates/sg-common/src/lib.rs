//! Shared infrastructure for StudyGate services.

pub mod logging;
