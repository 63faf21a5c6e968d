//! Shared Module
//!
//! Cross-cutting concerns and shared utilities.

pub mod error;
pub mod indexes;

// Re-export commonly used items
pub use error::{ErrorResponse, IdentityError, Result};
