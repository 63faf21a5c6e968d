//! User Aggregate
//!
//! User account identity management.

pub mod entity;
pub mod repository;

// Re-export main types
pub use entity::{User, UserRole};
pub use repository::UserRepository;
