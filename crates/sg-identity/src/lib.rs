//! StudyGate Identity
//!
//! Identity backend providing:
//! - Local account registration with Argon2id password hashing
//! - Password and federated (Google) login
//! - Post-registration role selection (student/professor)
//! - Cookie-backed server-side sessions
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - API endpoints where applicable

// Core aggregates
pub mod user;

// Authentication & sessions
pub mod auth;

// Shared infrastructure
pub mod shared;

// Re-export common types from shared
pub use shared::error::{ErrorResponse, IdentityError, Result};

// Re-export main entity types for convenience
pub use user::entity::{User, UserRole, STUDENT_ID_PREFIX};
pub use auth::session::Session;

// Re-export repositories
pub use user::repository::UserRepository;
pub use auth::session_repository::SessionRepository;

// Re-export services
pub use auth::password_service::{Argon2Config, PasswordService};
pub use auth::federated_sync_service::FederatedSyncService;

// Re-export API surface
pub use auth::auth_api::{auth_router, AuthState};
