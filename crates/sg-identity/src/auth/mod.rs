//! Authentication Aggregate
//!
//! Password credentials, sessions, and federated login.

// Core auth
pub mod password_service;
pub mod auth_api;

// Sessions
pub mod session;
pub mod session_repository;

// Federated identity
pub mod federated_sync_service;

// Re-export main types
pub use auth_api::{auth_router, AuthState};
pub use password_service::PasswordService;
pub use session::Session;
pub use session_repository::SessionRepository;
pub use federated_sync_service::FederatedSyncService;
