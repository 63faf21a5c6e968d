//! Identity API Integration Tests
//!
//! Tests for user domain models, credentials, sessions, and error handling.

use sg_identity::{Argon2Config, PasswordService, Session, User, UserRole, STUDENT_ID_PREFIX};

// Unit tests for domain models
mod user_domain_tests {
    use super::*;

    #[test]
    fn test_local_user_creation() {
        let user = User::new_local("ada@example.com", "Ada Lovelace", "$argon2id$test");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.full_name, "Ada Lovelace");
        assert!(user.password_hash.is_some());
        assert!(user.external_id.is_none());
        assert!(user.role.is_none());
        assert!(!user.role_assigned);
        assert!(user.needs_role_assignment());
        assert!(!user.disabled);
    }

    #[test]
    fn test_federated_user_creation() {
        let user = User::new_federated("ada@example.com", "Ada Lovelace", "google-sub-1");
        assert_eq!(user.external_id, Some("google-sub-1".to_string()));
        assert!(user.password_hash.is_none());
        assert!(user.needs_role_assignment());
    }

    #[test]
    fn test_assign_student_role_generates_student_id() {
        let mut user = User::new_local("ada@example.com", "Ada", "hash");
        user.assign_role(UserRole::Student, None);

        assert_eq!(user.role, Some(UserRole::Student));
        assert!(user.role_assigned);
        assert!(!user.needs_role_assignment());

        let student_id = user.student_id.unwrap();
        assert!(student_id.starts_with(STUDENT_ID_PREFIX));
        let digits: u32 = student_id[STUDENT_ID_PREFIX.len()..].parse().unwrap();
        assert!((10000..=99999).contains(&digits));
    }

    #[test]
    fn test_assign_student_role_keeps_supplied_student_id() {
        let mut user = User::new_local("ada@example.com", "Ada", "hash");
        user.assign_role(UserRole::Student, Some("S123".to_string()));
        assert_eq!(user.student_id, Some("S123".to_string()));
    }

    #[test]
    fn test_assign_professor_role_clears_student_id() {
        let mut user = User::new_local("ada@example.com", "Ada", "hash");
        user.assign_role(UserRole::Student, None);
        assert!(user.student_id.is_some());

        user.assign_role(UserRole::Professor, None);
        assert_eq!(user.role, Some(UserRole::Professor));
        assert!(user.student_id.is_none());
    }

    #[test]
    fn test_professor_ignores_supplied_student_id() {
        let mut user = User::new_local("ada@example.com", "Ada", "hash");
        user.assign_role(UserRole::Professor, Some("S123".to_string()));
        assert!(user.student_id.is_none());
    }

    #[test]
    fn test_link_external_id_once() {
        let mut user = User::new_local("ada@example.com", "Ada", "hash");

        assert!(user.link_external_id("google-sub-1"));
        assert_eq!(user.external_id, Some("google-sub-1".to_string()));

        // Second link attempt keeps the first identity
        assert!(!user.link_external_id("google-sub-2"));
        assert_eq!(user.external_id, Some("google-sub-1".to_string()));
    }

    #[test]
    fn test_disable() {
        let mut user = User::new_local("ada@example.com", "Ada", "hash");
        assert!(!user.disabled);

        user.disable();
        assert!(user.disabled);
    }
}

// Credential hashing and verification tests
mod credential_tests {
    use super::*;

    #[test]
    fn test_register_then_verify() {
        let service = PasswordService::new(Argon2Config::testing());

        let hash = service.hash_password("correct horse battery").unwrap();
        assert!(service.verify_password("correct horse battery", &hash));
        assert!(!service.verify_password("wrong horse battery", &hash));
    }

    #[test]
    fn test_verify_is_total() {
        let service = PasswordService::new(Argon2Config::testing());

        // Malformed digests never error, they just fail verification
        assert!(!service.verify_password("password", "plaintext-not-a-digest"));
        assert!(!service.verify_password("password", ""));
    }
}

// Session token tests
mod session_tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_pair() {
        let (raw, session) = Session::generate("user-1", Duration::seconds(28800));

        assert_eq!(session.user_id, "user-1");
        assert_eq!(session.token_hash, Session::hash_token(&raw));
        assert_ne!(session.token_hash, raw);
        assert!(!session.is_expired());
    }

    #[test]
    fn test_raw_tokens_unique() {
        let a = Session::generate_raw_token();
        let b = Session::generate_raw_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expiry() {
        let (_, session) = Session::generate("user-1", Duration::zero());
        assert!(session.is_expired());
    }
}

// Error handling tests
mod error_tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use sg_identity::IdentityError;

    #[test]
    fn test_not_found_error() {
        let err = IdentityError::not_found("User", "user-123");
        let msg = err.to_string();
        assert!(msg.contains("User"));
        assert!(msg.contains("user-123"));
    }

    #[test]
    fn test_conflict_error() {
        let err = IdentityError::conflict("User", "email", "ada@example.com");
        let msg = err.to_string();
        assert!(msg.contains("email"));
        assert!(msg.contains("ada@example.com"));
    }

    #[test]
    fn test_validation_error() {
        let err = IdentityError::validation("Missing required field: email");
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            IdentityError::not_found("User", "x").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            IdentityError::conflict("User", "email", "x").into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            IdentityError::validation("bad").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            IdentityError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            IdentityError::internal("boom").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let store_err = IdentityError::StoreUnavailable(mongodb::error::Error::custom("down"));
        assert_eq!(
            store_err.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_invalid_credentials_reveal_nothing() {
        // The same body regardless of which check failed
        assert_eq!(
            IdentityError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
    }
}

// Router construction tests
mod router_tests {
    use std::sync::Arc;

    use sg_identity::{
        auth_router, Argon2Config, AuthState, FederatedSyncService, PasswordService,
        SessionRepository, UserRepository,
    };

    #[test]
    fn test_auth_router_builds() {
        // Client construction is lazy: no I/O happens until a request runs
        let client = tokio_test::block_on(async {
            mongodb::Client::with_uri_str("mongodb://localhost:27017")
                .await
                .unwrap()
        });
        let db = client.database("studygate_test");

        let user_repo = Arc::new(UserRepository::new(&db));
        let session_repo = Arc::new(SessionRepository::new(&db));
        let password_service = Arc::new(PasswordService::new(Argon2Config::testing()));
        let federated_sync = Arc::new(FederatedSyncService::new(user_repo.clone()));

        let state = AuthState::new(user_repo, session_repo, password_service, federated_sync)
            .with_session_cookie_settings("sg_session", false, "Lax", 3600);

        let _router = auth_router(state);
    }
}
