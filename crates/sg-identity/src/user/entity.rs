//! User Entity
//!
//! Account record for StudyGate users.
//! Supports local (password) and federated (Google) sign-in.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use utoipa::ToSchema;

/// Prefix for generated student numbers
pub const STUDENT_ID_PREFIX: &str = "STU-";

/// Role a user holds within StudyGate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Learner with a student number
    Student,
    /// Teaching staff
    Professor,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Professor => "professor",
        }
    }
}

/// User entity
///
/// Stored in the `users` collection. An account always has at least one
/// sign-in method: a password hash, an external identity, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// UUID as primary key
    #[serde(rename = "_id")]
    pub id: String,

    /// Email address (unique among active accounts)
    pub email: String,

    /// Display name
    pub full_name: String,

    /// Assigned role (absent until role selection)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,

    /// External IDP subject ID (for federated sign-in)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Argon2id password hash (for local sign-in)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    /// Student number (students only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,

    /// Whether the user has completed role selection
    #[serde(default)]
    pub role_assigned: bool,

    /// Whether the account is disabled
    #[serde(default)]
    pub disabled: bool,

    /// Audit fields
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a user with password credentials
    pub fn new_local(
        email: impl Into<String>,
        full_name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            full_name: full_name.into(),
            role: None,
            external_id: None,
            password_hash: Some(password_hash.into()),
            student_id: None,
            role_assigned: false,
            disabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a user from a federated identity (no local password)
    pub fn new_federated(
        email: impl Into<String>,
        full_name: impl Into<String>,
        external_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            full_name: full_name.into(),
            role: None,
            external_id: Some(external_id.into()),
            password_hash: None,
            student_id: None,
            role_assigned: false,
            disabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Assign a role.
    ///
    /// Students keep the supplied student number, or get a generated one.
    /// Any other role clears the student number.
    pub fn assign_role(&mut self, role: UserRole, student_id: Option<String>) {
        self.role = Some(role);
        self.role_assigned = true;
        self.student_id = match role {
            UserRole::Student => Some(student_id.unwrap_or_else(Self::generate_student_id)),
            UserRole::Professor => None,
        };
        self.updated_at = Utc::now();
    }

    /// Link a federated identity to this account.
    ///
    /// Returns false if an external ID is already linked; the existing
    /// link is kept.
    pub fn link_external_id(&mut self, external_id: impl Into<String>) -> bool {
        if self.external_id.is_some() {
            return false;
        }
        self.external_id = Some(external_id.into());
        self.updated_at = Utc::now();
        true
    }

    /// Check if the user still has to pick a role
    pub fn needs_role_assignment(&self) -> bool {
        !self.role_assigned
    }

    /// Disable the account (blocks password sign-in)
    pub fn disable(&mut self) {
        self.disabled = true;
        self.updated_at = Utc::now();
    }

    /// Generate a student number: STU- followed by five digits
    pub fn generate_student_id() -> String {
        use rand::Rng;

        let n: u32 = rand::thread_rng().gen_range(10000..100000);
        format!("{}{}", STUDENT_ID_PREFIX, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_student_id_shape() {
        for _ in 0..100 {
            let id = User::generate_student_id();
            assert!(id.starts_with(STUDENT_ID_PREFIX));
            let digits = &id[STUDENT_ID_PREFIX.len()..];
            assert_eq!(digits.len(), 5);
            let n: u32 = digits.parse().unwrap();
            assert!((10000..=99999).contains(&n));
        }
    }

    #[test]
    fn test_bson_round_trip() {
        let mut user = User::new_local("ada@example.com", "Ada Lovelace", "$argon2id$test");
        user.assign_role(UserRole::Student, Some("S123".to_string()));

        let doc = bson::to_document(&user).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), user.id);
        assert_eq!(doc.get_str("fullName").unwrap(), "Ada Lovelace");
        assert_eq!(doc.get_str("role").unwrap(), "student");

        let back: User = bson::from_document(doc).unwrap();
        assert_eq!(back.email, user.email);
        assert_eq!(back.role, Some(UserRole::Student));
        assert_eq!(back.student_id, Some("S123".to_string()));
    }
}
