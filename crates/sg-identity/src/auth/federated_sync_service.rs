//! Federated Identity Reconciliation
//!
//! Maps an external (Google) identity assertion onto the local user store:
//! match by external id first, then by email with external-id backfill,
//! otherwise create a fresh account.

use std::sync::Arc;
use tracing::info;

use crate::user::entity::User;
use crate::user::repository::UserRepository;
use crate::shared::error::Result;

/// Reconciliation verdict for one assertion
#[derive(Debug)]
enum SyncOutcome {
    /// A stored record already answers for this identity; returned untouched
    Matched(User),
    /// An email match without an external id; the backfilled link is persisted
    Linked(User),
    /// No match; a fresh account built from the assertion is inserted
    Created(User),
}

/// Decide what to do with an assertion given the two lookups.
///
/// External-id matches win over email matches; an email match links only
/// when no external id is set yet; stored fields are never refreshed from
/// the assertion.
fn reconcile(
    by_external_id: Option<User>,
    by_email: Option<User>,
    external_id: &str,
    email: &str,
    full_name: &str,
) -> SyncOutcome {
    if let Some(user) = by_external_id {
        return SyncOutcome::Matched(user);
    }

    if let Some(mut user) = by_email {
        if user.link_external_id(external_id) {
            return SyncOutcome::Linked(user);
        }
        // Email already linked to a different identity; keep the stored link
        return SyncOutcome::Matched(user);
    }

    SyncOutcome::Created(User::new_federated(email, full_name, external_id))
}

/// Federated identity reconciliation service
pub struct FederatedSyncService {
    user_repo: Arc<UserRepository>,
}

impl FederatedSyncService {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Resolve a federated identity assertion to a local user.
    ///
    /// Match order:
    /// 1. By external id. Repeat logins return the stored record unchanged;
    ///    upstream email or name changes are not mirrored.
    /// 2. By email. An account without an external id gets this one linked;
    ///    an account already linked to a different external id is returned
    ///    unchanged.
    /// 3. Otherwise a fresh account is created from the assertion.
    pub async fn sync_federated_user(
        &self,
        external_id: &str,
        email: &str,
        full_name: &str,
    ) -> Result<User> {
        let by_external_id = self.user_repo.find_by_external_id(external_id).await?;
        let by_email = match &by_external_id {
            Some(_) => None,
            None => self.user_repo.find_by_email(email).await?,
        };

        match reconcile(by_external_id, by_email, external_id, email, full_name) {
            SyncOutcome::Matched(user) => {
                info!(
                    user_id = %user.id,
                    external_id = %external_id,
                    "Federated login matched existing identity"
                );
                Ok(user)
            }
            SyncOutcome::Linked(user) => {
                self.user_repo.update(&user).await?;
                info!(
                    user_id = %user.id,
                    external_id = %external_id,
                    "Linked federated identity to existing account"
                );
                Ok(user)
            }
            SyncOutcome::Created(user) => {
                self.user_repo.insert(&user).await?;
                info!(
                    user_id = %user.id,
                    email = %email,
                    "Created user from federated identity"
                );
                Ok(user)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_id_match_wins_over_email() {
        let stored = User::new_federated("ada@example.com", "Ada Lovelace", "google-sub-1");
        let expected_id = stored.id.clone();
        let email_holder = User::new_local("ada@example.com", "Other Ada", "hash");

        let outcome = reconcile(
            Some(stored),
            Some(email_holder),
            "google-sub-1",
            "ada@example.com",
            "Ada Lovelace",
        );

        match outcome {
            SyncOutcome::Matched(user) => assert_eq!(user.id, expected_id),
            other => panic!("expected Matched, got {:?}", other),
        }
    }

    #[test]
    fn test_repeat_login_does_not_refresh_stored_fields() {
        let stored = User::new_federated("ada@example.com", "Ada Lovelace", "google-sub-1");

        // Upstream email and name have changed since the first login
        let outcome = reconcile(
            Some(stored),
            None,
            "google-sub-1",
            "renamed@example.com",
            "Renamed Ada",
        );

        match outcome {
            SyncOutcome::Matched(user) => {
                assert_eq!(user.email, "ada@example.com");
                assert_eq!(user.full_name, "Ada Lovelace");
            }
            other => panic!("expected Matched, got {:?}", other),
        }
    }

    #[test]
    fn test_email_match_links_unset_external_id() {
        let local = User::new_local("ada@example.com", "Ada", "hash");
        let expected_id = local.id.clone();

        let outcome = reconcile(None, Some(local), "google-sub-1", "ada@example.com", "Ada");

        match outcome {
            SyncOutcome::Linked(user) => {
                assert_eq!(user.id, expected_id);
                assert_eq!(user.external_id, Some("google-sub-1".to_string()));
                assert!(user.password_hash.is_some());
            }
            other => panic!("expected Linked, got {:?}", other),
        }
    }

    #[test]
    fn test_email_match_with_other_identity_stays_unchanged() {
        let linked = User::new_federated("ada@example.com", "Ada", "google-sub-1");

        let outcome = reconcile(None, Some(linked), "google-sub-2", "ada@example.com", "Ada");

        match outcome {
            SyncOutcome::Matched(user) => {
                assert_eq!(user.external_id, Some("google-sub-1".to_string()));
            }
            other => panic!("expected Matched, got {:?}", other),
        }
    }

    #[test]
    fn test_no_match_creates_federated_user() {
        let outcome = reconcile(None, None, "google-sub-1", "ada@example.com", "Ada Lovelace");

        match outcome {
            SyncOutcome::Created(user) => {
                assert_eq!(user.email, "ada@example.com");
                assert_eq!(user.external_id, Some("google-sub-1".to_string()));
                assert!(user.password_hash.is_none());
                assert!(user.needs_role_assignment());
            }
            other => panic!("expected Created, got {:?}", other),
        }
    }
}
