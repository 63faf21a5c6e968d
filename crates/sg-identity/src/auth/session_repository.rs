//! Session Repository
//!
//! Repository for browser sessions in MongoDB.
//! Lookups by token hash only consider unexpired sessions; a TTL index
//! reclaims expired documents in the background.

use mongodb::{Collection, Database, bson::doc};
use chrono::Utc;
use crate::auth::session::Session;
use crate::shared::error::Result;

pub struct SessionRepository {
    collection: Collection<Session>,
}

impl SessionRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("sessions"),
        }
    }

    /// Insert a new session
    pub async fn insert(&self, session: &Session) -> Result<()> {
        self.collection.insert_one(session).await?;
        Ok(())
    }

    /// Find an unexpired session by its token hash
    ///
    /// This is the primary lookup method. The raw token from the cookie
    /// is hashed and looked up.
    pub async fn find_valid_by_hash(&self, token_hash: &str) -> Result<Option<Session>> {
        let now = mongodb::bson::DateTime::from_chrono(Utc::now());
        Ok(self.collection
            .find_one(doc! {
                "tokenHash": token_hash,
                "expiresAt": { "$gt": now }
            })
            .await?)
    }

    /// Delete a session by its token hash (logout)
    ///
    /// Idempotent: deleting an unknown hash reports false.
    pub async fn delete_by_hash(&self, token_hash: &str) -> Result<bool> {
        let result = self.collection
            .delete_one(doc! { "tokenHash": token_hash })
            .await?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    // Repository tests require MongoDB connection
    // These would typically be integration tests
}
