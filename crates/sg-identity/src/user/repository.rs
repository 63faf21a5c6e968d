//! User Repository
//!
//! Repository for user accounts in MongoDB.

use mongodb::{Collection, Database, bson::doc};
use crate::user::entity::User;
use crate::shared::error::{IdentityError, Result};

/// Check if a MongoDB error is a duplicate key error (code 11000)
fn is_duplicate_key_error(error: &mongodb::error::Error) -> bool {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(write_error)) =
        error.kind.as_ref()
    {
        return write_error.code == 11000;
    }
    false
}

pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    /// Insert a new user.
    ///
    /// A duplicate key violation on the unique email index is reported
    /// as a conflict.
    pub async fn insert(&self, user: &User) -> Result<()> {
        match self.collection.insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key_error(&e) => {
                Err(IdentityError::conflict("User", "email", &user.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "externalId": external_id }).await?)
    }

    /// Check if a non-disabled user holds the given email
    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        let count = self.collection
            .count_documents(doc! { "email": email, "disabled": false })
            .await?;
        Ok(count > 0)
    }

    /// Full-record save, upserting by id
    pub async fn update(&self, user: &User) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &user.id }, user)
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Repository tests require MongoDB connection
    // These would typically be integration tests
}
