//! MongoDB Index Initialization
//!
//! Creates indexes for all collections on application startup.

use mongodb::{Database, IndexModel, bson::doc, options::IndexOptions};
use tracing::info;

/// Initialize all MongoDB indexes
pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    info!("Initializing MongoDB indexes...");

    create_user_indexes(db).await?;
    create_session_indexes(db).await?;

    info!("MongoDB indexes initialized successfully");
    Ok(())
}

async fn create_user_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let users = db.collection::<mongodb::bson::Document>("users");

    // Email lookup (unique among non-disabled accounts)
    users.create_index(
        IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(doc! { "disabled": { "$eq": false } })
                .background(true)
                .build())
            .build(),
    ).await?;

    // Federated identity lookup (unique, sparse: absent for local-only accounts)
    users.create_index(
        IndexModel::builder()
            .keys(doc! { "externalId": 1 })
            .options(IndexOptions::builder()
                .unique(true)
                .sparse(true)
                .background(true)
                .build())
            .build(),
    ).await?;

    info!("Created indexes on users");
    Ok(())
}

async fn create_session_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let sessions = db.collection::<mongodb::bson::Document>("sessions");

    // Token hash lookup (unique)
    sessions.create_index(
        IndexModel::builder()
            .keys(doc! { "tokenHash": 1 })
            .options(IndexOptions::builder()
                .unique(true)
                .background(true)
                .build())
            .build(),
    ).await?;

    // TTL index - auto-delete expired sessions
    sessions.create_index(
        IndexModel::builder()
            .keys(doc! { "expiresAt": 1 })
            .options(IndexOptions::builder()
                .expire_after(std::time::Duration::from_secs(0))
                .background(true)
                .build())
            .build(),
    ).await?;

    info!("Created indexes on sessions");
    Ok(())
}
