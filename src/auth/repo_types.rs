use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                                 // unique user ID
    pub email: String,                            // trimmed, lower-cased
    #[serde(skip_serializing)]
    pub password_hash: String,                    // Argon2 PHC string, not exposed in JSON
    pub email_verified_at: Option<OffsetDateTime>, // never set by this service
    pub created_at: OffsetDateTime,
}
