use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A registered account. The username doubles as the user's email address
/// for reminder mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "skinType")]
    pub skin_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn new(username: &str, password_hash: &str, skin_type: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            skin_type: skin_type.to_string(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
