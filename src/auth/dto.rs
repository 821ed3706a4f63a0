use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for signup. Missing fields surface as a 400, not a
/// deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "skinType")]
    pub skin_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: Uuid,
    pub username: String,
    #[serde(rename = "skinType")]
    pub skin_type: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}
