use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::analysis::result::AnalysisResult;

/// One stored photo awaiting (or holding) its analysis. Identified by the
/// generated storage filename; `analysis` goes from `None` to `Some` at most
/// once and is never cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub user_id: Uuid,
    pub filename: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    pub skin_type: String,
    pub analysis: Option<AnalysisResult>,
}

impl UploadRecord {
    pub fn new(user_id: Uuid, filename: &str, skin_type: &str) -> Self {
        Self {
            user_id,
            filename: filename.to_string(),
            uploaded_at: OffsetDateTime::now_utc(),
            skin_type: skin_type.to_string(),
            analysis: None,
        }
    }
}
