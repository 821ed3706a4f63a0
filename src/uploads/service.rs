use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::info;

use crate::{auth::user::User, state::AppState, uploads::record::UploadRecord};

/// Builds the storage filename for an upload: a nanosecond timestamp plus the
/// sanitized extension of the client's filename. The client-chosen name never
/// reaches the filesystem.
pub fn storage_filename(original: Option<&str>, now: OffsetDateTime) -> String {
    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "jpg".into());
    format!("{}.{}", now.unix_timestamp_nanos(), ext)
}

/// Persists the bytes, then appends the upload record. The record only exists
/// once the write has succeeded, so no record ever points at a missing file.
pub async fn receive(
    state: &AppState,
    user: &User,
    body: Bytes,
    original_filename: Option<&str>,
) -> anyhow::Result<UploadRecord> {
    let filename = storage_filename(original_filename, OffsetDateTime::now_utc());
    state
        .storage
        .put_object(&filename, body)
        .await
        .with_context(|| format!("store upload {filename}"))?;

    let record = UploadRecord::new(user.id, &filename, &user.skin_type);
    state.store.append_upload(record.clone()).await;

    info!(user_id = %user.id, filename = %filename, "upload stored");
    Ok(record)
}
