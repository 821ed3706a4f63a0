use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::debug;

use crate::analysis::result::AnalysisResult;

/// The closed set of concern dimensions requested from the provider.
pub const CONCERNS: [&str; 14] = [
    "acne",
    "dark_circle",
    "droopy_lower_eyelid",
    "droopy_upper_eyelid",
    "eye_bag",
    "firmness",
    "moisture",
    "oiliness",
    "pore",
    "radiance",
    "redness",
    "spots",
    "texture",
    "wrinkle",
];

/// Provider-issued destination for a file push.
#[derive(Debug, Clone)]
pub struct UploadSlot {
    pub upload_url: String,
    pub file_id: String,
}

/// One poll of an analysis job: still running, done, or dead.
#[derive(Debug, Clone)]
pub enum PollStatus {
    Succeeded(AnalysisResult),
    Failed(String),
    Pending,
}

/// The provider's four-phase protocol. Each phase is a separate call so the
/// orchestrator can classify failures per phase.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn request_slot(&self) -> anyhow::Result<UploadSlot>;
    async fn transfer(&self, upload_url: &str, body: Bytes) -> anyhow::Result<()>;
    async fn submit_job(&self, file_id: &str) -> anyhow::Result<String>;
    async fn poll_job(&self, task_id: &str) -> anyhow::Result<PollStatus>;
}

/// HTTP client for the real analysis provider.
pub struct SkinApiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SkinApiProvider {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build provider http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl AnalysisProvider for SkinApiProvider {
    async fn request_slot(&self) -> anyhow::Result<UploadSlot> {
        let resp = self
            .http
            .post(format!("{}/files", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .json(&json!({ "content_type": "image/jpeg" }))
            .send()
            .await
            .context("request upload slot")?
            .error_for_status()
            .context("upload slot request rejected")?;

        let body: Value = resp.json().await.context("decode upload slot response")?;
        let upload_url = body
            .get("upload_url")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("provider response missing upload_url"))?;
        let file_id = body
            .get("file_id")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("provider response missing file_id"))?;
        debug!(file_id = %file_id, "upload slot acquired");
        Ok(UploadSlot {
            upload_url: upload_url.to_string(),
            file_id: file_id.to_string(),
        })
    }

    async fn transfer(&self, upload_url: &str, body: Bytes) -> anyhow::Result<()> {
        self.http
            .put(upload_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await
            .context("push file bytes")?
            .error_for_status()
            .context("file push rejected")?;
        Ok(())
    }

    async fn submit_job(&self, file_id: &str) -> anyhow::Result<String> {
        let resp = self
            .http
            .post(format!("{}/tasks", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .json(&json!({ "file_id": file_id, "concerns": CONCERNS }))
            .send()
            .await
            .context("submit analysis job")?
            .error_for_status()
            .context("job submission rejected")?;

        let body: Value = resp.json().await.context("decode job submission response")?;
        let task_id = body
            .get("task_id")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("provider response missing task_id"))?;
        debug!(task_id = %task_id, "analysis job submitted");
        Ok(task_id.to_string())
    }

    async fn poll_job(&self, task_id: &str) -> anyhow::Result<PollStatus> {
        let resp = self
            .http
            .get(format!("{}/tasks/{}", self.base_url, task_id))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .context("poll job status")?
            .error_for_status()
            .context("job status request rejected")?;

        let body: Value = resp.json().await.context("decode job status response")?;
        match body.get("status").and_then(Value::as_str) {
            Some("success") => {
                let result = body.get("result").cloned().unwrap_or(Value::Null);
                Ok(PollStatus::Succeeded(AnalysisResult::Scored(result)))
            }
            Some("error") => Ok(PollStatus::Failed(
                body.get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("job reported error")
                    .to_string(),
            )),
            _ => Ok(PollStatus::Pending),
        }
    }
}

/// Local stand-in for the provider: no network, fixed result, succeeds on the
/// first poll. Exercises the whole orchestration path in dev and tests.
pub struct MockProvider;

#[async_trait]
impl AnalysisProvider for MockProvider {
    async fn request_slot(&self) -> anyhow::Result<UploadSlot> {
        Ok(UploadSlot {
            upload_url: "mock://upload".into(),
            file_id: "mock-file".into(),
        })
    }

    async fn transfer(&self, _upload_url: &str, _body: Bytes) -> anyhow::Result<()> {
        Ok(())
    }

    async fn submit_job(&self, _file_id: &str) -> anyhow::Result<String> {
        Ok("mock-task".into())
    }

    async fn poll_job(&self, _task_id: &str) -> anyhow::Result<PollStatus> {
        Ok(PollStatus::Succeeded(AnalysisResult::mock_summary()))
    }
}
