use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::analysis::provider::{AnalysisProvider, PollStatus};
use crate::analysis::result::AnalysisResult;

pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const MAX_POLLS: u32 = 30;

/// Orchestration failures, one per distinguishable class. The HTTP layer
/// collapses them for the client; logs keep them apart.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("provider protocol error: {0}")]
    ProviderProtocol(String),
    #[error("file transfer failed: {0}")]
    TransferFailed(String),
    #[error("analysis job failed: {0}")]
    JobFailed(String),
    #[error("analysis timed out after {0} polls")]
    Timeout(u32),
}

/// Drives one analysis through the provider's four phases:
/// RequestSlot -> Transfer -> SubmitJob -> Poll. Stateless per call; the
/// caller attaches the result to its upload record. Polling is bounded at
/// `MAX_POLLS`. There is no cancellation: a disconnected client does not
/// abort an in-flight polling sequence.
pub struct Orchestrator {
    provider: Arc<dyn AnalysisProvider>,
    poll_interval: Duration,
    max_polls: u32,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self::with_polling(provider, POLL_INTERVAL, MAX_POLLS)
    }

    /// Poll timing is injectable for tests.
    pub fn with_polling(
        provider: Arc<dyn AnalysisProvider>,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Self {
        Self {
            provider,
            poll_interval,
            max_polls,
        }
    }

    #[instrument(skip(self, body))]
    pub async fn analyze(&self, body: Bytes) -> Result<AnalysisResult, AnalysisError> {
        let slot = self
            .provider
            .request_slot()
            .await
            .map_err(|e| AnalysisError::ProviderProtocol(e.to_string()))?;
        debug!(file_id = %slot.file_id, "slot acquired");

        // Single attempt; a failed push is not retried here.
        self.provider
            .transfer(&slot.upload_url, body)
            .await
            .map_err(|e| AnalysisError::TransferFailed(e.to_string()))?;
        debug!(file_id = %slot.file_id, "file transferred");

        let task_id = self
            .provider
            .submit_job(&slot.file_id)
            .await
            .map_err(|e| AnalysisError::ProviderProtocol(e.to_string()))?;
        debug!(task_id = %task_id, "job submitted");

        for attempt in 1..=self.max_polls {
            let status = self
                .provider
                .poll_job(&task_id)
                .await
                .map_err(|e| AnalysisError::ProviderProtocol(e.to_string()))?;
            match status {
                PollStatus::Succeeded(result) => {
                    debug!(task_id = %task_id, attempt, "job succeeded");
                    return Ok(result);
                }
                PollStatus::Failed(detail) => {
                    warn!(task_id = %task_id, attempt, detail = %detail, "job failed");
                    return Err(AnalysisError::JobFailed(detail));
                }
                PollStatus::Pending => {
                    if attempt < self.max_polls {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        warn!(task_id = %task_id, polls = self.max_polls, "job timed out");
        Err(AnalysisError::Timeout(self.max_polls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::provider::UploadSlot;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Provider whose poll outcomes follow a script; counts every call.
    struct ScriptedProvider {
        polls: AtomicU32,
        /// Poll number (1-based) at which to return the terminal status.
        terminal_at: u32,
        fail: bool,
        slot_ok: bool,
        transfer_ok: bool,
    }

    impl ScriptedProvider {
        fn succeeding_at(k: u32) -> Self {
            Self {
                polls: AtomicU32::new(0),
                terminal_at: k,
                fail: false,
                slot_ok: true,
                transfer_ok: true,
            }
        }

        fn poll_count(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisProvider for ScriptedProvider {
        async fn request_slot(&self) -> anyhow::Result<UploadSlot> {
            if !self.slot_ok {
                return Err(anyhow!("provider response missing upload_url"));
            }
            Ok(UploadSlot {
                upload_url: "test://slot".into(),
                file_id: "f-1".into(),
            })
        }

        async fn transfer(&self, _url: &str, _body: Bytes) -> anyhow::Result<()> {
            if !self.transfer_ok {
                return Err(anyhow!("connection reset"));
            }
            Ok(())
        }

        async fn submit_job(&self, _file_id: &str) -> anyhow::Result<String> {
            Ok("t-1".into())
        }

        async fn poll_job(&self, _task_id: &str) -> anyhow::Result<PollStatus> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < self.terminal_at {
                return Ok(PollStatus::Pending);
            }
            if self.fail {
                Ok(PollStatus::Failed("bad image".into()))
            } else {
                Ok(PollStatus::Succeeded(AnalysisResult::mock_summary()))
            }
        }
    }

    fn orchestrator(provider: Arc<ScriptedProvider>) -> Orchestrator {
        Orchestrator::with_polling(provider, Duration::ZERO, MAX_POLLS)
    }

    #[tokio::test]
    async fn success_at_poll_k_polls_exactly_k_times() {
        for k in [1u32, 7, 30] {
            let provider = Arc::new(ScriptedProvider::succeeding_at(k));
            let orch = orchestrator(provider.clone());
            let result = orch.analyze(Bytes::from_static(b"img")).await.expect("result");
            assert!(matches!(result, AnalysisResult::Summary { .. }));
            assert_eq!(provider.poll_count(), k, "k = {k}");
        }
    }

    #[tokio::test]
    async fn never_terminal_times_out_after_max_polls() {
        let provider = Arc::new(ScriptedProvider::succeeding_at(u32::MAX));
        let orch = orchestrator(provider.clone());
        let err = orch.analyze(Bytes::from_static(b"img")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Timeout(MAX_POLLS)));
        assert_eq!(provider.poll_count(), MAX_POLLS);
    }

    #[tokio::test]
    async fn error_status_fails_immediately_without_further_polling() {
        let provider = Arc::new(ScriptedProvider {
            fail: true,
            ..ScriptedProvider::succeeding_at(1)
        });
        let orch = orchestrator(provider.clone());
        let err = orch.analyze(Bytes::from_static(b"img")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::JobFailed(ref d) if d == "bad image"));
        assert_eq!(provider.poll_count(), 1);
    }

    #[tokio::test]
    async fn missing_slot_fields_are_a_protocol_error() {
        let provider = Arc::new(ScriptedProvider {
            slot_ok: false,
            ..ScriptedProvider::succeeding_at(1)
        });
        let orch = orchestrator(provider.clone());
        let err = orch.analyze(Bytes::from_static(b"img")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::ProviderProtocol(_)));
        assert_eq!(provider.poll_count(), 0);
    }

    #[tokio::test]
    async fn transfer_failure_is_distinguishable_and_unretried() {
        let provider = Arc::new(ScriptedProvider {
            transfer_ok: false,
            ..ScriptedProvider::succeeding_at(1)
        });
        let orch = orchestrator(provider.clone());
        let err = orch.analyze(Bytes::from_static(b"img")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::TransferFailed(_)));
        assert_eq!(provider.poll_count(), 0);
    }
}
