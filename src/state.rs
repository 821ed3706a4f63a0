use std::sync::Arc;

use crate::analysis::orchestrator::Orchestrator;
use crate::analysis::provider::{AnalysisProvider, MockProvider, SkinApiProvider};
use crate::config::{AppConfig, MailConfig, ProviderConfig};
use crate::reminders::notifier::{MailgunNotifier, NoopNotifier, Notifier};
use crate::storage::{DiskStorage, StorageClient};
use crate::store::{MemoryStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub storage: Arc<dyn StorageClient>,
    pub orchestrator: Arc<Orchestrator>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let storage = Arc::new(DiskStorage::new(config.upload_root.clone()).await?)
            as Arc<dyn StorageClient>;

        let provider: Arc<dyn AnalysisProvider> = match &config.provider {
            ProviderConfig::Mock => {
                tracing::info!("analysis provider: mock");
                Arc::new(MockProvider)
            }
            ProviderConfig::Http { api_key, base_url } => {
                tracing::info!(base_url = %base_url, "analysis provider: http");
                Arc::new(SkinApiProvider::new(base_url, api_key)?)
            }
        };

        let notifier: Arc<dyn Notifier> = match &config.mail {
            MailConfig::Off => Arc::new(NoopNotifier),
            MailConfig::Mailgun {
                api_key,
                domain,
                from,
            } => Arc::new(MailgunNotifier::new(api_key, domain, from)?),
        };

        Ok(Self {
            config,
            store: Arc::new(MemoryStore::new()),
            storage,
            orchestrator: Arc::new(Orchestrator::new(provider)),
            notifier,
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn Store>,
        storage: Arc<dyn StorageClient>,
        orchestrator: Arc<Orchestrator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            store,
            storage,
            orchestrator,
            notifier,
        }
    }

    /// State backed by in-memory everything and the mock provider.
    pub fn fake() -> Self {
        use async_trait::async_trait;
        use bytes::Bytes;
        use std::collections::HashMap;
        use tokio::sync::RwLock;

        #[derive(Default)]
        struct FakeStorage {
            objects: RwLock<HashMap<String, Bytes>>,
        }
        #[async_trait]
        impl StorageClient for FakeStorage {
            async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
                self.objects.write().await.insert(key.to_string(), body);
                Ok(())
            }
            async fn read_object(&self, key: &str) -> anyhow::Result<Bytes> {
                self.objects
                    .read()
                    .await
                    .get(key)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("no object {key}"))
            }
        }

        let config = Arc::new(AppConfig::for_tests("uploads".into()));
        Self {
            config,
            store: Arc::new(MemoryStore::new()),
            storage: Arc::new(FakeStorage::default()),
            orchestrator: Arc::new(Orchestrator::with_polling(
                Arc::new(MockProvider),
                std::time::Duration::ZERO,
                30,
            )),
            notifier: Arc::new(NoopNotifier),
        }
    }
}
