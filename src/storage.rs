use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Durable byte storage for uploaded photos, keyed by generated filename.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn read_object(&self, key: &str) -> anyhow::Result<Bytes>;
}

/// Files on local disk under a fixed upload root. Keys are generated by the
/// upload receiver and never contain path separators.
#[derive(Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub async fn new(root: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload root {}", root.display()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl StorageClient for DiskStorage {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(key);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn read_object(&self, key: &str) -> anyhow::Result<Bytes> {
        let path = self.path_for(key);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        Ok(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_read_returns_identical_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = DiskStorage::new(dir.path().to_path_buf())
            .await
            .expect("storage");

        let body = Bytes::from_static(b"\xff\xd8\xffnot-really-a-jpeg");
        storage.put_object("123.jpg", body.clone()).await.expect("put");
        let read = storage.read_object("123.jpg").await.expect("read");
        assert_eq!(read, body);
    }

    #[tokio::test]
    async fn read_missing_key_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = DiskStorage::new(dir.path().to_path_buf())
            .await
            .expect("storage");
        assert!(storage.read_object("absent.jpg").await.is_err());
    }
}
