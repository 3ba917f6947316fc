//! Artifact storage: maps a storage key to bytes. Abstracted so the
//! visualization exporters never assume a local filesystem — the default
//! adapter writes under `WorkbenchConfig::data_dir`, but a deployment can
//! swap in S3-backed storage without touching `visualization::export`.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{BoxError, WorkbenchError};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, BoxError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, BoxError>;
}

/// Local-filesystem-backed store rooted at a configured directory.
pub struct FsObjectStore {
    root: std::path::PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> std::path::PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, BoxError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        Ok(path.to_string_lossy().to_string())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, BoxError> {
        let path = self.path_for(key);
        tokio::fs::read(&path)
            .await
            .map_err(|e| Box::new(WorkbenchError::PersistenceFailure(format!("{}: {}", path.display(), e))) as BoxError)
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_doubles {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryObjectStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl InMemoryObjectStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ObjectStore for InMemoryObjectStore {
        async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, BoxError> {
            self.objects.lock().await.insert(key.to_string(), bytes.to_vec());
            Ok(format!("mem://{}", key))
        }

        async fn get(&self, key: &str) -> Result<Vec<u8>, BoxError> {
            self.objects
                .lock()
                .await
                .get(key)
                .cloned()
                .ok_or_else(|| Box::new(WorkbenchError::PersistenceFailure(format!("no object at {}", key))) as BoxError)
        }
    }
}
