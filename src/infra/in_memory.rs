use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::app::ports::FileReader;
use crate::error::{PipelineError, Result};
use crate::types::FileInfo;

/// File reader backed by a map of names to contents
#[derive(Debug, Default)]
pub struct InMemoryFileReader {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFileReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let files = files
            .into_iter()
            .map(|(name, content)| (name.into(), content.into()))
            .collect();
        Self {
            files: RwLock::new(files),
        }
    }

    pub async fn insert(&self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.write().await.insert(name.into(), content.into());
    }

    pub async fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.files.write().await.remove(name)
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl FileReader for InMemoryFileReader {
    async fn exists(&self, name: &str) -> bool {
        self.files.read().await.contains_key(name)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("file does not exist: {}", name)))
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        let files = self.files.read().await;
        let content = files
            .get(name)
            .ok_or_else(|| PipelineError::NotFound(format!("file does not exist: {}", name)))?;
        Ok(FileInfo {
            name: name.to_string(),
            size: content.len() as u64,
            modified: None,
            is_dir: false,
        })
    }
}
