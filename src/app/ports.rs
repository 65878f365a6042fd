use async_trait::async_trait;

use crate::error::Result;
use crate::types::FileInfo;

/// Storage-agnostic file access used by the pipeline.
///
/// The pipeline only needs `exists` and `read`; `stat` is there for
/// collaborators that want size or modification time.
#[async_trait]
pub trait FileReader: Send + Sync {
    async fn exists(&self, name: &str) -> bool;

    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    async fn stat(&self, name: &str) -> Result<FileInfo>;
}
