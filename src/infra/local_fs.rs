use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::app::ports::FileReader;
use crate::error::{PipelineError, Result};
use crate::types::FileInfo;

/// Reads configuration files from the local filesystem below a base directory.
///
/// Every name is validated before it touches the filesystem: empty names,
/// names containing `..`, and absolute paths outside the base are refused.
#[derive(Debug, Clone)]
pub struct LocalFileReader {
    base_path: PathBuf,
}

impl LocalFileReader {
    /// An empty `base` means the current working directory. Relative bases
    /// are made absolute against the current working directory.
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            base_path: absolutize(base.as_ref()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Point the reader at another directory, which must already exist.
    pub async fn set_base_path(&mut self, base: impl AsRef<Path>) -> Result<()> {
        let base = base.as_ref();
        if base.as_os_str().is_empty() {
            return Err(PipelineError::InvalidInput("base path cannot be empty".to_string()));
        }

        let metadata = tokio::fs::metadata(base)
            .await
            .map_err(|e| map_io(base, e))?;
        if !metadata.is_dir() {
            return Err(PipelineError::InvalidInput(format!(
                "base path is not a directory: {}",
                base.display()
            )));
        }

        self.base_path = absolutize(base);
        debug!("Base path set to {}", self.base_path.display());
        Ok(())
    }

    /// Base-relative names of the entries matching a glob pattern.
    ///
    /// Matches that cannot be expressed relative to the base are skipped.
    pub fn list_files(&self, pattern: &str) -> Result<Vec<String>> {
        if pattern.is_empty() {
            return Err(PipelineError::InvalidInput("pattern cannot be empty".to_string()));
        }
        let full = self.resolve(pattern)?;
        let full = full.to_string_lossy();

        let entries = glob::glob(&full).map_err(|e| {
            PipelineError::InvalidInput(format!("invalid glob pattern '{}': {}", pattern, e))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => match path.strip_prefix(&self.base_path) {
                    Ok(relative) => names.push(relative.to_string_lossy().into_owned()),
                    Err(_) => debug!("Skipping match outside base: {}", path.display()),
                },
                Err(e) => warn!("Unreadable glob match for '{}': {}", pattern, e),
            }
        }
        Ok(names)
    }

    pub async fn is_directory(&self, name: &str) -> bool {
        match self.resolve(name) {
            Ok(path) => tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(PipelineError::InvalidInput("filename cannot be empty".to_string()));
        }
        if name.contains("..") {
            return Err(PipelineError::InvalidInput(format!(
                "filename contains path traversal: {}",
                name
            )));
        }
        let path = Path::new(name);
        if path.is_absolute() && !path.starts_with(&self.base_path) {
            return Err(PipelineError::InvalidInput(format!(
                "filename outside base path: {}",
                name
            )));
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        self.validate(name)?;
        let path = Path::new(name);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.base_path.join(path))
        }
    }
}

impl Default for LocalFileReader {
    fn default() -> Self {
        Self::new("")
    }
}

#[async_trait]
impl FileReader for LocalFileReader {
    async fn exists(&self, name: &str) -> bool {
        match self.resolve(name) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        let content = tokio::fs::read(&path).await.map_err(|e| map_io(&path, e))?;
        debug!("Read {} bytes from {}", content.len(), path.display());
        Ok(content)
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        let path = self.resolve(name)?;
        let metadata = tokio::fs::metadata(&path).await.map_err(|e| map_io(&path, e))?;

        Ok(FileInfo {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.to_string()),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            is_dir: metadata.is_dir(),
        })
    }
}

fn absolutize(base: &Path) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if base.as_os_str().is_empty() {
        cwd
    } else if base.is_absolute() {
        base.to_path_buf()
    } else {
        cwd.join(base)
    }
}

fn map_io(path: &Path, err: io::Error) -> PipelineError {
    if err.kind() == io::ErrorKind::NotFound {
        PipelineError::NotFound(format!("file does not exist: {}", path.display()))
    } else {
        PipelineError::io(path, err)
    }
}
