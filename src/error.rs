use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::types::Format;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("failed to decode {format}: {source}")]
    Decode {
        format: Format,
        #[source]
        source: anyhow::Error,
    },

    #[error("processing cancelled")]
    Cancelled,

    #[error("processing panicked: {0}")]
    Panicked(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Wrap a parser failure for the given format.
    pub fn decode(format: Format, source: impl Into<anyhow::Error>) -> Self {
        PipelineError::Decode {
            format,
            source: source.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::InvalidInput(_) => ErrorCode::InvalidInput,
            PipelineError::NotFound(_) => ErrorCode::NotFound,
            PipelineError::Conflict(_) => ErrorCode::Conflict,
            PipelineError::Decode { .. } => ErrorCode::Decode,
            PipelineError::Cancelled => ErrorCode::Cancelled,
            PipelineError::Panicked(_) => ErrorCode::Panicked,
            PipelineError::Io { .. } => ErrorCode::Io,
        }
    }
}

/// Stable failure classification used in reports and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    Conflict,
    Decode,
    Cancelled,
    Panicked,
    Io,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::Decode => "decode_error",
            ErrorCode::Cancelled => "cancelled",
            ErrorCode::Panicked => "panicked",
            ErrorCode::Io => "io_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// A single file that could not be turned into a record.
#[derive(Debug)]
pub struct FileFailure {
    pub filename: String,
    pub error: PipelineError,
}

impl FileFailure {
    pub fn new(filename: impl Into<String>, error: PipelineError) -> Self {
        Self {
            filename: filename.into(),
            error,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.error.code()
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.filename, self.code(), self.error)
    }
}

/// Combined error for a batch run.
///
/// Lists every failed file and every worker that stopped because the run was
/// cancelled. Records that did decode are returned next to this error, never
/// instead of it.
#[derive(Debug, Default)]
pub struct BatchError {
    pub failures: Vec<FileFailure>,
    pub cancelled_workers: usize,
    /// Worker tasks that died without reporting back
    pub failed_workers: usize,
}

impl BatchError {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty() && self.cancelled_workers == 0 && self.failed_workers == 0
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled_workers > 0
    }

    pub fn failed_filenames(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.filename.as_str()).collect()
    }

    pub fn failure_for(&self, filename: &str) -> Option<&FileFailure> {
        self.failures.iter().find(|f| f.filename == filename)
    }

    /// Every error code present in the batch, cancellation included.
    pub fn codes(&self) -> Vec<ErrorCode> {
        let mut codes: Vec<ErrorCode> = self.failures.iter().map(FileFailure::code).collect();
        if self.is_cancelled() {
            codes.push(ErrorCode::Cancelled);
        }
        codes
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "processing errors ({} files failed", self.failures.len())?;
        if self.is_cancelled() {
            write!(f, ", cancelled in {} workers", self.cancelled_workers)?;
        }
        if self.failed_workers > 0 {
            write!(f, ", {} workers lost", self.failed_workers)?;
        }
        write!(f, ")")?;
        for failure in &self.failures {
            write!(f, "\n  - {}", failure)?;
        }
        if self.is_cancelled() {
            write!(f, "\n  - {}", PipelineError::Cancelled)?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_variants() {
        assert_eq!(PipelineError::InvalidInput("x".into()).code(), ErrorCode::InvalidInput);
        assert_eq!(PipelineError::NotFound("x".into()).code(), ErrorCode::NotFound);
        assert_eq!(PipelineError::Conflict("x".into()).code(), ErrorCode::Conflict);
        assert_eq!(PipelineError::Cancelled.code(), ErrorCode::Cancelled);
        assert_eq!(
            PipelineError::decode(Format::Json, anyhow::anyhow!("bad")).code(),
            ErrorCode::Decode
        );
    }

    #[test]
    fn test_decode_error_keeps_source() {
        let err = PipelineError::decode(Format::Yaml, anyhow::anyhow!("unexpected token"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("unexpected token"));
        assert!(err.to_string().contains("yaml"));
    }

    #[test]
    fn test_batch_error_names_every_failure() {
        let batch = BatchError {
            failures: vec![
                FileFailure::new("a.bad", PipelineError::NotFound("no decoder for 'bad'".into())),
                FileFailure::new("b.json", PipelineError::decode(Format::Json, anyhow::anyhow!("eof"))),
            ],
            ..BatchError::default()
        };

        let rendered = batch.to_string();
        assert!(rendered.contains("a.bad [not_found]"));
        assert!(rendered.contains("b.json [decode_error]"));
        assert_eq!(batch.failed_filenames(), vec!["a.bad", "b.json"]);
        assert!(!batch.is_cancelled());
    }

    #[test]
    fn test_batch_error_reports_cancellation() {
        let batch = BatchError {
            failures: Vec::new(),
            cancelled_workers: 2,
            ..BatchError::default()
        };
        assert!(!batch.is_empty());
        assert!(batch.codes().contains(&ErrorCode::Cancelled));
        assert!(batch.to_string().contains("processing cancelled"));
    }

    #[test]
    fn test_lost_worker_makes_batch_non_empty() {
        let batch = BatchError {
            failed_workers: 1,
            ..BatchError::default()
        };
        assert!(!batch.is_empty());
        assert!(batch.to_string().contains("1 workers lost"));
        assert_eq!(PipelineError::Panicked("boom".into()).code(), ErrorCode::Panicked);
    }
}
