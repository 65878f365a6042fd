use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::error::BatchError;
use crate::types::{Format, NormalizedRecord};

/// Everything a batch run produced.
///
/// Records that decoded are always returned, even when other files failed
/// or the run was cancelled.
#[derive(Debug)]
pub struct BatchReport {
    pub records: Vec<NormalizedRecord>,
    pub error: Option<BatchError>,
    pub duration: Duration,
    pub total_files: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn summary(&self) -> PipelineSummary {
        let mut by_format = BTreeMap::new();
        for record in &self.records {
            *by_format.entry(record.format).or_insert(0) += 1;
        }

        PipelineSummary {
            total_files: self.total_files,
            processed: self.records.len(),
            failed: self.error.as_ref().map_or(0, |e| e.failures.len()),
            by_format,
        }
    }

    /// Split into records and the batch error, if any
    pub fn into_result(self) -> std::result::Result<Vec<NormalizedRecord>, (Vec<NormalizedRecord>, BatchError)> {
        match self.error {
            None => Ok(self.records),
            Some(error) => Err((self.records, error)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub total_files: usize,
    pub processed: usize,
    pub failed: usize,
    pub by_format: BTreeMap<Format, usize>,
}
