//! Concurrent file normalization pipeline
//!
//! A batch of filenames is pushed into a closed queue that a fixed pool of
//! tokio workers drains. Each worker resolves a decoder by extension, reads
//! the file through the first reader that has it, and decodes it. Failures
//! are collected per file, panics included; they never stop the other
//! workers.

pub mod report;

pub use report::{BatchReport, PipelineSummary};

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::app::ports::FileReader;
use crate::decoders::Decoder;
use crate::error::{BatchError, ErrorCode, FileFailure, PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::registry::DecoderRegistry;
use crate::types::{FileOutcome, NormalizedRecord};

/// Worker count used when `max_workers` is zero
pub const DEFAULT_MAX_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub max_workers: usize,
    /// Upper bound on each file read
    pub timeout: Option<Duration>,
    pub retry_attempts: u32,
    pub buffer_size: usize,
}

impl PipelineConfig {
    pub fn worker_count(&self) -> usize {
        if self.max_workers == 0 {
            DEFAULT_MAX_WORKERS
        } else {
            self.max_workers
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            timeout: None,
            retry_attempts: 0,
            buffer_size: 64,
        }
    }
}

/// Normalizes batches of configuration files into records.
///
/// Cloning is cheap: decoders and readers are shared snapshots, and
/// registering on one clone never affects another.
#[derive(Clone)]
pub struct FilePipeline {
    registry: Arc<DecoderRegistry>,
    readers: Arc<Vec<Arc<dyn FileReader>>>,
    config: PipelineConfig,
}

struct WorkerReport {
    outcomes: Vec<FileOutcome>,
    cancelled: bool,
}

impl FilePipeline {
    /// Pipeline with no decoders and no readers
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_registry(DecoderRegistry::new(), config)
    }

    pub fn with_registry(registry: DecoderRegistry, config: PipelineConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            readers: Arc::new(Vec::new()),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    /// Readers are consulted in registration order.
    pub fn register_reader(&mut self, reader: Arc<dyn FileReader>) {
        Arc::make_mut(&mut self.readers).push(reader);
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Add a decoder; `Conflict` if it claims an extension already claimed.
    pub fn register_processor(&mut self, decoder: Arc<dyn Decoder>) -> Result<()> {
        if let Some(taken) = decoder
            .supported_extensions()
            .iter()
            .find(|ext| self.registry.has(ext))
        {
            return Err(PipelineError::Conflict(format!(
                "processor already registered for extension '{}'",
                taken
            )));
        }
        Arc::make_mut(&mut self.registry).register(decoder)
    }

    pub fn processors(&self) -> Vec<Arc<dyn Decoder>> {
        self.registry.list_decoders()
    }

    /// Resolve, read and decode a single file.
    #[instrument(skip(self, cancel))]
    pub async fn process_file(
        &self,
        cancel: &CancellationToken,
        filename: &str,
    ) -> Result<NormalizedRecord> {
        let decoder = self.registry.resolve(filename)?;
        let content = self.read_content(filename).await?;
        decoder.decode(cancel, filename, Some(&content))
    }

    /// Process a batch of files on the worker pool.
    ///
    /// Fails up front only when there is nothing to do: an empty batch or no
    /// registered decoders. Every other failure is reported per file inside
    /// the returned [`BatchReport`].
    #[instrument(skip_all, fields(files = filenames.len()))]
    pub async fn process_files<S: AsRef<str>>(
        &self,
        cancel: &CancellationToken,
        filenames: &[S],
    ) -> Result<BatchReport> {
        if filenames.is_empty() {
            return Err(PipelineError::InvalidInput("filenames cannot be empty".to_string()));
        }
        if self.registry.is_empty() {
            return Err(PipelineError::InvalidInput("no processors registered".to_string()));
        }

        let started = Instant::now();
        PipelineMetrics::record_batch(filenames.len());

        let (tx, rx) = mpsc::channel(filenames.len());
        for name in filenames {
            tx.try_send(name.as_ref().to_string()).map_err(|e| {
                PipelineError::InvalidInput(format!("failed to queue {}: {}", name.as_ref(), e))
            })?;
        }
        drop(tx);
        let queue = Arc::new(Mutex::new(rx));

        let worker_count = self.config.worker_count().min(filenames.len());
        info!(
            "🚀 Processing {} files with {} workers",
            filenames.len(),
            worker_count
        );

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let pipeline = self.clone();
            let queue = Arc::clone(&queue);
            let cancel = cancel.clone();
            workers.spawn(async move { pipeline.run_worker(worker_id, queue, cancel).await });
        }

        let mut reports = Vec::with_capacity(worker_count);
        let mut batch_error = BatchError::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("❌ Worker task failed: {}", e);
                    batch_error.failed_workers += 1;
                }
            }
        }

        let mut records = Vec::new();
        for report in reports {
            if report.cancelled {
                batch_error.cancelled_workers += 1;
            }
            for outcome in report.outcomes {
                match outcome {
                    FileOutcome::Success(record) => records.push(record),
                    FileOutcome::Failure(failure) => batch_error.failures.push(failure),
                }
            }
        }

        let duration = started.elapsed();
        if batch_error.is_empty() {
            info!("✅ Processed {} files in {:?}", records.len(), duration);
        } else {
            warn!(
                "⚠️ Batch finished in {:?}: {} processed, {} failed, {} workers cancelled",
                duration,
                records.len(),
                batch_error.failures.len(),
                batch_error.cancelled_workers
            );
        }

        Ok(BatchReport {
            records,
            error: (!batch_error.is_empty()).then_some(batch_error),
            duration,
            total_files: filenames.len(),
        })
    }

    async fn run_worker(
        self,
        worker_id: usize,
        queue: Arc<Mutex<mpsc::Receiver<String>>>,
        cancel: CancellationToken,
    ) -> WorkerReport {
        let mut outcomes = Vec::new();
        loop {
            if cancel.is_cancelled() {
                debug!("Worker {} stopping: cancelled", worker_id);
                return WorkerReport {
                    outcomes,
                    cancelled: true,
                };
            }

            let next = queue.lock().await.recv().await;
            let Some(filename) = next else {
                break;
            };
            outcomes.push(self.isolated_outcome(&cancel, filename).await);
        }

        debug!("Worker {} drained the queue after {} files", worker_id, outcomes.len());
        WorkerReport {
            outcomes,
            cancelled: false,
        }
    }

    /// Runs one file on its own task so a panicking decoder or reader only
    /// costs that file.
    async fn isolated_outcome(&self, cancel: &CancellationToken, filename: String) -> FileOutcome {
        let started = Instant::now();
        let pipeline = self.clone();
        let token = cancel.clone();
        let name = filename.clone();
        let task = tokio::spawn(async move { pipeline.process_outcome(&token, name).await });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = panic_message(e);
                let elapsed = started.elapsed().as_secs_f64();
                PipelineMetrics::record_file_failure(ErrorCode::Panicked, elapsed);
                error!("❌ Processing {} panicked: {}", filename, message);
                FileOutcome::Failure(FileFailure::new(filename, PipelineError::Panicked(message)))
            }
        }
    }

    async fn process_outcome(&self, cancel: &CancellationToken, filename: String) -> FileOutcome {
        let started = Instant::now();
        let result = self.process_file(cancel, &filename).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(record) => {
                PipelineMetrics::record_file_success(record.format, elapsed);
                debug!(
                    "Decoded {} as {} ({} keys)",
                    filename, record.format, record.metadata.key_count
                );
                FileOutcome::Success(record)
            }
            Err(e) => {
                PipelineMetrics::record_file_failure(e.code(), elapsed);
                warn!("Failed to process {}: {}", filename, e);
                FileOutcome::Failure(FileFailure::new(filename, e))
            }
        }
    }

    async fn read_content(&self, filename: &str) -> Result<Vec<u8>> {
        if self.readers.is_empty() {
            return Err(PipelineError::NotFound("no file readers registered".to_string()));
        }

        for reader in self.readers.iter() {
            if !reader.exists(filename).await {
                continue;
            }
            return match self.config.timeout {
                Some(limit) => tokio::time::timeout(limit, reader.read(filename))
                    .await
                    .map_err(|_| {
                        PipelineError::io(
                            filename,
                            io::Error::new(
                                io::ErrorKind::TimedOut,
                                format!("read timed out after {:?}", limit),
                            ),
                        )
                    })?,
                None => reader.read(filename).await,
            };
        }

        Err(PipelineError::NotFound(format!("file not found: {}", filename)))
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
