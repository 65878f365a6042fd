//! Concurrent ingestion and normalization of configuration files.
//!
//! Files in YAML, JSON, TOML, INI, Java properties, dotenv, HCL or XML are
//! decoded into one [`NormalizedRecord`] shape by a pool of tokio workers.

pub mod config;
pub mod decoders;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod types;

// Ports and their adapters
pub mod app;
pub mod infra;

pub use app::ports::FileReader;
pub use decoders::Decoder;
pub use error::{BatchError, ErrorCode, FileFailure, PipelineError, Result};
pub use pipeline::{BatchReport, FilePipeline, PipelineConfig, PipelineSummary};
pub use registry::DecoderRegistry;
pub use types::{DataMap, FileInfo, FileOutcome, Format, NormalizedRecord, RecordMetadata, Value};
