//! Pipeline phase metrics

use crate::error::ErrorCode;
use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};
use crate::types::Format;

pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn record_file_success(format: Format, duration_secs: f64) {
        ::metrics::counter!(
            phase_metric!(counter, "pipeline", "files_processed"),
            "format" => format.as_str()
        )
        .increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "pipeline", "file_duration_seconds"))
            .record(duration_secs);
    }

    pub fn record_file_failure(code: ErrorCode, duration_secs: f64) {
        ::metrics::counter!(
            phase_metric!(counter, "pipeline", "files_failed"),
            "error" => code.as_str()
        )
        .increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "pipeline", "file_duration_seconds"))
            .record(duration_secs);
    }

    pub fn record_batch(file_count: usize) {
        ::metrics::counter!(phase_metric!(counter, "pipeline", "batches")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "pipeline", "batch_size_files"))
            .record(file_count as f64);
    }
}

impl PhaseMetrics for PipelineMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "pipeline", "files_processed"));
        let _ = counter!(phase_metric!(counter, "pipeline", "files_failed"));
        let _ = counter!(phase_metric!(counter, "pipeline", "batches"));
        let _ = histogram!(phase_metric!(histogram, "pipeline", "file_duration_seconds"));
        let _ = histogram!(phase_metric!(histogram, "pipeline", "batch_size_files"));
    }

    fn phase_name() -> &'static str {
        "pipeline"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "pipeline", "files_processed"),
                metric_type: MetricType::Counter,
                help: "Files decoded into a record",
                labels: vec!["format"],
            },
            MetricDoc {
                name: phase_metric!(counter, "pipeline", "files_failed"),
                metric_type: MetricType::Counter,
                help: "Files that failed to resolve, read or decode",
                labels: vec!["error"],
            },
            MetricDoc {
                name: phase_metric!(counter, "pipeline", "batches"),
                metric_type: MetricType::Counter,
                help: "Batches started",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "pipeline", "file_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Time spent reading and decoding one file",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "pipeline", "batch_size_files"),
                metric_type: MetricType::Histogram,
                help: "Number of files submitted per batch",
                labels: vec![],
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documentation_uses_pipeline_prefix() {
        let docs = PipelineMetrics::metrics_documentation();
        assert_eq!(docs.len(), 5);
        assert!(docs.iter().all(|d| d.name.starts_with("confnorm_pipeline_")));
        assert_eq!(PipelineMetrics::phase_name(), "pipeline");
    }
}
