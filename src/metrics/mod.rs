//! Counters for the key cache and the two queues (feature `metrics`).
//!
//! Recording, snapshotting and exporting are separate traits; see
//! [`traits`] for the layering.

pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use exporter::PrometheusTextExporter;
pub use snapshot::{AgentMetricsSnapshot, KeyCacheMetricsSnapshot, QueueMetricsSnapshot};
pub use traits::{KeyCacheMetricsRecorder, MetricsExporter, MetricsSnapshotProvider, QueueMetricsRecorder};
