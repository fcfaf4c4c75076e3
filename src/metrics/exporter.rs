use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::{AgentMetricsSnapshot, KeyCacheMetricsSnapshot, QueueMetricsSnapshot};
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for agent metrics snapshots.
///
/// Writes the Prometheus text exposition format so the host can serve it
/// directly or forward it to a collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_metric(&self, kind: &str, name: &str, value: u64) {
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, name: &str, value: u64) {
        self.write_metric("counter", name, value);
    }

    fn write_gauge(&self, name: &str, value: u64) {
        self.write_metric("gauge", name, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }

    fn export_queue(&self, queue: &str, snapshot: &QueueMetricsSnapshot) {
        let name = |suffix: &str| self.metric_name(&format!("{}_queue_{}", queue, suffix));
        self.write_counter(&name("enqueued_total"), snapshot.enqueued);
        self.write_counter(&name("rejected_total"), snapshot.rejected);
        self.write_counter(&name("dequeued_total"), snapshot.dequeued);
        self.write_counter(&name("empty_polls_total"), snapshot.empty_polls);
        self.write_gauge(&name("len"), snapshot.len as u64);
        self.write_gauge(&name("capacity"), snapshot.capacity as u64);
    }
}

impl<W: Write + Send> MetricsExporter<KeyCacheMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &KeyCacheMetricsSnapshot) {
        self.write_counter(&self.metric_name("lookup_calls_total"), snapshot.lookup_calls);
        self.write_counter(&self.metric_name("lookup_hits_total"), snapshot.lookup_hits);
        self.write_counter(
            &self.metric_name("lookup_misses_total"),
            snapshot.lookup_misses,
        );
        self.write_counter(&self.metric_name("insert_new_total"), snapshot.insert_new);
        self.write_counter(
            &self.metric_name("insert_updates_total"),
            snapshot.insert_updates,
        );
        self.write_counter(
            &self.metric_name("evicted_applications_total"),
            snapshot.evicted_applications,
        );
        self.write_counter(&self.metric_name("evicted_keys_total"), snapshot.evicted_keys);
        self.write_counter(&self.metric_name("removals_total"), snapshot.removals);
        self.write_counter(&self.metric_name("clears_total"), snapshot.clears);
        self.write_gauge(
            &self.metric_name("cached_applications"),
            snapshot.applications as u64,
        );
        self.write_gauge(&self.metric_name("cached_keys"), snapshot.keys as u64);
        self.write_gauge(
            &self.metric_name("application_capacity"),
            snapshot.application_capacity as u64,
        );
    }
}

impl<W: Write + Send> MetricsExporter<AgentMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &AgentMetricsSnapshot) {
        MetricsExporter::<KeyCacheMetricsSnapshot>::export(self, &snapshot.cache);
        self.export_queue("command", &snapshot.commands);
        self.export_queue("reply", &snapshot.replies);
    }
}
