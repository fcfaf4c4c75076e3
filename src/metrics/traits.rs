//! # Metrics Trait Hierarchy
//!
//! Recording, snapshotting and export are split into small traits so the
//! cache and queue code only ever writes counters.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────┐        ┌─────────────────────────────┐
//!   │   KeyCacheMetricsRecorder   │        │    QueueMetricsRecorder     │
//!   │  lookup hit/miss, insert,   │        │  enqueue / rejected /       │
//!   │  evictions, remove, clear   │        │  dequeue / empty            │
//!   └──────────────┬──────────────┘        └──────────────┬──────────────┘
//!                  │                                      │
//!                  ▼                                      ▼
//!            KeyCacheMetrics                         QueueMetrics
//!
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (tests / host polling)       │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Counters written by [`KeyCache`](crate::cache::KeyCache).
pub trait KeyCacheMetricsRecorder {
    fn record_lookup_hit(&mut self);
    fn record_lookup_miss(&mut self);
    fn record_insert_new(&mut self);
    fn record_insert_update(&mut self);
    fn record_application_evicted(&mut self);
    fn record_key_evicted(&mut self);
    fn record_remove(&mut self);
    fn record_clear(&mut self);
}

/// Counters written around one bounded queue.
pub trait QueueMetricsRecorder {
    fn record_enqueue(&mut self);
    fn record_enqueue_rejected(&mut self);
    fn record_dequeue(&mut self);
    fn record_dequeue_empty(&mut self);
}

/// Produce a point-in-time copy of the counters.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Export/publish metrics to production monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
