use crate::metrics::traits::{KeyCacheMetricsRecorder, QueueMetricsRecorder};

#[derive(Debug, Default)]
pub struct KeyCacheMetrics {
    pub lookup_calls: u64,
    pub lookup_hits: u64,
    pub lookup_misses: u64,
    pub insert_new: u64,
    pub insert_updates: u64,
    pub evicted_applications: u64,
    pub evicted_keys: u64,
    pub removals: u64,
    pub clears: u64,
}

impl KeyCacheMetricsRecorder for KeyCacheMetrics {
    fn record_lookup_hit(&mut self) {
        self.lookup_calls += 1;
        self.lookup_hits += 1;
    }

    fn record_lookup_miss(&mut self) {
        self.lookup_calls += 1;
        self.lookup_misses += 1;
    }

    fn record_insert_new(&mut self) {
        self.insert_new += 1;
    }

    fn record_insert_update(&mut self) {
        self.insert_updates += 1;
    }

    fn record_application_evicted(&mut self) {
        self.evicted_applications += 1;
    }

    fn record_key_evicted(&mut self) {
        self.evicted_keys += 1;
    }

    fn record_remove(&mut self) {
        self.removals += 1;
    }

    fn record_clear(&mut self) {
        self.clears += 1;
    }
}

#[derive(Debug, Default)]
pub struct QueueMetrics {
    pub enqueued: u64,
    pub rejected: u64,
    pub dequeued: u64,
    pub empty_polls: u64,
}

impl QueueMetricsRecorder for QueueMetrics {
    fn record_enqueue(&mut self) {
        self.enqueued += 1;
    }

    fn record_enqueue_rejected(&mut self) {
        self.rejected += 1;
    }

    fn record_dequeue(&mut self) {
        self.dequeued += 1;
    }

    fn record_dequeue_empty(&mut self) {
        self.empty_polls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_counters_split_hits_and_misses() {
        let mut m = KeyCacheMetrics::default();
        m.record_lookup_hit();
        m.record_lookup_miss();
        m.record_lookup_miss();
        assert_eq!(m.lookup_calls, 3);
        assert_eq!(m.lookup_hits, 1);
        assert_eq!(m.lookup_misses, 2);
    }

    #[test]
    fn queue_counters() {
        let mut m = QueueMetrics::default();
        m.record_enqueue();
        m.record_enqueue_rejected();
        m.record_dequeue();
        m.record_dequeue_empty();
        assert_eq!((m.enqueued, m.rejected, m.dequeued, m.empty_polls), (1, 1, 1, 1));
    }
}
