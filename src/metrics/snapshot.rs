#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyCacheMetricsSnapshot {
    pub lookup_calls: u64,
    pub lookup_hits: u64,
    pub lookup_misses: u64,

    pub insert_new: u64,
    pub insert_updates: u64,

    pub evicted_applications: u64,
    pub evicted_keys: u64,
    pub removals: u64,
    pub clears: u64,

    // gauges captured at snapshot time
    pub applications: usize,
    pub keys: usize,
    pub application_capacity: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueMetricsSnapshot {
    pub enqueued: u64,
    pub rejected: u64,
    pub dequeued: u64,
    pub empty_polls: u64,

    pub len: usize,
    pub capacity: usize,
}

/// Everything the agent counts, taken under each lock in turn.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AgentMetricsSnapshot {
    pub cache: KeyCacheMetricsSnapshot,
    pub commands: QueueMetricsSnapshot,
    pub replies: QueueMetricsSnapshot,
}
