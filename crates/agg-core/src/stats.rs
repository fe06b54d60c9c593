use std::collections::BTreeSet;
use std::time::Instant;

#[derive(Debug)]
pub struct Stats {
    pub received: u64,
    pub admitted: u64,
    pub duplicates: u64,
    pub store_failures: u64,
    pub topics: BTreeSet<String>,
    started: Instant,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            received: 0,
            admitted: 0,
            duplicates: 0,
            store_failures: 0,
            topics: BTreeSet::new(),
            started: Instant::now(),
        }
    }
}

impl Stats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received,
            admitted: self.admitted,
            duplicates: self.duplicates,
            store_failures: self.store_failures,
            topics: self.topics.iter().cloned().collect(),
            uptime_seconds: self.started.elapsed().as_secs_f64(),
        }
    }
}

/// All counters read under one lock acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub admitted: u64,
    pub duplicates: u64,
    pub store_failures: u64,
    /// Sorted.
    pub topics: Vec<String>,
    pub uptime_seconds: f64,
}

impl StatsSnapshot {
    /// Whether every received event has been resolved by the worker.
    pub fn is_settled(&self) -> bool {
        self.received == self.admitted + self.duplicates + self.store_failures
    }
}
