use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One container log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Backend document id, used as the pagination tie breaker.
    pub id: String,
    /// Time the line was emitted.
    pub timestamp: DateTime<Utc>,
    /// Namespace name.
    pub namespace: String,
    /// Owning workload, when the pod belongs to one.
    pub workload: Option<String>,
    /// Pod name.
    pub pod: String,
    /// Container name.
    pub container: String,
    /// Raw log line.
    pub log: String,
}

/// Page of matching entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPage {
    /// Matches before pagination.
    pub total: u64,
    /// Entries in requested order.
    pub entries: Vec<LogEntry>,
}

/// Aggregate counters over the matching lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogStatistics {
    /// Matching lines.
    pub total: u64,
    /// Distinct containers that emitted a matching line.
    pub containers: u64,
}

/// Count of matching lines in one time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramBucket {
    /// Inclusive bucket start.
    pub start: DateTime<Utc>,
    /// Matching lines in the bucket.
    pub count: u64,
}

/// Contiguous, zero-filled histogram ordered by bucket start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogHistogram {
    /// Matching lines across all buckets.
    pub total: u64,
    /// Buckets, ascending.
    pub buckets: Vec<HistogramBucket>,
}

/// Normalized result of one log operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    /// Result of `query`.
    Query(LogPage),
    /// Result of `statistics`.
    Statistics(LogStatistics),
    /// Result of `histogram`.
    Histogram(LogHistogram),
}

impl QueryResult {
    /// Returns the number of matching lines, regardless of shape.
    #[must_use]
    pub fn total(&self) -> u64 {
        match self {
            Self::Query(page) => page.total,
            Self::Statistics(statistics) => statistics.total,
            Self::Histogram(histogram) => histogram.total,
        }
    }
}
