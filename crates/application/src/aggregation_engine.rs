use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use logscope_core::{AppError, AppResult};
use logscope_domain::{
    HistogramBucket, HistogramInterval, LogHistogram, LogOperation, LogPage, LogQuerySpec,
    LogStatistics, QueryResult,
};
use tracing::debug;

use crate::log_ports::LogSearchBackend;

/// Default cap on histogram buckets per request.
pub const DEFAULT_MAX_HISTOGRAM_BUCKETS: usize = 10_000;

/// Runs compiled queries against the search backend and normalizes results.
#[derive(Clone)]
pub struct AggregationEngine {
    backend: Arc<dyn LogSearchBackend>,
    max_histogram_buckets: usize,
}

impl AggregationEngine {
    /// Creates an engine with the default histogram bucket cap.
    #[must_use]
    pub fn new(backend: Arc<dyn LogSearchBackend>) -> Self {
        Self {
            backend,
            max_histogram_buckets: DEFAULT_MAX_HISTOGRAM_BUCKETS,
        }
    }

    /// Overrides the histogram bucket cap.
    #[must_use]
    pub fn with_max_histogram_buckets(mut self, max_histogram_buckets: usize) -> Self {
        self.max_histogram_buckets = max_histogram_buckets;
        self
    }

    /// Executes `operation` over `query` with at most one backend round trip.
    ///
    /// Queries that can never match are answered without contacting the
    /// backend. Their histograms are all-zero over the window when the
    /// window has an explicit start; without one there is no grid to fill,
    /// so the histogram has no buckets.
    pub async fn execute(
        &self,
        query: &LogQuerySpec,
        operation: &LogOperation,
    ) -> AppResult<QueryResult> {
        if query.is_always_false() {
            debug!(operation = operation.as_str(), "answering always-false query locally");
            return self.empty_result(query, operation);
        }

        if let LogOperation::Histogram(interval) = operation
            && query.window().has_explicit_start()
        {
            // Reject oversized grids before paying for the search.
            interval.bucket_starts(
                query.window().start(),
                query.window().end(),
                self.max_histogram_buckets,
            )?;
        }

        let result = self.backend.search(query, operation).await?;
        debug!(
            operation = operation.as_str(),
            total = result.total(),
            "log search completed"
        );

        match (operation, result) {
            (LogOperation::Query, QueryResult::Query(page)) => Ok(QueryResult::Query(page)),
            (LogOperation::Statistics, QueryResult::Statistics(statistics)) => {
                Ok(QueryResult::Statistics(statistics))
            }
            (LogOperation::Histogram(interval), QueryResult::Histogram(histogram)) => Ok(
                QueryResult::Histogram(self.zero_fill(query, interval, histogram)?),
            ),
            (operation, _) => Err(AppError::Internal(format!(
                "search backend returned a result that does not match operation '{}'",
                operation.as_str()
            ))),
        }
    }

    fn empty_result(
        &self,
        query: &LogQuerySpec,
        operation: &LogOperation,
    ) -> AppResult<QueryResult> {
        Ok(match operation {
            LogOperation::Query => QueryResult::Query(LogPage::default()),
            LogOperation::Statistics => QueryResult::Statistics(LogStatistics::default()),
            LogOperation::Histogram(interval) => {
                QueryResult::Histogram(self.zero_fill(query, interval, LogHistogram::default())?)
            }
        })
    }

    /// Lays sparse backend buckets onto the contiguous grid covering the
    /// query window.
    ///
    /// Without an explicit start the grid begins at the first non-empty
    /// bucket, so an open-ended window does not yield buckets back to the
    /// epoch.
    fn zero_fill(
        &self,
        query: &LogQuerySpec,
        interval: &HistogramInterval,
        sparse: LogHistogram,
    ) -> AppResult<LogHistogram> {
        let mut counts: BTreeMap<DateTime<Utc>, u64> = BTreeMap::new();
        for bucket in &sparse.buckets {
            if bucket.count > 0 {
                *counts.entry(interval.align(bucket.start)?).or_default() += bucket.count;
            }
        }

        let window = query.window();
        let grid_start = if window.has_explicit_start() {
            Some(window.start())
        } else {
            counts.keys().next().copied()
        };
        let Some(grid_start) = grid_start else {
            return Ok(LogHistogram {
                total: sparse.total,
                buckets: Vec::new(),
            });
        };

        let buckets = interval
            .bucket_starts(grid_start, window.end(), self.max_histogram_buckets)?
            .into_iter()
            .map(|start| HistogramBucket {
                start,
                count: counts.get(&start).copied().unwrap_or(0),
            })
            .collect();

        Ok(LogHistogram {
            total: sparse.total,
            buckets,
        })
    }
}

#[cfg(test)]
mod tests;
