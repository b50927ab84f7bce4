use chrono::{DateTime, Utc};
use logscope_domain::{
    HistogramBucket, LogEntry, LogHistogram, LogPage, LogStatistics, QueryResult,
};
use serde::Serialize;
use ts_rs::TS;

use super::STATUS_OK;

/// Envelope of every log query response; exactly one payload is present.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "logging-response.ts")]
pub struct LoggingResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryPageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<StatisticsResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<HistogramResponse>,
}

impl From<QueryResult> for LoggingResponse {
    fn from(value: QueryResult) -> Self {
        let mut response = Self {
            status: STATUS_OK,
            query: None,
            statistics: None,
            histogram: None,
        };
        match value {
            QueryResult::Query(page) => response.query = Some(page.into()),
            QueryResult::Statistics(statistics) => response.statistics = Some(statistics.into()),
            QueryResult::Histogram(histogram) => response.histogram = Some(histogram.into()),
        }
        response
    }
}

/// One page of log records.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "query-page-response.ts")]
pub struct QueryPageResponse {
    pub total: u64,
    pub records: Vec<LogRecordResponse>,
}

impl From<LogPage> for QueryPageResponse {
    fn from(value: LogPage) -> Self {
        Self {
            total: value.total,
            records: value
                .entries
                .into_iter()
                .map(LogRecordResponse::from)
                .collect(),
        }
    }
}

/// API representation of one log line.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "log-record-response.ts")]
pub struct LogRecordResponse {
    pub id: String,
    /// Epoch milliseconds.
    pub time: i64,
    pub namespace: String,
    pub workload: Option<String>,
    pub pod: String,
    pub container: String,
    pub log: String,
}

impl From<LogEntry> for LogRecordResponse {
    fn from(value: LogEntry) -> Self {
        Self {
            id: value.id,
            time: epoch_millis(value.timestamp),
            namespace: value.namespace,
            workload: value.workload,
            pod: value.pod,
            container: value.container,
            log: value.log,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "statistics-response.ts")]
pub struct StatisticsResponse {
    pub total: u64,
    pub containers: u64,
}

impl From<LogStatistics> for StatisticsResponse {
    fn from(value: LogStatistics) -> Self {
        Self {
            total: value.total,
            containers: value.containers,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "histogram-response.ts")]
pub struct HistogramResponse {
    pub total: u64,
    pub buckets: Vec<HistogramBucketResponse>,
}

impl From<LogHistogram> for HistogramResponse {
    fn from(value: LogHistogram) -> Self {
        Self {
            total: value.total,
            buckets: value
                .buckets
                .into_iter()
                .map(HistogramBucketResponse::from)
                .collect(),
        }
    }
}

/// One histogram bucket keyed by its start in epoch milliseconds.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "histogram-bucket-response.ts")]
pub struct HistogramBucketResponse {
    pub time: i64,
    pub count: u64,
}

impl From<HistogramBucket> for HistogramBucketResponse {
    fn from(value: HistogramBucket) -> Self {
        Self {
            time: epoch_millis(value.start),
            count: value.count,
        }
    }
}

fn epoch_millis(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}
