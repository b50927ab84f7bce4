use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use logscope_core::{AppError, AppResult};
use logscope_domain::{
    HistogramBucket, LogEntry, LogHistogram, LogOperation, LogPage, LogQuerySpec, LogStatistics,
    QueryExpr, QueryResult, TimeRange, TimeWindow,
};

use crate::log_ports::LogSearchBackend;

use super::AggregationEngine;

const MINUTE: i64 = 60_000;

struct FakeLogSearchBackend {
    response: AppResult<QueryResult>,
    calls: AtomicUsize,
}

impl FakeLogSearchBackend {
    fn returning(response: AppResult<QueryResult>) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LogSearchBackend for FakeLogSearchBackend {
    async fn search(
        &self,
        _query: &LogQuerySpec,
        _operation: &LogOperation,
    ) -> AppResult<QueryResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(result) => Ok(result.clone()),
            Err(AppError::Backend { message, retryable }) => Err(AppError::Backend {
                message: message.clone(),
                retryable: *retryable,
            }),
            Err(error) => Err(AppError::Internal(error.to_string())),
        }
    }
}

fn at(minutes: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(minutes * MINUTE).unwrap_or_default()
}

fn spec(filter: QueryExpr, start: Option<i64>, end: i64) -> LogQuerySpec {
    let range = TimeRange {
        start: start.map(at),
        end: Some(at(end)),
    };
    let window = TimeWindow::resolve(&range, at(end))
        .unwrap_or_else(|error| panic!("invalid test window: {error}"));
    LogQuerySpec::new(filter, window)
}

fn histogram(interval: &str) -> LogOperation {
    LogOperation::from_params(Some("histogram"), Some(interval))
        .unwrap_or_else(|error| panic!("invalid test interval: {error}"))
}

fn counts(result: &QueryResult) -> Vec<(i64, u64)> {
    match result {
        QueryResult::Histogram(histogram) => histogram
            .buckets
            .iter()
            .map(|bucket| (bucket.start.timestamp_millis() / MINUTE, bucket.count))
            .collect(),
        _ => Vec::new(),
    }
}

#[tokio::test]
async fn always_false_queries_skip_the_backend() {
    let backend = FakeLogSearchBackend::returning(Err(AppError::retryable_backend("unused")));
    let engine = AggregationEngine::new(backend.clone());
    let query = spec(QueryExpr::MatchNone, None, 60);

    let page = engine.execute(&query, &LogOperation::Query).await;
    let statistics = engine.execute(&query, &LogOperation::Statistics).await;
    let buckets = engine.execute(&query, &histogram("15m")).await;

    assert_eq!(page.ok(), Some(QueryResult::Query(LogPage::default())));
    assert_eq!(
        statistics.ok(),
        Some(QueryResult::Statistics(LogStatistics::default()))
    );
    assert_eq!(
        buckets.ok(),
        Some(QueryResult::Histogram(LogHistogram::default()))
    );
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn always_false_histogram_with_start_is_all_zero() {
    let backend = FakeLogSearchBackend::returning(Err(AppError::retryable_backend("unused")));
    let engine = AggregationEngine::new(backend.clone());
    let query = spec(QueryExpr::MatchNone, Some(0), 60);

    let result = engine
        .execute(&query, &histogram("30m"))
        .await
        .unwrap_or_else(|error| panic!("execute failed: {error}"));

    assert_eq!(counts(&result), vec![(0, 0), (30, 0)]);
    assert_eq!(result.total(), 0);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn always_false_histogram_without_start_has_no_buckets() {
    let backend = FakeLogSearchBackend::returning(Err(AppError::retryable_backend("unused")));
    let engine = AggregationEngine::new(backend.clone());
    let query = spec(QueryExpr::MatchNone, None, 600);

    let result = engine
        .execute(&query, &histogram("1m"))
        .await
        .unwrap_or_else(|error| panic!("execute failed: {error}"));

    let QueryResult::Histogram(filled) = result else {
        panic!("expected a histogram result");
    };
    assert!(filled.buckets.is_empty());
    assert_eq!(filled.total, 0);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sparse_buckets_are_zero_filled_over_window() {
    let backend = FakeLogSearchBackend::returning(Ok(QueryResult::Histogram(LogHistogram {
        total: 3,
        buckets: vec![HistogramBucket {
            start: at(30),
            count: 3,
        }],
    })));
    let engine = AggregationEngine::new(backend);
    let query = spec(QueryExpr::MatchAll, Some(0), 120);

    let result = engine
        .execute(&query, &histogram("30m"))
        .await
        .unwrap_or_else(|error| panic!("execute failed: {error}"));

    assert_eq!(counts(&result), vec![(0, 0), (30, 3), (60, 0), (90, 0)]);
    assert_eq!(result.total(), 3);
}

#[tokio::test]
async fn open_start_grid_begins_at_first_non_empty_bucket() {
    let backend = FakeLogSearchBackend::returning(Ok(QueryResult::Histogram(LogHistogram {
        total: 5,
        buckets: vec![
            HistogramBucket {
                start: at(60),
                count: 2,
            },
            HistogramBucket {
                start: at(120),
                count: 3,
            },
        ],
    })));
    let engine = AggregationEngine::new(backend);
    let query = spec(QueryExpr::MatchAll, None, 150);

    let result = engine
        .execute(&query, &histogram("30m"))
        .await
        .unwrap_or_else(|error| panic!("execute failed: {error}"));

    assert_eq!(counts(&result), vec![(60, 2), (90, 0), (120, 3)]);
}

#[tokio::test]
async fn oversized_grid_is_rejected_before_search() {
    let backend = FakeLogSearchBackend::returning(Ok(QueryResult::Histogram(
        LogHistogram::default(),
    )));
    let engine = AggregationEngine::new(backend.clone()).with_max_histogram_buckets(3);
    let query = spec(QueryExpr::MatchAll, Some(0), 120);

    let result = engine.execute(&query, &histogram("30m")).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn backend_failures_stay_retryable() {
    let backend =
        FakeLogSearchBackend::returning(Err(AppError::retryable_backend("index unavailable")));
    let engine = AggregationEngine::new(backend);
    let query = spec(QueryExpr::MatchAll, None, 60);

    let result = engine.execute(&query, &LogOperation::Statistics).await;

    assert!(result.as_ref().is_err_and(AppError::is_retryable));
}

#[tokio::test]
async fn mismatched_backend_result_is_internal_error() {
    let backend = FakeLogSearchBackend::returning(Ok(QueryResult::Statistics(LogStatistics {
        total: 1,
        containers: 1,
    })));
    let engine = AggregationEngine::new(backend);
    let query = spec(QueryExpr::MatchAll, None, 60);

    let result = engine.execute(&query, &LogOperation::Query).await;

    assert!(matches!(result, Err(AppError::Internal(_))));
}

#[tokio::test]
async fn query_pages_pass_through() {
    let entry = LogEntry {
        id: "doc-1".to_owned(),
        timestamp: at(5),
        namespace: "prod".to_owned(),
        workload: None,
        pod: "debug".to_owned(),
        container: "shell".to_owned(),
        log: "hello".to_owned(),
    };
    let page = LogPage {
        total: 7,
        entries: vec![entry],
    };
    let backend = FakeLogSearchBackend::returning(Ok(QueryResult::Query(page.clone())));
    let engine = AggregationEngine::new(backend);
    let query = spec(QueryExpr::MatchAll, None, 60);

    let result = engine.execute(&query, &LogOperation::Query).await;

    assert_eq!(result.ok(), Some(QueryResult::Query(page)));
}
