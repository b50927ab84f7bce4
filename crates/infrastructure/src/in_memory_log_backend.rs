use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use logscope_application::LogSearchBackend;
use logscope_core::AppResult;
use logscope_domain::{
    HistogramBucket, LogEntry, LogField, LogHistogram, LogOperation, LogPage, LogQuerySpec,
    LogStatistics, QueryExpr, QueryResult, SortDirection,
};

/// In-memory log search backend evaluating query expressions directly.
#[derive(Debug, Default)]
pub struct InMemoryLogBackend {
    entries: Vec<LogEntry>,
}

impl InMemoryLogBackend {
    /// Creates a backend holding `entries`.
    #[must_use]
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LogSearchBackend for InMemoryLogBackend {
    async fn search(
        &self,
        query: &LogQuerySpec,
        operation: &LogOperation,
    ) -> AppResult<QueryResult> {
        let mut matched: Vec<&LogEntry> = self
            .entries
            .iter()
            .filter(|entry| matches(query.filter(), entry))
            .collect();
        let total = matched.len() as u64;

        match operation {
            LogOperation::Query => {
                matched.sort_by(|left, right| compare(left, right, query.sort()));
                let pagination = query.pagination();
                let entries = matched
                    .into_iter()
                    .skip(pagination.offset())
                    .take(pagination.limit())
                    .cloned()
                    .collect();
                Ok(QueryResult::Query(LogPage { total, entries }))
            }
            LogOperation::Statistics => {
                let containers: BTreeSet<(&str, &str, &str)> = matched
                    .iter()
                    .map(|entry| {
                        (
                            entry.namespace.as_str(),
                            entry.pod.as_str(),
                            entry.container.as_str(),
                        )
                    })
                    .collect();
                Ok(QueryResult::Statistics(LogStatistics {
                    total,
                    containers: containers.len() as u64,
                }))
            }
            LogOperation::Histogram(interval) => {
                let mut counts: BTreeMap<DateTime<Utc>, u64> = BTreeMap::new();
                for entry in matched {
                    *counts.entry(interval.align(entry.timestamp)?).or_default() += 1;
                }
                Ok(QueryResult::Histogram(LogHistogram {
                    total,
                    buckets: counts
                        .into_iter()
                        .map(|(start, count)| HistogramBucket { start, count })
                        .collect(),
                }))
            }
        }
    }
}

fn compare(left: &LogEntry, right: &LogEntry, sort: SortDirection) -> Ordering {
    let by_time = match sort {
        SortDirection::Asc => left.timestamp.cmp(&right.timestamp),
        SortDirection::Desc => right.timestamp.cmp(&left.timestamp),
    };
    by_time.then_with(|| left.id.cmp(&right.id))
}

fn matches(expr: &QueryExpr, entry: &LogEntry) -> bool {
    match expr {
        QueryExpr::MatchAll => true,
        QueryExpr::MatchNone => false,
        QueryExpr::Terms { field, values } => {
            field_value(*field, entry).is_some_and(|value| values.contains(value))
        }
        QueryExpr::Contains { field, keyword } => field_value(*field, entry)
            .is_some_and(|value| value.to_lowercase().contains(&keyword.to_lowercase())),
        QueryExpr::Within(window) => window.contains(entry.timestamp),
        QueryExpr::And(parts) => parts.iter().all(|part| matches(part, entry)),
        QueryExpr::Or(parts) => parts.iter().any(|part| matches(part, entry)),
    }
}

fn field_value(field: LogField, entry: &LogEntry) -> Option<&str> {
    match field {
        LogField::Namespace => Some(entry.namespace.as_str()),
        LogField::Workload => entry.workload.as_deref(),
        LogField::Pod => Some(entry.pod.as_str()),
        LogField::Container => Some(entry.container.as_str()),
        LogField::Log => Some(entry.log.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::DateTime;
    use logscope_application::LogSearchBackend;
    use logscope_domain::{
        LogEntry, LogField, LogOperation, LogQuerySpec, Pagination, QueryExpr, QueryResult,
        SortDirection, TimeRange, TimeWindow,
    };

    use super::InMemoryLogBackend;

    fn entry(id: &str, millis: i64, pod: &str, log: &str) -> LogEntry {
        LogEntry {
            id: id.to_owned(),
            timestamp: DateTime::from_timestamp_millis(millis).unwrap_or_default(),
            namespace: "prod".to_owned(),
            workload: Some("api".to_owned()),
            pod: pod.to_owned(),
            container: "app".to_owned(),
            log: log.to_owned(),
        }
    }

    fn backend() -> InMemoryLogBackend {
        InMemoryLogBackend::new(vec![
            entry("c", 1_000, "api-0", "ERROR timeout"),
            entry("a", 1_000, "api-1", "ok"),
            entry("b", 1_000, "api-0", "panic: nil"),
            entry("d", 5_000, "api-1", "error again"),
        ])
    }

    fn spec(filter: QueryExpr) -> LogQuerySpec {
        let window = TimeWindow::resolve(
            &TimeRange::default(),
            DateTime::from_timestamp_millis(10_000).unwrap_or_default(),
        )
        .unwrap_or_else(|error| panic!("invalid window: {error}"));
        LogQuerySpec::new(filter, window)
    }

    fn ids(result: QueryResult) -> Vec<String> {
        match result {
            QueryResult::Query(page) => page.entries.into_iter().map(|entry| entry.id).collect(),
            _ => Vec::new(),
        }
    }

    #[tokio::test]
    async fn timestamp_ties_are_broken_by_id() {
        let backend = backend();
        let query = spec(QueryExpr::MatchAll).with_sort(SortDirection::Desc);

        let first = backend.search(&query, &LogOperation::Query).await;
        let second = backend.search(&query, &LogOperation::Query).await;

        let first = first.map(ids).unwrap_or_default();
        assert_eq!(first, ["d", "a", "b", "c"]);
        assert_eq!(second.map(ids).unwrap_or_default(), first);
    }

    #[tokio::test]
    async fn pages_do_not_overlap() {
        let backend = backend();
        let page = |offset| {
            spec(QueryExpr::MatchAll)
                .with_sort(SortDirection::Asc)
                .with_pagination(Pagination::new(offset, 2).unwrap_or_default())
        };

        let first = backend.search(&page(0), &LogOperation::Query).await;
        let second = backend.search(&page(2), &LogOperation::Query).await;

        assert_eq!(first.map(ids).unwrap_or_default(), ["a", "b"]);
        assert_eq!(second.map(ids).unwrap_or_default(), ["c", "d"]);
    }

    #[tokio::test]
    async fn contains_ignores_case_and_statistics_count_containers() {
        let backend = backend();
        let query = spec(QueryExpr::or(vec![
            QueryExpr::Contains {
                field: LogField::Log,
                keyword: "error".to_owned(),
            },
            QueryExpr::Contains {
                field: LogField::Log,
                keyword: "PANIC".to_owned(),
            },
        ]));

        let result = backend.search(&query, &LogOperation::Statistics).await;

        let Ok(QueryResult::Statistics(statistics)) = result else {
            panic!("unexpected statistics result");
        };
        assert_eq!(statistics.total, 3);
        assert_eq!(statistics.containers, 2);
    }

    #[tokio::test]
    async fn terms_on_missing_workload_do_not_match() {
        let mut bare = entry("x", 1_000, "debug", "hello");
        bare.workload = None;
        let backend = InMemoryLogBackend::new(vec![bare]);
        let query = spec(QueryExpr::Terms {
            field: LogField::Workload,
            values: BTreeSet::from(["api".to_owned()]),
        });

        let result = backend.search(&query, &LogOperation::Query).await;

        assert_eq!(result.map(|result| result.total()).ok(), Some(0));
    }

    #[tokio::test]
    async fn histogram_returns_sparse_aligned_buckets() {
        let backend = backend();
        let operation = LogOperation::from_params(Some("histogram"), Some("2s"))
            .unwrap_or(LogOperation::Query);

        let result = backend.search(&spec(QueryExpr::MatchAll), &operation).await;

        let Ok(QueryResult::Histogram(histogram)) = result else {
            panic!("unexpected histogram result");
        };
        let counts: Vec<(i64, u64)> = histogram
            .buckets
            .iter()
            .map(|bucket| (bucket.start.timestamp_millis(), bucket.count))
            .collect();
        assert_eq!(counts, vec![(0, 3), (4_000, 1)]);
    }
}
