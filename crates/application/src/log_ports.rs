use async_trait::async_trait;

use logscope_core::AppResult;
use logscope_domain::{
    CatalogSnapshot, LogOperation, LogQuerySpec, Pagination, QueryResult, ScopeFilter,
    SortDirection, TimeRange,
};

/// Source of cluster object names used to resolve scope keywords.
#[async_trait]
pub trait ScopeCatalog: Send + Sync {
    /// Loads one consistent listing of namespaces, workloads and pods,
    /// optionally limited to a single namespace.
    async fn load_snapshot(&self, namespace: Option<&str>) -> AppResult<CatalogSnapshot>;
}

/// Search index holding container log documents.
#[async_trait]
pub trait LogSearchBackend: Send + Sync {
    /// Runs one search round trip for `operation`.
    ///
    /// Query results must be ordered by timestamp in the requested direction
    /// and then by entry id ascending. Histogram results may omit empty
    /// buckets.
    async fn search(
        &self,
        query: &LogQuerySpec,
        operation: &LogOperation,
    ) -> AppResult<QueryResult>;
}

/// Input payload for one log query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQueryRequest {
    /// Requested scope: route entry point plus level filters.
    pub scope: ScopeFilter,
    /// Log line keywords, any of which must be contained in a matching line.
    pub log_keywords: Vec<String>,
    /// Requested time range.
    pub time_range: TimeRange,
    /// Entry sort direction.
    pub sort: SortDirection,
    /// Entry pagination.
    pub pagination: Pagination,
    /// Operation to run.
    pub operation: LogOperation,
}

impl LogQueryRequest {
    /// Creates a request with default time range, sort and pagination.
    #[must_use]
    pub fn new(scope: ScopeFilter, operation: LogOperation) -> Self {
        Self {
            scope,
            log_keywords: Vec::new(),
            time_range: TimeRange::default(),
            sort: SortDirection::default(),
            pagination: Pagination::default(),
            operation,
        }
    }
}
