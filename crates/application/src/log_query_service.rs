use std::sync::Arc;

use chrono::{DateTime, Utc};
use logscope_core::AppResult;
use logscope_domain::QueryResult;
use tracing::info;

use crate::aggregation_engine::AggregationEngine;
use crate::log_ports::{LogQueryRequest, LogSearchBackend, ScopeCatalog};
use crate::query_compiler::QueryCompiler;
use crate::scope_resolver::ScopeResolver;

/// Log query use case: resolve scope, compile, execute.
#[derive(Clone)]
pub struct LogQueryService {
    resolver: ScopeResolver,
    compiler: QueryCompiler,
    engine: AggregationEngine,
}

impl LogQueryService {
    /// Creates a log query service.
    #[must_use]
    pub fn new(catalog: Arc<dyn ScopeCatalog>, backend: Arc<dyn LogSearchBackend>) -> Self {
        Self {
            resolver: ScopeResolver::new(catalog),
            compiler: QueryCompiler::new(),
            engine: AggregationEngine::new(backend),
        }
    }

    /// Overrides the histogram bucket cap.
    #[must_use]
    pub fn with_max_histogram_buckets(mut self, max_histogram_buckets: usize) -> Self {
        self.engine = self
            .engine
            .with_max_histogram_buckets(max_histogram_buckets);
        self
    }

    /// Runs a log query with the current time as the default end bound.
    pub async fn run(&self, request: LogQueryRequest) -> AppResult<QueryResult> {
        self.run_at(request, Utc::now()).await
    }

    /// Runs a log query with `now` as the default end bound.
    pub async fn run_at(
        &self,
        request: LogQueryRequest,
        now: DateTime<Utc>,
    ) -> AppResult<QueryResult> {
        let scope = self.resolver.resolve(&request.scope).await?;
        let query = self
            .compiler
            .compile(&scope, &request.log_keywords, &request.time_range, now)?
            .with_sort(request.sort)
            .with_pagination(request.pagination);

        let result = self.engine.execute(&query, &request.operation).await?;
        info!(
            operation = request.operation.as_str(),
            entry = ?request.scope.entry(),
            total = result.total(),
            always_false = query.is_always_false(),
            "log query served"
        );
        Ok(result)
    }
}
