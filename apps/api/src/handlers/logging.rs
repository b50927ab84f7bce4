use axum::Json;
use axum::extract::{Path, Query, State};
use logscope_application::LogQueryRequest;
use logscope_core::{AppError, AppResult, split_comma_list};
use logscope_domain::{
    LevelFilter, LogOperation, Pagination, ScopeFilter, ScopeLevel, SortDirection, TimeRange,
};
use serde::Deserialize;
use tracing::debug;

use crate::dto::LoggingResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Raw query string of the log routes, validated in `into_request`.
#[derive(Debug, Default, Deserialize)]
pub struct LogQueryParams {
    pub operation: Option<String>,
    pub workspaces: Option<String>,
    pub workspace_query: Option<String>,
    pub namespaces: Option<String>,
    pub namespace_query: Option<String>,
    pub workloads: Option<String>,
    pub workload_query: Option<String>,
    pub pods: Option<String>,
    pub pod_query: Option<String>,
    pub containers: Option<String>,
    pub container_query: Option<String>,
    pub log_query: Option<String>,
    pub interval: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub sort: Option<String>,
    pub from: Option<String>,
    pub size: Option<String>,
}

impl LogQueryParams {
    fn level_filter(&self, level: ScopeLevel) -> LevelFilter {
        let (ids, keywords) = match level {
            ScopeLevel::Workspace => (&self.workspaces, &self.workspace_query),
            ScopeLevel::Namespace => (&self.namespaces, &self.namespace_query),
            ScopeLevel::Workload => (&self.workloads, &self.workload_query),
            ScopeLevel::Pod => (&self.pods, &self.pod_query),
            ScopeLevel::Container => (&self.containers, &self.container_query),
        };

        LevelFilter::new(
            split_comma_list(ids.as_deref()),
            split_comma_list(keywords.as_deref()),
        )
    }

    /// Builds a request for a route whose path fixes `fixed`.
    ///
    /// Level filters at or above the route's entry level are ignored.
    fn into_request(self, fixed: Vec<(ScopeLevel, String)>) -> AppResult<LogQueryRequest> {
        let mut scope = ScopeFilter::at_entry(fixed)?;
        for level in ScopeLevel::below(scope.entry()) {
            scope = scope.narrow(level, self.level_filter(level))?;
        }

        let operation =
            LogOperation::from_params(self.operation.as_deref(), self.interval.as_deref())?;

        let mut request = LogQueryRequest::new(scope, operation);
        request.log_keywords = split_comma_list(self.log_query.as_deref());
        request.time_range = TimeRange {
            start: parse_optional(self.start_time.as_deref(), TimeRange::parse_bound)?,
            end: parse_optional(self.end_time.as_deref(), TimeRange::parse_bound)?,
        };
        if let Some(sort) = non_blank(self.sort.as_deref()) {
            request.sort = sort.parse::<SortDirection>()?;
        }

        let defaults = Pagination::default();
        let from = parse_optional(self.from.as_deref(), |raw| parse_count("from", raw))?;
        let size = parse_optional(self.size.as_deref(), |raw| parse_count("size", raw))?;
        request.pagination = Pagination::new(
            from.unwrap_or(defaults.offset()),
            size.unwrap_or(defaults.limit()),
        )?;

        Ok(request)
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_optional<T>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> AppResult<T>,
) -> AppResult<Option<T>> {
    non_blank(raw).map(parse).transpose()
}

fn parse_count(name: &str, raw: &str) -> AppResult<usize> {
    raw.parse::<usize>().map_err(|error| {
        AppError::Validation(format!("{name} must be a non-negative integer: {error}"))
    })
}

async fn run_query(
    state: &AppState,
    fixed: Vec<(ScopeLevel, String)>,
    params: LogQueryParams,
) -> ApiResult<Json<LoggingResponse>> {
    let request = params.into_request(fixed)?;
    debug!(
        entry = ?request.scope.entry(),
        operation = request.operation.as_str(),
        "log query received"
    );

    let result = state.log_query_service.run(request).await?;

    Ok(Json(result.into()))
}

pub async fn cluster_logs_handler(
    State(state): State<AppState>,
    Query(params): Query<LogQueryParams>,
) -> ApiResult<Json<LoggingResponse>> {
    run_query(&state, Vec::new(), params).await
}

pub async fn workspace_logs_handler(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    Query(params): Query<LogQueryParams>,
) -> ApiResult<Json<LoggingResponse>> {
    run_query(&state, vec![(ScopeLevel::Workspace, workspace)], params).await
}

pub async fn namespace_logs_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    Query(params): Query<LogQueryParams>,
) -> ApiResult<Json<LoggingResponse>> {
    run_query(&state, vec![(ScopeLevel::Namespace, namespace)], params).await
}

pub async fn workload_logs_handler(
    State(state): State<AppState>,
    Path((namespace, workload)): Path<(String, String)>,
    Query(params): Query<LogQueryParams>,
) -> ApiResult<Json<LoggingResponse>> {
    let fixed = vec![
        (ScopeLevel::Namespace, namespace),
        (ScopeLevel::Workload, workload),
    ];
    run_query(&state, fixed, params).await
}

pub async fn pod_logs_handler(
    State(state): State<AppState>,
    Path((namespace, pod)): Path<(String, String)>,
    Query(params): Query<LogQueryParams>,
) -> ApiResult<Json<LoggingResponse>> {
    let fixed = vec![(ScopeLevel::Namespace, namespace), (ScopeLevel::Pod, pod)];
    run_query(&state, fixed, params).await
}

pub async fn container_logs_handler(
    State(state): State<AppState>,
    Path((namespace, pod, container)): Path<(String, String, String)>,
    Query(params): Query<LogQueryParams>,
) -> ApiResult<Json<LoggingResponse>> {
    let fixed = vec![
        (ScopeLevel::Namespace, namespace),
        (ScopeLevel::Pod, pod),
        (ScopeLevel::Container, container),
    ];
    run_query(&state, fixed, params).await
}
