use async_trait::async_trait;
use logscope_application::LogSearchBackend;
use logscope_core::{AppError, AppResult};
use logscope_domain::{LogOperation, LogQuerySpec, QueryResult};
use serde_json::Value;
use tracing::debug;

mod dsl;
mod response;

/// Document field names of the log index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticsearchFieldMap {
    /// Event time field.
    pub timestamp: String,
    /// Raw log line field.
    pub log: String,
    /// Namespace name field.
    pub namespace: String,
    /// Workload name field.
    pub workload: String,
    /// Pod name field.
    pub pod: String,
    /// Container name field.
    pub container: String,
    /// Field identifying one container instance, used for cardinality.
    pub container_id: String,
    /// Secondary sort key breaking timestamp ties.
    ///
    /// Must be sortable without fielddata: `_doc` or a doc-values field.
    /// Elasticsearch 8 rejects `_id` here.
    pub sort_key: String,
}

impl Default for ElasticsearchFieldMap {
    fn default() -> Self {
        Self {
            timestamp: "time".to_owned(),
            log: "log".to_owned(),
            namespace: "kubernetes.namespace_name.keyword".to_owned(),
            workload: "kubernetes.workload_name.keyword".to_owned(),
            pod: "kubernetes.pod_name.keyword".to_owned(),
            container: "kubernetes.container_name.keyword".to_owned(),
            container_id: "kubernetes.docker_id.keyword".to_owned(),
            sort_key: "_doc".to_owned(),
        }
    }
}

/// Log search backend speaking the Elasticsearch `_search` API.
#[derive(Clone)]
pub struct ElasticsearchLogBackend {
    http_client: reqwest::Client,
    search_url: String,
    credentials: Option<(String, Option<String>)>,
    fields: ElasticsearchFieldMap,
}

impl ElasticsearchLogBackend {
    /// Creates a backend searching `index` (a name or pattern) at `base_url`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        index: &str,
        fields: ElasticsearchFieldMap,
    ) -> Self {
        Self {
            http_client,
            search_url: format!("{}/{}/_search", base_url.trim_end_matches('/'), index),
            credentials: None,
            fields,
        }
    }

    /// Adds HTTP basic authentication.
    #[must_use]
    pub fn with_basic_auth(mut self, username: String, password: Option<String>) -> Self {
        self.credentials = Some((username, password));
        self
    }

    async fn post_search(&self, body: &Value) -> AppResult<Value> {
        let mut request = self.http_client.post(&self.search_url).json(body);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, password.as_ref());
        }

        let response = request.send().await.map_err(|error| {
            AppError::retryable_backend(format!("log index request failed: {error}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            return Err(AppError::retryable_backend(format!(
                "log index answered with status {status}: {}",
                truncate(&body, 512)
            )));
        }

        response.json::<Value>().await.map_err(|error| {
            AppError::retryable_backend(format!("log index returned malformed JSON: {error}"))
        })
    }
}

#[async_trait]
impl LogSearchBackend for ElasticsearchLogBackend {
    async fn search(
        &self,
        query: &LogQuerySpec,
        operation: &LogOperation,
    ) -> AppResult<QueryResult> {
        let body = dsl::search_body(query, operation, &self.fields);
        debug!(operation = operation.as_str(), url = %self.search_url, "searching log index");

        let raw = self.post_search(&body).await?;
        response::parse(raw, operation, &self.fields)
    }
}

fn truncate(value: &str, max_chars: usize) -> &str {
    value
        .char_indices()
        .nth(max_chars)
        .map_or(value, |(index, _)| &value[..index])
}

#[cfg(test)]
mod tests;
