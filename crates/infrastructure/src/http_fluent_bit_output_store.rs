use async_trait::async_trait;
use logscope_application::OutputPluginStore;
use logscope_core::{AppError, AppResult};
use logscope_domain::{OutputPluginConfig, OutputPluginId, OutputPluginParameter};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Output plugin store backed by the shipping agent's configuration API.
///
/// Writes are sent exactly once; failures are reported as non-retryable.
#[derive(Clone)]
pub struct HttpFluentBitOutputStore {
    http_client: reqwest::Client,
    outputs_url: String,
}

impl HttpFluentBitOutputStore {
    /// Creates a store talking to `{base_url}/outputs`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: &str) -> Self {
        Self {
            http_client,
            outputs_url: format!("{}/outputs", base_url.trim_end_matches('/')),
        }
    }

    fn output_url(&self, id: &OutputPluginId) -> String {
        format!("{}/{}", self.outputs_url, id)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
        retryable: bool,
    ) -> AppResult<Vec<OutputPluginConfig>> {
        let failure = |message: String| AppError::Backend { message, retryable };

        let response = request
            .send()
            .await
            .map_err(|error| failure(format!("{context}: request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            return Err(match status {
                StatusCode::NOT_FOUND => AppError::NotFound(format!("{context}: {body}")),
                StatusCode::CONFLICT => AppError::Conflict(format!("{context}: {body}")),
                _ => failure(format!("{context}: agent answered with status {status}: {body}")),
            });
        }

        let envelope = response
            .json::<OutputsEnvelope>()
            .await
            .map_err(|error| failure(format!("{context}: malformed agent response: {error}")))?;

        envelope
            .outputs
            .into_iter()
            .map(OutputPluginConfig::try_from)
            .collect::<AppResult<Vec<_>>>()
            .map_err(|error| failure(format!("{context}: agent returned invalid output: {error}")))
    }
}

#[async_trait]
impl OutputPluginStore for HttpFluentBitOutputStore {
    async fn list(&self) -> AppResult<Vec<OutputPluginConfig>> {
        self.send(
            self.http_client.get(&self.outputs_url),
            "list outputs",
            true,
        )
        .await
    }

    async fn insert(&self, config: OutputPluginConfig) -> AppResult<Vec<OutputPluginConfig>> {
        debug!(output_id = %config.id(), "forwarding output insert");
        self.send(
            self.http_client
                .post(&self.outputs_url)
                .json(&OutputDocument::from(&config)),
            &format!("insert output '{}'", config.id()),
            false,
        )
        .await
    }

    async fn update(&self, config: OutputPluginConfig) -> AppResult<Vec<OutputPluginConfig>> {
        debug!(output_id = %config.id(), "forwarding output update");
        self.send(
            self.http_client
                .put(self.output_url(config.id()))
                .json(&OutputDocument::from(&config)),
            &format!("update output '{}'", config.id()),
            false,
        )
        .await
    }

    async fn delete(&self, id: &OutputPluginId) -> AppResult<Vec<OutputPluginConfig>> {
        debug!(output_id = %id, "forwarding output delete");
        self.send(
            self.http_client.delete(self.output_url(id)),
            &format!("delete output '{id}'"),
            false,
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct OutputsEnvelope {
    #[serde(default)]
    outputs: Vec<OutputDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OutputDocument {
    id: String,
    #[serde(rename = "type")]
    plugin_type: String,
    #[serde(default)]
    parameters: Vec<ParameterDocument>,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ParameterDocument {
    name: String,
    #[serde(default)]
    value: String,
}

fn enabled_by_default() -> bool {
    true
}

impl From<&OutputPluginConfig> for OutputDocument {
    fn from(config: &OutputPluginConfig) -> Self {
        Self {
            id: config.id().as_str().to_owned(),
            plugin_type: config.plugin_type().to_owned(),
            parameters: config
                .parameters()
                .iter()
                .map(|parameter| ParameterDocument {
                    name: parameter.name().to_owned(),
                    value: parameter.value().to_owned(),
                })
                .collect(),
            enabled: config.enabled(),
        }
    }
}

impl TryFrom<OutputDocument> for OutputPluginConfig {
    type Error = AppError;

    fn try_from(document: OutputDocument) -> Result<Self, Self::Error> {
        let parameters = document
            .parameters
            .into_iter()
            .map(|parameter| OutputPluginParameter::new(parameter.name, parameter.value))
            .collect::<AppResult<Vec<_>>>()?;

        OutputPluginConfig::new(
            OutputPluginId::new(document.id)?,
            document.plugin_type,
            parameters,
            document.enabled,
        )
    }
}
