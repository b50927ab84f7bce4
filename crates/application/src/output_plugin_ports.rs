use async_trait::async_trait;

use logscope_core::AppResult;
use logscope_domain::{OutputPluginConfig, OutputPluginId};

/// Configuration store of the log shipping agent.
///
/// Every call returns the store's full list after the operation.
#[async_trait]
pub trait OutputPluginStore: Send + Sync {
    /// Lists configured outputs.
    async fn list(&self) -> AppResult<Vec<OutputPluginConfig>>;

    /// Adds an output; fails with `Conflict` when the id is taken.
    async fn insert(&self, config: OutputPluginConfig) -> AppResult<Vec<OutputPluginConfig>>;

    /// Replaces an existing output; fails with `NotFound` when absent.
    async fn update(&self, config: OutputPluginConfig) -> AppResult<Vec<OutputPluginConfig>>;

    /// Removes an output; fails with `NotFound` when absent.
    async fn delete(&self, id: &OutputPluginId) -> AppResult<Vec<OutputPluginConfig>>;
}

/// Input payload for creating or replacing an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPluginInput {
    /// Requested id; assigned on insert when absent.
    pub id: Option<String>,
    /// Plugin type.
    pub plugin_type: String,
    /// Ordered `(name, value)` parameters.
    pub parameters: Vec<(String, String)>,
    /// Whether the output is active.
    pub enabled: bool,
}
