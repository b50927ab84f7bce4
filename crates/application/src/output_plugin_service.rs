use std::sync::Arc;

use logscope_core::{AppError, AppResult};
use logscope_domain::{OutputPluginConfig, OutputPluginId, OutputPluginParameter};
use tracing::info;

use crate::output_plugin_ports::{OutputPluginInput, OutputPluginStore};

/// Output plugin management forwarded to the shipping agent's store.
///
/// Holds no local state; every call is one store round trip.
#[derive(Clone)]
pub struct OutputPluginService {
    store: Arc<dyn OutputPluginStore>,
}

impl OutputPluginService {
    /// Creates an output plugin service.
    #[must_use]
    pub fn new(store: Arc<dyn OutputPluginStore>) -> Self {
        Self { store }
    }

    /// Lists configured outputs.
    pub async fn list(&self) -> AppResult<Vec<OutputPluginConfig>> {
        self.store.list().await
    }

    /// Adds an output, assigning an id when none is given.
    pub async fn insert(&self, input: OutputPluginInput) -> AppResult<Vec<OutputPluginConfig>> {
        let id = match input.id.as_deref() {
            Some(id) if !id.trim().is_empty() => OutputPluginId::new(id)?,
            _ => OutputPluginId::generate(),
        };
        let config = build_config(id, input)?;

        let outputs = self.store.insert(config.clone()).await?;
        info!(output_id = %config.id(), plugin_type = config.plugin_type(), "output plugin created");
        Ok(outputs)
    }

    /// Replaces the output stored under `id`.
    pub async fn update(
        &self,
        id: &str,
        input: OutputPluginInput,
    ) -> AppResult<Vec<OutputPluginConfig>> {
        let id = OutputPluginId::new(id)?;
        if let Some(body_id) = input.id.as_deref()
            && !body_id.trim().is_empty()
            && body_id.trim() != id.as_str()
        {
            return Err(AppError::Validation(format!(
                "output id '{body_id}' in body does not match '{id}' in path"
            )));
        }
        let config = build_config(id, input)?;

        let outputs = self.store.update(config.clone()).await?;
        info!(output_id = %config.id(), "output plugin replaced");
        Ok(outputs)
    }

    /// Removes the output stored under `id`.
    pub async fn delete(&self, id: &str) -> AppResult<Vec<OutputPluginConfig>> {
        let id = OutputPluginId::new(id)?;

        let outputs = self.store.delete(&id).await?;
        info!(output_id = %id, "output plugin deleted");
        Ok(outputs)
    }
}

fn build_config(id: OutputPluginId, input: OutputPluginInput) -> AppResult<OutputPluginConfig> {
    let parameters = input
        .parameters
        .into_iter()
        .map(|(name, value)| OutputPluginParameter::new(name, value))
        .collect::<AppResult<Vec<_>>>()?;

    OutputPluginConfig::new(id, input.plugin_type, parameters, input.enabled)
}
