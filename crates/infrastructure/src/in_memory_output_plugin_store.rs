use async_trait::async_trait;
use logscope_application::OutputPluginStore;
use logscope_core::{AppError, AppResult};
use logscope_domain::{OutputPluginConfig, OutputPluginId};
use tokio::sync::RwLock;

/// In-memory output plugin store keeping insertion order.
#[derive(Debug, Default)]
pub struct InMemoryOutputPluginStore {
    outputs: RwLock<Vec<OutputPluginConfig>>,
}

impl InMemoryOutputPluginStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OutputPluginStore for InMemoryOutputPluginStore {
    async fn list(&self) -> AppResult<Vec<OutputPluginConfig>> {
        Ok(self.outputs.read().await.clone())
    }

    async fn insert(&self, config: OutputPluginConfig) -> AppResult<Vec<OutputPluginConfig>> {
        let mut outputs = self.outputs.write().await;
        if outputs.iter().any(|output| output.id() == config.id()) {
            return Err(AppError::Conflict(format!(
                "output '{}' already exists",
                config.id()
            )));
        }

        outputs.push(config);
        Ok(outputs.clone())
    }

    async fn update(&self, config: OutputPluginConfig) -> AppResult<Vec<OutputPluginConfig>> {
        let mut outputs = self.outputs.write().await;
        let existing = outputs
            .iter_mut()
            .find(|output| output.id() == config.id())
            .ok_or_else(|| AppError::NotFound(format!("output '{}' does not exist", config.id())))?;

        *existing = config;
        Ok(outputs.clone())
    }

    async fn delete(&self, id: &OutputPluginId) -> AppResult<Vec<OutputPluginConfig>> {
        let mut outputs = self.outputs.write().await;
        let position = outputs
            .iter()
            .position(|output| output.id() == id)
            .ok_or_else(|| AppError::NotFound(format!("output '{id}' does not exist")))?;

        outputs.remove(position);
        Ok(outputs.clone())
    }
}

#[cfg(test)]
mod tests {
    use logscope_application::OutputPluginStore;
    use logscope_core::AppError;
    use logscope_domain::{OutputPluginConfig, OutputPluginId};

    use super::InMemoryOutputPluginStore;

    fn output(id: &str, plugin_type: &str) -> OutputPluginConfig {
        OutputPluginId::new(id)
            .and_then(|id| OutputPluginConfig::new(id, plugin_type, Vec::new(), true))
            .unwrap_or_else(|error| panic!("invalid test output: {error}"))
    }

    #[tokio::test]
    async fn duplicate_insert_leaves_store_unchanged() {
        let store = InMemoryOutputPluginStore::new();
        let _ = store.insert(output("es", "es")).await;

        let result = store.insert(output("es", "kafka")).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(
            store.list().await.unwrap_or_default(),
            vec![output("es", "es")]
        );
    }

    #[tokio::test]
    async fn update_keeps_position() {
        let store = InMemoryOutputPluginStore::new();
        let _ = store.insert(output("a", "es")).await;
        let _ = store.insert(output("b", "es")).await;

        let outputs = store.update(output("a", "kafka")).await.unwrap_or_default();

        assert_eq!(outputs, vec![output("a", "kafka"), output("b", "es")]);
    }

    #[tokio::test]
    async fn absent_ids_are_not_found() {
        let store = InMemoryOutputPluginStore::new();
        let id = OutputPluginId::generate();

        assert!(matches!(
            store.delete(&id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.update(output("ghost", "es")).await,
            Err(AppError::NotFound(_))
        ));
    }
}
