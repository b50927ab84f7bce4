use std::path::Path;

use logscope_core::{AppError, AppResult};
use logscope_domain::{CatalogSnapshot, LogEntry};
use serde::Deserialize;
use tracing::info;

/// Fixture data served by the in-memory log backend and scope catalog.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DevSeed {
    pub catalog: CatalogSnapshot,
    pub entries: Vec<LogEntry>,
}

impl DevSeed {
    /// Reads a JSON seed file.
    pub async fn load(path: &Path) -> AppResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|error| {
            AppError::Validation(format!(
                "failed to read LOG_SEED_FILE '{}': {error}",
                path.display()
            ))
        })?;
        let seed = Self::parse(&raw).map_err(|error| {
            AppError::Validation(format!(
                "invalid LOG_SEED_FILE '{}': {error}",
                path.display()
            ))
        })?;

        info!(
            path = %path.display(),
            entries = seed.entries.len(),
            namespaces = seed.catalog.namespaces.len(),
            pods = seed.catalog.pods.len(),
            "loaded dev seed"
        );
        Ok(seed)
    }

    fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use logscope_core::AppError;

    use super::DevSeed;

    const BUNDLED_SEED: &str = include_str!("../dev-seed.json");

    #[test]
    fn bundled_seed_covers_catalog_and_entries() {
        let seed = DevSeed::parse(BUNDLED_SEED)
            .unwrap_or_else(|error| panic!("bundled seed should parse: {error}"));

        assert!(!seed.entries.is_empty());
        assert!(!seed.catalog.pods.is_empty());
        assert!(seed.entries.iter().all(|entry| {
            seed.catalog
                .pods
                .iter()
                .any(|pod| pod.name == entry.pod && pod.namespace == entry.namespace)
        }));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let seed = DevSeed::parse(r#"{ "entries": [] }"#)
            .unwrap_or_else(|error| panic!("partial seed should parse: {error}"));

        assert!(seed.catalog.namespaces.is_empty());
        assert!(seed.entries.is_empty());
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(DevSeed::parse(r#"{ "logs": [] }"#).is_err());
        assert!(DevSeed::parse(r#"{ "entries": [{ "id": "a" }] }"#).is_err());
    }

    #[tokio::test]
    async fn unreadable_file_is_a_validation_error() {
        let result = DevSeed::load(Path::new("/nonexistent/logscope-seed.json")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
