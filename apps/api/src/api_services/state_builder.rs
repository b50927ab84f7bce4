use std::sync::Arc;

use logscope_application::{
    LogQueryService, LogSearchBackend, OutputPluginService, OutputPluginStore, ScopeCatalog,
};
use logscope_core::AppError;
use logscope_infrastructure::{
    ElasticsearchLogBackend, HttpFluentBitOutputStore, InMemoryLogBackend,
    InMemoryOutputPluginStore, InMemoryScopeCatalog, KubernetesScopeCatalog,
};
use tracing::{info, warn};

use crate::api_config::{ApiConfig, CatalogBackendConfig, LogBackendConfig};
use crate::dev_seed::DevSeed;
use crate::state::AppState;

use super::clients::{build_http_client, build_kube_client};

pub async fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let http_client = build_http_client(config.upstream_timeout)?;
    let DevSeed { catalog, entries } = match &config.seed_file {
        Some(path) => DevSeed::load(path).await?,
        None => DevSeed::default(),
    };

    let backend: Arc<dyn LogSearchBackend> = match &config.log_backend {
        LogBackendConfig::Elasticsearch(elasticsearch) => {
            let backend = ElasticsearchLogBackend::new(
                http_client.clone(),
                elasticsearch.url.as_str(),
                &elasticsearch.index,
                elasticsearch.fields.clone(),
            );
            info!(
                url = %elasticsearch.url,
                index = %elasticsearch.index,
                "using elasticsearch log backend"
            );
            match &elasticsearch.username {
                Some(username) => Arc::new(
                    backend.with_basic_auth(username.clone(), elasticsearch.password.clone()),
                ),
                None => Arc::new(backend),
            }
        }
        LogBackendConfig::Memory => {
            let backend = InMemoryLogBackend::new(entries);
            if backend.is_empty() {
                warn!("using in-memory log backend without entries, set LOG_SEED_FILE to load some");
            } else {
                info!(entries = backend.len(), "using seeded in-memory log backend");
            }
            Arc::new(backend)
        }
    };

    let scope_catalog: Arc<dyn ScopeCatalog> = match &config.catalog_backend {
        CatalogBackendConfig::Kubernetes { workspace_label } => {
            info!(workspace_label = %workspace_label, "using kubernetes scope catalog");
            Arc::new(KubernetesScopeCatalog::new(
                build_kube_client().await?,
                workspace_label.as_str(),
            ))
        }
        CatalogBackendConfig::Memory => {
            warn!(
                namespaces = catalog.namespaces.len(),
                "using in-memory scope catalog"
            );
            Arc::new(InMemoryScopeCatalog::new(catalog))
        }
    };

    let store: Arc<dyn OutputPluginStore> = match &config.fluent_bit_config_url {
        Some(url) => {
            info!(url = %url, "forwarding output plugins to fluent bit config api");
            Arc::new(HttpFluentBitOutputStore::new(http_client, url.as_str()))
        }
        None => {
            warn!("FLUENTBIT_CONFIG_URL is unset, output plugins are kept in memory");
            Arc::new(InMemoryOutputPluginStore::new())
        }
    };

    Ok(AppState {
        log_query_service: LogQueryService::new(scope_catalog, backend)
            .with_max_histogram_buckets(config.histogram_max_buckets),
        output_plugin_service: OutputPluginService::new(store),
    })
}
