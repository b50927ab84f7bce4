//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod elasticsearch_log_backend;
mod http_fluent_bit_output_store;
mod in_memory_log_backend;
mod in_memory_output_plugin_store;
mod in_memory_scope_catalog;
mod kubernetes_scope_catalog;

pub use elasticsearch_log_backend::{ElasticsearchFieldMap, ElasticsearchLogBackend};
pub use http_fluent_bit_output_store::HttpFluentBitOutputStore;
pub use in_memory_log_backend::InMemoryLogBackend;
pub use in_memory_output_plugin_store::InMemoryOutputPluginStore;
pub use in_memory_scope_catalog::InMemoryScopeCatalog;
pub use kubernetes_scope_catalog::KubernetesScopeCatalog;
