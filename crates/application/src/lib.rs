//! Application services and ports.

#![forbid(unsafe_code)]

mod aggregation_engine;
mod log_ports;
mod log_query_service;
mod output_plugin_ports;
mod output_plugin_service;
mod query_compiler;
mod scope_resolver;

pub use aggregation_engine::{AggregationEngine, DEFAULT_MAX_HISTOGRAM_BUCKETS};
pub use log_ports::{LogQueryRequest, LogSearchBackend, ScopeCatalog};
pub use log_query_service::LogQueryService;
pub use output_plugin_ports::{OutputPluginInput, OutputPluginStore};
pub use output_plugin_service::OutputPluginService;
pub use query_compiler::QueryCompiler;
pub use scope_resolver::ScopeResolver;
