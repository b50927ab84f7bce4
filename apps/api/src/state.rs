use logscope_application::{LogQueryService, OutputPluginService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub log_query_service: LogQueryService,
    pub output_plugin_service: OutputPluginService,
}
