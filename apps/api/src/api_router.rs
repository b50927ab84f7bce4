use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, put};
use logscope_core::AppError;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

mod cors;

/// Prefix of the `logging.kubesphere.io/v1alpha2` API group.
pub const LOGGING_API_PREFIX: &str = "/kapis/logging.kubesphere.io/v1alpha2";

pub fn build_router(
    app_state: AppState,
    request_timeout: Duration,
    cors_allowed_origin: Option<&str>,
) -> Result<Router, AppError> {
    let logging_routes = Router::new()
        .route("/cluster", get(handlers::logging::cluster_logs_handler))
        .route(
            "/workspaces/{workspace}",
            get(handlers::logging::workspace_logs_handler),
        )
        .route(
            "/namespaces/{namespace}",
            get(handlers::logging::namespace_logs_handler),
        )
        .route(
            "/namespaces/{namespace}/workloads/{workload}",
            get(handlers::logging::workload_logs_handler),
        )
        .route(
            "/namespaces/{namespace}/pods/{pod}",
            get(handlers::logging::pod_logs_handler),
        )
        .route(
            "/namespaces/{namespace}/pods/{pod}/containers/{container}",
            get(handlers::logging::container_logs_handler),
        )
        .route(
            "/fluentbit/outputs",
            get(handlers::outputs::list_outputs_handler)
                .post(handlers::outputs::create_output_handler),
        )
        .route(
            "/fluentbit/outputs/{output}",
            put(handlers::outputs::update_output_handler)
                .delete(handlers::outputs::delete_output_handler),
        );

    let mut router = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .nest(LOGGING_API_PREFIX, logging_routes)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = cors_allowed_origin {
        router = router.layer(cors::build_cors_layer(origin)?);
    }

    Ok(router.with_state(app_state))
}
