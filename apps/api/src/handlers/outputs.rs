use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::dto::{OutputPluginRequest, OutputPluginsResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_outputs_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<OutputPluginsResponse>> {
    let outputs = state.output_plugin_service.list().await?;

    Ok(Json(outputs.into()))
}

pub async fn create_output_handler(
    State(state): State<AppState>,
    Json(payload): Json<OutputPluginRequest>,
) -> ApiResult<(StatusCode, Json<OutputPluginsResponse>)> {
    let outputs = state.output_plugin_service.insert(payload.into()).await?;

    Ok((StatusCode::CREATED, Json(outputs.into())))
}

pub async fn update_output_handler(
    State(state): State<AppState>,
    Path(output): Path<String>,
    Json(payload): Json<OutputPluginRequest>,
) -> ApiResult<Json<OutputPluginsResponse>> {
    let outputs = state
        .output_plugin_service
        .update(output.as_str(), payload.into())
        .await?;

    Ok(Json(outputs.into()))
}

pub async fn delete_output_handler(
    State(state): State<AppState>,
    Path(output): Path<String>,
) -> ApiResult<Json<OutputPluginsResponse>> {
    let outputs = state.output_plugin_service.delete(output.as_str()).await?;

    Ok(Json(outputs.into()))
}
