use axum::Json;

use crate::dto::{HealthResponse, STATUS_OK};

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: STATUS_OK })
}
