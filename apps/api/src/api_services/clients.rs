use std::time::Duration;

use logscope_core::AppError;

pub(super) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))
}

pub(super) async fn build_kube_client() -> Result<kube::Client, AppError> {
    kube::Client::try_default().await.map_err(|error| {
        AppError::Internal(format!("failed to build kubernetes client: {error}"))
    })
}
