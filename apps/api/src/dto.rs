use serde::Serialize;
use ts_rs::TS;

mod logging;
mod outputs;

pub use logging::{
    HistogramBucketResponse, HistogramResponse, LogRecordResponse, LoggingResponse,
    QueryPageResponse, StatisticsResponse,
};
pub use outputs::{
    OutputParameterDto, OutputPluginRequest, OutputPluginResponse, OutputPluginsResponse,
};

/// Literal carried by every success response.
pub const STATUS_OK: &str = "ok";

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "health-response.ts")]
pub struct HealthResponse {
    pub status: &'static str,
}
