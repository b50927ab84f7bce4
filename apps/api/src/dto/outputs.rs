use logscope_application::OutputPluginInput;
use logscope_domain::OutputPluginConfig;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::STATUS_OK;

/// One `name = value` plugin parameter.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "output-parameter-dto.ts")]
pub struct OutputParameterDto {
    pub name: String,
    pub value: String,
}

/// Incoming payload for output creation and replacement.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "output-plugin-request.ts")]
pub struct OutputPluginRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub plugin_type: String,
    #[serde(default)]
    pub parameters: Vec<OutputParameterDto>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl From<OutputPluginRequest> for OutputPluginInput {
    fn from(value: OutputPluginRequest) -> Self {
        Self {
            id: value.id,
            plugin_type: value.plugin_type,
            parameters: value
                .parameters
                .into_iter()
                .map(|parameter| (parameter.name, parameter.value))
                .collect(),
            enabled: value.enabled,
        }
    }
}

/// API representation of a configured output.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "output-plugin-response.ts")]
pub struct OutputPluginResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub plugin_type: String,
    pub parameters: Vec<OutputParameterDto>,
    pub enabled: bool,
}

impl From<OutputPluginConfig> for OutputPluginResponse {
    fn from(value: OutputPluginConfig) -> Self {
        Self {
            id: value.id().to_string(),
            plugin_type: value.plugin_type().to_owned(),
            parameters: value
                .parameters()
                .iter()
                .map(|parameter| OutputParameterDto {
                    name: parameter.name().to_owned(),
                    value: parameter.value().to_owned(),
                })
                .collect(),
            enabled: value.enabled(),
        }
    }
}

/// Output list returned by every output plugin route.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "output-plugins-response.ts")]
pub struct OutputPluginsResponse {
    pub status: &'static str,
    pub outputs: Vec<OutputPluginResponse>,
}

impl From<Vec<OutputPluginConfig>> for OutputPluginsResponse {
    fn from(value: Vec<OutputPluginConfig>) -> Self {
        Self {
            status: STATUS_OK,
            outputs: value.into_iter().map(OutputPluginResponse::from).collect(),
        }
    }
}
