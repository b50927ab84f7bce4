use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use logscope_application::DEFAULT_MAX_HISTOGRAM_BUCKETS;
use logscope_core::AppError;
use logscope_infrastructure::ElasticsearchFieldMap;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_ELASTICSEARCH_INDEX: &str = "ks-logstash-log-*";
const DEFAULT_WORKSPACE_LABEL: &str = "kubesphere.io/workspace";

/// Where log documents are searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogBackendConfig {
    Elasticsearch(ElasticsearchConfig),
    Memory,
}

/// Connection settings of the Elasticsearch log index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticsearchConfig {
    pub url: Url,
    pub index: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub fields: ElasticsearchFieldMap,
}

/// Where namespace, workload and pod names are listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogBackendConfig {
    Kubernetes { workspace_label: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub log_backend: LogBackendConfig,
    pub catalog_backend: CatalogBackendConfig,
    pub fluent_bit_config_url: Option<Url>,
    pub upstream_timeout: Duration,
    pub request_timeout: Duration,
    pub histogram_max_buckets: usize,
    pub cors_allowed_origin: Option<String>,
    /// JSON fixture loaded into the in-memory log backend and catalog.
    pub seed_file: Option<PathBuf>,
}

impl ApiConfig {
    /// Reads configuration from the process environment.
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let optional = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_host = optional("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parse_or(&optional, "API_PORT", 9090_u16)?;

        let log_backend = match optional("LOG_BACKEND").as_deref().unwrap_or("elasticsearch") {
            "elasticsearch" => {
                let url = optional("ELASTICSEARCH_URL").ok_or_else(|| {
                    AppError::Validation(
                        "ELASTICSEARCH_URL is required when LOG_BACKEND is 'elasticsearch'"
                            .to_owned(),
                    )
                })?;
                LogBackendConfig::Elasticsearch(ElasticsearchConfig {
                    url: parse_url("ELASTICSEARCH_URL", &url)?,
                    index: optional("ELASTICSEARCH_INDEX")
                        .unwrap_or_else(|| DEFAULT_ELASTICSEARCH_INDEX.to_owned()),
                    username: optional("ELASTICSEARCH_USERNAME"),
                    password: optional("ELASTICSEARCH_PASSWORD"),
                    fields: field_map(&optional),
                })
            }
            "memory" => LogBackendConfig::Memory,
            other => {
                return Err(AppError::Validation(format!(
                    "LOG_BACKEND must be either 'elasticsearch' or 'memory', got '{other}'"
                )));
            }
        };

        let catalog_backend = match optional("CATALOG_BACKEND").as_deref().unwrap_or("kubernetes")
        {
            "kubernetes" => CatalogBackendConfig::Kubernetes {
                workspace_label: optional("WORKSPACE_LABEL")
                    .unwrap_or_else(|| DEFAULT_WORKSPACE_LABEL.to_owned()),
            },
            "memory" => CatalogBackendConfig::Memory,
            other => {
                return Err(AppError::Validation(format!(
                    "CATALOG_BACKEND must be either 'kubernetes' or 'memory', got '{other}'"
                )));
            }
        };

        let seed_file = optional("LOG_SEED_FILE").map(PathBuf::from);
        if seed_file.is_some()
            && log_backend != LogBackendConfig::Memory
            && catalog_backend != CatalogBackendConfig::Memory
        {
            return Err(AppError::Validation(
                "LOG_SEED_FILE requires LOG_BACKEND or CATALOG_BACKEND to be 'memory'".to_owned(),
            ));
        }

        let fluent_bit_config_url = optional("FLUENTBIT_CONFIG_URL")
            .map(|value| parse_url("FLUENTBIT_CONFIG_URL", &value))
            .transpose()?;

        let upstream_timeout = positive_seconds(&optional, "UPSTREAM_TIMEOUT_SECONDS", 15)?;
        let request_timeout = positive_seconds(&optional, "REQUEST_TIMEOUT_SECONDS", 30)?;

        let histogram_max_buckets = parse_or(
            &optional,
            "HISTOGRAM_MAX_BUCKETS",
            DEFAULT_MAX_HISTOGRAM_BUCKETS,
        )?;
        if histogram_max_buckets == 0 {
            return Err(AppError::Validation(
                "HISTOGRAM_MAX_BUCKETS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            api_host,
            api_port,
            log_backend,
            catalog_backend,
            fluent_bit_config_url,
            upstream_timeout,
            request_timeout,
            histogram_max_buckets,
            cors_allowed_origin: optional("CORS_ALLOWED_ORIGIN"),
            seed_file,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn field_map(optional: &impl Fn(&str) -> Option<String>) -> ElasticsearchFieldMap {
    let defaults = ElasticsearchFieldMap::default();
    let field = |name: &str, default: String| optional(name).unwrap_or(default);

    ElasticsearchFieldMap {
        timestamp: field("LOG_FIELD_TIMESTAMP", defaults.timestamp),
        log: field("LOG_FIELD_LOG", defaults.log),
        namespace: field("LOG_FIELD_NAMESPACE", defaults.namespace),
        workload: field("LOG_FIELD_WORKLOAD", defaults.workload),
        pod: field("LOG_FIELD_POD", defaults.pod),
        container: field("LOG_FIELD_CONTAINER", defaults.container),
        container_id: field("LOG_FIELD_CONTAINER_ID", defaults.container_id),
        sort_key: field("LOG_FIELD_SORT_KEY", defaults.sort_key),
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url, AppError> {
    Url::parse(value).map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
}

fn parse_or<T>(
    optional: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(name).map_or(Ok(default), |value| {
        value
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}")))
    })
}

fn positive_seconds(
    optional: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<Duration, AppError> {
    let seconds = parse_or(optional, name, default)?;
    if seconds == 0 {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(Duration::from_secs(seconds))
}
