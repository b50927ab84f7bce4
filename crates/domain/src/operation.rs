use std::str::FromStr;

use logscope_core::{AppError, AppResult};

use crate::interval::HistogramInterval;

/// Operation requested by the `operation` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Return matching log entries.
    Query,
    /// Return match and container counts.
    Statistics,
    /// Return time-bucketed counts.
    Histogram,
}

impl FromStr for OperationKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "query" => Ok(Self::Query),
            "statistics" => Ok(Self::Statistics),
            "histogram" => Ok(Self::Histogram),
            other => Err(AppError::Validation(format!(
                "operation must be one of query, statistics, histogram; got '{other}'"
            ))),
        }
    }
}

/// Operation to run against a compiled query, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOperation {
    /// Paged, sorted log entries.
    Query,
    /// Total matches and distinct containers.
    Statistics,
    /// Counts per time bucket.
    Histogram(HistogramInterval),
}

impl LogOperation {
    /// Builds the operation from raw request parameters.
    ///
    /// `interval` is required for histograms and ignored otherwise.
    pub fn from_params(operation: Option<&str>, interval: Option<&str>) -> AppResult<Self> {
        let kind = operation
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::Validation("operation is required".to_owned()))?
            .parse::<OperationKind>()?;

        match kind {
            OperationKind::Query => Ok(Self::Query),
            OperationKind::Statistics => Ok(Self::Statistics),
            OperationKind::Histogram => {
                let interval = interval
                    .filter(|value| !value.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::Validation(
                            "interval is required when operation is histogram".to_owned(),
                        )
                    })?;
                Ok(Self::Histogram(interval.parse()?))
            }
        }
    }

    /// Returns the operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Statistics => "statistics",
            Self::Histogram(_) => "histogram",
        }
    }
}
