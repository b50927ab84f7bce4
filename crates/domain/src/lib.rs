//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod catalog;
mod interval;
mod operation;
mod output_plugin;
mod query;
mod result;
mod scope;

pub use catalog::{CatalogNamespace, CatalogPod, CatalogSnapshot, CatalogWorkload};
pub use interval::{HistogramInterval, IntervalUnit};
pub use operation::{LogOperation, OperationKind};
pub use output_plugin::{
    OUTPUT_PLUGIN_ID_MAX_LENGTH, OutputPluginConfig, OutputPluginId, OutputPluginParameter,
};
pub use query::{
    LogField, LogQuerySpec, MAX_RESULT_WINDOW, Pagination, QueryExpr, SortDirection, TimeRange,
    TimeWindow,
};
pub use result::{
    HistogramBucket, LogEntry, LogHistogram, LogPage, LogStatistics, QueryResult,
};
pub use scope::{LevelFilter, ResolvedScope, ScopeFilter, ScopeLevel, ScopeRestriction};
