use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use logscope_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Largest `offset + limit` window a caller may page through.
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// Sort direction of log entries by timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl SortDirection {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            // "acs" has been accepted by older clients of this API.
            "asc" | "acs" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(AppError::Validation(format!(
                "sort must be one of asc, desc; got '{other}'"
            ))),
        }
    }
}

/// Offset/limit pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    offset: usize,
    limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
        }
    }
}

impl Pagination {
    /// Creates a validated pagination window.
    pub fn new(offset: usize, limit: usize) -> AppResult<Self> {
        if offset.saturating_add(limit) > MAX_RESULT_WINDOW {
            return Err(AppError::Validation(format!(
                "from + size must not exceed {MAX_RESULT_WINDOW}"
            )));
        }

        Ok(Self { offset, limit })
    }

    /// Returns the number of entries skipped.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the maximum number of entries returned.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Requested time range; missing bounds default at compile time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    /// Inclusive lower bound.
    pub start: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Parses a bound given either as epoch milliseconds or RFC 3339.
    pub fn parse_bound(raw: &str) -> AppResult<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(millis) = raw.parse::<i64>() {
            return DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                AppError::Validation(format!("timestamp '{raw}' is out of range"))
            });
        }

        DateTime::parse_from_rfc3339(raw)
            .map(|value| value.with_timezone(&Utc))
            .map_err(|error| {
                AppError::Validation(format!(
                    "timestamp '{raw}' is neither epoch milliseconds nor RFC 3339: {error}"
                ))
            })
    }
}

/// Time window with defaults applied: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    start_explicit: bool,
}

impl TimeWindow {
    /// Applies defaults (start = epoch, end = `now`) and validates ordering.
    pub fn resolve(range: &TimeRange, now: DateTime<Utc>) -> AppResult<Self> {
        let start = range.start.unwrap_or(DateTime::UNIX_EPOCH);
        let end = range.end.unwrap_or(now);
        if end < start {
            return Err(AppError::Validation(
                "end_time must not be earlier than start_time".to_owned(),
            ));
        }

        Ok(Self {
            start,
            end,
            start_explicit: range.start.is_some(),
        })
    }

    /// Returns the inclusive start.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the exclusive end.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns whether the caller supplied the start bound.
    #[must_use]
    pub fn has_explicit_start(&self) -> bool {
        self.start_explicit
    }

    /// Returns whether `timestamp` falls in the window.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}

/// Logical document field a query can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogField {
    /// Namespace name.
    Namespace,
    /// Workload name.
    Workload,
    /// Pod name.
    Pod,
    /// Container name.
    Container,
    /// Raw log line.
    Log,
}

/// Backend-agnostic boolean query expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpr {
    /// Matches every document.
    MatchAll,
    /// Matches no document.
    MatchNone,
    /// Field equals one of the values.
    Terms {
        /// Constrained field.
        field: LogField,
        /// Accepted values.
        values: BTreeSet<String>,
    },
    /// Field contains the keyword, ignoring case.
    Contains {
        /// Searched field.
        field: LogField,
        /// Verbatim substring.
        keyword: String,
    },
    /// Document timestamp falls in the window.
    Within(TimeWindow),
    /// Every part matches.
    And(Vec<QueryExpr>),
    /// At least one part matches.
    Or(Vec<QueryExpr>),
}

impl QueryExpr {
    /// Builds a conjunction, folding trivial parts.
    #[must_use]
    pub fn and(parts: Vec<QueryExpr>) -> Self {
        let mut kept = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Self::MatchNone => return Self::MatchNone,
                Self::MatchAll => {}
                Self::And(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }

        match kept.len() {
            0 => Self::MatchAll,
            1 => kept.pop().unwrap_or(Self::MatchAll),
            _ => Self::And(kept),
        }
    }

    /// Builds a disjunction, folding trivial parts.
    #[must_use]
    pub fn or(parts: Vec<QueryExpr>) -> Self {
        let mut kept = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Self::MatchAll => return Self::MatchAll,
                Self::MatchNone => {}
                Self::Or(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }

        match kept.len() {
            0 => Self::MatchNone,
            1 => kept.pop().unwrap_or(Self::MatchNone),
            _ => Self::Or(kept),
        }
    }

    /// Returns whether the expression can never match.
    #[must_use]
    pub fn is_match_none(&self) -> bool {
        matches!(self, Self::MatchNone)
    }
}

/// Compiled, operation-independent query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuerySpec {
    filter: QueryExpr,
    window: TimeWindow,
    sort: SortDirection,
    pagination: Pagination,
}

impl LogQuerySpec {
    /// Creates a spec with default sort and pagination.
    #[must_use]
    pub fn new(filter: QueryExpr, window: TimeWindow) -> Self {
        Self {
            filter,
            window,
            sort: SortDirection::default(),
            pagination: Pagination::default(),
        }
    }

    /// Returns a copy with the given sort direction.
    #[must_use]
    pub fn with_sort(mut self, sort: SortDirection) -> Self {
        self.sort = sort;
        self
    }

    /// Returns a copy with the given pagination.
    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Returns the full filter, time window included.
    #[must_use]
    pub fn filter(&self) -> &QueryExpr {
        &self.filter
    }

    /// Returns the resolved time window.
    #[must_use]
    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Returns the entry sort direction.
    #[must_use]
    pub fn sort(&self) -> SortDirection {
        self.sort
    }

    /// Returns the pagination window.
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Returns whether the query is known to match nothing.
    #[must_use]
    pub fn is_always_false(&self) -> bool {
        self.filter.is_match_none()
    }
}
