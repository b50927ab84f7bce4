use chrono::{DateTime, Utc};

use logscope_core::AppResult;
use logscope_domain::{
    LogField, LogQuerySpec, QueryExpr, ResolvedScope, ScopeLevel, ScopeRestriction, TimeRange,
    TimeWindow,
};

/// Indexed document fields and the scope level each one carries.
const INDEXED_LEVELS: [(ScopeLevel, LogField); 4] = [
    (ScopeLevel::Namespace, LogField::Namespace),
    (ScopeLevel::Workload, LogField::Workload),
    (ScopeLevel::Pod, LogField::Pod),
    (ScopeLevel::Container, LogField::Container),
];

/// Compiles a resolved scope and content filters into a backend-agnostic
/// query.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCompiler;

impl QueryCompiler {
    /// Creates a compiler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds the query matching every log line inside `scope` that contains
    /// at least one of `log_keywords` and was emitted inside `time_range`.
    ///
    /// Missing time bounds default to the epoch and `now`.
    pub fn compile(
        &self,
        scope: &ResolvedScope,
        log_keywords: &[String],
        time_range: &TimeRange,
        now: DateTime<Utc>,
    ) -> AppResult<LogQuerySpec> {
        let window = TimeWindow::resolve(time_range, now)?;

        // Workspaces are folded into the namespace restriction during
        // resolution; only an empty workspace still matters here.
        let workspace = match scope.get(ScopeLevel::Workspace) {
            ScopeRestriction::Empty => QueryExpr::MatchNone,
            _ => QueryExpr::MatchAll,
        };

        let mut parts = vec![workspace, QueryExpr::Within(window)];
        parts.extend(
            INDEXED_LEVELS
                .iter()
                .map(|(level, field)| restriction_expr(*field, scope.get(*level))),
        );
        parts.push(content_expr(log_keywords));

        Ok(LogQuerySpec::new(QueryExpr::and(parts), window))
    }
}

fn restriction_expr(field: LogField, restriction: &ScopeRestriction) -> QueryExpr {
    match restriction {
        ScopeRestriction::Unrestricted => QueryExpr::MatchAll,
        ScopeRestriction::Empty => QueryExpr::MatchNone,
        ScopeRestriction::Set(values) => QueryExpr::Terms {
            field,
            values: values.clone(),
        },
    }
}

fn content_expr(log_keywords: &[String]) -> QueryExpr {
    let keywords: Vec<&String> = log_keywords
        .iter()
        .filter(|keyword| !keyword.trim().is_empty())
        .collect();
    if keywords.is_empty() {
        return QueryExpr::MatchAll;
    }

    QueryExpr::or(
        keywords
            .into_iter()
            .map(|keyword| QueryExpr::Contains {
                field: LogField::Log,
                keyword: keyword.clone(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{DateTime, Utc};
    use logscope_core::AppError;
    use logscope_domain::{
        LogField, QueryExpr, ResolvedScope, ScopeLevel, ScopeRestriction, TimeRange,
    };

    use super::QueryCompiler;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap_or_default()
    }

    fn set(items: &[&str]) -> ScopeRestriction {
        ScopeRestriction::Set(items.iter().map(|item| (*item).to_owned()).collect())
    }

    #[test]
    fn unrestricted_scope_only_constrains_time() {
        let spec = QueryCompiler::new().compile(
            &ResolvedScope::unrestricted(),
            &[],
            &TimeRange::default(),
            now(),
        );

        let Ok(spec) = spec else {
            panic!("compile failed");
        };
        assert!(matches!(spec.filter(), QueryExpr::Within(_)));
        assert_eq!(spec.window().end(), now());
    }

    #[test]
    fn restricted_levels_become_conjunctive_terms() {
        let scope = ResolvedScope::unrestricted()
            .with(ScopeLevel::Namespace, set(&["prod"]))
            .with(ScopeLevel::Workload, set(&["api", "web"]));

        let spec = QueryCompiler::new()
            .compile(&scope, &[], &TimeRange::default(), now())
            .unwrap_or_else(|error| panic!("compile failed: {error}"));

        let QueryExpr::And(parts) = spec.filter() else {
            panic!("expected conjunction, got {:?}", spec.filter());
        };
        assert_eq!(parts.len(), 3);
        assert!(parts.contains(&QueryExpr::Terms {
            field: LogField::Workload,
            values: BTreeSet::from(["api".to_owned(), "web".to_owned()]),
        }));
    }

    #[test]
    fn any_empty_level_makes_query_always_false() {
        let scope = ResolvedScope::unrestricted()
            .with(ScopeLevel::Namespace, set(&["prod"]))
            .with(ScopeLevel::Container, ScopeRestriction::Empty);

        let spec = QueryCompiler::new()
            .compile(&scope, &["error".to_owned()], &TimeRange::default(), now())
            .unwrap_or_else(|error| panic!("compile failed: {error}"));

        assert!(spec.is_always_false());
    }

    #[test]
    fn empty_workspace_makes_query_always_false() {
        let scope = ResolvedScope::unrestricted().with(ScopeLevel::Workspace, ScopeRestriction::Empty);

        let spec = QueryCompiler::new()
            .compile(&scope, &[], &TimeRange::default(), now())
            .unwrap_or_else(|error| panic!("compile failed: {error}"));

        assert!(spec.is_always_false());
    }

    #[test]
    fn log_keywords_are_disjunctive_substrings() {
        let spec = QueryCompiler::new()
            .compile(
                &ResolvedScope::unrestricted(),
                &["error".to_owned(), "panic".to_owned(), " ".to_owned()],
                &TimeRange::default(),
                now(),
            )
            .unwrap_or_else(|error| panic!("compile failed: {error}"));

        let QueryExpr::And(parts) = spec.filter() else {
            panic!("expected conjunction, got {:?}", spec.filter());
        };
        assert!(parts.iter().any(|part| matches!(
            part,
            QueryExpr::Or(keywords) if keywords.len() == 2
        )));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let range = TimeRange {
            start: DateTime::from_timestamp_millis(10_000),
            end: DateTime::from_timestamp_millis(5_000),
        };

        let result =
            QueryCompiler::new().compile(&ResolvedScope::unrestricted(), &[], &range, now());

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
