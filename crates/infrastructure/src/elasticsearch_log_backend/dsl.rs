use logscope_domain::{LogField, LogOperation, LogQuerySpec, QueryExpr};
use serde_json::{Value, json};

use super::ElasticsearchFieldMap;

/// Aggregation name carrying the distinct container count.
pub(super) const CONTAINERS_AGGREGATION: &str = "containers";
/// Aggregation name carrying histogram buckets.
pub(super) const BUCKETS_AGGREGATION: &str = "buckets";

/// Builds the `_search` request body for one operation.
pub(super) fn search_body(
    query: &LogQuerySpec,
    operation: &LogOperation,
    fields: &ElasticsearchFieldMap,
) -> Value {
    let filter = query_dsl(query.filter(), fields);

    match operation {
        LogOperation::Query => json!({
            "query": filter,
            "sort": [
                { fields.timestamp.as_str(): { "order": query.sort().as_str() } },
                { fields.sort_key.as_str(): { "order": "asc" } },
            ],
            "from": query.pagination().offset(),
            "size": query.pagination().limit(),
            "track_total_hits": true,
        }),
        LogOperation::Statistics => json!({
            "query": filter,
            "size": 0,
            "track_total_hits": true,
            "aggs": {
                CONTAINERS_AGGREGATION: {
                    "cardinality": { "field": fields.container_id.as_str() }
                }
            },
        }),
        LogOperation::Histogram(interval) => {
            let interval_key = if interval.is_calendar() {
                "calendar_interval"
            } else {
                "fixed_interval"
            };
            json!({
                "query": filter,
                "size": 0,
                "track_total_hits": true,
                "aggs": {
                    BUCKETS_AGGREGATION: {
                        "date_histogram": {
                            "field": fields.timestamp.as_str(),
                            interval_key: interval.backend_token(),
                            "min_doc_count": 1,
                            "time_zone": "UTC",
                        }
                    }
                },
            })
        }
    }
}

/// Translates an expression tree into query DSL.
pub(super) fn query_dsl(expr: &QueryExpr, fields: &ElasticsearchFieldMap) -> Value {
    match expr {
        QueryExpr::MatchAll => json!({ "match_all": {} }),
        QueryExpr::MatchNone => json!({ "match_none": {} }),
        QueryExpr::Terms { field, values } => json!({
            "terms": { field_name(*field, fields): values }
        }),
        QueryExpr::Contains { field, keyword } => json!({
            "wildcard": {
                field_name(*field, fields): {
                    "value": format!("*{}*", escape_wildcard(keyword)),
                    "case_insensitive": true,
                }
            }
        }),
        QueryExpr::Within(window) => json!({
            "range": {
                fields.timestamp.as_str(): {
                    "gte": window.start().timestamp_millis(),
                    "lt": window.end().timestamp_millis(),
                    "format": "epoch_millis",
                }
            }
        }),
        QueryExpr::And(parts) => json!({
            "bool": {
                "filter": parts.iter().map(|part| query_dsl(part, fields)).collect::<Vec<_>>()
            }
        }),
        QueryExpr::Or(parts) => json!({
            "bool": {
                "should": parts.iter().map(|part| query_dsl(part, fields)).collect::<Vec<_>>(),
                "minimum_should_match": 1,
            }
        }),
    }
}

fn field_name(field: LogField, fields: &ElasticsearchFieldMap) -> &str {
    match field {
        LogField::Namespace => fields.namespace.as_str(),
        LogField::Workload => fields.workload.as_str(),
        LogField::Pod => fields.pod.as_str(),
        LogField::Container => fields.container.as_str(),
        LogField::Log => fields.log.as_str(),
    }
}

fn escape_wildcard(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for character in keyword.chars() {
        if matches!(character, '*' | '?' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}
