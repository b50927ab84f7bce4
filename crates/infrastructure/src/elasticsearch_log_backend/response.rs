use chrono::{DateTime, Utc};
use logscope_core::{AppError, AppResult};
use logscope_domain::{
    HistogramBucket, LogEntry, LogHistogram, LogOperation, LogPage, LogStatistics, QueryResult,
};
use serde::Deserialize;
use serde_json::Value;

use super::ElasticsearchFieldMap;
use super::dsl::{BUCKETS_AGGREGATION, CONTAINERS_AGGREGATION};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
    #[serde(default)]
    aggregations: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<Hit>,
}

/// `hits.total` is a bare number before 7.0 and an object since.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: Value,
}

#[derive(Debug, Deserialize)]
struct CardinalityAggregation {
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DateHistogramAggregation {
    #[serde(default)]
    buckets: Vec<DateHistogramBucket>,
}

#[derive(Debug, Deserialize)]
struct DateHistogramBucket {
    key: i64,
    doc_count: u64,
}

/// Converts a raw `_search` response into the result of `operation`.
pub(super) fn parse(
    raw: Value,
    operation: &LogOperation,
    fields: &ElasticsearchFieldMap,
) -> AppResult<QueryResult> {
    let response: SearchResponse = serde_json::from_value(raw).map_err(malformed)?;
    let total = match response.hits.total {
        Some(TotalHits::Count(value) | TotalHits::Object { value }) => value,
        None => 0,
    };

    match operation {
        LogOperation::Query => {
            let entries = response
                .hits
                .hits
                .into_iter()
                .map(|hit| entry_from_hit(hit, fields))
                .collect::<AppResult<Vec<_>>>()?;
            Ok(QueryResult::Query(LogPage { total, entries }))
        }
        LogOperation::Statistics => {
            let containers: Option<CardinalityAggregation> =
                aggregation(response.aggregations.as_ref(), CONTAINERS_AGGREGATION)?;
            let containers = containers
                .and_then(|aggregation| aggregation.value)
                .map_or(0, |value| value.max(0.0).round() as u64);
            Ok(QueryResult::Statistics(LogStatistics { total, containers }))
        }
        LogOperation::Histogram(_) => {
            let histogram: Option<DateHistogramAggregation> =
                aggregation(response.aggregations.as_ref(), BUCKETS_AGGREGATION)?;
            let buckets = histogram
                .map(|histogram| histogram.buckets)
                .unwrap_or_default()
                .into_iter()
                .map(|bucket| {
                    DateTime::from_timestamp_millis(bucket.key)
                        .map(|start| HistogramBucket {
                            start,
                            count: bucket.doc_count,
                        })
                        .ok_or_else(|| malformed(format!("bucket key {} is out of range", bucket.key)))
                })
                .collect::<AppResult<Vec<_>>>()?;
            Ok(QueryResult::Histogram(LogHistogram { total, buckets }))
        }
    }
}

fn aggregation<T>(aggregations: Option<&Value>, name: &str) -> AppResult<Option<T>>
where
    T: for<'de> Deserialize<'de>,
{
    aggregations
        .and_then(|aggregations| aggregations.get(name))
        .map(|value| serde_json::from_value(value.clone()).map_err(malformed))
        .transpose()
}

fn entry_from_hit(hit: Hit, fields: &ElasticsearchFieldMap) -> AppResult<LogEntry> {
    let text = |field: &str| source_value(&hit.source, field).and_then(value_as_string);
    let timestamp = source_value(&hit.source, &fields.timestamp)
        .and_then(parse_timestamp)
        .ok_or_else(|| malformed(format!("document '{}' has no readable timestamp", hit.id)))?;

    Ok(LogEntry {
        timestamp,
        namespace: text(&fields.namespace).unwrap_or_default(),
        workload: text(&fields.workload).filter(|workload| !workload.is_empty()),
        pod: text(&fields.pod).unwrap_or_default(),
        container: text(&fields.container).unwrap_or_default(),
        log: text(&fields.log).unwrap_or_default(),
        id: hit.id,
    })
}

/// Looks up a dotted field path in `_source`, ignoring a `.keyword`
/// sub-field suffix. Both nested objects and flattened dotted keys are
/// accepted.
fn source_value<'a>(source: &'a Value, field: &str) -> Option<&'a Value> {
    let path = field.strip_suffix(".keyword").unwrap_or(field);
    if let Some(value) = source.get(path) {
        return Some(value);
    }

    path.split('.')
        .try_fold(source, |current, segment| current.get(segment))
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(number) => number.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .ok()
            .or_else(|| text.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)),
        _ => None,
    }
}

fn malformed(error: impl std::fmt::Display) -> AppError {
    AppError::retryable_backend(format!("log index returned an unexpected response: {error}"))
}

#[cfg(test)]
mod tests {
    use logscope_core::AppError;
    use logscope_domain::{LogOperation, QueryResult};
    use serde_json::json;

    use super::{ElasticsearchFieldMap, parse};

    #[test]
    fn hits_are_read_from_nested_source() {
        let raw = json!({
            "hits": {
                "total": { "value": 12, "relation": "eq" },
                "hits": [{
                    "_id": "a1",
                    "_source": {
                        "time": "2024-05-01T10:00:00.123Z",
                        "log": "panic: boom\n",
                        "kubernetes": {
                            "namespace_name": "prod",
                            "pod_name": "api-0",
                            "container_name": "app"
                        }
                    }
                }]
            }
        });

        let result = parse(raw, &LogOperation::Query, &ElasticsearchFieldMap::default());

        let Ok(QueryResult::Query(page)) = result else {
            panic!("unexpected result shape");
        };
        assert_eq!(page.total, 12);
        assert_eq!(page.entries.len(), 1);
        let entry = &page.entries[0];
        assert_eq!(entry.id, "a1");
        assert_eq!(entry.namespace, "prod");
        assert_eq!(entry.workload, None);
        assert_eq!(entry.timestamp.timestamp_millis(), 1_714_557_600_123);
    }

    #[test]
    fn legacy_numeric_total_is_accepted() {
        let raw = json!({ "hits": { "total": 3, "hits": [] } });

        let result = parse(raw, &LogOperation::Query, &ElasticsearchFieldMap::default());

        assert_eq!(result.map(|result| result.total()).ok(), Some(3));
    }

    #[test]
    fn statistics_read_cardinality() {
        let raw = json!({
            "hits": { "total": { "value": 9 }, "hits": [] },
            "aggregations": { "containers": { "value": 4 } }
        });

        let result = parse(raw, &LogOperation::Statistics, &ElasticsearchFieldMap::default());

        let Ok(QueryResult::Statistics(statistics)) = result else {
            panic!("unexpected result shape");
        };
        assert_eq!(statistics.total, 9);
        assert_eq!(statistics.containers, 4);
    }

    #[test]
    fn histogram_buckets_keep_backend_keys() {
        let raw = json!({
            "hits": { "total": { "value": 5 }, "hits": [] },
            "aggregations": { "buckets": { "buckets": [
                { "key_as_string": "x", "key": 60_000, "doc_count": 2 },
                { "key": 180_000, "doc_count": 3 }
            ] } }
        });
        let operation = LogOperation::from_params(Some("histogram"), Some("1m"))
            .unwrap_or(LogOperation::Query);

        let result = parse(raw, &operation, &ElasticsearchFieldMap::default());

        let Ok(QueryResult::Histogram(histogram)) = result else {
            panic!("unexpected result shape");
        };
        assert_eq!(histogram.total, 5);
        assert_eq!(histogram.buckets.len(), 2);
        assert_eq!(histogram.buckets[1].count, 3);
    }

    #[test]
    fn hit_without_timestamp_is_retryable_backend_error() {
        let raw = json!({ "hits": { "total": 1, "hits": [{ "_id": "x", "_source": {} }] } });

        let result = parse(raw, &LogOperation::Query, &ElasticsearchFieldMap::default());

        assert!(matches!(
            result,
            Err(AppError::Backend {
                retryable: true,
                ..
            })
        ));
    }

    #[test]
    fn response_without_hits_is_malformed() {
        let result = parse(
            json!({ "error": "nope" }),
            &LogOperation::Query,
            &ElasticsearchFieldMap::default(),
        );

        assert!(result.is_err());
    }
}
