use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::LoadsumError;
use crate::ingest::coerce;
use crate::summary::{Flags, Latency, MethodMetrics, Summary, OVERALL_NAME};

/// Tool label for k6 results.
pub const TOOL: &str = "k6";

/// Suffix k6 scripts conventionally give their per-operation checks.
const CHECK_SUFFIX: &str = " OK";

/// Overall latency metrics, most specific first.
const LATENCY_SOURCES: [&str; 2] = ["grpc_req_duration", "http_req_duration"];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Naming convention for per-operation duration metrics.
///
/// A custom trend registered as `Metodo_user_login_duration` holds the latency
/// of the `user.login` operation with the default prefix and suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct K6Options {
    pub method_metric_prefix: String,
    pub method_metric_suffix: String,
}

impl Default for K6Options {
    fn default() -> Self {
        Self {
            method_metric_prefix: "Metodo_".to_string(),
            method_metric_suffix: "_duration".to_string(),
        }
    }
}

impl K6Options {
    /// Metric key holding the latency trend of `operation`.
    pub fn method_metric_key(&self, operation: &str) -> String {
        format!(
            "{}{}{}",
            self.method_metric_prefix,
            operation.replace(['.', '/'], "_"),
            self.method_metric_suffix
        )
    }
}

// ---------------------------------------------------------------------------
// Count strategies
// ---------------------------------------------------------------------------

/// Which part of the document supplied the request/failure counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    RootGroupChecks,
    MetricsChecks,
    HttpReqs,
    None,
}

impl CountSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RootGroupChecks => "root_group.checks",
            Self::MetricsChecks => "metrics.checks",
            Self::HttpReqs => "http_reqs",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct OpCounts {
    requests: u64,
    failures: u64,
}

#[derive(Debug, Default)]
struct Counts {
    requests: u64,
    failures: u64,
    per_method: BTreeMap<String, OpCounts>,
}

struct CountStrategy {
    source: CountSource,
    applies: fn(&Value) -> bool,
    extract: fn(&Value) -> Counts,
}

/// Tried in order; the first strategy whose predicate holds supplies the counts.
const COUNT_STRATEGIES: [CountStrategy; 3] = [
    CountStrategy {
        source: CountSource::RootGroupChecks,
        applies: has_root_group_checks,
        extract: counts_from_root_group,
    },
    CountStrategy {
        source: CountSource::MetricsChecks,
        applies: has_checks_metric,
        extract: counts_from_checks_metric,
    },
    CountStrategy {
        source: CountSource::HttpReqs,
        applies: has_http_reqs,
        extract: counts_from_http_reqs,
    },
];

fn extract_counts(doc: &Value) -> (CountSource, Counts) {
    COUNT_STRATEGIES
        .iter()
        .find(|strategy| (strategy.applies)(doc))
        .map(|strategy| (strategy.source, (strategy.extract)(doc)))
        .unwrap_or((CountSource::None, Counts::default()))
}

/// Individual checks of the root group, keyed by check name.
///
/// `--summary-export` writes them as an object keyed by name, `handleSummary`
/// as an array of objects carrying a `name`.
fn root_group_checks(doc: &Value) -> Vec<(&str, &Value)> {
    match doc.get("root_group").and_then(|group| group.get("checks")) {
        Some(Value::Object(map)) => map.iter().map(|(name, check)| (name.as_str(), check)).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|check| check.get("name").and_then(Value::as_str).map(|name| (name, check)))
            .collect(),
        _ => Vec::new(),
    }
}

fn has_root_group_checks(doc: &Value) -> bool {
    !root_group_checks(doc).is_empty()
}

fn has_checks_metric(doc: &Value) -> bool {
    metric(doc, "checks").is_some()
}

fn has_http_reqs(doc: &Value) -> bool {
    metric(doc, "http_reqs").is_some() || metric(doc, "http_req_failed").is_some()
}

fn counts_from_root_group(doc: &Value) -> Counts {
    let mut counts = Counts::default();
    for (check_name, check) in root_group_checks(doc) {
        let passes = coerce::to_count(check.get("passes"));
        let fails = coerce::to_count(check.get("fails"));
        let operation = check_name.strip_suffix(CHECK_SUFFIX).unwrap_or(check_name);

        let requests = passes.saturating_add(fails);

        let entry = counts.per_method.entry(operation.to_string()).or_default();
        entry.requests = entry.requests.saturating_add(requests);
        entry.failures = entry.failures.saturating_add(fails);

        counts.requests = counts.requests.saturating_add(requests);
        counts.failures = counts.failures.saturating_add(fails);
    }
    counts
}

fn counts_from_checks_metric(doc: &Value) -> Counts {
    let Some(checks) = metric(doc, "checks") else {
        return Counts::default();
    };
    let passes = coerce::to_count(metric_field(checks, "passes"));
    let fails = coerce::to_count(metric_field(checks, "fails"));
    Counts {
        requests: passes.saturating_add(fails),
        failures: fails,
        per_method: BTreeMap::new(),
    }
}

fn counts_from_http_reqs(doc: &Value) -> Counts {
    let requests = metric(doc, "http_reqs")
        .map(|reqs| coerce::to_count(metric_field(reqs, "count")))
        .unwrap_or(0);
    // `http_req_failed` is a rate metric; its "passes" are the failed requests.
    let failures = metric(doc, "http_req_failed")
        .map(|failed| {
            coerce::to_count(metric_field(failed, "count").or_else(|| metric_field(failed, "passes")))
        })
        .unwrap_or(0);
    Counts {
        requests,
        failures,
        per_method: BTreeMap::new(),
    }
}

// ---------------------------------------------------------------------------
// Metric lookup
// ---------------------------------------------------------------------------

fn metric<'a>(doc: &'a Value, name: &str) -> Option<&'a Value> {
    doc.get("metrics")?.get(name)
}

/// Read a metric field stored either inline or under a nested `values` object.
fn metric_field<'a>(metric: &'a Value, key: &str) -> Option<&'a Value> {
    metric
        .get(key)
        .or_else(|| metric.get("values").and_then(|values| values.get(key)))
}

fn latency_from_metric(metric: &Value) -> Latency {
    let p50 = metric_field(metric, "p(50)").or_else(|| metric_field(metric, "med"));
    Latency {
        p50: coerce::to_f64(p50),
        p90: coerce::to_f64(metric_field(metric, "p(90)")),
        p95: coerce::to_f64(metric_field(metric, "p(95)")),
        p99: coerce::to_f64(metric_field(metric, "p(99)")),
    }
}

fn overall_latency(doc: &Value) -> Latency {
    match LATENCY_SOURCES
        .iter()
        .find_map(|name| metric(doc, name).map(|m| (*name, m)))
    {
        Some((name, m)) => {
            tracing::debug!(source = name, "using k6 latency metric");
            latency_from_metric(m)
        }
        None => Latency::default(),
    }
}

/// Run length in seconds from iteration count and rate; 0 when unknown.
fn duration_seconds(doc: &Value) -> f64 {
    let Some(iterations) = metric(doc, "iterations") else {
        return 0.0;
    };
    let count = coerce::to_f64(metric_field(iterations, "count"));
    let rate = coerce::to_f64(metric_field(iterations, "rate"));
    if count == 0.0 || rate == 0.0 {
        return 0.0;
    }
    (count / rate).max(0.0)
}

fn rate_over(requests: u64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        requests as f64 / seconds
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse raw bytes as a JSON document.
pub fn parse_document(bytes: &[u8]) -> Result<Value, LoadsumError> {
    serde_json::from_slice(bytes)
        .map_err(|e| LoadsumError::Decode(format!("unreadable or corrupt JSON: {e}")))
}

/// Summarize a k6 JSON summary using the default metric naming convention.
pub fn build_summary(bytes: &[u8]) -> Result<(Summary, Flags), LoadsumError> {
    let doc = parse_document(bytes)?;
    build_summary_from_value(&doc, &K6Options::default())
}

/// Summarize an already-parsed k6 JSON summary.
///
/// k6 does not record the wall-clock span of a run, so duration is derived
/// from the iteration rate and per-operation throughput reuses the overall
/// duration. `flags` records which values are approximations.
pub fn build_summary_from_value(
    doc: &Value,
    options: &K6Options,
) -> Result<(Summary, Flags), LoadsumError> {
    if !doc.is_object() {
        return Err(LoadsumError::Decode(
            "k6 summary must be a JSON object".to_string(),
        ));
    }

    let (source, counts) = extract_counts(doc);
    tracing::debug!(source = source.as_str(), "selected k6 count source");

    let seconds = duration_seconds(doc);
    let duration_ms = (seconds * 1000.0).trunc() as u64;
    let latency = overall_latency(doc);

    let overall = MethodMetrics::new(
        OVERALL_NAME,
        counts.requests,
        counts.failures,
        duration_ms,
        rate_over(counts.requests, seconds),
        latency,
    );

    let by_method = counts
        .per_method
        .iter()
        .map(|(name, op)| {
            let op_latency = metric(doc, &options.method_metric_key(name))
                .map(latency_from_metric)
                .unwrap_or_default();
            MethodMetrics::new(
                name.as_str(),
                op.requests,
                op.failures,
                duration_ms,
                rate_over(op.requests, seconds),
                op_latency,
            )
        })
        .collect();

    let flags = Flags::new()
        .with(Flags::APPROXIMATED_PERCENTILES, latency.p99 == 0.0)
        .with(Flags::APPROXIMATED_DURATION, duration_ms == 0)
        .with(Flags::COUNT_SOURCE, source.as_str());

    Ok((Summary::new(TOOL, overall, by_method), flags))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
