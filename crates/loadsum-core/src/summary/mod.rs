pub mod assessment;
pub mod export;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stats;

/// Name reserved for the aggregate row of a summary.
pub const OVERALL_NAME: &str = "(overall)";

// ---------------------------------------------------------------------------
// Latency
// ---------------------------------------------------------------------------

/// Latency percentiles in milliseconds. Unknown values are `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Latency {
    #[serde(default)]
    pub p50: f64,
    #[serde(default)]
    pub p90: f64,
    #[serde(default)]
    pub p95: f64,
    #[serde(default)]
    pub p99: f64,
}

// ---------------------------------------------------------------------------
// MethodMetrics
// ---------------------------------------------------------------------------

/// Statistics for one operation, or for the whole run under [`OVERALL_NAME`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MethodMetrics {
    pub name: String,
    pub requests: u64,
    pub failures: u64,
    /// `failures / max(requests, 1)` rounded to four decimals.
    pub error_rate: f64,
    pub duration_ms: u64,
    pub throughput_rps: f64,
    pub latency_ms: Latency,
}

impl MethodMetrics {
    /// Build a metrics row; the error rate is always derived from the counts.
    pub fn new(
        name: impl Into<String>,
        requests: u64,
        failures: u64,
        duration_ms: u64,
        throughput_rps: f64,
        latency_ms: Latency,
    ) -> Self {
        Self {
            name: name.into(),
            requests,
            failures,
            error_rate: stats::error_rate(failures, requests),
            duration_ms,
            throughput_rps,
            latency_ms,
        }
    }

    pub fn is_overall(&self) -> bool {
        self.name == OVERALL_NAME
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Normalized summary of one load-test result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Summary {
    /// Source tool label (`jmeter`, `k6`).
    pub tool: String,
    /// UTC timestamp of when the summary was computed.
    pub run_id: String,
    pub overall: MethodMetrics,
    #[serde(default)]
    pub by_method: Vec<MethodMetrics>,
}

impl Summary {
    /// Assemble a summary stamped with the current time. `by_method` is
    /// sorted by operation name.
    pub fn new(tool: impl Into<String>, overall: MethodMetrics, by_method: Vec<MethodMetrics>) -> Self {
        Self::at(tool, Utc::now(), overall, by_method)
    }

    /// Like [`Summary::new`] with an explicit timestamp for the run id.
    pub fn at(
        tool: impl Into<String>,
        when: DateTime<Utc>,
        overall: MethodMetrics,
        mut by_method: Vec<MethodMetrics>,
    ) -> Self {
        by_method.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            tool: tool.into(),
            run_id: run_id(when),
            overall,
            by_method,
        }
    }

    /// Look up an operation by name.
    pub fn method(&self, name: &str) -> Option<&MethodMetrics> {
        self.by_method.iter().find(|m| m.name == name)
    }
}

/// Format a run id (`YYYY-MM-DDTHH:MM:SSZ`).
pub fn run_id(when: DateTime<Utc>) -> String {
    when.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// Value of a single data-quality flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Caveats about how the values of a summary were obtained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flags(BTreeMap<String, FlagValue>);

impl Flags {
    pub const APPROXIMATED_PERCENTILES: &'static str = "approximated_percentiles";
    pub const APPROXIMATED_DURATION: &'static str = "approximated_duration";
    pub const APPROXIMATED_FAILURES: &'static str = "approximated_failures";
    pub const COUNT_SOURCE: &'static str = "count_source";

    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<FlagValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<FlagValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.0.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.0.get(name) {
            Some(FlagValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(FlagValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FlagValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SummaryReport
// ---------------------------------------------------------------------------

/// Metadata describing a single summary request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportMetadata {
    pub request_id: Uuid,
    pub tool_detected: String,
    pub input_size_bytes: u64,
    pub flags: Flags,
}

/// A computed summary together with request metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SummaryReport {
    pub summary: Summary,
    pub metadata: ReportMetadata,
}

impl SummaryReport {
    pub fn new(summary: Summary, flags: Flags, input_size_bytes: u64) -> Self {
        let metadata = ReportMetadata {
            request_id: Uuid::new_v4(),
            tool_detected: summary.tool.clone(),
            input_size_bytes,
            flags,
        };
        Self { summary, metadata }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
