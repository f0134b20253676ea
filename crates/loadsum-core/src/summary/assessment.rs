use serde::{Deserialize, Serialize};

use super::Summary;

/// Error rate (percent) above which a run needs attention.
pub const ERROR_RATE_WARN_PCT: f64 = 1.0;
/// Error rate (percent) above which a run is critical.
pub const ERROR_RATE_CRITICAL_PCT: f64 = 3.0;
/// p95 latency (ms) above which a run needs attention.
pub const P95_WARN_MS: f64 = 400.0;
/// p95 latency (ms) above which a run is critical.
pub const P95_CRITICAL_MS: f64 = 800.0;

/// Overall verdict for a run, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Positive,
    NeedsAttention,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Assessment {
    pub status: HealthStatus,
    pub error_rate_pct: f64,
    pub p95_ms: f64,
    /// One entry per threshold that was crossed.
    pub reasons: Vec<String>,
}

/// Classify the overall metrics of a summary against fixed thresholds.
pub fn assess(summary: &Summary) -> Assessment {
    let overall = &summary.overall;
    let error_rate_pct = overall.error_rate * 100.0;
    let p95_ms = overall.latency_ms.p95;

    let mut status = HealthStatus::Positive;
    let mut reasons = Vec::new();

    let error_status = classify(error_rate_pct, ERROR_RATE_WARN_PCT, ERROR_RATE_CRITICAL_PCT);
    if error_status != HealthStatus::Positive {
        reasons.push(format!("error rate {error_rate_pct:.2}%"));
        status = status.max(error_status);
    }

    let latency_status = classify(p95_ms, P95_WARN_MS, P95_CRITICAL_MS);
    if latency_status != HealthStatus::Positive {
        reasons.push(format!("p95 latency {p95_ms:.1}ms"));
        status = status.max(latency_status);
    }

    Assessment {
        status,
        error_rate_pct,
        p95_ms,
        reasons,
    }
}

fn classify(value: f64, warn: f64, critical: f64) -> HealthStatus {
    if value > critical {
        HealthStatus::Critical
    } else if value > warn {
        HealthStatus::NeedsAttention
    } else {
        HealthStatus::Positive
    }
}
