use crate::error::LoadsumError;

use super::{FlagValue, Flags, MethodMetrics, Summary, SummaryReport};

/// Column header of the per-operation CSV table.
pub const CSV_COLUMNS: [&str; 10] = [
    "name",
    "requests",
    "failures",
    "error_rate",
    "duration_ms",
    "throughput_rps",
    "p50_ms",
    "p90_ms",
    "p95_ms",
    "p99_ms",
];

// ---------------------------------------------------------------------------
// JSON export
// ---------------------------------------------------------------------------

/// Export a report as pretty-printed JSON.
pub fn export_json(report: &SummaryReport) -> Result<String, LoadsumError> {
    Ok(serde_json::to_string_pretty(report)?)
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Export a summary as CSV.
///
/// Produces a text document with:
/// - Leading comment lines (prefixed `#`) naming the tool, run id and flags.
/// - A header row.
/// - The overall row followed by one row per operation.
pub fn export_csv(summary: &Summary, flags: &Flags) -> Result<String, LoadsumError> {
    let mut out = String::new();
    out.push_str(&format!("# loadsum summary ({})\n", summary.tool));
    out.push_str(&format!("# Run ID: {}\n", summary.run_id));
    for (name, value) in flags.iter() {
        let value = match value {
            FlagValue::Bool(b) => b.to_string(),
            FlagValue::Text(s) => s.clone(),
        };
        out.push_str(&format!("# {name}: {value}\n"));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS)?;
    for metrics in std::iter::once(&summary.overall).chain(summary.by_method.iter()) {
        writer.write_record(metrics_row(metrics))?;
    }
    let table = writer
        .into_inner()
        .map_err(|e| LoadsumError::Internal(format!("failed to flush CSV writer: {e}")))?;
    let table = String::from_utf8(table)
        .map_err(|e| LoadsumError::Internal(format!("CSV output is not UTF-8: {e}")))?;

    out.push_str(&table);
    Ok(out)
}

fn metrics_row(m: &MethodMetrics) -> [String; 10] {
    [
        m.name.clone(),
        m.requests.to_string(),
        m.failures.to_string(),
        format!("{:.4}", m.error_rate),
        m.duration_ms.to_string(),
        format!("{:.3}", m.throughput_rps),
        format!("{:.3}", m.latency_ms.p50),
        format!("{:.3}", m.latency_ms.p90),
        format!("{:.3}", m.latency_ms.p95),
        format!("{:.3}", m.latency_ms.p99),
    ]
}
