use std::collections::BTreeMap;

use csv::StringRecord;

use crate::error::LoadsumError;
use crate::ingest::coerce;
use crate::stats;
use crate::summary::{Flags, MethodMetrics, Summary, OVERALL_NAME};

/// Tool label for JMeter results.
pub const TOOL: &str = "jmeter";

const COL_TIMESTAMP: &str = "timeStamp";
const COL_LABEL: &str = "label";
const COL_ELAPSED: &str = "elapsed";
const COL_SUCCESS: &str = "success";

/// Columns a result table must carry, in the order they are reported when missing.
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_TIMESTAMP, COL_LABEL, COL_ELAPSED, COL_SUCCESS];

/// One sample row after coercion.
#[derive(Debug, Clone, PartialEq)]
struct Sample {
    timestamp: i64,
    label: String,
    elapsed: f64,
    success: bool,
}

/// Positions of the required columns in the header row.
struct ColumnIndex {
    timestamp: usize,
    label: usize,
    elapsed: usize,
    success: usize,
}

impl ColumnIndex {
    /// Locate the required columns. A repeated header name resolves to its
    /// last occurrence.
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadsumError> {
        let mut found: [Option<usize>; 4] = [None; 4];
        for (position, header) in headers.iter().enumerate() {
            if let Some(slot) = REQUIRED_COLUMNS.iter().position(|name| *name == header) {
                found[slot] = Some(position);
            }
        }

        match found {
            [Some(timestamp), Some(label), Some(elapsed), Some(success)] => Ok(Self {
                timestamp,
                label,
                elapsed,
                success,
            }),
            _ => Err(LoadsumError::MissingColumns(
                REQUIRED_COLUMNS
                    .iter()
                    .zip(found)
                    .filter(|(_, position)| position.is_none())
                    .map(|(name, _)| name.to_string())
                    .collect(),
            )),
        }
    }

    /// Coerce a record into a [`Sample`], or `None` if any field is unusable.
    fn sample(&self, record: &StringRecord) -> Option<Sample> {
        let timestamp = record.get(self.timestamp)?.trim().parse::<i64>().ok()?;
        let label = record.get(self.label)?.to_string();
        let elapsed = record
            .get(self.elapsed)?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())?;
        let success = coerce::to_bool(record.get(self.success)?);
        Some(Sample {
            timestamp,
            label,
            elapsed,
            success,
        })
    }
}

/// Summarize a JMeter CSV/JTL result table.
///
/// Invalid UTF-8 is replaced rather than rejected. Rows whose timestamp or
/// elapsed time cannot be parsed are skipped without being reported; only a
/// missing required column fails the call.
pub fn build_summary(bytes: &[u8]) -> Result<(Summary, Flags), LoadsumError> {
    let decoded = String::from_utf8_lossy(bytes);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LoadsumError::Decode(format!("failed to read CSV headers: {e}")))?
        .clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut samples = Vec::new();
    let mut dropped = 0usize;
    for result in reader.records() {
        match result.ok().and_then(|record| columns.sample(&record)) {
            Some(sample) => samples.push(sample),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!(dropped, kept = samples.len(), "skipped unparseable JMeter rows");
    }

    let all: Vec<&Sample> = samples.iter().collect();
    let overall = bucket_metrics(OVERALL_NAME, &all);

    let mut buckets: BTreeMap<&str, Vec<&Sample>> = BTreeMap::new();
    for sample in &samples {
        buckets.entry(sample.label.as_str()).or_default().push(sample);
    }
    let by_method = buckets
        .iter()
        .map(|(label, rows)| bucket_metrics(label, rows))
        .collect();

    let flags = Flags::new()
        .with(Flags::APPROXIMATED_PERCENTILES, false)
        .with(Flags::APPROXIMATED_DURATION, false)
        .with(Flags::APPROXIMATED_FAILURES, false);

    Ok((Summary::new(TOOL, overall, by_method), flags))
}

fn bucket_metrics(name: &str, rows: &[&Sample]) -> MethodMetrics {
    let requests = rows.len() as u64;
    let failures = rows.iter().filter(|r| !r.success).count() as u64;

    let timestamps: Vec<i64> = rows.iter().map(|r| r.timestamp).collect();
    let duration_ms = stats::duration_ms_from_timestamps(&timestamps);

    let elapsed: Vec<f64> = rows.iter().map(|r| r.elapsed).collect();

    MethodMetrics::new(
        name,
        requests,
        failures,
        duration_ms,
        stats::throughput_rps(requests, duration_ms),
        stats::latency_from_samples(&elapsed),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
