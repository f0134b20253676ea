pub mod coerce;
pub mod jmeter;
pub mod k6;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoadsumError;
use crate::summary::{Flags, Summary, SummaryReport};

pub use k6::K6Options;

// ---------------------------------------------------------------------------
// InputFormat
// ---------------------------------------------------------------------------

/// Result file formats understood by the summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// JMeter CSV/JTL sample table.
    Jmeter,
    /// k6 JSON end-of-test summary.
    K6,
}

impl InputFormat {
    /// Tool label written into [`Summary::tool`].
    pub fn tool(self) -> &'static str {
        match self {
            Self::Jmeter => jmeter::TOOL,
            Self::K6 => k6::TOOL,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool())
    }
}

impl FromStr for InputFormat {
    type Err = LoadsumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jmeter" | "csv" | "jtl" => Ok(Self::Jmeter),
            "k6" | "json" => Ok(Self::K6),
            other => Err(LoadsumError::Decode(format!("unknown input format: {other}"))),
        }
    }
}

/// Pick a format from the declared content type and file name.
///
/// JSON (by content type or `.json` extension) is k6; everything else is
/// treated as a JMeter table.
pub fn detect_format(filename: &str, content_type: Option<&str>) -> InputFormat {
    let is_json_type = content_type
        .map(|ct| essence(ct) == "application/json")
        .unwrap_or(false);
    if is_json_type || filename.to_ascii_lowercase().ends_with(".json") {
        InputFormat::K6
    } else {
        InputFormat::Jmeter
    }
}

/// Media type without parameters, lowercased (`text/csv; charset=utf-8` -> `text/csv`).
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Summarize `bytes` in the given format.
///
/// k6 input must be valid JSON before it is dispatched; anything else is
/// rejected as [`LoadsumError::Decode`].
pub fn summarize(
    format: InputFormat,
    bytes: &[u8],
    options: &K6Options,
) -> Result<(Summary, Flags), LoadsumError> {
    match format {
        InputFormat::Jmeter => jmeter::build_summary(bytes),
        InputFormat::K6 => {
            let doc = k6::parse_document(bytes)?;
            k6::build_summary_from_value(&doc, options)
        }
    }
}

// ---------------------------------------------------------------------------
// Upload gating
// ---------------------------------------------------------------------------

/// A result file as received from a caller.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn detect_format(&self) -> InputFormat {
        detect_format(&self.filename, self.content_type.as_deref())
    }
}

/// Limits applied to an upload before any parsing happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub accepted_content_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::with_max_mb(50)
    }
}

impl UploadPolicy {
    /// Default accepted content types with a size ceiling of `max_mb` MiB.
    pub fn with_max_mb(max_mb: u64) -> Self {
        Self {
            max_bytes: max_mb.saturating_mul(1024 * 1024),
            accepted_content_types: vec![
                "application/json".to_string(),
                "text/csv".to_string(),
                "application/vnd.ms-excel".to_string(),
            ],
        }
    }

    /// Reject uploads that are empty, of an unaccepted type, or too large.
    ///
    /// Uploads without a declared content type are accepted; detection then
    /// falls back to the file name.
    pub fn validate(&self, upload: &Upload) -> Result<(), LoadsumError> {
        if upload.bytes.is_empty() {
            return Err(LoadsumError::Decode(format!(
                "{} is empty",
                display_name(&upload.filename)
            )));
        }

        if let Some(content_type) = upload.content_type.as_deref() {
            let essence = essence(content_type);
            if !self.accepted_content_types.iter().any(|ct| *ct == essence) {
                tracing::warn!(content_type, "rejected upload content type");
                return Err(LoadsumError::UnsupportedContentType(content_type.to_string()));
            }
        }

        if upload.size_bytes() > self.max_bytes {
            tracing::warn!(
                size_bytes = upload.size_bytes(),
                limit_bytes = self.max_bytes,
                "rejected oversized upload"
            );
            return Err(LoadsumError::TooLarge {
                size_bytes: upload.size_bytes(),
                limit_bytes: self.max_bytes,
            });
        }

        Ok(())
    }
}

fn display_name(filename: &str) -> &str {
    if filename.is_empty() {
        "upload"
    } else {
        filename
    }
}

/// Validate, detect and summarize an upload, wrapping the result with metadata.
pub fn summarize_upload(
    upload: &Upload,
    policy: &UploadPolicy,
    options: &K6Options,
) -> Result<SummaryReport, LoadsumError> {
    policy.validate(upload)?;
    let format = upload.detect_format();
    summarize_upload_as(upload, format, options)
}

/// Like [`summarize_upload`] with the format chosen by the caller. No policy is applied.
pub fn summarize_upload_as(
    upload: &Upload,
    format: InputFormat,
    options: &K6Options,
) -> Result<SummaryReport, LoadsumError> {
    let (summary, flags) = summarize(format, &upload.bytes, options)?;
    tracing::info!(
        tool = %format,
        file = %upload.filename,
        requests = summary.overall.requests,
        operations = summary.by_method.len(),
        "summarized result file"
    );
    Ok(SummaryReport::new(summary, flags, upload.size_bytes()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const JMETER_CSV: &str = "timeStamp,elapsed,label,success\n1000,50,GET /a,true\n2000,70,GET /b,false\n";
    const K6_JSON: &str = r#"{"metrics": {"http_reqs": {"count": 100}}}"#;

    fn upload(name: &str, content_type: Option<&str>, body: &str) -> Upload {
        Upload::new(name, content_type.map(str::to_string), body.as_bytes().to_vec())
    }

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn json_content_type_is_k6() {
        assert_eq!(detect_format("results", Some("application/json")), InputFormat::K6);
        assert_eq!(
            detect_format("results.csv", Some("application/json; charset=utf-8")),
            InputFormat::K6
        );
    }

    #[test]
    fn json_extension_is_k6() {
        assert_eq!(detect_format("summary.JSON", None), InputFormat::K6);
        assert_eq!(detect_format("summary.json", Some("text/csv")), InputFormat::K6);
    }

    #[test]
    fn everything_else_is_jmeter() {
        assert_eq!(detect_format("results.jtl", None), InputFormat::Jmeter);
        assert_eq!(detect_format("results.csv", Some("text/csv")), InputFormat::Jmeter);
        assert_eq!(detect_format("", None), InputFormat::Jmeter);
    }

    #[test]
    fn input_format_parses_from_str() {
        assert_eq!("K6".parse::<InputFormat>().unwrap(), InputFormat::K6);
        assert_eq!("jtl".parse::<InputFormat>().unwrap(), InputFormat::Jmeter);
        assert!("gatling".parse::<InputFormat>().is_err());
        assert_eq!(InputFormat::Jmeter.to_string(), "jmeter");
    }

    // -----------------------------------------------------------------------
    // summarize
    // -----------------------------------------------------------------------

    #[test]
    fn summarize_dispatches_jmeter() {
        let (summary, flags) =
            summarize(InputFormat::Jmeter, JMETER_CSV.as_bytes(), &K6Options::default())
                .expect("valid table");
        assert_eq!(summary.tool, "jmeter");
        assert_eq!(summary.overall.requests, 2);
        assert_eq!(flags.get_bool(Flags::APPROXIMATED_FAILURES), Some(false));
    }

    #[test]
    fn summarize_rejects_corrupt_json() {
        let err = summarize(InputFormat::K6, b"{not json", &K6Options::default()).unwrap_err();
        assert!(matches!(err, LoadsumError::Decode(_)));
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn summarize_dispatches_k6() {
        let (summary, flags) =
            summarize(InputFormat::K6, K6_JSON.as_bytes(), &K6Options::default())
                .expect("valid document");
        assert_eq!(summary.tool, "k6");
        assert_eq!(summary.overall.requests, 100);
        assert_eq!(flags.get_str(Flags::COUNT_SOURCE), Some("http_reqs"));
    }

    // -----------------------------------------------------------------------
    // UploadPolicy
    // -----------------------------------------------------------------------

    #[test]
    fn default_policy_is_fifty_mebibytes() {
        assert_eq!(UploadPolicy::default().max_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn policy_rejects_unsupported_content_type() {
        let err = UploadPolicy::default()
            .validate(&upload("a.txt", Some("text/plain"), "x"))
            .unwrap_err();
        assert!(matches!(err, LoadsumError::UnsupportedContentType(ref ct) if ct == "text/plain"));
        assert_eq!(err.status(), 415);
    }

    #[test]
    fn policy_accepts_content_type_parameters() {
        let policy = UploadPolicy::default();
        assert!(policy
            .validate(&upload("a.csv", Some("text/csv; charset=utf-8"), JMETER_CSV))
            .is_ok());
        assert!(policy
            .validate(&upload("a.csv", Some("application/vnd.ms-excel"), JMETER_CSV))
            .is_ok());
        assert!(policy.validate(&upload("a.csv", None, JMETER_CSV)).is_ok());
    }

    #[test]
    fn policy_rejects_oversized_upload() {
        let policy = UploadPolicy {
            max_bytes: 8,
            ..UploadPolicy::default()
        };
        let err = policy
            .validate(&upload("a.json", Some("application/json"), K6_JSON))
            .unwrap_err();
        assert_eq!(err.status(), 413);
    }

    #[test]
    fn policy_rejects_empty_upload() {
        let err = UploadPolicy::default()
            .validate(&upload("", Some("text/csv"), ""))
            .unwrap_err();
        assert_eq!(err.to_string(), "Unreadable input: upload is empty");
    }

    // -----------------------------------------------------------------------
    // summarize_upload
    // -----------------------------------------------------------------------

    #[test]
    fn summarize_upload_builds_report() {
        let report = summarize_upload(
            &upload("run.json", Some("application/json"), K6_JSON),
            &UploadPolicy::default(),
            &K6Options::default(),
        )
        .expect("valid upload");
        assert_eq!(report.metadata.tool_detected, "k6");
        assert_eq!(report.metadata.input_size_bytes, K6_JSON.len() as u64);
        assert_eq!(
            report.metadata.flags.get_str(Flags::COUNT_SOURCE),
            Some("http_reqs")
        );
    }

    #[test]
    fn summarize_upload_surfaces_missing_columns() {
        let err = summarize_upload(
            &upload("run.csv", Some("text/csv"), "timeStamp,label\n1,a\n"),
            &UploadPolicy::default(),
            &K6Options::default(),
        )
        .unwrap_err();
        assert_eq!(err.status(), 422);
    }

    #[test]
    fn summarize_upload_as_overrides_detection() {
        let report = summarize_upload_as(
            &upload("results.txt", None, JMETER_CSV),
            InputFormat::Jmeter,
            &K6Options::default(),
        )
        .expect("valid table");
        assert_eq!(report.summary.by_method.len(), 2);
    }
}
