use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum LoadsumError {
    /// Required columns or fields are absent from the input.
    #[error("Incomplete structure: missing columns {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// The input is not readable in its declared format.
    #[error("Unreadable input: {0}")]
    Decode(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Input too large: {size_bytes} bytes exceeds the {limit_bytes} byte limit")]
    TooLarge { size_bytes: u64, limit_bytes: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LoadsumError {
    /// HTTP-style status code a transport layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingColumns(_) => 422,
            Self::Decode(_) => 400,
            Self::UnsupportedContentType(_) => 415,
            Self::TooLarge { .. } => 413,
            Self::Io(_) | Self::Serde(_) | Self::Csv(_) | Self::Config(_) | Self::Internal(_) => {
                500
            }
        }
    }

    /// `true` when the caller has to fix the input; retrying is pointless.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// Build the problem-details envelope for this error.
    pub fn problem(&self) -> Problem {
        let (title, extra) = match self {
            Self::MissingColumns(columns) => (
                "Incomplete structure",
                serde_json::json!({ "missing_columns": columns }),
            ),
            Self::Decode(_) => ("Unreadable file", serde_json::json!({})),
            Self::UnsupportedContentType(content_type) => (
                "Unsupported type",
                serde_json::json!({ "content_type": content_type }),
            ),
            Self::TooLarge {
                size_bytes,
                limit_bytes,
            } => (
                "File too large",
                serde_json::json!({ "size_bytes": size_bytes, "limit_bytes": limit_bytes }),
            ),
            Self::Io(_) | Self::Serde(_) | Self::Csv(_) | Self::Config(_) | Self::Internal(_) => {
                ("Error processing file", serde_json::json!({}))
            }
        };

        Problem {
            kind: "about:blank".to_string(),
            title: title.to_string(),
            status: self.status(),
            detail: self.to_string(),
            extra,
        }
    }
}

impl Serialize for LoadsumError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

// ---------------------------------------------------------------------------
// Problem
// ---------------------------------------------------------------------------

/// Problem-details document describing a failed summary request.
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub extra: Value,
}
