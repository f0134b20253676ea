use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::LoadsumError;
use crate::ingest::{K6Options, UploadPolicy};

/// Runtime configuration.
///
/// Loaded from an optional config file, then overridden by `LOADSUM_*`
/// environment variables (e.g. `LOADSUM_MAX_UPLOAD_MB=100`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log filter directive (e.g. "info", "loadsum_core=debug").
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Largest accepted input, in MiB.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
    /// Prefix of per-operation k6 duration metrics.
    #[serde(default = "default_method_metric_prefix")]
    pub method_metric_prefix: String,
    /// Suffix of per-operation k6 duration metrics.
    #[serde(default = "default_method_metric_suffix")]
    pub method_metric_suffix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_upload_mb: default_max_upload_mb(),
            method_metric_prefix: default_method_metric_prefix(),
            method_metric_suffix: default_method_metric_suffix(),
        }
    }
}

impl Settings {
    pub fn new<P: AsRef<Path>>(path: Option<P>) -> Result<Self, LoadsumError> {
        let mut builder = Config::builder();

        if let Some(file) = path {
            builder = builder
                .add_source(File::with_name(&file.as_ref().to_string_lossy()).required(false));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("LOADSUM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|config| config.try_deserialize())?;
        Ok(settings)
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::with_max_mb(self.max_upload_mb)
    }

    pub fn k6_options(&self) -> K6Options {
        K6Options {
            method_metric_prefix: self.method_metric_prefix.clone(),
            method_metric_suffix: self.method_metric_suffix.clone(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_upload_mb() -> u64 {
    50
}

fn default_method_metric_prefix() -> String {
    K6Options::default().method_metric_prefix
}

fn default_method_metric_suffix() -> String {
    K6Options::default().method_metric_suffix
}
