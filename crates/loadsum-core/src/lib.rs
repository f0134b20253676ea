pub mod error;
pub mod ingest;
pub mod io;
pub mod settings;
pub mod stats;
pub mod summary;

pub use error::LoadsumError;
pub use ingest::{summarize, summarize_upload, InputFormat, K6Options, Upload, UploadPolicy};
pub use summary::{Flags, Latency, MethodMetrics, Summary, SummaryReport};
