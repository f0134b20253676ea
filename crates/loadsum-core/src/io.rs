use std::path::Path;

use crate::error::LoadsumError;
use crate::ingest::Upload;

/// Read a result file from disk into an [`Upload`].
///
/// The content type is guessed from the file extension; unknown extensions
/// leave it undeclared so format detection falls back to the file name.
pub async fn read_upload(path: impl AsRef<Path>) -> Result<Upload, LoadsumError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Upload::new(
        filename,
        content_type_for(path).map(str::to_string),
        bytes,
    ))
}

/// Write rendered output to disk.
pub async fn write_output(path: impl AsRef<Path>, content: &str) -> Result<(), LoadsumError> {
    tokio::fs::write(path.as_ref(), content).await?;
    Ok(())
}

/// Content type for a result file based on its extension, if it is a known one.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "json" => Some("application/json"),
        "csv" | "jtl" => Some("text/csv"),
        _ => None,
    }
}
