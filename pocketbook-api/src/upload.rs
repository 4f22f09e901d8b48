//! File attachments for multipart endpoints.

use std::path::Path;

use pocketbook_fetch::FormFile;
use tracing::debug;

use crate::error::ApiError;

/// Reads `path` into memory for a form file part.
pub(crate) async fn read_attachment(path: &Path) -> Result<FormFile, ApiError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::invalid(format!("not a file path: {}", path.display())))?
        .to_string();

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::invalid(format!("cannot read {}: {e}", path.display())))?;
    if bytes.is_empty() {
        return Err(ApiError::invalid(format!("{} is empty", path.display())));
    }

    debug!(file = %file_name, size = bytes.len(), "Attachment loaded");
    Ok(FormFile::new(file_name, bytes))
}
