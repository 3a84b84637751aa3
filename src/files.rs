//! Attachment helpers
//!
//! Resource uploads travel as base64 text in `resources.file_blob`, so
//! the same payload round-trips through every backend and the JSON API
//! without a binary column.

use crate::model::FileType;
use crate::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::path::Path;

/// An upload ready to store on a resource row
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub file_blob: String,
    pub file_type: FileType,
}

/// Read a local file into a storable attachment.
pub fn encode_attachment(path: &Path) -> Result<Attachment> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Validation(format!("Not a file path: {}", path.display())))?;
    let bytes = std::fs::read(path)?;
    Ok(Attachment {
        file_type: FileType::from_file_name(&file_name),
        file_blob: BASE64.encode(bytes),
        file_name,
    })
}

/// Decode a stored payload back into raw bytes (download/viewer path).
pub fn decode_attachment(file_blob: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(file_blob)
        .map_err(|e| Error::Validation(format!("Corrupt attachment payload: {}", e)))
}
