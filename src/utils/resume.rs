use std::path::Path;

use crate::error::{Error, Result};
use crate::models::candidate::ResumeUpload;

const PDF_MIME: &str = "application/pdf";
const DOC_MIME: &str = "application/msword";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Checks extension, magic bytes and size of an uploaded résumé and settles
/// the content type it will be served with.
pub fn validate_upload(file_name: &str, data: bytes::Bytes, max_bytes: usize) -> Result<ResumeUpload> {
    if data.len() > max_bytes {
        return Err(Error::BadRequest(format!(
            "Resume exceeds the {} byte limit",
            max_bytes
        )));
    }

    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let content_type = match ext.as_str() {
        "pdf" => {
            if !data.starts_with(b"%PDF") {
                return Err(Error::BadRequest("Invalid PDF file content".into()));
            }
            PDF_MIME
        }
        "doc" => {
            if !data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
                return Err(Error::BadRequest("Invalid DOC file content".into()));
            }
            DOC_MIME
        }
        "docx" => {
            if !data.starts_with(b"PK\x03\x04") {
                return Err(Error::BadRequest("Invalid DOCX file content".into()));
            }
            DOCX_MIME
        }
        other => {
            return Err(Error::BadRequest(format!(
                "File type .{} is not allowed",
                other
            )))
        }
    };

    Ok(ResumeUpload {
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
        data,
    })
}

/// File extension used when serving a stored résumé back.
pub fn extension_for(content_type: &str) -> &'static str {
    if content_type.contains("msword") {
        "doc"
    } else if content_type.contains("word") {
        "docx"
    } else {
        "pdf"
    }
}

/// Download name, e.g. `Curriculo_Maria_Silva.pdf`.
pub fn download_name(full_name: &str, content_type: &str) -> String {
    let stem = full_name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("Curriculo_{}.{}", stem, extension_for(content_type))
}
