//! Route handlers.

pub mod admin;
pub mod auth;
pub mod history;
pub mod interview;
pub mod ocr;
pub mod payments;
pub mod resume;

use axum::extract::Multipart;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::Error;

/// Liveness probe.
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// A file pulled out of a multipart upload.
pub(crate) struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Read the named file field out of a multipart body.
pub(crate) async fn read_file_field(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<UploadedFile, Error> {
    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Invalid multipart body: {e}"),
    })? {
        if field.name() != Some(field_name) {
            continue;
        }
        let filename = field.file_name().unwrap_or(field_name).to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::BadRequest {
                message: format!("Could not read uploaded file: {e}"),
            })?
            .to_vec();
        if bytes.is_empty() {
            return Err(Error::BadRequest {
                message: format!("Uploaded field '{field_name}' is empty"),
            });
        }
        return Ok(UploadedFile {
            filename,
            content_type,
            bytes,
        });
    }

    Err(Error::BadRequest {
        message: format!("Missing multipart field '{field_name}'"),
    })
}
