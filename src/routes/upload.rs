use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::info;
use utoipa::ToSchema;

use super::RouteState;
use crate::http_objects::ApiError;

struct UploadedFile {
    original_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    /// Owner name, becomes part of the storage key
    name: String,
    /// Register number (wire field `registerNumber`), becomes part of the
    /// storage key
    register_number: String,
    #[schema(format = "binary")]
    /// File to upload
    file: String,
}

/// Upload a document
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content_type = "multipart/form-data", content = inline(UploadForm)),
    tag = "docvault",
    responses(
        (status = 200, description = "upload successful"),
        (status = 400, description = "missing name, register number, or file"),
        (status = 409, description = "a document already exists under this key"),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error")
    ),
)]
pub async fn upload(
    State(state): State<RouteState>,
    mut form: Multipart,
) -> Result<Response, ApiError> {
    let mut name: Option<String> = None;
    let mut register_number: Option<String> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = form
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(&e.to_string()))?
    {
        let field_name = field.name().map(|s| s.to_string());
        match field_name.as_deref() {
            Some("name") => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(&e.to_string()))?,
                );
            }
            Some("registerNumber") => {
                register_number = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(&e.to_string()))?,
                );
            }
            Some("file") => {
                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| ApiError::bad_request("file field must carry a filename"))?;
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(&e.to_string()))?;
                file = Some(UploadedFile {
                    original_name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let name = required(name, "name")?;
    let register_number = required(register_number, "registerNumber")?;
    let file = file.ok_or_else(|| {
        ApiError::bad_request("please provide name, register number, and a file")
    })?;
    if file.bytes.is_empty() {
        return Err(ApiError::bad_request("uploaded file is empty"));
    }

    let key = document_key(&register_number, &name, &file.original_name);
    let result = state
        .blob_storage
        .put(&key, file.bytes, file.content_type.as_deref())
        .await?;
    info!(key = %result.key, size_bytes = result.size_bytes, "stored document");

    Ok((StatusCode::OK, "File uploaded successfully.").into_response())
}

/// The storage key is the exact concatenation
/// `registerNumber-name-originalFileName`, no normalization.
pub(crate) fn document_key(register_number: &str, name: &str, original_file_name: &str) -> String {
    format!("{register_number}-{name}-{original_file_name}")
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(&format!(
            "missing required field: {field}"
        ))),
    }
}
