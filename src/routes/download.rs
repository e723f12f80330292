use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
};

use super::RouteState;
use crate::http_objects::ApiError;

/// Download a stored document
#[utoipa::path(
    get,
    path = "/download/{blob_name}",
    tag = "docvault",
    params(
        ("blob_name" = String, Path, description = "storage key of the document")
    ),
    responses(
        (status = 200, description = "document bytes, served as an attachment"),
        (status = 404, description = "document not found"),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error")
    ),
)]
pub async fn download(
    Path(blob_name): Path<String>,
    State(state): State<RouteState>,
) -> Result<Response<Body>, ApiError> {
    let read = state.blob_storage.get(&blob_name).await?;

    // backends without object attributes fall back to a filename guess
    let content_type = read
        .content_type
        .unwrap_or_else(|| mime_guess::from_path(&blob_name).first_or_octet_stream().to_string());

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, read.size_bytes.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{blob_name}\""),
        )
        .body(Body::from_stream(read.stream))
        .map_err(|e| ApiError::internal_error_str(&e.to_string()))
}
