use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use super::RouteState;
use crate::http_objects::ApiError;

/// List stored document names
#[utoipa::path(
    get,
    path = "/documents",
    tag = "docvault",
    responses(
        (status = 200, description = "names of stored documents", body = Vec<String>),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error")
    ),
)]
pub async fn list_documents(
    State(state): State<RouteState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let names = state.blob_storage.list().await?;
    Ok(Json(names))
}

/// Delete a stored document
#[utoipa::path(
    delete,
    path = "/documents/{blob_name}",
    tag = "docvault",
    params(
        ("blob_name" = String, Path, description = "storage key of the document")
    ),
    responses(
        (status = 200, description = "document deleted"),
        (status = 404, description = "document not found"),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error")
    ),
)]
pub async fn delete_document(
    Path(blob_name): Path<String>,
    State(state): State<RouteState>,
) -> Result<Response, ApiError> {
    state.blob_storage.delete(&blob_name).await?;
    info!(%blob_name, "deleted document");
    Ok((StatusCode::OK, "File deleted.").into_response())
}
