use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{delete, get, post},
    Router,
};
use blob_store::BlobStorage;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod documents;
mod download;
mod upload;

use documents::{delete_document, list_documents};
use download::download;
use upload::upload;

use crate::http_objects::ApiError;

/// Largest accepted upload body.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        upload::upload,
        documents::list_documents,
        documents::delete_document,
        download::download,
    ),
    components(schemas(ApiError)),
    tags(
        (name = "docvault", description = "Document vault API")
    )
)]
struct ApiDoc;

#[derive(Clone)]
pub struct RouteState {
    pub blob_storage: Arc<BlobStorage>,
}

pub fn create_routes(route_state: RouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/documents", get(list_documents))
        .route("/documents/{blob_name}", delete(delete_document))
        .route("/download/{blob_name}", get(download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(route_state)
}

async fn index() -> &'static str {
    "docvault-server"
}
