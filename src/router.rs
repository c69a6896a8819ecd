use crate::config::Config;
use crate::db::DocumentStorage;
use crate::handlers::{
    documents::{delete_document, get_document, list_documents, upload_document},
    index,
};
use crate::service::FileStore;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and part headers on top of the file limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct PortalState {
    pub storage: DocumentStorage,
    pub files: FileStore,
    pub max_upload_bytes: u64,
    pub strict_pdf_uploads: bool,
}

impl PortalState {
    pub fn new(storage: DocumentStorage, files: FileStore, cfg: &Config) -> Self {
        Self {
            storage,
            files,
            max_upload_bytes: cfg.max_upload_bytes,
            strict_pdf_uploads: cfg.strict_pdf_uploads,
        }
    }
}

pub fn portal_router(state: PortalState) -> Router {
    let body_limit = usize::try_from(state.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(index))
        .route("/documents", get(list_documents))
        .route(
            "/documents/upload",
            post(upload_document).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/documents/{id}", get(get_document).delete(delete_document))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
