pub mod documents;

/// GET / -> liveness banner.
pub async fn index() -> &'static str {
    "Document Portal API is running..."
}
