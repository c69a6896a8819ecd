use doc_portal::db::{self, DocumentStorage};
use doc_portal::router::{PortalState, portal_router};
use doc_portal::service::FileStore;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &doc_portal::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        upload_dir = %cfg.upload_dir.display(),
        max_upload_bytes = cfg.max_upload_bytes,
        strict_pdf_uploads = cfg.strict_pdf_uploads,
        loglevel = %cfg.loglevel
    );

    let pool = db::connect(&cfg.database_url).await?;
    let storage = DocumentStorage::new(pool);
    storage.init_schema().await?;
    info!("database initialized (checked `documents` table)");

    let files = FileStore::new(&cfg.upload_dir);
    files.ensure_root().await?;
    info!(path = %files.root().display(), "upload directory ready");

    let state = PortalState::new(storage, files, cfg);
    let app = portal_router(state);

    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
