use std::sync::Arc;

use anyhow::Context;
use catalog_server::config::AppConfig;
use catalog_server::state::AppState;
use catalog_server::{build_router, database, seed};
use common::storage::filesystem::FilesystemDisk;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        storage = %config.storage.root.display(),
        "Configuration loaded"
    );

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    seed::seed_categories(&db)
        .await
        .context("Failed to seed categories")?;
    seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;

    let disk = FilesystemDisk::new(
        config.storage.disk_root(),
        config.storage.max_import_bytes(),
    )
    .await
    .context("Failed to prepare storage disk")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        disk: Arc::new(disk),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
