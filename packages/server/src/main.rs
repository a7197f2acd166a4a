use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::document::TextCertificateRenderer;
use common::qr::QrCodeEncoder;
use tracing::info;
use tracing_subscriber::EnvFilter;

use registrar::config::AppConfig;
use registrar::state::AppState;
use registrar::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    seed::seed_role_permissions(&db)
        .await
        .context("Failed to seed roles")?;
    seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;
    seed::ensure_bootstrap_admin(&db, &config.seed)
        .await
        .context("Failed to create bootstrap administrator")?;

    let mailer =
        common::mail::from_config(&config.mail).context("Failed to configure mail transport")?;
    let state = AppState {
        db,
        mailer,
        qr: Arc::new(QrCodeEncoder::default()),
        renderer: Arc::new(TextCertificateRenderer::new(config.mail.site_name.clone())),
        config: config.clone(),
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;
    info!("Server running at http://{}", addr);
    info!("API docs at http://{}/scalar", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
