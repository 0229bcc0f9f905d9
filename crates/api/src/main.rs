use anyhow::{Context, Result};
use replybot_api::{build_app, AppConfig};
use replybot_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("replybot_api");

    let config = AppConfig::from_env();
    let bind = config.bind.clone();
    let classifier_url = config.classifier.base_url.clone();

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed binding {}", bind))?;
    tracing::info!(bind = %bind, classifier_url = %classifier_url, "replybot api started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed listening for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("replybot api shutting down");
}
