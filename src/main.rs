//! Financial news sentiment service: binary entrypoint.
//! Boots the Axum HTTP server with the pipeline runner and session state.

use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    financial_news_sentiment::init_tracing();

    let settings = financial_news_sentiment::config::AppSettings::from_env()?;
    let router = financial_news_sentiment::app()?;

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.bind_addr))?;
    info!(addr = %settings.bind_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("http server")?;
    Ok(())
}
