use anyhow::Context;
use tokio::net::TcpListener;

use companies_api::app::{build_app, services};
use companies_api::config::Config;

#[tokio::main]
async fn main() {
    companies_observability::init();

    if let Err(e) = run().await {
        tracing::error!(error = %format!("{e:#}"), "fatal startup error");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    let pool = services::connect(&config)
        .await
        .context("cannot connect to document store")?;
    let app = build_app(pool);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
