use std::sync::Arc;

use anyhow::Context;

use tollgate_auth::AuthConfig;
use tollgate_infra::{CachedParser, JwtParser};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tollgate_observability::init();

    let config = AuthConfig::from_env().context("reading TOLLGATE_* configuration")?;
    anyhow::ensure!(!config.public_key.is_empty(), "TOLLGATE_PUBLIC_KEY must be set");
    if config.fetcher_url.is_none() {
        tracing::warn!("TOLLGATE_FETCHER_URL not set; reduced tokens will be rejected");
    }
    let parser = CachedParser::new(JwtParser::from_config(config)?);

    let app = tollgate_api::app::build_app(Arc::new(parser));

    let addr = std::env::var("TOLLGATE_LISTEN").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
