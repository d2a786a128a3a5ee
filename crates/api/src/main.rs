use std::sync::Arc;

use anyhow::Context;

use coffeeshop_api::app::{self, services};
use coffeeshop_api::config::ApiConfig;
use coffeeshop_auth::{HttpKeySetSource, JwksVerifier, VerifierConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    coffeeshop_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    let services = Arc::new(
        services::build_services(&config.store)
            .await
            .context("failed to initialize drink store")?,
    );

    let keys = HttpKeySetSource::for_domain(&config.auth.domain)
        .context("failed to build key-set client")?;
    tracing::info!(jwks = keys.url(), audience = %config.auth.audience, "verifying tokens");
    let verifier = Arc::new(JwksVerifier::new(
        keys,
        VerifierConfig::for_domain(
            &config.auth.domain,
            config.auth.audience.clone(),
            config.auth.algorithm,
        ),
    ));

    let router = app::build_app(services.clone(), verifier);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    services.shutdown().await;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
