use certifier::{config, routes, state};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certifier=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;

    tracing::info!(
        roster = %config.roster_path.display(),
        template = %config.template_path.display(),
        font = %config.font_path.display(),
        roster_ttl_secs = config.roster_ttl.as_secs(),
        "Certificate assets configured"
    );

    let state = Arc::new(state::AppState::from_config(&config));
    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Certifier listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
