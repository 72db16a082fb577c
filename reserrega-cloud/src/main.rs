use std::time::Duration;

use reserrega_cloud::api;
use reserrega_cloud::config::Config;
use reserrega_cloud::state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reserrega_cloud=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!(
        environment = %config.environment,
        multi_tenant = config.multi_tenant,
        billing_enabled = config.billing_enabled,
        "Starting reserrega-cloud"
    );
    if !config.environment.is_production() {
        tracing::warn!("Time-travel harness enabled under /api/dev");
    }

    let state = AppState::new(&config).await?;
    let app = api::create_router(state.clone());

    // Periodic rate limiter cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    // Hourly purge of revocations past their token expiry
    let store = state.store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match store.purge_revoked_sessions(shared::util::now_millis()).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(purged = n, "Expired session revocations purged"),
                Err(e) => tracing::warn!(error = %e, "Failed to purge session revocations"),
            }
        }
    });

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("reserrega-cloud HTTP listening on {http_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
