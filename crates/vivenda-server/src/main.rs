mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(vivenda_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = vivenda_db::PoolConfig::from_env();
    let pool = vivenda_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = vivenda_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied pending migrations");
    }

    let ai = Arc::new(vivenda_ai::ProviderClient::new(
        &config.ai_base_url,
        config.ai_api_key.clone(),
        &config.ai_model,
        config.ai_request_timeout_secs,
    )?);
    if config.whatsapp_token.is_none() {
        tracing::warn!("VIVENDA_WHATSAPP_TOKEN not set; follow-up sends will fail until configured");
    }
    let whatsapp = Arc::new(vivenda_whatsapp::WhatsappClient::with_base_url(
        config.whatsapp_token.as_deref().unwrap_or_default(),
        config.whatsapp_request_timeout_secs,
        config.whatsapp_max_retries,
        config.whatsapp_retry_backoff_base_ms,
        &config.whatsapp_base_url,
    )?);

    let _scheduler = scheduler::build_scheduler(
        pool.clone(),
        Arc::clone(&config),
        Arc::clone(&ai),
        whatsapp,
    )
    .await?;

    let app = build_app(
        AppState {
            pool,
            ai,
            site_origin: config.site_origin.clone(),
        },
        default_rate_limit_state(),
    );

    tracing::info!(addr = %config.bind_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
