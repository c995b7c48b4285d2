pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use anyhow::Context;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::services::notifications::ResultNotifier;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load().context("Failed to load settings")?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await.context("Failed to connect to database")?;
    db::run_migrations(&db_pool).await.context("Failed to run migrations")?;

    let notifier = ResultNotifier::from_settings(&settings)?;
    if !notifier.enabled() {
        tracing::info!("NOTIFY_WEBHOOK_URL not configured; result notifications disabled");
    }

    let state = AppState::new(settings, db_pool, notifier);

    if let Err(err) = core::bootstrap::ensure_superuser(&state).await {
        tracing::error!(error = %err, "Failed to ensure default superuser");
    }
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr())
        .await
        .with_context(|| format!("Failed to bind {}", state.settings().server_addr()))?;

    tracing::info!(
        host = %state.settings().server().host,
        port = state.settings().server().port,
        environment = %state.settings().runtime().environment.as_str(),
        "Exam portal API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    state.db().close().await;
    tracing::info!("Database pool closed");

    Ok(())
}
