pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod domain;
pub(crate) mod schemas;
pub(crate) mod store;

#[cfg(test)]
mod test_support;

use axum::extract::Request;
use axum::ServiceExt;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::store::{postgres, Repositories};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    let pool = postgres::init_pool(&settings).await?;
    postgres::run_migrations(&pool).await?;

    let store = Repositories::postgres(pool);
    let state = AppState::new(settings, store);

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(addr = %state.settings().server_addr(), "QuizDeck API listening");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(core::shutdown::shutdown_signal())
        .await?;

    Ok(())
}
