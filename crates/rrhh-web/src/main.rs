use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod access;
mod application;
mod config;
mod error;
mod forms;
mod login;
mod routes;
mod users;
mod workers;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let config = config::load().context("loading configuration")?;
    init_tracing(&config.tracing);
    let store = rrhh_db::create(&config.database);
    let app_state = AppState { store };
    let app = routes::setup(app_state, &config.session);
    let listener = tokio::net::TcpListener::bind((config.bind_address.as_str(), config.bind_port))
        .await
        .context("binding listener")?;
    tracing::info!(
        "listening on {}:{}",
        config.bind_address,
        config.bind_port
    );
    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));
    Ok(axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("serving application")?)
}

#[derive(Clone)]
struct AppState {
    store: rrhh_db::Store,
}

fn init_tracing(config: &config::TracingConfig) {
    if config.console {
        console_subscriber::init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter)),
            )
            .init();
    }
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(err) => tracing::error!("unable to listen for shutdown signal: {err}"),
    }
    shutdown.cancel();
}
