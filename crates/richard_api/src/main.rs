//! `richard-api` server binary.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use richard_api::{build_router, AppState, DatabaseTarget, ServerConfig};
use richard_core::{init_logging, open_db, open_db_in_memory, TokenCodec};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::parse();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("richard-api: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> Result<()> {
    config.validate()?;
    init_logging(config.log_level(), config.log_dir.as_deref())?;

    let conn = match config.database_target()? {
        DatabaseTarget::Memory => open_db_in_memory(),
        DatabaseTarget::File(path) => open_db(&path),
    }
    .context("failed to open database")?;

    let state = AppState::new(conn, TokenCodec::new(&config.jwt_secret_key));
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!(
        "event=server_start module=api status=ok bind={} version={}",
        config.bind,
        env!("CARGO_PKG_VERSION")
    );
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("event=server_stop module=api status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
