use std::net::SocketAddr;
use std::process::ExitCode;

use snapvoca_backend::config::Config;
use snapvoca_backend::db::DatabaseProxy;
use snapvoca_backend::state::AppState;
use snapvoca_backend::{create_app, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = logging::init_tracing(&logging::LogSettings::from_env(&config.log_level));

    let db_proxy = match DatabaseProxy::connect(&config.database).await {
        Ok(proxy) => proxy,
        Err(err) => {
            tracing::error!(error = %err, url = %config.database.url, "database initialization failed");
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::from_config(&config, db_proxy) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "service initialization failed");
            return ExitCode::FAILURE;
        }
    };

    let app = create_app(state);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "bind listener failed");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%addr, "snapvoca backend listening");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        tracing::error!(error = %err, "server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Graceful shutdown complete");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
