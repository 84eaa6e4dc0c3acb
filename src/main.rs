use std::sync::Arc;

use account_auth::config::Configuration;
use account_auth::{app, initialize_state, spawn_reconciliation, telemetry};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // read configuration file. let it in memory.
    let config = telemetry::bootstrap(|| {
        Configuration::default()
            .path(std::env::var("CONFIG_PATH").unwrap_or_default().into())
            .read()
    })?;

    let guard = telemetry::init(&config.telemetry)?;

    let state = initialize_state(Arc::clone(&config)).await?;
    let reconciliation = spawn_reconciliation(
        Arc::clone(&state.reconciler),
        config.reconciliation.interval_secs,
    );

    let listener = TcpListener::bind(&config.address).await?;
    tracing::info!(address = %config.address, "server listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = reconciliation {
        handle.abort();
    }
    guard.shutdown();

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            },
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
