use std::time::Duration;

use tracing::{info, warn};

use gondola_core::GondolaConfig;
use gondola_server::{app_with_state, state::AppState, telemetry};
use gondola_session::SweepHandle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine; real environment variables still apply
    let _ = dotenvy::dotenv();
    telemetry::init_tracing()?;

    let config = GondolaConfig::from_env()?;
    let addr = config.bind_addr();
    let sweep_every = Duration::from_secs(config.session.sweep_interval_secs);
    info!(
        environment = %config.server.environment,
        model = %config.ollama.model,
        embedding_model = %config.ollama.embedding_model,
        "starting gondola server"
    );

    let state = AppState::from_config(config)?;

    match state.chat.generator().probe().await {
        Ok(status) => info!(version = %status.version, model = %status.model, "generation backend reachable"),
        Err(e) => warn!(error = %e, "generation backend not reachable, chat will fail until it is"),
    }
    match state.knowledge.load_from_disk().await {
        Ok(true) => info!(chunks = state.knowledge.handle().document_count(), "retrieval enabled"),
        Ok(false) => warn!("no vector store found; upload documents or call /api/documents/setup"),
        Err(e) => warn!(error = %e, "vector store could not be loaded, retrieval disabled"),
    }

    let sweeper = SweepHandle::spawn(state.chat.sessions().clone(), sweep_every);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app_with_state(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    info!("server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
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
    info!("shutdown signal received");
}
