use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{error, info, warn};
use visitbadge::BadgeService;
use visitbadge_store::CounterStore;
use visitbadge_server::{AppState, Config, ServerError, init_tracing, router};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = Config::load()?;
    init_tracing(config.server.debug);

    let store = config.store.connect()?;
    info!(store = store.name(), maintenance = config.server.maintenance, "Starting visitbadge");

    let service = BadgeService::from_config(store, config.store.timeout, &config.service())?;
    let state = AppState::new(service.clone(), config.key.secret.as_str())
        .with_timeouts(config.store.timeout, config.server.request_timeout);
    let app = router(state, config.server.maintenance);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    let stopping = Arc::new(Notify::new());
    let signal = Arc::clone(&stopping);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                signal.notify_one();
            })
            .await
    });

    tokio::select! {
        result = &mut server => return Ok(result??),
        _ = stopping.notified() => {}
    }

    let deadline = Instant::now() + config.server.shutdown_timeout;
    match tokio::time::timeout_at(deadline, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            warn!("Connections still open at shutdown deadline");
            server.abort();
        }
    }

    let abandoned = service
        .shutdown(deadline.saturating_duration_since(Instant::now()))
        .await;
    if abandoned > 0 {
        warn!(abandoned, "Abandoned pending resyncs");
    }
    info!("Stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                error!(%error, "Failed to listen for SIGTERM");
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
    info!("Signal received, starting graceful shutdown");
}
