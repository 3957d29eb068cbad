use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::info;

use quadbot::catalog::Catalog;
use quadbot::dialogue::{BookingLedger, DialogueEngine};
use quadbot::history::InMemoryTranscript;
use quadbot::occupancy::OccupancySimulator;
use quadbot::router::Assistant;
use quadbot::{refresh, wire};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("QUADBOT_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    quadbot::observability::init(metrics_port);

    let port = std::env::var("QUADBOT_PORT").unwrap_or_else(|_| "5050".into());
    let bind = std::env::var("QUADBOT_BIND").unwrap_or_else(|_| "0.0.0.0".into());
    let max_connections: usize = std::env::var("QUADBOT_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(256);

    let catalog = Arc::new(Catalog::new());
    let ledger = Arc::new(BookingLedger::new(catalog.clone()));
    let dialogue = Arc::new(DialogueEngine::new(catalog.clone(), ledger));
    let sim = Arc::new(OccupancySimulator::new(catalog));
    let assistant = Arc::new(Assistant::new(
        dialogue.clone(),
        sim.clone(),
        Arc::new(InMemoryTranscript::new()),
        None,
    ));
    let semaphore = Arc::new(Semaphore::new(max_connections));

    tokio::spawn(refresh::run_refresher(sim, dialogue));

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("quadbot listening on {addr}");
    info!("  max_connections: {max_connections}");
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    // Graceful shutdown: stop accepting on SIGTERM/ctrl-c, drain in-flight connections
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (socket, peer) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::error!("accept error: {e}");
                        continue;
                    }
                };

                let permit = match semaphore.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        tracing::warn!("connection limit reached, rejecting {peer}");
                        metrics::counter!(quadbot::observability::CONNECTIONS_REJECTED_TOTAL).increment(1);
                        drop(socket);
                        continue;
                    }
                };

                info!("connection from {peer}");
                metrics::counter!(quadbot::observability::CONNECTIONS_TOTAL).increment(1);
                metrics::gauge!(quadbot::observability::CONNECTIONS_ACTIVE).increment(1.0);
                let assistant = assistant.clone();

                tokio::spawn(async move {
                    let _permit = permit; // held until connection closes
                    if let Err(e) = wire::process_connection(socket, assistant).await {
                        tracing::error!("connection error from {peer}: {e}");
                    }
                    metrics::gauge!(quadbot::observability::CONNECTIONS_ACTIVE).decrement(1.0);
                });
            }
            _ = &mut shutdown => {
                info!("shutdown signal received, stopping accept loop");
                break;
            }
        }
    }

    // Wait for in-flight connections to finish (up to 10s)
    info!("draining connections...");
    let drain_deadline = tokio::time::sleep(std::time::Duration::from_secs(10));
    tokio::pin!(drain_deadline);

    loop {
        if semaphore.available_permits() == max_connections {
            info!("all connections drained");
            break;
        }
        tokio::select! {
            _ = &mut drain_deadline => {
                let remaining = max_connections - semaphore.available_permits();
                tracing::warn!("drain timeout, {remaining} connections still open");
                break;
            }
            _ = tokio::time::sleep(std::time::Duration::from_millis(100)) => {}
        }
    }

    info!("quadbot stopped");
    Ok(())
}
