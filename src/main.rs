#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use std::net::SocketAddr;
use tokio::sync::watch;
use tracing::Instrument;
use zapdrop::config::Config;
use zapdrop::{AppBuilder, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    zapdrop::setup_panic_hook();
    config.validate()?;

    let boot_span = tracing::info_span!("boot_server", mode = ?config.mode);
    let (api_listener, app_router, shutdown_tx, shutdown_rx, workers) = async {
        // Phase 1: Shutdown wiring
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        zapdrop::spawn_signal_handler(shutdown_tx.clone());

        // Phase 2: Component wiring (starts the folder watcher when enabled)
        let app = AppBuilder::new(config.clone()).build()?;

        // Phase 3: HTTP listener
        let (api_listener, app_router) = if config.mode.serves_http() {
            let api_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
            let listener = tokio::net::TcpListener::bind(api_addr).await?;
            tracing::info!(address = %api_addr, "listening");
            (Some(listener), Some(zapdrop::api::app_router(&config, app.ingest_service)))
        } else {
            (None, None)
        };

        Ok::<_, anyhow::Error>((api_listener, app_router, shutdown_tx, shutdown_rx, app.workers))
    }
    .instrument(boot_span)
    .await?;

    // Phase 4: Start runtime
    let worker_tasks = workers.spawn_all(shutdown_rx.clone());

    if let (Some(listener), Some(router)) = (api_listener, app_router) {
        let mut api_rx = shutdown_rx.clone();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = api_rx.wait_for(|&s| s).await;
        });

        if let Err(e) = api_server.await {
            tracing::error!(error = %e, "Server error");
        }
    } else {
        let mut rx = shutdown_rx.clone();
        let _ = rx.wait_for(|&s| s).await;
    }

    // Phase 5: Graceful shutdown
    let _ = shutdown_tx.send(true);
    tokio::select! {
        () = async {
            futures::future::join_all(worker_tasks).await;
        } => {
            tracing::info!("Background tasks finished.");
        }
        () = tokio::time::sleep(std::time::Duration::from_secs(config.server.shutdown_timeout_secs)) => {
            tracing::warn!("Timeout waiting for background tasks to finish.");
        }
    }

    telemetry_guard.shutdown();
    Ok(())
}
