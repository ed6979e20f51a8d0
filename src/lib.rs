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

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;
pub mod workers;

use crate::adapters::transport::{LocalTransport, Transport};
use crate::config::Config;
use crate::services::delivery_service::DeliveryService;
use crate::services::ingest_service::IngestService;
use crate::services::parser::BatchParser;
use crate::workers::FolderWatchWorker;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Background tasks started next to the HTTP server.
#[derive(Debug, Default)]
pub struct Workers {
    pub folder_watch: Option<FolderWatchWorker>,
}

impl Workers {
    #[must_use]
    pub fn spawn_all(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        if let Some(worker) = self.folder_watch {
            handles.push(tokio::spawn(worker.run(shutdown_rx)));
        }
        handles
    }
}

#[derive(Debug)]
pub struct App {
    pub ingest_service: IngestService,
    pub workers: Workers,
}

#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, transport: None }
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Wires the services together and starts the folder watcher if the run mode needs it.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the watch folder
    /// cannot be watched.
    pub fn build(self) -> anyhow::Result<App> {
        self.config.validate()?;
        let transport = self.transport.unwrap_or_else(|| Arc::new(LocalTransport::new(&self.config.transport)));

        let parser = BatchParser::new(&self.config.parser);
        let delivery = DeliveryService::new(transport);
        let ingest_service = IngestService::new(parser, delivery, &self.config.delivery);

        let folder_watch = if self.config.mode.watches_folder() {
            Some(FolderWatchWorker::start(ingest_service.clone(), &self.config.watch)?)
        } else {
            None
        };

        Ok(App { ingest_service, workers: Workers { folder_watch } })
    }
}

/// Flips the shutdown channel on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                    tracing::error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach the configured log sink.
pub fn setup_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        tracing::error!(panic = %info, location = %location, "Process panicked");
        default_hook(info);
    }));
}
