use crate::adapters::watcher::FolderWatcher;
use crate::config::WatchConfig;
use crate::services::delivery_service::DeliveryReport;
use crate::services::ingest_service::IngestService;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Directories and paths that no longer exist.
    Ignored,
    /// Zero-byte files.
    Empty,
    Delivered(DeliveryReport),
    Failed,
}

/// Delivers the contents of one batch file.
#[derive(Debug, Clone)]
pub struct BatchFileHandler {
    ingest: IngestService,
    remove_on_send: bool,
}

impl BatchFileHandler {
    #[must_use]
    pub const fn new(ingest: IngestService, remove_on_send: bool) -> Self {
        Self { ingest, remove_on_send }
    }

    /// Reads the file, delivers it using its extension as the format hint and,
    /// if configured, deletes it after a successful delivery. Failures are
    /// logged, never retried.
    pub async fn handle_path(&self, path: &Path) -> FileOutcome {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!(error = %e, "File is gone before it could be read");
                return FileOutcome::Ignored;
            }
        };
        if metadata.is_dir() {
            return FileOutcome::Ignored;
        }
        if metadata.len() == 0 {
            tracing::warn!("File content is empty");
            return FileOutcome::Empty;
        }

        let body = match tokio::fs::read(path).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Error reading file");
                return FileOutcome::Failed;
            }
        };

        let hint = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
        match self.ingest.ingest(hint, &body).await {
            Ok(report) => {
                if self.remove_on_send
                    && let Err(e) = tokio::fs::remove_file(path).await
                {
                    tracing::warn!(error = %e, "Could not delete the file upon send");
                }
                FileOutcome::Delivered(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error delivering batch file");
                FileOutcome::Failed
            }
        }
    }
}

/// Turns filesystem events in the watched folder into deliveries, one task per file.
#[derive(Debug)]
pub struct FolderWatchWorker {
    handler: BatchFileHandler,
    watcher: FolderWatcher,
    events: mpsc::UnboundedReceiver<PathBuf>,
}

impl FolderWatchWorker {
    /// Starts watching the configured folder.
    ///
    /// # Errors
    /// Returns an error if no folder is configured or it cannot be watched.
    pub fn start(ingest: IngestService, config: &WatchConfig) -> anyhow::Result<Self> {
        let folder = config.folder.as_deref().context("no watch folder configured")?;
        let (watcher, events) = FolderWatcher::start(folder, Duration::from_millis(config.debounce_ms))
            .with_context(|| format!("Error adding folder {} to watch", folder.display()))?;

        Ok(Self { handler: BatchFileHandler::new(ingest, config.remove_on_send), watcher, events })
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Folder watch worker started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,

                event = self.events.recv() => {
                    let Some(path) = event else {
                        tracing::error!("Folder event stream closed, worker exiting");
                        break;
                    };

                    let handler = self.handler.clone();
                    let span = tracing::info_span!("batch_file", path = %path.display());
                    tokio::spawn(async move {
                        handler.handle_path(&path).await;
                    }.instrument(span));
                }
            }
        }

        drop(self.watcher);
        tracing::info!("Folder watch worker shutting down...");
    }
}
