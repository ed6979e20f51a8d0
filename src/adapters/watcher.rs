use notify_debouncer_full::{
    DebounceEventResult, Debouncer, RecommendedCache, new_debouncer,
    notify::{EventKind, RecommendedWatcher, RecursiveMode, event::ModifyKind},
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Watches one folder and reports paths that were created, written or renamed.
///
/// Paths are de-duplicated within a debounce window, so a file that is created
/// and then written is reported once. The watcher stops when dropped.
pub struct FolderWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    folder: PathBuf,
}

impl std::fmt::Debug for FolderWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderWatcher").field("folder", &self.folder).finish_non_exhaustive()
    }
}

impl FolderWatcher {
    /// Starts watching `folder` and returns the watcher with a receiver of changed paths.
    ///
    /// # Errors
    /// Returns an error if the platform watcher cannot be created or the folder
    /// cannot be watched.
    pub fn start(folder: &Path, debounce: Duration) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<PathBuf>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| match result {
            Ok(events) => {
                let changed: BTreeSet<PathBuf> = events
                    .iter()
                    .filter(|event| is_ingestible(&event.kind))
                    .flat_map(|event| event.paths.iter().cloned())
                    .collect();

                for path in changed {
                    tracing::debug!(path = %path.display(), "Folder watcher event");
                    if tx.send(path).is_err() {
                        return;
                    }
                }
            }
            Err(errors) => {
                for e in errors {
                    tracing::error!(error = %e, "Failed getting folder event");
                }
            }
        })?;

        debouncer.watch(folder, RecursiveMode::NonRecursive)?;
        tracing::info!(folder = %folder.display(), debounce_ms = %debounce.as_millis(), "Watching folder");

        Ok((Self { _debouncer: debouncer, folder: folder.to_path_buf() }, rx))
    }
}

fn is_ingestible(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any)
    )
}
