pub mod folder_watch;

pub use folder_watch::{BatchFileHandler, FileOutcome, FolderWatchWorker};
