pub mod transport;
pub mod watcher;
