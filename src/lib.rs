pub mod catalog;
pub mod classify;
pub mod config;
pub mod copier;
pub mod dedupe;
pub mod error;
pub mod media;
pub mod mount;
pub mod platform;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod shortcut;
pub mod sync;

pub use catalog::{CatalogReconciler, CatalogStore, ReconcileSummary, SqliteCatalog};
pub use config::AppConfig;
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use sync::{SyncOrchestrator, SyncSummary};
