/// Trait for reporting pass progress.
///
/// The CLI implements it with indicatif; tests use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait ProgressReporter {
    fn on_sync_start(&self, _years: usize) {}
    fn on_person_start(&self, _year: i32, _folder_name: &str) {}
    fn on_person_complete(&self, _year: i32, _folder_name: &str, _copied: usize) {}
    fn on_sync_complete(&self, _copied: usize, _duration_secs: f64) {}
    fn on_catalog_year(&self, _year: i32) {}
    fn on_catalog_complete(&self, _writes: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
