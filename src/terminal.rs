use crossterm::{cursor, execute};
use indicatif::{ProgressBar, ProgressStyle};
use reel_sync::ProgressReporter;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

pub fn hide_cursor() {
    let _ = execute!(io::stdout(), cursor::Hide);
}

pub fn show_cursor() {
    let _ = execute!(io::stdout(), cursor::Show);
}

pub fn is_interactive() -> bool {
    console::Term::stdout().is_term()
}

/// Spinner per person folder during sync and per year during catalog
/// reconciliation.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn spinner(&self, message: String) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn finish(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_sync_start(&self, years: usize) {
        self.spinner(format!("Syncing {} year folder(s)...", years));
    }

    fn on_person_start(&self, year: i32, folder_name: &str) {
        self.spinner(format!("{}/{}", year, folder_name));
    }

    fn on_sync_complete(&self, copied: usize, duration_secs: f64) {
        self.finish();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Sync complete: {} video(s) in {:.2}s",
            copied, duration_secs
        );
    }

    fn on_catalog_year(&self, year: i32) {
        self.spinner(format!("Cataloging {}...", year));
    }

    fn on_catalog_complete(&self, writes: usize, duration_secs: f64) {
        self.finish();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Catalog complete: {} write(s) in {:.2}s",
            writes, duration_secs
        );
    }
}
