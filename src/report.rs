use crate::catalog::reconcile::{ReconcilePlan, ReconcileSummary};
use crate::catalog::FileKey;
use crate::dedupe::QuarantineOutcome;
use crate::error::Error;
use crate::sync::SyncSummary;
use chrono::Local;
use colored::*;
use std::fs::{self, OpenOptions};
use std::path::Path;

const CSV_HEADERS: [&str; 8] = [
    "run_at",
    "mode",
    "year",
    "folder_name",
    "person",
    "copied",
    "quarantined",
    "conflicts",
];

fn mode(dry_run: bool) -> &'static str {
    if dry_run {
        "dry-run"
    } else {
        "apply"
    }
}

pub fn print_sync_summary(summary: &SyncSummary) {
    println!();
    println!("{} ({})", "Sync".bold(), mode(summary.dry_run));

    for person in &summary.persons {
        for outcome in &person.quarantine {
            match outcome {
                QuarantineOutcome::Moved { from, to } => {
                    println!("  {} {} -> {}", "quarantined".yellow(), from.display(), to.display())
                }
                QuarantineOutcome::WouldMove { from, to } => println!(
                    "  {} {} -> {}",
                    "would quarantine".yellow(),
                    from.display(),
                    to.display()
                ),
                QuarantineOutcome::Conflict { from, to } => println!(
                    "  {} {} and {} both exist, left in place",
                    "conflict".red(),
                    from.display(),
                    to.display()
                ),
                QuarantineOutcome::AlreadyQuarantined { .. } | QuarantineOutcome::Missing { .. } => {}
            }
        }
    }

    for line in &summary.copy_lines {
        println!("  {}", line);
    }

    for line in destination_lines(summary) {
        println!("  {}", line);
    }

    for failure in &summary.failures {
        println!(
            "  {} {}/{}: {}",
            "failed".red(),
            failure.year,
            failure.folder_name,
            failure.error
        );
    }

    println!(
        "  {} copied, {} quarantined, {} conflicts, {} failures",
        summary.copied().to_string().green(),
        summary.demoted().to_string().yellow(),
        summary.conflicts().to_string().red(),
        summary.failures.len().to_string().red(),
    );
}

fn describe(key: &FileKey) -> String {
    let mut parts = vec![key.folder.project_year.to_string()];
    if let Some(folder) = &key.folder.folder_name {
        parts.push(folder.clone());
    }
    if let Some(sub) = &key.subfolder {
        parts.push(sub.clone());
    }
    parts.push(key.file_name.clone());
    parts.join("/")
}

/// Lists every write a catalog plan contains.
pub fn print_catalog_plan(plan: &ReconcilePlan) {
    for key in &plan.stale_files {
        println!("  {} {}", "would purge file".red(), describe(key));
    }
    for folder in &plan.stale_folders {
        println!(
            "  {} {}/{}",
            "would purge folder".red(),
            folder.project_year,
            folder.folder_name.as_deref().unwrap_or("(year root)")
        );
    }
    for folder in &plan.new_folders {
        println!(
            "  {} {}/{}",
            "would add folder".green(),
            folder.project_year,
            folder.folder_name.as_deref().unwrap_or("(year root)")
        );
    }
    for record in &plan.changed_files {
        println!("  {} {}", "would write file".green(), describe(&record.key));
    }
}

pub fn print_catalog_summary(summary: &ReconcileSummary) {
    println!();
    println!("{} ({})", "Catalog".bold(), mode(summary.dry_run));
    let years: Vec<String> = summary.years.iter().map(|y| y.to_string()).collect();
    println!("  years: {}", years.join(", "));
    println!(
        "  {} files purged, {} folders purged, {} folders added, {} files written, {} unchanged",
        summary.purged_files.to_string().red(),
        summary.purged_folders.to_string().red(),
        summary.added_folders.to_string().green(),
        summary.written_files.to_string().green(),
        summary.unchanged_files,
    );
}

/// Missing person folders, split by whether the pass created them. A folder
/// with nothing to copy stays missing.
fn destination_lines(summary: &SyncSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if summary.missing_destinations.is_empty() {
        return lines;
    }

    let created_note = if summary.dry_run {
        "will be created on --apply"
    } else {
        "created"
    };
    if !summary.created_destinations.is_empty() {
        lines.push(format!(
            "{} person folder(s) missing locally, {}:",
            summary.created_destinations.len().to_string().cyan(),
            created_note
        ));
        for path in &summary.created_destinations {
            lines.push(format!("  {}", path.display()));
        }
    }

    let untouched: Vec<_> = summary
        .missing_destinations
        .iter()
        .filter(|path| !summary.created_destinations.contains(*path))
        .collect();
    if !untouched.is_empty() {
        lines.push(format!(
            "{} person folder(s) missing locally, nothing to copy:",
            untouched.len().to_string().cyan()
        ));
        for path in untouched {
            lines.push(format!("  {}", path.display()));
        }
    }
    lines
}

/// Append one row per person folder to `filename`, writing the header when
/// the file is new.
pub fn append_sync_csv(summary: &SyncSummary, filename: &Path) -> Result<(), Error> {
    let file_exists = fs::metadata(filename).is_ok();
    if let Some(parent) = filename.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().append(true).create(true).open(filename)?;
    let mut wtr = csv::Writer::from_writer(file);
    if !file_exists {
        wtr.write_record(CSV_HEADERS)?;
    }

    let run_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    for person in &summary.persons {
        wtr.write_record(&[
            run_at.clone(),
            mode(summary.dry_run).to_string(),
            person.year.to_string(),
            person.folder_name.clone(),
            person.person_name.clone(),
            person.copied.to_string(),
            person.demoted().to_string(),
            person.conflicts().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
