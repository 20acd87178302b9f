use crate::config::AppConfig;
use crate::copier::{FolderCopier, KnownNames};
use crate::dedupe::{DuplicateDetector, QuarantineOutcome, QuarantineStore};
use crate::error::Error;
use crate::mount::MirrorGuard;
use crate::progress::ProgressReporter;
use crate::scanner::Scanner;
use crate::{classify, shortcut};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Terminal state of one person folder.
#[derive(Debug, Clone)]
pub struct PersonOutcome {
    pub year: i32,
    pub folder_name: String,
    pub person_name: String,
    pub copied: usize,
    pub quarantine: Vec<QuarantineOutcome>,
}

impl PersonOutcome {
    pub fn demoted(&self) -> usize {
        self.quarantine.iter().filter(|q| q.is_demotion()).count()
    }

    pub fn conflicts(&self) -> usize {
        self.quarantine.iter().filter(|q| q.is_conflict()).count()
    }
}

/// A person (or year) folder that could not be processed.
#[derive(Debug, Clone)]
pub struct UnitFailure {
    pub year: i32,
    pub folder_name: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct SyncSummary {
    pub dry_run: bool,
    pub persons: Vec<PersonOutcome>,
    pub failures: Vec<UnitFailure>,
    /// Local person folders that did not exist when the pass reached them.
    pub missing_destinations: Vec<PathBuf>,
    /// The missing folders that received (or in a dry run, would receive) a
    /// copy. Folders are only created by copying into them.
    pub created_destinations: Vec<PathBuf>,
    pub copy_lines: Vec<String>,
}

impl SyncSummary {
    pub fn copied(&self) -> usize {
        self.persons.iter().map(|p| p.copied).sum()
    }

    pub fn demoted(&self) -> usize {
        self.persons.iter().map(PersonOutcome::demoted).sum()
    }

    pub fn conflicts(&self) -> usize {
        self.persons.iter().map(PersonOutcome::conflicts).sum()
    }
}

/// Drives one mirror-to-local pass: for every `year/person` folder of the
/// remote mirror, demote near-duplicates into quarantine and copy whatever
/// the local tree does not have yet.
pub struct SyncOrchestrator {
    config: AppConfig,
    dry_run: bool,
    scanner: Scanner,
    detector: DuplicateDetector,
    quarantine: QuarantineStore,
    guard: MirrorGuard,
}

impl SyncOrchestrator {
    pub fn new(config: AppConfig, dry_run: bool) -> Self {
        let scanner = Scanner::new(&config.ignore_patterns);
        let detector = DuplicateDetector::new(config.byte_threshold);
        let quarantine = QuarantineStore::new(config.quarantine_root(), &config.remote_root);
        let guard = MirrorGuard::new(&config.remote_root, config.mount.clone());
        Self {
            config,
            dry_run,
            scanner,
            detector,
            quarantine,
            guard,
        }
    }

    /// Run the pass. Only a missing mirror aborts; every other failure is
    /// confined to the person folder it happened in and recorded in the
    /// summary.
    pub fn run(
        &self,
        year_filter: Option<i32>,
        reporter: &dyn ProgressReporter,
    ) -> Result<SyncSummary, Error> {
        self.guard.ensure()?;

        let started = Instant::now();
        let mut summary = SyncSummary {
            dry_run: self.dry_run,
            ..Default::default()
        };
        let mut copier = FolderCopier::new(self.dry_run);
        let mut destinations = Vec::new();

        let years: Vec<(i32, PathBuf)> = self
            .scanner
            .year_folders(&self.config.remote_root)?
            .into_iter()
            .filter(|(year, _)| year_filter.map_or(true, |y| y == *year))
            .collect();
        if let (Some(year), true) = (year_filter, years.is_empty()) {
            warn!("No year folder {} under {}", year, self.config.remote_root.display());
        }
        reporter.on_sync_start(years.len());

        for (year, remote_year) in &years {
            info!("Syncing {}", remote_year.display());
            let local_year = self.config.local_root.join(year.to_string());

            let entries = match self.scanner.person_entries(remote_year) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!("Cannot read {}: {}", remote_year.display(), err);
                    summary.failures.push(UnitFailure {
                        year: *year,
                        folder_name: year.to_string(),
                        error: err.to_string(),
                    });
                    continue;
                }
            };

            for entry in entries {
                let folder_name = shortcut::entry_name(&entry);
                let destination = local_year.join(&folder_name);
                reporter.on_person_start(*year, &folder_name);
                if let Some(suffix) = classify::folder_year(&folder_name) {
                    if suffix != *year {
                        warn!("{} sits under year folder {}", folder_name, year);
                    }
                }

                if !destination.exists() {
                    summary.missing_destinations.push(destination.clone());
                }

                match self.sync_person(*year, &entry, &folder_name, &destination, &mut copier) {
                    Ok(outcome) => {
                        reporter.on_person_complete(*year, &folder_name, outcome.copied);
                        summary.persons.push(outcome);
                    }
                    Err(err) => {
                        warn!("Skipping {}: {}", entry.display(), err);
                        reporter.on_person_complete(*year, &folder_name, 0);
                        summary.failures.push(UnitFailure {
                            year: *year,
                            folder_name: folder_name.clone(),
                            error: err.to_string(),
                        });
                    }
                }
                destinations.push(destination);
            }
        }

        summary.created_destinations = summary
            .missing_destinations
            .iter()
            .filter(|dest| copier.count_for(dest) > 0)
            .cloned()
            .collect();
        summary.copy_lines = copier.summary_lines(&destinations);
        reporter.on_sync_complete(summary.copied(), started.elapsed().as_secs_f64());
        Ok(summary)
    }

    fn sync_person(
        &self,
        year: i32,
        entry: &Path,
        folder_name: &str,
        destination: &Path,
        copier: &mut FolderCopier,
    ) -> Result<PersonOutcome, Error> {
        let source = shortcut::resolve_folder(entry)?.ok_or_else(|| Error::Shortcut {
            path: entry.to_path_buf(),
            reason: "not a folder".to_string(),
        })?;
        if source != entry {
            debug!("{} resolves to {}", entry.display(), source.display());
        }

        let videos = self.scanner.videos(&source, false)?;
        let losers = self.detector.losers(&videos);
        let mut quarantine = Vec::with_capacity(losers.len());
        for loser in &losers {
            quarantine.push(self.quarantine.move_file(loser, self.dry_run)?);
        }

        // Shortcut targets outside the mirror quarantine under their own
        // path, so both quarantine folders count as known.
        let relative = Path::new(&year.to_string()).join(folder_name);
        let mut known = KnownNames::gather(&[
            destination.to_path_buf(),
            self.quarantine.mirror_of(&relative),
            self.quarantine.folder_target(&source),
        ])?;

        let mut copied = 0;
        for video in videos.iter().filter(|v| !losers.contains(&v.path)) {
            if copier.copy_if_needed(video, destination, &mut known)? {
                copied += 1;
            }
        }

        Ok(PersonOutcome {
            year,
            folder_name: folder_name.to_string(),
            person_name: classify::person_name(folder_name),
            copied,
            quarantine,
        })
    }
}
