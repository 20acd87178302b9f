use super::{CatalogStore, FileAttrs, FileKey, FileRecord, FolderRecord};
use crate::classify::FileKind;
use crate::error::Error;
use crate::media::{self, MediaInfo};
use crate::platform::Availability;
use crate::progress::ProgressReporter;
use crate::scanner::{FileDescriptor, Scanner};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Set difference between what the catalog knows and what a scan found.
/// `fresh` is the full scanned set; it is never narrowed to "new only".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff<K: Ord> {
    pub stale: BTreeSet<K>,
    pub fresh: BTreeSet<K>,
}

pub fn diff<K: Ord + Clone>(known: &BTreeSet<K>, scanned: &BTreeSet<K>) -> Diff<K> {
    Diff {
        stale: known.difference(scanned).cloned().collect(),
        fresh: scanned.clone(),
    }
}

/// A file found on disk, with the attributes compared against the catalog.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub attrs: FileAttrs,
}

/// Everything found under one local year folder.
#[derive(Debug, Default)]
pub struct YearScan {
    pub year: i32,
    pub folders: BTreeSet<FolderRecord>,
    pub files: BTreeMap<FileKey, ScannedFile>,
}

/// Writes one reconciliation would perform.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    pub years: Vec<i32>,
    pub stale_files: BTreeSet<FileKey>,
    pub stale_folders: BTreeSet<FolderRecord>,
    /// Scanned folders the catalog does not have yet.
    pub new_folders: Vec<FolderRecord>,
    /// Scanned files that are new or whose attributes differ from the catalog.
    pub changed_files: Vec<FileRecord>,
    pub unchanged_files: usize,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.stale_files.is_empty()
            && self.stale_folders.is_empty()
            && self.new_folders.is_empty()
            && self.changed_files.is_empty()
    }

    pub fn writes(&self) -> usize {
        self.stale_files.len()
            + self.stale_folders.len()
            + self.new_folders.len()
            + self.changed_files.len()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub dry_run: bool,
    pub years: Vec<i32>,
    pub purged_files: usize,
    pub purged_folders: usize,
    pub added_folders: usize,
    pub written_files: usize,
    pub unchanged_files: usize,
}

impl ReconcileSummary {
    pub fn writes(&self) -> usize {
        self.purged_files + self.purged_folders + self.added_folders + self.written_files
    }
}

/// Stale files have been removed from the catalog, so folders may be.
/// Only `CatalogReconciler::purge_files` creates one.
#[derive(Debug)]
pub struct FilesPurged {
    _private: (),
}

/// Brings the catalog in line with the local tree.
pub struct CatalogReconciler<'a, S: CatalogStore> {
    store: &'a mut S,
    scanner: Scanner,
    media_type: String,
    dry_run: bool,
}

impl<'a, S: CatalogStore> CatalogReconciler<'a, S> {
    pub fn new(store: &'a mut S, scanner: Scanner, media_type: &str, dry_run: bool) -> Self {
        Self {
            store,
            scanner,
            media_type: media_type.to_string(),
            dry_run,
        }
    }

    fn kind(&self) -> FileKind {
        match self.media_type.as_str() {
            "project" => FileKind::Project,
            _ => FileKind::Video,
        }
    }

    /// Scan one local year folder: loose files in the year root (not
    /// descending) belong to the `None` folder, person folders are walked
    /// recursively.
    pub fn scan_year(&self, year: i32, year_dir: &Path) -> Result<YearScan, Error> {
        let mut scan = YearScan {
            year,
            ..Default::default()
        };
        let kind = self.kind();

        let loose = self.scanner.media_files(year_dir, kind, false)?;
        if !loose.is_empty() {
            let root = FolderRecord::new(None, year, &self.media_type);
            for file in loose {
                scan.files.insert(
                    FileKey {
                        folder: root.clone(),
                        subfolder: None,
                        file_name: file.file_name.clone(),
                    },
                    scanned(&file),
                );
            }
            scan.folders.insert(root);
        }

        for person_dir in self.scanner.person_folders(year_dir)? {
            let name = match person_dir.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };
            let folder = FolderRecord::new(Some(&name), year, &self.media_type);
            for file in self.scanner.media_files(&person_dir, kind, true)? {
                scan.files.insert(
                    FileKey {
                        folder: folder.clone(),
                        subfolder: subfolder_of(&person_dir, &file.parent),
                        file_name: file.file_name.clone(),
                    },
                    scanned(&file),
                );
            }
            scan.folders.insert(folder);
        }

        debug!(
            "Year {}: {} folders, {} files",
            year,
            scan.folders.len(),
            scan.files.len()
        );
        Ok(scan)
    }

    /// Compute the writes needed for `local_root`. Without a year filter the
    /// years covered are those on disk plus those already cataloged, so
    /// deleted year folders get purged too.
    pub fn plan(
        &mut self,
        local_root: &Path,
        year_filter: Option<i32>,
        reporter: &dyn ProgressReporter,
    ) -> Result<ReconcilePlan, Error> {
        let on_disk: BTreeMap<i32, PathBuf> = self
            .scanner
            .year_folders(local_root)?
            .into_iter()
            .filter(|(year, _)| year_filter.map_or(true, |y| y == *year))
            .collect();

        let known_folders: BTreeSet<FolderRecord> = self
            .store
            .fetch_known_folders(&self.media_type)?
            .into_iter()
            .filter(|f| year_filter.map_or(true, |y| y == f.project_year))
            .collect();

        let mut years: BTreeSet<i32> = on_disk.keys().copied().collect();
        years.extend(known_folders.iter().map(|f| f.project_year));
        if let Some(year) = year_filter {
            years.insert(year);
        }

        let mut plan = ReconcilePlan {
            years: years.iter().copied().collect(),
            ..Default::default()
        };
        let mut scanned_folders = BTreeSet::new();

        for year in years {
            reporter.on_catalog_year(year);
            let scan = match on_disk.get(&year) {
                Some(dir) => self.scan_year(year, dir)?,
                None => YearScan {
                    year,
                    ..Default::default()
                },
            };

            let known_files: BTreeMap<FileKey, FileRecord> = self
                .store
                .fetch_known_files(year, &self.media_type)?
                .into_iter()
                .map(|record| (record.key.clone(), record))
                .collect();

            let known_keys: BTreeSet<FileKey> = known_files.keys().cloned().collect();
            let scanned_keys: BTreeSet<FileKey> = scan.files.keys().cloned().collect();
            plan.stale_files.extend(diff(&known_keys, &scanned_keys).stale);

            for (key, file) in scan.files {
                let known = known_files.get(&key);
                let mut attrs = file.attrs;
                // a placeholder cannot be read, so its rating stays as cataloged
                if attrs.stored == Availability::CloudPlaceholder && attrs.rating.is_none() {
                    attrs.rating = known.and_then(|k| k.attrs.rating);
                }
                if known.map(|k| k.attrs) == Some(attrs) {
                    plan.unchanged_files += 1;
                    continue;
                }
                let media = match known {
                    Some(k) if k.attrs.file_size == attrs.file_size && k.media.is_known() => {
                        k.media.clone()
                    }
                    _ => media::read_media_info(&file.path, attrs.stored),
                };
                plan.changed_files.push(FileRecord { key, attrs, media });
            }
            scanned_folders.extend(scan.folders);
        }

        let folder_diff = diff(&known_folders, &scanned_folders);
        plan.new_folders = folder_diff
            .fresh
            .difference(&known_folders)
            .cloned()
            .collect();
        plan.stale_folders = folder_diff.stale;

        info!(
            "Catalog plan: {} stale files, {} stale folders, {} new folders, {} new or changed files",
            plan.stale_files.len(),
            plan.stale_folders.len(),
            plan.new_folders.len(),
            plan.changed_files.len()
        );
        Ok(plan)
    }

    pub fn purge_files(&mut self, stale: &BTreeSet<FileKey>) -> Result<(FilesPurged, usize), Error> {
        let keys: Vec<FileKey> = stale.iter().cloned().collect();
        let purged = if keys.is_empty() {
            0
        } else {
            self.store.delete_files(&keys)?
        };
        Ok((FilesPurged { _private: () }, purged))
    }

    pub fn purge_folders(
        &mut self,
        _files_purged: &FilesPurged,
        stale: &BTreeSet<FolderRecord>,
    ) -> Result<usize, Error> {
        let records: Vec<FolderRecord> = stale.iter().cloned().collect();
        if records.is_empty() {
            return Ok(0);
        }
        self.store.delete_folders(&records)
    }

    /// Apply a plan: purge stale files, purge stale folders, add folders,
    /// then write new or changed files. A dry run reports the same counts
    /// without writing.
    pub fn apply(&mut self, plan: &ReconcilePlan) -> Result<ReconcileSummary, Error> {
        let mut summary = ReconcileSummary {
            dry_run: self.dry_run,
            years: plan.years.clone(),
            unchanged_files: plan.unchanged_files,
            ..Default::default()
        };

        if self.dry_run {
            summary.purged_files = plan.stale_files.len();
            summary.purged_folders = plan.stale_folders.len();
            summary.added_folders = plan.new_folders.len();
            summary.written_files = plan.changed_files.len();
            return Ok(summary);
        }

        let (files_purged, purged) = self.purge_files(&plan.stale_files)?;
        summary.purged_files = purged;
        summary.purged_folders = self.purge_folders(&files_purged, &plan.stale_folders)?;
        if !plan.new_folders.is_empty() {
            summary.added_folders = self.store.upsert_folders(&plan.new_folders)?;
        }
        if !plan.changed_files.is_empty() {
            summary.written_files = self.store.upsert_files(&plan.changed_files)?;
        }
        Ok(summary)
    }

    pub fn reconcile(
        &mut self,
        local_root: &Path,
        year_filter: Option<i32>,
        reporter: &dyn ProgressReporter,
    ) -> Result<ReconcileSummary, Error> {
        let started = Instant::now();
        let plan = self.plan(local_root, year_filter, reporter)?;
        let summary = self.apply(&plan)?;
        reporter.on_catalog_complete(summary.writes(), started.elapsed().as_secs_f64());
        Ok(summary)
    }
}

fn scanned(file: &FileDescriptor) -> ScannedFile {
    ScannedFile {
        path: file.path.clone(),
        attrs: FileAttrs {
            file_size: file.size as i64,
            modified_secs: file.modified_secs(),
            stored: file.availability,
            rating: media::read_rating(&file.path, file.availability),
        },
    }
}

/// Path of `parent` below `person_dir`, `/`-joined; `None` directly inside.
fn subfolder_of(person_dir: &Path, parent: &Path) -> Option<String> {
    let relative = parent.strip_prefix(person_dir).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
