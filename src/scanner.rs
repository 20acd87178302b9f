use crate::classify::{self, FileKind};
use crate::platform::{self, Availability};
use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error};
use walkdir::WalkDir;

/// Snapshot of one file taken at scan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub file_name: String,
    pub extension: String,
    pub size: u64,
    pub modified: SystemTime,
    pub parent: PathBuf,
    pub availability: Availability,
}

impl FileDescriptor {
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified().unwrap_or(UNIX_EPOCH);

        Ok(FileDescriptor {
            path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default(),
            size: metadata.len(),
            modified,
            parent: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            availability: platform::availability(path, &metadata),
        })
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.file_name,
        }
    }

    pub fn depth(&self) -> usize {
        self.path.components().count()
    }

    pub fn modified_secs(&self) -> i64 {
        self.modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Lists the `year/person/*` hierarchy under a root, skipping anything that
/// matches one of the configured glob ignore patterns.
#[derive(Debug, Default)]
pub struct Scanner {
    ignore: Vec<Pattern>,
}

impl Scanner {
    pub fn new(ignore_globs: &[String]) -> Self {
        let ignore = ignore_globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        Scanner { ignore }
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.iter().any(|pattern| pattern.matches_path(path))
    }

    /// Four-digit year folders directly under `root`, ascending. A missing root
    /// yields no years.
    pub fn year_folders(&self, root: &Path) -> io::Result<Vec<(i32, PathBuf)>> {
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut years = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if !classify::is_year_folder(&name) || !path.is_dir() || self.is_ignored(&path) {
                continue;
            }
            if let Ok(year) = name.parse::<i32>() {
                years.push((year, path));
            }
        }
        years.sort();
        Ok(years)
    }

    /// Entries of a year folder that may stand for a person folder: directories,
    /// symlinks and shell links. Sorted case-insensitively by name.
    pub fn person_entries(&self, year_dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(year_dir)? {
            let entry = entry?;
            let path = entry.path();
            if self.is_ignored(&path) {
                continue;
            }
            let file_type = entry.file_type()?;
            if file_type.is_dir()
                || file_type.is_symlink()
                || classify::classify_name(&path) == FileKind::Shortcut
            {
                entries.push(path);
            }
        }
        sort_paths(&mut entries);
        Ok(entries)
    }

    /// Real (non-shortcut) person folders of a year folder.
    pub fn person_folders(&self, year_dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut folders = Vec::new();
        for entry in fs::read_dir(year_dir)? {
            let path = entry?.path();
            if path.is_dir() && !self.is_ignored(&path) {
                folders.push(path);
            }
        }
        sort_paths(&mut folders);
        Ok(folders)
    }

    /// Files of the given kind in `folder`, optionally descending into
    /// subfolders. Sorted by path.
    pub fn media_files(
        &self,
        folder: &Path,
        kind: FileKind,
        recursive: bool,
    ) -> io::Result<Vec<FileDescriptor>> {
        if !folder.is_dir() {
            return Ok(Vec::new());
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();
        let walker = WalkDir::new(folder)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_ignored(e.path()));

        for entry in walker {
            let entry = entry.map_err(|err| {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Error walking {}: {}", path.display(), err),
                )
            })?;
            if !entry.file_type().is_file() || classify::classify_name(entry.path()) != kind {
                continue;
            }
            files.push(FileDescriptor::from_path(entry.path())?);
        }

        debug!("{} {:?} files in {}", files.len(), kind, folder.display());
        Ok(files)
    }

    pub fn videos(&self, folder: &Path, recursive: bool) -> io::Result<Vec<FileDescriptor>> {
        self.media_files(folder, FileKind::Video, recursive)
    }
}

pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by_key(|p| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
}
