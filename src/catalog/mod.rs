//! Persistent catalog of the local media tree.
//!
//! Folders are identified by `(folder_name, project_year, media_type)` and
//! files by their folder plus `(subfolder, file_name)`. A `None` folder name
//! is the year root itself; a `None` subfolder is a file directly in its
//! folder.

pub mod reconcile;
pub mod schema;
pub mod sqlite;

pub use reconcile::{CatalogReconciler, ReconcileSummary};
pub use sqlite::SqliteCatalog;

use crate::error::Error;
use crate::media::MediaInfo;
use crate::platform::Availability;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FolderRecord {
    pub folder_name: Option<String>,
    pub project_year: i32,
    pub media_type: String,
}

impl FolderRecord {
    pub fn new(folder_name: Option<&str>, project_year: i32, media_type: &str) -> Self {
        Self {
            folder_name: folder_name.map(str::to_string),
            project_year,
            media_type: media_type.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileKey {
    pub folder: FolderRecord,
    pub subfolder: Option<String>,
    pub file_name: String,
}

/// Attributes re-read on every scan. A change in any of them makes the file
/// "changed" and triggers an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttrs {
    pub file_size: i64,
    pub modified_secs: i64,
    pub stored: Availability,
    pub rating: Option<i32>,
}

/// A cataloged file. `media` is written along with `attrs` but never
/// compared; it is carried over from the catalog while the file's size is
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub key: FileKey,
    pub attrs: FileAttrs,
    pub media: MediaInfo,
}

/// Storage seam for the catalog. Every call is one transaction; upserts are
/// keyed on the natural keys above so repeating them is harmless.
pub trait CatalogStore {
    fn fetch_known_folders(&mut self, media_type: &str) -> Result<Vec<FolderRecord>, Error>;

    fn fetch_known_files(&mut self, year: i32, media_type: &str)
        -> Result<Vec<FileRecord>, Error>;

    /// Inserts folders not yet present; existing ones are left alone.
    fn upsert_folders(&mut self, folders: &[FolderRecord]) -> Result<usize, Error>;

    /// Inserts new files and overwrites the attributes of existing ones.
    /// Every file's folder must already be cataloged.
    fn upsert_files(&mut self, files: &[FileRecord]) -> Result<usize, Error>;

    /// Fails if any of the folders still has files.
    fn delete_folders(&mut self, folders: &[FolderRecord]) -> Result<usize, Error>;

    fn delete_files(&mut self, files: &[FileKey]) -> Result<usize, Error>;
}
