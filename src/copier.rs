use crate::error::Error;
use crate::scanner::FileDescriptor;
use ahash::{AHashMap, AHashSet};
use filetime::FileTime;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Case-folded file names already present at a destination or in its
/// quarantine mirror.
#[derive(Debug, Default, Clone)]
pub struct KnownNames {
    names: AHashSet<String>,
}

impl KnownNames {
    /// Names of the files directly inside each folder. Missing folders
    /// contribute nothing.
    pub fn gather<P: AsRef<Path>>(folders: &[P]) -> io::Result<Self> {
        let mut known = KnownNames::default();
        for folder in folders {
            let folder = folder.as_ref();
            if !folder.is_dir() {
                continue;
            }
            for entry in fs::read_dir(folder)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    known.insert(&entry.file_name().to_string_lossy());
                }
            }
        }
        Ok(known)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&fold(name))
    }

    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(fold(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// One-way copier that never writes a name the destination already knows.
#[derive(Debug, Default)]
pub struct FolderCopier {
    dry_run: bool,
    counts: AHashMap<PathBuf, usize>,
}

impl FolderCopier {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            counts: AHashMap::new(),
        }
    }

    /// Copy `source` into `destination` unless its name (case-insensitively)
    /// is in `known`. Returns whether a copy happened, or would happen in a
    /// dry run. The name is added to `known` either way so a second call is a
    /// no-op.
    pub fn copy_if_needed(
        &mut self,
        source: &FileDescriptor,
        destination: &Path,
        known: &mut KnownNames,
    ) -> Result<bool, Error> {
        if known.contains(&source.file_name) {
            debug!("Already present, skipping {}", source.file_name);
            return Ok(false);
        }

        let target = destination.join(&source.file_name);
        if self.dry_run {
            info!("Would copy {} -> {}", source.path.display(), target.display());
        } else {
            if fs::symlink_metadata(&target).is_ok() {
                known.insert(&source.file_name);
                return Ok(false);
            }
            fs::create_dir_all(destination)?;
            copy_preserving_times(&source.path, &target)?;
            info!("Copied {} -> {}", source.path.display(), target.display());
        }

        known.insert(&source.file_name);
        *self.counts.entry(destination.to_path_buf()).or_default() += 1;
        Ok(true)
    }

    pub fn count_for(&self, destination: &Path) -> usize {
        self.counts.get(destination).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Human-readable per-destination lines; destinations with nothing copied
    /// are folded into a single trailing line.
    pub fn summary_lines(&self, destinations: &[PathBuf]) -> Vec<String> {
        let verb = if self.dry_run { "would be copied" } else { "copied" };
        let mut lines = Vec::new();
        let mut quiet = 0;
        for destination in destinations {
            match self.count_for(destination) {
                0 => quiet += 1,
                n => lines.push(format!(
                    "{} video{} {} to {}",
                    n,
                    if n == 1 { "" } else { "s" },
                    verb,
                    destination.display()
                )),
            }
        }
        if quiet > 0 {
            lines.push(format!("{} folder(s) already up to date", quiet));
        }
        lines
    }
}

/// Copy through a temporary file in the target's folder and rename it into
/// place, so an interrupted copy never leaves a partial file under the final
/// name. The temporary file is removed when any step fails.
fn copy_preserving_times(source: &Path, target: &Path) -> io::Result<()> {
    let metadata = fs::metadata(source)?;
    let folder = target.parent().unwrap_or_else(|| Path::new("."));

    let mut staged = NamedTempFile::new_in(folder)?;
    io::copy(&mut File::open(source)?, staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    fs::set_permissions(staged.path(), metadata.permissions())?;
    filetime::set_file_times(
        staged.path(),
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )?;

    staged.persist_noclobber(target).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn source_file(dir: &Path, name: &str, bytes: &[u8]) -> FileDescriptor {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        FileDescriptor::from_path(&path).unwrap()
    }

    #[test]
    fn test_known_names_fold_case() {
        let mut known = KnownNames::default();
        known.insert("IMG_0001.MOV");
        assert!(known.contains("img_0001.mov"));
        assert!(!known.contains("img_0002.mov"));
    }

    #[test]
    fn test_gather_skips_missing_and_subfolders() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("dest").join("sub")).unwrap();
        fs::write(dir.path().join("dest").join("A.mp4"), b"a").unwrap();
        let missing = dir.path().join("nope");
        let dest = dir.path().join("dest");

        let known = KnownNames::gather(&[&dest, &missing]).unwrap();
        assert_eq!(known.len(), 1);
        assert!(known.contains("a.mp4"));
    }

    #[test]
    fn test_copy_is_idempotent() {
        let dir = tempdir().unwrap();
        let src = source_file(&dir.path().join("src"), "clip.mp4", b"data");
        let dest = dir.path().join("dest");
        let mut copier = FolderCopier::new(false);
        let mut known = KnownNames::gather(&[&dest]).unwrap();

        assert!(copier.copy_if_needed(&src, &dest, &mut known).unwrap());
        assert!(!copier.copy_if_needed(&src, &dest, &mut known).unwrap());

        let mut fresh = KnownNames::gather(&[&dest]).unwrap();
        assert!(!copier.copy_if_needed(&src, &dest, &mut fresh).unwrap());
        assert_eq!(copier.count_for(&dest), 1);
        assert_eq!(fs::read(dest.join("clip.mp4")).unwrap(), b"data");
    }

    #[test]
    fn test_copy_preserves_mtime() {
        let dir = tempdir().unwrap();
        let src = source_file(&dir.path().join("src"), "old.mp4", b"data");
        let stamp = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src.path, stamp).unwrap();
        let src = FileDescriptor::from_path(&src.path).unwrap();

        let dest = dir.path().join("dest");
        let mut copier = FolderCopier::new(false);
        copier
            .copy_if_needed(&src, &dest, &mut KnownNames::default())
            .unwrap();

        let copied = fs::metadata(dest.join("old.mp4")).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&copied), stamp);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let src = source_file(&dir.path().join("src"), "clip.mp4", b"data");
        let dest = dir.path().join("dest");
        let mut copier = FolderCopier::new(true);
        let mut known = KnownNames::default();

        assert!(copier.copy_if_needed(&src, &dest, &mut known).unwrap());
        assert!(!dest.exists());
        assert_eq!(copier.total(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_copy_leaves_no_file_behind() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("dest");
        // opens fine, fails with EIO on the first read
        let unreadable = FileDescriptor {
            path: PathBuf::from("/proc/self/mem"),
            file_name: "clip.mp4".to_string(),
            extension: "mp4".to_string(),
            size: 1_000,
            modified: std::time::UNIX_EPOCH,
            parent: PathBuf::from("/proc/self"),
            availability: crate::platform::Availability::Local,
        };
        let mut copier = FolderCopier::new(false);

        let mut known = KnownNames::gather(&[&dest]).unwrap();
        assert!(copier.copy_if_needed(&unreadable, &dest, &mut known).is_err());
        assert!(!dest.join("clip.mp4").exists());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);

        let good = source_file(&dir.path().join("src"), "clip.mp4", b"data");
        let mut known = KnownNames::gather(&[&dest]).unwrap();
        assert!(copier.copy_if_needed(&good, &dest, &mut known).unwrap());
        assert_eq!(fs::read(dest.join("clip.mp4")).unwrap(), b"data");
    }

    #[test]
    fn test_copy_never_replaces_existing_name() {
        let dir = tempdir().unwrap();
        let src = source_file(&dir.path().join("src"), "clip.mp4", b"new");
        let dest = dir.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("clip.mp4"), b"old").unwrap();

        assert!(copy_preserving_times(&src.path, &dest.join("clip.mp4")).is_err());
        assert_eq!(fs::read(dest.join("clip.mp4")).unwrap(), b"old");
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 1);
    }

    #[test]
    fn test_summary_is_terse_for_quiet_folders() {
        let dir = tempdir().unwrap();
        let src = source_file(&dir.path().join("src"), "clip.mp4", b"data");
        let busy = dir.path().join("busy");
        let quiet_a = dir.path().join("quiet_a");
        let quiet_b = dir.path().join("quiet_b");
        let mut copier = FolderCopier::new(false);
        copier
            .copy_if_needed(&src, &busy, &mut KnownNames::default())
            .unwrap();

        let lines = copier.summary_lines(&[busy.clone(), quiet_a, quiet_b]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1 video copied"));
        assert_eq!(lines[1], "2 folder(s) already up to date");
    }
}
