use crate::error::Error;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuarantineOutcome {
    Moved { from: PathBuf, to: PathBuf },
    /// Dry-run: the move that would happen.
    WouldMove { from: PathBuf, to: PathBuf },
    AlreadyQuarantined { to: PathBuf },
    Missing { from: PathBuf },
    /// Both origin and target exist; nothing was touched.
    Conflict { from: PathBuf, to: PathBuf },
}

impl QuarantineOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, QuarantineOutcome::Conflict { .. })
    }

    /// Moved, or would be moved in a dry run.
    pub fn is_demotion(&self) -> bool {
        matches!(
            self,
            QuarantineOutcome::Moved { .. } | QuarantineOutcome::WouldMove { .. }
        )
    }
}

/// Holding area for demoted duplicates, mirroring each file's path relative
/// to the remote root. Append-only: nothing here is ever deleted.
#[derive(Debug, Clone)]
pub struct QuarantineStore {
    root: PathBuf,
    anchor: PathBuf,
}

impl QuarantineStore {
    /// `anchor` is the ancestor relative paths are taken from (the remote root).
    pub fn new(root: impl Into<PathBuf>, anchor: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            anchor: anchor.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `file` lands in quarantine. Files outside the anchor keep their
    /// last three components (`year/person/file`).
    pub fn target_for(&self, file: &Path) -> PathBuf {
        self.mirrored(file, 3)
    }

    /// Folder that `target_for` moves the files of `folder` into. Folders
    /// outside the anchor keep their last two components.
    pub fn folder_target(&self, folder: &Path) -> PathBuf {
        self.mirrored(folder, 2)
    }

    fn mirrored(&self, path: &Path, keep: usize) -> PathBuf {
        match path.strip_prefix(&self.anchor) {
            Ok(rel) => self.root.join(rel),
            Err(_) => {
                let tail: Vec<Component> = path.components().rev().take(keep).collect();
                tail.into_iter()
                    .rev()
                    .fold(self.root.clone(), |acc, c| acc.join(c.as_os_str()))
            }
        }
    }

    /// Quarantine mirror of a destination folder given its path relative to
    /// the tree root, e.g. `2024/Michael 2024`.
    pub fn mirror_of(&self, relative_folder: &Path) -> PathBuf {
        self.root.join(relative_folder)
    }

    /// Move `file` into quarantine. Safe to repeat: every pre-state of
    /// origin/target maps to exactly one outcome and only the
    /// origin-present/target-absent state mutates anything.
    pub fn move_file(&self, file: &Path, dry_run: bool) -> Result<QuarantineOutcome, Error> {
        let target = self.target_for(file);
        let source_exists = file.exists();
        let target_exists = target.exists();

        match (source_exists, target_exists) {
            (true, false) if dry_run => {
                info!("Would quarantine {} -> {}", file.display(), target.display());
                Ok(QuarantineOutcome::WouldMove {
                    from: file.to_path_buf(),
                    to: target,
                })
            }
            (true, false) => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::rename(file, &target)?;
                if file.exists() || !target.exists() {
                    return Err(Error::Quarantine(format!(
                        "move of {} to {} did not complete",
                        file.display(),
                        target.display()
                    )));
                }
                info!("Quarantined {} -> {}", file.display(), target.display());
                Ok(QuarantineOutcome::Moved {
                    from: file.to_path_buf(),
                    to: target,
                })
            }
            (false, true) => {
                info!("Already quarantined: {}", target.display());
                Ok(QuarantineOutcome::AlreadyQuarantined { to: target })
            }
            (false, false) => {
                warn!("File missing, nothing to quarantine: {}", file.display());
                Ok(QuarantineOutcome::Missing {
                    from: file.to_path_buf(),
                })
            }
            (true, true) => {
                warn!(
                    "Quarantine conflict, both exist: {} and {}",
                    file.display(),
                    target.display()
                );
                Ok(QuarantineOutcome::Conflict {
                    from: file.to_path_buf(),
                    to: target,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, QuarantineStore, PathBuf) {
        let dir = tempdir().unwrap();
        let remote = dir.path().join("remote");
        let clip = remote.join("2024").join("Michael 2024").join("clip.mp4");
        fs::create_dir_all(clip.parent().unwrap()).unwrap();
        fs::write(&clip, b"clip").unwrap();
        let store = QuarantineStore::new(remote.join("_quarantine"), &remote);
        (dir, store, clip)
    }

    #[test]
    fn test_target_mirrors_relative_path() {
        let store = QuarantineStore::new("/gd/_q", "/gd");
        assert_eq!(
            store.target_for(Path::new("/gd/2024/Anna 2024/a.mp4")),
            PathBuf::from("/gd/_q/2024/Anna 2024/a.mp4")
        );
        assert_eq!(
            store.target_for(Path::new("/elsewhere/deep/2023/Bob 2023/b.mp4")),
            PathBuf::from("/gd/_q/2023/Bob 2023/b.mp4")
        );
    }

    #[test]
    fn test_folder_target_holds_moved_files() {
        let store = QuarantineStore::new("/gd/_q", "/gd");
        for folder in ["/gd/2024/Anna 2024", "/shared/people/Zoe"] {
            let folder = Path::new(folder);
            let moved = store.target_for(&folder.join("z.mp4"));
            assert_eq!(moved.parent(), Some(store.folder_target(folder).as_path()));
        }
        assert_eq!(
            store.folder_target(Path::new("/shared/people/Zoe")),
            PathBuf::from("/gd/_q/people/Zoe")
        );
    }

    #[test]
    fn test_move_is_idempotent() {
        let (_dir, store, clip) = setup();
        let target = store.target_for(&clip);

        let first = store.move_file(&clip, false).unwrap();
        assert_eq!(
            first,
            QuarantineOutcome::Moved {
                from: clip.clone(),
                to: target.clone()
            }
        );
        assert!(!clip.exists());
        assert_eq!(fs::read(&target).unwrap(), b"clip");

        let second = store.move_file(&clip, false).unwrap();
        assert_eq!(second, QuarantineOutcome::AlreadyQuarantined { to: target.clone() });
        assert_eq!(fs::read(&target).unwrap(), b"clip");
    }

    #[test]
    fn test_missing_everywhere_is_not_fatal() {
        let (_dir, store, clip) = setup();
        let ghost = clip.with_file_name("ghost.mp4");
        let outcome = store.move_file(&ghost, false).unwrap();
        assert_eq!(outcome, QuarantineOutcome::Missing { from: ghost });
    }

    #[test]
    fn test_conflict_leaves_both_files() {
        let (_dir, store, clip) = setup();
        let target = store.target_for(&clip);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"older copy").unwrap();

        let outcome = store.move_file(&clip, false).unwrap();
        assert!(outcome.is_conflict());
        assert_eq!(fs::read(&clip).unwrap(), b"clip");
        assert_eq!(fs::read(&target).unwrap(), b"older copy");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let (_dir, store, clip) = setup();
        let outcome = store.move_file(&clip, true).unwrap();
        assert!(outcome.is_demotion());
        assert!(clip.exists());
        assert!(!store.root().exists());
    }
}
