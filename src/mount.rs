use crate::config::MountConfig;
use crate::error::Error;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Precondition check that the remote mirror is mounted before a pass reads
/// from it. An empty or half-mounted mirror would otherwise look like a tree
/// with nothing new in it.
#[derive(Debug, Clone)]
pub struct MirrorGuard {
    root: PathBuf,
    config: MountConfig,
}

impl MirrorGuard {
    pub fn new(root: impl Into<PathBuf>, config: MountConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.root.is_dir()
    }

    /// Succeeds immediately when the root is present. Otherwise runs the
    /// remount command once and polls until `wait_secs` elapse.
    pub fn ensure(&self) -> Result<(), Error> {
        if self.is_mounted() {
            return Ok(());
        }

        warn!("Remote mirror not found at {}", self.root.display());
        if !self.try_remount() {
            return Err(Error::MirrorUnavailable(self.root.clone()));
        }

        let deadline = Instant::now() + Duration::from_secs(self.config.wait_secs);
        let poll = Duration::from_secs(self.config.poll_secs.max(1));
        loop {
            if self.is_mounted() {
                info!("Remote mirror is back at {}", self.root.display());
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(poll.min(deadline - now));
        }

        warn!(
            "Timed out after {}s waiting for {}",
            self.config.wait_secs,
            self.root.display()
        );
        Err(Error::MirrorUnavailable(self.root.clone()))
    }

    fn try_remount(&self) -> bool {
        let (program, args) = match self.config.remount_command.split_first() {
            Some(split) => split,
            None => {
                warn!("No remount command configured");
                return false;
            }
        };

        info!("Starting remount: {}", self.config.remount_command.join(" "));
        match Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(_) => true,
            Err(err) => {
                warn!("Could not start {}: {}", program, err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(command: &[&str], wait_secs: u64) -> MountConfig {
        MountConfig {
            remount_command: command.iter().map(|s| s.to_string()).collect(),
            wait_secs,
            poll_secs: 1,
        }
    }

    #[test]
    fn test_present_root_passes() {
        let dir = tempdir().unwrap();
        let guard = MirrorGuard::new(dir.path(), config(&[], 0));
        assert!(guard.ensure().is_ok());
    }

    #[test]
    fn test_missing_root_without_command_fails_fast() {
        let dir = tempdir().unwrap();
        let guard = MirrorGuard::new(dir.path().join("drive"), config(&[], 60));
        let started = Instant::now();
        let err = guard.ensure().unwrap_err();
        assert!(matches!(err, Error::MirrorUnavailable(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_unstartable_command_fails() {
        let dir = tempdir().unwrap();
        let guard = MirrorGuard::new(
            dir.path().join("drive"),
            config(&["reel-sync-no-such-program"], 60),
        );
        assert!(matches!(guard.ensure(), Err(Error::MirrorUnavailable(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_remount_command_restores_mirror() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("drive");
        let root_str = root.to_string_lossy().into_owned();
        let guard = MirrorGuard::new(&root, config(&["mkdir", "-p", &root_str], 10));
        assert!(guard.ensure().is_ok());
        assert!(root.is_dir());
    }
}
