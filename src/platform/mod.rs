#[cfg(target_os = "windows")]
pub mod windows;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::Metadata;
use std::path::Path;

/// Whether a file's bytes are on this machine or only in the cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Availability {
    Local,
    CloudPlaceholder,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Local => "local",
            Availability::CloudPlaceholder => "cloud",
        }
    }

    pub fn parse(value: &str) -> Availability {
        match value {
            "cloud" => Availability::CloudPlaceholder,
            _ => Availability::Local,
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(target_os = "windows")]
pub fn availability(path: &Path, _metadata: &Metadata) -> Availability {
    windows::availability(path)
}

/// A non-empty file with no allocated blocks is a sync-client placeholder.
#[cfg(unix)]
pub fn availability(_path: &Path, metadata: &Metadata) -> Availability {
    use std::os::unix::fs::MetadataExt;

    if metadata.len() > 0 && metadata.blocks() == 0 {
        Availability::CloudPlaceholder
    } else {
        Availability::Local
    }
}

#[cfg(not(any(unix, target_os = "windows")))]
pub fn availability(_path: &Path, _metadata: &Metadata) -> Availability {
    Availability::Local
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_written_file_is_local() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        fs::write(&path, vec![7u8; 8192]).unwrap();
        let meta = fs::metadata(&path).unwrap();
        assert_eq!(availability(&path, &meta), Availability::Local);
    }

    #[test]
    fn test_catalog_encoding() {
        assert_eq!(Availability::parse(Availability::Local.as_str()), Availability::Local);
        assert_eq!(
            Availability::parse(Availability::CloudPlaceholder.as_str()),
            Availability::CloudPlaceholder
        );
    }
}
