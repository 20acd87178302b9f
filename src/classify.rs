use lazy_static::lazy_static;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref VIDEO_EXTS: HashSet<&'static str> = [
        "mp4", "mov", "m4v", "mkv", "avi", "wmv", "flv", "webm", "mpg", "mpeg", "mts", "m2ts",
        "ts", "3gp",
    ]
    .into_iter()
    .collect();
    static ref PROJECT_EXTS: HashSet<&'static str> = ["prproj", "aep"].into_iter().collect();
}

const SHORTCUT_EXT: &str = "lnk";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Video,
    Project,
    Shortcut,
    Directory,
    Unknown,
}

/// Classify a path. Follows symlinks, so a link to a folder is a `Directory`.
/// Anything that cannot be stat'ed is `Unknown`.
pub fn classify(path: &Path) -> FileKind {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => FileKind::Directory,
        Ok(meta) if meta.is_file() => classify_name(path),
        _ => FileKind::Unknown,
    }
}

/// Extension-only classification, no filesystem access.
pub fn classify_name(path: &Path) -> FileKind {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return FileKind::Unknown,
    };

    if VIDEO_EXTS.contains(ext.as_str()) {
        FileKind::Video
    } else if PROJECT_EXTS.contains(ext.as_str()) {
        FileKind::Project
    } else if ext == SHORTCUT_EXT {
        FileKind::Shortcut
    } else {
        FileKind::Unknown
    }
}

/// Exactly four ASCII digits, e.g. `2024`.
pub fn is_year_folder(name: &str) -> bool {
    name.len() == 4 && name.bytes().all(|b| b.is_ascii_digit())
}

/// Trailing `" YYYY"` of a person folder name, e.g. `Michael 2024` -> 2024.
pub fn folder_year(folder_name: &str) -> Option<i32> {
    let (_, year) = folder_name.rsplit_once(' ')?;
    if is_year_folder(year) {
        year.parse().ok()
    } else {
        None
    }
}

/// Person name with any trailing `" YYYY"` removed.
pub fn person_name(folder_name: &str) -> String {
    match folder_name.rsplit_once(' ') {
        Some((name, year)) if is_year_folder(year) => name.trim().to_string(),
        _ => folder_name.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_classify_name_by_extension() {
        assert_eq!(classify_name(Path::new("a/clip.MP4")), FileKind::Video);
        assert_eq!(classify_name(Path::new("clip.m2ts")), FileKind::Video);
        assert_eq!(classify_name(Path::new("Review 2024.prproj")), FileKind::Project);
        assert_eq!(classify_name(Path::new("comp.aep")), FileKind::Project);
        assert_eq!(classify_name(Path::new("Michael 2024.lnk")), FileKind::Shortcut);
        assert_eq!(classify_name(Path::new("notes.txt")), FileKind::Unknown);
        assert_eq!(classify_name(Path::new("README")), FileKind::Unknown);
    }

    #[test]
    fn test_classify_touches_filesystem() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("clip.mov");
        fs::write(&video, b"x").unwrap();

        assert_eq!(classify(dir.path()), FileKind::Directory);
        assert_eq!(classify(&video), FileKind::Video);
        assert_eq!(classify(&dir.path().join("missing.mov")), FileKind::Unknown);
    }

    #[test]
    fn test_year_folder() {
        assert!(is_year_folder("2024"));
        assert!(!is_year_folder("202"));
        assert!(!is_year_folder("20245"));
        assert!(!is_year_folder("20a4"));
        assert!(!is_year_folder("_quarantine"));
    }

    #[test]
    fn test_person_name_strips_year_suffix() {
        assert_eq!(person_name("Michael 2025"), "Michael");
        assert_eq!(person_name("Mary Ann 2019"), "Mary Ann");
        assert_eq!(person_name("Holidays"), "Holidays");
        assert_eq!(person_name("Trip 25"), "Trip 25");
        assert_eq!(folder_year("Michael 2025"), Some(2025));
        assert_eq!(folder_year("Michael"), None);
    }
}
