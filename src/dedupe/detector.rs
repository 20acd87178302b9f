use crate::config::DEFAULT_BYTE_THRESHOLD;
use crate::scanner::FileDescriptor;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

/// Outcome of comparing two files that passed every duplicate gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision<'a> {
    pub keeper: &'a FileDescriptor,
    pub loser: &'a FileDescriptor,
}

/// Near-duplicate detection for clips re-uploaded or re-exported under a
/// slightly different name.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateDetector {
    byte_threshold: u64,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(DEFAULT_BYTE_THRESHOLD)
    }
}

impl DuplicateDetector {
    pub fn new(byte_threshold: u64) -> Self {
        Self { byte_threshold }
    }

    /// Returns `Some` when `a` and `b` are the same logical clip.
    ///
    /// Gates, short-circuiting in order: same extension, one stem contains the
    /// other, sizes within the byte threshold. The keeper is then picked by
    /// longer name, deeper path, newer mtime and finally the lexically smaller
    /// path.
    pub fn compare<'a>(&self, a: &'a FileDescriptor, b: &'a FileDescriptor) -> Option<Decision<'a>> {
        if !a.extension.eq_ignore_ascii_case(&b.extension) {
            return None;
        }

        // Stems match case-sensitively; only the extension folds case.
        let (stem_a, stem_b) = (a.stem(), b.stem());
        if !stem_a.contains(stem_b) && !stem_b.contains(stem_a) {
            return None;
        }

        if a.size.abs_diff(b.size) > self.byte_threshold {
            return None;
        }

        let decision = match keeper_order(a, b) {
            Ordering::Less => Decision { keeper: b, loser: a },
            _ => Decision { keeper: a, loser: b },
        };
        debug!(
            "Duplicate: keeping {} over {}",
            decision.keeper.path.display(),
            decision.loser.path.display()
        );
        Some(decision)
    }

    /// Every distinct loser among all pairs of `files`.
    pub fn losers(&self, files: &[FileDescriptor]) -> BTreeSet<PathBuf> {
        let mut losers = BTreeSet::new();
        for (i, a) in files.iter().enumerate() {
            for b in &files[i + 1..] {
                if let Some(decision) = self.compare(a, b) {
                    losers.insert(decision.loser.path.clone());
                }
            }
        }
        losers
    }
}

/// `Greater` when `a` should be kept over `b`.
fn keeper_order(a: &FileDescriptor, b: &FileDescriptor) -> Ordering {
    a.file_name
        .chars()
        .count()
        .cmp(&b.file_name.chars().count())
        .then_with(|| a.depth().cmp(&b.depth()))
        .then_with(|| a.modified.cmp(&b.modified))
        .then_with(|| b.path.cmp(&a.path))
}
