pub mod detector;
pub mod quarantine;

pub use detector::{Decision, DuplicateDetector};
pub use quarantine::{QuarantineOutcome, QuarantineStore};
