use super::Availability;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use winapi::um::fileapi::{GetFileAttributesW, INVALID_FILE_ATTRIBUTES};
use winapi::um::winnt::{FILE_ATTRIBUTE_OFFLINE, FILE_ATTRIBUTE_REPARSE_POINT};

// Cloud Files attribute bits, not all exported by winapi.
const FILE_ATTRIBUTE_RECALL_ON_OPEN: u32 = 0x0004_0000;
const FILE_ATTRIBUTE_PINNED: u32 = 0x0008_0000;
const FILE_ATTRIBUTE_UNPINNED: u32 = 0x0010_0000;
const FILE_ATTRIBUTE_RECALL_ON_DATA_ACCESS: u32 = 0x0040_0000;

/// Classify a file from its Files On-Demand attributes.
pub fn availability(path: &Path) -> Availability {
    let wide: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    let attrs = unsafe { GetFileAttributesW(wide.as_ptr()) };
    if attrs == INVALID_FILE_ATTRIBUTES {
        return Availability::Local;
    }

    if attrs & FILE_ATTRIBUTE_PINNED != 0 {
        return Availability::Local;
    }
    if attrs & FILE_ATTRIBUTE_REPARSE_POINT != 0 && attrs & FILE_ATTRIBUTE_UNPINNED != 0 {
        return Availability::CloudPlaceholder;
    }
    let recall = FILE_ATTRIBUTE_RECALL_ON_OPEN | FILE_ATTRIBUTE_RECALL_ON_DATA_ACCESS;
    if attrs & (recall | FILE_ATTRIBUTE_OFFLINE) != 0 {
        return Availability::CloudPlaceholder;
    }
    Availability::Local
}
