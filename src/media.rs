//! Media attributes read from file contents: duration and resolution class
//! from the MP4/QuickTime header, star rating from trailing XMP.
//!
//! Nothing here fails the caller. Unreadable files are logged and get
//! placeholder values, and cloud placeholders are never opened since reading
//! them would pull the whole file down.

use crate::platform::Availability;
use lazy_static::lazy_static;
use regex::bytes::Regex;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// XMP packets are appended at the end of the file.
const XMP_TAIL_BYTES: u64 = 5_000;

/// Lower bound of the shorter side for each class, smallest first.
const RESOLUTION_CLASSES: [(u32, &str); 6] = [
    (320, "vhs"),
    (480, "sd"),
    (720, "hd"),
    (1080, "fhd"),
    (2160, "4k"),
    (4320, "8k"),
];

/// Resolution recorded for a container that could not be parsed.
pub const UNREADABLE: &str = "xx";

const HEADER_EXTS: [&str; 3] = ["mp4", "mov", "m4v"];

lazy_static! {
    // `xmp:Rating="3"`, `<xmp:Rating>3</xmp:Rating>` or a `{ns}Rating` key
    static ref XMP_RATING: Regex =
        Regex::new(r#"[:}]Rating(?:\s*=\s*["']|\s*>)\s*(-?\d+)"#).unwrap();
}

/// Attributes that only change when the content does. The reconciler reuses
/// cataloged values instead of re-reading the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaInfo {
    pub duration_secs: Option<i64>,
    pub resolution: Option<String>,
}

impl MediaInfo {
    pub fn is_known(&self) -> bool {
        self.duration_secs.is_some() || self.resolution.is_some()
    }

    fn unreadable() -> Self {
        Self {
            duration_secs: Some(0),
            resolution: Some(UNREADABLE.to_string()),
        }
    }
}

/// Class of a `width` x `height` frame, by its shorter side. Anything below
/// the smallest bound still counts as the smallest class.
pub fn resolution_class(width: u32, height: u32) -> &'static str {
    let dim = width.min(height);
    RESOLUTION_CLASSES
        .iter()
        .rev()
        .find(|(bound, _)| dim >= *bound)
        .map_or(RESOLUTION_CLASSES[0].1, |(_, class)| *class)
}

/// Read duration and resolution class. Only MP4-family containers are
/// parsed; other containers and cloud placeholders yield nothing.
pub fn read_media_info(path: &Path, stored: Availability) -> MediaInfo {
    if stored == Availability::CloudPlaceholder || !has_header_ext(path) {
        return MediaInfo::default();
    }
    match read_header(path) {
        Ok(info) => info,
        Err(err) => {
            debug!("Unreadable media header in {}: {}", path.display(), err);
            MediaInfo::unreadable()
        }
    }
}

fn has_header_ext(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |ext| {
            HEADER_EXTS.iter().any(|h| h.eq_ignore_ascii_case(ext))
        })
}

fn read_header(path: &Path) -> Result<MediaInfo, mp4::Error> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let reader = mp4::Mp4Reader::read_header(BufReader::new(file), size)?;

    let duration = reader.duration().as_secs_f64().round() as i64;
    let resolution = reader
        .tracks()
        .values()
        .find(|track| matches!(track.track_type(), Ok(mp4::TrackType::Video)))
        .map(|track| {
            resolution_class(u32::from(track.width()), u32::from(track.height())).to_string()
        });

    Ok(MediaInfo {
        duration_secs: Some(duration),
        resolution,
    })
}

/// Star rating (0 to 5) from an XMP packet. Out-of-range values are ignored.
pub fn rating_from_xmp(bytes: &[u8]) -> Option<i32> {
    XMP_RATING
        .captures_iter(bytes)
        .filter_map(|caps| std::str::from_utf8(&caps[1]).ok()?.parse::<i32>().ok())
        .find(|rating| (0..=5).contains(rating))
}

/// Rating from the tail of a local file, `None` when absent or unreadable.
pub fn read_rating(path: &Path, stored: Availability) -> Option<i32> {
    if stored == Availability::CloudPlaceholder {
        return None;
    }
    match read_tail(path, XMP_TAIL_BYTES) {
        Ok(tail) => rating_from_xmp(&tail),
        Err(err) => {
            debug!("Cannot read rating of {}: {}", path.display(), err);
            None
        }
    }
}

fn read_tail(path: &Path, bytes: u64) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    file.seek(SeekFrom::Start(len.saturating_sub(bytes)))?;
    let mut tail = Vec::with_capacity(bytes.min(len) as usize);
    file.read_to_end(&mut tail)?;
    Ok(tail)
}
