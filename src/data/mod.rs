// Data structures for the playback core

pub mod playback_error;
pub mod playback_event;
pub mod playback_snapshot;
pub mod playback_state;
pub mod video_file;

pub use playback_error::{ErrorKind, PlaybackError};
pub use playback_event::PlaybackEvent;
pub use playback_snapshot::{normalized_progress, PlaybackSnapshot};
pub use playback_state::PlaybackState;
pub use video_file::{is_360_name, VideoFile};

/// File extensions the decoder is able to play, lowercase with leading dot
pub const SUPPORTED_EXTENSIONS: [&str; 3] = [".mp4", ".mkv", ".mov"];

/// Check a lowercase or mixed-case extension (with leading dot) against the supported set
pub fn is_supported_extension(extension: &str) -> bool {
    let lower = extension.to_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| *ext == lower)
}

/// Extract the extension (with leading dot, lowercased) from the last segment of a path
///
/// Returns `None` when the last segment has no dot or ends with one.
pub fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path);
    let dot = file_name.rfind('.')?;
    if dot + 1 >= file_name.len() {
        return None;
    }
    Some(file_name[dot..].to_lowercase())
}
