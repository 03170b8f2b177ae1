use serde::{Serialize, Deserialize};

/// A playable video as listed by any video source
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoFile {
    /// Display name, usually the file name
    pub name: String,
    /// Source-specific path (remote href or local path)
    pub path: String,
    /// URL the decoder can open
    pub url: String,
    /// Whether the name marks this as panoramic content
    pub is_360: bool,
    /// Size in bytes, 0 when unknown
    pub size: u64,
    /// Local copy, empty until downloaded
    pub local_path: String,
}

impl VideoFile {
    pub fn is_downloaded(&self) -> bool {
        !self.local_path.is_empty()
    }
}

/// Panoramic content is recognised by "360" in the file name
pub fn is_360_name(name: &str) -> bool {
    name.to_lowercase().contains("360")
}
