use serde::{Serialize, Deserialize};
use strum_macros::{Display, EnumString, AsRefStr};

/// Closed set of error categories a playback controller can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// No error
    None,
    /// Empty source or play without an opened source
    InvalidSource,
    /// Local file or remote resource does not exist
    FileNotFound,
    /// Extension or container is not supported
    UnsupportedFormat,
    /// The decoder did not finish preparing in time
    PrepareTimeout,
    /// The decoder failed while decoding
    DecoderFailure,
    /// Access to the source was refused
    PermissionDenied,
    /// Anything not covered above
    Unknown,
}

impl Default for ErrorKind {
    fn default() -> Self {
        ErrorKind::None
    }
}

impl ErrorKind {
    /// Transient problems that a plain retry may fix
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::PrepareTimeout | ErrorKind::DecoderFailure)
    }

    /// Problems with the input or environment that need the user to act
    pub fn needs_user_action(&self) -> bool {
        matches!(
            self,
            ErrorKind::FileNotFound | ErrorKind::UnsupportedFormat | ErrorKind::PermissionDenied
        )
    }
}

/// An error reported by the playback controller
///
/// `code == ErrorKind::None` means there is no error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackError {
    pub code: ErrorKind,
    pub message: String,
    pub source: String,
}

impl PlaybackError {
    pub fn new(code: ErrorKind, message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: source.into(),
        }
    }

    /// The cleared error value
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_error(&self) -> bool {
        self.code != ErrorKind::None
    }
}

impl std::fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.source.is_empty() {
            write!(f, "{}: {}", self.code, self.message)
        } else {
            write!(f, "{}: {} ({})", self.code, self.message, self.source)
        }
    }
}

impl std::error::Error for PlaybackError {}
