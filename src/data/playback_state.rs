/// Playback state enumeration defining the states a playback controller can be in
use serde::{Serialize, Deserialize};
use strum_macros::EnumString;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PlaybackState {
    /// Nothing has been opened yet
    Idle,
    /// A source is opened and the decoder is preparing it
    Preparing,
    /// The decoder is prepared and waiting for play
    Ready,
    /// Media is actively playing
    Playing,
    /// Playback is paused
    Paused,
    /// The last operation failed, see the controller's last error
    Error,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Idle
    }
}

impl PlaybackState {
    /// Whether the decoder holds a prepared stream in this state
    pub fn is_prepared(&self) -> bool {
        matches!(self, PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Preparing => write!(f, "preparing"),
            PlaybackState::Ready => write!(f, "ready"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Error => write!(f, "error"),
        }
    }
}
