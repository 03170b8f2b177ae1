use crate::data::{PlaybackError, PlaybackSnapshot, PlaybackState};
use serde::{Serialize, Deserialize};

/// Represents the notifications a playback controller emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// The controller moved to a different state
    StateChanged {
        state: PlaybackState,
    },

    /// Position, duration or buffering changed enough to report
    PlaybackUpdated {
        snapshot: PlaybackSnapshot,
    },

    /// The controller entered the error state
    ErrorOccurred {
        error: PlaybackError,
    },
}

impl PlaybackEvent {
    /// Short name of the event, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackEvent::StateChanged { .. } => "state_changed",
            PlaybackEvent::PlaybackUpdated { .. } => "playback_updated",
            PlaybackEvent::ErrorOccurred { .. } => "error_occurred",
        }
    }

    /// The state carried by this event, if any
    pub fn state(&self) -> Option<PlaybackState> {
        match self {
            PlaybackEvent::StateChanged { state } => Some(*state),
            PlaybackEvent::PlaybackUpdated { snapshot } => Some(snapshot.state),
            PlaybackEvent::ErrorOccurred { .. } => None,
        }
    }
}
