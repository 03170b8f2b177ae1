use serde::{Serialize, Deserialize};
use crate::data::PlaybackState;

/// Durations at or below this are treated as unknown when computing progress
pub const MIN_PROGRESS_DURATION: f64 = 0.01;

/// Immutable point-in-time readout of the playback position
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub normalized_progress: f64,
    pub is_buffering: bool,
    pub source: String,
}

impl PlaybackSnapshot {
    /// Build a snapshot, clamping negative values and deriving the progress
    pub fn new(
        state: PlaybackState,
        position_seconds: f64,
        duration_seconds: f64,
        is_buffering: bool,
        source: &str,
    ) -> Self {
        let position_seconds = position_seconds.max(0.0);
        let duration_seconds = duration_seconds.max(0.0);
        Self {
            state,
            position_seconds,
            duration_seconds,
            normalized_progress: normalized_progress(position_seconds, duration_seconds),
            is_buffering,
            source: source.to_string(),
        }
    }
}

/// `position / duration` clamped to [0, 1], or 0 for an unknown duration
pub fn normalized_progress(position_seconds: f64, duration_seconds: f64) -> f64 {
    if duration_seconds > MIN_PROGRESS_DURATION {
        (position_seconds / duration_seconds).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
