/// Data structures shared across the player
pub mod data;

/// Playback state machine and decoder abstraction
pub mod playback;

/// Source validation, HTTP transport and retries
pub mod helpers;

/// WebDAV client for remote video folders
pub mod webdav;

/// Local media catalog, file cache and video sources
pub mod library;

pub mod config;
pub mod logging;

pub use config::AppConfig;
pub use data::{ErrorKind, PlaybackError, PlaybackEvent, PlaybackSnapshot, PlaybackState, VideoFile};
pub use playback::{MediaDecoder, PlaybackController, PlaybackService};
pub use webdav::{RemoteFileClient, RemoteFileEntry};
