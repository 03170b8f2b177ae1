use crate::config::PlayerConfig;
use crate::data::{ErrorKind, PlaybackError, PlaybackEvent, PlaybackSnapshot, PlaybackState};
use crate::helpers::source_validator::{map_error_message, validate_source};
use crate::playback::clock::Clock;
use crate::playback::decoder::{DecoderEvent, MediaDecoder};
use crate::playback::listeners::{ListenerRegistry, PlaybackListener};
use delegate::delegate;
use std::sync::{Arc, Weak};
use std::time::Duration;
use log::{debug, info, trace, warn};

/// Position or duration must move at least this far before an update is emitted
pub const SNAPSHOT_EMIT_THRESHOLD: f64 = 0.15;

/// PlaybackService trait - the operations a host application drives
///
/// Hosts call these from their update loop thread and subscribe to the
/// emitted [`PlaybackEvent`]s through a [`PlaybackListener`].
pub trait PlaybackService {
    /// Validate and open a source, starting asynchronous preparation
    ///
    /// Returns the validation error if the source was rejected.
    fn open(&mut self, source: &str) -> Result<(), PlaybackError>;

    /// Start or resume playback, deferring until preparation completes if needed
    fn play(&mut self);

    /// Pause, only while playing
    fn pause(&mut self);

    /// Stop playback and rewind, keeping the source loaded
    fn stop(&mut self);

    /// Move the playback head, clamped to the stream
    fn seek(&mut self, seconds: f64);

    /// Set the volume, clamped to [0, 1]
    fn set_volume(&mut self, volume: f64);

    fn state(&self) -> PlaybackState;

    fn snapshot(&self) -> &PlaybackSnapshot;

    /// Last error, `ErrorKind::None` once a source opened successfully
    fn last_error(&self) -> &PlaybackError;

    fn has_source(&self) -> bool;

    /// Normalized URL of the loaded source, empty without one
    fn current_source(&self) -> &str;
}

/// Playback state machine around a platform decoder
///
/// Owns the decoder exclusively. The host drives it by calling [`tick`](Self::tick)
/// periodically (once per frame) and, if its decoder reports callbacks
/// itself, by forwarding them to [`handle_decoder_event`](Self::handle_decoder_event).
pub struct PlaybackController {
    decoder: Box<dyn MediaDecoder>,
    clock: Arc<dyn Clock>,
    config: PlayerConfig,
    listeners: ListenerRegistry,

    state: PlaybackState,
    snapshot: PlaybackSnapshot,
    last_error: PlaybackError,

    has_source: bool,
    current_source: String,
    pending_play: bool,
    prepare_started_at: Duration,

    last_emitted_position: f64,
    last_emitted_duration: f64,
    last_emitted_buffering: bool,
}

impl PlaybackController {
    /// Create a controller around `decoder`
    ///
    /// The configuration is sanitized; looping and the initial volume are applied
    /// to the decoder immediately.
    pub fn new(decoder: Box<dyn MediaDecoder>, clock: Arc<dyn Clock>, config: PlayerConfig) -> Self {
        let config = config.sanitized();
        debug!(
            "Creating PlaybackController with decoder '{}' (timeout {:.0}s, loop {}, autoplay {})",
            decoder.name(),
            config.prepare_timeout_secs,
            config.loop_playback,
            config.auto_play_on_open
        );

        let mut controller = Self {
            decoder,
            clock,
            config,
            listeners: ListenerRegistry::new(),
            state: PlaybackState::Idle,
            snapshot: PlaybackSnapshot::default(),
            last_error: PlaybackError::none(),
            has_source: false,
            current_source: String::new(),
            pending_play: false,
            prepare_started_at: Duration::ZERO,
            last_emitted_position: -1.0,
            last_emitted_duration: -1.0,
            last_emitted_buffering: false,
        };

        controller.decoder.set_looping(controller.config.loop_playback);
        controller.decoder.set_volume(controller.config.initial_volume);
        controller.update_snapshot(true);
        controller
    }

    delegate! {
        to self.listeners {
            /// Register a listener; returns `false` if it is already registered
            pub fn register_listener(&self, listener: Weak<dyn PlaybackListener>) -> bool;
            /// Unregister a listener; returns `false` if it was not registered
            pub fn unregister_listener(&self, listener: &Arc<dyn PlaybackListener>) -> bool;
            pub fn listener_count(&self) -> usize;
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Read-only access to the owned decoder
    pub fn decoder(&self) -> &dyn MediaDecoder {
        self.decoder.as_ref()
    }

    /// Whether a play request is waiting for preparation to finish
    pub fn is_play_pending(&self) -> bool {
        self.pending_play
    }

    /// Periodic update: drain decoder callbacks, enforce the prepare timeout,
    /// and refresh the snapshot
    pub fn tick(&mut self) {
        while let Some(event) = self.decoder.poll_event() {
            self.handle_decoder_event(event);
        }
        self.check_prepare_timeout();
        self.update_snapshot(false);
    }

    /// Apply a decoder callback to the state machine
    pub fn handle_decoder_event(&mut self, event: DecoderEvent) {
        trace!("Decoder event {:?} in state {}", event, self.state);

        match event {
            DecoderEvent::Error(message) => {
                if self.state == PlaybackState::Error {
                    debug!("Ignoring decoder error while already in error state: {}", message);
                    return;
                }
                let code = map_error_message(&message);
                let message = if message.trim().is_empty() {
                    "Unknown playback error.".to_string()
                } else {
                    message
                };
                let source = self.current_source.clone();
                self.set_error(code, message, source);
            }
            _ if matches!(self.state, PlaybackState::Error | PlaybackState::Idle) => {
                debug!("Ignoring stale decoder event {:?} in state {}", event, self.state);
            }
            DecoderEvent::Prepared => {
                self.set_state(PlaybackState::Ready);
                self.update_snapshot(true);
                if self.pending_play {
                    self.pending_play = false;
                    self.play();
                }
            }
            DecoderEvent::Started => {
                self.set_state(PlaybackState::Playing);
                self.update_snapshot(true);
            }
            DecoderEvent::LoopPointReached => {
                if self.config.loop_playback {
                    self.set_state(PlaybackState::Playing);
                } else {
                    self.set_state(PlaybackState::Paused);
                }
                self.update_snapshot(true);
            }
        }
    }

    fn begin_prepare(&mut self) {
        self.prepare_started_at = self.clock.now();
        self.set_state(PlaybackState::Preparing);
        self.decoder.prepare();
    }

    fn check_prepare_timeout(&mut self) {
        if self.state != PlaybackState::Preparing {
            return;
        }

        let elapsed = self.clock.now().saturating_sub(self.prepare_started_at);
        if elapsed.as_secs_f64() < self.config.prepare_timeout_secs {
            return;
        }

        warn!("Prepare of {} timed out after {:.1}s", self.current_source, elapsed.as_secs_f64());
        self.decoder.stop();
        let source = self.current_source.clone();
        self.set_error(ErrorKind::PrepareTimeout, "Video prepare timeout.", source);
    }

    /// Load a validated source into the decoder and start preparing it
    fn load_source(&mut self, url: String) {
        self.last_error = PlaybackError::none();
        self.pending_play = self.config.auto_play_on_open;
        self.has_source = true;
        self.current_source = url;

        self.decoder.stop();
        self.decoder.open(&self.current_source);
        info!("Opening {}", self.current_source);

        self.begin_prepare();
        self.update_snapshot(true);
    }

    fn set_state(&mut self, new_state: PlaybackState) {
        if self.state == new_state {
            return;
        }

        debug!("Playback state {} -> {}", self.state, new_state);
        self.state = new_state;
        self.snapshot.state = new_state;
        self.listeners.notify(&PlaybackEvent::StateChanged { state: new_state });
    }

    fn set_error(&mut self, code: ErrorKind, message: impl Into<String>, source: impl Into<String>) {
        self.last_error = PlaybackError::new(code, message, source);
        if self.state == PlaybackState::Error {
            debug!("Already in error state, replacing last error with {}", self.last_error);
            return;
        }

        warn!("Playback error: {}", self.last_error);
        self.set_state(PlaybackState::Error);
        self.listeners.notify(&PlaybackEvent::ErrorOccurred { error: self.last_error.clone() });
        self.update_snapshot(true);
    }

    fn update_snapshot(&mut self, force: bool) {
        let decoder_duration = self.decoder.duration();
        let duration = if decoder_duration > 0.0 {
            decoder_duration
        } else {
            self.snapshot.duration_seconds
        };

        let decoder_active = self.decoder.is_playing() || self.decoder.is_prepared() || self.decoder.can_seek();
        let position = if self.has_source && decoder_active {
            self.decoder.position().max(0.0)
        } else {
            self.snapshot.position_seconds
        };

        let is_buffering = self.state == PlaybackState::Preparing
            || (self.state == PlaybackState::Playing && self.has_source && !self.decoder.is_playing());

        self.snapshot = PlaybackSnapshot::new(self.state, position, duration, is_buffering, &self.current_source);

        let changed = force
            || (self.snapshot.position_seconds - self.last_emitted_position).abs() >= SNAPSHOT_EMIT_THRESHOLD
            || (self.snapshot.duration_seconds - self.last_emitted_duration).abs() >= SNAPSHOT_EMIT_THRESHOLD
            || self.last_emitted_buffering != is_buffering;

        if !changed {
            return;
        }

        self.last_emitted_position = self.snapshot.position_seconds;
        self.last_emitted_duration = self.snapshot.duration_seconds;
        self.last_emitted_buffering = is_buffering;

        self.listeners.notify(&PlaybackEvent::PlaybackUpdated { snapshot: self.snapshot.clone() });
    }
}

impl PlaybackService for PlaybackController {
    fn open(&mut self, source: &str) -> Result<(), PlaybackError> {
        match validate_source(source) {
            Ok(normalized) => {
                self.load_source(normalized.into_url());
                Ok(())
            }
            Err(error) if error.code == ErrorKind::InvalidSource && !self.has_source => {
                // Nothing loaded yet, stay idle
                debug!("Rejected empty source");
                Err(error)
            }
            Err(error) => {
                self.set_error(error.code, error.message.clone(), error.source.clone());
                Err(error)
            }
        }
    }

    fn play(&mut self) {
        if !self.has_source || self.current_source.trim().is_empty() {
            let source = self.current_source.clone();
            self.set_error(ErrorKind::InvalidSource, "No media source has been opened.", source);
            return;
        }

        match self.state {
            PlaybackState::Preparing => {
                debug!("Play requested while preparing, deferring");
                self.pending_play = true;
            }
            PlaybackState::Error => {
                // Retry the same source without raising a new error event
                match validate_source(&self.current_source) {
                    Ok(normalized) => {
                        self.load_source(normalized.into_url());
                        self.pending_play = true;
                    }
                    Err(error) => {
                        debug!("Retry of {} rejected: {}", self.current_source, error);
                        self.last_error = error;
                    }
                }
            }
            _ if !self.decoder.is_prepared() => {
                debug!("Play requested before decoder is prepared, preparing first");
                self.pending_play = true;
                self.begin_prepare();
                self.update_snapshot(true);
            }
            _ => {
                self.decoder.play();
                self.set_state(PlaybackState::Playing);
                self.update_snapshot(true);
            }
        }
    }

    fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }

        self.decoder.pause();
        self.set_state(PlaybackState::Paused);
        self.update_snapshot(true);
    }

    fn stop(&mut self) {
        self.pending_play = false;
        self.decoder.stop();

        if self.has_source {
            self.set_state(PlaybackState::Ready);
        } else {
            self.set_state(PlaybackState::Idle);
        }

        self.snapshot.position_seconds = 0.0;
        self.snapshot.normalized_progress = 0.0;
        self.update_snapshot(true);
    }

    fn seek(&mut self, seconds: f64) {
        if !self.has_source || !self.decoder.can_seek() {
            trace!("Seek ignored: source={}, seekable={}", self.has_source, self.decoder.can_seek());
            return;
        }

        let mut target = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        let duration = self.decoder.duration();
        if duration > 0.0 {
            target = target.min(duration);
        }

        debug!("Seeking to {:.2}s", target);
        self.decoder.seek(target);
        self.update_snapshot(true);
    }

    fn set_volume(&mut self, volume: f64) {
        let volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
        self.decoder.set_volume(volume);
    }

    fn state(&self) -> PlaybackState {
        self.state
    }

    fn snapshot(&self) -> &PlaybackSnapshot {
        &self.snapshot
    }

    fn last_error(&self) -> &PlaybackError {
        &self.last_error
    }

    fn has_source(&self) -> bool {
        self.has_source
    }

    fn current_source(&self) -> &str {
        &self.current_source
    }
}
