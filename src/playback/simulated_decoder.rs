use crate::playback::clock::Clock;
use crate::playback::decoder::{DecoderEvent, MediaDecoder};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use log::debug;

/// How often each decoder operation was invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderCalls {
    pub open: usize,
    pub prepare: usize,
    pub play: usize,
    pub pause: usize,
    pub stop: usize,
    pub seek: usize,
}

#[derive(Debug)]
struct SimulatedState {
    url: Option<String>,
    duration: f64,
    seekable: bool,
    prepare_delay: Option<Duration>,
    prepare_failure: Option<String>,
    prepare_requested_at: Option<Duration>,
    prepared: bool,
    playing: bool,
    looping: bool,
    volume: f64,
    position_base: f64,
    play_started_at: Option<Duration>,
    events: VecDeque<DecoderEvent>,
    calls: DecoderCalls,
}

/// In-process decoder that simulates preparation and playback against a clock
///
/// No media is decoded. Preparation completes after `prepare_delay` (or only when
/// [`SimulatedDecoder::complete_prepare`] is called if no delay is set), and the
/// position advances with the clock while playing. Clones share state, so one
/// handle can be given to a controller while another drives or inspects it.
#[derive(Clone)]
pub struct SimulatedDecoder {
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedDecoder {
    /// Create a decoder for streams of `duration` seconds
    pub fn new(clock: Arc<dyn Clock>, duration: f64) -> Self {
        debug!("Creating SimulatedDecoder with duration {:.2}s", duration);
        Self {
            clock,
            state: Arc::new(Mutex::new(SimulatedState {
                url: None,
                duration: duration.max(0.0),
                seekable: true,
                prepare_delay: None,
                prepare_failure: None,
                prepare_requested_at: None,
                prepared: false,
                playing: false,
                looping: false,
                volume: 1.0,
                position_base: 0.0,
                play_started_at: None,
                events: VecDeque::new(),
                calls: DecoderCalls::default(),
            })),
        }
    }

    /// Complete preparation automatically after `delay`
    pub fn with_prepare_delay(self, delay: Duration) -> Self {
        self.lock().prepare_delay = Some(delay);
        self
    }

    /// Fail every preparation with `message`
    pub fn with_prepare_failure(self, message: &str) -> Self {
        self.lock().prepare_failure = Some(message.to_string());
        self
    }

    pub fn with_seekable(self, seekable: bool) -> Self {
        self.lock().seekable = seekable;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_position(state: &SimulatedState, now: Duration) -> f64 {
        match state.play_started_at {
            Some(started) if state.playing => {
                let elapsed = now.saturating_sub(started).as_secs_f64();
                (state.position_base + elapsed).min(state.duration)
            }
            _ => state.position_base,
        }
    }

    /// Finish a pending preparation now
    pub fn complete_prepare(&self) {
        let mut state = self.lock();
        state.prepare_requested_at = None;
        state.prepared = true;
        state.events.push_back(DecoderEvent::Prepared);
    }

    /// Report a decoder failure
    pub fn fail(&self, message: &str) {
        self.lock().events.push_back(DecoderEvent::Error(message.to_string()));
    }

    /// Jump to the end of the stream as if it played out
    pub fn reach_end(&self) {
        let now = self.clock.now();
        let mut state = self.lock();
        Self::finish_stream(&mut state, now);
    }

    fn finish_stream(state: &mut SimulatedState, now: Duration) {
        if state.looping {
            state.position_base = 0.0;
            state.play_started_at = Some(now);
        } else {
            state.position_base = state.duration;
            state.playing = false;
            state.play_started_at = None;
        }
        state.events.push_back(DecoderEvent::LoopPointReached);
    }

    /// Queue an arbitrary event
    pub fn push_event(&self, event: DecoderEvent) {
        self.lock().events.push_back(event);
    }

    pub fn calls(&self) -> DecoderCalls {
        self.lock().calls
    }

    pub fn url(&self) -> Option<String> {
        self.lock().url.clone()
    }

    pub fn volume(&self) -> f64 {
        self.lock().volume
    }

    pub fn looping(&self) -> bool {
        self.lock().looping
    }

    /// Number of events waiting to be polled
    pub fn pending_events(&self) -> usize {
        self.lock().events.len()
    }
}

impl MediaDecoder for SimulatedDecoder {
    fn open(&mut self, url: &str) {
        let mut state = self.lock();
        state.calls.open += 1;
        state.url = Some(url.to_string());
        state.prepared = false;
        state.playing = false;
        state.position_base = 0.0;
        state.play_started_at = None;
        state.prepare_requested_at = None;
        state.events.clear();
    }

    fn prepare(&mut self) {
        let now = self.clock.now();
        let mut state = self.lock();
        state.calls.prepare += 1;
        if let Some(message) = state.prepare_failure.clone() {
            state.events.push_back(DecoderEvent::Error(message));
            return;
        }
        state.prepare_requested_at = Some(now);
    }

    fn play(&mut self) {
        let now = self.clock.now();
        let mut state = self.lock();
        state.calls.play += 1;
        if !state.prepared || state.playing {
            return;
        }
        if state.duration > 0.0 && state.position_base >= state.duration {
            state.position_base = 0.0;
        }
        state.playing = true;
        state.play_started_at = Some(now);
        state.events.push_back(DecoderEvent::Started);
    }

    fn pause(&mut self) {
        let now = self.clock.now();
        let mut state = self.lock();
        state.calls.pause += 1;
        state.position_base = Self::current_position(&state, now);
        state.playing = false;
        state.play_started_at = None;
    }

    fn stop(&mut self) {
        let mut state = self.lock();
        state.calls.stop += 1;
        state.playing = false;
        state.prepared = false;
        state.position_base = 0.0;
        state.play_started_at = None;
        state.prepare_requested_at = None;
        state.events.clear();
    }

    fn seek(&mut self, seconds: f64) {
        let now = self.clock.now();
        let mut state = self.lock();
        state.calls.seek += 1;
        state.position_base = seconds.clamp(0.0, state.duration);
        if state.playing {
            state.play_started_at = Some(now);
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.lock().volume = volume;
    }

    fn set_looping(&mut self, looping: bool) {
        self.lock().looping = looping;
    }

    fn is_prepared(&self) -> bool {
        self.lock().prepared
    }

    fn is_playing(&self) -> bool {
        self.lock().playing
    }

    fn can_seek(&self) -> bool {
        let state = self.lock();
        state.prepared && state.seekable
    }

    fn position(&self) -> f64 {
        let now = self.clock.now();
        let state = self.lock();
        Self::current_position(&state, now)
    }

    fn duration(&self) -> f64 {
        let state = self.lock();
        if state.prepared {
            state.duration
        } else {
            0.0
        }
    }

    fn poll_event(&mut self) -> Option<DecoderEvent> {
        let now = self.clock.now();
        let mut state = self.lock();

        if let (Some(requested), Some(delay)) = (state.prepare_requested_at, state.prepare_delay) {
            if now.saturating_sub(requested) >= delay {
                state.prepare_requested_at = None;
                state.prepared = true;
                state.events.push_back(DecoderEvent::Prepared);
            }
        }

        if state.playing && state.duration > 0.0 && Self::current_position(&state, now) >= state.duration {
            Self::finish_stream(&mut state, now);
        }

        state.events.pop_front()
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
