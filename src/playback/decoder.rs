use serde::{Serialize, Deserialize};

/// Callbacks a decoder reports back to its controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecoderEvent {
    /// Preparation finished, the stream can be played
    Prepared,
    /// Frames started flowing after `play`
    Started,
    /// Natural end of the stream was reached
    LoopPointReached,
    /// The decoder failed, with the platform's message
    Error(String),
}

/// Platform media decoder driven by a playback controller
///
/// Implementations wrap whatever actually decodes video on the host. All calls
/// happen on the controller's thread; asynchronous results are reported as
/// [`DecoderEvent`]s, either through [`MediaDecoder::poll_event`] or by the host
/// forwarding its own callbacks to the controller.
pub trait MediaDecoder: Send {
    /// Set the URL of the next stream, discarding the current one
    fn open(&mut self, url: &str);

    /// Start asynchronous preparation; completion is reported as `Prepared`
    fn prepare(&mut self);

    fn play(&mut self);

    fn pause(&mut self);

    /// Stop playback and release the prepared stream
    fn stop(&mut self);

    /// Move the playback head, in seconds
    fn seek(&mut self, seconds: f64);

    /// Volume in [0, 1]
    fn set_volume(&mut self, volume: f64);

    fn set_looping(&mut self, looping: bool);

    fn is_prepared(&self) -> bool;

    fn is_playing(&self) -> bool;

    /// Whether `seek` is supported for the current stream
    fn can_seek(&self) -> bool;

    /// Current position in seconds
    fn position(&self) -> f64;

    /// Stream length in seconds, 0 while unknown
    fn duration(&self) -> f64;

    /// Next pending callback, if the decoder queues them
    fn poll_event(&mut self) -> Option<DecoderEvent> {
        None
    }

    /// Name used in log output
    fn name(&self) -> &str {
        "decoder"
    }
}
