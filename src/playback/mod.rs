/// Playback state machine and the abstractions it is driven through
pub mod clock;
pub mod controller;
pub mod decoder;
pub mod listeners;
pub mod simulated_decoder;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{PlaybackController, PlaybackService};
pub use decoder::{DecoderEvent, MediaDecoder};
pub use listeners::{CallbackListener, ListenerRegistry, PlaybackListener};
pub use simulated_decoder::{DecoderCalls, SimulatedDecoder};
