use clap::Parser;
use log::{info, warn};
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use vrplayer::config::AppConfig;
use vrplayer::data::{PlaybackEvent, PlaybackState};
use vrplayer::playback::{
    CallbackListener, Clock, PlaybackController, PlaybackListener, PlaybackService, SimulatedDecoder, SystemClock,
};

#[derive(Parser, Debug)]
#[command(name = "vrplayer_play")]
#[command(about = "Drive the playback controller with a simulated decoder")]
#[command(long_about = "Opens a source through the playback controller and plays it with a simulated\ndecoder, logging every event. Useful to check source validation, the prepare\ntimeout and end-of-stream handling without a real decoder. Press Ctrl+C to stop.")]
#[command(version)]
struct Args {
    /// Video URL or file path
    source: String,

    /// Length of the simulated stream in seconds
    #[arg(long, default_value_t = 5.0)]
    duration: f64,

    /// How long the simulated decoder takes to prepare, in milliseconds
    #[arg(long, default_value_t = 500)]
    prepare_delay_ms: u64,

    /// Restart at the end instead of pausing
    #[arg(long = "loop", default_value_t = false)]
    loop_playback: bool,

    /// JSON configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Controller tick interval in milliseconds
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
}

fn log_event(event: &PlaybackEvent) {
    match event {
        PlaybackEvent::StateChanged { state } => info!("State: {}", state),
        PlaybackEvent::PlaybackUpdated { snapshot } => info!(
            "Position {:.2}/{:.2}s ({:.0}%)",
            snapshot.position_seconds,
            snapshot.duration_seconds,
            snapshot.normalized_progress * 100.0
        ),
        PlaybackEvent::ErrorOccurred { error } => warn!("Error: {}", error),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if args.loop_playback {
        config.player.loop_playback = true;
    }
    if let Err(e) = config.logging.initialize_logger() {
        eprintln!("{}", e);
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let decoder = SimulatedDecoder::new(clock.clone(), args.duration)
        .with_prepare_delay(Duration::from_millis(args.prepare_delay_ms));
    let mut controller = PlaybackController::new(Box::new(decoder), clock, config.player.clone());

    let listener: Arc<dyn PlaybackListener> = Arc::new(CallbackListener::new(log_event));
    controller.register_listener(Arc::downgrade(&listener));

    if let Err(error) = controller.open(&args.source) {
        return Err(format!("Cannot open {}: {}", args.source, error).into());
    }
    controller.play();

    let tick = Duration::from_millis(args.tick_ms.max(1));
    while running.load(Ordering::SeqCst) {
        controller.tick();
        match controller.state() {
            PlaybackState::Error => break,
            PlaybackState::Paused if !config.player.loop_playback => break,
            _ => {}
        }
        thread::sleep(tick);
    }

    controller.stop();
    let error = controller.last_error();
    if error.has_error() {
        return Err(error.to_string().into());
    }
    Ok(())
}
