use clap::{Parser, Subcommand};
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use vrplayer::config::AppConfig;
use vrplayer::logging::initialize_logging_with_args;
use vrplayer::webdav::RemoteFileClient;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Browse and download videos from a WebDAV server", long_about = None)]
struct Args {
    /// WebDAV server URL; overrides the config file
    #[clap(long)]
    url: Option<String>,

    #[clap(long, short = 'u')]
    user: Option<String>,

    #[clap(long, short = 'p')]
    password: Option<String>,

    /// JSON configuration file with a "webdav" section
    #[clap(long, short = 'c')]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[clap(long, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the videos in a directory
    ///
    /// Example: vrplayer_webdav --url https://dav.example.com list /videos
    List {
        /// Directory to list, defaults to the configured base path
        path: Option<String>,
    },
    /// Download a video; Ctrl+C cancels
    ///
    /// Example: vrplayer_webdav --url https://dav.example.com download "/videos/Alps 360.mp4" ./alps.mp4
    Download {
        /// Path of the file on the server
        remote: String,

        /// Destination file
        local: String,
    },
}

fn list(client: &mut RemoteFileClient, path: &str) {
    let files = client.list_files(path);
    if files.is_empty() {
        println!("No videos found");
        return;
    }

    for file in &files {
        let marker = if file.is_360 { "360" } else { "   " };
        println!("{} {:>12}  {}", marker, file.size_bytes, file.remote_path);
    }
    println!("{} video(s)", files.len());
}

fn download(client: &RemoteFileClient, remote: &str, local: &str) -> bool {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived Ctrl+C, cancelling download...");
        flag.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let mut last_percent = -1;
    let mut on_progress = |value: f32| {
        let percent = value as i32;
        if percent != last_percent {
            last_percent = percent;
            print!("\r{:3}%", percent);
            let _ = std::io::stdout().flush();
        }
    };

    let ok = client.download_file_with_cancel(remote, local, Some(&mut on_progress), &cancel);
    println!();
    ok
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let log_args: Vec<String> = if args.verbose { vec!["--verbose".to_string()] } else { Vec::new() };
    if let Err(e) = initialize_logging_with_args(&log_args, None) {
        eprintln!("{}", e);
    }

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)?.sanitized(),
        None => AppConfig::default(),
    };
    let mut webdav = config.webdav.clone();
    if let Some(url) = &args.url {
        webdav.server_url = url.clone();
    }
    if let Some(user) = &args.user {
        webdav.username = user.clone();
    }
    if let Some(password) = &args.password {
        webdav.password = password.clone();
    }

    let server_url = webdav.server_url.clone();
    let username = webdav.username.clone();
    let password = webdav.password.clone();
    let mut client = RemoteFileClient::with_default_transport(webdav);

    if !client.connect(&server_url, &username, &password) {
        return Err(format!("Could not connect to {}", server_url).into());
    }

    match &args.command {
        Commands::List { path } => {
            list(&mut client, path.as_deref().unwrap_or(""));
        }
        Commands::Download { remote, local } => {
            if !download(&client, remote, local) {
                return Err(format!("Download of {} failed", remote).into());
            }
            println!("Saved to {}", local);
        }
    }

    Ok(())
}
