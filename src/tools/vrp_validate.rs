use clap::Parser;
use std::process::ExitCode;

use vrplayer::helpers::source_validator::validate_source;
use vrplayer::logging::initialize_default_logging;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Check whether video sources can be opened by the player", long_about = None)]
struct Args {
    /// Sources to check: URLs, file:// URLs or file paths
    #[clap(required = true)]
    sources: Vec<String>,

    /// Print the source kind and local path as well
    #[clap(long, short = 'v')]
    verbose: bool,

    /// Only set the exit code
    #[clap(long, short = 'q')]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if args.verbose {
        if let Err(e) = initialize_default_logging() {
            eprintln!("{}", e);
        }
    }

    let mut failures = 0;
    for source in &args.sources {
        match validate_source(source) {
            Ok(normalized) => {
                if args.quiet {
                    continue;
                }
                if args.verbose {
                    let local = normalized
                        .local_path()
                        .map(|path| path.display().to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("OK    {:<12} {} (local: {})", format!("{:?}", normalized.kind()), normalized.url(), local);
                } else {
                    println!("OK    {}", normalized.url());
                }
            }
            Err(error) => {
                failures += 1;
                if !args.quiet {
                    println!("FAIL  {:<18} {}", error.code.to_string(), error.message);
                }
            }
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
