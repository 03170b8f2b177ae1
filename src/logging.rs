use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use env_logger::{Builder, Target, WriteStyle};
use log::{debug, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to read logging config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse logging config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown logging target: {0}")]
    UnknownTarget(String),

    #[error("Failed to initialize logger: {0}")]
    Init(#[from] log::SetLoggerError),
}

/// Parts of the player that can get their own log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LoggingSubsystem {
    /// Tools and anything not covered below
    Main,
    /// Playback controller and decoders
    Playback,
    /// Source validation
    Source,
    /// WebDAV client
    Webdav,
    /// HTTP transport
    Http,
    /// Local media catalog and video sources
    Library,
    /// File cache
    Cache,
    /// Configuration loading
    Config,
}

impl LoggingSubsystem {
    /// Module prefixes covered by this subsystem, comma separated
    pub fn module_prefix(&self) -> &'static str {
        match self {
            LoggingSubsystem::Main => "vrplayer",
            LoggingSubsystem::Playback => "vrplayer::playback",
            LoggingSubsystem::Source => "vrplayer::helpers::source_validator",
            LoggingSubsystem::Webdav => "vrplayer::webdav",
            LoggingSubsystem::Http => "vrplayer::helpers::http_client,vrplayer::helpers::retry,ureq",
            LoggingSubsystem::Library => "vrplayer::library::local_catalog,vrplayer::library::video_source",
            LoggingSubsystem::Cache => "vrplayer::library::file_cache",
            LoggingSubsystem::Config => "vrplayer::config",
        }
    }
}

/// Logging configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level (off, error, warn, info, debug, trace)
    pub level: String,

    /// stdout or stderr
    pub target: String,

    pub timestamps: bool,

    pub colors: bool,

    /// Per-subsystem levels; unknown keys are used as module paths
    pub subsystems: HashMap<String, String>,

    pub include_module_path: bool,

    pub include_line_numbers: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            target: "stderr".to_string(),
            timestamps: true,
            colors: true,
            subsystems: HashMap::new(),
            include_module_path: false,
            include_line_numbers: false,
        }
    }
}

/// Convert a level name to a filter; unknown names fall back to info
pub fn parse_log_level(level: &str) -> LevelFilter {
    match LevelFilter::from_str(level.trim()) {
        Ok(filter) => filter,
        Err(_) => {
            eprintln!("Warning: Unknown log level '{}', defaulting to 'info'", level);
            LevelFilter::Info
        }
    }
}

impl LoggingConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoggingError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, LoggingError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Module filters as (module prefix, level) pairs
    pub fn module_filters(&self) -> Vec<(String, LevelFilter)> {
        let mut filters = Vec::new();

        for (name, level) in &self.subsystems {
            let level = parse_log_level(level);
            match LoggingSubsystem::from_str(name) {
                Ok(subsystem) => {
                    for prefix in subsystem.module_prefix().split(',') {
                        filters.push((prefix.trim().to_string(), level));
                    }
                }
                Err(_) => filters.push((name.clone(), level)),
            }
        }

        filters.sort();
        filters
    }

    /// Filter in RUST_LOG syntax, used for diagnostics
    pub fn build_filter_string(&self) -> String {
        let mut parts = vec![self.level.to_lowercase()];
        for (module, level) in self.module_filters() {
            parts.push(format!("{}={}", module, level.to_string().to_lowercase()));
        }
        parts.join(",")
    }

    /// Logger builder for this configuration, with `RUST_LOG` applied on top
    fn builder(&self) -> Result<Builder, LoggingError> {
        let mut builder = Builder::new();
        builder.filter(None, parse_log_level(&self.level));
        for (module, level) in self.module_filters() {
            builder.filter(Some(&module), level);
        }
        // RUST_LOG directives override the configured levels
        builder.parse_env("RUST_LOG");

        builder.write_style(if self.colors { WriteStyle::Auto } else { WriteStyle::Never });

        match self.target.to_lowercase().as_str() {
            "stdout" => builder.target(Target::Stdout),
            "stderr" => builder.target(Target::Stderr),
            other => return Err(LoggingError::UnknownTarget(other.to_string())),
        };

        let include_module_path = self.include_module_path;
        let include_line_numbers = self.include_line_numbers;
        let timestamps = self.timestamps;

        builder.format(move |buf, record| {
            if timestamps {
                write!(buf, "[{}] ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))?;
            }
            write!(buf, "[{}] ", record.level())?;
            if include_module_path {
                if let Some(module) = record.module_path() {
                    write!(buf, "[{}] ", module)?;
                }
            }
            if include_line_numbers {
                if let (Some(file), Some(line)) = (record.file(), record.line()) {
                    write!(buf, "[{}:{}] ", file, line)?;
                }
            }
            writeln!(buf, "{}", record.args())
        });

        Ok(builder)
    }

    pub fn initialize_logger(&self) -> Result<(), LoggingError> {
        self.builder()?.try_init()?;
        debug!("Logging initialized with filter: {}", self.build_filter_string());
        Ok(())
    }
}

/// Initialize logging with default configuration
pub fn initialize_default_logging() -> Result<(), LoggingError> {
    LoggingConfig::default().initialize_logger()
}

/// Initialize logging from command line flags and an optional config file
///
/// `-d`/`--debug` and `-v`/`--verbose` raise the global level to debug.
pub fn initialize_logging_with_args(args: &[String], config_file: Option<&Path>) -> Result<(), LoggingError> {
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");
    let verbose_mode = args.iter().any(|arg| arg == "--verbose" || arg == "-v");

    let mut missing_file = None;
    let mut config = match config_file {
        Some(path) if path.exists() => LoggingConfig::from_file(path)?,
        Some(path) => {
            missing_file = Some(path.to_path_buf());
            LoggingConfig::default()
        }
        None => LoggingConfig::default(),
    };

    if debug_mode || verbose_mode {
        config.level = "debug".to_string();
    }

    config.initialize_logger()?;

    if let Some(path) = missing_file {
        warn!("Logging config file {:?} not found, using defaults", path);
    }
    if debug_mode || verbose_mode {
        info!("Debug logging enabled via command line");
    }
    Ok(())
}
