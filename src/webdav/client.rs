use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::WebDavConfig;
use crate::data::{extension_of, is_360_name, is_supported_extension, VideoFile};
use crate::helpers::http_client::{is_success_status, new_http_client, HttpClient, HttpClientError};
use crate::helpers::retry::RetryHandler;
use crate::webdav::multistatus::parse_multistatus;

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

const CONNECT_BODY: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
    "<d:propfind xmlns:d=\"DAV:\"><d:prop><d:displayname/></d:prop></d:propfind>"
);

const LIST_BODY: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
    "<d:propfind xmlns:d=\"DAV:\">",
    "<d:prop><d:displayname/><d:getcontentlength/><d:resourcetype/></d:prop>",
    "</d:propfind>"
);

const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// A video file found on the server
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteFileEntry {
    pub name: String,
    /// Decoded href, relative to the server root
    pub remote_path: String,
    pub url: String,
    pub size_bytes: u64,
    pub is_360: bool,
}

impl From<RemoteFileEntry> for VideoFile {
    fn from(entry: RemoteFileEntry) -> Self {
        VideoFile {
            name: entry.name,
            path: entry.remote_path,
            url: entry.url,
            is_360: entry.is_360,
            size: entry.size_bytes,
            local_path: String::new(),
        }
    }
}

/// Reasons a single download attempt fails
#[derive(Debug, Error)]
enum DownloadError {
    #[error(transparent)]
    Http(#[from] HttpClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server returned HTTP {0}")]
    Status(u16),

    #[error("Body ended after {received} of {expected} bytes")]
    Truncated { received: u64, expected: u64 },

    #[error("Download cancelled")]
    Cancelled,
}

/// Forwards progress to the caller, never letting it go backwards
struct ProgressReporter<'a> {
    callback: Option<&'a mut dyn FnMut(f32)>,
    last: f32,
}

impl<'a> ProgressReporter<'a> {
    fn new(callback: Option<&'a mut dyn FnMut(f32)>) -> Self {
        Self { callback, last: 0.0 }
    }

    fn report(&mut self, value: f32) {
        let value = value.clamp(0.0, 100.0);
        if value < self.last {
            return;
        }
        self.last = value;
        if let Some(callback) = self.callback.as_deref_mut() {
            callback(value);
        }
    }
}

/// Trim whitespace and trailing slashes from a server URL
pub fn normalize_server_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Join a server URL and a path; absolute http(s) paths are returned unchanged
pub fn combine_url(base_url: &str, path: &str) -> String {
    if base_url.trim().is_empty() {
        return path.to_string();
    }
    let path = path.trim();
    if path.is_empty() {
        return base_url.to_string();
    }

    let lower = path.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return path.to_string();
    }

    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Percent-encode each segment of a decoded path, keeping the separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn part_path(local_path: &str) -> PathBuf {
    PathBuf::from(format!("{}.part", local_path))
}

fn remove_if_exists(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Client for browsing and downloading videos from a WebDAV server
pub struct RemoteFileClient {
    config: WebDavConfig,
    transport: Box<dyn HttpClient>,
    server_url: String,
    username: String,
    password: String,
    connected: bool,
    cached_files: Vec<RemoteFileEntry>,
}

impl RemoteFileClient {
    pub fn new(config: WebDavConfig, transport: Box<dyn HttpClient>) -> Self {
        let config = config.sanitized();
        Self {
            server_url: normalize_server_url(&config.server_url),
            username: config.username.clone(),
            password: config.password.clone(),
            config,
            transport,
            connected: false,
            cached_files: Vec::new(),
        }
    }

    /// Create a client that talks HTTP through ureq
    pub fn with_default_transport(config: WebDavConfig) -> Self {
        let timeout = config.clone().sanitized().request_timeout_secs;
        Self::new(config, new_http_client(timeout))
    }

    pub fn config(&self) -> &WebDavConfig {
        &self.config
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Entries of the last successful listing
    pub fn cached_files(&self) -> Vec<RemoteFileEntry> {
        self.cached_files.clone()
    }

    /// URL for a decoded server path, or the path itself when it is already a URL
    fn resource_url(&self, path: &str) -> String {
        let lower = path.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            path.to_string()
        } else {
            combine_url(&self.server_url, &encode_path(path))
        }
    }

    fn auth_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
    }

    /// Store the server and credentials and check that the server answers
    ///
    /// A depth-0 PROPFIND is tried first; servers that reject it are probed with a GET.
    pub fn connect(&mut self, url: &str, username: &str, password: &str) -> bool {
        self.server_url = normalize_server_url(url);
        self.username = username.to_string();
        self.password = password.to_string();

        if self.server_url.is_empty() {
            warn!("Cannot connect: no server URL");
            self.connected = false;
            return false;
        }

        let root_url = format!("{}/", self.server_url);
        let auth = self.auth_header();

        let propfind = self.transport.send(
            "PROPFIND",
            &root_url,
            &[("Authorization", auth.as_str()), ("Depth", "0"), ("Content-Type", XML_CONTENT_TYPE)],
            Some(CONNECT_BODY),
        );

        let mut connected = match propfind {
            Ok(response) => {
                debug!("PROPFIND {} returned HTTP {}", root_url, response.status);
                response.is_success()
            }
            Err(e) => {
                debug!("PROPFIND {} failed: {}", root_url, e);
                false
            }
        };

        if !connected {
            connected = match self.transport.send("GET", &root_url, &[("Authorization", auth.as_str())], None) {
                Ok(response) => response.is_success(),
                Err(e) => {
                    debug!("GET {} failed: {}", root_url, e);
                    false
                }
            };
        }

        self.connected = connected;
        if connected {
            info!("WebDAV connected: {}", self.server_url);
        } else {
            error!("WebDAV connection failed: {}", self.server_url);
        }
        connected
    }

    /// List the supported video files in a directory
    ///
    /// An empty path lists the configured base path. Failures yield an empty list.
    pub fn list_files(&mut self, path: &str) -> Vec<RemoteFileEntry> {
        if !self.connected {
            debug!("list_files called while not connected");
            return Vec::new();
        }

        let mut path = if path.trim().is_empty() {
            self.config.base_path.clone()
        } else {
            path.trim().to_string()
        };
        if !path.starts_with('/') {
            path.insert(0, '/');
        }

        let target_url = self.resource_url(&path);
        let auth = self.auth_header();

        let response = match self.transport.send(
            "PROPFIND",
            &target_url,
            &[("Authorization", auth.as_str()), ("Depth", "1"), ("Content-Type", XML_CONTENT_TYPE)],
            Some(LIST_BODY),
        ) {
            Ok(response) => response,
            Err(e) => {
                error!("List files failed: {}", e);
                return Vec::new();
            }
        };

        if !response.is_success() {
            error!("List files failed: HTTP {}", response.status);
            return Vec::new();
        }

        let files = self.parse_listing(&response.body);
        debug!("Listed {} video file(s) under {}", files.len(), path);
        self.cached_files = files.clone();
        files
    }

    fn parse_listing(&self, xml: &str) -> Vec<RemoteFileEntry> {
        let entries = match parse_multistatus(xml) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Parse WebDAV response failed: {}", e);
                return Vec::new();
            }
        };

        let mut seen: Vec<String> = Vec::new();
        let mut files = Vec::new();

        for entry in entries {
            if entry.href.trim().is_empty() {
                continue;
            }
            let key = entry.href.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);

            if !entry.has_props || entry.is_collection {
                continue;
            }

            let name = match entry.display_name {
                Some(name) => name,
                None => entry
                    .href
                    .trim_end_matches('/')
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_string(),
            };

            match extension_of(&name) {
                Some(ext) if is_supported_extension(&ext) => {}
                _ => continue,
            }

            files.push(RemoteFileEntry {
                url: combine_url(&self.server_url, &entry.href),
                is_360: is_360_name(&name),
                size_bytes: entry.content_length.unwrap_or(0),
                remote_path: entry.href,
                name,
            });
        }

        files
    }

    /// Download a remote file to `local_path`, retrying on failure
    pub fn download_file(
        &self,
        remote_path: &str,
        local_path: &str,
        on_progress: Option<&mut dyn FnMut(f32)>,
    ) -> bool {
        self.download(remote_path, local_path, on_progress, None)
    }

    /// Like [`download_file`](Self::download_file), aborting once `cancel` is set
    pub fn download_file_with_cancel(
        &self,
        remote_path: &str,
        local_path: &str,
        on_progress: Option<&mut dyn FnMut(f32)>,
        cancel: &Arc<AtomicBool>,
    ) -> bool {
        self.download(remote_path, local_path, on_progress, Some(cancel))
    }

    fn download(
        &self,
        remote_path: &str,
        local_path: &str,
        on_progress: Option<&mut dyn FnMut(f32)>,
        cancel: Option<&Arc<AtomicBool>>,
    ) -> bool {
        if !self.connected || remote_path.trim().is_empty() || local_path.trim().is_empty() {
            return false;
        }

        let download_url = self.resource_url(remote_path.trim());
        let destination = Path::new(local_path);
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    error!("Failed to create {}: {}", parent.display(), e);
                    return false;
                }
            }
        }

        let temp_path = part_path(local_path);
        let total_attempts = self.config.download_retry_count as usize + 1;
        let mut retry = RetryHandler::fixed(total_attempts, Duration::from_millis(self.config.retry_backoff_ms));
        let mut progress = ProgressReporter::new(on_progress);

        let result = retry.execute_with_retry(
            |attempt| {
                remove_if_exists(&temp_path);
                match self.download_attempt(&download_url, &temp_path, attempt, total_attempts, &mut progress, cancel) {
                    Ok(()) => Some(()),
                    Err(DownloadError::Cancelled) => {
                        info!("Download of {} cancelled", download_url);
                        None
                    }
                    Err(e) => {
                        warn!("Download failed (attempt {}/{}): {}", attempt + 1, total_attempts, e);
                        None
                    }
                }
            },
            cancel,
            "download",
        );

        if result.is_none() {
            remove_if_exists(&temp_path);
            return false;
        }

        // rename only replaces an existing file atomically on unix
        #[cfg(windows)]
        {
            if destination.exists() {
                if let Err(e) = fs::remove_file(destination) {
                    error!("Failed to replace {}: {}", local_path, e);
                    remove_if_exists(&temp_path);
                    return false;
                }
            }
        }

        if let Err(e) = fs::rename(&temp_path, destination) {
            error!("Move downloaded file failed: {}", e);
            remove_if_exists(&temp_path);
            return false;
        }

        progress.report(100.0);
        info!("Download succeeded: {}", local_path);
        true
    }

    fn download_attempt(
        &self,
        url: &str,
        temp_path: &Path,
        attempt: usize,
        total_attempts: usize,
        progress: &mut ProgressReporter<'_>,
        cancel: Option<&Arc<AtomicBool>>,
    ) -> Result<(), DownloadError> {
        let is_cancelled = || cancel.map(|flag| flag.load(Ordering::SeqCst)).unwrap_or(false);
        let auth = self.auth_header();

        let mut stream = self.transport.open_stream(url, &[("Authorization", auth.as_str())])?;
        if !is_success_status(stream.status) {
            return Err(DownloadError::Status(stream.status));
        }

        let base = attempt as f32 / total_attempts as f32 * 100.0;
        progress.report(base);

        let mut writer = BufWriter::new(File::create(temp_path)?);
        let mut buffer = vec![0u8; DOWNLOAD_CHUNK_SIZE];
        let mut received: u64 = 0;

        loop {
            if is_cancelled() {
                return Err(DownloadError::Cancelled);
            }

            let read = stream.reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            writer.write_all(&buffer[..read])?;
            received += read as u64;

            if let Some(expected) = stream.content_length.filter(|len| *len > 0) {
                let fraction = (received as f32 / expected as f32).min(1.0);
                progress.report((attempt as f32 + fraction) / total_attempts as f32 * 100.0);
            }
        }

        writer.flush()?;

        if let Some(expected) = stream.content_length {
            if received < expected {
                return Err(DownloadError::Truncated { received, expected });
            }
        }

        debug!("Downloaded {} bytes from {}", received, url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_server_url() {
        assert_eq!(normalize_server_url("  https://dav.example.com/ "), "https://dav.example.com");
        assert_eq!(normalize_server_url("https://dav.example.com///"), "https://dav.example.com");
        assert_eq!(normalize_server_url("   "), "");
    }

    #[test]
    fn test_combine_url() {
        assert_eq!(combine_url("https://h", "/a/b.mp4"), "https://h/a/b.mp4");
        assert_eq!(combine_url("https://h/", "a.mp4"), "https://h/a.mp4");
        assert_eq!(combine_url("https://h", ""), "https://h");
        assert_eq!(combine_url("", "/a.mp4"), "/a.mp4");
        assert_eq!(combine_url("https://h", "HTTPS://other/x.mp4"), "HTTPS://other/x.mp4");
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("/videos/Alps 360.mp4"), "/videos/Alps%20360.mp4");
        assert_eq!(encode_path("/"), "/");
    }

    #[test]
    fn test_progress_never_goes_back() {
        let mut seen = Vec::new();
        {
            let mut callback = |value: f32| seen.push(value);
            let mut reporter = ProgressReporter::new(Some(&mut callback));
            reporter.report(10.0);
            reporter.report(5.0);
            reporter.report(150.0);
        }
        assert_eq!(seen, vec![10.0, 100.0]);
    }

    #[test]
    fn test_entry_into_video_file() {
        let entry = RemoteFileEntry {
            name: "a 360.mp4".to_string(),
            remote_path: "/v/a 360.mp4".to_string(),
            url: "https://h/v/a 360.mp4".to_string(),
            size_bytes: 12,
            is_360: true,
        };
        let file: VideoFile = entry.into();
        assert_eq!(file.path, "/v/a 360.mp4");
        assert_eq!(file.size, 12);
        assert!(!file.is_downloaded());
    }
}
