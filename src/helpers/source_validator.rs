/*!
 * Media source validation and normalization
 *
 * Turns whatever the host hands us (a local path, a `file://` URI, an HTTP URL or a
 * platform content URI) into a URL the decoder can open, rejecting sources that can
 * never play before they reach the decoder.
 */

use std::path::{Path, PathBuf};
use log::debug;
use crate::data::{extension_of, is_supported_extension, ErrorKind, PlaybackError};

/// Prefixes that are handed to the decoder unchanged
const PASS_THROUGH_SCHEMES: [&str; 5] = ["http://", "https://", "file://", "content://", "jar:file://"];

/// Where a normalized source points to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// http:// or https://
    Remote,
    /// file:// URI or an absolute filesystem path
    LocalFile,
    /// Platform content URI, access is only known once the decoder tries
    ContentUri,
    /// jar:file:// (packaged application assets)
    Archive,
    /// Anything else, e.g. a relative path
    Other,
}

/// A source that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSource {
    url: String,
    kind: SourceKind,
    local_path: Option<PathBuf>,
}

impl NormalizedSource {
    /// URL to hand to the decoder
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Filesystem path for local sources
    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    pub fn into_url(self) -> String {
        self.url
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn is_drive_rooted(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

fn classify(source: &str) -> SourceKind {
    if starts_with_ignore_case(source, "http://") || starts_with_ignore_case(source, "https://") {
        SourceKind::Remote
    } else if starts_with_ignore_case(source, "jar:file://") {
        SourceKind::Archive
    } else if starts_with_ignore_case(source, "content://") {
        SourceKind::ContentUri
    } else if starts_with_ignore_case(source, "file://") {
        SourceKind::LocalFile
    } else {
        SourceKind::Other
    }
}

/// Absolute filesystem path behind a scheme-less source, with forward slashes
fn raw_local_path(source: &str) -> Option<String> {
    if PASS_THROUGH_SCHEMES.iter().any(|scheme| starts_with_ignore_case(source, scheme)) {
        return None;
    }
    let normalized = source.replace('\\', "/");
    if normalized.starts_with('/') || is_drive_rooted(&normalized) {
        Some(normalized)
    } else {
        None
    }
}

/// `file://` URL for an absolute path, percent-encoding each segment
pub fn path_to_file_url(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let encoded: Vec<String> = normalized
        .split('/')
        .enumerate()
        .map(|(index, segment)| {
            if index == 0 && is_drive_rooted(&normalized) {
                segment.to_string()
            } else {
                urlencoding::encode(segment).into_owned()
            }
        })
        .collect();
    let encoded = encoded.join("/");

    if is_drive_rooted(&normalized) {
        format!("file:///{}", encoded)
    } else {
        format!("file://{}", encoded)
    }
}

/// Normalize a raw source into a decoder URL
///
/// Known schemes pass through trimmed. Absolute paths become percent-encoded
/// `file://` URIs with forward slashes (`file:///C:/...` for drive-rooted paths).
/// Anything else is returned trimmed.
pub fn normalize_source(raw: &str) -> String {
    let path = raw.trim();
    if path.is_empty() {
        return String::new();
    }

    match raw_local_path(path) {
        Some(local) => path_to_file_url(&local),
        None => path.to_string(),
    }
}

/// Path component of a URI, without scheme, authority, query or fragment
fn uri_path(source: &str) -> String {
    let without_fragment = source.split('#').next().unwrap_or(source);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);

    match without_query.find("://") {
        Some(index) => {
            let rest = &without_query[index + 3..];
            match classify(source) {
                SourceKind::LocalFile => rest.to_string(),
                _ => rest.find('/').map(|slash| rest[slash..].to_string()).unwrap_or_default(),
            }
        }
        None => without_query.to_string(),
    }
}

/// Filesystem path behind a `file://` URI
fn file_uri_to_path(uri: &str) -> String {
    let path = uri_path(uri);
    let decoded = urlencoding::decode(&path)
        .map(|p| p.into_owned())
        .unwrap_or(path);

    // file:///C:/videos -> C:/videos
    let trimmed = decoded.trim_start_matches('/');
    if is_drive_rooted(trimmed) {
        trimmed.to_string()
    } else {
        decoded
    }
}

/// Validate a raw source and return its normalized form
///
/// Remote and content URIs are only checked structurally; local paths must exist.
pub fn validate_source(raw: &str) -> Result<NormalizedSource, PlaybackError> {
    if raw.trim().is_empty() {
        return Err(PlaybackError::new(ErrorKind::InvalidSource, "Video source is empty.", ""));
    }

    let url = normalize_source(raw);
    let kind = classify(&url);
    // Plain paths are checked as given, only real URIs are parsed and decoded
    let raw_path = raw_local_path(raw.trim());

    let extension_candidate = match (&raw_path, kind) {
        (Some(path), _) => path.clone(),
        (None, SourceKind::Other) => url.replace('\\', "/"),
        (None, SourceKind::LocalFile) => file_uri_to_path(&url),
        (None, _) => uri_path(&url),
    };
    if let Some(extension) = extension_of(&extension_candidate) {
        if !is_supported_extension(&extension) {
            return Err(PlaybackError::new(
                ErrorKind::UnsupportedFormat,
                format!("Unsupported media format: {}", extension),
                url,
            ));
        }
    }

    let local_path = if kind == SourceKind::LocalFile {
        let path = PathBuf::from(raw_path.unwrap_or_else(|| file_uri_to_path(&url)));
        if !path.is_file() {
            return Err(PlaybackError::new(
                ErrorKind::FileNotFound,
                format!("File does not exist: {}", path.display()),
                url,
            ));
        }
        Some(path)
    } else {
        None
    };

    debug!("Validated source {} as {:?}", url, kind);
    Ok(NormalizedSource { url, kind, local_path })
}

/// Map a decoder error message to an error kind using keyword heuristics
pub fn map_error_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if contains_any(&["permission", "denied", "forbidden"]) {
        ErrorKind::PermissionDenied
    } else if contains_any(&["not found", "no such file", "404"]) {
        ErrorKind::FileNotFound
    } else if contains_any(&["unsupported", "format"]) {
        ErrorKind::UnsupportedFormat
    } else if contains_any(&["decode", "codec", "decoder"]) {
        ErrorKind::DecoderFailure
    } else {
        ErrorKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_source_is_invalid() {
        for raw in ["", "   ", "\t\n"] {
            let error = validate_source(raw).unwrap_err();
            assert_eq!(error.code, ErrorKind::InvalidSource);
        }
    }

    #[test]
    fn test_normalize_paths() {
        assert_eq!(normalize_source("  /sdcard/a.mp4 "), "file:///sdcard/a.mp4");
        assert_eq!(normalize_source("C:\\Videos\\a.mp4"), "file:///C:/Videos/a.mp4");
        assert_eq!(normalize_source("HTTPS://host/a.mp4"), "HTTPS://host/a.mp4");
        assert_eq!(normalize_source("content://media/external/video/12"), "content://media/external/video/12");
        assert_eq!(normalize_source("videos/a.mp4"), "videos/a.mp4");
    }

    #[test]
    fn test_existing_local_files_normalize_to_file_uri() {
        let dir = TempDir::new().unwrap();
        for ext in ["mp4", "mkv", "mov", "MP4"] {
            let path = dir.path().join(format!("clip.{}", ext));
            fs::write(&path, b"data").unwrap();
            let raw = path.to_str().unwrap();

            let source = validate_source(raw).unwrap();
            assert_eq!(source.kind(), SourceKind::LocalFile);
            assert!(source.url().starts_with("file://"));
            assert_eq!(source.local_path(), Some(path.as_path()));
        }
    }

    #[test]
    fn test_missing_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.mp4");
        let error = validate_source(path.to_str().unwrap()).unwrap_err();
        assert_eq!(error.code, ErrorKind::FileNotFound);

        let uri = format!("file://{}", path.to_str().unwrap());
        let error = validate_source(&uri).unwrap_err();
        assert_eq!(error.code, ErrorKind::FileNotFound);
    }

    #[test]
    fn test_file_uri_is_percent_decoded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("my clip.mp4");
        fs::write(&path, b"data").unwrap();
        let uri = format!("file://{}", path.to_str().unwrap().replace(' ', "%20"));
        assert!(validate_source(&uri).is_ok());
    }

    #[test]
    fn test_special_characters_in_file_names() {
        let dir = TempDir::new().unwrap();
        for name in ["Episode #3.mp4", "what?.mp4", "100%25.mp4", "50% off.mkv"] {
            let path = dir.path().join(name);
            fs::write(&path, b"data").unwrap();

            let source = validate_source(path.to_str().unwrap()).unwrap();
            assert_eq!(source.kind(), SourceKind::LocalFile);
            assert_eq!(source.local_path(), Some(path.as_path()));

            // The normalized URL points back at the same file
            let again = validate_source(source.url()).unwrap();
            assert_eq!(again.local_path(), Some(path.as_path()));
        }
    }

    #[test]
    fn test_file_url_encoding() {
        assert_eq!(path_to_file_url("/videos/Episode #3.mp4"), "file:///videos/Episode%20%233.mp4");
        assert_eq!(path_to_file_url("C:\\Videos\\a?.mp4"), "file:///C:/Videos/a%3F.mp4");
        assert_eq!(normalize_source("/v/100%.mp4"), "file:///v/100%25.mp4");
    }

    #[test]
    fn test_unsupported_extension() {
        let error = validate_source("/videos/clip.avi").unwrap_err();
        assert_eq!(error.code, ErrorKind::UnsupportedFormat);
        assert_eq!(error.message, "Unsupported media format: .avi");

        let error = validate_source("https://host/stream.m3u8?token=1").unwrap_err();
        assert_eq!(error.code, ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_remote_sources_skip_existence_check() {
        let source = validate_source("https://cdn.example.com/v/clip.mp4?sig=abc.def").unwrap();
        assert_eq!(source.kind(), SourceKind::Remote);
        assert_eq!(source.url(), "https://cdn.example.com/v/clip.mp4?sig=abc.def");

        let source = validate_source("http://example.com/live").unwrap();
        assert_eq!(source.kind(), SourceKind::Remote);
    }

    #[test]
    fn test_content_uri_is_structurally_valid() {
        let source = validate_source("content://com.android.providers.media/video/media/42").unwrap();
        assert_eq!(source.kind(), SourceKind::ContentUri);
        assert!(source.local_path().is_none());
    }

    #[test]
    fn test_map_error_message() {
        assert_eq!(map_error_message("Permission denied by provider"), ErrorKind::PermissionDenied);
        assert_eq!(map_error_message("HTTP 404"), ErrorKind::FileNotFound);
        assert_eq!(map_error_message("No such file or directory"), ErrorKind::FileNotFound);
        assert_eq!(map_error_message("Unsupported container"), ErrorKind::UnsupportedFormat);
        assert_eq!(map_error_message("codec init failed"), ErrorKind::DecoderFailure);
        assert_eq!(map_error_message("something odd"), ErrorKind::Unknown);
        assert_eq!(map_error_message(""), ErrorKind::Unknown);
    }
}
