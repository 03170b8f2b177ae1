//! Integration tests for the WebDAV client against a scripted transport

#[path = "common/mod.rs"]
mod common;
use common::*;

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use vrplayer::config::WebDavConfig;
use vrplayer::data::VideoFile;
use vrplayer::library::{VideoSource, WebDavVideoSource};
use vrplayer::webdav::RemoteFileClient;

const SERVER: &str = "https://dav.example.com";

fn test_config() -> WebDavConfig {
    WebDavConfig {
        retry_backoff_ms: 0,
        ..Default::default()
    }
}

/// Client that is already connected; the connect request is dropped from the log
fn connected_client(config: WebDavConfig) -> (RemoteFileClient, MockHttpClient) {
    let transport = MockHttpClient::new();
    transport.push_response(207, "");
    let mut client = RemoteFileClient::new(config, Box::new(transport.clone()));
    assert!(client.connect(SERVER, "user", "pass"));
    (client, transport)
}

#[test]
fn test_connect_sends_depth0_propfind_with_basic_auth() {
    let transport = MockHttpClient::new();
    transport.push_response(207, "");
    let mut client = RemoteFileClient::new(test_config(), Box::new(transport.clone()));

    assert!(client.connect("  https://dav.example.com/ ", "user", "pass"));
    assert!(client.is_connected());
    assert_eq!(client.server_url(), SERVER);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "PROPFIND");
    assert_eq!(request.url, "https://dav.example.com/");
    assert_eq!(request.header("Depth"), Some("0"));
    assert_eq!(request.header("Authorization"), Some("Basic dXNlcjpwYXNz"));
    assert_eq!(request.header("Content-Type"), Some("application/xml; charset=utf-8"));
    assert!(request.body.as_deref().unwrap_or_default().contains("<d:displayname/>"));
}

#[test]
fn test_connect_falls_back_to_get() {
    let transport = MockHttpClient::new();
    transport.push_response(405, "");
    transport.push_response(200, "<html/>");
    let mut client = RemoteFileClient::new(test_config(), Box::new(transport.clone()));

    assert!(client.connect(SERVER, "user", "pass"));
    let methods: Vec<String> = transport.requests().into_iter().map(|r| r.method).collect();
    assert_eq!(methods, vec!["PROPFIND", "GET"]);
}

#[test]
fn test_connect_failure() {
    let transport = MockHttpClient::new();
    transport.push_failure("connection refused");
    transport.push_response(401, "");
    let mut client = RemoteFileClient::new(test_config(), Box::new(transport.clone()));

    assert!(!client.connect(SERVER, "user", "wrong"));
    assert!(!client.is_connected());
}

#[test]
fn test_connect_without_url() {
    let transport = MockHttpClient::new();
    let mut client = RemoteFileClient::new(test_config(), Box::new(transport.clone()));
    assert!(!client.connect("   ", "user", "pass"));
    assert!(transport.requests().is_empty());
}

#[test]
fn test_list_skips_collections() {
    let (mut client, transport) = connected_client(test_config());
    transport.push_response(
        207,
        &multistatus(&[
            ("/videos/", Some("videos"), None, true),
            ("/videos/Alps%20360.mp4", Some("Alps 360.mp4"), Some(1024), false),
        ]),
    );

    let files = client.list_files("videos");
    assert_eq!(files.len(), 1);
    let file = &files[0];
    assert_eq!(file.name, "Alps 360.mp4");
    assert_eq!(file.remote_path, "/videos/Alps 360.mp4");
    assert_eq!(file.url, "https://dav.example.com/videos/Alps 360.mp4");
    assert_eq!(file.size_bytes, 1024);
    assert!(file.is_360);

    let listing = &transport.requests_with_method("PROPFIND")[1];
    assert_eq!(listing.url, "https://dav.example.com/videos");
    assert_eq!(listing.header("Depth"), Some("1"));
    assert_eq!(client.cached_files(), files);
}

#[test]
fn test_list_filters_duplicates_and_other_files() {
    let (mut client, transport) = connected_client(test_config());
    transport.push_response(
        207,
        &multistatus(&[
            ("/a.mp4", Some("a.mp4"), Some(1), false),
            ("/A.MP4", Some("A.MP4"), Some(2), false),
            ("/notes.txt", Some("notes.txt"), Some(3), false),
            ("/clips/b.mkv", None, None, false),
            ("/c.mov", Some("c.mov"), Some(5), false),
        ]),
    );

    let files = client.list_files("");
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.mp4", "b.mkv", "c.mov"]);
    assert_eq!(files[1].size_bytes, 0);

    // Empty path lists the configured base path
    assert_eq!(transport.requests_with_method("PROPFIND")[1].url, "https://dav.example.com/");
}

#[test]
fn test_list_malformed_xml_is_empty() {
    let (mut client, transport) = connected_client(test_config());
    transport.push_response(207, &multistatus(&[("/a.mp4", Some("a.mp4"), None, false)]));
    assert_eq!(client.list_files("/").len(), 1);

    transport.push_response(207, "<d:multistatus xmlns:d=\"DAV:\"><d:response><d:href>/b.mp4</d:multistatus>");
    assert!(client.list_files("/").is_empty());
    assert_eq!(client.cached_files().len(), 1);
}

#[test]
fn test_list_http_error_is_empty() {
    let (mut client, transport) = connected_client(test_config());
    transport.push_response(403, "forbidden");
    assert!(client.list_files("/private").is_empty());
}

#[test]
fn test_list_requires_connection() {
    let transport = MockHttpClient::new();
    let mut client = RemoteFileClient::new(test_config(), Box::new(transport.clone()));
    assert!(client.list_files("/").is_empty());
    assert!(transport.requests().is_empty());
}

#[test]
fn test_download_retries_after_failure() {
    let temp_dir = TempDir::new().unwrap();
    let (client, transport) = connected_client(test_config());
    transport.push_stream_entry(MockStream::Status(500));
    transport.push_stream(&[7u8; 1000], 100);

    let local = temp_dir.path().join("downloads/video.mp4");
    let local = local.to_str().unwrap();
    let mut progress = Vec::new();
    let mut on_progress = |value: f32| progress.push(value);

    assert!(client.download_file("/videos/video.mp4", local, Some(&mut on_progress)));

    let downloads = transport.requests_with_method("GET");
    assert_eq!(downloads.len(), 2);
    assert_eq!(downloads[0].url, "https://dav.example.com/videos/video.mp4");
    assert_eq!(downloads[0].header("Authorization"), Some("Basic dXNlcjpwYXNz"));

    assert_eq!(fs::read(local).unwrap(), vec![7u8; 1000]);
    assert!(!temp_dir.path().join("downloads/video.mp4.part").exists());

    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(progress.last().copied(), Some(100.0));
    // Second of two attempts starts at 50%
    assert!(progress.iter().all(|value| *value >= 50.0));
    assert!(progress.len() > 3);
}

#[test]
fn test_download_gives_up() {
    let temp_dir = TempDir::new().unwrap();
    let config = WebDavConfig { download_retry_count: 2, ..test_config() };
    let (client, transport) = connected_client(config);
    transport.push_stream_entry(MockStream::Fail("reset".to_string()));
    transport.push_stream_entry(MockStream::Status(503));
    transport.push_stream_entry(MockStream::Body {
        data: vec![1u8; 10],
        chunk_size: 4,
        content_length: Some(100),
        cancel_after_first_chunk: None,
    });

    let local = temp_dir.path().join("video.mp4");
    write_file(&temp_dir.path().join("video.mp4.part"), b"stale");

    assert!(!client.download_file("/video.mp4", local.to_str().unwrap(), None));
    assert_eq!(transport.requests_with_method("GET").len(), 3);
    assert!(!local.exists());
    assert!(!temp_dir.path().join("video.mp4.part").exists());
}

#[test]
fn test_download_cancel() {
    let temp_dir = TempDir::new().unwrap();
    let (client, transport) = connected_client(test_config());
    let cancel = Arc::new(AtomicBool::new(false));
    transport.push_stream_entry(MockStream::Body {
        data: vec![0u8; 1000],
        chunk_size: 10,
        content_length: None,
        cancel_after_first_chunk: Some(cancel.clone()),
    });

    let local = temp_dir.path().join("video.mp4");
    assert!(!client.download_file_with_cancel("/video.mp4", local.to_str().unwrap(), None, &cancel));
    assert!(cancel.load(Ordering::SeqCst));
    assert_eq!(transport.requests_with_method("GET").len(), 1);
    assert!(!local.exists());
    assert!(!temp_dir.path().join("video.mp4.part").exists());
}

#[test]
fn test_download_replaces_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let (client, transport) = connected_client(test_config());
    transport.push_stream(b"new content", 1024);

    let local = temp_dir.path().join("video.mp4");
    write_file(&local, b"old");
    assert!(client.download_file("/video.mp4", local.to_str().unwrap(), None));
    assert_eq!(fs::read(&local).unwrap(), b"new content");
}

#[test]
fn test_download_rejects_bad_input() {
    let temp_dir = TempDir::new().unwrap();
    let local = temp_dir.path().join("video.mp4");

    let transport = MockHttpClient::new();
    let client = RemoteFileClient::new(test_config(), Box::new(transport.clone()));
    assert!(!client.download_file("/video.mp4", local.to_str().unwrap(), None));

    let (client, transport) = connected_client(test_config());
    assert!(!client.download_file("", local.to_str().unwrap(), None));
    assert!(!client.download_file("/video.mp4", " ", None));
    assert!(transport.requests_with_method("GET").is_empty());
}

#[test]
fn test_webdav_video_source() {
    let temp_dir = TempDir::new().unwrap();
    let (client, transport) = connected_client(test_config());
    transport.push_response(207, &multistatus(&[("/v/tour%20360.mkv", Some("tour 360.mkv"), Some(9), false)]));
    transport.push_stream(b"123456789", 4);

    let mut source = WebDavVideoSource::new(client);
    assert_eq!(source.source_name(), "WebDAV");

    let files: Vec<VideoFile> = source.list("/v");
    assert_eq!(files.len(), 1);
    assert!(files[0].is_360);
    assert!(!files[0].is_downloaded());

    let local = temp_dir.path().join("tour.mkv");
    assert!(source.download(&files[0], local.to_str().unwrap(), None));
    assert_eq!(transport.requests_with_method("GET")[0].url, "https://dav.example.com/v/tour%20360.mkv");
    assert_eq!(fs::read(local).unwrap(), b"123456789");
}
