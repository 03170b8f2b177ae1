// Common helpers for integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use vrplayer::data::{PlaybackError, PlaybackEvent, PlaybackState};
use vrplayer::helpers::http_client::{HttpClient, HttpClientError, HttpResponse, HttpStream};
use vrplayer::playback::{CallbackListener, PlaybackListener};

pub use serial_test::serial;

/// A request the mock transport received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Scripted answer for a download stream
#[derive(Debug, Clone)]
pub enum MockStream {
    Body {
        data: Vec<u8>,
        chunk_size: usize,
        /// Advertised length; defaults to the real length
        content_length: Option<u64>,
        /// Raised after the first chunk has been read
        cancel_after_first_chunk: Option<Arc<AtomicBool>>,
    },
    Status(u16),
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    responses: VecDeque<Result<HttpResponse, String>>,
    streams: VecDeque<MockStream>,
    requests: Vec<RecordedRequest>,
}

/// HTTP transport that replays queued responses and records every request
///
/// Buffered requests with nothing queued get a 404, streams with nothing queued fail with 404.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    state: Arc<Mutex<MockState>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, body: &str) {
        self.state.lock().unwrap().responses.push_back(Ok(HttpResponse { status, body: body.to_string() }));
    }

    pub fn push_failure(&self, message: &str) {
        self.state.lock().unwrap().responses.push_back(Err(message.to_string()));
    }

    pub fn push_stream(&self, data: &[u8], chunk_size: usize) {
        self.state.lock().unwrap().streams.push_back(MockStream::Body {
            data: data.to_vec(),
            chunk_size,
            content_length: None,
            cancel_after_first_chunk: None,
        });
    }

    pub fn push_stream_entry(&self, stream: MockStream) {
        self.state.lock().unwrap().streams.push_back(stream);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_with_method(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.method == method).collect()
    }

    fn record(&self, method: &str, url: &str, headers: &[(&str, &str)], body: Option<&str>) {
        self.state.lock().unwrap().requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            body: body.map(str::to_string),
        });
    }
}

/// Reader handing out data in fixed-size chunks
struct ChunkedReader {
    data: Vec<u8>,
    position: usize,
    chunk_size: usize,
    cancel_after_first_chunk: Option<Arc<AtomicBool>>,
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = self.data.len() - self.position;
        let n = remaining.min(self.chunk_size).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        if let Some(flag) = &self.cancel_after_first_chunk {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(n)
    }
}

impl HttpClient for MockHttpClient {
    fn send(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&str>,
    ) -> Result<HttpResponse, HttpClientError> {
        self.record(method, url, headers, body);
        match self.state.lock().unwrap().responses.pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(HttpClientError::RequestError(message)),
            None => Ok(HttpResponse { status: 404, body: String::new() }),
        }
    }

    fn open_stream(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpStream, HttpClientError> {
        self.record("GET", url, headers, None);
        match self.state.lock().unwrap().streams.pop_front() {
            Some(MockStream::Body { data, chunk_size, content_length, cancel_after_first_chunk }) => {
                let content_length = content_length.or(Some(data.len() as u64));
                Ok(HttpStream {
                    status: 200,
                    content_length,
                    reader: Box::new(ChunkedReader {
                        data,
                        position: 0,
                        chunk_size: chunk_size.max(1),
                        cancel_after_first_chunk,
                    }),
                })
            }
            Some(MockStream::Status(code)) => Err(HttpClientError::Status(code)),
            Some(MockStream::Fail(message)) => Err(HttpClientError::RequestError(message)),
            None => Err(HttpClientError::Status(404)),
        }
    }

    fn clone_box(&self) -> Box<dyn HttpClient> {
        Box::new(self.clone())
    }
}

/// Collects controller events for later inspection
pub struct EventRecorder {
    events: Arc<Mutex<Vec<PlaybackEvent>>>,
    listener: Arc<dyn PlaybackListener>,
}

impl EventRecorder {
    pub fn new() -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let listener: Arc<dyn PlaybackListener> =
            Arc::new(CallbackListener::new(move |event: &PlaybackEvent| sink.lock().unwrap().push(event.clone())));
        Self { events, listener }
    }

    pub fn listener(&self) -> Arc<dyn PlaybackListener> {
        self.listener.clone()
    }

    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn states(&self) -> Vec<PlaybackState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PlaybackEvent::StateChanged { state } => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<PlaybackError> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PlaybackEvent::ErrorOccurred { error } => Some(error),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PlaybackEvent::PlaybackUpdated { snapshot } => Some(snapshot.normalized_progress),
                _ => None,
            })
            .collect()
    }
}

/// Write a placeholder file, creating parent directories
pub fn write_file(path: &Path, data: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, data).unwrap();
}

/// Multi-status body for a directory with the given (href, displayname, size, is_collection) entries
pub fn multistatus(entries: &[(&str, Option<&str>, Option<u64>, bool)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<d:multistatus xmlns:d=\"DAV:\">\n");
    for (href, name, size, collection) in entries {
        xml.push_str("  <d:response>\n");
        xml.push_str(&format!("    <d:href>{}</d:href>\n", href));
        xml.push_str("    <d:propstat><d:prop>\n");
        if let Some(name) = name {
            xml.push_str(&format!("      <d:displayname>{}</d:displayname>\n", name));
        }
        if let Some(size) = size {
            xml.push_str(&format!("      <d:getcontentlength>{}</d:getcontentlength>\n", size));
        }
        if *collection {
            xml.push_str("      <d:resourcetype><d:collection/></d:resourcetype>\n");
        } else {
            xml.push_str("      <d:resourcetype/>\n");
        }
        xml.push_str("    </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>\n");
        xml.push_str("  </d:response>\n");
    }
    xml.push_str("</d:multistatus>\n");
    xml
}
