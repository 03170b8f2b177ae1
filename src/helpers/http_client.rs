use std::io::Read;
use std::time::Duration;
use log::{debug, error};
use thiserror::Error;

/// Error types that can occur when interacting with HTTP clients
#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("HTTP request error: {0}")]
    RequestError(String),

    #[error("Server returned HTTP {0}")]
    Status(u16),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// A fully buffered response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// 2xx, including 207 Multi-Status
    pub fn is_success(&self) -> bool {
        is_success_status(self.status)
    }
}

/// A response whose body is read incrementally
pub struct HttpStream {
    pub status: u16,
    /// Value of Content-Length, if the server sent one
    pub content_length: Option<u64>,
    pub reader: Box<dyn Read + Send>,
}

impl std::fmt::Debug for HttpStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStream")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish()
    }
}

pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// A trait for HTTP client implementations
/// This version avoids generic methods to enable dynamic dispatch
pub trait HttpClient: Send + Sync + std::fmt::Debug {
    /// Send a request with an arbitrary method (e.g. PROPFIND) and buffer the response
    ///
    /// Non-2xx statuses are returned as responses, only transport failures are errors.
    fn send(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&str>,
    ) -> Result<HttpResponse, HttpClientError>;

    /// Send a GET request and return the body as a stream
    ///
    /// Statuses of 400 and above are returned as `HttpClientError::Status`.
    fn open_stream(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpStream, HttpClientError>;

    /// Clone the client as a boxed trait object
    fn clone_box(&self) -> Box<dyn HttpClient>;
}

impl Clone for Box<dyn HttpClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// An HTTP client implementation using ureq
#[derive(Clone, Debug)]
pub struct UreqHttpClient {
    agent: ureq::Agent,
    timeout: Duration,
}

impl UreqHttpClient {
    /// Create a new HTTP client with the specified timeout
    ///
    /// The timeout bounds buffered requests as a whole; streams only get
    /// connect and per-read timeouts so long downloads are not cut off.
    pub fn new(timeout_secs: u64) -> Self {
        let timeout = Duration::from_secs(timeout_secs);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();
        Self { agent, timeout }
    }
}

impl Default for UreqHttpClient {
    fn default() -> Self {
        Self::new(20)
    }
}

impl HttpClient for UreqHttpClient {
    fn send(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&str>,
    ) -> Result<HttpResponse, HttpClientError> {
        debug!("{} request to {}", method, url);

        let mut request = self.agent.request(method, url).timeout(self.timeout);
        for (name, value) in headers {
            request = request.set(name, value);
        }

        let result = match body {
            Some(body) => request.send_string(body),
            None => request.call(),
        };

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                debug!("{} {} returned HTTP {}", method, url, code);
                let body = response.into_string().unwrap_or_default();
                return Ok(HttpResponse { status: code, body });
            }
            Err(e) => {
                error!("{} request failed: {}", method, e);
                return Err(HttpClientError::RequestError(e.to_string()));
            }
        };

        let status = response.status();
        match response.into_string() {
            Ok(body) => Ok(HttpResponse { status, body }),
            Err(e) => {
                error!("Failed to read response body: {}", e);
                Err(HttpClientError::ParseError(format!("Failed to read response body: {}", e)))
            }
        }
    }

    fn open_stream(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpStream, HttpClientError> {
        debug!("GET stream from {}", url);

        let mut request = self.agent.get(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                error!("GET {} returned HTTP {}", url, code);
                return Err(HttpClientError::Status(code));
            }
            Err(e) => {
                error!("GET request failed: {}", e);
                return Err(HttpClientError::RequestError(e.to_string()));
            }
        };

        let status = response.status();
        let content_length = response
            .header("Content-Length")
            .and_then(|value| value.trim().parse::<u64>().ok());

        Ok(HttpStream {
            status,
            content_length,
            reader: response.into_reader(),
        })
    }

    fn clone_box(&self) -> Box<dyn HttpClient> {
        Box::new(self.clone())
    }
}

/// Create a new HTTP client using the default implementation
pub fn new_http_client(timeout_secs: u64) -> Box<dyn HttpClient> {
    Box::new(UreqHttpClient::new(timeout_secs))
}
