//! Structured logging helpers
//!
//! All VMS requests, token exchanges and version lookups are logged through
//! this module so field names stay consistent across the crate.

use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

/// HTTP request metadata for structured logging
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Absolute request URL
    pub url: String,
    /// Request body size in bytes
    pub body_size: usize,
}

impl RequestMetadata {
    /// Create new request metadata
    pub fn new(method: impl Into<String>, url: &Url, body_size: usize) -> Self {
        Self {
            method: method.into(),
            url: url.to_string(),
            body_size,
        }
    }

    /// Log request being sent
    pub fn log_request(&self) {
        debug!(
            method = %self.method,
            url = %self.url,
            body_size = self.body_size,
            "Sending VMS request"
        );
    }
}

/// HTTP response metadata for structured logging
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// HTTP status code
    pub status: u16,
    /// Time elapsed for the request
    pub elapsed: Duration,
}

impl ResponseMetadata {
    /// Create new response metadata
    pub fn new(status: u16, elapsed: Duration) -> Self {
        Self { status, elapsed }
    }

    /// Log successful response
    pub fn log_success(&self, request: &RequestMetadata) {
        info!(
            method = %request.method,
            url = %request.url,
            status = self.status,
            elapsed_ms = self.elapsed.as_millis(),
            "VMS request succeeded"
        );
    }

    /// Log failed response
    pub fn log_error(&self, request: &RequestMetadata, error: &str) {
        warn!(
            method = %request.method,
            url = %request.url,
            status = self.status,
            elapsed_ms = self.elapsed.as_millis(),
            error = %error,
            "VMS request failed"
        );
    }
}

/// Timer for measuring request duration
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Log a transport failure that produced no response at all
pub fn log_transport_error(request: &RequestMetadata, elapsed: Duration, error: &str) {
    warn!(
        method = %request.method,
        url = %request.url,
        elapsed_ms = elapsed.as_millis(),
        error = %error,
        "VMS request could not be sent"
    );
}

/// Log a response body that did not decode into the expected shape
pub fn log_decode_failure(expected: &str, url: &Url, error: &str) {
    error!(
        expected = %expected,
        url = %url,
        error = %error,
        "Failed to decode VMS response"
    );
}

/// Log a token acquisition or refresh
pub fn log_token_event(event: &str, base_url: &Url) {
    debug!(event = %event, host = base_url.host_str(), "Access token {}", event);
}

/// Log a resolved cluster version
pub fn log_version_resolved(version: &semver::Version) {
    debug!(version = %version, "Resolved VMS cluster version");
}

/// Log one poll of an asynchronous task
pub fn log_task_poll(task_id: i64, attempt: u32, state: &str) {
    debug!(task_id, attempt, state = %state, "Polled VMS task");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_metadata_creation() {
        let url = Url::parse("https://vms.local:443/api/v5/views").unwrap();
        let metadata = RequestMetadata::new("POST", &url, 12);
        assert_eq!(metadata.method, "POST");
        assert_eq!(metadata.url, "https://vms.local/api/v5/views");
        assert_eq!(metadata.body_size, 12);
    }

    #[test]
    fn test_response_metadata_creation() {
        let elapsed = Duration::from_millis(500);
        let metadata = ResponseMetadata::new(200, elapsed);
        assert_eq!(metadata.status, 200);
        assert_eq!(metadata.elapsed, elapsed);
    }

    #[test]
    fn test_request_timer() {
        let timer = RequestTimer::start();
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed().as_millis() >= 10);
    }
}
