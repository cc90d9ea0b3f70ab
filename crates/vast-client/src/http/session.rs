//! Authenticated transport to one VMS
//!
//! A [`Session`] owns the pooled HTTP client and the authenticator. Every verb
//! method authorizes first, sends the request, and rejects non-2xx responses.

use super::auth::{self, Authenticator};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::observability::{self, RequestMetadata, RequestTimer, ResponseMetadata};
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Authenticated HTTP session.
#[derive(Debug)]
pub struct Session {
    http: reqwest::Client,
    auth: Arc<dyn Authenticator>,
    base_url: Url,
    timeout: Duration,
    permits: Semaphore,
}

impl Session {
    /// Build a session from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, no credentials are
    /// set, or the HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let base_url = base_url(config)?;
        let auth = auth::from_config(config, &base_url)?;
        Self::with_authenticator(config, base_url, auth)
    }

    /// Build a session with a caller-supplied authenticator.
    pub fn with_authenticator(
        config: &ClientConfig,
        base_url: Url,
        auth: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent(&config.user_agent))
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_connections)
            .pool_idle_timeout(config.timeout)
            .danger_accept_invalid_certs(!config.ssl_verify)
            .build()
            .map_err(|e| Error::HttpClient(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            auth,
            base_url,
            timeout: config.timeout,
            permits: Semaphore::new(config.max_connections.clamp(1, Semaphore::MAX_PERMITS)),
        })
    }

    /// Root URL of the VMS (`{scheme}://{host}:{port}/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a GET request.
    pub async fn get(&self, url: Url, body: Bytes) -> Result<reqwest::Response> {
        self.send(Method::GET, url, body).await
    }

    /// Send a POST request.
    pub async fn post(&self, url: Url, body: Bytes) -> Result<reqwest::Response> {
        self.send(Method::POST, url, body).await
    }

    /// Send a PUT request.
    pub async fn put(&self, url: Url, body: Bytes) -> Result<reqwest::Response> {
        self.send(Method::PUT, url, body).await
    }

    /// Send a PATCH request.
    pub async fn patch(&self, url: Url, body: Bytes) -> Result<reqwest::Response> {
        self.send(Method::PATCH, url, body).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, url: Url, body: Bytes) -> Result<reqwest::Response> {
        self.send(Method::DELETE, url, body).await
    }

    async fn send(&self, method: Method, url: Url, body: Bytes) -> Result<reqwest::Response> {
        let authorization = self.auth.authorize().await?;

        let metadata = RequestMetadata::new(method.as_str(), &url, body.len());
        metadata.log_request();

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::Connection("session is shutting down".to_string()))?;

        let timer = RequestTimer::start();
        let sent = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, authorization)
            .body(body)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                observability::log_transport_error(&metadata, timer.elapsed(), &e.to_string());
                return Err(self.map_send_error(e));
            }
        };

        let response_meta = ResponseMetadata::new(response.status().as_u16(), timer.elapsed());
        match validate_response(response).await {
            Ok(response) => {
                response_meta.log_success(&metadata);
                Ok(response)
            }
            Err(e) => {
                response_meta.log_error(&metadata, &e.to_string());
                Err(e)
            }
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::from(err)
        }
    }
}

/// Accept 2xx responses; turn anything else into [`Error::Status`].
///
/// The body of a rejected response is pretty-printed when it is JSON.
pub async fn validate_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let headers = response.headers().clone();
    let text = response.text().await.unwrap_or_default();
    let body = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or(text),
        Err(_) => text,
    };

    Err(Error::Status {
        status,
        body,
        headers,
    })
}

/// Build the root URL for a configuration.
pub(crate) fn base_url(config: &ClientConfig) -> Result<Url> {
    let host = config
        .host
        .as_deref()
        .ok_or_else(|| Error::MissingConfig("host".to_string()))?;
    let raw = format!("{}://{}:{}/", config.scheme, host, config.port);
    Url::parse(&raw).map_err(|e| Error::InvalidUrl(format!("'{}': {}", raw, e)))
}

fn user_agent(agent: &str) -> String {
    format!(
        "{}, OS:{}, Arch:{}",
        agent,
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfigBuilder;

    #[test]
    fn test_user_agent_format() {
        let agent = user_agent("vast-client-rust/0.1.0");
        assert!(agent.starts_with("vast-client-rust/0.1.0, OS:"));
        assert!(agent.contains(", Arch:"));
    }

    #[test]
    fn test_base_url_keeps_port() {
        let config = ClientConfigBuilder::new()
            .host("10.27.40.1")
            .port(8443)
            .api_token("t")
            .build();
        assert_eq!(base_url(&config).unwrap().as_str(), "https://10.27.40.1:8443/");
    }

    #[test]
    fn test_session_requires_credentials() {
        let config = ClientConfigBuilder::new().host("vms.local").build();
        assert!(matches!(Session::new(&config), Err(Error::MissingConfig(_))));
    }
}
