//! Credential handling
//!
//! Two authenticators exist. [`StaticTokenAuthenticator`] sends a fixed
//! `Api-Token` header. [`TokenExchangeAuthenticator`] trades username and
//! password for an access/refresh token pair and rotates it once the access
//! token is older than the configured interval.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::observability;
use async_trait::async_trait;
use http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

const TOKEN_PATH: &str = "api/token/";
const REFRESH_PATH: &str = "api/token/refresh/";
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Produces the `Authorization` header value for each request.
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Ensure a valid credential exists and return the header value for it.
    async fn authorize(&self) -> Result<HeaderValue>;
}

/// Select the authenticator for a configuration.
///
/// Username and password win over a static token.
///
/// # Errors
///
/// Returns [`Error::MissingConfig`] when neither credential form is present.
pub fn from_config(config: &ClientConfig, base_url: &Url) -> Result<Arc<dyn Authenticator>> {
    if config.has_password_credentials() {
        let username = config.username.clone().unwrap_or_default();
        let password = config
            .password
            .clone()
            .ok_or_else(|| Error::MissingConfig("password".to_string()))?;
        let auth = TokenExchangeAuthenticator::new(
            base_url.clone(),
            username,
            password,
            config.ssl_verify,
            config.token_refresh_interval,
            config.timeout.min(EXCHANGE_TIMEOUT),
        )?;
        return Ok(Arc::new(auth));
    }

    if let Some(token) = config.api_token.as_ref().filter(|_| config.has_api_token()) {
        return Ok(Arc::new(StaticTokenAuthenticator::new(token.clone())));
    }

    Err(Error::MissingConfig(
        "either username and password, or api_token".to_string(),
    ))
}

/// Authenticator sending a fixed API token.
#[derive(Debug, Clone)]
pub struct StaticTokenAuthenticator {
    token: SecretString,
}

impl StaticTokenAuthenticator {
    /// Create an authenticator for the given token.
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authorize(&self) -> Result<HeaderValue> {
        sensitive_header(format!("Api-Token {}", self.token.expose_secret()))
    }
}

#[derive(Debug, Default)]
struct TokenState {
    access: Option<SecretString>,
    refresh: Option<SecretString>,
    issued_at: Option<Instant>,
}

impl TokenState {
    fn is_initialized(&self) -> bool {
        self.access.is_some()
    }

    fn is_stale(&self, interval: Duration) -> bool {
        self.issued_at
            .is_none_or(|issued| issued.elapsed() >= interval)
    }

    fn store(&mut self, pair: TokenPair) {
        self.access = Some(SecretString::new(pair.access.into_boxed_str()));
        self.refresh = Some(SecretString::new(pair.refresh.into_boxed_str()));
        self.issued_at = Some(Instant::now());
    }
}

#[derive(Deserialize)]
struct TokenPair {
    access: String,
    refresh: String,
}

/// Authenticator exchanging username/password for rotating bearer tokens.
///
/// The acquire-or-refresh decision and the exchange itself run under one
/// async mutex, so concurrent callers never refresh twice.
pub struct TokenExchangeAuthenticator {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    refresh_interval: Duration,
    timeout: Duration,
    state: Mutex<TokenState>,
}

impl TokenExchangeAuthenticator {
    /// Create an authenticator for the VMS at `base_url`.
    ///
    /// `timeout` bounds each token request; clients built from a
    /// [`ClientConfig`] use the request timeout capped at 10 seconds.
    pub fn new(
        base_url: Url,
        username: String,
        password: SecretString,
        ssl_verify: bool,
        refresh_interval: Duration,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!ssl_verify)
            .build()
            .map_err(|e| Error::HttpClient(format!("Failed to build token client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            username,
            password,
            refresh_interval,
            timeout,
            state: Mutex::new(TokenState::default()),
        })
    }

    async fn exchange(&self, path: &str, body: serde_json::Value) -> Result<TokenPair> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("Failed to build '{}': {}", path, e)))?;

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout)
                } else {
                    Error::from(e)
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Authentication(format!(
                "{} returned status {}: {}",
                path, status, body
            )));
        }

        response
            .json::<TokenPair>()
            .await
            .map_err(|e| Error::Authentication(format!("invalid token response from {}: {}", path, e)))
    }
}

impl fmt::Debug for TokenExchangeAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchangeAuthenticator")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("refresh_interval", &self.refresh_interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Authenticator for TokenExchangeAuthenticator {
    async fn authorize(&self) -> Result<HeaderValue> {
        let mut state = self.state.lock().await;

        if !state.is_initialized() {
            let pair = self
                .exchange(
                    TOKEN_PATH,
                    serde_json::json!({
                        "username": self.username,
                        "password": self.password.expose_secret(),
                    }),
                )
                .await?;
            state.store(pair);
            observability::log_token_event("acquired", &self.base_url);
        } else if state.is_stale(self.refresh_interval) {
            let refresh = state
                .refresh
                .as_ref()
                .map(|r| r.expose_secret().to_string())
                .unwrap_or_default();
            let pair = self
                .exchange(REFRESH_PATH, serde_json::json!({ "refresh": refresh }))
                .await?;
            state.store(pair);
            observability::log_token_event("refreshed", &self.base_url);
        }

        let access = state
            .access
            .as_ref()
            .ok_or_else(|| Error::Authentication("no access token available".to_string()))?;
        sensitive_header(format!("Bearer {}", access.expose_secret()))
    }
}

fn sensitive_header(value: String) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(&value)
        .map_err(|_| Error::InvalidHeaderValue("authorization".to_string()))?;
    header.set_sensitive(true);
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfigBuilder;

    fn base() -> Url {
        Url::parse("https://vms.local:443/").unwrap()
    }

    #[tokio::test]
    async fn test_static_token_header() {
        let auth = StaticTokenAuthenticator::new(SecretString::new("abc".into()));
        let header = auth.authorize().await.unwrap();
        assert_eq!(header.to_str().unwrap(), "Api-Token abc");
        assert!(header.is_sensitive());
    }

    #[test]
    fn test_selection_prefers_password() {
        let config = ClientConfigBuilder::new()
            .host("vms.local")
            .username("admin")
            .password("123456")
            .api_token("abc")
            .build();
        let auth = from_config(&config, &base()).unwrap();
        assert!(format!("{:?}", auth).starts_with("TokenExchangeAuthenticator"));
    }

    #[test]
    fn test_selection_falls_back_to_token() {
        let config = ClientConfigBuilder::new()
            .host("vms.local")
            .username("admin")
            .api_token("abc")
            .build();
        let auth = from_config(&config, &base()).unwrap();
        assert!(format!("{:?}", auth).starts_with("StaticTokenAuthenticator"));
    }

    #[test]
    fn test_selection_without_credentials_fails() {
        let config = ClientConfigBuilder::new().host("vms.local").build();
        assert!(matches!(
            from_config(&config, &base()),
            Err(Error::MissingConfig(_))
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let auth = TokenExchangeAuthenticator::new(
            base(),
            "admin".to_string(),
            SecretString::new("hunter2".into()),
            false,
            Duration::from_secs(600),
            EXCHANGE_TIMEOUT,
        )
        .unwrap();
        assert!(!format!("{:?}", auth).contains("hunter2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_state_staleness() {
        let mut state = TokenState::default();
        assert!(!state.is_initialized());

        state.store(TokenPair {
            access: "a".to_string(),
            refresh: "r".to_string(),
        });
        assert!(state.is_initialized());
        assert!(!state.is_stale(Duration::from_secs(600)));

        tokio::time::advance(Duration::from_secs(601)).await;
        assert!(state.is_stale(Duration::from_secs(600)));
    }
}
