//! Configuration for the VMS client

use crate::error::{Error, Result};
use crate::http::{FnInterceptor, InterceptorChain, RequestInterceptor};
use crate::record::ResponseValue;
use http::Method;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Configuration for the VMS client.
///
/// Holds the connection settings, credentials and hooks used to build a
/// [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// VMS host name or address
    pub host: Option<String>,

    /// VMS port
    pub port: u16,

    /// URL scheme, `https` unless talking to a local fixture
    pub scheme: String,

    /// Username for token-exchange authentication
    pub username: Option<String>,

    /// Password for token-exchange authentication
    pub password: Option<SecretString>,

    /// Static API token (used when no username/password is set)
    pub api_token: Option<SecretString>,

    /// Default API version path segment (e.g. `v5`)
    pub api_version: String,

    /// Verify the server's TLS certificate
    pub ssl_verify: bool,

    /// Per-request timeout
    pub timeout: Duration,

    /// Maximum number of concurrent connections
    pub max_connections: usize,

    /// User agent prefix sent on every request
    pub user_agent: String,

    /// Token age after which the access token is refreshed
    pub token_refresh_interval: Duration,

    /// Before/after request hooks
    pub interceptors: InterceptorChain,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: crate::DEFAULT_PORT,
            scheme: "https".to_string(),
            username: None,
            password: None,
            api_token: None,
            api_version: crate::DEFAULT_API_VERSION.to_string(),
            ssl_verify: false,
            timeout: crate::DEFAULT_TIMEOUT,
            max_connections: crate::DEFAULT_MAX_CONNECTIONS,
            user_agent: crate::DEFAULT_USER_AGENT.to_string(),
            token_refresh_interval: crate::TOKEN_REFRESH_INTERVAL,
            interceptors: InterceptorChain::new(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration authenticating with username and password.
    pub fn with_credentials(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: Some(host.into()),
            username: Some(username.into()),
            password: Some(SecretString::new(password.into().into_boxed_str())),
            ..Default::default()
        }
    }

    /// Create a configuration authenticating with a static API token.
    pub fn with_api_token(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            api_token: Some(SecretString::new(token.into().into_boxed_str())),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// This will look for:
    /// - `VMS_HOST`, `VMS_PORT` for the endpoint
    /// - `VMS_USERNAME` and `VMS_PASSWORD`, or `VMS_API_TOKEN`, for authentication
    /// - `VMS_SSL_VERIFY` (`true`/`false`/`1`/`0`)
    /// - `VMS_TIMEOUT` for request timeout (in seconds)
    /// - `VMS_MAX_CONNECTIONS`
    /// - `VMS_API_VERSION`
    /// - `VMS_USER_AGENT`
    ///
    /// Unparseable numeric or boolean values are ignored and the default kept.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        use std::env;

        let _ = dotenvy::dotenv();
        let mut config = Self::default();

        if let Ok(host) = env::var("VMS_HOST") {
            config.host = Some(host);
        }

        if let Ok(port) = env::var("VMS_PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            config.port = port;
        }

        if let Ok(username) = env::var("VMS_USERNAME") {
            config.username = Some(username);
        }
        if let Ok(password) = env::var("VMS_PASSWORD") {
            config.password = Some(SecretString::new(password.into_boxed_str()));
        }
        if let Ok(token) = env::var("VMS_API_TOKEN") {
            config.api_token = Some(SecretString::new(token.into_boxed_str()));
        }

        if let Ok(verify) = env::var("VMS_SSL_VERIFY")
            && let Some(verify) = parse_bool(&verify)
        {
            config.ssl_verify = verify;
        }

        if let Ok(timeout) = env::var("VMS_TIMEOUT")
            && let Ok(secs) = timeout.parse::<u64>()
        {
            config.timeout = Duration::from_secs(secs);
        }

        if let Ok(max) = env::var("VMS_MAX_CONNECTIONS")
            && let Ok(max) = max.parse::<usize>()
        {
            config.max_connections = max;
        }

        if let Ok(api_version) = env::var("VMS_API_VERSION") {
            config.api_version = api_version;
        }

        if let Ok(user_agent) = env::var("VMS_USER_AGENT") {
            config.user_agent = user_agent;
        }

        Ok(config)
    }

    /// Merge this configuration with another, with the other taking precedence.
    ///
    /// Scalar settings are taken from `other` when they differ from the
    /// defaults. Interceptors are appended.
    pub fn merge(mut self, other: ClientConfig) -> Self {
        let defaults = ClientConfig::default();

        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port != defaults.port {
            self.port = other.port;
        }
        if other.scheme != defaults.scheme {
            self.scheme = other.scheme;
        }
        if other.username.is_some() {
            self.username = other.username;
        }
        if other.password.is_some() {
            self.password = other.password;
        }
        if other.api_token.is_some() {
            self.api_token = other.api_token;
        }
        if other.api_version != defaults.api_version {
            self.api_version = other.api_version;
        }
        if other.ssl_verify != defaults.ssl_verify {
            self.ssl_verify = other.ssl_verify;
        }
        if other.timeout != defaults.timeout {
            self.timeout = other.timeout;
        }
        if other.max_connections != defaults.max_connections {
            self.max_connections = other.max_connections;
        }
        if other.user_agent != defaults.user_agent {
            self.user_agent = other.user_agent;
        }
        if other.token_refresh_interval != defaults.token_refresh_interval {
            self.token_refresh_interval = other.token_refresh_interval;
        }
        self.interceptors.extend(other.interceptors);

        self
    }

    /// Check that the configuration can produce a working client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] when the host or every credential is
    /// missing, and [`Error::InvalidUrl`] for an unsupported scheme or host.
    pub fn validate(&self) -> Result<()> {
        self.validate_endpoint()?;

        if !self.has_password_credentials() && !self.has_api_token() {
            return Err(Error::MissingConfig(
                "either username and password, or api_token".to_string(),
            ));
        }

        Ok(())
    }

    /// Validation without credentials, for clients given their own authenticator.
    pub(crate) fn validate_endpoint(&self) -> Result<()> {
        let host = self
            .host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| Error::MissingConfig("host".to_string()))?;

        if self.scheme != "https" && self.scheme != "http" {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme '{}', expected https or http",
                self.scheme
            )));
        }

        if self.max_connections == 0 {
            return Err(Error::MissingConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.max_connections > Semaphore::MAX_PERMITS {
            return Err(Error::MissingConfig(format!(
                "max_connections must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }

        Url::parse(&format!("{}://{}:{}/", self.scheme, host, self.port))
            .map_err(|e| Error::InvalidUrl(format!("invalid host '{}': {}", host, e)))?;

        Ok(())
    }

    pub(crate) fn has_password_credentials(&self) -> bool {
        let username = self.username.as_deref().is_some_and(|u| !u.is_empty());
        let password = self
            .password
            .as_ref()
            .is_some_and(|p| !p.expose_secret().is_empty());
        username && password
    }

    pub(crate) fn has_api_token(&self) -> bool {
        self.api_token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().is_empty())
    }
}

#[cfg(feature = "env")]
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Builder for creating ClientConfig with a fluent API.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the VMS host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    /// Set the VMS port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the URL scheme (`https` or `http`).
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.scheme = scheme.into();
        self
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(SecretString::new(password.into().into_boxed_str()));
        self
    }

    /// Set a static API token.
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = Some(SecretString::new(token.into().into_boxed_str()));
        self
    }

    /// Set the default API version.
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.config.api_version = api_version.into();
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn ssl_verify(mut self, verify: bool) -> Self {
        self.config.ssl_verify = verify;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of concurrent connections.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Set the user agent prefix.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the access token age after which it is refreshed.
    pub fn token_refresh_interval(mut self, interval: Duration) -> Self {
        self.config.token_refresh_interval = interval;
        self
    }

    /// Add a request interceptor.
    pub fn interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.config.interceptors.push(interceptor);
        self
    }

    /// Add a before-request hook.
    pub fn before_request<F>(self, f: F) -> Self
    where
        F: Fn(&Method, &Url, Option<&[u8]>) -> Result<()> + Send + Sync + 'static,
    {
        self.interceptor(Arc::new(FnInterceptor::before(f)))
    }

    /// Add an after-request hook.
    pub fn after_request<F>(self, f: F) -> Self
    where
        F: Fn(ResponseValue) -> Result<ResponseValue> + Send + Sync + 'static,
    {
        self.interceptor(Arc::new(FnInterceptor::after(f)))
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.port, 443);
        assert_eq!(config.api_version, "v5");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.token_refresh_interval, Duration::from_secs(600));
        assert!(!config.ssl_verify);
        assert!(config.host.is_none());
        assert!(config.interceptors.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfigBuilder::new()
            .host("vms.local")
            .port(8443)
            .username("admin")
            .password("123456")
            .api_version("v1")
            .ssl_verify(true)
            .timeout(Duration::from_secs(5))
            .max_connections(4)
            .before_request(|_, _, _| Ok(()))
            .build();

        assert_eq!(config.host.as_deref(), Some("vms.local"));
        assert_eq!(config.port, 8443);
        assert_eq!(config.api_version, "v1");
        assert!(config.ssl_verify);
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.interceptors.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_merge() {
        let base = ClientConfig::with_api_token("vms.local", "token");
        let overrides = ClientConfigBuilder::new()
            .port(8443)
            .timeout(Duration::from_secs(60))
            .after_request(Ok)
            .build();

        let merged = base.merge(overrides);
        assert_eq!(merged.host.as_deref(), Some("vms.local"));
        assert!(merged.api_token.is_some());
        assert_eq!(merged.port, 8443);
        assert_eq!(merged.timeout, Duration::from_secs(60));
        assert_eq!(merged.interceptors.len(), 1);
    }

    #[test]
    fn test_validate_requires_host() {
        let config = ClientConfigBuilder::new().api_token("t").build();
        assert!(matches!(config.validate(), Err(Error::MissingConfig(_))));
    }

    #[rstest]
    #[case::nothing(None, None, None)]
    #[case::username_only(Some("admin"), None, None)]
    #[case::empty_password(Some("admin"), Some(""), None)]
    #[case::empty_token(None, None, Some(""))]
    fn test_validate_requires_credentials(
        #[case] username: Option<&str>,
        #[case] password: Option<&str>,
        #[case] token: Option<&str>,
    ) {
        let mut builder = ClientConfigBuilder::new().host("vms.local");
        if let Some(username) = username {
            builder = builder.username(username);
        }
        if let Some(password) = password {
            builder = builder.password(password);
        }
        if let Some(token) = token {
            builder = builder.api_token(token);
        }

        assert!(matches!(
            builder.build().validate(),
            Err(Error::MissingConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_scheme() {
        let config = ClientConfigBuilder::new()
            .host("vms.local")
            .api_token("t")
            .scheme("ftp")
            .build();
        assert!(matches!(config.validate(), Err(Error::InvalidUrl(_))));
    }

    #[rstest]
    #[case::zero(0)]
    #[case::above_semaphore_limit(Semaphore::MAX_PERMITS + 1)]
    #[case::max(usize::MAX)]
    fn test_validate_rejects_connection_limits(#[case] max_connections: usize) {
        let config = ClientConfigBuilder::new()
            .host("vms.local")
            .api_token("t")
            .max_connections(max_connections)
            .build();
        assert!(matches!(config.validate(), Err(Error::MissingConfig(_))));
    }

    #[cfg(feature = "env")]
    #[test]
    fn test_config_from_env_variables() {
        temp_env::with_vars(
            [
                ("VMS_HOST", Some("10.27.40.1".to_string())),
                ("VMS_PORT", Some("8443".to_string())),
                ("VMS_USERNAME", Some("admin".to_string())),
                ("VMS_PASSWORD", Some("123456".to_string())),
                ("VMS_API_TOKEN", None),
                ("VMS_SSL_VERIFY", Some("true".to_string())),
                ("VMS_TIMEOUT", Some("120".to_string())),
                ("VMS_MAX_CONNECTIONS", Some("not-a-number".to_string())),
                ("VMS_API_VERSION", Some("v1".to_string())),
                ("VMS_USER_AGENT", None),
            ],
            || {
                let config = ClientConfig::from_env().unwrap();
                assert_eq!(config.host.as_deref(), Some("10.27.40.1"));
                assert_eq!(config.port, 8443);
                assert_eq!(config.username.as_deref(), Some("admin"));
                assert!(config.password.is_some());
                assert!(config.api_token.is_none());
                assert!(config.ssl_verify);
                assert_eq!(config.timeout, Duration::from_secs(120));
                assert_eq!(config.max_connections, 10);
                assert_eq!(config.api_version, "v1");
                assert_eq!(config.user_agent, crate::DEFAULT_USER_AGENT);
                assert!(config.validate().is_ok());
            },
        );
    }

    #[cfg(feature = "env")]
    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
