//! HTTP layer: authentication, session transport and request interceptors

pub use auth::{Authenticator, StaticTokenAuthenticator, TokenExchangeAuthenticator};
pub use interceptor::{FnInterceptor, InterceptorChain, RequestInterceptor, TracingInterceptor};
pub use session::{Session, validate_response};
pub(crate) use session::base_url;

pub mod auth;
pub mod interceptor;
mod session;

// Re-export HTTP and URL types for convenience
pub use http::{HeaderMap, HeaderValue, Method, StatusCode};
pub use url::Url;
