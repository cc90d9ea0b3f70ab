//! Before/after request hooks
//!
//! A [`RequestInterceptor`] observes every dispatched call twice: once before
//! any network I/O (it can veto the call) and once after the response has been
//! decoded and tagged (it can replace the value).

use crate::error::Result;
use crate::record::ResponseValue;
use async_trait::async_trait;
use http::Method;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Trait for request interceptors.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Inspect a request before it is sent. An error aborts the call.
    ///
    /// `body` is a read-only view of the exact bytes that will be sent.
    async fn before_request(&self, method: &Method, url: &Url, body: Option<&[u8]>) -> Result<()> {
        let _ = (method, url, body);
        Ok(())
    }

    /// Inspect or replace a decoded response.
    async fn after_request(&self, response: ResponseValue) -> Result<ResponseValue> {
        Ok(response)
    }
}

/// Interceptor that logs every call through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInterceptor;

#[async_trait]
impl RequestInterceptor for TracingInterceptor {
    async fn before_request(&self, method: &Method, url: &Url, body: Option<&[u8]>) -> Result<()> {
        let body = body.map(String::from_utf8_lossy);
        tracing::debug!(
            method = %method,
            url = %url,
            body = body.as_deref(),
            "Dispatching request"
        );
        Ok(())
    }

    async fn after_request(&self, response: ResponseValue) -> Result<ResponseValue> {
        tracing::debug!(shape = response.shape_name(), "Received response");
        Ok(response)
    }
}

type BeforeFn = dyn Fn(&Method, &Url, Option<&[u8]>) -> Result<()> + Send + Sync;
type AfterFn = dyn Fn(ResponseValue) -> Result<ResponseValue> + Send + Sync;

/// Interceptor built from plain closures.
///
/// # Example
///
/// ```rust
/// use vast_client::http::FnInterceptor;
///
/// let interceptor = FnInterceptor::before(|method, url, _body| {
///     println!("{} {}", method, url);
///     Ok(())
/// });
/// ```
#[derive(Clone, Default)]
pub struct FnInterceptor {
    before: Option<Arc<BeforeFn>>,
    after: Option<Arc<AfterFn>>,
}

impl FnInterceptor {
    /// Interceptor with only a before-request closure.
    pub fn before<F>(f: F) -> Self
    where
        F: Fn(&Method, &Url, Option<&[u8]>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            before: Some(Arc::new(f)),
            after: None,
        }
    }

    /// Interceptor with only an after-request closure.
    pub fn after<F>(f: F) -> Self
    where
        F: Fn(ResponseValue) -> Result<ResponseValue> + Send + Sync + 'static,
    {
        Self {
            before: None,
            after: Some(Arc::new(f)),
        }
    }
}

impl fmt::Debug for FnInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

#[async_trait]
impl RequestInterceptor for FnInterceptor {
    async fn before_request(&self, method: &Method, url: &Url, body: Option<&[u8]>) -> Result<()> {
        match &self.before {
            Some(f) => f(method, url, body),
            None => Ok(()),
        }
    }

    async fn after_request(&self, response: ResponseValue) -> Result<ResponseValue> {
        match &self.after {
            Some(f) => f(response),
            None => Ok(response),
        }
    }
}

/// Ordered chain of interceptors.
///
/// Before-hooks run in insertion order, after-hooks in reverse order.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl InterceptorChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor.
    pub fn push(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Number of interceptors in the chain.
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Append every interceptor of `other` after this chain's own.
    pub fn extend(&mut self, other: InterceptorChain) {
        self.interceptors.extend(other.interceptors);
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}

#[async_trait]
impl RequestInterceptor for InterceptorChain {
    async fn before_request(&self, method: &Method, url: &Url, body: Option<&[u8]>) -> Result<()> {
        for interceptor in &self.interceptors {
            interceptor.before_request(method, url, body).await?;
        }
        Ok(())
    }

    async fn after_request(&self, mut response: ResponseValue) -> Result<ResponseValue> {
        for interceptor in self.interceptors.iter().rev() {
            response = interceptor.after_request(response).await?;
        }
        Ok(response)
    }
}
