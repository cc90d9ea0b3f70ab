//! Generic request engine
//!
//! Turns `(verb, path, query, body)` into one of the three response shapes:
//! resolve the verb, serialize the inputs, build the URL, run the
//! before-hooks, send through the session, decode, stamp the resource kind,
//! and run the after-hooks.

use crate::error::{Error, Result};
use crate::http::{InterceptorChain, RequestInterceptor, Session};
use crate::observability;
use crate::record::{Params, ResponseShape};
use bytes::Bytes;
use http::Method;
use url::Url;

/// Which API version segment a request uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ApiVersion {
    /// The client's configured default version
    #[default]
    Default,
    /// A specific version for this call only
    Explicit(String),
    /// No version segment (`/api/{path}`)
    Unversioned,
}

impl ApiVersion {
    /// Explicit version override.
    pub fn explicit(version: impl Into<String>) -> Self {
        ApiVersion::Explicit(version.into())
    }
}

/// One call to dispatch.
#[derive(Debug, Clone)]
pub(crate) struct DispatchRequest<'a> {
    /// HTTP verb
    pub(crate) method: Method,
    /// Path relative to the API version prefix
    pub(crate) path: &'a str,
    /// Version segment policy
    pub(crate) api_version: ApiVersion,
    /// Query parameters
    pub(crate) query: Option<&'a Params>,
    /// JSON body
    pub(crate) body: Option<&'a Params>,
    /// Resource kind stamped onto decoded records
    pub(crate) resource_type: &'a str,
    /// Wrapper key around list responses, if the resource uses one
    pub(crate) list_envelope: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl TryFrom<&Method> for Verb {
    type Error = Error;

    fn try_from(method: &Method) -> Result<Self> {
        match *method {
            Method::GET => Ok(Verb::Get),
            Method::POST => Ok(Verb::Post),
            Method::PUT => Ok(Verb::Put),
            Method::PATCH => Ok(Verb::Patch),
            Method::DELETE => Ok(Verb::Delete),
            ref other => Err(Error::UnknownVerb(other.to_string())),
        }
    }
}

/// Request engine shared by every resource of a client.
#[derive(Debug)]
pub(crate) struct Dispatcher {
    session: Session,
    interceptors: InterceptorChain,
    api_version: String,
}

impl Dispatcher {
    pub(crate) fn new(session: Session, interceptors: InterceptorChain, api_version: String) -> Self {
        Self {
            session,
            interceptors,
            api_version,
        }
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) async fn dispatch<T: ResponseShape>(&self, request: DispatchRequest<'_>) -> Result<T> {
        let verb = Verb::try_from(&request.method)?;

        let query = request.query.map(Params::to_query).unwrap_or_default();
        let body = match request.body {
            Some(body) => Some(body.to_body()?),
            None => None,
        };

        let version = match &request.api_version {
            ApiVersion::Default => Some(self.api_version.as_str()),
            ApiVersion::Explicit(v) => Some(v.as_str()),
            ApiVersion::Unversioned => None,
        };
        let url = build_url(self.session.base_url(), version, request.path, &query)?;

        self.interceptors
            .before_request(&request.method, &url, body.as_deref())
            .await?;

        let body = body.unwrap_or_else(Bytes::new);
        let response = match verb {
            Verb::Get => self.session.get(url.clone(), body).await?,
            Verb::Post => self.session.post(url.clone(), body).await?,
            Verb::Put => self.session.put(url.clone(), body).await?,
            Verb::Patch => self.session.patch(url.clone(), body).await?,
            Verb::Delete => self.session.delete(url.clone(), body).await?,
        };

        let mut value = if T::READS_BODY {
            let bytes = response.bytes().await?;
            T::decode(&bytes, request.list_envelope).inspect_err(|e| {
                observability::log_decode_failure(T::NAME, &url, &e.to_string());
            })?
        } else {
            drop(response);
            T::decode(&[], None)?
        };
        value.stamp(request.resource_type);

        if self.interceptors.is_empty() {
            return Ok(value);
        }
        let value = self.interceptors.after_request(value.into_value()).await?;
        T::from_value(value)
    }
}

/// Build `{base}api/{version}/{path}?{query}`.
///
/// Leading and trailing separators of `path` are trimmed.
pub(crate) fn build_url(base: &Url, version: Option<&str>, path: &str, query: &str) -> Result<Url> {
    let mut relative = String::from("api/");
    if let Some(version) = version.map(|v| v.trim_matches('/')).filter(|v| !v.is_empty()) {
        relative.push_str(version);
        relative.push('/');
    }
    relative.push_str(path.trim_matches('/'));

    let mut url = base
        .join(&relative)
        .map_err(|e| Error::InvalidUrl(format!("Failed to build URL for '{}': {}", path, e)))?;
    if !query.is_empty() {
        url.set_query(Some(query));
    }
    Ok(url)
}
