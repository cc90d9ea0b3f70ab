//! VMS resources
//!
//! Every resource kind is a [`ResourceEntry`]: one shared CRUD engine bound to
//! an immutable [`ResourceDescriptor`]. Kinds with extra operations wrap an
//! entry in a newtype that derefs to it.

pub mod catalog;
mod block;
mod tasks;
mod user_keys;

pub use block::{BlockHostMappings, BlockHosts};
pub use tasks::{PollPolicy, VTasks, Versions};
pub use user_keys::UserKeys;

use crate::client::Client;
use crate::dispatch::{ApiVersion, DispatchRequest};
use crate::error::{Error, Result};
use crate::record::{EmptyRecord, Params, Record, RecordSet, ResponseShape};
use http::Method;
use semver::Version;

/// Immutable metadata of one resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Path relative to `api/{version}/`
    pub path: &'static str,
    /// Kind name stamped onto returned records
    pub kind: &'static str,
    /// Oldest cluster version that supports this resource
    pub available_from: Option<Version>,
    /// Key wrapping list responses, if any
    pub list_envelope: Option<&'static str>,
}

impl ResourceDescriptor {
    /// Descriptor for a resource available on every cluster version.
    pub const fn new(path: &'static str, kind: &'static str) -> Self {
        Self {
            path,
            kind,
            available_from: None,
            list_envelope: None,
        }
    }

    /// Descriptor for a resource available from `version` on.
    pub const fn since(path: &'static str, kind: &'static str, version: Version) -> Self {
        Self {
            path,
            kind,
            available_from: Some(version),
            list_envelope: None,
        }
    }
}

/// Uniform CRUD access to one resource kind.
///
/// # Example
///
/// ```rust,no_run
/// use vast_client::{Client, ClientConfig, Params};
///
/// # async fn example() -> vast_client::Result<()> {
/// let client = Client::try_new(ClientConfig::with_credentials("10.27.40.1", "admin", "123456"))?;
/// let view = client
///     .views()
///     .get(&Params::new().with("name", "myview"))
///     .await?;
/// println!("{}", view);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ResourceEntry {
    client: Client,
    descriptor: &'static ResourceDescriptor,
}

impl ResourceEntry {
    /// Bind a descriptor to a client.
    pub fn new(client: Client, descriptor: &'static ResourceDescriptor) -> Self {
        Self { client, descriptor }
    }

    /// The resource's descriptor.
    pub fn descriptor(&self) -> &'static ResourceDescriptor {
        self.descriptor
    }

    /// The client this entry sends through.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Resource path relative to the API version prefix.
    pub fn path(&self) -> &'static str {
        self.descriptor.path
    }

    /// Resource kind name.
    pub fn kind(&self) -> &'static str {
        self.descriptor.kind
    }

    /// Send a gated request for this resource and decode it as `T`.
    ///
    /// This is the building block for kind-specific operations; `path` may
    /// differ from the descriptor's own path.
    pub async fn request<T: ResponseShape>(
        &self,
        method: Method,
        path: &str,
        api_version: ApiVersion,
        query: Option<&Params>,
        body: Option<&Params>,
    ) -> Result<T> {
        self.client.check_version(self.descriptor).await?;
        self.client
            .dispatcher()
            .dispatch(DispatchRequest {
                method,
                path,
                api_version,
                query,
                body,
                resource_type: self.descriptor.kind,
                list_envelope: self.descriptor.list_envelope,
            })
            .await
    }

    /// List records matching `params`. Zero matches is an empty set.
    pub async fn list(&self, params: &Params) -> Result<RecordSet> {
        self.request(Method::GET, self.path(), ApiVersion::Default, Some(params), None)
            .await
    }

    /// Create a record.
    pub async fn create(&self, body: &Params) -> Result<Record> {
        self.request(Method::POST, self.path(), ApiVersion::Default, None, Some(body))
            .await
    }

    /// Update the record with the given id.
    pub async fn update(&self, id: i64, body: &Params) -> Result<Record> {
        self.request(Method::PATCH, &self.id_path(id), ApiVersion::Default, None, Some(body))
            .await
    }

    /// Delete the record with the given id.
    pub async fn delete_by_id(&self, id: i64) -> Result<EmptyRecord> {
        self.request(Method::DELETE, &self.id_path(id), ApiVersion::Default, None, None)
            .await
    }

    /// Fetch the record with the given id.
    pub async fn get_by_id(&self, id: i64) -> Result<Record> {
        self.request(Method::GET, &self.id_path(id), ApiVersion::Default, None, None)
            .await
    }

    /// Fetch the single record matching `params`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] on zero matches, [`Error::Ambiguous`] on more than one.
    pub async fn get(&self, params: &Params) -> Result<Record> {
        let records = self.list(params).await?;
        let mut records = records.into_vec();
        match records.len() {
            0 => Err(Error::NotFound {
                resource: self.path().to_string(),
                query: params.to_query(),
            }),
            1 => Ok(records.remove(0)),
            _ => Err(Error::Ambiguous {
                resource: self.path().to_string(),
                query: params.to_query(),
            }),
        }
    }

    /// Delete the single record matching `params`.
    ///
    /// Nothing matching is a successful no-op.
    pub async fn delete(&self, params: &Params) -> Result<EmptyRecord> {
        let record = match self.get(params).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => return Ok(EmptyRecord),
            Err(e) => return Err(e),
        };
        let id = record.id()?;
        self.delete_by_id(id).await
    }

    /// Return the record named `name`, creating it from `body` if absent.
    ///
    /// An existing record is returned unchanged.
    pub async fn ensure(&self, name: &str, mut body: Params) -> Result<Record> {
        match self.get(&Params::new().with("name", name)).await {
            Ok(record) => Ok(record),
            Err(e) if e.is_not_found() => {
                body.insert("name", name);
                self.create(&body).await
            }
            Err(e) => Err(e),
        }
    }

    fn id_path(&self, id: i64) -> String {
        format!("{}/{}", self.path().trim_end_matches('/'), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_constructors() {
        let plain = ResourceDescriptor::new("views", "View");
        assert_eq!(plain.available_from, None);
        assert_eq!(plain.list_envelope, None);

        let gated = ResourceDescriptor::since("volumes", "Volume", Version::new(5, 3, 0));
        assert_eq!(gated.available_from, Some(Version::new(5, 3, 0)));
    }
}
