//! Main client implementation for the VMS REST API

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::{
    config::{ClientConfig, ClientConfigBuilder},
    dispatch::Dispatcher,
    error::Result,
    http::{Authenticator, Session},
    resources::{
        BlockHostMappings, BlockHosts, ResourceDescriptor, ResourceEntry, UserKeys, VTasks,
        Versions, catalog,
    },
    version::VersionGate,
};

/// Main client for interacting with one VMS.
///
/// Cloning is cheap; clones share the session, the credentials and the
/// cached cluster version.
///
/// # Example
///
/// ```rust,no_run
/// use vast_client::{Client, ClientConfig};
///
/// let client = Client::new(ClientConfig::with_credentials("10.27.40.1", "admin", "123456"));
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    dispatcher: Dispatcher,
    version: VersionGate,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.dispatcher.session().base_url().as_str())
            .finish_non_exhaustive()
    }
}

macro_rules! resource_accessors {
    ($($(#[$meta:meta])* $name:ident => $descriptor:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self) -> ResourceEntry {
                self.resource(&catalog::$descriptor)
            }
        )*
    };
}

impl Client {
    /// Create a new client from a configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid, most notably when neither
    /// username/password nor an API token is set. Use [`Client::try_new()`]
    /// for fallible construction.
    pub fn new(config: ClientConfig) -> Self {
        Self::try_new(config).expect("Failed to build VMS client from configuration")
    }

    /// Create a new client from a configuration (fallible version).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The host or every credential is missing
    /// - The scheme or host does not form a valid URL
    /// - HTTP client configuration fails
    pub fn try_new(config: ClientConfig) -> Result<Self> {
        Self::from_config(config)
    }

    /// Create a new client builder for advanced configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Create a client from a configuration object.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let session = Session::new(&config)?;
        Ok(Self::from_session(session, config))
    }

    /// Create a client with a custom authenticator.
    ///
    /// Credentials in `config` are ignored.
    pub fn with_authenticator(config: ClientConfig, auth: Arc<dyn Authenticator>) -> Result<Self> {
        config.validate_endpoint()?;
        let base_url = crate::http::base_url(&config)?;
        let session = Session::with_authenticator(&config, base_url, auth)?;
        Ok(Self::from_session(session, config))
    }

    fn from_session(session: Session, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                dispatcher: Dispatcher::new(session, config.interceptors, config.api_version),
                version: VersionGate::new(),
            }),
        }
    }

    pub(crate) fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub(crate) async fn check_version(&self, descriptor: &ResourceDescriptor) -> Result<()> {
        self.inner
            .version
            .check(&self.inner.dispatcher, descriptor)
            .await
    }

    /// Core version of the connected cluster, cached after the first lookup.
    pub async fn cluster_version(&self) -> Result<semver::Version> {
        self.inner.version.get_version(&self.inner.dispatcher).await
    }

    /// Compare the cluster version with `other`.
    pub async fn compare_version(&self, other: &semver::Version) -> Result<Ordering> {
        self.inner
            .version
            .compare_with(&self.inner.dispatcher, other)
            .await
    }

    /// Forget the cached cluster version.
    pub fn invalidate_version(&self) {
        self.inner.version.invalidate();
    }

    /// Generic CRUD access to any resource descriptor.
    pub fn resource(&self, descriptor: &'static ResourceDescriptor) -> ResourceEntry {
        ResourceEntry::new(self.clone(), descriptor)
    }

    /// Access the `versions` resource.
    pub fn versions(&self) -> Versions {
        Versions::new(self.resource(&catalog::VERSIONS))
    }

    /// Access the `vtasks` resource.
    pub fn vtasks(&self) -> VTasks {
        VTasks::new(self.resource(&catalog::VTASKS))
    }

    /// Access user access keys.
    pub fn user_keys(&self) -> UserKeys {
        UserKeys::new(self.resource(&catalog::USER_KEYS))
    }

    /// Access the `blockhosts` resource.
    pub fn block_hosts(&self) -> BlockHosts {
        BlockHosts::new(self.resource(&catalog::BLOCK_HOSTS))
    }

    /// Access host-to-volume mappings.
    pub fn block_host_mappings(&self) -> BlockHostMappings {
        BlockHostMappings::new(self.resource(&catalog::BLOCK_HOST_MAPPINGS), self.vtasks())
    }

    resource_accessors! {
        /// Access the `quotas` resource.
        quotas => QUOTAS;
        /// Access the `views` resource.
        views => VIEWS;
        /// Access the `vippools` resource.
        vip_pools => VIP_POOLS;
        /// Access the `users` resource.
        users => USERS;
        /// Access the `snapshots` resource.
        snapshots => SNAPSHOTS;
        /// Access the `volumes` resource.
        volumes => VOLUMES;
        /// Access the `cnodes` resource.
        cnodes => CNODES;
        /// Access the `qospolicies` resource.
        qos_policies => QOS_POLICIES;
        /// Access the `dns` resource.
        dns => DNS;
        /// Access the `viewpolicies` resource.
        view_policies => VIEW_POLICIES;
        /// Access the `groups` resource.
        groups => GROUPS;
        /// Access the `nis` resource.
        nis => NIS;
        /// Access the `tenants` resource.
        tenants => TENANTS;
        /// Access the `ldaps` resource.
        ldaps => LDAPS;
        /// Access the `s3lifecyclerules` resource.
        s3_lifecycle_rules => S3_LIFECYCLE_RULES;
        /// Access the `activedirectory` resource.
        active_directories => ACTIVE_DIRECTORIES;
        /// Access the `s3userpolicies` resource.
        s3_policies => S3_POLICIES;
        /// Access the `protectedpaths` resource.
        protected_paths => PROTECTED_PATHS;
        /// Access the `globalsnapstreams` resource.
        global_snapshot_streams => GLOBAL_SNAPSHOT_STREAMS;
        /// Access the `nativereplicationremotetargets` resource.
        replication_peers => REPLICATION_PEERS;
        /// Access the `protectionpolicies` resource.
        protection_policies => PROTECTION_POLICIES;
        /// Access the `replicationtargets` resource.
        s3_replication_peers => S3_REPLICATION_PEERS;
        /// Access the `realms` resource.
        realms => REALMS;
        /// Access the `roles` resource.
        roles => ROLES;
    }
}

impl ClientConfigBuilder {
    /// Build a client from this configuration.
    pub fn build_client(self) -> Result<Client> {
        Client::from_config(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn config() -> ClientConfig {
        ClientConfig::with_api_token("vms.local", "token")
    }

    #[test]
    fn test_client_from_config() {
        let client = Client::from_config(config()).unwrap();
        assert_eq!(client.views().path(), "views");
        assert_eq!(client.views().kind(), "View");
    }

    #[test]
    #[should_panic(expected = "Failed to build VMS client")]
    fn test_client_new_panics_without_credentials() {
        let _ = Client::new(ClientConfigBuilder::new().host("vms.local").build());
    }

    #[test]
    fn test_client_try_new_reports_missing_credentials() {
        let result = Client::try_new(ClientConfigBuilder::new().host("vms.local").build());
        assert!(matches!(result, Err(Error::MissingConfig(_))));
    }

    #[test]
    fn test_client_rejects_oversized_connection_limit() {
        let result = Client::builder()
            .host("vms.local")
            .api_token("t")
            .max_connections(usize::MAX)
            .build_client();
        assert!(matches!(result, Err(Error::MissingConfig(_))));
    }

    #[test]
    fn test_client_clone_shares_arc() {
        let client = Client::from_config(config()).unwrap();
        let clone = client.clone();
        assert!(Arc::ptr_eq(&client.inner, &clone.inner));
    }

    #[test]
    fn test_kind_specific_accessors() {
        let client = Client::builder()
            .host("vms.local")
            .api_token("token")
            .build_client()
            .unwrap();
        assert_eq!(client.user_keys().path(3), "users/3/access_keys");
        assert_eq!(client.block_host_mappings().path(), "blockhostvolumes");
        assert_eq!(client.snapshots().descriptor().list_envelope, Some("results"));
        assert!(client.volumes().descriptor().available_from.is_some());
    }
}
