//! Cluster version resolution and the compatibility gate
//!
//! The connected cluster's core version is fetched once per client and cached
//! until [`VersionGate::invalidate`] is called. Resources that declare a
//! minimum version are rejected before any request when the cluster is older.

use crate::dispatch::{ApiVersion, DispatchRequest, Dispatcher};
use crate::error::{Error, Result};
use crate::observability;
use crate::record::{Params, RecordSet};
use crate::resources::{ResourceDescriptor, catalog};
use http::Method;
use semver::Version;
use std::cmp::Ordering;
use std::sync::{PoisonError, RwLock};

/// Per-client cache of the cluster version.
#[derive(Debug, Default)]
pub(crate) struct VersionGate {
    cached: RwLock<Option<Version>>,
}

impl VersionGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn cached(&self) -> Option<Version> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn invalidate(&self) {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn store(&self, version: Version) {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(version);
    }

    /// Core version of the cluster, from cache or from `versions?status=success`.
    pub(crate) async fn get_version(&self, dispatcher: &Dispatcher) -> Result<Version> {
        if let Some(version) = self.cached() {
            return Ok(version);
        }

        let descriptor = &catalog::VERSIONS;
        let query = Params::new().with("status", "success");
        let records: RecordSet = dispatcher
            .dispatch(DispatchRequest {
                method: Method::GET,
                path: descriptor.path,
                api_version: ApiVersion::Default,
                query: Some(&query),
                body: None,
                resource_type: descriptor.kind,
                list_envelope: descriptor.list_envelope,
            })
            .await?;

        let raw = records
            .first()
            .ok_or_else(|| Error::InvalidVersion("no successful version record found".to_string()))?
            .get_str("sys_version")
            .ok_or_else(|| Error::InvalidVersion("version record has no sys_version".to_string()))?;

        let version = sanitize_version(raw)?;
        observability::log_version_resolved(&version);
        self.store(version.clone());
        Ok(version)
    }

    pub(crate) async fn compare_with(&self, dispatcher: &Dispatcher, other: &Version) -> Result<Ordering> {
        Ok(self.get_version(dispatcher).await?.cmp(other))
    }

    /// Reject the call when the cluster is older than the resource's minimum.
    ///
    /// Resources without a minimum pass without any version lookup.
    pub(crate) async fn check(&self, dispatcher: &Dispatcher, descriptor: &ResourceDescriptor) -> Result<()> {
        let Some(required) = descriptor.available_from.as_ref() else {
            return Ok(());
        };

        let cluster_version = self.get_version(dispatcher).await?;
        if cluster_version < *required {
            return Err(Error::VersionIncompatible {
                resource: descriptor.kind.to_string(),
                cluster_version,
                required: required.clone(),
            });
        }
        Ok(())
    }
}

/// Parse a cluster version string into its core `major.minor.patch`.
///
/// Segments after the third are dropped, as is any non-digit suffix within a
/// segment (`5.3.0-rc1` and `5.3.0.42` both give `5.3.0`). Missing minor or
/// patch segments count as zero.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] if a kept segment has no leading digits.
///
/// # Example
///
/// ```rust
/// use vast_client::version::sanitize_version;
///
/// let version = sanitize_version("5.2.0.31").unwrap();
/// assert_eq!(version, semver::Version::new(5, 2, 0));
/// ```
pub fn sanitize_version(raw: &str) -> Result<Version> {
    let mut parts = [0u64; 3];
    for (index, segment) in raw.trim().split('.').take(3).enumerate() {
        let digits: String = segment.chars().take_while(char::is_ascii_digit).collect();
        parts[index] = digits
            .parse()
            .map_err(|_| Error::InvalidVersion(raw.to_string()))?;
    }
    Ok(Version::new(parts[0], parts[1], parts[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("5.3.0", (5, 3, 0))]
    #[case("5.2.0.31", (5, 2, 0))]
    #[case("5.3.0-rc1", (5, 3, 0))]
    #[case("5.1", (5, 1, 0))]
    #[case(" 4.7.14.1 ", (4, 7, 14))]
    fn test_sanitize_version(#[case] raw: &str, #[case] expected: (u64, u64, u64)) {
        let (major, minor, patch) = expected;
        assert_eq!(sanitize_version(raw).unwrap(), Version::new(major, minor, patch));
    }

    #[rstest]
    #[case("")]
    #[case("release")]
    #[case("5.x.0")]
    fn test_sanitize_version_rejects(#[case] raw: &str) {
        assert!(matches!(sanitize_version(raw), Err(Error::InvalidVersion(_))));
    }

    #[test]
    fn test_cache_invalidate() {
        let gate = VersionGate::new();
        assert!(gate.cached().is_none());

        gate.store(Version::new(5, 3, 0));
        assert_eq!(gate.cached(), Some(Version::new(5, 3, 0)));

        gate.invalidate();
        assert!(gate.cached().is_none());
    }
}
