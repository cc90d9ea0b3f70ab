//! NVMe-over-TCP block hosts and their volume mappings

use super::{ResourceEntry, VTasks};
use crate::dispatch::ApiVersion;
use crate::error::Result;
use crate::record::{Params, Record};
use http::Method;
use serde_json::json;
use std::ops::Deref;

/// The `blockhosts` resource.
#[derive(Debug, Clone)]
pub struct BlockHosts {
    entry: ResourceEntry,
}

impl BlockHosts {
    pub(crate) fn new(entry: ResourceEntry) -> Self {
        Self { entry }
    }

    /// Return the block host `name` of a tenant, creating it if absent.
    ///
    /// New hosts are created as `LINUX` hosts connecting over `tcp`.
    pub async fn ensure_block_host(&self, name: &str, tenant_id: i64, nqn: &str) -> Result<Record> {
        let mut params = Params::new().with("name", name).with("tenant_id", tenant_id);
        match self.entry.get(&params).await {
            Ok(host) => Ok(host),
            Err(e) if e.is_not_found() => {
                params.update(
                    Params::new()
                        .with("nqn", nqn)
                        .with("os_type", "LINUX")
                        .with("connectivity_type", "tcp"),
                    false,
                );
                self.entry.create(&params).await
            }
            Err(e) => Err(e),
        }
    }
}

impl Deref for BlockHosts {
    type Target = ResourceEntry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

/// The `blockhostvolumes` resource.
///
/// Mapping changes run as asynchronous tasks; each call waits for its task.
#[derive(Debug, Clone)]
pub struct BlockHostMappings {
    entry: ResourceEntry,
    tasks: VTasks,
}

impl BlockHostMappings {
    pub(crate) fn new(entry: ResourceEntry, tasks: VTasks) -> Self {
        Self { entry, tasks }
    }

    /// Map a volume to a host and return the finished task.
    pub async fn map(&self, host_id: i64, volume_id: i64) -> Result<Record> {
        self.bulk("pairs_to_add", host_id, volume_id).await
    }

    /// Unmap a volume from a host and return the finished task.
    pub async fn unmap(&self, host_id: i64, volume_id: i64) -> Result<Record> {
        self.bulk("pairs_to_remove", host_id, volume_id).await
    }

    /// Return the existing mapping, or map the pair if none exists.
    pub async fn ensure_map(&self, host_id: i64, volume_id: i64) -> Result<Record> {
        let params = Params::new()
            .with("volume__id", volume_id)
            .with("block_host__id", host_id);
        match self.entry.get(&params).await {
            Err(e) if e.is_not_found() => self.map(host_id, volume_id).await,
            other => other,
        }
    }

    async fn bulk(&self, action: &str, host_id: i64, volume_id: i64) -> Result<Record> {
        let body = Params::new().with(action, json!([{ "host_id": host_id, "volume_id": volume_id }]));
        let path = format!("{}/bulk", self.entry.path());
        let task: Record = self
            .entry
            .request(Method::PATCH, &path, ApiVersion::Default, None, Some(&body))
            .await?;
        self.tasks.wait_task(task.id()?).await
    }
}

impl Deref for BlockHostMappings {
    type Target = ResourceEntry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}
