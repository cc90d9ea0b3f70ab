//! S3 access keys of local users

use super::ResourceEntry;
use crate::dispatch::ApiVersion;
use crate::error::Result;
use crate::record::{EmptyRecord, Params, Record};
use http::Method;

/// The `users/{user_id}/access_keys` resource.
///
/// The path is a template, so only the per-user key operations are exposed.
#[derive(Debug, Clone)]
pub struct UserKeys {
    entry: ResourceEntry,
}

impl UserKeys {
    pub(crate) fn new(entry: ResourceEntry) -> Self {
        Self { entry }
    }

    /// Key path of one user.
    pub fn path(&self, user_id: i64) -> String {
        self.entry
            .path()
            .replace("{user_id}", &user_id.to_string())
    }

    /// Issue a new access key pair for a user.
    ///
    /// The returned record holds `access_key` and `secret_key`.
    pub async fn create_key(&self, user_id: i64) -> Result<Record> {
        self.entry
            .request(
                Method::POST,
                &self.path(user_id),
                ApiVersion::Default,
                None,
                None,
            )
            .await
    }

    /// Revoke one access key of a user.
    pub async fn delete_key(&self, user_id: i64, access_key: &str) -> Result<EmptyRecord> {
        let body = Params::new().with("access_key", access_key);
        self.entry
            .request(
                Method::DELETE,
                &self.path(user_id),
                ApiVersion::Default,
                None,
                Some(&body),
            )
            .await
    }
}
