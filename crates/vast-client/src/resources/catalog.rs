//! Declarative table of VMS resources

use super::ResourceDescriptor;
use semver::Version;

const BLOCK_API: Version = Version::new(5, 3, 0);

macro_rules! resource_table {
    ($($(#[$meta:meta])* $name:ident = $descriptor:expr;)*) => {
        $(
            $(#[$meta])*
            #[doc = concat!("Descriptor of `", stringify!($name), "`.")]
            pub static $name: ResourceDescriptor = $descriptor;
        )*

        /// Every resource known to the client.
        pub static ALL: &[&ResourceDescriptor] = &[$(&$name),*];
    };
}

resource_table! {
    VERSIONS = ResourceDescriptor::new("versions", "Version");
    VTASKS = ResourceDescriptor::new("vtasks", "VTask");
    QUOTAS = ResourceDescriptor::new("quotas", "Quota");
    VIEWS = ResourceDescriptor::new("views", "View");
    VIP_POOLS = ResourceDescriptor::new("vippools", "VipPool");
    USERS = ResourceDescriptor::new("users", "User");
    /// `{user_id}` is substituted per call.
    USER_KEYS = ResourceDescriptor::new("users/{user_id}/access_keys", "UserKey");
    SNAPSHOTS = ResourceDescriptor {
        path: "snapshots",
        kind: "Snapshot",
        available_from: None,
        list_envelope: Some("results"),
    };
    BLOCK_HOSTS = ResourceDescriptor::since("blockhosts", "BlockHost", BLOCK_API);
    VOLUMES = ResourceDescriptor::since("volumes", "Volume", BLOCK_API);
    BLOCK_HOST_MAPPINGS = ResourceDescriptor::since("blockhostvolumes", "BlockHostMapping", BLOCK_API);
    CNODES = ResourceDescriptor::new("cnodes", "Cnode");
    QOS_POLICIES = ResourceDescriptor::new("qospolicies", "QosPolicy");
    DNS = ResourceDescriptor::new("dns", "Dns");
    VIEW_POLICIES = ResourceDescriptor::new("viewpolicies", "ViewPolicy");
    GROUPS = ResourceDescriptor::new("groups", "Group");
    NIS = ResourceDescriptor::new("nis", "Nis");
    TENANTS = ResourceDescriptor::new("tenants", "Tenant");
    LDAPS = ResourceDescriptor::new("ldaps", "Ldap");
    S3_LIFECYCLE_RULES = ResourceDescriptor::new("s3lifecyclerules", "S3LifeCycleRule");
    ACTIVE_DIRECTORIES = ResourceDescriptor::new("activedirectory", "ActiveDirectory");
    S3_POLICIES = ResourceDescriptor::new("s3userpolicies", "S3Policy");
    PROTECTED_PATHS = ResourceDescriptor::new("protectedpaths", "ProtectedPath");
    GLOBAL_SNAPSHOT_STREAMS = ResourceDescriptor::new("globalsnapstreams", "GlobalSnapshotStream");
    REPLICATION_PEERS = ResourceDescriptor::new("nativereplicationremotetargets", "ReplicationPeers");
    PROTECTION_POLICIES = ResourceDescriptor::new("protectionpolicies", "ProtectionPolicy");
    S3_REPLICATION_PEERS = ResourceDescriptor::new("replicationtargets", "S3ReplicationPeers");
    REALMS = ResourceDescriptor::new("realms", "Realm");
    ROLES = ResourceDescriptor::new("roles", "Role");
}

/// Look up a descriptor by kind name.
pub fn by_kind(kind: &str) -> Option<&'static ResourceDescriptor> {
    ALL.iter().copied().find(|d| d.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_kinds_and_paths_are_unique() {
        let kinds: HashSet<_> = ALL.iter().map(|d| d.kind).collect();
        let paths: HashSet<_> = ALL.iter().map(|d| d.path).collect();
        assert_eq!(kinds.len(), ALL.len());
        assert_eq!(paths.len(), ALL.len());
    }

    #[test]
    fn test_only_block_resources_are_gated() {
        let gated: Vec<_> = ALL
            .iter()
            .filter(|d| d.available_from.is_some())
            .map(|d| d.kind)
            .collect();
        assert_eq!(gated, ["BlockHost", "Volume", "BlockHostMapping"]);
    }

    #[test]
    fn test_by_kind() {
        assert_eq!(by_kind("Snapshot").map(|d| d.list_envelope), Some(Some("results")));
        assert!(by_kind("Missing").is_none());
    }
}
