//! # vast-client
//!
//! Typed async client for the VAST Management System (VMS) REST API:
//! - One uniform CRUD surface over every resource kind
//! - Username/password token exchange with automatic refresh, or static API tokens
//! - Cluster-version gating of resources that need a newer VMS
//! - Polling of asynchronous server-side tasks
//! - Before/after request hooks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vast_client::{Client, ClientConfig, Params};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::with_credentials("10.27.40.1", "admin", "123456"));
//!
//!     let view = client
//!         .views()
//!         .create(&Params::new()
//!             .with("name", "myview")
//!             .with("path", "/myview")
//!             .with("create_dir", true)
//!             .with("policy_id", 1))
//!         .await?;
//!
//!     println!("{}", view);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::time::Duration;

// Re-export commonly used types
pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use dispatch::ApiVersion;
pub use error::{Error, Result};
pub use record::{EmptyRecord, Params, Record, RecordSet, ResponseShape, ResponseValue};
pub use resources::{PollPolicy, ResourceDescriptor, ResourceEntry};

// Module declarations
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod observability;
pub mod record;
pub mod resources;
pub mod version;

// Re-export key dependencies for convenience
pub use async_trait::async_trait;
pub use serde_json::Value as JsonValue;
pub use tokio_util::sync::CancellationToken;

/// Prelude module for common imports
///
/// # Examples
///
/// ```rust
/// use vast_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ApiVersion, Client, ClientConfig, EmptyRecord, Error, Params, Record, RecordSet, Result,
        http::RequestInterceptor,
        resources::{PollPolicy, ResourceEntry},
    };
}

/// Crate version, automatically updated from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API version path segment
pub const DEFAULT_API_VERSION: &str = "v5";

/// Default VMS port
pub const DEFAULT_PORT: u16 = 443;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum number of concurrent connections
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// Default user agent prefix
pub const DEFAULT_USER_AGENT: &str = concat!("vast-client-rust/", env!("CARGO_PKG_VERSION"));

/// Access token age after which it is refreshed
pub const TOKEN_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);
