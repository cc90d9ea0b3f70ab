//! Example of the full view lifecycle: create, update, fetch and delete
//!
//! This example shows how to:
//! 1. Create a view from a parameter map
//! 2. Update it by ID
//! 3. Fetch it with a filter and fill a typed struct
//! 4. Delete it by filter
//!
//! # Usage
//!
//! ```bash
//! cargo run --example views
//! ```

use serde::Deserialize;
use vast_client::{Client, ClientConfig, JsonValue, Params};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ViewContainer {
    id: i64,
    name: String,
    path: String,
    tenant_id: i64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Replace with your VAST address and credentials
    let client = Client::new(ClientConfig::with_credentials("10.27.40.1", "admin", "123456"));
    let views = client.views();

    let created = views
        .create(
            &Params::new()
                .with("name", "myview")
                .with("path", "/myview")
                .with("create_dir", true)
                .with("policy_id", 1)
                .with("protocols", JsonValue::from(vec!["NFS"])),
        )
        .await?;
    println!("✅ View created: {}", created);

    views
        .update(
            created.id()?,
            &Params::new().with("protocols", JsonValue::from(vec!["NFS", "NFS4"])),
        )
        .await?;
    println!("✅ View updated");

    let record = views
        .get(
            &Params::new()
                .with("path__endswith", "view")
                .with("tenant_id", 1),
        )
        .await?;
    let view: ViewContainer = record.fill()?;
    println!("📋 Fetched view: {:?}", view);

    views
        .delete(&Params::new().with("path__endswith", "view"))
        .await?;
    println!("🗑️  View deleted");

    Ok(())
}
