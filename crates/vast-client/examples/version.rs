//! Example printing the cluster version
//!
//! Connection settings are read from the environment (or a `.env` file):
//!
//! ```bash
//! export VMS_HOST=10.27.40.1
//! export VMS_USERNAME=admin
//! export VMS_PASSWORD=123456
//! cargo run --example version
//! ```

use std::cmp::Ordering;
use vast_client::{Client, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::from_config(ClientConfig::from_env()?)?;
    let versions = client.versions();

    let version = versions.get_version().await?;
    println!("Cluster version: {}", version);

    let block_api = semver::Version::new(5, 3, 0);
    match versions.compare_with(&block_api).await? {
        Ordering::Less => println!("Block storage API unavailable (requires {})", block_api),
        _ => println!("Block storage API available"),
    }

    Ok(())
}
