//! Example issuing and revoking an S3 access key pair for a user
//!
//! # Usage
//!
//! ```bash
//! cargo run --example user_keys
//! ```

use vast_client::{Client, ClientConfig, Error};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new(ClientConfig::with_credentials("10.27.40.1", "admin", "123456"));
    let keys = client.user_keys();

    let pair = keys.create_key(1).await?;
    let access_key = pair
        .get_str("access_key")
        .ok_or_else(|| Error::InvalidRecord("response has no access_key".to_string()))?;
    println!("access key: {}", access_key);

    keys.delete_key(1, access_key).await?;
    println!("access key revoked");

    Ok(())
}
