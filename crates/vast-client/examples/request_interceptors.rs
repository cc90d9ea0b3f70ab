//! Example of before/after request hooks
//!
//! The before hook logs every outgoing request with its pretty-printed JSON
//! body; the after hook logs the decoded result. The built-in
//! `TracingInterceptor` is installed too, so run with debug logging to see
//! both.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=vast_client=debug cargo run --example request_interceptors --features trace
//! ```

use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vast_client::http::TracingInterceptor;
use vast_client::{Client, JsonValue, Params};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let client = Client::builder()
        .host("10.27.40.1")
        .username("admin")
        .password("123456")
        .interceptor(Arc::new(TracingInterceptor))
        .before_request(|method, url, body| {
            tracing::info!("Sending request: verb={}, url={}", method, url);
            if let Some(body) = body {
                match serde_json::from_slice::<JsonValue>(body) {
                    Ok(json) => tracing::info!("Request JSON:\n{:#}", json),
                    Err(_) => tracing::info!("Request Body:\n{}", String::from_utf8_lossy(body)),
                }
            }
            Ok(())
        })
        .after_request(|response| {
            tracing::info!("Result:\n{}", response);
            Ok(response)
        })
        .build_client()?;

    client.tenants().list(&Params::new()).await?;

    Ok(())
}
