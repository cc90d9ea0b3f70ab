//! Common test utilities and helpers

use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use vast_client::{Client, ClientConfigBuilder};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Static API token used by [`token_client`]
#[allow(dead_code)]
pub const TEST_TOKEN: &str = "test-api-token";

/// Load a response fixture
#[allow(dead_code)]
pub fn load_response_fixture(name: &str) -> Value {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let path = Path::new(manifest_dir)
        .join("tests")
        .join("fixtures")
        .join("responses")
        .join(format!("{}.json", name));

    let raw = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        panic!(
            "Failed to load response fixture '{}' from {:?}: {}",
            name, path, e
        )
    });
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("Fixture '{}' is not JSON: {}", name, e))
}

/// Builder pointed at the mock server over plain HTTP
#[allow(dead_code)]
pub fn builder_for(server: &MockServer) -> ClientConfigBuilder {
    Client::builder()
        .scheme("http")
        .host("127.0.0.1")
        .port(server.address().port())
        .timeout(Duration::from_secs(5))
}

/// Client authenticating with [`TEST_TOKEN`]
#[allow(dead_code)]
pub fn token_client(server: &MockServer) -> Client {
    builder_for(server)
        .api_token(TEST_TOKEN)
        .build_client()
        .expect("Failed to build client")
}

/// Serve `sys_version` from `versions?status=success`
#[allow(dead_code)]
pub async fn mount_cluster_version(server: &MockServer, sys_version: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v5/versions"))
        .and(query_param("status", "success"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": 1, "sys_version": sys_version, "status": "success" }])),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Serve a token pair from the token endpoint
#[allow(dead_code)]
pub fn token_response(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "access": access, "refresh": refresh }))
}
