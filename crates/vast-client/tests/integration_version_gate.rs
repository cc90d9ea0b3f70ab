//! Integration tests for cluster version resolution and gating

mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use semver::Version;
use serde_json::json;
use std::cmp::Ordering;
use vast_client::{Error, Params};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_volumes(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v5/volumes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "vol1"}])))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_ungated_resource_skips_version_lookup() {
    let server = MockServer::start().await;
    common::mount_cluster_version(&server, "5.2.0", 0).await;

    Mock::given(method("GET"))
        .and(path("/api/v5/views"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::token_client(&server);
    client.views().list(&Params::new()).await.unwrap();

    server.verify().await;
}

#[tokio::test]
async fn test_old_cluster_rejects_block_resource_before_request() {
    let server = MockServer::start().await;
    common::mount_cluster_version(&server, "5.2.0.31", 1).await;
    mount_volumes(&server, 0).await;

    let client = common::token_client(&server);
    let error = client.volumes().list(&Params::new()).await.unwrap_err();

    assert_matches!(error, Error::VersionIncompatible { ref resource, ref cluster_version, ref required } => {
        assert_eq!(resource, "Volume");
        assert_eq!(*cluster_version, Version::new(5, 2, 0));
        assert_eq!(*required, Version::new(5, 3, 0));
    });
    assert_eq!(
        error.to_string(),
        "resource \"Volume\" is not supported in VAST cluster version 5.2.0 (supported from version 5.3.0)"
    );
    server.verify().await;
}

#[tokio::test]
async fn test_supported_cluster_is_resolved_once() {
    let server = MockServer::start().await;
    common::mount_cluster_version(&server, "5.3.0", 1).await;
    mount_volumes(&server, 2).await;

    let client = common::token_client(&server);
    client.volumes().list(&Params::new()).await.unwrap();
    client.volumes().list(&Params::new()).await.unwrap();

    assert_eq!(client.cluster_version().await.unwrap(), Version::new(5, 3, 0));
    server.verify().await;
}

#[tokio::test]
async fn test_newer_cluster_with_suffix_is_allowed() {
    let server = MockServer::start().await;
    common::mount_cluster_version(&server, "5.4.1-rc2.117", 1).await;
    mount_volumes(&server, 1).await;

    let client = common::token_client(&server);
    let volumes = client.volumes().list(&Params::new()).await.unwrap();
    assert_eq!(volumes[0].resource_type(), Some("Volume"));

    server.verify().await;
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let server = MockServer::start().await;
    common::mount_cluster_version(&server, "5.3.0", 2).await;

    let client = common::token_client(&server);
    let versions = client.versions();

    assert_eq!(versions.get_version().await.unwrap(), Version::new(5, 3, 0));
    assert_eq!(versions.get_version().await.unwrap(), Version::new(5, 3, 0));
    versions.invalidate();
    assert_eq!(versions.get_version().await.unwrap(), Version::new(5, 3, 0));

    server.verify().await;
}

#[tokio::test]
async fn test_compare_with() {
    let server = MockServer::start().await;
    common::mount_cluster_version(&server, "5.2.0.31", 1).await;

    let client = common::token_client(&server);
    let versions = client.versions();

    assert_eq!(
        versions.compare_with(&Version::new(5, 3, 0)).await.unwrap(),
        Ordering::Less
    );
    assert_eq!(
        versions.compare_with(&Version::new(5, 2, 0)).await.unwrap(),
        Ordering::Equal
    );
    assert_eq!(
        client.compare_version(&Version::new(5, 1, 9)).await.unwrap(),
        Ordering::Greater
    );

    server.verify().await;
}

#[tokio::test]
async fn test_no_successful_version_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v5/versions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    mount_volumes(&server, 0).await;

    let client = common::token_client(&server);
    let error = client.volumes().list(&Params::new()).await.unwrap_err();
    assert_matches!(error, Error::InvalidVersion(_));

    server.verify().await;
}

#[tokio::test]
async fn test_unparseable_version_is_invalid() {
    let server = MockServer::start().await;
    common::mount_cluster_version(&server, "five.three", 1).await;

    let client = common::token_client(&server);
    let error = client.cluster_version().await.unwrap_err();
    assert_matches!(error, Error::InvalidVersion(_));
}

#[tokio::test]
async fn test_failed_lookup_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v5/versions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    common::mount_cluster_version(&server, "5.3.0", 1).await;

    let client = common::token_client(&server);
    let error = client.cluster_version().await.unwrap_err();
    assert_eq!(error.status(), Some(http::StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(client.cluster_version().await.unwrap(), Version::new(5, 3, 0));

    server.verify().await;
}
