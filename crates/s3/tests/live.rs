//! Live tests against a real S3-compatible bucket
//!
//! Run with:
//! ```bash
//! export TEST_S3_BUCKET=my-test-bucket TEST_S3_REGION=us-east-1
//! export TEST_S3_ACCESS_KEY=... TEST_S3_SECRET_KEY=...
//! # optional, for MinIO and other S3-compatible stores
//! export TEST_S3_ENDPOINT=http://localhost:9000
//! cargo test -p bg-s3 --features integration
//! ```

#![cfg(feature = "integration")]

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bg_core::{BulkDeleter, NamespaceManager, ObjectStore, StoreConfiguration, Visibility};
use bg_s3::{ConnectOptions, S3Client};

fn test_config() -> Option<(StoreConfiguration, ConnectOptions)> {
    let config = StoreConfiguration::new(
        std::env::var("TEST_S3_BUCKET").ok()?,
        std::env::var("TEST_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        std::env::var("TEST_S3_ACCESS_KEY").ok()?,
        std::env::var("TEST_S3_SECRET_KEY").ok()?,
    );
    let endpoint = std::env::var("TEST_S3_ENDPOINT").ok();
    let options = ConnectOptions {
        force_path_style: endpoint.is_some(),
        endpoint,
    };
    Some((config, options))
}

fn unique_prefix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("bg-live-{nanos}")
}

#[tokio::test]
async fn test_folder_roundtrip() {
    let Some((config, options)) = test_config() else {
        eprintln!("Skipping: TEST_S3_* not set");
        return;
    };
    let client = S3Client::new(&config, &options).await.unwrap();
    let folder = unique_prefix();

    let ns = NamespaceManager::new(&client);
    ns.ensure_folder(&folder).await.unwrap();
    ns.ensure_folder(&folder).await.unwrap();

    for i in 0..3 {
        client
            .put_object(
                &format!("{folder}/{i}.txt"),
                b"live".to_vec(),
                Some("text/plain".into()),
                Visibility::Private,
            )
            .await
            .unwrap();
    }

    let listed = ns.list_folder(&folder).await.unwrap();
    assert_eq!(listed.len(), 4);

    let head = client
        .head_object(&format!("{folder}/0.txt"))
        .await
        .unwrap();
    assert_eq!(head.content_type.as_deref(), Some("text/plain"));

    let url = client
        .presign_get(&format!("{folder}/0.txt"), Duration::from_secs(60))
        .await
        .unwrap();
    assert!(url.contains("X-Amz-Expires=60"));

    let deleted = BulkDeleter::new(&client).delete_folder(&folder).await.unwrap();
    assert_eq!(deleted, 4);
    assert!(ns.list_folder(&folder).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_key_is_not_found() {
    let Some((config, options)) = test_config() else {
        eprintln!("Skipping: TEST_S3_* not set");
        return;
    };
    let client = S3Client::new(&config, &options).await.unwrap();

    let err = client
        .head_object(&format!("{}/missing", unique_prefix()))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
