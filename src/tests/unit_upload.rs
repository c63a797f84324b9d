use crate::features::pages::upload::{
    UploadParams, munge_filename, qualified_image_url, stored_filename,
};
use crate::io::local::LocalImageStore;
use crate::io::{ImageStore, verify_file_in_root};
use chrono::NaiveDateTime;
use serde_json::json;
use std::path::Path;

#[test]
fn test_munge_filename() {
    assert_eq!(munge_filename("my photo.png"), "my-photo.png");
    assert_eq!(munge_filename("  a  b.png "), "a-b.png");
    assert_eq!(munge_filename("we!rd/na:me?.jpg"), "werdname.jpg");
}

#[test]
fn test_munge_filename_truncates_keeping_extension() {
    let long = format!("{}.png", "a".repeat(150));
    let munged = munge_filename(&long);
    assert_eq!(munged.len(), 100);
    assert!(munged.ends_with(".png"));
}

#[test]
fn test_stored_filename_has_timestamp_prefix() {
    let now = NaiveDateTime::parse_from_str("2024-05-01 09:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
    assert_eq!(
        stored_filename("logo.png", now),
        "2024-05-01-093000.000000logo.png"
    );
}

#[test]
fn test_qualified_image_url() {
    assert_eq!(
        qualified_image_url("http://portal.test/", "x.png"),
        "http://portal.test/uploads/page_images/x.png"
    );
    assert_eq!(
        qualified_image_url("http://portal.test", "https://cdn.test/x.png"),
        "https://cdn.test/x.png"
    );
}

#[test]
fn test_upload_params_decode_base64() {
    let params: UploadParams = serde_json::from_value(json!({
        "upload": { "filename": "a.txt", "data": "aGVsbG8=" },
        "clear_upload": "true"
    }))
    .unwrap();

    assert!(params.clear_upload);
    assert_eq!(params.upload.unwrap().data, b"hello".to_vec());
}

#[test]
fn test_verify_file_in_root() {
    let root = Path::new("/srv/images");
    assert_eq!(
        verify_file_in_root(root, "a.png").unwrap(),
        root.join("a.png")
    );
    assert!(verify_file_in_root(root, "../a.png").is_err());
    assert!(verify_file_in_root(root, "sub/a.png").is_err());
    assert!(verify_file_in_root(root, "/etc/passwd").is_err());
    assert!(verify_file_in_root(root, "").is_err());
}

#[tokio::test]
async fn test_local_image_store_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalImageStore::new(dir.path());

    store.store("pic.png", b"png-bytes").await.unwrap();

    let written = std::fs::read(dir.path().join("page_images").join("pic.png")).unwrap();
    assert_eq!(written, b"png-bytes");
}

#[tokio::test]
async fn test_local_image_store_rejects_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalImageStore::new(dir.path());

    assert!(store.store("../escape.png", b"x").await.is_err());
}
