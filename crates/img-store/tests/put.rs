//! Integration tests for storing images

mod common;

use std::sync::Arc;

use common::{setup_test_env, write_source, FakeConverter, FAKE_PNG, TINY_PPM};
use img_store::{ErrorKind, ImgStore};

#[tokio::test]
async fn test_put_then_read_back() {
    let (store, _, temp) = setup_test_env().await;
    let source = write_source(temp.path(), "n.ppm", TINY_PPM);

    store.put("g", &source).await.unwrap();

    let bytes = store.get("g", "n", "ppm").await.unwrap();
    assert_eq!(bytes.len(), 17);
    assert_eq!(&bytes[..], TINY_PPM);

    let meta = store.meta("g", "n").await.unwrap();
    assert_eq!(meta.width, 2);
    assert_eq!(meta.height, 1);
    assert_eq!(meta.max_n_colors, 255);
    assert_eq!(meta.header_byte_count, 11);

    let names = store.list("g").await.unwrap();
    assert_eq!(names.len(), 1);
    assert!(names.contains("n"));
}

#[tokio::test]
async fn test_put_stores_every_registered_type() {
    let (store, converter, temp) = setup_test_env().await;
    let source = write_source(temp.path(), "rose.ppm", &common::ppm_bytes(4, 3));

    store.put("flowers", &source).await.unwrap();

    assert_eq!(converter.calls(), 1);
    let png = store.get("flowers", "rose", "png").await.unwrap();
    assert_eq!(&png[..], FAKE_PNG);
    let meta = store.meta("flowers", "rose").await.unwrap();
    assert_eq!((meta.width, meta.height), (4, 3));
    assert_eq!(meta.header_byte_count, "P6\n4 3\n255\n".len());
}

#[tokio::test]
async fn test_put_twice_is_exists() {
    let (store, _, temp) = setup_test_env().await;
    let source = write_source(temp.path(), "n.ppm", TINY_PPM);

    store.put("g", &source).await.unwrap();
    let err = store.put("g", &source).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Exists);

    // Same name in another group is a different identity
    store.put("h", &source).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_puts_of_same_identity() {
    let (store, _, temp) = setup_test_env().await;
    let store = Arc::new(store);
    let source = write_source(temp.path(), "n.ppm", TINY_PPM);

    let a = tokio::spawn({
        let store = store.clone();
        let source = source.clone();
        async move { store.put("g", &source).await }
    });
    let b = tokio::spawn({
        let store = store.clone();
        let source = source.clone();
        async move { store.put("g", &source).await }
    });
    let results = [a.await.unwrap(), b.await.unwrap()];

    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 1);
    let err = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(err.kind(), ErrorKind::Exists);
}

#[tokio::test]
async fn test_put_bad_extension_is_bad_type() {
    let (store, converter, temp) = setup_test_env().await;
    let source = write_source(temp.path(), "n.jpg", TINY_PPM);

    let err = store.put("g", &source).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadType);

    let no_ext = write_source(temp.path(), "n", TINY_PPM);
    let err = store.put("g", &no_ext).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadType);
    assert_eq!(converter.calls(), 0);
}

#[tokio::test]
async fn test_put_missing_file_is_not_found() {
    let (store, _, temp) = setup_test_env().await;

    let err = store
        .put("g", temp.path().join("missing.ppm"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // A directory is not a readable image file
    std::fs::create_dir(temp.path().join("dir.ppm")).unwrap();
    let err = store.put("g", temp.path().join("dir.ppm")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_put_invalid_ppm_writes_nothing() {
    let (store, converter, temp) = setup_test_env().await;
    let source = write_source(temp.path(), "n.ppm", b"P3 2 1 255 \x01\x02\x03\x04\x05\x06");

    let err = store.put("g", &source).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);
    assert_eq!(converter.calls(), 0);

    assert!(store.list("g").await.unwrap().is_empty());
    let err = store.get("g", "n", "ppm").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_put_truncated_ppm_is_bad_format() {
    let (store, _, temp) = setup_test_env().await;
    let source = write_source(temp.path(), "n.ppm", &TINY_PPM[..16]);

    let err = store.put("g", &source).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);
}

#[tokio::test]
async fn test_put_png_source_with_failing_converter() {
    let temp = tempfile::tempdir().unwrap();
    let converter = Arc::new(FakeConverter::failing());
    let store = ImgStore::ephemeral(converter.clone()).await.unwrap();
    let source = write_source(temp.path(), "n.png", FAKE_PNG);

    let err = store.put("g", &source).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConvertFail);
    assert_eq!(converter.calls(), 1);

    // Canonical type failed first, so nothing was written
    assert!(store.list("g").await.unwrap().is_empty());
    let err = store.get("g", "n", "png").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_put_derived_name_must_be_valid() {
    let (store, _, temp) = setup_test_env().await;
    let source = write_source(temp.path(), " .ppm", TINY_PPM);

    let err = store.put("g", &source).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadName);
}

#[tokio::test]
async fn test_nul_group_is_bad_group_everywhere() {
    let (store, _, temp) = setup_test_env().await;
    let source = write_source(temp.path(), "n.ppm", TINY_PPM);
    let group = "g\0";

    assert_eq!(
        store.put(group, &source).await.unwrap_err().kind(),
        ErrorKind::BadGroup
    );
    assert_eq!(
        store.get(group, "n", "ppm").await.unwrap_err().kind(),
        ErrorKind::BadGroup
    );
    assert_eq!(
        store.list(group).await.unwrap_err().kind(),
        ErrorKind::BadGroup
    );
    assert_eq!(
        store.meta(group, "n").await.unwrap_err().kind(),
        ErrorKind::BadGroup
    );
}
