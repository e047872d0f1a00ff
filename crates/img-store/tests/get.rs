//! Integration tests for get, list and meta

mod common;

use common::{setup_local_env, setup_test_env, write_source, TINY_PPM};
use img_store::{ErrorKind, ImgStore};

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let (store, _, _temp) = setup_test_env().await;

    let err = store.get("g", "n", "ppm").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().starts_with("NOT_FOUND: "));
}

#[tokio::test]
async fn test_get_rejects_unknown_type() {
    let (store, _, _temp) = setup_test_env().await;

    for ty in ["", "PPM", "jpg", ".ppm"] {
        let err = store.get("g", "n", ty).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadType, "type {ty:?}");
    }
}

#[tokio::test]
async fn test_list_is_scoped_to_group() {
    let (store, _, temp) = setup_test_env().await;
    for name in ["b", "a", "c"] {
        let source = write_source(temp.path(), &format!("{name}.ppm"), TINY_PPM);
        store.put("g", &source).await.unwrap();
    }
    let source = write_source(temp.path(), "z.ppm", TINY_PPM);
    store.put("g/nested", &source).await.unwrap();

    let names: Vec<_> = store.list("g").await.unwrap().into_iter().collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    let nested: Vec<_> = store.list("g/nested").await.unwrap().into_iter().collect();
    assert_eq!(nested, vec!["z"]);
    assert!(store.list("empty").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_meta_creation_time_is_recent() {
    let (store, _, temp) = setup_test_env().await;
    let before = chrono::Utc::now();
    let source = write_source(temp.path(), "n.ppm", TINY_PPM);
    store.put("g", &source).await.unwrap();

    let meta = store.meta("g", "n").await.unwrap();
    // stored at millisecond precision
    assert!(meta.creation_time.timestamp_millis() >= before.timestamp_millis());
    assert!(meta.creation_time <= chrono::Utc::now());
}

#[tokio::test]
async fn test_meta_serializes_camel_case() {
    let (store, _, temp) = setup_test_env().await;
    let source = write_source(temp.path(), "n.ppm", TINY_PPM);
    store.put("g", &source).await.unwrap();

    let meta = store.meta("g", "n").await.unwrap();
    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["width"], 2);
    assert_eq!(json["height"], 1);
    assert_eq!(json["maxNColors"], 255);
    assert_eq!(json["headerByteCount"], 11);
    assert_eq!(
        json["creationTime"].as_i64().unwrap(),
        meta.creation_time.timestamp_millis()
    );
}

#[tokio::test]
async fn test_decode_stored_image() {
    let (store, _, temp) = setup_test_env().await;
    let source = write_source(temp.path(), "n.ppm", TINY_PPM);
    store.put("g", &source).await.unwrap();

    let ppm = store.decode("g", "n").await.unwrap();
    assert_eq!(ppm.id(), "g/n");
    assert_eq!((ppm.width(), ppm.height()), (2, 1));
    assert_eq!(ppm.pixels(), &TINY_PPM[11..]);
}

#[tokio::test]
async fn test_local_store_persists_across_reopen() {
    let (store, config, temp) = setup_local_env().await;
    let source = write_source(temp.path(), "n.ppm", TINY_PPM);
    store.put("g", &source).await.unwrap();
    store.close().await;

    let reopened = ImgStore::open_with_converter(
        &config,
        std::sync::Arc::new(common::FakeConverter::default()),
    )
    .await
    .unwrap();
    assert_eq!(&reopened.get("g", "n", "ppm").await.unwrap()[..], TINY_PPM);
    assert!(reopened.list("g").await.unwrap().contains("n"));

    let err = reopened.put("g", &source).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Exists);
}

#[tokio::test]
async fn test_local_store_long_group() {
    let (store, _, temp) = setup_local_env().await;
    let source = write_source(temp.path(), "n.ppm", TINY_PPM);

    for group in ["g".repeat(300), "a/b/".repeat(80)] {
        store.put(&group, &source).await.unwrap();
        assert_eq!(&store.get(&group, "n", "ppm").await.unwrap()[..], TINY_PPM);
        assert!(store.list(&group).await.unwrap().contains("n"));
    }
}
