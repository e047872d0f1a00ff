//! Shared test utilities for image store integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use img_store::{ConvertError, Converter, ImageType, ImgStore, StoreConfig};
use tempfile::TempDir;

/// Header "P6 2 1 255 " followed by six pixel bytes, 17 bytes in all.
pub const TINY_PPM: &[u8] = b"P6 2 1 255 \x10\x20\x30\x40\x50\x60";

/// What the fake converter returns for a PNG target.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

/// Build a valid PPM of the given size with a recognisable pixel pattern.
pub fn ppm_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = format!("P6\n{width} {height}\n255\n").into_bytes();
    let n = 3 * width as usize * height as usize;
    bytes.extend((0..n).map(|i| (i % 251) as u8));
    bytes
}

/// Converter double: no external program, fixed output per target type.
#[derive(Debug, Default)]
pub struct FakeConverter {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeConverter {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Converter for FakeConverter {
    async fn convert(&self, source: &Path, target: ImageType) -> Result<Bytes, ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ConvertError::Other(format!(
                "refusing to convert {}",
                source.display()
            )));
        }
        Ok(match target {
            ImageType::Ppm => Bytes::from_static(TINY_PPM),
            ImageType::Png => Bytes::from_static(FAKE_PNG),
        })
    }
}

/// Set up an in-memory store plus a scratch directory for source files
pub async fn setup_test_env() -> (ImgStore, Arc<FakeConverter>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let converter = Arc::new(FakeConverter::default());
    let store = ImgStore::ephemeral(converter.clone()).await.unwrap();
    (store, converter, temp_dir)
}

/// Set up a store persisted under a scratch directory
pub async fn setup_local_env() -> (ImgStore, StoreConfig, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig::local(temp_dir.path().join("data"));
    let store = ImgStore::open_with_converter(&config, Arc::new(FakeConverter::default()))
        .await
        .unwrap();
    (store, config, temp_dir)
}

/// Write a source image file into `dir` and return its path
pub fn write_source(dir: &Path, file_name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, bytes).unwrap();
    path
}
