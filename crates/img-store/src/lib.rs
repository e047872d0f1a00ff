//! Image store: SQLite metadata + object storage for image bytes
//!
//! Images are addressed by a caller-assigned `(group, name)` pair and stored
//! once per supported [`ImageType`]. Structural metadata (dimensions, header
//! size, creation time) is derived from the canonical PPM encoding and kept
//! in a separate collection, so listing and metadata queries never load
//! image bytes.
//!
//! # Features
//!
//! - Strict binary PPM (`P6`) decoding
//! - SQLite for metadata queries
//! - Multiple bytes backends: S3, MinIO, local filesystem, in-memory
//! - Pluggable conversion gateway (ImageMagick by default)
//!
//! # Example
//!
//! ```rust,no_run
//! use img_store::{ImgStore, StoreConfig};
//!
//! # async fn example() -> Result<(), img_store::ImgError> {
//! let store = ImgStore::open(&StoreConfig::local("/tmp/images")).await?;
//!
//! store.put("inputs", "/tmp/rose.ppm").await?;
//! let png = store.get("inputs", "rose", "png").await?;
//! let meta = store.meta("inputs", "rose").await?;
//! println!("{} bytes, {}x{}", png.len(), meta.width, meta.height);
//!
//! store.close().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod convert;
mod database;
mod error;
mod identity;
mod img_store;
mod ppm;
mod storage;

pub use config::StoreConfig;
pub use convert::{ConvertError, Converter, MagickConverter, DEFAULT_CONVERT_PROGRAM};
pub use error::{ErrorKind, ImgError, Result};
pub use identity::{
    bytes_key, check_group, check_name, meta_key, split_meta_key, valid_group, valid_name,
    valid_type, ImageType,
};
pub use img_store::{ImageMeta, ImgStore};
pub use ppm::{ppm_format, Ppm, PpmFormat};
pub use storage::BytesStoreConfig;
