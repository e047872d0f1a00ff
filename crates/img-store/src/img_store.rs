//! ImgStore - the storage layer over the Metadata and Bytes collections.
//!
//! Reads go straight to one collection: `get` to Bytes, `list` and `meta` to
//! Metadata. `put` fans one source file out to one Bytes record per
//! registered type (canonical first) plus one Metadata record written right
//! after the canonical bytes.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::convert::{Converter, MagickConverter};
use crate::database::{Database, MetaRecord};
use crate::error::{ErrorKind, ImgError, Result, StoreError};
use crate::identity::{bytes_key, check_group, check_name, meta_key, ImageType};
use crate::ppm::{ppm_format, Ppm};
use crate::storage::{BytesStore, ObjectBytes};

/// Structural metadata of a stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMeta {
    pub width: u32,
    pub height: u32,
    pub max_n_colors: u32,
    pub header_byte_count: usize,
    /// Serialized as milliseconds since the Unix epoch.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub creation_time: DateTime<Utc>,
}

impl From<MetaRecord> for ImageMeta {
    fn from(record: MetaRecord) -> Self {
        Self {
            width: record.width,
            height: record.height,
            max_n_colors: record.max_n_colors,
            header_byte_count: record.header_byte_count,
            creation_time: record.creation_time,
        }
    }
}

/// Handle owning the connections to both collections.
///
/// Opened once with [`ImgStore::open`] and released with
/// [`ImgStore::close`]; every operation after `close` fails.
#[derive(Debug)]
pub struct ImgStore {
    db: Database,
    bytes: Arc<dyn BytesStore>,
    converter: Arc<dyn Converter>,
    closed: AtomicBool,
}

impl ImgStore {
    /// Open a store with the default conversion gateway.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let converter = Arc::new(MagickConverter::new(config.convert_program.clone()));
        Self::open_with_converter(config, converter).await
    }

    /// Open a store that converts through `converter`.
    pub async fn open_with_converter(
        config: &StoreConfig,
        converter: Arc<dyn Converter>,
    ) -> Result<Self> {
        let db = match &config.database {
            Some(path) => Database::new(path).await,
            None => Database::in_memory().await,
        }
        .map_err(connection_error)?;
        let bytes = ObjectBytes::new(&config.bytes)
            .await
            .map_err(connection_error)?;

        info!(database = ?config.database, "image store opened");
        Ok(Self::from_parts(db, Arc::new(bytes), converter))
    }

    /// Fully ephemeral store (in-memory database and object storage).
    pub async fn ephemeral(converter: Arc<dyn Converter>) -> Result<Self> {
        Self::open_with_converter(&StoreConfig::default(), converter).await
    }

    pub(crate) fn from_parts(
        db: Database,
        bytes: Arc<dyn BytesStore>,
        converter: Arc<dyn Converter>,
    ) -> Self {
        Self {
            db,
            bytes,
            converter,
            closed: AtomicBool::new(false),
        }
    }

    /// Close the metadata database pool and refuse further operations.
    /// Later calls are no-ops. The bytes backend holds no pooled connections
    /// and is released when the store is dropped.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.db.close().await;
        info!("image store closed");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ImgError::internal("image store is closed"));
        }
        Ok(())
    }

    /// Stored bytes of `(group, name)` encoded as `ty`, verbatim.
    pub async fn get(&self, group: &str, name: &str, ty: &str) -> Result<Bytes> {
        check_group(group)?;
        check_name(name)?;
        let ty: ImageType = ty.parse()?;
        self.ensure_open()?;

        let key = bytes_key(group, name, ty);
        debug!(key = %key, "reading image bytes");
        self.bytes.get(&key).await?.ok_or_else(|| {
            ImgError::not_found(format!("no {ty} image named '{name}' in group '{group}'"))
        })
    }

    /// Names of all images stored under `group`.
    pub async fn list(&self, group: &str) -> Result<BTreeSet<String>> {
        check_group(group)?;
        self.ensure_open()?;

        debug!(group = %group, "listing images");
        let names = self.db.list_names(group).await?;
        Ok(names.into_iter().collect())
    }

    /// Structural metadata of `(group, name)`.
    pub async fn meta(&self, group: &str, name: &str) -> Result<ImageMeta> {
        check_group(group)?;
        check_name(name)?;
        self.ensure_open()?;

        let key = meta_key(group, name);
        debug!(key = %key, "reading image metadata");
        self.db
            .get_meta(&key)
            .await?
            .map(ImageMeta::from)
            .ok_or_else(|| ImgError::not_found(format!("no image named '{name}' in group '{group}'")))
    }

    /// Decode the canonical-type bytes of `(group, name)`.
    ///
    /// The returned image is identified by the metadata key.
    pub async fn decode(&self, group: &str, name: &str) -> Result<Ppm> {
        let canonical = ImageType::canonical();
        let bytes = self.get(group, name, canonical.extension()).await?;
        Ppm::decode(meta_key(group, name), &bytes)
    }

    /// Store the image at `source` under `group`.
    ///
    /// The name is the file's base name without extension, and the extension
    /// must be a registered type. Every registered type is stored, converting
    /// from the source where the type differs. Types are written in registry
    /// order and are not rolled back: if a later type fails, records written
    /// for earlier types remain.
    pub async fn put(&self, group: &str, source: impl AsRef<Path>) -> Result<()> {
        let source = source.as_ref();
        check_group(group)?;
        let (name, source_type) = name_and_type(source)?;
        if !tokio::fs::metadata(source)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Err(ImgError::not_found(format!(
                "file {} not found",
                source.display()
            )));
        }
        check_name(name)?;
        self.ensure_open()?;

        let source_bytes = tokio::fs::read(source).await.map_err(|e| {
            ImgError::not_found(format!("cannot read {}: {e}", source.display()))
        })?;
        let source_bytes = Bytes::from(source_bytes);

        let mut stored = Vec::with_capacity(ImageType::REGISTRY.len());
        for ty in ImageType::REGISTRY {
            let result = self
                .put_type(group, name, ty, source, source_type, &source_bytes)
                .await;
            if let Err(err) = result {
                if !stored.is_empty() {
                    warn!(
                        group = %group,
                        name = %name,
                        failed = %ty,
                        stored = ?stored,
                        error = %err,
                        "put stopped partway; records for earlier types remain"
                    );
                }
                return Err(err);
            }
            stored.push(ty);
        }

        info!(group = %group, name = %name, types = ?stored, "image stored successfully");
        Ok(())
    }

    async fn put_type(
        &self,
        group: &str,
        name: &str,
        ty: ImageType,
        source: &Path,
        source_type: ImageType,
        source_bytes: &Bytes,
    ) -> Result<()> {
        let payload = if ty == source_type {
            source_bytes.clone()
        } else {
            self.converter.convert(source, ty).await.map_err(|e| {
                ImgError::new(
                    ErrorKind::ConvertFail,
                    format!("cannot convert {} to {ty}: {e}", source.display()),
                )
            })?
        };

        let format = if ty.is_canonical() {
            let format = ppm_format(&payload).ok_or_else(|| {
                ImgError::bad_format(format!(
                    "bad {ty} image format for {}",
                    source.display()
                ))
            })?;
            Some(format)
        } else {
            None
        };

        let key = bytes_key(group, name, ty);
        debug!(key = %key, size = payload.len(), "storing image bytes");
        self.bytes
            .insert(&key, payload)
            .await
            .map_err(|e| exists_error(e, group, name))?;

        if let Some(format) = format {
            let record = MetaRecord {
                id: meta_key(group, name),
                group: group.to_string(),
                name: name.to_string(),
                width: format.width,
                height: format.height,
                max_n_colors: format.max_n_colors,
                header_byte_count: format.header_len,
                creation_time: Utc::now(),
            };
            self.db
                .insert_meta(&record)
                .await
                .map_err(|e| exists_error(e, group, name))?;
        }
        Ok(())
    }
}

/// Split a source path into the image name and its type.
fn name_and_type(source: &Path) -> Result<(&str, ImageType)> {
    let file_name = source.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let (name, ext) = file_name.rsplit_once('.').unwrap_or((file_name, ""));
    let ty = ext.parse::<ImageType>().map_err(|_| {
        ImgError::new(
            ErrorKind::BadType,
            format!("bad image type '{ext}' in path {}", source.display()),
        )
    })?;
    Ok((name, ty))
}

fn exists_error(err: StoreError, group: &str, name: &str) -> ImgError {
    match err {
        StoreError::AlreadyExists(_) => ImgError::new(
            ErrorKind::Exists,
            format!("group '{group}' already has an image named '{name}'"),
        ),
        other => other.into(),
    }
}

fn connection_error(err: StoreError) -> ImgError {
    ImgError::new(ErrorKind::Connection, err.to_string())
}
