//! Image identity: group/name/type validation and storage keys.
//!
//! An image is identified by a caller-assigned `(group, name)` pair. Each
//! stored encoding of it is further qualified by an [`ImageType`]. Keys are
//! built as `group/name` (metadata) and `group/name.type` (bytes). Names can
//! never contain `/`, so the last `/` of a metadata key always separates the
//! group from the name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ImgError, Result};

const NAME_DELIM: char = '/';
const TYPE_DELIM: char = '.';

/// Supported image encodings.
///
/// [`ImageType::REGISTRY`] is ordered; its first entry is the canonical type,
/// the only one structural metadata can be derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Ppm,
    Png,
}

impl ImageType {
    /// Every supported type, canonical type first.
    pub const REGISTRY: [ImageType; 2] = [ImageType::Ppm, ImageType::Png];

    pub fn canonical() -> Self {
        Self::REGISTRY[0]
    }

    pub fn is_canonical(&self) -> bool {
        *self == Self::canonical()
    }

    /// File extension, also used as the type segment of bytes keys.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageType::Ppm => "ppm",
            ImageType::Png => "png",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageType::Ppm => "image/x-portable-pixmap",
            ImageType::Png => "image/png",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageType {
    type Err = ImgError;

    fn from_str(s: &str) -> Result<Self> {
        Self::REGISTRY
            .into_iter()
            .find(|ty| ty.extension() == s)
            .ok_or_else(|| ImgError::new(ErrorKind::BadType, format!("bad image type '{s}'")))
    }
}

pub fn valid_group(group: &str) -> bool {
    !group.trim().is_empty() && !group.contains('\0')
}

pub fn valid_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains('\0') && !name.contains(NAME_DELIM)
}

pub fn valid_type(ty: &str) -> bool {
    ty.parse::<ImageType>().is_ok()
}

pub fn check_group(group: &str) -> Result<()> {
    if valid_group(group) {
        Ok(())
    } else {
        Err(ImgError::new(
            ErrorKind::BadGroup,
            format!("bad image group '{}'", group.escape_debug()),
        ))
    }
}

pub fn check_name(name: &str) -> Result<()> {
    if valid_name(name) {
        Ok(())
    } else {
        Err(ImgError::new(
            ErrorKind::BadName,
            format!("bad image name '{}'", name.escape_debug()),
        ))
    }
}

/// Key of the metadata record for `(group, name)`.
pub fn meta_key(group: &str, name: &str) -> String {
    format!("{group}{NAME_DELIM}{name}")
}

/// Key of the bytes record for `(group, name, ty)`.
pub fn bytes_key(group: &str, name: &str, ty: ImageType) -> String {
    format!("{group}{NAME_DELIM}{name}{TYPE_DELIM}{ty}")
}

/// Recover `(group, name)` from a metadata key.
pub fn split_meta_key(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once(NAME_DELIM)
}
