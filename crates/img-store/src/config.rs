use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::convert::DEFAULT_CONVERT_PROGRAM;
use crate::storage::BytesStoreConfig;

/// Everything needed to open an [`ImgStore`](crate::ImgStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite file for the metadata collection. In memory when unset.
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Backend for the bytes collection.
    #[serde(default)]
    pub bytes: BytesStoreConfig,

    /// Program used by the default conversion gateway.
    #[serde(default = "default_convert_program")]
    pub convert_program: String,
}

fn default_convert_program() -> String {
    DEFAULT_CONVERT_PROGRAM.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: None,
            bytes: BytesStoreConfig::default(),
            convert_program: default_convert_program(),
        }
    }
}

impl StoreConfig {
    /// Database file and object directory both under `data_dir`.
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            database: Some(data_dir.join("images.db")),
            bytes: BytesStoreConfig::Local {
                path: data_dir.join("objects"),
            },
            convert_program: default_convert_program(),
        }
    }
}
