use std::{fs, path::PathBuf};

use img_store::{BytesStoreConfig, StoreConfig, DEFAULT_CONVERT_PROGRAM};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "img-store";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const OBJECTS_DIR_NAME: &str = "objects";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Port for the HTTP server
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Bytes collection backend (defaults to the objects/ directory)
    #[serde(default)]
    pub bytes: Option<BytesStoreConfig>,
    /// Program used to convert between image types
    #[serde(default = "default_convert_program")]
    pub convert_program: String,
}

fn default_api_port() -> u16 {
    3000
}

fn default_convert_program() -> String {
    DEFAULT_CONVERT_PROGRAM.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            bytes: None,
            convert_program: default_convert_program(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.img-store)
    pub app_dir: PathBuf,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Path to the local objects directory
    pub objects_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.img-store)
    pub fn app_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        if app_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&app_dir)?;

        let objects_path = app_dir.join(OBJECTS_DIR_NAME);
        fs::create_dir_all(&objects_path)?;

        let config = config.unwrap_or_default();
        let config_path = app_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        // Empty database file; the schema is created when the store opens
        let db_path = app_dir.join(DB_FILE_NAME);
        fs::write(&db_path, "")?;

        Ok(Self {
            app_dir,
            db_path,
            objects_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        if !app_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let db_path = app_dir.join(DB_FILE_NAME);
        let objects_path = app_dir.join(OBJECTS_DIR_NAME);
        let config_path = app_dir.join(CONFIG_FILE_NAME);

        if !db_path.exists() {
            return Err(StateError::MissingFile(DB_FILE_NAME.to_string()));
        }
        if !objects_path.exists() {
            return Err(StateError::MissingFile(format!("{OBJECTS_DIR_NAME}/")));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            app_dir,
            db_path,
            objects_path,
            config_path,
            config,
        })
    }

    /// Store configuration for this state directory
    pub fn store_config(&self) -> StoreConfig {
        let bytes = self
            .config
            .bytes
            .clone()
            .unwrap_or_else(|| BytesStoreConfig::Local {
                path: self.objects_path.clone(),
            });
        StoreConfig {
            database: Some(self.db_path.clone()),
            bytes,
            convert_program: self.config.convert_program.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("img-store directory not initialized. Run 'img-store init' first")]
    NotInitialized,

    #[error("img-store directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
