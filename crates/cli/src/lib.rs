// Service modules (HTTP transport)
pub mod http_server;
pub mod process;

// App state (configuration, paths)
pub mod state;

pub use state::{AppConfig, AppState, StateError};
