pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "img-store")]
#[command(about = "Store images by group and name, and serve them over HTTP")]
pub struct Args {
    /// Path to the img-store config directory (defaults to ~/.img-store)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Default log level for stderr logging (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: crate::Command,
}
