use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use img_store::{ErrorKind, ImgError, ImgStore};

use img_store_cli::http_server::{self, HttpServerError, ServerState};
use img_store_cli::process::utils::graceful_shutdown_blocker;
use img_store_cli::state::StateError;

use crate::cli::op::{exit_code, ExitStatus};

/// Group for preloaded paths without a parent directory name.
const DEFAULT_PRELOAD_GROUP: &str = "inputs";

#[derive(Args, Debug, Clone)]
pub struct Serve {
    /// Override HTTP server port (default from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Images to store before serving, grouped by their parent directory name
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error(transparent)]
    Store(#[from] ImgError),

    #[error("server bootstrap failed: {0:#}")]
    Bootstrap(#[from] anyhow::Error),

    #[error(transparent)]
    Server(#[from] HttpServerError),
}

impl ExitStatus for ServeError {
    fn exit_code(&self) -> i32 {
        match self {
            ServeError::Store(err) => exit_code(err.kind()),
            _ => 1,
        }
    }
}

/// Group a preloaded image is stored under.
fn preload_group(path: &Path) -> &str {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .filter(|n| img_store::valid_group(n))
        .unwrap_or(DEFAULT_PRELOAD_GROUP)
}

async fn preload(store: &ImgStore, paths: &[PathBuf]) -> Result<(), ImgError> {
    for path in paths {
        let group = preload_group(path);
        match store.put(group, path).await {
            Ok(()) => tracing::info!(group, path = %path.display(), "preloaded image"),
            // Already stored by an earlier run
            Err(e) if e.kind() == ErrorKind::Exists => {
                tracing::warn!(group, path = %path.display(), "image already stored, skipping")
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let port = self.port.unwrap_or(state.config.api_port);
        let listen_addr: SocketAddr = format!("0.0.0.0:{}", port)
            .parse()
            .context("invalid listen address")?;

        let store = Arc::new(ImgStore::open(&state.store_config()).await?);
        if let Err(e) = preload(&store, &self.paths).await {
            store.close().await;
            return Err(e.into());
        }

        let (graceful_waiter, _shutdown_tx, shutdown_rx) =
            graceful_shutdown_blocker().context("failed to install signal handlers")?;

        let config = http_server::Config::new(listen_addr);
        let result = http_server::run(config, ServerState::new(store.clone()), shutdown_rx).await;

        graceful_waiter.abort();
        store.close().await;
        result?;

        Ok("server stopped".to_string())
    }
}
