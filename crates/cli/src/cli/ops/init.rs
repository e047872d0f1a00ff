use clap::Args;

use img_store_cli::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// HTTP server port for `serve`
    #[arg(long, default_value_t = 3000)]
    pub api_port: u16,

    /// Program used to convert between image types
    #[arg(long, default_value = img_store::DEFAULT_CONVERT_PROGRAM)]
    pub convert_program: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

impl crate::cli::op::ExitStatus for InitError {}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            api_port: self.api_port,
            bytes: None,
            convert_program: self.convert_program.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let output = format!(
            "Initialized img-store directory at: {}\n\
             - Database: {}\n\
             - Objects: {}\n\
             - Config: {}\n\
             - API port: {}\n\
             - Convert program: {}",
            state.app_dir.display(),
            state.db_path.display(),
            state.objects_path.display(),
            state.config_path.display(),
            state.config.api_port,
            state.config.convert_program,
        );

        Ok(output)
    }
}
