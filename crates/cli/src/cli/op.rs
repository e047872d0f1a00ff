use std::error::Error;
use std::path::PathBuf;

use img_store::{ErrorKind, ImgError, ImgStore};
use img_store_cli::state::{AppState, StateError};

/// Process exit code for a failed store operation.
pub fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::BadGroup => 10,
        ErrorKind::BadName => 11,
        ErrorKind::BadType => 12,
        ErrorKind::BadFormat => 13,
        ErrorKind::NotFound => 14,
        ErrorKind::Exists => 15,
        ErrorKind::ConvertFail => 16,
        ErrorKind::Connection => 17,
        ErrorKind::Internal => 1,
    }
}

/// Errors that know which exit code the process should end with.
pub trait ExitStatus {
    fn exit_code(&self) -> i32 {
        1
    }
}

impl ExitStatus for std::convert::Infallible {}

#[derive(Clone, Debug)]
pub struct OpContext {
    /// Optional custom config path (defaults to ~/.img-store)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    pub fn state(&self) -> Result<AppState, StateError> {
        AppState::load(self.config_path.clone())
    }

    /// Open the store configured by the state directory.
    pub async fn open_store(&self) -> Result<ImgStore, StoreOpError> {
        let state = self.state()?;
        Ok(ImgStore::open(&state.store_config()).await?)
    }
}

/// Failure of an op that opens the store and runs one or more operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreOpError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error(transparent)]
    Store(#[from] ImgError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExitStatus for StoreOpError {
    fn exit_code(&self) -> i32 {
        match self {
            StoreOpError::Store(err) => exit_code(err.kind()),
            _ => 1,
        }
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + ExitStatus + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        impl $crate::cli::op::ExitStatus for OpError {
            fn exit_code(&self) -> i32 {
                match self {
                    $(
                        OpError::$variant(err) => $crate::cli::op::ExitStatus::exit_code(err),
                    )*
                }
            }
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
