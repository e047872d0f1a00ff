//! Conversion gateway: produce an image file's bytes in another encoding.

use std::path::Path;
use std::process::Stdio;

use bytes::Bytes;

use crate::identity::ImageType;

/// Default external conversion program (ImageMagick).
pub const DEFAULT_CONVERT_PROGRAM: &str = "convert";

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("cannot read converted output: {0}")]
    Output(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Turns a source image file into bytes of `target` type.
///
/// The store treats every failure the same way, as `CONVERT_FAIL`.
#[async_trait::async_trait]
pub trait Converter: Send + Sync + std::fmt::Debug {
    async fn convert(&self, source: &Path, target: ImageType) -> Result<Bytes, ConvertError>;
}

/// Converter that shells out to ImageMagick's `convert` (no shell involved).
///
/// Output is written to a scratch directory that is removed afterwards; the
/// output format is chosen from the target file's extension.
#[derive(Debug, Clone)]
pub struct MagickConverter {
    program: String,
}

impl MagickConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for MagickConverter {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERT_PROGRAM)
    }
}

#[async_trait::async_trait]
impl Converter for MagickConverter {
    async fn convert(&self, source: &Path, target: ImageType) -> Result<Bytes, ConvertError> {
        let scratch = tempfile::tempdir()?;
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let dest = scratch.path().join(format!("{stem}.{}", target.extension()));

        tracing::debug!(
            program = %self.program,
            source = %source.display(),
            dest = %dest.display(),
            "converting image"
        );

        let output = tokio::process::Command::new(&self.program)
            .arg(source)
            .arg(&dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ConvertError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let bytes = tokio::fs::read(&dest).await?;
        Ok(Bytes::from(bytes))
    }
}
