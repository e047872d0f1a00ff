use std::path::PathBuf;

use clap::Args;

use crate::cli::op::StoreOpError;

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Image group
    pub group: String,

    /// Source image files (.ppm or .png); each is stored under its base name
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Put {
    type Error = StoreOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.open_store().await?;

        let mut stored = Vec::with_capacity(self.paths.len());
        let mut result = Ok(());
        for path in &self.paths {
            // Stop at the first failure; earlier paths stay stored
            if let Err(e) = store.put(&self.group, path).await {
                result = Err(e);
                break;
            }
            stored.push(format!("stored {}", path.display()));
        }
        store.close().await;

        result?;
        Ok(stored.join("\n"))
    }
}
