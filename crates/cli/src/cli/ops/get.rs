use std::path::PathBuf;

use clap::Args;
use tokio::io::AsyncWriteExt;

use crate::cli::op::StoreOpError;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Image group
    pub group: String,

    /// Image name
    pub name: String,

    /// Image type (ppm, png)
    #[arg(value_name = "TYPE")]
    pub ty: String,

    /// Write the bytes to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = StoreOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.open_store().await?;
        let result = store.get(&self.group, &self.name, &self.ty).await;
        store.close().await;
        let bytes = result?;

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, &bytes).await?;
                Ok(format!("wrote {} bytes to {}", bytes.len(), path.display()))
            }
            None => {
                // Raw bytes; nothing else goes to stdout
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&bytes).await?;
                stdout.flush().await?;
                Ok(String::new())
            }
        }
    }
}
