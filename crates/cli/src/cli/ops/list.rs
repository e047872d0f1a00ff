use clap::Args;

use crate::cli::op::StoreOpError;

#[derive(Args, Debug, Clone)]
pub struct List {
    /// Image group
    pub group: String,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for List {
    type Error = StoreOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.open_store().await?;
        let result = store.list(&self.group).await;
        store.close().await;

        let names: Vec<String> = result?.into_iter().collect();
        Ok(names.join("\n"))
    }
}
