use chrono::SecondsFormat;
use clap::Args;

use crate::cli::op::StoreOpError;

#[derive(Args, Debug, Clone)]
pub struct Meta {
    /// Image group
    pub group: String,

    /// Image name
    pub name: String,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Meta {
    type Error = StoreOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.open_store().await?;
        let result = store.meta(&self.group, &self.name).await;
        store.close().await;

        let meta = result?;
        Ok(format!(
            "width={}\nheight={}\nmaxNColors={}\nheaderByteCount={}\ncreationTime={}",
            meta.width,
            meta.height,
            meta.max_n_colors,
            meta.header_byte_count,
            meta.creation_time.to_rfc3339_opts(SecondsFormat::Millis, true),
        ))
    }
}
