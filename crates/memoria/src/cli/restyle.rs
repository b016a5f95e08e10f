//! Restyle command handlers.

use super::media::to_json;
use memoria::{FileSystemStorage, MediaStorage, MemoriaConfig, MemoriaResult, RestylePipeline};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

async fn open_pipeline(config: &MemoriaConfig) -> MemoriaResult<RestylePipeline> {
    let storage: Arc<dyn MediaStorage> =
        Arc::new(FileSystemStorage::from_config(config.storage()).await?);
    RestylePipeline::from_config(storage, config).await
}

/// Restyle one Original and print the result.
pub async fn restyle_one(key: &str, force: bool, config: &MemoriaConfig) -> MemoriaResult<()> {
    let pipeline = open_pipeline(config).await?;
    let result = pipeline.restyle(key, force).await?;
    println!("{}", to_json(&result));
    Ok(())
}

/// Restyle every Original, stopping after the current item on Ctrl-C.
pub async fn restyle_all(config: &MemoriaConfig) -> MemoriaResult<()> {
    let pipeline = open_pipeline(config).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, finishing current item");
            on_interrupt.cancel();
        }
    });

    let report = pipeline.restyle_all(&cancel).await;
    println!("{}", to_json(&report));
    Ok(())
}
