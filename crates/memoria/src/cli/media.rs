//! Gallery command handlers.

use super::commands::{MediaCommands, OutputFormat};
use memoria::{FileSystemStorage, MediaStorage, MemoriaConfig, MemoriaResult, RestylePipeline};
use memoria_error::StorageError;
use memoria_error::StorageErrorKind;
use std::io::Write;
use std::sync::Arc;

/// Handle a gallery subcommand.
pub async fn handle_media_command(cmd: MediaCommands, config: &MemoriaConfig) -> MemoriaResult<()> {
    let storage: Arc<dyn MediaStorage> =
        Arc::new(FileSystemStorage::from_config(config.storage()).await?);

    match cmd {
        MediaCommands::Put { file, name } => {
            let data = tokio::fs::read(&file).await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", file.display(), e)))
            })?;
            let name = name.unwrap_or_else(|| {
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let outcome = storage.put(&data, &name).await?;
            if outcome.duplicate {
                println!("Already stored as {}", outcome.key);
            } else {
                println!("Stored {}", outcome.key);
            }
        }

        MediaCommands::List { view, format } => {
            let keys = storage.list_view(view);
            match format {
                OutputFormat::Json => println!("{}", to_json(&keys)),
                OutputFormat::Human => {
                    if keys.is_empty() {
                        println!("No {} media", view);
                    }
                    for key in keys {
                        match storage.item(&key) {
                            Some(item) => println!(
                                "{}  {:>9} bytes  {}",
                                key,
                                item.size_bytes,
                                item.created_at.format("%Y-%m-%d %H:%M")
                            ),
                            None => println!("{}", key),
                        }
                    }
                }
            }
        }

        MediaCommands::Get { key, output } => {
            let data = storage.get(&key).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &data).await.map_err(|e| {
                        StorageError::new(StorageErrorKind::FileWrite(format!(
                            "{}: {}",
                            path.display(),
                            e
                        )))
                    })?;
                    println!("Wrote {} bytes to {}", data.len(), path.display());
                }
                None => {
                    std::io::stdout().write_all(&data).map_err(|e| {
                        StorageError::new(StorageErrorKind::FileWrite(format!("stdout: {}", e)))
                    })?;
                }
            }
        }

        MediaCommands::Delete { key } => {
            let pipeline = RestylePipeline::from_config(storage.clone(), config).await?;
            let removed = storage.delete(&key).await?;
            for item in removed.iter().filter(|item| item.is_original()) {
                pipeline.forget(&item.content_hash).await?;
            }
            if removed.is_empty() {
                println!("Nothing stored under {}", key);
            }
            for item in removed {
                println!("Deleted {}", item.storage_key);
            }
        }
    }

    Ok(())
}

pub(super) fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}
