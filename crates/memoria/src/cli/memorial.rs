//! Memorial record command handlers.

use super::commands::MemorialCommands;
use memoria::{MemorialProfile, MemoriaConfig, MemoriaResult, ProfileStore};

/// Handle a memorial subcommand.
pub async fn handle_memorial_command(
    cmd: MemorialCommands,
    config: &MemoriaConfig,
) -> MemoriaResult<()> {
    tokio::fs::create_dir_all(config.storage().data_dir())
        .await
        .map_err(|e| {
            memoria_error::StorageError::new(memoria_error::StorageErrorKind::DirectoryCreation(
                format!("{}: {}", config.storage().data_dir().display(), e),
            ))
        })?;
    let store = ProfileStore::new(config.storage().data_dir(), config.storage().io_timeout());

    match cmd {
        MemorialCommands::Set { name, born, passed } => {
            let profile = MemorialProfile::new(name, born, passed)?;
            store.save(&profile).await?;
            println!("Saved memorial for {}", profile.name());
        }

        MemorialCommands::Show => match store.load().await? {
            Some(profile) => println!(
                "{}\n{} - {}",
                profile.name(),
                profile.birth_date().format("%B %-d, %Y"),
                profile.pass_date().format("%B %-d, %Y")
            ),
            None => println!("No memorial record saved"),
        },
    }

    Ok(())
}
