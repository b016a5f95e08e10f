//! Guestbook command handlers.

use super::commands::{GuestbookCommands, OutputFormat};
use super::media::to_json;
use memoria::{GuestbookLog, MemoriaConfig, MemoriaResult};

/// Handle a guestbook subcommand.
pub async fn handle_guestbook_command(
    cmd: GuestbookCommands,
    config: &MemoriaConfig,
) -> MemoriaResult<()> {
    let log = GuestbookLog::from_config(config).await?;

    match cmd {
        GuestbookCommands::Sign { author, message } => {
            let entry = log.submit(&author, &message).await?;
            println!("Signed by {} at {}", entry.author_name(), entry.timestamp());
        }

        GuestbookCommands::List { format } => {
            let entries = log.list_display_order().await?;
            match format {
                OutputFormat::Json => println!("{}", to_json(&entries)),
                OutputFormat::Human => {
                    if entries.is_empty() {
                        println!("The guestbook is empty");
                    }
                    for (index, entry) in entries.iter().enumerate() {
                        println!(
                            "[{}] {} - {}\n    {}",
                            index,
                            entry.timestamp().format("%Y-%m-%d %H:%M"),
                            entry.author_name(),
                            entry.message_body().replace('\n', "\n    ")
                        );
                    }
                }
            }
        }

        GuestbookCommands::Delete { index } => match log.delete_by_display_index(index).await? {
            Some(entry) => println!("Deleted message from {}", entry.author_name()),
            None => println!("No entry at position {}", index),
        },
    }

    Ok(())
}
