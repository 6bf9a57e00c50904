mod catalog;
mod config_cmd;
mod context;
mod export;
mod import;
mod recipe;
mod sync_cmd;

use clap::ValueEnum;

pub use catalog::CatalogCommand;
pub use config_cmd::ConfigCommand;
pub use context::Context;
pub use export::ExportCommand;
pub use import::ImportCommand;
pub use recipe::RecipeCommand;
pub use sync_cmd::{login, logout, try_auto_sync, whoami, SyncCommand};

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Cuts `text` to `max` characters, marking the cut with "...".
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
