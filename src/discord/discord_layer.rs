// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "moderation/link_filter.rs"]
pub mod link_filter;

use crate::core::moderation::ModerationService;
use crate::infra::directory::SerenityDirectory;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Shared state handed to every command and event.
pub struct Data {
    /// Also used directly for permission lookups the core doesn't do.
    pub directory: SerenityDirectory,
    pub moderation: Arc<ModerationService<SerenityDirectory>>,
}
