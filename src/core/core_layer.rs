// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "config/bot_config.rs"]
pub mod config;

#[path = "moderation/mod.rs"]
pub mod moderation;
