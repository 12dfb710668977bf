// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "directory/serenity_directory.rs"]
pub mod directory;

#[path = "keepalive/keepalive_server.rs"]
pub mod keepalive;
