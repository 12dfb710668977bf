// Core moderation module - link filter and moderation command logic.

pub mod link_policy;
pub mod moderation_models;
pub mod moderation_service;

pub use moderation_models::*;
pub use moderation_service::*;
