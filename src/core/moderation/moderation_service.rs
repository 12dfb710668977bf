// Moderation service - the decision engine behind the bot.
//
// This service handles:
// - Link filtering on new messages (delete + DM the author)
// - Admin-only moderation commands (ban, kick, timeout)
//
// NO Discord dependencies here - every side effect goes through `MemberDirectory`.

use super::link_policy::contains_link;
use super::moderation_models::{
    restriction_duration, CommandInvocation, CommandReply, FilterOutcome, IgnoreReason,
    InboundMessage, Membership, MessageOrigin, ModCommand, PermissionSet, LINK_REMOVAL_REASON,
};
use crate::core::config::{BotConfig, CommunityRef};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Action rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

// ============================================================================
// DIRECTORY TRAIT (PORT)
// ============================================================================

/// Everything the engine can do to the outside world.
///
/// Every call is attempted once; failures are reported back, never retried.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn delete_message(&self, channel_id: u64, message_id: u64)
        -> Result<(), DirectoryError>;

    async fn send_direct_message(&self, user_id: u64, content: &str)
        -> Result<(), DirectoryError>;

    /// Look up a user's live membership in a guild.
    async fn resolve_member(&self, guild_id: u64, user_id: u64)
        -> Result<Membership, DirectoryError>;

    async fn ban(&self, member: &Membership, reason: &str) -> Result<(), DirectoryError>;

    async fn kick(&self, member: &Membership, reason: &str) -> Result<(), DirectoryError>;

    async fn timeout(
        &self,
        member: &Membership,
        duration: Duration,
        reason: &str,
    ) -> Result<(), DirectoryError>;
}

/// Whether this member holds the Administrator permission.
pub fn is_administrator(member: &Membership) -> bool {
    member.permissions.contains(PermissionSet::ADMINISTRATOR)
}

/// The DM sent to someone whose link was removed.
pub fn removal_notice(community_name: &str) -> String {
    format!(
        "⚠️ Your message in **{}** was removed because {}.",
        community_name, LINK_REMOVAL_REASON
    )
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationService<D: MemberDirectory> {
    directory: D,
    config: Arc<BotConfig>,
}

impl<D: MemberDirectory> ModerationService<D> {
    pub fn new(directory: D, config: Arc<BotConfig>) -> Self {
        Self { directory, config }
    }

    /// Apply the link policy to a new message.
    ///
    /// Never fails: delete and DM failures are logged and reflected in the outcome.
    pub async fn handle_message(&self, message: &InboundMessage) -> FilterOutcome {
        if message.author_is_bot {
            return FilterOutcome::Ignored(IgnoreReason::Automated);
        }

        let origin = match &message.origin {
            Some(origin) => origin,
            None => return FilterOutcome::Ignored(IgnoreReason::DirectMessage),
        };

        if let Some(name) = &origin.guild_name {
            self.config.remember_community(CommunityRef {
                id: origin.guild_id,
                name: name.clone(),
            });
        }

        if !contains_link(&message.content) {
            return FilterOutcome::Clean;
        }

        if origin.sender.as_ref().is_some_and(is_administrator) {
            return FilterOutcome::Exempt;
        }

        let deleted = match self
            .directory
            .delete_message(message.channel_id, message.message_id)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    user_id = message.author_id,
                    guild_id = origin.guild_id,
                    "Deleted message with link from {}",
                    message.author_tag
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    user_id = message.author_id,
                    guild_id = origin.guild_id,
                    error = %e,
                    "Failed to delete message with link from {}",
                    message.author_tag
                );
                false
            }
        };

        // The DM goes out even if the delete failed.
        let notice = removal_notice(&self.community_name(origin));
        let notified = match self
            .directory
            .send_direct_message(message.author_id, &notice)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    user_id = message.author_id,
                    guild_id = origin.guild_id,
                    error = %e,
                    "Failed to DM {} about removed link",
                    message.author_tag
                );
                false
            }
        };

        FilterOutcome::Removed { deleted, notified }
    }

    /// Authorize and run a moderation command, producing exactly one reply.
    pub async fn handle_command(&self, invocation: &CommandInvocation) -> CommandReply {
        // Gate first: nothing below runs for non-admins.
        if !is_administrator(&invocation.invoker) {
            return CommandReply::denied();
        }

        match self.execute(invocation).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    user_id = invocation.invoker.user_id,
                    guild_id = invocation.guild_id,
                    command = invocation.command.name(),
                    target_id = invocation.command.target().id,
                    error = %e,
                    "Failed to execute moderation command"
                );
                CommandReply::failure()
            }
        }
    }

    async fn execute(&self, invocation: &CommandInvocation) -> Result<CommandReply, ModerationError> {
        let command = &invocation.command;
        command.validate().map_err(ModerationError::InvalidParameter)?;

        let target = command.target();
        let reason = command.reason();
        let member = self
            .directory
            .resolve_member(invocation.guild_id, target.id)
            .await?;

        let content = match command {
            ModCommand::Ban { .. } => {
                self.directory.ban(&member, reason).await?;
                format!("🔨 Banned **{}** | Reason: {}", target.tag, reason)
            }
            ModCommand::Kick { .. } => {
                self.directory.kick(&member, reason).await?;
                format!("👢 Kicked **{}** | Reason: {}", target.tag, reason)
            }
            ModCommand::Timeout { minutes, .. } => {
                // validate() already bounded this to a positive u32 range
                let minutes = *minutes as u32;
                self.directory
                    .timeout(&member, restriction_duration(minutes), reason)
                    .await?;
                format!(
                    "⏱️ Timed out **{}** for {} minute(s) | Reason: {}",
                    target.tag, minutes, reason
                )
            }
        };

        tracing::info!(
            user_id = invocation.invoker.user_id,
            guild_id = invocation.guild_id,
            command = command.name(),
            target_id = target.id,
            reason,
            "Moderation command executed"
        );

        Ok(CommandReply::public(content))
    }

    fn community_name(&self, origin: &MessageOrigin) -> String {
        origin
            .guild_name
            .clone()
            .or_else(|| self.config.community().map(|c| c.name.clone()))
            .unwrap_or_else(|| "this server".to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
