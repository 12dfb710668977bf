// Moderation domain models - what the handlers consume and produce.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts serenity types into these and back.

use std::time::Duration;

pub const DEFAULT_REASON: &str = "No reason provided";
pub const DENIED_MESSAGE: &str = "❌ You do not have permission to use this command.";
pub const FAILURE_MESSAGE: &str = "❌ Failed to execute command.";
pub const LINK_REMOVAL_REASON: &str = "posting links is not allowed";

/// Longest timeout Discord accepts (28 days).
pub const MAX_TIMEOUT_MINUTES: u32 = 28 * 24 * 60;

/// A set of permission bits, using Discord's bit layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionSet(u64);

impl PermissionSet {
    pub const ADMINISTRATOR: u64 = 1 << 3;

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn contains(&self, bits: u64) -> bool {
        self.0 & bits == bits
    }
}

/// One user's standing inside one community.
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    pub user_id: u64,
    pub guild_id: u64,
    pub permissions: PermissionSet,
}

/// The community a message came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageOrigin {
    pub guild_id: u64,
    /// Not always known (cache misses), only used for display.
    pub guild_name: Option<String>,
    /// The sender's membership; `None` when it couldn't be resolved.
    pub sender: Option<Membership>,
}

/// A freshly created message, flattened from the gateway event.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message_id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    pub author_tag: String,
    pub author_is_bot: bool,
    pub content: String,
    /// `None` for direct messages.
    pub origin: Option<MessageOrigin>,
}

/// Why the filter left a message alone without looking at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Automated,
    DirectMessage,
}

/// What the link filter did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Ignored(IgnoreReason),
    /// No link in the message.
    Clean,
    /// Had a link but the author is an administrator.
    Exempt,
    /// Link removed. Each flag says whether that side effect succeeded.
    Removed { deleted: bool, notified: bool },
}

/// The user a command targets, as supplied by the command parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetUser {
    pub id: u64,
    /// Display identity used in replies (e.g. `name` or `name#1234`).
    pub tag: String,
}

/// A moderation command with its parameters already typed.
#[derive(Debug, Clone, PartialEq)]
pub enum ModCommand {
    Ban {
        target: TargetUser,
        reason: Option<String>,
    },
    Kick {
        target: TargetUser,
        reason: Option<String>,
    },
    Timeout {
        target: TargetUser,
        minutes: i64,
        reason: Option<String>,
    },
}

impl ModCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ModCommand::Ban { .. } => "ban",
            ModCommand::Kick { .. } => "kick",
            ModCommand::Timeout { .. } => "timeout",
        }
    }

    pub fn target(&self) -> &TargetUser {
        match self {
            ModCommand::Ban { target, .. }
            | ModCommand::Kick { target, .. }
            | ModCommand::Timeout { target, .. } => target,
        }
    }

    /// The reason to record, falling back to the default for missing or blank input.
    pub fn reason(&self) -> &str {
        let reason = match self {
            ModCommand::Ban { reason, .. }
            | ModCommand::Kick { reason, .. }
            | ModCommand::Timeout { reason, .. } => reason.as_deref(),
        };

        reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REASON)
    }

    /// Reject parameter combinations the directory would never accept.
    pub fn validate(&self) -> Result<(), String> {
        if let ModCommand::Timeout { minutes, .. } = self {
            if *minutes < 1 || *minutes > MAX_TIMEOUT_MINUTES as i64 {
                return Err(format!(
                    "timeout minutes must be between 1 and {}, got {}",
                    MAX_TIMEOUT_MINUTES, minutes
                ));
            }
        }
        Ok(())
    }
}

/// Convert a timeout length in minutes to the restriction duration.
pub fn restriction_duration(minutes: u32) -> Duration {
    Duration::from_millis(minutes as u64 * 60_000)
}

/// A slash command invocation, ready for the dispatch handler.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    pub guild_id: u64,
    pub invoker: Membership,
    pub command: ModCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyVisibility {
    Public,
    /// Only the invoker sees it.
    Private,
}

/// The single response produced for every command invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandReply {
    pub content: String,
    pub visibility: ReplyVisibility,
}

impl CommandReply {
    pub fn public(content: String) -> Self {
        Self {
            content,
            visibility: ReplyVisibility::Public,
        }
    }

    pub fn denied() -> Self {
        Self {
            content: DENIED_MESSAGE.to_string(),
            visibility: ReplyVisibility::Private,
        }
    }

    pub fn failure() -> Self {
        Self {
            content: FAILURE_MESSAGE.to_string(),
            visibility: ReplyVisibility::Private,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        self.visibility == ReplyVisibility::Private
    }
}
