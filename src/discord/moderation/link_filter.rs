// Discord-side link filtering - turns a gateway message into the core's
// `InboundMessage` and lets the moderation service decide.

use crate::core::moderation::{FilterOutcome, InboundMessage, Membership, MessageOrigin};
use crate::discord::Data;
use crate::infra::directory::SerenityDirectory;
use poise::serenity_prelude as serenity;

/// Run the link policy against a freshly created message.
pub async fn handle_new_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> FilterOutcome {
    let inbound = to_inbound(ctx, msg, &data.directory).await;
    let outcome = data.moderation.handle_message(&inbound).await;

    tracing::debug!(
        message_id = inbound.message_id,
        user_id = inbound.author_id,
        ?outcome,
        "Link filter finished"
    );
    outcome
}

async fn to_inbound(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    directory: &SerenityDirectory,
) -> InboundMessage {
    let origin = match msg.guild_id {
        Some(guild_id) => {
            // Own statement so the cache guard is released before awaiting.
            let guild_name = ctx.cache.guild(guild_id).map(|g| g.name.clone());
            let sender = if msg.author.bot {
                None
            } else {
                sender_membership(directory, msg, guild_id).await
            };

            Some(MessageOrigin {
                guild_id: guild_id.get(),
                guild_name,
                sender,
            })
        }
        None => None,
    };

    InboundMessage {
        message_id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        author_id: msg.author.id.get(),
        author_tag: msg.author.tag(),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        origin,
    }
}

/// Resolve the author's membership. `None` means "treat as a regular member".
async fn sender_membership(
    directory: &SerenityDirectory,
    msg: &serenity::Message,
    guild_id: serenity::GuildId,
) -> Option<Membership> {
    let user_id = msg.author.id.get();
    let guild_id = guild_id.get();

    let roles = match msg.member.as_ref() {
        Some(member) => member.roles.clone(),
        None => match directory.member_roles(guild_id, user_id).await {
            Ok(roles) => roles,
            Err(e) => {
                tracing::warn!(user_id, guild_id, error = %e, "Failed to fetch message author's roles");
                return None;
            }
        },
    };

    match directory.member_permissions(guild_id, user_id, &roles).await {
        Ok(permissions) => Some(Membership {
            user_id,
            guild_id,
            permissions,
        }),
        Err(e) => {
            tracing::warn!(user_id, guild_id, error = %e, "Failed to resolve message author's permissions");
            None
        }
    }
}
