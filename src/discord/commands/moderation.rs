// Moderation slash commands: ban, kick, timeout.
//
// Same pattern as the rest of the Discord layer:
// 1. Extract primitive data from Discord types
// 2. Call the core moderation service
// 3. Send back whatever reply it produced
//
// Authorization lives in the core so the denial message is ours, not poise's.

use crate::core::moderation::{CommandInvocation, Membership, ModCommand, PermissionSet, TargetUser};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

type Context<'a> = poise::Context<'a, Data, Error>;

/// Ban a user from the server.
#[poise::command(slash_command, guild_only)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "User to ban"] user: serenity::User,
    #[description = "Reason for the ban"] reason: Option<String>,
) -> Result<(), Error> {
    let target = target_user(&user);
    dispatch(ctx, ModCommand::Ban { target, reason }).await
}

/// Kick a user from the server.
#[poise::command(slash_command, guild_only)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "User to kick"] user: serenity::User,
    #[description = "Reason for the kick"] reason: Option<String>,
) -> Result<(), Error> {
    let target = target_user(&user);
    dispatch(ctx, ModCommand::Kick { target, reason }).await
}

/// Temporarily stop a user from talking.
#[poise::command(slash_command, guild_only)]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "User to timeout"] user: serenity::User,
    #[description = "Duration in minutes (max 28 days)"]
    #[min = 1]
    #[max = 40320]
    minutes: i64,
    #[description = "Reason for the timeout"] reason: Option<String>,
) -> Result<(), Error> {
    let target = target_user(&user);
    dispatch(
        ctx,
        ModCommand::Timeout {
            target,
            minutes,
            reason,
        },
    )
    .await
}

fn target_user(user: &serenity::User) -> TargetUser {
    TargetUser {
        id: user.id.get(),
        tag: user.tag(),
    }
}

/// Hand the command to the core and send its single reply.
async fn dispatch(ctx: Context<'_>, command: ModCommand) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let user_id = ctx.author().id.get();

    let invocation = CommandInvocation {
        guild_id: guild_id.get(),
        invoker: Membership {
            user_id,
            guild_id: guild_id.get(),
            permissions: invoker_permissions(ctx, guild_id).await,
        },
        command,
    };

    let reply = ctx.data().moderation.handle_command(&invocation).await;
    let ephemeral = reply.is_ephemeral();

    if let Err(e) = ctx
        .send(
            poise::CreateReply::default()
                .content(reply.content)
                .ephemeral(ephemeral),
        )
        .await
    {
        tracing::error!(
            user_id,
            guild_id = guild_id.get(),
            command = invocation.command.name(),
            error = %e,
            "Failed to send moderation reply"
        );
    }

    Ok(())
}

/// The invoker's guild permissions. Anything we can't resolve counts as no permissions.
async fn invoker_permissions(ctx: Context<'_>, guild_id: serenity::GuildId) -> PermissionSet {
    let (user_id, roles) = match ctx.author_member().await {
        // Interactions carry the resolved permissions; prefer those.
        Some(member) => match member.permissions {
            Some(permissions) => return PermissionSet::from_bits(permissions.bits()),
            None => (member.user.id.get(), member.roles.clone()),
        },
        None => return PermissionSet::empty(),
    };

    match ctx
        .data()
        .directory
        .member_permissions(guild_id.get(), user_id, &roles)
        .await
    {
        Ok(permissions) => permissions,
        Err(e) => {
            tracing::warn!(
                user_id,
                guild_id = guild_id.get(),
                error = %e,
                "Failed to resolve invoker permissions"
            );
            PermissionSet::empty()
        }
    }
}
