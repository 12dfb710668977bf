// This is the entry point of the moderation bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (Discord directory, keep-alive server)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Start the keep-alive web server
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::config::{BotConfig, CommunityRef};
use crate::core::moderation::ModerationService;
use crate::discord::commands::presence;
use crate::discord::{link_filter, Data, Error};
use crate::infra::directory::SerenityDirectory;
use crate::infra::keepalive;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
/// Only new messages matter here; they go through the link filter.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        // The filter logs its own failures; nothing propagates from here.
        link_filter::handle_new_message(ctx, new_message, data).await;
    }

    Ok(())
}

/// Fill the community cache from the configured guild, if there is one.
async fn remember_target_guild(config: &BotConfig, directory: &SerenityDirectory) {
    let Some(guild_id) = config.target_guild_id else {
        return;
    };

    match directory.guild_name(guild_id).await {
        Ok(name) => {
            config.remember_community(CommunityRef { id: guild_id, name });
        }
        Err(e) => tracing::warn!(guild_id, error = %e, "Failed to look up target guild"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    let config = Arc::new(BotConfig::from_env().context("Failed to load configuration")?);
    tracing::debug!(?config, "Configuration loaded");

    // Keep-alive endpoint for the hosting platform. Its failure never stops the bot.
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = keepalive::serve(port).await {
            tracing::error!(port, error = %e, "Keep-alive server stopped");
        }
    });

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let setup_config = Arc::clone(&config);
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::moderation::ban(),
                discord::commands::moderation::kick(),
                discord::commands::moderation::timeout(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!("✅ Logged in as {}", ready.user.tag());

                // Guild registration propagates instantly; global can take up to an hour.
                match setup_config.target_guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                    }
                }
                tracing::info!("Commands registered");

                // ====================================================================
                // DEPENDENCY INJECTION
                // ====================================================================
                let directory = SerenityDirectory::new(ctx.http.clone(), ctx.cache.clone());
                remember_target_guild(&setup_config, &directory).await;

                let moderation = Arc::new(ModerationService::new(
                    directory.clone(),
                    Arc::clone(&setup_config),
                ));

                presence::on_ready(ctx);
                tracing::info!("🚀 Bot is ready!");

                Ok(Data {
                    directory,
                    moderation,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
