// Bot presence - tells members at a glance what the bot is doing.

use poise::serenity_prelude as serenity;

/// Called once the bot is ready so the default presence is set in one place.
pub fn on_ready(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("for links");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
