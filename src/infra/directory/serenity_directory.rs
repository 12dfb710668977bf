// `MemberDirectory` backed by serenity's HTTP client and cache.
//
// Every call hits Discord once. Errors are sorted into the core's
// `DirectoryError` kinds so the service can log them meaningfully.

use crate::core::moderation::{DirectoryError, MemberDirectory, Membership, PermissionSet};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct SerenityDirectory {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl SerenityDirectory {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self { http, cache }
    }

    fn cache_http(&self) -> (&Arc<serenity::Cache>, &serenity::Http) {
        (&self.cache, &*self.http)
    }

    /// Work out a member's guild-level permissions from their role list.
    ///
    /// Uses the cached guild when we have it and falls back to fetching the guild.
    pub async fn member_permissions(
        &self,
        guild_id: u64,
        user_id: u64,
        member_roles: &[serenity::RoleId],
    ) -> Result<PermissionSet, DirectoryError> {
        let guild_id = serenity::GuildId::new(guild_id);
        let user_id = serenity::UserId::new(user_id);

        // Scoped so the cache guard is dropped before any await.
        let cached = self.cache.guild(guild_id).map(|guild| {
            guild_permissions(
                |id| guild.roles.get(&id).map(|r| r.permissions),
                guild.owner_id,
                guild.id,
                user_id,
                member_roles,
            )
        });
        if let Some(permissions) = cached {
            return Ok(permissions);
        }

        let guild = guild_id
            .to_partial_guild(self.cache_http())
            .await
            .map_err(classify)?;
        Ok(guild_permissions(
            |id| guild.roles.get(&id).map(|r| r.permissions),
            guild.owner_id,
            guild.id,
            user_id,
            member_roles,
        ))
    }

    /// Fetch a member's role list when the event didn't carry it.
    pub async fn member_roles(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Vec<serenity::RoleId>, DirectoryError> {
        let member = serenity::GuildId::new(guild_id)
            .member(self.cache_http(), serenity::UserId::new(user_id))
            .await
            .map_err(classify)?;
        Ok(member.roles)
    }

    /// Look up a guild's display name, cache first.
    pub async fn guild_name(&self, guild_id: u64) -> Result<String, DirectoryError> {
        let guild_id = serenity::GuildId::new(guild_id);
        let cached = self.cache.guild(guild_id).map(|g| g.name.clone());
        if let Some(name) = cached {
            return Ok(name);
        }

        let guild = guild_id
            .to_partial_guild(self.cache_http())
            .await
            .map_err(classify)?;
        Ok(guild.name)
    }
}

/// Guild-level permissions: owner gets everything, everyone else the union of
/// @everyone and their roles. Channel overwrites are not considered.
pub fn guild_permissions<F>(
    role_permissions: F,
    owner_id: serenity::UserId,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    member_roles: &[serenity::RoleId],
) -> PermissionSet
where
    F: Fn(serenity::RoleId) -> Option<serenity::Permissions>,
{
    if owner_id == user_id {
        return PermissionSet::from_bits(serenity::Permissions::all().bits());
    }

    let mut permissions =
        role_permissions(guild_id.everyone_role()).unwrap_or_else(serenity::Permissions::empty);

    for role_id in member_roles {
        if let Some(granted) = role_permissions(*role_id) {
            permissions |= granted;
        }
    }

    PermissionSet::from_bits(permissions.bits())
}

/// Map a serenity error onto the directory's failure kinds.
fn classify(err: ::serenity::Error) -> DirectoryError {
    if let ::serenity::Error::Http(http_err) = &err {
        match http_err.status_code().map(|status| status.as_u16()) {
            Some(404) => return DirectoryError::NotFound(err.to_string()),
            Some(401 | 403) => return DirectoryError::Rejected(err.to_string()),
            _ => {}
        }
    }
    DirectoryError::Transport(err.to_string())
}

#[async_trait]
impl MemberDirectory for SerenityDirectory {
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), DirectoryError> {
        serenity::ChannelId::new(channel_id)
            .delete_message(&self.http, serenity::MessageId::new(message_id))
            .await
            .map_err(classify)
    }

    async fn send_direct_message(&self, user_id: u64, content: &str) -> Result<(), DirectoryError> {
        let channel = serenity::UserId::new(user_id)
            .create_dm_channel(self.cache_http())
            .await
            .map_err(classify)?;
        channel.say(&self.http, content).await.map_err(classify)?;
        Ok(())
    }

    async fn resolve_member(&self, guild_id: u64, user_id: u64) -> Result<Membership, DirectoryError> {
        let roles = self.member_roles(guild_id, user_id).await?;
        let permissions = self.member_permissions(guild_id, user_id, &roles).await?;

        Ok(Membership {
            user_id,
            guild_id,
            permissions,
        })
    }

    async fn ban(&self, member: &Membership, reason: &str) -> Result<(), DirectoryError> {
        serenity::GuildId::new(member.guild_id)
            .ban_with_reason(&self.http, serenity::UserId::new(member.user_id), 0, reason)
            .await
            .map_err(classify)
    }

    async fn kick(&self, member: &Membership, reason: &str) -> Result<(), DirectoryError> {
        serenity::GuildId::new(member.guild_id)
            .kick_with_reason(&self.http, serenity::UserId::new(member.user_id), reason)
            .await
            .map_err(classify)
    }

    async fn timeout(
        &self,
        member: &Membership,
        duration: Duration,
        reason: &str,
    ) -> Result<(), DirectoryError> {
        let until = serenity::Timestamp::from_unix_timestamp(
            chrono::Utc::now().timestamp() + duration.as_secs() as i64,
        )
        .map_err(|e| DirectoryError::Rejected(format!("Invalid timeout timestamp: {}", e)))?;

        serenity::GuildId::new(member.guild_id)
            .edit_member(
                self.cache_http(),
                serenity::UserId::new(member.user_id),
                serenity::EditMember::new()
                    .disable_communication_until_datetime(until)
                    .audit_log_reason(reason),
            )
            .await
            .map(|_| ())
            .map_err(classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const GUILD: u64 = 100;

    fn roles() -> HashMap<serenity::RoleId, serenity::Permissions> {
        HashMap::from([
            // @everyone shares the guild's id
            (serenity::RoleId::new(GUILD), serenity::Permissions::SEND_MESSAGES),
            (serenity::RoleId::new(200), serenity::Permissions::ADMINISTRATOR),
            (serenity::RoleId::new(300), serenity::Permissions::MANAGE_MESSAGES),
        ])
    }

    fn lookup(
        roles: &HashMap<serenity::RoleId, serenity::Permissions>,
    ) -> impl Fn(serenity::RoleId) -> Option<serenity::Permissions> + '_ {
        move |id| roles.get(&id).copied()
    }

    #[test]
    fn test_owner_has_everything() {
        let roles = roles();
        let perms = guild_permissions(
            lookup(&roles),
            serenity::UserId::new(1),
            serenity::GuildId::new(GUILD),
            serenity::UserId::new(1),
            &[],
        );
        assert!(perms.contains(PermissionSet::ADMINISTRATOR));
    }

    #[test]
    fn test_admin_role_grants_administrator() {
        let roles = roles();
        let perms = guild_permissions(
            lookup(&roles),
            serenity::UserId::new(1),
            serenity::GuildId::new(GUILD),
            serenity::UserId::new(2),
            &[serenity::RoleId::new(300), serenity::RoleId::new(200)],
        );
        assert!(perms.contains(PermissionSet::ADMINISTRATOR));
    }

    #[test]
    fn test_plain_member_only_gets_everyone_and_own_roles() {
        let roles = roles();
        let perms = guild_permissions(
            lookup(&roles),
            serenity::UserId::new(1),
            serenity::GuildId::new(GUILD),
            serenity::UserId::new(2),
            &[serenity::RoleId::new(300), serenity::RoleId::new(999)],
        );

        assert!(!perms.contains(PermissionSet::ADMINISTRATOR));
        assert!(perms.contains(serenity::Permissions::SEND_MESSAGES.bits()));
        assert!(perms.contains(serenity::Permissions::MANAGE_MESSAGES.bits()));
    }
}
