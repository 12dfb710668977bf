// Process-wide configuration, loaded once at startup.
//
// Besides the values read from the environment this also owns the community
// reference cache: the one piece of state shared between concurrent handlers.

use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable! Create a .env file with your bot token.")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// A community (guild) the bot has seen, kept for display purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityRef {
    pub id: u64,
    pub name: String,
}

pub struct BotConfig {
    pub discord_token: String,
    pub port: u16,
    /// Guild to register commands in. Commands go global when unset.
    pub target_guild_id: Option<u64>,
    community: OnceLock<CommunityRef>,
}

impl BotConfig {
    pub fn new(discord_token: String, port: u16, target_guild_id: Option<u64>) -> Self {
        Self {
            discord_token,
            port,
            target_guild_id,
            community: OnceLock::new(),
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup, so tests don't touch the real env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .or_else(|| lookup("TOKEN"))
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let target_guild_id = match lookup("TARGET_GUILD_ID").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "TARGET_GUILD_ID",
                value: raw,
            })?),
            None => None,
        };

        Ok(Self::new(discord_token, port, target_guild_id))
    }

    /// The cached community, if one has been recorded yet.
    pub fn community(&self) -> Option<&CommunityRef> {
        self.community.get()
    }

    /// Record `community` unless one is already cached. Returns whether this call wrote it.
    ///
    /// Racing first writers are fine: whichever lands first wins and the rest are dropped.
    pub fn remember_community(&self, community: CommunityRef) -> bool {
        self.community.set(community).is_ok()
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("discord_token", &"<redacted>")
            .field("port", &self.port)
            .field("target_guild_id", &self.target_guild_id)
            .field("community", &self.community.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_only_token_set() {
        let config = BotConfig::from_lookup(lookup_from(&[("DISCORD_TOKEN", "abc")])).unwrap();

        assert_eq!(config.discord_token, "abc");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.target_guild_id, None);
        assert!(config.community().is_none());
    }

    #[test]
    fn test_legacy_token_key_accepted() {
        let config = BotConfig::from_lookup(lookup_from(&[("TOKEN", "legacy")])).unwrap();
        assert_eq!(config.discord_token, "legacy");
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = BotConfig::from_lookup(lookup_from(&[("PORT", "8080")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DISCORD_TOKEN"));
    }

    #[test]
    fn test_invalid_port_names_the_key() {
        let err = BotConfig::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn test_target_guild_parsed() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("PORT", "8080"),
            ("TARGET_GUILD_ID", "1432001978447167611"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.target_guild_id, Some(1432001978447167611));
    }

    #[test]
    fn test_community_is_set_once() {
        let config = BotConfig::new("abc".to_string(), DEFAULT_PORT, None);

        assert!(config.remember_community(CommunityRef {
            id: 1,
            name: "First".to_string(),
        }));
        assert!(!config.remember_community(CommunityRef {
            id: 2,
            name: "Second".to_string(),
        }));

        assert_eq!(config.community().map(|c| c.id), Some(1));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = BotConfig::new("super-secret".to_string(), DEFAULT_PORT, None);
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
    }
}
