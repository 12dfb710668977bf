// Discord commands module.
// Each feature gets its own command file.

pub mod moderation;

// Bot presence management
pub mod presence;
