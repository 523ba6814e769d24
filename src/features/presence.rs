//! # Feature: Presence
//!
//! Keeps the bot's activity at "Watching N servers". The guild set is fed
//! by `guild_create`/`guild_delete` since the client runs without a cache.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

use dashmap::DashSet;
use log::{debug, info};
use serenity::client::Context;
use serenity::model::gateway::Activity;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
pub struct Presence {
    guilds: Arc<DashSet<u64>>,
    refreshing: Arc<AtomicBool>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the guild was not tracked yet
    pub fn join(&self, guild: u64) -> bool {
        self.guilds.insert(guild)
    }

    /// Returns `true` when the guild was tracked
    pub fn leave(&self, guild: u64) -> bool {
        self.guilds.remove(&guild).is_some()
    }

    pub fn guild_count(&self) -> usize {
        self.guilds.len()
    }

    pub fn activity_text(&self) -> String {
        activity_text(self.guild_count())
    }

    pub async fn apply(&self, ctx: &Context) {
        let text = self.activity_text();
        debug!("[presence] {text}");
        ctx.set_activity(Activity::watching(text)).await;
    }

    /// Starts the periodic refresh. Later calls (reconnects fire `ready`
    /// again) are no-ops; returns whether this call started it.
    pub fn start_refresh(&self, ctx: Context, every: Duration) -> bool {
        if self.refreshing.swap(true, Ordering::SeqCst) {
            return false;
        }

        let presence = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                presence.apply(&ctx).await;
            }
        });

        info!("[presence] Refreshing every {}m", every.as_secs() / 60);
        true
    }
}

pub fn activity_text(guilds: usize) -> String {
    if guilds == 1 {
        "1 server".to_string()
    } else {
        format!("{guilds} servers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_leave_counts() {
        let presence = Presence::new();
        assert!(presence.join(1));
        assert!(!presence.join(1));
        assert!(presence.join(2));
        assert_eq!(presence.guild_count(), 2);

        assert!(presence.leave(1));
        assert!(!presence.leave(1));
        assert_eq!(presence.activity_text(), "1 server");
    }

    #[test]
    fn test_activity_text() {
        assert_eq!(activity_text(0), "0 servers");
        assert_eq!(activity_text(12), "12 servers");
    }

    #[test]
    fn test_clones_share_state() {
        let presence = Presence::new();
        let other = presence.clone();
        other.join(5);
        assert_eq!(presence.guild_count(), 1);
    }
}
