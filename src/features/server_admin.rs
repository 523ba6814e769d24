//! # Feature: Server Administration
//!
//! Guild statistics, category and channel creation, and guided server renaming.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Undo button for created channels, rename panel expiry
//! - 1.0.0: Initial release with /server-stats, /create-category, /create-salon, /rename-server

use crate::panels::{
    disable_all, ButtonKind, ButtonSpec, EmbedSpec, InputSpec, ModalSpec, Panel, BLURPLE, GREEN,
    GREY, RED, SKY,
};
use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{info, warn};
use serenity::http::Http;
use serenity::model::channel::{ChannelType, GuildChannel};
use serenity::model::guild::{PartialGuild, PremiumTier, VerificationLevel};
use serenity::model::id::{ChannelId, GuildId};
use serde_json::{Map, Value};
use std::sync::Arc;

pub const SALON_DELETE: &str = "salon_delete";

pub const RENAME_OPEN: &str = "rename_open";
pub const RENAME_INFO: &str = "rename_info";
pub const RENAME_CANCEL: &str = "rename_cancel";
pub const RENAME_MODAL: &str = "rename_modal";
pub const RENAME_NAME_INPUT: &str = "rename_name";
pub const RENAME_REASON_INPUT: &str = "rename_reason";

pub const DEFAULT_CATEGORY_COLOR: &str = "#5865F2";

// ============================================================================
// Server statistics
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelTally {
    pub total: usize,
    pub text: usize,
    pub voice: usize,
    pub categories: usize,
}

impl ChannelTally {
    pub fn from_kinds(kinds: impl IntoIterator<Item = ChannelType>) -> Self {
        kinds.into_iter().fold(ChannelTally::default(), |mut tally, kind| {
            tally.total += 1;
            match kind {
                ChannelType::Text => tally.text += 1,
                ChannelType::Voice => tally.voice += 1,
                ChannelType::Category => tally.categories += 1,
                _ => {}
            }
            tally
        })
    }
}

pub fn verification_label(level: VerificationLevel) -> &'static str {
    match level {
        VerificationLevel::None => "None",
        VerificationLevel::Low => "Low",
        VerificationLevel::Medium => "Medium",
        VerificationLevel::High => "High",
        VerificationLevel::Higher => "Highest",
        _ => "Unknown",
    }
}

fn boost_tier(tier: PremiumTier) -> u8 {
    match tier {
        PremiumTier::Tier1 => 1,
        PremiumTier::Tier2 => 2,
        PremiumTier::Tier3 => 3,
        _ => 0,
    }
}

/// Everything `/server-stats` shows, detached from the API types
#[derive(Debug, Clone, PartialEq)]
pub struct GuildSnapshot {
    pub id: u64,
    pub name: String,
    pub icon_url: Option<String>,
    pub owner_id: u64,
    pub member_count: Option<u64>,
    pub online_count: Option<u64>,
    pub channels: ChannelTally,
    pub role_count: usize,
    /// Highest first, managed roles and @everyone left out
    pub role_names: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub locale: String,
    pub verification: &'static str,
    pub emoji_count: usize,
    pub sticker_count: usize,
    pub boost_tier: u8,
    pub boost_count: u64,
}

impl GuildSnapshot {
    /// `locale` comes from the interaction; the REST guild object carries none
    pub fn new(
        guild: &PartialGuild,
        channels: impl IntoIterator<Item = ChannelType>,
        locale: Option<&str>,
    ) -> Self {
        let mut roles: Vec<_> = guild
            .roles
            .values()
            .filter(|role| !role.managed && role.id.0 != guild.id.0)
            .collect();
        roles.sort_by(|a, b| b.position.cmp(&a.position));

        GuildSnapshot {
            id: guild.id.0,
            name: guild.name.clone(),
            icon_url: guild.icon_url(),
            owner_id: guild.owner_id.0,
            member_count: guild.approximate_member_count,
            online_count: guild.approximate_presence_count,
            channels: ChannelTally::from_kinds(channels),
            role_count: guild.roles.len(),
            role_names: roles.into_iter().map(|role| role.name.clone()).collect(),
            created_at: DateTime::from_timestamp(guild.id.created_at().unix_timestamp(), 0),
            locale: locale_label(locale),
            verification: verification_label(guild.verification_level),
            emoji_count: guild.emojis.len(),
            sticker_count: guild.stickers.len(),
            boost_tier: boost_tier(guild.premium_tier),
            boost_count: guild.premium_subscription_count,
        }
    }
}

pub fn locale_label(locale: Option<&str>) -> String {
    match locale.map(str::trim).filter(|l| !l.is_empty()) {
        Some(locale) => locale.to_string(),
        None => "unknown".to_string(),
    }
}

fn count(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string())
}

/// Role names, capped at ten with an ellipsis when there are more
pub fn role_summary(names: &[String]) -> String {
    if names.is_empty() {
        return "None".to_string();
    }
    let mut summary = names.iter().take(10).cloned().collect::<Vec<_>>().join(", ");
    if names.len() > 10 {
        summary.push_str("...");
    }
    summary
}

pub fn stats_panel(guild: &GuildSnapshot, requested_by: &str) -> Panel {
    let created = guild
        .created_at
        .map(|date| date.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut embed = EmbedSpec::new(format!("📊 {} statistics", guild.name), "", SKY)
        .field(
            "👥 Members",
            format!(
                "👤 Total: **{}**\n🟢 Online: **{}**",
                count(guild.member_count),
                count(guild.online_count)
            ),
            true,
        )
        .field(
            "📚 Channels",
            format!(
                "📊 Total: **{}**\n💬 Text: **{}**\n🔊 Voice: **{}**\n📁 Categories: **{}**",
                guild.channels.total, guild.channels.text, guild.channels.voice, guild.channels.categories
            ),
            true,
        )
        .field(
            "🏆 Roles",
            format!(
                "📋 Count: **{}**\n🎭 List: {}",
                guild.role_count,
                role_summary(&guild.role_names)
            ),
            false,
        )
        .field("📅 Created", format!("🗓️ **{created}**"), true)
        .field("🌐 Locale", format!("🏳️ **{}**", guild.locale), true)
        .field("🛡️ Verification", format!("🔒 **{}**", guild.verification), true)
        .field(
            "😀 Emojis & stickers",
            format!(
                "😄 Emojis: **{}**\n🎭 Stickers: **{}**",
                guild.emoji_count, guild.sticker_count
            ),
            true,
        )
        .field(
            "🚀 Boosts",
            format!(
                "💪 Tier: **{}**\n🎁 Boosts: **{}**",
                guild.boost_tier, guild.boost_count
            ),
            true,
        )
        .field(
            "🌟 More",
            format!("👑 Owner: <@{}>\n🆔 Server id: `{}`", guild.owner_id, guild.id),
            false,
        )
        .footer(format!("Requested by {requested_by}"));

    if let Some(ref icon) = guild.icon_url {
        embed = embed.thumbnail(icon.clone());
    }

    Panel::embed(embed)
}

pub async fn fetch_snapshot(
    http: &Http,
    guild_id: GuildId,
    locale: Option<&str>,
) -> Result<GuildSnapshot> {
    let guild = guild_id
        .to_partial_guild_with_counts(http)
        .await
        .context("Failed to fetch guild")?;
    let channels = guild_id
        .channels(http)
        .await
        .context("Failed to list guild channels")?;

    Ok(GuildSnapshot::new(&guild, channels.values().map(|c| c.kind), locale))
}

// ============================================================================
// Category and channel creation
// ============================================================================

/// `"{emoji} {name}"` when an emoji is given
pub fn category_name(name: &str, emoji: Option<&str>) -> String {
    match emoji.map(str::trim).filter(|e| !e.is_empty()) {
        Some(emoji) => format!("{emoji} {}", name.trim()),
        None => name.trim().to_string(),
    }
}

pub fn category_panel(name: &str, id: u64, creator: u64, color: u32, now: DateTime<Utc>) -> Panel {
    Panel::embed(
        EmbedSpec::new(
            "🎉 Category created",
            format!("**Name:** {name}\n**ID:** {id}"),
            color,
        )
        .field("👤 Creator", format!("<@{creator}>"), true)
        .field("⏰ Created", format!("<t:{}:R>", now.timestamp()), true)
        .footer("✅ Use /create-salon to add channels to it!"),
    )
}

pub async fn create_category(http: &Http, guild_id: GuildId, name: &str) -> Result<GuildChannel> {
    guild_id
        .create_channel(http, |c| c.name(name).kind(ChannelType::Category))
        .await
        .with_context(|| format!("Failed to create category {name}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalonKind {
    Text,
    Voice,
    Forum,
    Announcement,
    Stage,
    Category,
}

impl SalonKind {
    pub const ALL: [SalonKind; 6] = [
        SalonKind::Text,
        SalonKind::Voice,
        SalonKind::Forum,
        SalonKind::Announcement,
        SalonKind::Stage,
        SalonKind::Category,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        SalonKind::ALL.into_iter().find(|kind| kind.value() == value)
    }

    /// Option value used by the slash command
    pub fn value(&self) -> &'static str {
        match self {
            SalonKind::Text => "text",
            SalonKind::Voice => "voice",
            SalonKind::Forum => "forum",
            SalonKind::Announcement => "announcement",
            SalonKind::Stage => "stage",
            SalonKind::Category => "category",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SalonKind::Text => "Text",
            SalonKind::Voice => "Voice",
            SalonKind::Forum => "Forum",
            SalonKind::Announcement => "Announcement",
            SalonKind::Stage => "Stage",
            SalonKind::Category => "Category",
        }
    }

    /// Discord channel type number; forums (15) have no serenity 0.11 variant
    pub fn api_type(&self) -> u8 {
        match self {
            SalonKind::Text => 0,
            SalonKind::Voice => 2,
            SalonKind::Category => 4,
            SalonKind::Announcement => 5,
            SalonKind::Stage => 13,
            SalonKind::Forum => 15,
        }
    }
}

/// Create-channel request body. Categories never get a parent.
pub fn salon_channel_body(name: &str, kind: SalonKind, parent: Option<ChannelId>) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("name".to_string(), Value::from(name));
    body.insert("type".to_string(), Value::from(kind.api_type()));
    if let (Some(parent), false) = (parent, kind == SalonKind::Category) {
        body.insert("parent_id".to_string(), Value::from(parent.0.to_string()));
    }
    body
}

/// Comma separated names, trimmed, blanks dropped
pub fn parse_salon_names(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Creates one channel per name; failures are logged and skipped
pub async fn create_salons(
    http: &Http,
    guild_id: GuildId,
    kind: SalonKind,
    names: &[String],
    parent: Option<ChannelId>,
) -> Vec<GuildChannel> {
    let mut created = Vec::with_capacity(names.len());

    for name in names {
        let body = salon_channel_body(name, kind, parent);
        let result = http.create_channel(guild_id.0, &body, None).await;

        match result {
            Ok(channel) => created.push(channel),
            Err(e) => warn!("[salon] Failed to create {} channel {name}: {}", kind.value(), e),
        }
    }

    info!(
        "[salon] Created {}/{} {} channel(s) in guild {guild_id}",
        created.len(),
        names.len(),
        kind.value()
    );
    created
}

pub fn salons_created_panel(kind: SalonKind, channel_ids: &[u64], requested_by: &str) -> Panel {
    let list = channel_ids
        .iter()
        .map(|id| format!("<#{id}>"))
        .collect::<Vec<_>>()
        .join("\n");

    Panel::embed(
        EmbedSpec::new(
            "🗂️ Channel creation",
            format!("**{}** channel(s) created.", channel_ids.len()),
            GREEN,
        )
        .field("Created channels", list, false)
        .field("Type", kind.label(), false)
        .footer(format!("Requested by {requested_by}")),
    )
    .with_buttons(vec![ButtonSpec::new(
        SALON_DELETE,
        "🗑️ Delete created channels",
        ButtonKind::Danger,
    )])
}

pub fn salons_deleted_panel(deleted: usize) -> Panel {
    Panel::embed(EmbedSpec::new(
        "🗑️ Channels deleted",
        format!("{deleted} channel(s) deleted."),
        RED,
    ))
}

/// Channels created from a panel message, kept until deleted or expired
#[derive(Clone, Default)]
pub struct SalonLedger {
    created: Arc<DashMap<u64, Vec<u64>>>,
}

impl SalonLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, message: u64, channels: Vec<u64>) {
        self.created.insert(message, channels);
    }

    pub fn take(&self, message: u64) -> Option<Vec<u64>> {
        self.created.remove(&message).map(|(_, channels)| channels)
    }

    pub fn contains(&self, message: u64) -> bool {
        self.created.contains_key(&message)
    }
}

/// Deletes the channels; returns how many went away
pub async fn delete_salons(http: &Http, channel_ids: &[u64]) -> usize {
    let mut deleted = 0;
    for &id in channel_ids {
        match ChannelId(id).delete(http).await {
            Ok(_) => deleted += 1,
            Err(e) => warn!("[salon] Failed to delete channel {id}: {}", e),
        }
    }
    deleted
}

// ============================================================================
// Server rename
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenameError {
    #[error("the server name must be between 2 and 100 characters")]
    NameLength,

    #[error("the reason must be at most 500 characters")]
    ReasonLength,
}

/// A validated rename: trimmed name, reason defaulted when blank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRequest {
    pub name: String,
    pub reason: String,
}

impl RenameRequest {
    pub fn parse(name: &str, reason: Option<&str>) -> Result<Self, RenameError> {
        let name = name.trim();
        let length = name.chars().count();
        if !(2..=100).contains(&length) {
            return Err(RenameError::NameLength);
        }

        let reason = reason.map(str::trim).unwrap_or("");
        if reason.chars().count() > 500 {
            return Err(RenameError::ReasonLength);
        }

        Ok(RenameRequest {
            name: name.to_string(),
            reason: if reason.is_empty() {
                "No reason given".to_string()
            } else {
                reason.to_string()
            },
        })
    }
}

fn rename_buttons() -> Vec<ButtonSpec> {
    vec![
        ButtonSpec::new(RENAME_OPEN, "✏️ Choose the new name", ButtonKind::Primary),
        ButtonSpec::new(RENAME_INFO, "ℹ️ Information", ButtonKind::Secondary),
        ButtonSpec::new(RENAME_CANCEL, "❌ Cancel", ButtonKind::Danger),
    ]
}

pub fn rename_panel(current_name: &str, requested_by: &str) -> Panel {
    Panel::embed(
        EmbedSpec::new(
            "🏷️ Rename the server",
            format!(
                "### Server rename tool\n\n\
                 Press the button below to pick a new name.\n\n\
                 **Current server:** {current_name}"
            ),
            SKY,
        )
        .footer(format!("Requested by {requested_by}")),
    )
    .with_buttons(rename_buttons())
}

pub fn rename_modal(current_name: &str) -> ModalSpec {
    ModalSpec::new(
        RENAME_MODAL,
        "Rename the server",
        vec![
            InputSpec::short(RENAME_NAME_INPUT, "New server name")
                .placeholder("Enter the new server name (max 100 characters)")
                .value(current_name)
                .length(2, 100),
            InputSpec::paragraph(RENAME_REASON_INPUT, "Reason (optional)")
                .placeholder("Why rename the server?")
                .length(0, 500)
                .optional(),
        ],
    )
}

pub fn rename_info_panel() -> Panel {
    Panel::embed(EmbedSpec::new(
        "ℹ️ About renaming the server",
        "### Limits and good practice\n\n\
         - The name must be between 2 and 100 characters\n\
         - Discord may reject inappropriate names\n\
         - Frequent changes can confuse your members\n\n\
         ### Effects\n\n\
         - Permanent invite links keep working\n\
         - Members see the new name immediately\n\
         - The change shows up in the audit log",
        BLURPLE,
    ))
}

pub fn renamed_panel(old_name: &str, request: &RenameRequest, renamed_by: &str) -> Panel {
    Panel::embed(
        EmbedSpec::new(
            "✅ Server renamed",
            format!(
                "**Old name:** {old_name}\n**New name:** {}\n**Reason:** {}",
                request.name, request.reason
            ),
            GREEN,
        )
        .footer(format!("Renamed by {renamed_by}")),
    )
    .with_buttons(disable_all(&rename_buttons()))
}

pub fn rename_cancelled_panel() -> Panel {
    Panel::embed(EmbedSpec::new(
        "❌ Cancelled",
        "The server rename was cancelled.",
        RED,
    ))
    .with_buttons(disable_all(&rename_buttons()))
}

pub fn rename_expired_panel() -> Panel {
    Panel::embed(EmbedSpec::new(
        "⌛ Time's up",
        "The rename session expired. Run the command again to rename the server.",
        GREY,
    ))
    .with_buttons(disable_all(&rename_buttons()))
}

/// Renames the guild and returns its previous name
pub async fn rename_guild(http: &Http, mut guild_id: GuildId, request: &RenameRequest) -> Result<String> {
    let guild = guild_id
        .to_partial_guild(http)
        .await
        .context("Failed to fetch guild")?;

    if guild.name == request.name {
        bail!("the server is already named {}", request.name);
    }

    guild_id
        .edit(http, |g| g.name(&request.name))
        .await
        .context("Failed to rename guild")?;

    info!(
        "[rename] Guild {guild_id} renamed from {} to {} ({})",
        guild.name, request.name, request.reason
    );
    Ok(guild.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot() -> GuildSnapshot {
        GuildSnapshot {
            id: 10,
            name: "Rustaceans".to_string(),
            icon_url: None,
            owner_id: 20,
            member_count: Some(42),
            online_count: None,
            channels: ChannelTally::from_kinds([
                ChannelType::Text,
                ChannelType::Text,
                ChannelType::Voice,
                ChannelType::Category,
                ChannelType::Stage,
            ]),
            role_count: 3,
            role_names: vec!["Admin".to_string(), "Member".to_string()],
            created_at: Some(Utc.with_ymd_and_hms(2021, 5, 1, 8, 30, 0).unwrap()),
            locale: "en-US".to_string(),
            verification: verification_label(VerificationLevel::Medium),
            emoji_count: 4,
            sticker_count: 1,
            boost_tier: 2,
            boost_count: 9,
        }
    }

    // ============================================================================
    // Statistics
    // ============================================================================

    #[test]
    fn test_channel_tally() {
        let tally = snapshot().channels;
        assert_eq!(tally.total, 5);
        assert_eq!(tally.text, 2);
        assert_eq!(tally.voice, 1);
        assert_eq!(tally.categories, 1);
    }

    #[test]
    fn test_role_summary_caps_at_ten() {
        assert_eq!(role_summary(&[]), "None");

        let names: Vec<String> = (1..=12).map(|i| format!("r{i}")).collect();
        let summary = role_summary(&names);
        assert!(summary.starts_with("r1, r2"));
        assert!(summary.contains("r10"));
        assert!(!summary.contains("r11"));
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_stats_panel_fields() {
        let panel = stats_panel(&snapshot(), "ada");
        let embed = panel.embed.unwrap();

        assert_eq!(embed.color, SKY);
        assert!(embed.fields[0].value.contains("Total: **42**"));
        assert!(embed.fields[0].value.contains("Online: **?**"));
        assert!(embed.fields[1].value.contains("Categories: **1**"));
        assert!(embed.fields[3].value.contains("01/05/2021 08:30"));
        assert!(embed.fields[5].value.contains("Medium"));
        assert!(embed.fields.last().unwrap().value.contains("<@20>"));
        assert!(embed.thumbnail.is_none());
        assert!(panel.buttons.is_empty());
    }

    #[test]
    fn test_verification_labels() {
        assert_eq!(verification_label(VerificationLevel::None), "None");
        assert_eq!(verification_label(VerificationLevel::Higher), "Highest");
    }

    // ============================================================================
    // Creation
    // ============================================================================

    #[test]
    fn test_category_name() {
        assert_eq!(category_name(" Games ", None), "Games");
        assert_eq!(category_name("Games", Some("🎮")), "🎮 Games");
        assert_eq!(category_name("Games", Some("  ")), "Games");
    }

    #[test]
    fn test_category_panel() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let embed = category_panel("🎮 Games", 5, 6, 0x112233, now).embed.unwrap();
        assert_eq!(embed.color, 0x112233);
        assert!(embed.description.contains("**ID:** 5"));
        assert_eq!(embed.fields[1].value, format!("<t:{}:R>", now.timestamp()));
    }

    #[test]
    fn test_parse_salon_names() {
        assert_eq!(
            parse_salon_names(" general, ,memes ,,  off-topic"),
            vec!["general", "memes", "off-topic"]
        );
        assert!(parse_salon_names(" , ").is_empty());
    }

    #[test]
    fn test_salon_kinds() {
        for kind in SalonKind::ALL {
            assert_eq!(SalonKind::parse(kind.value()), Some(kind));
        }
        assert_eq!(SalonKind::parse("dm"), None);
        assert_eq!(SalonKind::Announcement.api_type(), 5);
        assert_eq!(SalonKind::Stage.api_type(), 13);
    }

    #[test]
    fn test_forum_channel_body() {
        let body = salon_channel_body("ideas", SalonKind::Forum, Some(ChannelId(77)));
        assert_eq!(body["name"], "ideas");
        assert_eq!(body["type"], 15);
        assert_eq!(body["parent_id"], "77");
    }

    #[test]
    fn test_category_body_ignores_parent() {
        let body = salon_channel_body("Lounge", SalonKind::Category, Some(ChannelId(77)));
        assert_eq!(body["type"], 4);
        assert!(!body.contains_key("parent_id"));

        let body = salon_channel_body("general", SalonKind::Text, None);
        assert_eq!(body["type"], 0);
        assert!(!body.contains_key("parent_id"));
    }

    #[test]
    fn test_locale_label() {
        assert_eq!(locale_label(Some("fr")), "fr");
        assert_eq!(locale_label(Some("  ")), "unknown");
        assert_eq!(locale_label(None), "unknown");
    }

    #[test]
    fn test_salons_created_panel() {
        let panel = salons_created_panel(SalonKind::Voice, &[1, 2], "ada");
        let embed = panel.embed.as_ref().unwrap();
        assert_eq!(embed.fields[0].value, "<#1>\n<#2>");
        assert_eq!(embed.fields[1].value, "Voice");
        assert_eq!(panel.button_ids(), vec![SALON_DELETE]);
    }

    #[test]
    fn test_salon_ledger_take_once() {
        let ledger = SalonLedger::new();
        ledger.record(99, vec![1, 2, 3]);
        assert!(ledger.contains(99));
        assert_eq!(ledger.take(99), Some(vec![1, 2, 3]));
        assert_eq!(ledger.take(99), None);
    }

    // ============================================================================
    // Rename
    // ============================================================================

    #[test]
    fn test_rename_request_validation() {
        assert_eq!(RenameRequest::parse("a", None), Err(RenameError::NameLength));
        assert_eq!(
            RenameRequest::parse(&"x".repeat(101), None),
            Err(RenameError::NameLength)
        );
        assert_eq!(
            RenameRequest::parse("ok", Some(&"r".repeat(501))),
            Err(RenameError::ReasonLength)
        );

        let request = RenameRequest::parse("  New Home ", Some("   ")).unwrap();
        assert_eq!(request.name, "New Home");
        assert_eq!(request.reason, "No reason given");

        // character count, not bytes
        assert!(RenameRequest::parse(&"é".repeat(100), None).is_ok());
    }

    #[test]
    fn test_rename_panels_disable_buttons() {
        let open = rename_panel("Old", "ada");
        assert!(open.buttons.iter().all(|b| !b.disabled));
        assert_eq!(open.button_ids(), vec![RENAME_OPEN, RENAME_INFO, RENAME_CANCEL]);

        for panel in [rename_cancelled_panel(), rename_expired_panel()] {
            assert_eq!(panel.buttons.len(), 3);
            assert!(panel.buttons.iter().all(|b| b.disabled));
        }

        let request = RenameRequest::parse("New", None).unwrap();
        let done = renamed_panel("Old", &request, "ada");
        assert!(done.embed.unwrap().description.contains("**New name:** New"));
    }

    #[test]
    fn test_rename_modal_prefill() {
        let modal = rename_modal("Old Name");
        assert_eq!(modal.custom_id, RENAME_MODAL);
        assert_eq!(modal.inputs[0].value.as_deref(), Some("Old Name"));
        assert!(!modal.inputs[1].required);
        assert_eq!(modal.inputs[1].max_length, Some(500));
    }
}
