//! # Feature: Welcome Messages
//!
//! Per-guild welcome settings, message templates and delivery on member join.
//! Settings live in memory for the lifetime of the process.
//!
//! - **Version**: 1.3.0
//! - **Since**: 0.2.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.3.0: Abandoned drafts expire, long messages clipped in the status panel
//! - 1.2.0: Drafts per editor, committed on save
//! - 1.1.0: Retries on send, auto-disable when the channel is gone
//! - 1.0.0: Initial release with template placeholders and welcome card

use crate::config::WelcomeDeliveryConfig;
use crate::panels::{
    parse_hex_color, ButtonKind, ButtonSpec, EmbedSpec, InputSpec, ModalSpec, Panel, BLURPLE,
    GREEN, RED,
};
use anyhow::{Context as _, Result};
use chrono::{DateTime, Datelike, Utc};
use dashmap::DashMap;
use log::{debug, info, warn};
use serenity::http::Http;
use serenity::model::guild::Member;
use serenity::model::id::ChannelId;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

pub const CUSTOMIZE: &str = "welcome_customize";
pub const TEST: &str = "welcome_test";
pub const DISABLE: &str = "welcome_disable";
pub const ENABLE: &str = "welcome_enable";
pub const EDIT_MESSAGE: &str = "welcome_edit_message";
pub const EDIT_COLOR: &str = "welcome_edit_color";
pub const TOGGLE_IMAGE: &str = "welcome_toggle_image";
pub const SAVE: &str = "welcome_save";

pub const MESSAGE_MODAL: &str = "welcome_message_modal";
pub const COLOR_MODAL: &str = "welcome_color_modal";
pub const INPUT_MESSAGE: &str = "welcome_message";
pub const INPUT_TITLE: &str = "welcome_title";
pub const INPUT_DESCRIPTION: &str = "welcome_description";
pub const INPUT_FOOTER: &str = "welcome_footer";
pub const INPUT_COLOR: &str = "welcome_color";

const CARD_ENDPOINT: &str = "https://api.popcat.xyz/welcomecard";
const CARD_BACKGROUND: &str = "https://i.imgur.com/8BOiOqD.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeSettings {
    pub enabled: bool,
    pub channel_id: Option<u64>,
    pub message: String,
    pub embed_title: String,
    pub embed_description: String,
    pub embed_footer: String,
    /// `#RRGGBB`
    pub embed_color: String,
    pub with_image: bool,
}

impl Default for WelcomeSettings {
    fn default() -> Self {
        WelcomeSettings {
            enabled: false,
            channel_id: None,
            message: "🌟 **Welcome {user} to {server}!** 🌟\n\n\
                      Our community now has **{memberCount}** members! We're thrilled to have you."
                .to_string(),
            embed_title: "🎉 New member • Welcome!".to_string(),
            embed_description: "### Hello {username}!\n\n\
                                📣 **Welcome to our server!**\n\n\
                                We're very happy to have you here. Feel free to introduce yourself \
                                and join the conversation.\n\n\
                                ✅ **A few tips:**\n\
                                • Read the rules for a pleasant experience\n\
                                • Explore the topic channels\n\
                                • Take part in community events\n\n\
                                We hope you enjoy your stay!"
                .to_string(),
            embed_footer: "👋 {username} joined on {date}".to_string(),
            embed_color: "#5865F2".to_string(),
            with_image: true,
        }
    }
}

/// Lifetime of an untouched draft, the same as the interaction token behind
/// the ephemeral customize panel
pub const DRAFT_TTL: Duration = Duration::from_secs(15 * 60);

/// Discord's cap on an embed field value
const FIELD_LIMIT: usize = 1024;

struct Draft {
    settings: WelcomeSettings,
    touched: Instant,
}

impl Draft {
    fn is_stale(&self) -> bool {
        self.touched.elapsed() >= DRAFT_TTL
    }
}

/// Guild id → welcome settings, plus unsaved edits keyed by (guild, editor)
#[derive(Clone, Default)]
pub struct WelcomeStore {
    guilds: Arc<DashMap<u64, WelcomeSettings>>,
    drafts: Arc<DashMap<(u64, u64), Draft>>,
}

impl WelcomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild: u64) -> Option<WelcomeSettings> {
        self.guilds.get(&guild).map(|s| s.clone())
    }

    /// Stored settings, or the defaults for a guild never configured
    pub fn settings(&self, guild: u64) -> WelcomeSettings {
        self.get(guild).unwrap_or_default()
    }

    pub fn enable(&self, guild: u64, channel: u64) -> WelcomeSettings {
        let mut entry = self.guilds.entry(guild).or_default();
        entry.enabled = true;
        entry.channel_id = Some(channel);
        entry.clone()
    }

    /// Returns `false` when it was already disabled
    pub fn disable(&self, guild: u64) -> bool {
        match self.guilds.get_mut(&guild) {
            Some(mut settings) if settings.enabled => {
                settings.enabled = false;
                true
            }
            _ => false,
        }
    }

    /// Turns the system back on in its previous channel, if it had one
    pub fn reenable(&self, guild: u64) -> Option<u64> {
        let channel = self.get(guild)?.channel_id?;
        self.enable(guild, channel);
        Some(channel)
    }

    /// Starts (or restarts) an edit session from the stored settings.
    /// Drafts abandoned past [`DRAFT_TTL`] are dropped on the way.
    pub fn begin_draft(&self, guild: u64, editor: u64) -> WelcomeSettings {
        let pruned = self.prune_drafts();
        if pruned > 0 {
            debug!("[welcome] Dropped {pruned} abandoned draft(s)");
        }

        let draft = self.settings(guild);
        self.drafts.insert(
            (guild, editor),
            Draft {
                settings: draft.clone(),
                touched: Instant::now(),
            },
        );
        draft
    }

    pub fn draft(&self, guild: u64, editor: u64) -> Option<WelcomeSettings> {
        self.drafts
            .get(&(guild, editor))
            .filter(|d| !d.is_stale())
            .map(|d| d.settings.clone())
    }

    pub fn edit_draft<F>(&self, guild: u64, editor: u64, edit: F) -> Option<WelcomeSettings>
    where
        F: FnOnce(&mut WelcomeSettings),
    {
        let mut draft = self.drafts.get_mut(&(guild, editor))?;
        if draft.is_stale() {
            return None;
        }
        edit(&mut draft.settings);
        draft.touched = Instant::now();
        Some(draft.settings.clone())
    }

    /// Removes stale drafts and returns how many went
    pub fn prune_drafts(&self) -> usize {
        let before = self.drafts.len();
        self.drafts.retain(|_, draft| !draft.is_stale());
        before.saturating_sub(self.drafts.len())
    }

    pub fn draft_count(&self) -> usize {
        self.drafts.len()
    }

    /// Commits the presentation fields of a draft; enablement and channel
    /// keep their current stored values.
    pub fn save_draft(&self, guild: u64, editor: u64) -> Option<WelcomeSettings> {
        let (_, draft) = self.drafts.remove(&(guild, editor))?;
        if draft.is_stale() {
            return None;
        }
        let draft = draft.settings;
        let mut entry = self.guilds.entry(guild).or_default();
        entry.message = draft.message;
        entry.embed_title = draft.embed_title;
        entry.embed_description = draft.embed_description;
        entry.embed_footer = draft.embed_footer;
        entry.embed_color = draft.embed_color;
        entry.with_image = draft.with_image;
        Some(entry.clone())
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Who arrived where, as seen by the templates
#[derive(Debug, Clone)]
pub struct Arrival {
    pub user_id: u64,
    pub username: String,
    pub avatar_url: String,
    pub account_created: Option<DateTime<Utc>>,
    pub server: String,
    pub member_count: Option<u64>,
    pub is_test: bool,
    pub at: DateTime<Utc>,
}

impl Arrival {
    pub fn from_member(member: &Member, server: &str, member_count: Option<u64>, is_test: bool) -> Self {
        Arrival {
            user_id: member.user.id.0,
            username: member.user.name.clone(),
            avatar_url: member.user.face(),
            account_created: DateTime::from_timestamp(member.user.created_at().unix_timestamp(), 0),
            server: server.to_string(),
            member_count,
            is_test,
            at: Utc::now(),
        }
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%-d %B %Y").to_string()
}

/// Replaces `{user}`, `{username}`, `{server}`, `{memberCount}`, `{date}`,
/// `{test}` and `{year}`
pub fn render_template(template: &str, arrival: &Arrival) -> String {
    let member_count = arrival
        .member_count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "?".to_string());

    template
        .replace("{user}", &format!("<@{}>", arrival.user_id))
        .replace("{username}", &arrival.username)
        .replace("{server}", &arrival.server)
        .replace("{memberCount}", &member_count)
        .replace("{date}", &format_date(arrival.at))
        .replace("{test}", if arrival.is_test { "(TEST)" } else { "" })
        .replace("{year}", &arrival.at.year().to_string())
}

/// Welcome card image, with every parameter query-encoded
pub fn welcome_card_url(arrival: &Arrival) -> Option<String> {
    let member = arrival
        .member_count
        .map(|c| format!("Member #{c}"))
        .unwrap_or_else(|| "New member".to_string());

    Url::parse_with_params(
        CARD_ENDPOINT,
        &[
            ("background", CARD_BACKGROUND.to_string()),
            ("text1", arrival.username.clone()),
            ("text2", format!("Welcome to {}", arrival.server)),
            ("text3", member),
            ("avatar", arrival.avatar_url.clone()),
        ],
    )
    .ok()
    .map(String::from)
}

/// The message posted in the welcome channel
pub fn welcome_message(settings: &WelcomeSettings, arrival: &Arrival) -> Panel {
    let color = parse_hex_color(&settings.embed_color).unwrap_or(BLURPLE);
    let mut embed = EmbedSpec::new(
        render_template(&settings.embed_title, arrival),
        render_template(&settings.embed_description, arrival),
        color,
    )
    .footer(render_template(&settings.embed_footer, arrival))
    .thumbnail(arrival.avatar_url.clone());

    if settings.with_image {
        if let Some(url) = welcome_card_url(arrival) {
            embed = embed.image(url);
        }
    }

    if let Some(created) = arrival.account_created {
        embed = embed.field("📅 Account created", format_date(created), true);
    }

    if arrival.is_test {
        embed = embed.field("🧪 Test", "This is a test message.", false);
    }

    Panel {
        content: Some(render_template(&settings.message, arrival)),
        embed: Some(embed),
        buttons: Vec::new(),
    }
}

// ============================================================================
// Panels
// ============================================================================

pub fn enabled_panel(channel: u64) -> Panel {
    Panel::embed(EmbedSpec::new(
        "✅ Welcome messages enabled",
        format!("Welcome messages will be posted in <#{channel}>."),
        GREEN,
    ))
    .with_buttons(vec![
        ButtonSpec::new(CUSTOMIZE, "✏️ Customize", ButtonKind::Primary),
        ButtonSpec::new(TEST, "🧪 Test", ButtonKind::Secondary),
        ButtonSpec::new(DISABLE, "❌ Disable", ButtonKind::Danger),
    ])
}

pub fn disabled_panel() -> Panel {
    Panel::embed(EmbedSpec::new(
        "❌ Welcome messages disabled",
        "The welcome message system has been disabled.",
        RED,
    ))
    .with_buttons(vec![ButtonSpec::new(ENABLE, "✅ Re-enable", ButtonKind::Success)])
}

pub fn status_panel(settings: &WelcomeSettings) -> Panel {
    let color = if settings.enabled { GREEN } else { RED };
    let channel = settings
        .channel_id
        .map(|id| format!("<#{id}>"))
        .unwrap_or_else(|| "Not configured".to_string());

    let embed = EmbedSpec::new("⚙️ Welcome message settings", "", color)
        .field(
            "📊 Status",
            if settings.enabled { "✅ Enabled" } else { "❌ Disabled" },
            true,
        )
        .field("📣 Channel", channel, true)
        .field("🎨 Colour", settings.embed_color.clone(), true)
        .field("📝 Message", message_field(&settings.message), false)
        .field(
            "🖼️ Welcome card",
            if settings.with_image { "✅ Enabled" } else { "❌ Disabled" },
            true,
        );

    let panel = Panel::embed(embed);
    if settings.enabled {
        panel.with_buttons(vec![
            ButtonSpec::new(CUSTOMIZE, "✏️ Customize", ButtonKind::Primary),
            ButtonSpec::new(TEST, "🧪 Test", ButtonKind::Secondary),
        ])
    } else {
        panel
    }
}

/// The template in a code block, clipped to fit a field
fn message_field(message: &str) -> String {
    const FENCE: &str = "```";
    let room = FIELD_LIMIT - 2 * FENCE.len();
    if message.chars().count() <= room {
        return format!("{FENCE}{message}{FENCE}");
    }
    let clipped: String = message.chars().take(room - 1).collect();
    format!("{FENCE}{clipped}…{FENCE}")
}

pub fn customize_panel(draft: &WelcomeSettings) -> Panel {
    let (image_label, image_kind) = if draft.with_image {
        ("🖼️ Disable card", ButtonKind::Danger)
    } else {
        ("🖼️ Enable card", ButtonKind::Success)
    };

    Panel::embed(
        EmbedSpec::new(
            "✏️ Customize the welcome message",
            "### Available placeholders:\n\
             - `{user}` mentions the new member\n\
             - `{username}` shows the member's name without a mention\n\
             - `{server}` shows the server name\n\
             - `{memberCount}` shows the member count\n\
             - `{date}` shows the arrival date\n\
             - `{year}` shows the current year",
            BLURPLE,
        )
        .footer("Changes apply once you press Save"),
    )
    .with_buttons(vec![
        ButtonSpec::new(EDIT_MESSAGE, "📝 Message", ButtonKind::Primary),
        ButtonSpec::new(EDIT_COLOR, "🎨 Colour", ButtonKind::Primary),
        ButtonSpec::new(TOGGLE_IMAGE, image_label, image_kind),
        ButtonSpec::new(SAVE, "💾 Save", ButtonKind::Success),
    ])
}

pub fn saved_panel() -> Panel {
    Panel::embed(EmbedSpec::new(
        "✅ Settings saved",
        "The welcome message settings have been saved.",
        GREEN,
    ))
}

pub fn message_modal(draft: &WelcomeSettings) -> ModalSpec {
    ModalSpec::new(
        MESSAGE_MODAL,
        "Edit the welcome message",
        vec![
            InputSpec::paragraph(INPUT_MESSAGE, "Welcome message")
                .placeholder("Example: Welcome {user} to {server}!")
                .value(draft.message.clone())
                .length(1, 2000),
            InputSpec::short(INPUT_TITLE, "Embed title")
                .placeholder("Example: New member!")
                .value(draft.embed_title.clone())
                .length(1, 256),
            InputSpec::paragraph(INPUT_DESCRIPTION, "Embed description")
                .value(draft.embed_description.clone())
                .length(1, 4000),
            InputSpec::short(INPUT_FOOTER, "Embed footer")
                .placeholder("Example: Joined on {date}")
                .value(draft.embed_footer.clone())
                .length(1, 2048),
        ],
    )
}

pub fn color_modal(draft: &WelcomeSettings) -> ModalSpec {
    ModalSpec::new(
        COLOR_MODAL,
        "Edit the embed colour",
        vec![InputSpec::short(INPUT_COLOR, "Hex colour code")
            .placeholder("Example: #5865F2")
            .value(draft.embed_color.clone())
            .length(7, 7)],
    )
}

// ============================================================================
// Delivery
// ============================================================================

/// Runs `op` up to `attempts` times, sleeping `delay` between failures
pub async fn with_retries<T, E, F, Fut>(attempts: u32, delay: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!("[welcome] Attempt {attempt}/{attempts} failed: {e}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

pub async fn send_welcome(
    http: &Http,
    channel: ChannelId,
    message: &Panel,
    delivery: &WelcomeDeliveryConfig,
) -> Result<()> {
    with_retries(
        delivery.send_attempts,
        Duration::from_millis(delivery.retry_delay_ms),
        |attempt| async move {
            debug!("[welcome] Sending to {channel} (attempt {attempt})");
            channel
                .send_message(http, |m| message.fill_message(m))
                .await
        },
    )
    .await
    .with_context(|| format!("Failed to send welcome message to {channel}"))?;
    Ok(())
}

/// Member join: look up the guild's settings and post the welcome message
pub async fn on_member_join(
    http: &Http,
    store: &WelcomeStore,
    delivery: &WelcomeDeliveryConfig,
    member: &Member,
) -> Result<()> {
    let guild_id = member.guild_id;
    let Some(settings) = store.get(guild_id.0) else {
        debug!("[welcome] No settings for guild {guild_id}");
        return Ok(());
    };

    if !settings.enabled {
        debug!("[welcome] Disabled for guild {guild_id}");
        return Ok(());
    }

    let Some(channel_id) = settings.channel_id else {
        warn!("[welcome] Enabled without a channel in guild {guild_id}");
        return Ok(());
    };

    let channels = guild_id
        .channels(http)
        .await
        .context("Failed to list guild channels")?;

    let channel = ChannelId(channel_id);
    if !channels.contains_key(&channel) {
        store.disable(guild_id.0);
        warn!("[welcome] Channel {channel} is gone, disabled welcome messages for guild {guild_id}");
        return Ok(());
    }

    let guild = guild_id
        .to_partial_guild_with_counts(http)
        .await
        .context("Failed to fetch guild")?;

    let arrival = Arrival::from_member(member, &guild.name, guild.approximate_member_count, false);
    send_welcome(http, channel, &welcome_message(&settings, &arrival), delivery).await?;

    info!(
        "[welcome] Welcomed {} in guild {} ({})",
        member.user.name, guild.name, guild_id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn arrival(is_test: bool) -> Arrival {
        Arrival {
            user_id: 42,
            username: "ada lovelace".to_string(),
            avatar_url: "https://cdn.discordapp.com/embed/avatars/0.png".to_string(),
            account_created: Some(Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap()),
            server: "Rust & Friends".to_string(),
            member_count: Some(128),
            is_test,
            at: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
        }
    }

    // ============================================================================
    // Store
    // ============================================================================

    #[test]
    fn test_enable_disable_reenable() {
        let store = WelcomeStore::new();
        assert_eq!(store.get(1), None);
        assert!(!store.disable(1));
        assert_eq!(store.reenable(1), None);

        let settings = store.enable(1, 500);
        assert!(settings.enabled);
        assert_eq!(settings.channel_id, Some(500));

        assert!(store.disable(1));
        assert!(!store.disable(1));
        assert_eq!(store.get(1).map(|s| s.channel_id), Some(Some(500)));

        assert_eq!(store.reenable(1), Some(500));
        assert!(store.settings(1).enabled);
    }

    #[test]
    fn test_guilds_are_isolated() {
        let store = WelcomeStore::new();
        store.enable(1, 10);
        assert_eq!(store.settings(2), WelcomeSettings::default());
    }

    #[test]
    fn test_draft_commits_only_on_save() {
        let store = WelcomeStore::new();
        store.enable(1, 10);

        store.begin_draft(1, 7);
        store
            .edit_draft(1, 7, |d| {
                d.embed_color = "#FF0000".to_string();
                d.with_image = false;
                d.enabled = false;
            })
            .unwrap();
        assert_eq!(store.settings(1).embed_color, "#5865F2");

        let saved = store.save_draft(1, 7).unwrap();
        assert_eq!(saved.embed_color, "#FF0000");
        assert!(!saved.with_image);
        // enablement is not part of a draft
        assert!(saved.enabled);
        assert_eq!(store.draft(1, 7), None);
        assert_eq!(store.save_draft(1, 7), None);
    }

    #[test]
    fn test_edit_without_draft() {
        let store = WelcomeStore::new();
        assert_eq!(store.edit_draft(1, 1, |d| d.with_image = false), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_drafts_expire() {
        let store = WelcomeStore::new();
        store.begin_draft(1, 7);
        store.begin_draft(1, 8);

        tokio::time::advance(Duration::from_secs(10 * 60)).await;
        // touching a draft keeps it alive
        assert!(store.edit_draft(1, 8, |d| d.with_image = false).is_some());

        tokio::time::advance(Duration::from_secs(6 * 60)).await;
        assert_eq!(store.draft(1, 7), None);
        assert_eq!(store.save_draft(1, 7), None);
        assert!(store.draft(1, 8).is_some());

        // a new editor sweeps what is left behind
        store.begin_draft(2, 9);
        assert_eq!(store.draft_count(), 2);

        tokio::time::advance(DRAFT_TTL).await;
        assert_eq!(store.prune_drafts(), 2);
        assert_eq!(store.draft_count(), 0);
    }

    // ============================================================================
    // Templates
    // ============================================================================

    #[test]
    fn test_render_all_placeholders() {
        let rendered = render_template(
            "{user}|{username}|{server}|{memberCount}|{date}|{test}|{year}",
            &arrival(true),
        );
        assert_eq!(
            rendered,
            "<@42>|ada lovelace|Rust & Friends|128|9 March 2024|(TEST)|2024"
        );
    }

    #[test]
    fn test_render_repeated_and_unknown() {
        let mut a = arrival(false);
        a.member_count = None;
        assert_eq!(
            render_template("{username} {username} {test}{nope} {memberCount}", &a),
            "ada lovelace ada lovelace {nope} ?"
        );
    }

    #[test]
    fn test_card_url_is_encoded() {
        let url = welcome_card_url(&arrival(false)).unwrap();
        assert!(url.starts_with("https://api.popcat.xyz/welcomecard?"));
        assert!(url.contains("text1=ada+lovelace"));
        assert!(url.contains("text2=Welcome+to+Rust+%26+Friends"));
        assert!(url.contains("text3=Member+%23128"));

        let parsed = Url::parse(&url).unwrap();
        let avatar = parsed
            .query_pairs()
            .find(|(k, _)| k == "avatar")
            .map(|(_, v)| v.into_owned());
        assert_eq!(avatar.as_deref(), Some("https://cdn.discordapp.com/embed/avatars/0.png"));
    }

    #[test]
    fn test_welcome_message_layout() {
        let settings = WelcomeSettings::default();
        let panel = welcome_message(&settings, &arrival(true));

        assert!(panel.content.unwrap().contains("<@42>"));
        let embed = panel.embed.unwrap();
        assert_eq!(embed.color, BLURPLE);
        assert!(embed.image.is_some());
        assert_eq!(embed.footer.as_deref(), Some("👋 ada lovelace joined on 9 March 2024"));
        assert_eq!(embed.fields[0].value, "2 January 2020");
        assert_eq!(embed.fields.last().unwrap().name, "🧪 Test");
    }

    #[test]
    fn test_welcome_message_without_image_and_bad_color() {
        let settings = WelcomeSettings {
            with_image: false,
            embed_color: "red".to_string(),
            ..WelcomeSettings::default()
        };
        let embed = welcome_message(&settings, &arrival(false)).embed.unwrap();
        assert!(embed.image.is_none());
        assert_eq!(embed.color, BLURPLE);
        assert_eq!(embed.fields.len(), 1);
    }

    #[test]
    fn test_status_panel_buttons_follow_state() {
        let mut settings = WelcomeSettings::default();
        assert!(status_panel(&settings).buttons.is_empty());

        settings.enabled = true;
        settings.channel_id = Some(9);
        let panel = status_panel(&settings);
        assert_eq!(panel.button_ids(), vec![CUSTOMIZE, TEST]);
        assert_eq!(panel.embed.unwrap().fields[1].value, "<#9>");
    }

    #[test]
    fn test_status_panel_clips_long_message() {
        let mut settings = WelcomeSettings::default();
        settings.message = "w".repeat(2000);

        let embed = status_panel(&settings).embed.unwrap();
        let value = &embed.fields[3].value;
        assert_eq!(value.chars().count(), 1024);
        assert!(value.starts_with("```www"));
        assert!(value.ends_with("…```"));

        settings.message = "Hi {user}".to_string();
        let embed = status_panel(&settings).embed.unwrap();
        assert_eq!(embed.fields[3].value, "```Hi {user}```");
    }

    #[test]
    fn test_customize_panel_image_toggle_label() {
        let mut draft = WelcomeSettings::default();
        assert_eq!(customize_panel(&draft).buttons[2].kind, ButtonKind::Danger);
        draft.with_image = false;
        assert_eq!(customize_panel(&draft).buttons[2].kind, ButtonKind::Success);
    }

    #[test]
    fn test_modals_prefill_draft() {
        let draft = WelcomeSettings::default();
        let modal = message_modal(&draft);
        assert_eq!(modal.inputs.len(), 4);
        assert_eq!(modal.inputs[1].value.as_deref(), Some("🎉 New member • Welcome!"));

        let color = color_modal(&draft);
        assert_eq!(color.inputs[0].min_length, Some(7));
        assert_eq!(color.inputs[0].value.as_deref(), Some("#5865F2"));
    }

    // ============================================================================
    // Delivery
    // ============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = with_retries(3, Duration::from_secs(1), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(format!("fail {attempt}"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_give_up() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();
        let result: Result<(), String> = with_retries(3, Duration::from_secs(1), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("down".to_string()) }
        })
        .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
