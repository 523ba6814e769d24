//! # Feature: Latency & Process Diagnostics
//!
//! Backs `/ping`: latency grading, uptime formatting, process memory and
//! build information.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

use crate::panels::{ButtonKind, ButtonSpec, EmbedSpec, Panel, BLURPLE, GREEN, GREY, RED, YELLOW};
use once_cell::sync::Lazy;
use std::time::{Duration, Instant};
use sysinfo::System;

pub const PING_REFRESH: &str = "ping_refresh";
pub const PING_DETAILS: &str = "ping_details";

static STARTED: Lazy<Instant> = Lazy::new(Instant::now);

/// Pins the uptime origin; call once at startup
pub fn mark_start() {
    Lazy::force(&STARTED);
}

pub fn uptime() -> Duration {
    STARTED.elapsed()
}

/// `"{d}d {h}h {m}m {s}s"`, zero parts left out
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let days = total / 86_400;
    let hours = (total / 3_600) % 24;
    let minutes = (total / 60) % 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl LatencyGrade {
    pub fn from_millis(ms: u128) -> Self {
        match ms {
            0..=99 => LatencyGrade::Excellent,
            100..=199 => LatencyGrade::Good,
            200..=399 => LatencyGrade::Fair,
            _ => LatencyGrade::Poor,
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            LatencyGrade::Excellent => GREEN,
            LatencyGrade::Good => YELLOW,
            LatencyGrade::Fair => RED,
            LatencyGrade::Poor => GREY,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LatencyGrade::Excellent => "🟢",
            LatencyGrade::Good => "🟡",
            LatencyGrade::Fair => "🔴",
            LatencyGrade::Poor => "⚫",
        }
    }
}

/// Which latency `/ping` reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PingKind {
    Api,
    Ws,
    #[default]
    Both,
}

impl PingKind {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("api") => PingKind::Api,
            Some("ws") => PingKind::Ws,
            _ => PingKind::Both,
        }
    }
}

/// One latency measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingReading {
    /// Gateway heartbeat round trip, unknown before the first heartbeat ack
    pub gateway: Option<Duration>,
    /// REST round trip measured around the reply
    pub rest: Duration,
}

fn millis(latency: Option<Duration>) -> String {
    latency
        .map(|d| format!("{}ms", d.as_millis()))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn ping_panel(kind: PingKind, reading: PingReading, memory_mb: f64, uptime: Duration) -> Panel {
    let gateway_ms = reading.gateway.map(|d| d.as_millis());
    let rest_ms = reading.rest.as_millis();

    let (description, graded) = match kind {
        PingKind::Api => (
            format!("🌐 **API**: {}", millis(reading.gateway)),
            gateway_ms.unwrap_or(rest_ms),
        ),
        PingKind::Ws => (format!("🔌 **WebSocket**: {rest_ms}ms"), rest_ms),
        PingKind::Both => (
            format!(
                "🌐 **API**: {}\n🔌 **Message**: {rest_ms}ms\n⏱️ **Total**: {}ms",
                millis(reading.gateway),
                gateway_ms.unwrap_or(0) + rest_ms
            ),
            gateway_ms.unwrap_or(0).max(rest_ms),
        ),
    };

    let grade = LatencyGrade::from_millis(graded);
    let embed = EmbedSpec::new(
        format!("{} Latency check", grade.emoji()),
        description,
        grade.color(),
    )
    .field(
        "📊 System",
        format!(
            "💾 **Memory**: {memory_mb:.2}MB\n⏰ **Uptime**: {}",
            format_uptime(uptime)
        ),
        false,
    )
    .footer("Latency check completed");

    Panel::embed(embed).with_buttons(vec![
        ButtonSpec::new(PING_REFRESH, "🔄 Run again", ButtonKind::Primary),
        ButtonSpec::new(PING_DETAILS, "📋 Technical details", ButtonKind::Secondary),
    ])
}

/// Process memory and identity read through sysinfo
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessStats {
    pub pid: u32,
    pub resident_mb: f64,
    pub virtual_mb: f64,
}

pub fn process_stats() -> Option<ProcessStats> {
    let pid = sysinfo::get_current_pid().ok()?;
    let system = System::new_all();
    let process = system.process(pid)?;

    Some(ProcessStats {
        pid: pid.as_u32(),
        resident_mb: process.memory() as f64 / 1024.0 / 1024.0,
        virtual_mb: process.virtual_memory() as f64 / 1024.0 / 1024.0,
    })
}

/// Commit hash embedded by the build script, if any
pub fn build_commit() -> &'static str {
    match env!("GIT_COMMIT_HASH") {
        "" => "unknown",
        hash => hash,
    }
}

pub fn details_panel(stats: Option<&ProcessStats>, shards: u32, guilds: usize) -> Panel {
    let process = match stats {
        Some(stats) => format!(
            "**PID**: {}\n**Platform**: {}\n**Rust**: {}",
            stats.pid,
            std::env::consts::OS,
            rustc_version_runtime::version()
        ),
        None => format!(
            "**Platform**: {}\n**Rust**: {}",
            std::env::consts::OS,
            rustc_version_runtime::version()
        ),
    };

    let memory = match stats {
        Some(stats) => format!(
            "**RSS**: {:.2}MB\n**Virtual**: {:.2}MB",
            stats.resident_mb, stats.virtual_mb
        ),
        None => "unavailable".to_string(),
    };

    let embed = EmbedSpec::new("📋 Technical details", "", BLURPLE)
        .field("🖥️ Process", process, true)
        .field("📈 Memory", memory, true)
        .field(
            "🤖 Bot",
            format!(
                "**Version**: v{} ({})\n**Shards**: {shards}\n**Servers**: {guilds}",
                env!("CARGO_PKG_VERSION"),
                build_commit()
            ),
            false,
        );

    Panel::embed(embed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::ZERO), "0s");
        assert_eq!(format_uptime(Duration::from_secs(59)), "59s");
        assert_eq!(format_uptime(Duration::from_secs(60)), "1m");
        assert_eq!(format_uptime(Duration::from_secs(3_661)), "1h 1m 1s");
        assert_eq!(format_uptime(Duration::from_secs(90_000)), "1d 1h");
        assert_eq!(format_uptime(Duration::from_millis(1_999)), "1s");
    }

    #[test]
    fn test_latency_grades() {
        assert_eq!(LatencyGrade::from_millis(0), LatencyGrade::Excellent);
        assert_eq!(LatencyGrade::from_millis(99), LatencyGrade::Excellent);
        assert_eq!(LatencyGrade::from_millis(100), LatencyGrade::Good);
        assert_eq!(LatencyGrade::from_millis(399), LatencyGrade::Fair);
        assert_eq!(LatencyGrade::from_millis(400), LatencyGrade::Poor);
        assert_eq!(LatencyGrade::Good.color(), 0xFAA61A);
        assert_eq!(LatencyGrade::Poor.emoji(), "⚫");
    }

    #[test]
    fn test_ping_kind_parse() {
        assert_eq!(PingKind::parse(Some("api")), PingKind::Api);
        assert_eq!(PingKind::parse(Some("ws")), PingKind::Ws);
        assert_eq!(PingKind::parse(Some("both")), PingKind::Both);
        assert_eq!(PingKind::parse(None), PingKind::Both);
    }

    #[test]
    fn test_both_grades_on_worst_latency() {
        let reading = PingReading {
            gateway: Some(Duration::from_millis(50)),
            rest: Duration::from_millis(250),
        };
        let panel = ping_panel(PingKind::Both, reading, 12.0, Duration::from_secs(5));
        let embed = panel.embed.as_ref().unwrap();

        assert_eq!(embed.color, RED);
        assert!(embed.description.contains("**Total**: 300ms"));
        assert!(embed.fields[0].value.contains("12.00MB"));
        assert_eq!(panel.button_ids(), vec![PING_REFRESH, PING_DETAILS]);
    }

    #[test]
    fn test_api_without_heartbeat_falls_back() {
        let reading = PingReading {
            gateway: None,
            rest: Duration::from_millis(20),
        };
        let panel = ping_panel(PingKind::Api, reading, 1.0, Duration::ZERO);
        let embed = panel.embed.unwrap();
        assert!(embed.description.contains("n/a"));
        assert_eq!(embed.color, GREEN);
    }

    #[test]
    fn test_details_panel_without_stats() {
        let panel = details_panel(None, 1, 3);
        let embed = panel.embed.unwrap();
        assert_eq!(embed.fields.len(), 3);
        assert_eq!(embed.fields[1].value, "unavailable");
        assert!(embed.fields[2].value.contains("**Servers**: 3"));
    }

    #[test]
    fn test_process_stats_for_self() {
        if let Some(stats) = process_stats() {
            assert_eq!(stats.pid, std::process::id());
            assert!(stats.resident_mb >= 0.0);
        }
    }
}
