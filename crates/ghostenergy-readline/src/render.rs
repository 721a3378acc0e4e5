//! Plain-text rendering of store state.

use chrono::{DateTime, TimeZone};
use colored::Colorize;
use ghostenergy_core::chat::{ChatMessage, ChatSession, format_relative_time, group_by_recency};
use ghostenergy_core::dashboard::SiteSnapshot;
use std::fmt::Display;

/// Dashboard summary lines for a snapshot.
pub fn snapshot_lines(snapshot: &SiteSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    if snapshot.is_loading {
        lines.push(format!("Loading {}...", snapshot.site_id).yellow().to_string());
    }
    if !snapshot.error_message.is_empty() {
        lines.push(snapshot.error_message.red().to_string());
    }
    if snapshot.site_id.is_empty() {
        lines.push("No site loaded".bright_black().to_string());
        return lines;
    }

    lines.push(format!("Sede {}", snapshot.site_id).bold().to_string());
    match &snapshot.kpis {
        Some(kpi) => {
            lines.push(format!("  Consumo total:        {:.1} kWh", kpi.total_kwh));
            lines.push(format!(
                "  Eficiencia:           {:.1}% (meta {:.1}%)",
                kpi.efficiency, kpi.efficiency_target
            ));
            lines.push(format!("  Anomalías críticas:   {}", kpi.critical_anomalies));
        }
        None => lines.push("  Sin KPIs".bright_black().to_string()),
    }
    lines.push(format!(
        "  {} días de consumo, {} lecturas por sector",
        snapshot.daily_consumption.len(),
        snapshot.sector_consumption.len()
    ));
    lines.push(format!(
        "  {} anomalías ({} críticas), {} recomendaciones",
        snapshot.anomalies.len(),
        snapshot.critical_anomaly_count(),
        snapshot.recommendations.len()
    ));
    for text in snapshot
        .recommendations
        .iter()
        .filter_map(|r| r.ai_recommendation.as_deref())
        .take(3)
    {
        lines.push(format!("  - {}", text).bright_blue().to_string());
    }
    lines
}

/// The chat sidebar: sessions grouped by recency with relative ages.
pub fn session_lines<Tz>(sessions: &[ChatSession], active_id: Option<&str>, now: &DateTime<Tz>) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let groups = group_by_recency(sessions, now);
    let mut lines = Vec::new();

    for (label, bucket) in [
        ("Hoy", &groups.today),
        ("Ayer", &groups.yesterday),
        ("Esta semana", &groups.this_week),
    ] {
        if bucket.is_empty() {
            continue;
        }
        lines.push(label.bold().to_string());
        for session in bucket {
            let marker = if Some(session.id.as_str()) == active_id { "*" } else { " " };
            lines.push(format!(
                " {} {}  {}  {}",
                marker,
                short_id(&session.id),
                session.title,
                format_relative_time(&session.created_at, now).bright_black()
            ));
        }
    }

    let hidden = sessions.len() - groups.len();
    if hidden > 0 {
        lines.push(format!("({} older chats not shown)", hidden).bright_black().to_string());
    }
    if lines.is_empty() {
        lines.push("No chats yet. Type a question or /new.".bright_black().to_string());
    }
    lines
}

pub fn message_line(message: &ChatMessage) -> String {
    if message.is_user() {
        format!("> {}", message.text).green().to_string()
    } else {
        message.text.bright_blue().to_string()
    }
}

/// First eight characters of an id, enough to pick a session with `/open`.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
