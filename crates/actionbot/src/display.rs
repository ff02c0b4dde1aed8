//! Terminal formatting helpers.

use chrono::{DateTime, FixedOffset, Local};

/// Parses a provider date, RFC 2822 first, then RFC 3339.
fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .or_else(|_| DateTime::parse_from_rfc3339(raw.trim()))
        .ok()
}

/// Formats a message date relative to `now`.
///
/// Under an hour: "5m ago"; under a day: "3h ago"; under a week: "2d ago";
/// older: the local calendar date. Unparseable dates are returned as is.
pub fn format_relative(raw: &str, now: DateTime<Local>) -> String {
    let Some(date) = parse_date(raw) else {
        return raw.to_string();
    };

    let elapsed = now.signed_duration_since(date);
    let minutes = elapsed.num_minutes().max(0);
    let hours = elapsed.num_hours().max(0);
    let days = elapsed.num_days().max(0);

    if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        date.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}

/// Display name of a "Name <email>" sender, or the address itself.
pub fn sender_name(from: &str) -> String {
    if let Some(start) = from.rfind('<')
        && from[start..].contains('>')
    {
        let name = from[..start].trim().trim_matches('"').trim();
        if !name.is_empty() {
            return name.to_string();
        }
        let end = from.rfind('>').unwrap_or(from.len());
        return from[start + 1..end].trim().to_string();
    }
    from.trim().to_string()
}

/// Cuts `text` to at most `width` characters, marking the cut with "…".
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Single-line classification progress.
pub fn progress_line(completed: usize, total: usize) -> String {
    format!("Classifying messages... {completed}/{total}")
}
