use chrono::{DateTime, Local, Utc};

/// Format a UTC timestamp in local time
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_deadline(deadline: Option<&DateTime<Utc>>) -> String {
    match deadline {
        Some(dt) => format!("deadline {}", format_datetime(dt)),
        None => "no deadline".to_string(),
    }
}

/// Truncate string to max length with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
