use chrono::{DateTime, Utc};

/// Format a byte count for display ("512 Bytes", "1.21 MB").
pub fn format_file_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes <= 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        let rounded = format!("{:.2}", value);
        let rounded = rounded.trim_end_matches('0').trim_end_matches('.');
        format!("{} {}", rounded, UNITS[unit])
    }
}

/// Format an upload timestamp as a relative age ("5 minutes ago",
/// "Yesterday", "3 weeks ago"). Unparseable input is returned as-is.
pub fn format_upload_age(uploaded_at: &str) -> String {
    match DateTime::parse_from_rfc3339(uploaded_at) {
        Ok(dt) => relative_age(dt.with_timezone(&Utc), Utc::now()),
        Err(_) => uploaded_at.to_string(),
    }
}

fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now - then;
    let minutes = delta.num_minutes().max(0);
    let hours = delta.num_hours();
    let days = delta.num_days();

    if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days == 1 {
        "Yesterday".to_string()
    } else if days < 7 {
        format!("{} days ago", days)
    } else if days < 30 {
        plural(days / 7, "week")
    } else {
        plural(days / 30, "month")
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Human-readable name for the well-known facet colors; other values are
/// shown as their raw hex code.
pub fn color_name(hex: &str) -> &str {
    match hex.to_ascii_uppercase().as_str() {
        "#EF4444" => "Red",
        "#3B82F6" => "Blue",
        "#10B981" => "Green",
        "#F59E0B" => "Yellow",
        "#8B5CF6" => "Purple",
        "#F97316" => "Orange",
        "#1F2937" => "Black",
        "#F3F4F6" => "White",
        _ => hex,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_268_000), "1.21 MB");
    }

    #[test]
    fn test_relative_age() {
        let now = Utc::now();
        assert_eq!(relative_age(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_age(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(relative_age(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(relative_age(now - Duration::days(1), now), "Yesterday");
        assert_eq!(relative_age(now - Duration::days(4), now), "4 days ago");
        assert_eq!(relative_age(now - Duration::days(14), now), "2 weeks ago");
        assert_eq!(relative_age(now - Duration::days(90), now), "3 months ago");
    }

    #[test]
    fn test_format_upload_age_passes_through_unparseable() {
        assert_eq!(format_upload_age("not-a-date"), "not-a-date");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
    }

    #[test]
    fn test_color_name() {
        assert_eq!(color_name("#ef4444"), "Red");
        assert_eq!(color_name("#1F2937"), "Black");
        assert_eq!(color_name("#ABCDEF"), "#ABCDEF");
    }
}
