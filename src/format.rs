use chrono::{NaiveDate, NaiveDateTime};

/// Longest description shown in a list cell before it is cut.
pub const TRUNCATE_LENGTH: usize = 50;
pub const MISSING: &str = "N/A";

const DISPLAY_TIMESTAMP: &str = "%b %-d, %Y %H:%M";
const DISPLAY_DATE: &str = "%b %-d, %Y";

/// Cuts at `limit` characters, not bytes, and marks the cut with `...`.
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn or_missing(value: Option<&str>) -> &str {
    match value {
        Some(text) if !text.is_empty() => text,
        _ => MISSING,
    }
}

pub fn format_timestamp(value: Option<&NaiveDateTime>) -> String {
    value.map_or_else(|| MISSING.to_string(), |at| at.format(DISPLAY_TIMESTAMP).to_string())
}

pub fn format_date(value: Option<NaiveDate>) -> String {
    value.map_or_else(|| MISSING.to_string(), |day| day.format(DISPLAY_DATE).to_string())
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_text_alone() {
        let exactly = "x".repeat(TRUNCATE_LENGTH);
        assert_eq!(truncate(&exactly, TRUNCATE_LENGTH), exactly);
        assert_eq!(truncate("short", TRUNCATE_LENGTH), "short");
    }

    #[test]
    fn truncate_cuts_mid_word() {
        let long = "Quarterly review of the enterprise support contract renewal terms";
        let cut = truncate(long, TRUNCATE_LENGTH);
        assert_eq!(cut, format!("{}...", &long[..50]));
        assert_eq!(cut.chars().count(), 53);
    }

    #[test]
    fn truncate_counts_characters() {
        let text = "é".repeat(60);
        assert_eq!(truncate(&text, TRUNCATE_LENGTH), format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn missing_values_render_na() {
        assert_eq!(format_timestamp(None), "N/A");
        assert_eq!(format_date(None), "N/A");
        assert_eq!(or_missing(Some("")), "N/A");
        assert_eq!(or_missing(Some("+1 555")), "+1 555");
        let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(format_date(Some(day)), "Jan 5, 2026");
        assert_eq!(format_timestamp(day.and_hms_opt(9, 7, 0).as_ref()), "Jan 5, 2026 09:07");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }
}
