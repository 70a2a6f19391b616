//! Date handling shared by the API and the views.
//!
//! Timestamps travel as `YYYY-MM-DD HH:MM` and due dates as `YYYY-MM-DD`.
//! Everything is naive server-local time.

use chrono::{Local, NaiveDate, NaiveDateTime};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Value format of an `<input type="datetime-local">`.
pub const INPUT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

const ACCEPTED_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Server-local wall clock. Activity dates arrive from `datetime-local`
/// inputs in local time, so `created_at` uses the same clock to keep the
/// two comparable.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Parses an ISO-like date or datetime. A bare date means midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    ACCEPTED_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_datetime(value).map(|datetime| datetime.date())
}

pub mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_datetime(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

pub mod optional_date {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_date(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {raw}"))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_form_and_wire_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 4)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime("2026-03-04T09:30"), Some(expected));
        assert_eq!(parse_datetime("2026-03-04 09:30"), Some(expected));
        assert_eq!(parse_datetime("2026-03-04T09:30:00"), Some(expected));
    }

    #[test]
    fn bare_date_is_midnight() {
        let parsed = parse_datetime("2026-03-04").expect("date should parse");
        assert_eq!(parsed.format(TIMESTAMP_FORMAT).to_string(), "2026-03-04 00:00");
        assert_eq!(parse_date("2026-03-04T18:00"), NaiveDate::from_ymd_opt(2026, 3, 4));
    }

    #[test]
    fn rejects_garbage_and_blank() {
        assert_eq!(parse_datetime("next tuesday"), None);
        assert_eq!(parse_datetime("   "), None);
        assert_eq!(parse_date("2026-13-40"), None);
    }
}
