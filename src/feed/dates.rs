use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Date layouts seen in RSS `pubDate` fields, tried in this order.
///
/// The order follows how common each layout is among feed providers. Some
/// inputs are accepted by more than one layout, so the first match wins.
pub const DATE_FORMATS: [DateFormat; 3] = [
    DateFormat::Rfc1123,
    DateFormat::Rfc1123Z,
    DateFormat::Rfc3339,
];

/// Layouts after the `Mon, ` prefix. The weekday is checked for spelling
/// only and never against the date.
const RFC1123_LAYOUT: &str = "%d %b %Y %H:%M:%S";
const RFC1123Z_LAYOUT: &str = "%d %b %Y %H:%M:%S %z";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not parse date {raw:?}")]
pub struct DateParseError {
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `Mon, 02 Jan 2006 15:04:05 MST`
    Rfc1123,
    /// `Mon, 02 Jan 2006 15:04:05 -0700`
    Rfc1123Z,
    /// `2006-01-02T15:04:05Z07:00`
    Rfc3339,
}

impl DateFormat {
    /// Attempt this single layout.
    pub fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            DateFormat::Rfc1123 => parse_rfc1123_named_zone(raw),
            DateFormat::Rfc1123Z => {
                DateTime::parse_from_str(strip_weekday(raw)?, RFC1123Z_LAYOUT)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }
            DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Convert a raw feed date into a UTC instant using the first layout in
/// [`DATE_FORMATS`] that accepts it.
pub fn normalize_date(raw: &str) -> Result<DateTime<Utc>, DateParseError> {
    let trimmed = raw.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| format.parse(trimmed))
        .ok_or_else(|| DateParseError {
            raw: raw.to_string(),
        })
}

/// Drop a leading `Mon, ` after checking that it names a weekday.
fn strip_weekday(raw: &str) -> Option<&str> {
    let (weekday, rest) = raw.split_once(", ")?;
    WEEKDAYS
        .iter()
        .any(|day| day.eq_ignore_ascii_case(weekday))
        .then_some(rest)
}

fn parse_rfc1123_named_zone(raw: &str) -> Option<DateTime<Utc>> {
    let (datetime, zone) = strip_weekday(raw)?.rsplit_once(' ')?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let naive = NaiveDateTime::parse_from_str(datetime, RFC1123_LAYOUT).ok()?;
    let offset = zone_offset(zone)?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Offsets for the zone names RFC 2822 allows. Unknown abbreviations are
/// read as UTC.
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    let hours = match zone.to_ascii_uppercase().as_str() {
        "GMT" | "UT" | "UTC" | "Z" => 0,
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        _ => 0,
    };
    FixedOffset::east_opt(hours * 3600)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap()
    }

    #[test]
    fn test_all_formats_agree_on_instant() {
        let inputs = [
            "Mon, 02 Jan 2006 15:04:05 GMT",
            "Mon, 02 Jan 2006 15:04:05 +0000",
            "2006-01-02T15:04:05Z",
        ];

        for input in inputs {
            assert_eq!(normalize_date(input).unwrap(), reference_instant(), "{}", input);
        }
    }

    #[test]
    fn test_zone_offsets_are_applied() {
        assert_eq!(
            normalize_date("Mon, 02 Jan 2006 10:04:05 EST").unwrap(),
            reference_instant()
        );
        assert_eq!(
            normalize_date("Mon, 02 Jan 2006 08:04:05 -0700").unwrap(),
            reference_instant()
        );
        assert_eq!(
            normalize_date("2006-01-02T17:04:05+02:00").unwrap(),
            reference_instant()
        );
    }

    #[test]
    fn test_unknown_zone_abbreviation_reads_as_utc() {
        assert_eq!(
            normalize_date("Mon, 02 Jan 2006 15:04:05 XYZ").unwrap(),
            reference_instant()
        );
    }

    #[test]
    fn test_rfc3339_fractional_seconds() {
        let parsed = normalize_date("2006-01-02T15:04:05.250Z").unwrap();
        assert_eq!(parsed.timestamp(), reference_instant().timestamp());
        assert_eq!(parsed.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(
            normalize_date("\n  Mon, 02 Jan 2006 15:04:05 GMT  \n").unwrap(),
            reference_instant()
        );
    }

    #[test]
    fn test_unsupported_format_carries_input() {
        let err = normalize_date("next Tuesday").unwrap_err();
        assert_eq!(err.raw, "next Tuesday");
        assert!(err.to_string().contains("next Tuesday"));

        assert!(normalize_date("").is_err());
        assert!(normalize_date("2006-01-02").is_err());
    }

    #[test]
    fn test_formats_are_tried_in_priority_order() {
        assert_eq!(
            DATE_FORMATS,
            [DateFormat::Rfc1123, DateFormat::Rfc1123Z, DateFormat::Rfc3339]
        );
    }

    #[test]
    fn test_each_format_in_isolation() {
        let named = "Mon, 02 Jan 2006 15:04:05 GMT";
        let numeric = "Mon, 02 Jan 2006 15:04:05 +0000";
        let iso = "2006-01-02T15:04:05Z";

        assert!(DateFormat::Rfc1123.parse(named).is_some());
        assert!(DateFormat::Rfc1123.parse(numeric).is_none());
        assert!(DateFormat::Rfc1123.parse(iso).is_none());

        assert!(DateFormat::Rfc1123Z.parse(numeric).is_some());
        assert!(DateFormat::Rfc1123Z.parse(named).is_none());

        assert!(DateFormat::Rfc3339.parse(iso).is_some());
        assert!(DateFormat::Rfc3339.parse(named).is_none());
    }

    #[test]
    fn test_wrong_weekday_is_tolerated() {
        // 2 Jan 2006 was a Monday
        assert_eq!(
            normalize_date("Sun, 02 Jan 2006 15:04:05 GMT").unwrap(),
            reference_instant()
        );
        assert_eq!(
            normalize_date("Tue, 02 Jan 2006 15:04:05 +0000").unwrap(),
            reference_instant()
        );
    }

    #[test]
    fn test_weekday_must_be_spelled_correctly() {
        assert!(normalize_date("Xyz, 02 Jan 2006 15:04:05 GMT").is_err());
        assert!(normalize_date("Monday, 02 Jan 2006 15:04:05 +0000").is_err());
        assert!(normalize_date("02 Jan 2006 15:04:05 GMT").is_err());
    }
}
