use std::time::Duration;

use regex::Regex;

const DURATION_PATTERN: &str = r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|ms|s|m|h))+$";
const COMPONENT_PATTERN: &str = r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|s|m|h)";

/// Parse a duration such as `1h30m`, `45s` or `1.5s`.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let input = raw.trim();
    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let whole = Regex::new(DURATION_PATTERN).map_err(|e| e.to_string())?;
    if !whole.is_match(input) {
        return Err(format!("invalid duration {:?}", raw));
    }

    let component = Regex::new(COMPONENT_PATTERN).map_err(|e| e.to_string())?;
    let mut nanos = 0f64;

    for caps in component.captures_iter(input) {
        let value: f64 = caps[1]
            .parse()
            .map_err(|_| format!("invalid duration {:?}", raw))?;
        let unit = match &caps[2] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            _ => 3600e9,
        };
        nanos += value * unit;
    }

    if nanos > u64::MAX as f64 {
        return Err(format!("duration {:?} is too long", raw));
    }

    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Render a duration as `1h2m3s`, `1m30s`, `1.5s`, `500ms` or `250µs`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let nanos = duration.subsec_nanos();

    if total == 0 {
        return match nanos {
            0 => "0s".to_string(),
            1..=999 => format!("{}ns", nanos),
            1_000..=999_999 => decimal(u64::from(nanos / 1_000), nanos % 1_000, 3, "µs"),
            _ => decimal(u64::from(nanos / 1_000_000), nanos % 1_000_000, 6, "ms"),
        };
    }

    let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);
    let seconds = decimal(seconds, nanos, 9, "s");

    if hours > 0 {
        format!("{}h{}m{}", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}", minutes, seconds)
    } else {
        seconds
    }
}

/// `whole.fraction` with trailing zeros dropped, `fraction` being `width`
/// digits wide.
fn decimal(whole: u64, fraction: u32, width: usize, unit: &str) -> String {
    if fraction == 0 {
        return format!("{}{}", whole, unit);
    }
    let digits = format!("{:0width$}", fraction, width = width);
    format!("{}.{}{}", whole, digits.trim_end_matches('0'), unit)
}
