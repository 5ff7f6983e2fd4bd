//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(minute|hour|day)s?\s+ago$").expect("relative time regex is valid")
});

/// Pre-compiled regex for a wall-clock time today.
static CLOCK_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("clock time regex is valid"));

/// Conservative bound for relative times (~10 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 10 * 365 * 24 * 60;

/// Parses a user-supplied event time relative to `now`.
///
/// Supports:
/// - RFC 3339: "2025-03-08T10:30:00-03:00"
/// - Wall clock today, in `now`'s offset: "14:30"
/// - Relative: "20 minutes ago", "2 hours ago", "1 day ago"
pub fn parse_at(s: &str, now: DateTime<FixedOffset>) -> Result<DateTime<FixedOffset>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }

    if let Some(caps) = CLOCK_TIME_RE.captures(s) {
        let hour: u32 = caps[1].parse().context("failed to parse hour")?;
        let minute: u32 = caps[2].parse().context("failed to parse minute")?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .with_context(|| format!("invalid time of day: {s}"))?;
        return at_local(now.date_naive(), time, *now.offset());
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid time: {s}. Use RFC 3339 (e.g., 2025-03-08T10:30:00-03:00), HH:MM, or relative (e.g., '20 minutes ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;
    let minutes_per_unit = match &caps[2] {
        "minute" => 1,
        "hour" => 60,
        "day" => 60 * 24,
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };
    if n > MAX_RELATIVE_MINUTES / minutes_per_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::minutes(n * minutes_per_unit))
}

/// Combines a date and wall-clock time in a fixed offset.
fn at_local(
    day: NaiveDate,
    time: NaiveTime,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>> {
    offset
        .from_local_datetime(&day.and_time(time))
        .single()
        .with_context(|| format!("{day} {time} does not exist in offset {offset}"))
}

/// Midnight at the start of `now`'s local day.
pub fn start_of_day(now: DateTime<FixedOffset>) -> Result<DateTime<FixedOffset>> {
    at_local(now.date_naive(), NaiveTime::MIN, *now.offset())
}

/// Formats minutes as a duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
#[allow(clippy::cast_possible_truncation)]
pub fn format_minutes(minutes: f64) -> String {
    if minutes <= 0.0 {
        return "0m".to_string();
    }
    let total = minutes.round() as i64;
    let hours = total / 60;
    let rest = total % 60;
    if hours >= 1 {
        format!("{hours}h {rest}m")
    } else {
        format!("{rest}m")
    }
}

/// Generates a 10-character progress bar.
/// Non-zero values below 5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: u64, max: u64) -> String {
    if max == 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Formats a timestamp for human-readable output.
pub fn format_time(ts: DateTime<FixedOffset>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2025-03-08T12:00:00-03:00").unwrap()
    }

    #[test]
    fn parses_rfc3339_keeping_offset() {
        let dt = parse_at("2025-03-07T22:15:00+01:00", now()).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn parses_clock_time_in_current_offset() {
        let dt = parse_at("07:45", now()).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-03-08T07:45:00-03:00");
        assert!(parse_at("25:00", now()).is_err());
    }

    #[test]
    fn parses_relative_times() {
        assert_eq!(
            parse_at("20 minutes ago", now()).unwrap(),
            now() - Duration::minutes(20)
        );
        assert_eq!(parse_at("1 hour ago", now()).unwrap(), now() - Duration::hours(1));
        assert_eq!(parse_at("2 days ago", now()).unwrap(), now() - Duration::days(2));
    }

    #[test]
    fn rejects_garbage_and_overflow() {
        assert!(parse_at("yesterday", now()).is_err());
        assert!(parse_at("99999999999 days ago", now()).is_err());
    }

    #[test]
    fn start_of_day_uses_local_midnight() {
        assert_eq!(
            start_of_day(now()).unwrap().to_rfc3339(),
            "2025-03-08T00:00:00-03:00"
        );
    }

    #[test]
    fn format_minutes_matches_duration_style() {
        assert_eq!(format_minutes(0.0), "0m");
        assert_eq!(format_minutes(-5.0), "0m");
        assert_eq!(format_minutes(45.0), "45m");
        assert_eq!(format_minutes(150.0), "2h 30m");
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0, 7), "░░░░░░░░░░");
        assert_eq!(progress_bar(1, 100), "█░░░░░░░░░");
        assert_eq!(progress_bar(50, 100), "█████░░░░░");
        assert_eq!(progress_bar(300, 200), "██████████");
    }
}
