use chrono::{DateTime, Duration, Utc};

use crate::video::PublishedTime;

/// Parse a humanized view count ("1.2M views", "500,000 vues") into a plain
/// number. Locale words and separators are stripped, k/m/b suffixes scale by
/// 1e3/1e6/1e9, and fractional counts truncate. Anything unparsable is 0.
pub fn parse_views(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    let mut cleaned = text.to_lowercase();
    for word in ["views", "vues", "de vues"] {
        cleaned = cleaned.replace(word, "");
    }
    let cleaned = cleaned.replace(',', "").replace(' ', "");
    let cleaned = cleaned.trim();

    for (suffix, multiplier) in [('k', 1e3), ('m', 1e6), ('b', 1e9)] {
        if let Some(number) = cleaned.strip_suffix(suffix) {
            return match number.replace(',', ".").parse::<f64>() {
                Ok(n) if n >= 0.0 => (n * multiplier) as u64,
                _ => 0,
            };
        }
    }
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => n as u64,
        _ => 0,
    }
}

/// Parse a "MM:SS" or "HH:MM:SS" length into whole seconds. Any other shape,
/// component, or overflowing total is 0.
pub fn parse_duration(text: &str) -> u64 {
    let components: Option<Vec<u64>> = text
        .split(':')
        .map(|part| part.trim().parse().ok())
        .collect();
    let total = match components.as_deref() {
        Some(&[minutes, seconds]) => minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds)),
        Some(&[hours, minutes, seconds]) => hours
            .checked_mul(3_600)
            .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(seconds)),
        _ => None,
    };
    total.unwrap_or(0)
}

const TIME_UNITS: [(&str, i64); 5] = [
    ("hour", 3_600),
    ("day", 86_400),
    ("week", 7 * 86_400),
    ("month", 30 * 86_400),
    ("year", 365 * 86_400),
];

/// Resolve a humanized publish phrase ("3 weeks ago") against `now`.
///
/// Months count as 30 days and years as 365. Text without a known unit, or
/// with a leading token that is not a number, passes through verbatim as
/// opaque text; empty input is unknown.
pub fn parse_published_time(text: &str, now: DateTime<Utc>) -> PublishedTime {
    if text.is_empty() {
        return PublishedTime::Unknown;
    }
    for (keyword, unit_secs) in TIME_UNITS {
        if !text.contains(keyword) {
            continue;
        }
        let magnitude = text
            .split_whitespace()
            .next()
            .and_then(|token| token.trim().parse::<i64>().ok());
        let resolved = magnitude
            .and_then(|n| n.checked_mul(unit_secs))
            .and_then(Duration::try_seconds)
            .and_then(|delta| now.checked_sub_signed(delta));
        return match resolved {
            Some(ts) => PublishedTime::Absolute(ts),
            None => PublishedTime::Text(text.to_string()),
        };
    }
    PublishedTime::Text(text.to_string())
}
