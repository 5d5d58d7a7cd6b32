//! Duration parsing into whole minutes.

use std::sync::LazyLock;

use regex::Regex;

static HOUR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*(?:hours?|hrs?)").expect("valid regex"));
static MINUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*(?:minutes?|mins?)").expect("valid regex"));
static DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*day").expect("valid regex"));
static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:[.,]\d+)?)$").expect("valid regex"));
static ISO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^P(?:(\d+(?:\.\d+)?)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("valid regex")
});

/// Parse a decimal that may use a comma separator ("1,5").
fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}

fn first_quantity(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text).and_then(|caps| parse_decimal(&caps[1]))
}

fn round_minutes(minutes: f64) -> u32 {
    minutes.round().clamp(0.0, u32::MAX as f64) as u32
}

/// Convert a human duration phrase into minutes.
///
/// Hour, minute and day quantities are summed ("1 Hour 50 Minutes" → 110).
/// A bare number is taken as minutes. Anything else yields `None`.
pub fn parse_duration_from_display(text: &str) -> Option<u32> {
    let normalized = text.to_lowercase();
    let mut total = 0.0;

    if let Some(hours) = first_quantity(&HOUR_RE, &normalized) {
        total += hours * 60.0;
    }
    if let Some(minutes) = first_quantity(&MINUTE_RE, &normalized) {
        total += minutes;
    }
    if let Some(days) = first_quantity(&DAY_RE, &normalized) {
        total += days * 24.0 * 60.0;
    }

    if total > 0.0 {
        return Some(round_minutes(total));
    }

    first_quantity(&NUMERIC_RE, normalized.trim()).map(round_minutes)
}

/// Convert an ISO-8601 duration (`P[nD]T[nH][nM][nS]`) into minutes.
///
/// Returns `None` for malformed input or a designator with no components.
pub fn parse_iso_duration_to_minutes(text: &str) -> Option<u32> {
    let caps = ISO_RE.captures(text.trim())?;

    let component = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
    let (days, hours, minutes, seconds) = (component(1), component(2), component(3), component(4));

    if days.is_none() && hours.is_none() && minutes.is_none() && seconds.is_none() {
        return None;
    }

    let total = days.unwrap_or(0.0) * 1440.0
        + hours.unwrap_or(0.0) * 60.0
        + minutes.unwrap_or(0.0)
        + seconds.unwrap_or(0.0) / 60.0;

    Some(round_minutes(total))
}
