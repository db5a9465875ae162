//! Parser for compact `geo:<lat>,<lng>` coordinate strings.

use once_cell::sync::Lazy;
use regex::Regex;

// Pre-compiled pattern: signed decimals separated by a comma after the
// literal `geo:` prefix.
static GEO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^geo:(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?)").unwrap()
});

/// Parse a `geo:<lat>,<lng>` string into a (latitude, longitude) pair.
///
/// Returns `None` for anything that does not match the pattern; a record with
/// an unparseable location simply contributes no coordinate fields.
pub fn parse_geo(s: &str) -> Option<(f64, f64)> {
    let caps = GEO_REGEX.captures(s)?;
    let lat = caps[1].parse().ok()?;
    let lng = caps[2].parse().ok()?;
    Some((lat, lng))
}
