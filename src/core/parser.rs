//! Parser for position log lines.
//!
//! Accepted forms:
//!   [ 2025.01.01 12:00:00 ] 12.9716, 77.5946
//!   12.9716,77.5946

use std::time::Duration;

use chrono::{NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use super::geo::GeoPoint;
use super::model::PositionFix;

lazy_static! {
    static ref POSITION_RE: Regex = Regex::new(
        r"^(?:\[\s*(\d{4}\.\d{2}\.\d{2}\s+\d{2}:\d{2}:\d{2})\s*\]\s*)?(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)$"
    )
    .expect("Invalid position regex");
}

/// Parse one line. Blank lines, `#` comments, malformed lines and
/// out-of-range coordinates yield `None`.
pub fn parse_line(line: &str) -> Option<PositionFix> {
    let line = line.trim().trim_start_matches('\u{feff}');
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let caps = POSITION_RE.captures(line)?;
    let latitude: f64 = caps.get(2)?.as_str().parse().ok()?;
    let longitude: f64 = caps.get(3)?.as_str().parse().ok()?;

    let point = match GeoPoint::new(latitude, longitude) {
        Ok(point) => point,
        Err(e) => {
            log::warn!("Rejected position sample: {}", e);
            return None;
        }
    };

    let timestamp = caps.get(1).and_then(|m| {
        let naive = NaiveDateTime::parse_from_str(m.as_str(), "%Y.%m.%d %H:%M:%S").ok()?;
        let secs = Utc.from_utc_datetime(&naive).timestamp();
        u64::try_from(secs).ok().map(Duration::from_secs)
    });

    Some(PositionFix { point, timestamp })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_coordinates() {
        let fix = parse_line("12.9716,77.5946").unwrap();
        assert_eq!(fix.point.latitude(), 12.9716);
        assert_eq!(fix.point.longitude(), 77.5946);
        assert!(fix.timestamp.is_none());
    }

    #[test]
    fn test_parse_timestamped_line() {
        let fix = parse_line("[ 2025.01.01 12:00:00 ] -33.8688, 151.2093").unwrap();
        assert_eq!(fix.point.latitude(), -33.8688);
        assert_eq!(fix.timestamp, Some(Duration::from_secs(1_735_732_800)));
    }

    #[test]
    fn test_ignores_noise() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("# comment").is_none());
        assert!(parse_line("hello, world").is_none());
        assert!(parse_line("12.5").is_none());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(parse_line("91.0,10.0").is_none());
        assert!(parse_line("10.0,-181").is_none());
    }

    #[test]
    fn test_strips_bom() {
        assert!(parse_line("\u{feff}1.5,2.5").is_some());
    }
}
