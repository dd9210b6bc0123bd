//! Turns configured availability windows into the discrete hourly slots a
//! client can actually book.

use crate::types::TimeRange;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HOUR_PREFIX: Regex = Regex::new(r"^(\d{2}):\d{2}$").unwrap();
}

/// Fallback windows used for dates with no configured availability.
pub fn default_windows() -> Vec<TimeRange> {
    vec![
        TimeRange {
            from: "09:00".into(),
            to: "12:00".into(),
        },
        TimeRange {
            from: "14:00".into(),
            to: "17:00".into(),
        },
    ]
}

/// "HH:MM" -> HH. Minutes are truncated; anything else is unusable.
fn hour_of(label: &str) -> Option<u32> {
    let captures = HOUR_PREFIX.captures(label)?;
    let hour: u32 = captures[1].parse().ok()?;
    (hour < 24).then_some(hour)
}

/// Expands every window into one "HH:00" label per full hour, `from`
/// inclusive to `to` exclusive, keeping window order. Windows with an
/// unparseable bound are skipped.
pub fn expand_windows(windows: &[TimeRange]) -> Vec<String> {
    let mut slots = Vec::new();
    for window in windows {
        let (Some(from), Some(to)) = (hour_of(&window.from), hour_of(&window.to)) else {
            continue;
        };
        for hour in from..to {
            slots.push(format!("{hour:02}:00"));
        }
    }
    slots
}

/// Expanded slots minus the ones already booked for the date.
pub fn available_times(windows: &[TimeRange], booked: &[String]) -> Vec<String> {
    expand_windows(windows)
        .into_iter()
        .filter(|slot| !booked.contains(slot))
        .collect()
}
