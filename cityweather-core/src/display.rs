//! Values derived from a snapshot at render time.
//!
//! None of these are cached on the snapshot: local time depends on "now",
//! and everything else is cheap enough to recompute per frame.

use chrono::{DateTime, Duration, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hour convention used when formatting a wall-clock time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockStyle {
    #[default]
    H24,
    H12,
}

impl ClockStyle {
    pub const fn all() -> &'static [ClockStyle] {
        &[ClockStyle::H24, ClockStyle::H12]
    }

    fn pattern(self) -> &'static str {
        match self {
            ClockStyle::H24 => "%H:%M",
            ClockStyle::H12 => "%I:%M %p",
        }
    }
}

impl fmt::Display for ClockStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockStyle::H24 => f.write_str("24-hour (17:30)"),
            ClockStyle::H12 => f.write_str("12-hour (05:30 PM)"),
        }
    }
}

/// Wall-clock time at a location `utc_offset_secs` away from UTC.
///
/// `now` may be in any zone; it is normalised to UTC before the location's
/// offset is applied.
pub fn local_time<Tz: TimeZone>(
    now: &DateTime<Tz>,
    utc_offset_secs: i32,
    clock: ClockStyle,
) -> String {
    let utc = now.naive_utc();
    let there = utc + Duration::seconds(i64::from(utc_offset_secs));
    there.format(clock.pattern()).to_string()
}

/// Temperature shown without its fractional part, truncated toward zero.
pub fn whole_degrees(celsius: f64) -> i64 {
    celsius.trunc() as i64
}

/// URL of the large condition icon for an icon id such as `04d`.
pub fn icon_url(base: &str, icon: &str) -> String {
    format!("{}/{icon}@4x.png", base.trim_end_matches('/'))
}

/// Upper-cases the first letter of every word: `broken clouds` -> `Broken Clouds`.
pub fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for ch in text.chars() {
        if at_word_start && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = ch.is_whitespace();
    }

    out
}
