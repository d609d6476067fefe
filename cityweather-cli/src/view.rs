//! Plain-text rendering of the widget state.

use std::fmt::Write;

use chrono::{DateTime, TimeZone};
use cityweather_core::{
    ClockStyle, LocationCandidate, Session, WeatherSnapshot, country_name,
    display::{capitalize_words, icon_url, local_time, whole_degrees},
};

/// Rendering options resolved from config.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub clock: ClockStyle,
    pub icons_base: String,
}

/// Numbered suggestion list, one `name, country` per line.
pub fn render_candidates(candidates: &[LocationCandidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:>2}. {}\n", i + 1, c.label()))
        .collect()
}

/// Error line and/or weather card for the current session.
///
/// Local time is derived from `now` on every call.
pub fn render_session<Tz: TimeZone>(
    session: &Session,
    now: &DateTime<Tz>,
    opts: &ViewOptions,
) -> String {
    let mut out = String::new();

    if let Some(error) = session.error() {
        let _ = writeln!(out, "error: {error}");
    }

    if let Some(snapshot) = session.snapshot() {
        out.push_str(&render_card(snapshot, session.details_expanded(), now, opts));
    }

    out
}

fn render_card<Tz: TimeZone>(
    snapshot: &WeatherSnapshot,
    expanded: bool,
    now: &DateTime<Tz>,
    opts: &ViewOptions,
) -> String {
    let mut out = String::new();

    if snapshot.country_code.is_empty() {
        let _ = writeln!(out, "{}", snapshot.location_name);
    } else {
        let country = country_name(&snapshot.country_code);
        let _ = writeln!(out, "{}, {country}", snapshot.location_name);
    }
    let clock = local_time(now, snapshot.utc_offset_secs, opts.clock);
    let _ = writeln!(out, "Local Time: {clock}");
    let _ = writeln!(out, "{}°C", whole_degrees(snapshot.temperature_c));
    let _ = writeln!(
        out,
        "{} ({})",
        capitalize_words(&snapshot.condition_description),
        snapshot.condition_summary
    );
    let _ = writeln!(out, "Icon: {}", icon_url(&opts.icons_base, &snapshot.icon));

    if expanded {
        let _ = writeln!(out, "  Feels like: {}°C", whole_degrees(snapshot.feels_like_c));
        let _ = writeln!(out, "  Humidity: {}%", snapshot.humidity_pct);
        let _ = writeln!(out, "  Wind: {} m/s", snapshot.wind_speed_mps);
    }

    out
}

/// Label of the details toggle for the given panel state.
pub fn details_label(expanded: bool) -> &'static str {
    if expanded {
        "Hide Details"
    } else {
        "More Details"
    }
}
