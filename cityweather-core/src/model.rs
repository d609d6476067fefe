use serde::{Deserialize, Serialize};

/// One geocoding match for a free-text query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub name: String,
    /// ISO 3166-1 alpha-2 code.
    #[serde(default)]
    pub country: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl LocationCandidate {
    /// Text echoed into the search field once this candidate is chosen.
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

/// Current conditions returned by one successful weather request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country_code: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub condition_summary: String,
    pub condition_description: String,
    pub icon: String,
    pub utc_offset_secs: i32,
}

/// A geocoding lookup the session wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeRequest {
    pub seq: u64,
    pub query: String,
}

/// A weather lookup for the coordinates of a selected candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRequest {
    pub seq: u64,
    pub latitude: f64,
    pub longitude: f64,
}
