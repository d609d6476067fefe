use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{
    config::Endpoints,
    model::{LocationCandidate, WeatherSnapshot},
};

use super::{ApiError, Geocoder, WeatherProvider};

/// OpenWeather client covering the direct geocoding and current weather APIs.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(
        api_key: String,
        endpoints: Endpoints,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            api_key,
            endpoints,
            http: builder.build()?,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    timezone: i32,
}

impl TryFrom<OwCurrentResponse> for WeatherSnapshot {
    type Error = ApiError;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self, Self::Error> {
        let condition = parsed
            .weather
            .into_iter()
            .next()
            .ok_or(ApiError::NoConditions)?;

        Ok(WeatherSnapshot {
            location_name: parsed.name,
            country_code: parsed.sys.country.unwrap_or_default(),
            temperature_c: parsed.main.temp,
            feels_like_c: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            wind_speed_mps: parsed.wind.speed,
            condition_summary: condition.main,
            condition_description: condition.description,
            icon: condition.icon,
            utc_offset_secs: parsed.timezone,
        })
    }
}

/// Error body OpenWeather returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, ApiError> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<OwErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        tracing::debug!(
            %status,
            body = %truncate_body(&body),
            "OpenWeather returned an error status"
        );
        return Err(ApiError::Status { status, message });
    }

    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl Geocoder for OpenWeatherProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<LocationCandidate>, ApiError> {
        let limit = limit.to_string();

        let res = self
            .http
            .get(&self.endpoints.geocoding)
            .query(&[
                ("q", query),
                ("limit", limit.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let candidates: Vec<LocationCandidate> = read_json(res).await?;
        tracing::debug!(query, count = candidates.len(), "geocoding lookup finished");

        Ok(candidates)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, ApiError> {
        let res = self
            .http
            .get(&self.endpoints.weather)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let parsed: OwCurrentResponse = read_json(res).await?;
        let snapshot = WeatherSnapshot::try_from(parsed)?;
        tracing::debug!(location = %snapshot.location_name, "weather lookup finished");

        Ok(snapshot)
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONDON: &str = r#"{
        "coord": {"lon": -0.13, "lat": 51.51},
        "weather": [
            {"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"},
            {"id": 701, "main": "Mist", "description": "mist", "icon": "50d"}
        ],
        "main": {"temp": 14.62, "feels_like": 13.98, "pressure": 1012, "humidity": 72},
        "wind": {"speed": 4.12, "deg": 240},
        "sys": {"country": "GB", "sunrise": 1700000000, "sunset": 1700030000},
        "timezone": 0,
        "name": "London",
        "cod": 200
    }"#;

    #[test]
    fn snapshot_uses_first_condition_entry() {
        let parsed: OwCurrentResponse = serde_json::from_str(LONDON).unwrap();
        let snapshot = WeatherSnapshot::try_from(parsed).unwrap();

        assert_eq!(snapshot.location_name, "London");
        assert_eq!(snapshot.country_code, "GB");
        assert_eq!(snapshot.temperature_c, 14.62);
        assert_eq!(snapshot.feels_like_c, 13.98);
        assert_eq!(snapshot.humidity_pct, 72);
        assert_eq!(snapshot.wind_speed_mps, 4.12);
        assert_eq!(snapshot.condition_summary, "Clouds");
        assert_eq!(snapshot.condition_description, "broken clouds");
        assert_eq!(snapshot.icon, "04d");
        assert_eq!(snapshot.utc_offset_secs, 0);
    }

    #[test]
    fn missing_country_becomes_empty() {
        let json = r#"{
            "weather": [{"main": "Clear", "description": "clear sky", "icon": "01n"}],
            "main": {"temp": -3.5, "feels_like": -8.0, "humidity": 90},
            "wind": {"speed": 1.0},
            "sys": {},
            "timezone": -18000,
            "name": "Open Sea"
        }"#;
        let parsed: OwCurrentResponse = serde_json::from_str(json).unwrap();
        let snapshot = WeatherSnapshot::try_from(parsed).unwrap();

        assert_eq!(snapshot.country_code, "");
        assert_eq!(snapshot.utc_offset_secs, -18000);
    }

    #[test]
    fn empty_conditions_are_rejected() {
        let json = r#"{
            "weather": [],
            "main": {"temp": 1.0, "feels_like": 1.0, "humidity": 50},
            "wind": {"speed": 1.0},
            "timezone": 3600,
            "name": "Nowhere"
        }"#;
        let parsed: OwCurrentResponse = serde_json::from_str(json).unwrap();

        let err = WeatherSnapshot::try_from(parsed).unwrap_err();
        assert!(matches!(err, ApiError::NoConditions));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        assert_eq!(truncate_body(&long).chars().count(), 200);
        assert_eq!(truncate_body("short"), "short");
    }
}
