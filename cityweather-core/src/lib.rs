//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather geocoding and current-weather client
//! - The search widget's interaction state and its async driver
//! - Render-time helpers (local time, country names, icons)
//!
//! It is used by `cityweather-cli`, but can also be reused by other front-ends.

pub mod config;
pub mod country;
pub mod display;
pub mod model;
pub mod provider;
pub mod session;
pub mod widget;

pub use config::{Config, DisplayConfig, Endpoints};
pub use country::country_name;
pub use display::ClockStyle;
pub use model::{GeocodeRequest, LocationCandidate, WeatherRequest, WeatherSnapshot};
pub use provider::{
    ApiError, GEOCODE_LIMIT, Geocoder, WeatherProvider, openweather::OpenWeatherProvider,
    provider_from_config,
};
pub use session::{Phase, Session};
pub use widget::{Input, Widget};
