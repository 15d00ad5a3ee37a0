//! Core library for the `weather-dashboard` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The upstream weather source abstraction and its OpenWeather implementation
//! - Shared domain models (conditions, forecast samples, air quality)
//! - Forecast aggregation and AQI banding
//! - Dashboard state and the controller that drives it
//!
//! It is used by `dashboard-cli`, but any front end can drive a [`Dashboard`]
//! and render its [`DashboardState`].

pub mod aggregate;
pub mod aqi;
pub mod config;
pub mod dashboard;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod state;

pub use aggregate::{DailySummary, HourlyPoint, daily_view, hourly_view};
pub use aqi::{AqiBand, classify};
pub use config::Config;
pub use dashboard::Dashboard;
pub use geolocation::{FixedPosition, Geolocator, LocationError};
pub use model::{
    AirQualitySample, Coordinates, CurrentConditions, ForecastSample, ForecastSeries,
    LocationQuery, UnitSystem,
};
pub use provider::{FetchError, WeatherSource, openweather::OpenWeatherSource};
pub use state::{AirQualityState, DashboardState, Phase, RequestToken};
