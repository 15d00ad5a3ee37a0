use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::model::{
    AirQualitySample, Coordinates, CurrentConditions, ForecastSample, ForecastSeries,
    LocationQuery, UnitSystem,
};

use super::{FetchError, LOCATION_NOT_FOUND, WeatherSource};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenWeather 2.5 REST API: `/weather`, `/forecast` and `/air_pollution`.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherSourceBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenWeatherSourceBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenWeatherSource, FetchError> {
        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("weather-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(OpenWeatherSource {
            api_key: self.api_key,
            base_url: self.base_url,
            http,
        })
    }
}

impl OpenWeatherSource {
    pub fn builder(api_key: impl Into<String>) -> OpenWeatherSourceBuilder {
        OpenWeatherSourceBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self, FetchError> {
        Self::builder(api_key).build()
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, ?params, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(rejection(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn location_params(query: &LocationQuery, units: UnitSystem) -> Vec<(&'static str, String)> {
    let mut params = match query {
        LocationQuery::Name(name) => vec![("q", name.clone())],
        LocationQuery::Coordinates(coords) => vec![
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
        ],
    };
    params.push(("units", units.as_str().to_string()));
    params
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Classify a non-2xx response. A 404 means the location did not resolve.
fn rejection(status: StatusCode, body: &str) -> FetchError {
    let message = serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());

    tracing::debug!(%status, body = truncate_body(body), "OpenWeather rejected request");

    if status == StatusCode::NOT_FOUND {
        return FetchError::NotFound(message.unwrap_or_else(|| LOCATION_NOT_FOUND.to_string()));
    }

    FetchError::Rejected {
        status: status.as_u16(),
        message: message.unwrap_or_default(),
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    humidity: u8,
    #[serde(default)]
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    coord: OwCoord,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwAqiMain {
    aqi: i32,
}

#[derive(Debug, Deserialize)]
struct OwAqiEntry {
    dt: i64,
    main: OwAqiMain,
}

#[derive(Debug, Deserialize)]
struct OwAirPollutionResponse {
    #[serde(default)]
    list: Vec<OwAqiEntry>,
}

fn first_description(weather: &[OwWeather]) -> String {
    weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

impl From<OwCurrentResponse> for CurrentConditions {
    fn from(parsed: OwCurrentResponse) -> Self {
        CurrentConditions {
            condition: first_description(&parsed.weather),
            place_name: parsed.name,
            temperature: parsed.main.temp,
            wind_speed: parsed.wind.speed,
            humidity_pct: parsed.main.humidity,
            pressure_hpa: parsed.main.pressure,
            sunrise: unix_to_utc(parsed.sys.sunrise),
            sunset: unix_to_utc(parsed.sys.sunset),
            coordinates: Coordinates::new(parsed.coord.lat, parsed.coord.lon),
        }
    }
}

impl From<OwForecastEntry> for ForecastSample {
    fn from(entry: OwForecastEntry) -> Self {
        ForecastSample {
            timestamp: unix_to_utc(entry.dt),
            temperature: entry.main.temp,
            condition: first_description(&entry.weather),
        }
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    async fn current_conditions(
        &self,
        query: &LocationQuery,
        units: UnitSystem,
    ) -> Result<CurrentConditions, FetchError> {
        let parsed: OwCurrentResponse = self
            .get("weather", &location_params(query, units))
            .await?;
        Ok(parsed.into())
    }

    async fn forecast(
        &self,
        query: &LocationQuery,
        units: UnitSystem,
    ) -> Result<ForecastSeries, FetchError> {
        let parsed: OwForecastResponse = self
            .get("forecast", &location_params(query, units))
            .await?;

        let mut series: ForecastSeries = parsed.list.into_iter().map(Into::into).collect();
        series.sort_by_key(|s| s.timestamp);
        Ok(series)
    }

    async fn air_quality(
        &self,
        coords: Coordinates,
    ) -> Result<Option<AirQualitySample>, FetchError> {
        let params = [
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
        ];
        let parsed: OwAirPollutionResponse = self.get("air_pollution", &params).await?;

        Ok(parsed.list.into_iter().next().map(|entry| AirQualitySample {
            aqi: entry.main.aqi,
            timestamp: unix_to_utc(entry.dt),
        }))
    }
}

fn unix_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
