//! Presentation state and its per-event transitions.
//!
//! Every transition replaces only its own group of fields: conditions and
//! forecast together, air quality on its own, units and query independently.
//! Fetch results carry the [`RequestToken`] issued when the fetch started and
//! are dropped unless that token is still the latest one.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

use crate::{
    aggregate::{self, DailySummary, HourlyPoint},
    aqi::{self, AqiBand},
    model::{AirQualitySample, CurrentConditions, ForecastSeries, LocationQuery, UnitSystem},
    provider::FetchError,
};

/// Sequence number issued by [`DashboardState::fetch_started`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing requested yet.
    Idle,
    Loading,
    Loaded,
    Errored,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AirQualityState {
    #[default]
    NotRequested,
    Pending,
    /// The source answered but had no reading for the location.
    Empty,
    Failed,
    Available(AirQualitySample),
}

impl AirQualityState {
    pub fn sample(&self) -> Option<&AirQualitySample> {
        match self {
            AirQualityState::Available(sample) => Some(sample),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Weather {
    conditions: CurrentConditions,
    forecast: ForecastSeries,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    query: String,
    units: UnitSystem,
    loading: bool,
    error: Option<String>,
    weather: Option<Weather>,
    air_quality: AirQualityState,
    air_quality_for: Option<RequestToken>,
    clock: DateTime<Utc>,
    latest: RequestToken,
}

impl DashboardState {
    pub fn new(units: UnitSystem, now: DateTime<Utc>) -> Self {
        Self {
            query: String::new(),
            units,
            loading: false,
            error: None,
            weather: None,
            air_quality: AirQualityState::NotRequested,
            air_quality_for: None,
            clock: now,
            latest: RequestToken(0),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn conditions(&self) -> Option<&CurrentConditions> {
        self.weather.as_ref().map(|w| &w.conditions)
    }

    pub fn forecast(&self) -> Option<&ForecastSeries> {
        self.weather.as_ref().map(|w| &w.forecast)
    }

    pub fn air_quality(&self) -> &AirQualityState {
        &self.air_quality
    }

    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }

    pub fn latest_token(&self) -> RequestToken {
        self.latest
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token == self.latest
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.weather.is_some() {
            Phase::Loaded
        } else if self.error.is_some() {
            Phase::Errored
        } else {
            Phase::Idle
        }
    }

    pub fn hourly_view<Tz: TimeZone>(&self, tz: &Tz) -> Vec<HourlyPoint>
    where
        Tz::Offset: fmt::Display,
    {
        self.forecast()
            .map(|series| aggregate::hourly_view(series, tz))
            .unwrap_or_default()
    }

    pub fn daily_view<Tz: TimeZone>(&self, tz: &Tz) -> Vec<DailySummary> {
        self.forecast()
            .map(|series| aggregate::daily_view(series, tz))
            .unwrap_or_default()
    }

    pub fn air_quality_band(&self) -> Option<AqiBand> {
        self.air_quality.sample().map(|s| aqi::classify(s.aqi))
    }

    pub fn query_changed(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Flip units. Stored values stay as they are until the refetch lands.
    pub fn unit_toggled(&mut self) -> UnitSystem {
        self.units = self.units.toggled();
        self.units
    }

    pub fn fetch_started(&mut self) -> RequestToken {
        self.latest = RequestToken(self.latest.0 + 1);
        self.loading = true;
        self.error = None;
        tracing::debug!(token = %self.latest, query = %self.query, "fetch started");
        self.latest
    }

    /// Apply a combined current + forecast result. Returns `false` if `token` is stale.
    ///
    /// When the fetch was keyed by coordinates the resolved place name becomes the query.
    pub fn fetch_succeeded(
        &mut self,
        token: RequestToken,
        origin: &LocationQuery,
        conditions: CurrentConditions,
        forecast: ForecastSeries,
    ) -> bool {
        if !self.is_current(token) {
            tracing::debug!(%token, latest = %self.latest, "discarding stale weather result");
            return false;
        }

        tracing::info!(
            %token,
            place = %conditions.place_name,
            samples = forecast.len(),
            "weather loaded"
        );

        if matches!(origin, LocationQuery::Coordinates(_)) {
            self.query = conditions.place_name.clone();
        }
        if self.air_quality_for != Some(token) {
            self.air_quality = AirQualityState::Pending;
            self.air_quality_for = Some(token);
        }
        self.weather = Some(Weather {
            conditions,
            forecast,
        });
        self.error = None;
        self.loading = false;
        true
    }

    /// Clear conditions, forecast and air quality and record the user-facing message.
    pub fn fetch_failed(&mut self, token: RequestToken, err: &FetchError) -> bool {
        if !self.is_current(token) {
            tracing::debug!(%token, latest = %self.latest, "discarding stale weather failure");
            return false;
        }

        tracing::warn!(%token, error = %err, "weather fetch failed");

        self.weather = None;
        self.air_quality = AirQualityState::NotRequested;
        self.air_quality_for = None;
        self.error = Some(err.user_message());
        self.loading = false;
        true
    }

    pub fn air_quality_received(
        &mut self,
        token: RequestToken,
        sample: Option<AirQualitySample>,
    ) -> bool {
        if !self.accepts_air_quality(token) {
            return false;
        }

        self.air_quality = match sample {
            Some(sample) => AirQualityState::Available(sample),
            None => AirQualityState::Empty,
        };
        self.air_quality_for = Some(token);
        true
    }

    /// Silent: only the air quality reading is affected, no message is set.
    pub fn air_quality_failed(&mut self, token: RequestToken, err: &FetchError) -> bool {
        if !self.accepts_air_quality(token) {
            return false;
        }

        tracing::warn!(%token, error = %err, "air quality fetch failed");
        self.air_quality = AirQualityState::Failed;
        self.air_quality_for = Some(token);
        true
    }

    fn accepts_air_quality(&self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            tracing::debug!(%token, latest = %self.latest, "discarding stale air quality result");
            return false;
        }
        // a failed weather fetch already cleared everything for this token
        self.error.is_none()
    }

    /// Display clock only.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.clock = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, ForecastSample};

    fn t0() -> DateTime<Utc> {
        "2024-01-01T12:00:00Z".parse().unwrap()
    }

    fn conditions(place: &str) -> CurrentConditions {
        CurrentConditions {
            place_name: place.to_string(),
            temperature: 4.2,
            condition: "overcast clouds".to_string(),
            wind_speed: 3.1,
            humidity_pct: 81,
            pressure_hpa: 1009,
            sunrise: "2024-01-01T07:30:00Z".parse().unwrap(),
            sunset: "2024-01-01T16:10:00Z".parse().unwrap(),
            coordinates: Coordinates::new(52.52, 13.41),
        }
    }

    fn forecast() -> ForecastSeries {
        vec![
            ForecastSample {
                timestamp: "2024-01-01T00:00:00Z".parse().unwrap(),
                temperature: 10.0,
                condition: "clear sky".to_string(),
            },
            ForecastSample {
                timestamp: "2024-01-01T03:00:00Z".parse().unwrap(),
                temperature: 14.0,
                condition: "clear sky".to_string(),
            },
            ForecastSample {
                timestamp: "2024-01-02T00:00:00Z".parse().unwrap(),
                temperature: 8.0,
                condition: "snow".to_string(),
            },
        ]
    }

    fn aqi(value: i32) -> AirQualitySample {
        AirQualitySample {
            aqi: value,
            timestamp: t0(),
        }
    }

    fn by_name(name: &str) -> LocationQuery {
        LocationQuery::Name(name.to_string())
    }

    fn loaded_state() -> (DashboardState, RequestToken) {
        let mut state = DashboardState::new(UnitSystem::Metric, t0());
        state.query_changed("Berlin");
        let token = state.fetch_started();
        assert!(state.fetch_succeeded(token, &by_name("Berlin"), conditions("Berlin"), forecast()));
        assert!(state.air_quality_received(token, Some(aqi(2))));
        (state, token)
    }

    #[test]
    fn phases_follow_fetch_lifecycle() {
        let mut state = DashboardState::new(UnitSystem::Metric, t0());
        assert_eq!(state.phase(), Phase::Idle);

        let token = state.fetch_started();
        assert_eq!(state.phase(), Phase::Loading);
        assert!(state.is_loading());

        state.fetch_succeeded(token, &by_name("Berlin"), conditions("Berlin"), forecast());
        assert_eq!(state.phase(), Phase::Loaded);
        assert!(!state.is_loading());
        assert_eq!(state.air_quality(), &AirQualityState::Pending);

        let token = state.fetch_started();
        state.fetch_failed(token, &FetchError::NotFound("city not found".into()));
        assert_eq!(state.phase(), Phase::Errored);
    }

    #[test]
    fn air_quality_failure_keeps_weather_and_sets_no_error() {
        let mut state = DashboardState::new(UnitSystem::Metric, t0());
        let token = state.fetch_started();
        state.fetch_succeeded(token, &by_name("Berlin"), conditions("Berlin"), forecast());

        let err = FetchError::Rejected {
            status: 500,
            message: String::new(),
        };
        assert!(state.air_quality_failed(token, &err));

        assert_eq!(state.conditions(), Some(&conditions("Berlin")));
        assert_eq!(state.forecast(), Some(&forecast()));
        assert!(state.air_quality().sample().is_none());
        assert_eq!(state.air_quality(), &AirQualityState::Failed);
        assert!(state.error().is_none());
        assert_eq!(state.phase(), Phase::Loaded);
    }

    #[test]
    fn not_found_clears_everything() {
        let (mut state, _) = loaded_state();
        assert!(state.air_quality().sample().is_some());

        let token = state.fetch_started();
        state.fetch_failed(token, &FetchError::NotFound("city not found".into()));

        assert!(state.conditions().is_none());
        assert!(state.forecast().is_none());
        assert!(state.air_quality().sample().is_none());
        assert_eq!(state.error(), Some("city not found"));
        assert!(!state.is_loading());
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut state = DashboardState::new(UnitSystem::Metric, t0());
        let old = state.fetch_started();
        let new = state.fetch_started();

        assert!(state.fetch_succeeded(new, &by_name("Paris"), conditions("Paris"), forecast()));
        assert!(!state.fetch_succeeded(old, &by_name("Berlin"), conditions("Berlin"), vec![]));
        assert!(!state.fetch_failed(old, &FetchError::NotFound(String::new())));
        assert!(!state.air_quality_received(old, Some(aqi(5))));

        assert_eq!(state.conditions().unwrap().place_name, "Paris");
        assert_eq!(state.forecast().unwrap().len(), 3);
        assert!(state.error().is_none());
        assert_eq!(state.air_quality(), &AirQualityState::Pending);
    }

    #[test]
    fn stale_success_does_not_clear_loading_of_newer_fetch() {
        let mut state = DashboardState::new(UnitSystem::Metric, t0());
        let old = state.fetch_started();
        let _new = state.fetch_started();

        state.fetch_succeeded(old, &by_name("Berlin"), conditions("Berlin"), forecast());
        assert!(state.is_loading());
        assert!(state.conditions().is_none());
    }

    #[test]
    fn coordinates_origin_adopts_place_name_as_query() {
        let mut state = DashboardState::new(UnitSystem::Metric, t0());
        let origin = LocationQuery::Coordinates(Coordinates::new(52.52, 13.41));
        let token = state.fetch_started();
        state.fetch_succeeded(token, &origin, conditions("Mitte"), forecast());
        assert_eq!(state.query(), "Mitte");

        state.query_changed("Berl");
        let token = state.fetch_started();
        state.fetch_succeeded(token, &by_name("Berl"), conditions("Berlin"), forecast());
        assert_eq!(state.query(), "Berl");
    }

    #[test]
    fn air_quality_arriving_before_weather_is_kept() {
        let mut state = DashboardState::new(UnitSystem::Metric, t0());
        let origin = LocationQuery::Coordinates(Coordinates::new(52.52, 13.41));
        let token = state.fetch_started();

        assert!(state.air_quality_received(token, Some(aqi(3))));
        state.fetch_succeeded(token, &origin, conditions("Mitte"), forecast());

        assert_eq!(state.air_quality().sample(), Some(&aqi(3)));
    }

    #[test]
    fn air_quality_after_failed_fetch_is_ignored() {
        let mut state = DashboardState::new(UnitSystem::Metric, t0());
        let token = state.fetch_started();
        state.fetch_failed(token, &FetchError::NotFound(String::new()));

        assert!(!state.air_quality_received(token, Some(aqi(1))));
        assert_eq!(state.air_quality(), &AirQualityState::NotRequested);
        assert_eq!(state.error(), Some(crate::provider::LOCATION_NOT_FOUND));
    }

    #[test]
    fn new_weather_resets_previous_air_quality() {
        let (mut state, _) = loaded_state();

        let token = state.fetch_started();
        state.fetch_succeeded(token, &by_name("Paris"), conditions("Paris"), forecast());

        assert_eq!(state.air_quality(), &AirQualityState::Pending);
    }

    #[test]
    fn empty_reading_is_distinct_from_failure() {
        let mut state = DashboardState::new(UnitSystem::Metric, t0());
        let token = state.fetch_started();
        state.fetch_succeeded(token, &by_name("Berlin"), conditions("Berlin"), forecast());
        state.air_quality_received(token, None);

        assert_eq!(state.air_quality(), &AirQualityState::Empty);
        assert!(state.air_quality_band().is_none());
    }

    #[test]
    fn unit_toggle_keeps_stored_values() {
        let (mut state, _) = loaded_state();
        let before = state.conditions().cloned();

        assert_eq!(state.unit_toggled(), UnitSystem::Imperial);
        assert_eq!(state.conditions().cloned(), before);
        assert_eq!(state.phase(), Phase::Loaded);
    }

    #[test]
    fn tick_only_moves_the_clock() {
        let (mut state, token) = loaded_state();
        let later = t0() + chrono::Duration::seconds(1);

        state.tick(later);

        assert_eq!(state.clock(), later);
        assert_eq!(state.latest_token(), token);
        assert_eq!(state.phase(), Phase::Loaded);
    }

    #[test]
    fn views_derive_from_stored_forecast() {
        let (state, _) = loaded_state();

        let daily = state.daily_view(&Utc);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].temperature, 12.0);
        assert_eq!(daily[1].temperature, 8.0);
        assert_eq!(state.hourly_view(&Utc).len(), 3);
        assert_eq!(state.air_quality_band().unwrap().label, "Fair");

        let idle = DashboardState::new(UnitSystem::Metric, t0());
        assert!(idle.daily_view(&Utc).is_empty());
        assert!(idle.hourly_view(&Utc).is_empty());
    }
}
