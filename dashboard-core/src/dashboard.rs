use chrono::{DateTime, Utc};

use crate::{
    geolocation::Geolocator,
    model::{Coordinates, LocationQuery, UnitSystem},
    provider::WeatherSource,
    state::{DashboardState, RequestToken},
};

/// Drives [`DashboardState`] from user events and upstream results.
///
/// Fetch failures never escape: they end up as state, which is what the view
/// layer reads.
#[derive(Debug)]
pub struct Dashboard {
    source: Box<dyn WeatherSource>,
    geolocator: Option<Box<dyn Geolocator>>,
    state: DashboardState,
}

impl Dashboard {
    pub fn new(source: Box<dyn WeatherSource>, units: UnitSystem) -> Self {
        Self {
            source,
            geolocator: None,
            state: DashboardState::new(units, Utc::now()),
        }
    }

    pub fn with_geolocator(mut self, geolocator: Box<dyn Geolocator>) -> Self {
        self.geolocator = Some(geolocator);
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// A new search box value. Blank input is recorded but fetches nothing.
    pub async fn search(&mut self, query: &str) {
        self.state.query_changed(query);

        let name = query.trim();
        if name.is_empty() {
            return;
        }
        self.fetch_by_name(name.to_string()).await;
    }

    /// Fetch for the geolocator's position. Returns `false` when no position was available.
    pub async fn locate(&mut self) -> bool {
        let Some(geolocator) = self.geolocator.as_ref() else {
            return false;
        };

        match geolocator.current_position().await {
            Ok(coords) => {
                self.fetch_by_coordinates(coords).await;
                true
            }
            Err(err) => {
                tracing::debug!(error = %err, "geolocation unavailable, keeping current state");
                false
            }
        }
    }

    /// Switch units and refetch everything for the current location.
    pub async fn toggle_units(&mut self) {
        let units = self.state.unit_toggled();
        tracing::info!(%units, "units toggled");
        self.refresh().await;
    }

    /// Refetch for the current query, or for the geolocated position when there is none.
    pub async fn refresh(&mut self) {
        let query = self.state.query().trim().to_string();
        if query.is_empty() {
            self.locate().await;
        } else {
            self.fetch_by_name(query).await;
        }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.state.tick(now);
    }

    /// Current + forecast together, then air quality for the resolved coordinates.
    pub async fn fetch_by_name(&mut self, name: String) {
        let query = LocationQuery::Name(name);
        let units = self.state.units();
        let token = self.state.fetch_started();

        let (current, forecast) = tokio::join!(
            self.source.current_conditions(&query, units),
            self.source.forecast(&query, units),
        );

        let coords = match (current, forecast) {
            (Ok(current), Ok(forecast)) => {
                let coords = current.coordinates;
                self.state.fetch_succeeded(token, &query, current, forecast);
                coords
            }
            (Err(err), _) | (Ok(_), Err(err)) => {
                self.state.fetch_failed(token, &err);
                return;
            }
        };

        self.fetch_air_quality(token, coords).await;
    }

    /// All three lookups in one batch, since the coordinates are already known.
    pub async fn fetch_by_coordinates(&mut self, coords: Coordinates) {
        let query = LocationQuery::Coordinates(coords);
        let units = self.state.units();
        let token = self.state.fetch_started();

        let (current, forecast, air) = tokio::join!(
            self.source.current_conditions(&query, units),
            self.source.forecast(&query, units),
            self.source.air_quality(coords),
        );

        match (current, forecast) {
            (Ok(current), Ok(forecast)) => {
                self.state.fetch_succeeded(token, &query, current, forecast);
            }
            (Err(err), _) | (Ok(_), Err(err)) => {
                self.state.fetch_failed(token, &err);
                return;
            }
        }

        match air {
            Ok(sample) => self.state.air_quality_received(token, sample),
            Err(err) => self.state.air_quality_failed(token, &err),
        };
    }

    async fn fetch_air_quality(&mut self, token: RequestToken, coords: Coordinates) {
        match self.source.air_quality(coords).await {
            Ok(sample) => self.state.air_quality_received(token, sample),
            Err(err) => self.state.air_quality_failed(token, &err),
        };
    }
}
