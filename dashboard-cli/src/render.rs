//! Plain-text rendering of the dashboard.

use chrono::{NaiveDate, TimeZone};
use dashboard_core::{AirQualityState, DashboardState, UnitSystem};
use std::fmt;

const AQI_BAR_WIDTH: usize = 20;

/// Everything on screen for one frame. Views are derived from the state on every render.
pub struct DashboardView<'a, Tz: TimeZone> {
    state: &'a DashboardState,
    tz: Tz,
}

impl<'a, Tz: TimeZone> DashboardView<'a, Tz>
where
    Tz::Offset: fmt::Display,
{
    pub fn new(state: &'a DashboardState, tz: Tz) -> Self {
        Self { state, tz }
    }

    fn today(&self) -> NaiveDate {
        self.state.clock().with_timezone(&self.tz).date_naive()
    }

    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = self.state.clock().with_timezone(&self.tz);
        writeln!(f, "Weather Dashboard")?;
        writeln!(f, "Real-time weather and air quality updates")?;
        writeln!(f, "{}", clock.format("%a, %b %-d %Y | %H:%M:%S"))?;
        writeln!(
            f,
            "Units: {} ({})",
            self.state.units(),
            self.state.units().temperature_symbol()
        )
    }

    fn write_current(&self, f: &mut fmt::Formatter<'_>, units: UnitSystem) -> fmt::Result {
        let Some(current) = self.state.conditions() else {
            return Ok(());
        };

        writeln!(f)?;
        writeln!(f, "{}", current.place_name)?;
        writeln!(
            f,
            "  {}  {}",
            temperature(current.temperature, units),
            capitalize_words(&current.condition)
        )?;
        writeln!(
            f,
            "  Sunrise {} | Sunset {}",
            current.sunrise.with_timezone(&self.tz).format("%H:%M"),
            current.sunset.with_timezone(&self.tz).format("%H:%M"),
        )?;
        writeln!(
            f,
            "  Wind {} {}   Humidity {}%   Pressure {} hPa",
            current.wind_speed,
            units.wind_speed_unit(),
            current.humidity_pct,
            current.pressure_hpa
        )
    }

    fn write_forecast(&self, f: &mut fmt::Formatter<'_>, units: UnitSystem) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Next Hours")?;
        for point in self.state.hourly_view(&self.tz) {
            writeln!(
                f,
                "  {}  {:.1}{}",
                point.label,
                point.temperature,
                units.temperature_symbol()
            )?;
        }

        let today = self.today();
        writeln!(f)?;
        writeln!(f, "5-Day Forecast")?;
        for day in self.state.daily_view(&self.tz) {
            let label = if day.date == today {
                "Today".to_string()
            } else {
                day.date.format("%a").to_string()
            };
            writeln!(
                f,
                "  {:<6} {:<7} {:>6}  {}",
                label,
                day.date.format("%b %-d").to_string(),
                temperature(day.temperature, units),
                capitalize_words(&day.condition)
            )?;
        }
        Ok(())
    }

    fn write_air_quality(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Air Quality")?;

        match self.state.air_quality() {
            AirQualityState::Available(sample) => {
                let band = dashboard_core::classify(sample.aqi);
                writeln!(f, "  AQI: {}  {}", sample.aqi, band.description)?;
                writeln!(
                    f,
                    "  [{}] {}%",
                    bar(band.intensity_pct, AQI_BAR_WIDTH),
                    band.intensity_pct
                )
            }
            AirQualityState::Pending => writeln!(f, "  Loading air quality..."),
            AirQualityState::NotRequested | AirQualityState::Empty | AirQualityState::Failed => {
                writeln!(f, "  No AQI data available.")
            }
        }
    }
}

impl<Tz: TimeZone> fmt::Display for DashboardView<'_, Tz>
where
    Tz::Offset: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.state.units();
        self.write_header(f)?;

        if self.state.is_loading() {
            writeln!(f)?;
            writeln!(f, "Loading weather data...")?;
        }
        if let Some(error) = self.state.error() {
            writeln!(f)?;
            writeln!(f, "{error}")?;
        }

        if self.state.conditions().is_some() && self.state.forecast().is_some() {
            self.write_current(f, units)?;
            self.write_forecast(f, units)?;
            self.write_air_quality(f)?;
        }
        Ok(())
    }
}

fn temperature(value: f64, units: UnitSystem) -> String {
    format!("{}{}", value.round(), units.temperature_symbol())
}

fn bar(pct: u8, width: usize) -> String {
    let filled = (usize::from(pct.min(100)) * width) / 100;
    format!("{}{}", "#".repeat(filled), " ".repeat(width - filled))
}

fn capitalize_words(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use dashboard_core::{
        AirQualitySample, Coordinates, CurrentConditions, FetchError, ForecastSample,
        LocationQuery,
    };

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn loaded(units: UnitSystem) -> DashboardState {
        let mut state = DashboardState::new(units, ts("2024-01-01T09:30:05Z"));
        let token = state.fetch_started();
        state.fetch_succeeded(
            token,
            &LocationQuery::Name("London".into()),
            CurrentConditions {
                place_name: "London".into(),
                temperature: 11.6,
                condition: "broken clouds".into(),
                wind_speed: 4.63,
                humidity_pct: 82,
                pressure_hpa: 1014,
                sunrise: ts("2024-01-01T08:06:00Z"),
                sunset: ts("2024-01-01T16:02:00Z"),
                coordinates: Coordinates::new(51.5, -0.12),
            },
            vec![
                ForecastSample {
                    timestamp: ts("2024-01-01T00:00:00Z"),
                    temperature: 10.0,
                    condition: "clear sky".into(),
                },
                ForecastSample {
                    timestamp: ts("2024-01-01T03:00:00Z"),
                    temperature: 14.0,
                    condition: "clear sky".into(),
                },
                ForecastSample {
                    timestamp: ts("2024-01-02T00:00:00Z"),
                    temperature: 8.0,
                    condition: "light rain".into(),
                },
            ],
        );
        state
    }

    #[test]
    fn renders_loaded_dashboard() {
        let mut state = loaded(UnitSystem::Metric);
        let token = state.latest_token();
        state.air_quality_received(
            token,
            Some(AirQualitySample {
                aqi: 2,
                timestamp: ts("2024-01-01T09:00:00Z"),
            }),
        );

        let out = DashboardView::new(&state, Utc).to_string();

        assert!(out.contains("Mon, Jan 1 2024 | 09:30:05"));
        assert!(out.contains("London"));
        assert!(out.contains("12°C  Broken Clouds"));
        assert!(out.contains("Sunrise 08:06 | Sunset 16:02"));
        assert!(out.contains("Wind 4.63 m/s   Humidity 82%   Pressure 1014 hPa"));
        assert!(out.contains("  03:00  14.0°C"));
        assert!(out.contains("Today"));
        assert!(out.contains("Tue"));
        assert!(out.contains("Light Rain"));
        assert!(out.contains("AQI: 2  Fair - Air quality is acceptable"));
        assert!(out.contains("[########            ] 40%"));
        assert!(!out.contains("Loading weather data"));
    }

    #[test]
    fn renders_imperial_symbols() {
        let state = loaded(UnitSystem::Imperial);
        let out = DashboardView::new(&state, Utc).to_string();
        assert!(out.contains("°F"));
        assert!(out.contains("mph"));
        assert!(!out.contains("°C"));
    }

    #[test]
    fn renders_missing_air_quality() {
        let mut state = loaded(UnitSystem::Metric);
        let token = state.latest_token();
        state.air_quality_received(token, None);

        let out = DashboardView::new(&state, Utc).to_string();
        assert!(out.contains("No AQI data available."));
    }

    #[test]
    fn renders_error_without_weather_sections() {
        let mut state = loaded(UnitSystem::Metric);
        let token = state.fetch_started();
        state.fetch_failed(token, &FetchError::NotFound("city not found".into()));

        let out = DashboardView::new(&state, Utc).to_string();
        assert!(out.contains("city not found"));
        assert!(!out.contains("5-Day Forecast"));
        assert!(!out.contains("Air Quality"));
    }

    #[test]
    fn renders_loading_line() {
        let mut state = DashboardState::new(UnitSystem::Metric, ts("2024-01-01T00:00:00Z"));
        state.fetch_started();

        let out = DashboardView::new(&state, Utc).to_string();
        assert!(out.contains("Loading weather data..."));
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(0, 10), "          ");
        assert_eq!(bar(60, 10), "######    ");
        assert_eq!(bar(100, 10), "##########");
    }

    #[test]
    fn capitalizes_each_word() {
        assert_eq!(capitalize_words("scattered clouds"), "Scattered Clouds");
        assert_eq!(capitalize_words(""), "");
    }
}
