//! Views derived from a forecast series.
//!
//! Both views are recomputed on every render; a five-day, three-hour-step
//! forecast is around forty samples, so there is nothing worth caching.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

use crate::model::ForecastSample;

/// Number of leading samples shown in the hourly view.
pub const HOURLY_SAMPLES: usize = 8;

/// Maximum number of days in the daily view.
pub const DAILY_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPoint {
    pub timestamp: DateTime<Utc>,
    /// Time of day in the viewer's zone, `HH:MM`.
    pub label: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Arithmetic mean of every sample on `date`.
    pub temperature: f64,
    /// Description of the first sample encountered for `date`.
    pub condition: String,
    pub samples: usize,
}

/// First [`HOURLY_SAMPLES`] samples, verbatim, labelled in `tz`.
pub fn hourly_view<Tz: TimeZone>(series: &[ForecastSample], tz: &Tz) -> Vec<HourlyPoint>
where
    Tz::Offset: std::fmt::Display,
{
    series
        .iter()
        .take(HOURLY_SAMPLES)
        .map(|sample| HourlyPoint {
            timestamp: sample.timestamp,
            label: sample.timestamp.with_timezone(tz).format("%H:%M").to_string(),
            temperature: sample.temperature,
        })
        .collect()
}

struct DayAccumulator {
    sum: f64,
    count: usize,
    condition: String,
}

/// Groups samples by calendar day in `tz` and averages their temperature.
///
/// The result is ordered by date and holds at most [`DAILY_LIMIT`] days, the
/// earliest ones. Input order does not affect the means.
pub fn daily_view<Tz: TimeZone>(series: &[ForecastSample], tz: &Tz) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

    for sample in series {
        let date = sample.timestamp.with_timezone(tz).date_naive();
        days.entry(date)
            .and_modify(|acc| {
                acc.sum += sample.temperature;
                acc.count += 1;
            })
            .or_insert_with(|| DayAccumulator {
                sum: sample.temperature,
                count: 1,
                condition: sample.condition.clone(),
            });
    }

    days.into_iter()
        .take(DAILY_LIMIT)
        .map(|(date, acc)| DailySummary {
            date,
            temperature: acc.sum / acc.count as f64,
            condition: acc.condition,
            samples: acc.count,
        })
        .collect()
}
