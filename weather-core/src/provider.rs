use async_trait::async_trait;
use chrono::{NaiveDateTime, Timelike};
use std::fmt::Debug;

use crate::{
    error::Result,
    model::{DateRange, ResolvedLocation, WeatherSample},
};

pub mod openweather;

/// Hour of day (upstream local `dt_txt`) kept by [`select_noon_samples`].
pub const NOON_HOUR: u32 = 12;

/// Resolves free text (city, postal code, "lat,lon", landmark) to a single place.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn resolve(&self, location: &str) -> Result<ResolvedLocation>;
}

/// Produces one sample per day for the given coordinates and range.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch(&self, latitude: f64, longitude: f64, range: DateRange)
    -> Result<Vec<WeatherSample>>;
}

/// A raw 3-hour forecast slot before day reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSlot {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub description: String,
}

/// Keep the slots at exactly 12:00:00 whose calendar date lies in `range`.
///
/// Upstream order is preserved. Ranges beyond the feed's horizon simply
/// produce fewer (or no) samples.
pub fn select_noon_samples<I>(slots: I, range: DateRange) -> Vec<WeatherSample>
where
    I: IntoIterator<Item = ForecastSlot>,
{
    slots
        .into_iter()
        .filter(|slot| {
            let t = slot.timestamp.time();
            t.hour() == NOON_HOUR && t.minute() == 0 && t.second() == 0
        })
        .filter(|slot| range.contains(slot.timestamp.date()))
        .map(|slot| WeatherSample {
            date: slot.timestamp.date(),
            temperature: slot.temperature,
            description: slot.description,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn slot(ts: &str, temp: f64) -> ForecastSlot {
        ForecastSlot {
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            temperature: temp,
            description: format!("at {ts}"),
        }
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(
            NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
        )
        .unwrap()
    }

    fn three_day_feed() -> Vec<ForecastSlot> {
        let mut feed = Vec::new();
        for day in 1..=3 {
            for hour in (0..24).step_by(3) {
                feed.push(slot(&format!("2024-01-0{day} {hour:02}:00:00"), f64::from(hour)));
            }
        }
        feed
    }

    #[test]
    fn keeps_one_noon_sample_per_day() {
        let samples = select_noon_samples(three_day_feed(), range("2024-01-01", "2024-01-05"));

        let dates: Vec<String> = samples.iter().map(|s| s.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert!(samples.iter().all(|s| s.temperature == 12.0));
    }

    #[test]
    fn end_date_is_inclusive() {
        let samples = select_noon_samples(three_day_feed(), range("2024-01-02", "2024-01-02"));
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].date.to_string(), "2024-01-02");
    }

    #[test]
    fn range_past_horizon_is_empty_not_error() {
        let samples = select_noon_samples(three_day_feed(), range("2024-02-01", "2024-02-10"));
        assert!(samples.is_empty());
    }

    #[test]
    fn off_the_hour_slots_are_ignored() {
        let feed = vec![slot("2024-01-01 12:30:00", 1.0), slot("2024-01-01 11:00:00", 2.0)];
        assert!(select_noon_samples(feed, range("2024-01-01", "2024-01-01")).is_empty());
    }
}
