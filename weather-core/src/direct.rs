//! No-save weather lookups called straight from the client.
//!
//! This path never touches the query store and uses the client's own API key.
//! Its day reduction (every 8th 3-hour slot, first 5) is intentionally kept
//! separate from the noon filter in [`crate::provider::select_noon_samples`];
//! the two can disagree on which hour represents a day.

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::DEFAULT_OPENWEATHER_BASE_URL,
    model::WeatherSample,
    provider::openweather::{
        OwErrorBody, OwForecastEntry, OwMain, OwWeather, first_description, parse, send,
    },
};

/// Raw 3-hour slots per day in the upstream feed.
pub const SLOTS_PER_DAY: usize = 8;
pub const FORECAST_DAYS: usize = 5;

#[derive(Debug, Clone)]
pub struct DirectWeatherClient {
    api_key: String,
    base_url: String,
    units: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwFiveDayResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

impl DirectWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            units: "imperial".to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Current conditions as a single sample dated today (UTC).
    pub async fn current(&self, location: &str) -> Result<WeatherSample> {
        let body = self
            .get(
                "/data/2.5/weather",
                location,
                "current weather",
                "Failed to fetch current weather.",
            )
            .await?;
        let parsed: OwCurrentResponse = parse(&body, "current weather")?;

        Ok(WeatherSample {
            date: Utc::now().date_naive(),
            temperature: parsed.main.temp.round(),
            description: first_description(&parsed.weather),
        })
    }

    /// One raw slot per day for the next five days.
    pub async fn five_day(&self, location: &str) -> Result<Vec<WeatherSample>> {
        let body = self
            .get("/data/2.5/forecast", location, "forecast", "Failed to fetch forecast.")
            .await?;
        let parsed: OwFiveDayResponse = parse(&body, "forecast")?;
        every_eighth_slot(parsed.list)
    }

    async fn get(&self, path: &str, location: &str, what: &str, fallback: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let query = [
            ("q", location),
            ("appid", self.api_key.as_str()),
            ("units", self.units.as_str()),
        ];

        let (status, body) = send(&self.http, &url, &query, what).await?;
        if !status.is_success() {
            let message = serde_json::from_str::<OwErrorBody>(&body)
                .ok()
                .and_then(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| fallback.to_string());
            return Err(anyhow!(message));
        }

        Ok(body)
    }
}

fn every_eighth_slot(list: Vec<OwForecastEntry>) -> Result<Vec<WeatherSample>> {
    list.into_iter()
        .step_by(SLOTS_PER_DAY)
        .take(FORECAST_DAYS)
        .map(|entry| {
            let day = entry.dt_txt.split(' ').next().unwrap_or_default();
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|e| anyhow!("Unexpected forecast timestamp '{}': {e}", entry.dt_txt))?;
            Ok(WeatherSample {
                date,
                temperature: entry.main.temp.round(),
                description: entry.description(),
            })
        })
        .collect()
}
