use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::{DEFAULT_OPENWEATHER_BASE_URL, DEFAULT_UNITS, ServerConfig},
    error::{QueryError, Result},
    model::{DateRange, ResolvedLocation, WeatherSample},
    provider::{ForecastSlot, select_noon_samples},
};

use super::{ForecastSource, Geocoder};

pub const LOCATION_NOT_FOUND: &str = "Location not found";
pub const FORECAST_FETCH_FAILED: &str = "Weather data fetch failed";

/// Geocoding and 5-day/3-hour forecast adapter for api.openweathermap.org.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    units: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            units: DEFAULT_UNITS.to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.api_key.clone())
            .with_base_url(&config.openweather_base_url)
            .with_units(&config.units)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_units(mut self, units: &str) -> Self {
        self.units = units.to_string();
        self
    }
}

#[async_trait]
impl Geocoder for OpenWeatherProvider {
    async fn resolve(&self, location: &str) -> Result<ResolvedLocation> {
        let url = format!("{}/geo/1.0/direct", self.base_url);
        let query = [("q", location), ("limit", "1"), ("appid", self.api_key.as_str())];

        let (status, body) = send(&self.http, &url, &query, "geocoding").await?;
        if !status.is_success() {
            return Err(QueryError::upstream(format!(
                "OpenWeather geocoding request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let matches: Vec<OwGeoMatch> = parse(&body, "geocoding")?;
        let best = matches
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::not_found(LOCATION_NOT_FOUND))?;

        tracing::debug!(location, city = %best.name, lat = best.lat, lon = best.lon, "geocoded");

        Ok(ResolvedLocation {
            latitude: best.lat,
            longitude: best.lon,
            city_name: best.name,
            country_code: best.country.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ForecastSource for OpenWeatherProvider {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        range: DateRange,
    ) -> Result<Vec<WeatherSample>> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        let (lat, lon) = (latitude.to_string(), longitude.to_string());
        let query = [
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("appid", self.api_key.as_str()),
            ("units", self.units.as_str()),
        ];

        let (status, body) = send(&self.http, &url, &query, "forecast").await?;
        if !status.is_success() {
            return Err(QueryError::upstream(format!(
                "{FORECAST_FETCH_FAILED}: OpenWeather forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: OwForecastResponse = parse(&body, "forecast")?;
        let list = parsed.list.ok_or_else(|| QueryError::upstream(FORECAST_FETCH_FAILED))?;

        let slots = list.into_iter().filter_map(|entry| match entry.timestamp() {
            Some(timestamp) => Some(ForecastSlot {
                timestamp,
                temperature: entry.main.temp,
                description: entry.description(),
            }),
            None => {
                tracing::warn!(
                    dt_txt = %entry.dt_txt,
                    "skipping forecast entry with bad timestamp"
                );
                None
            }
        });

        let samples = select_noon_samples(slots, range);
        tracing::debug!(count = samples.len(), "forecast reduced to noon samples");
        Ok(samples)
    }
}

pub(crate) async fn send(
    http: &Client,
    url: &str,
    query: &[(&str, &str)],
    what: &str,
) -> Result<(StatusCode, String)> {
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| {
            QueryError::upstream(format!("Failed to send request to OpenWeather ({what}): {e}"))
        })?;

    let status = res.status();
    let body = res.text().await.map_err(|e| {
        QueryError::upstream(format!("Failed to read OpenWeather {what} response body: {e}"))
    })?;

    Ok((status, body))
}

pub(crate) fn parse<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| QueryError::upstream(format!("Failed to parse OpenWeather {what} JSON: {e}")))
}

#[derive(Debug, Deserialize)]
struct OwGeoMatch {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwMain {
    pub temp: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwWeather {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastEntry {
    pub dt_txt: String,
    pub main: OwMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
}

impl OwForecastEntry {
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.dt_txt, "%Y-%m-%d %H:%M:%S").ok()
    }

    pub fn description(&self) -> String {
        first_description(&self.weather)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastResponse {
    pub list: Option<Vec<OwForecastEntry>>,
}

/// Error payload OpenWeather returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct OwErrorBody {
    pub message: Option<String>,
}

pub(crate) fn first_description(weather: &[OwWeather]) -> String {
    weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::new("KEY".into()).with_base_url(&server.uri())
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(
            NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
        )
        .unwrap()
    }

    fn entry(dt_txt: &str, temp: f64, description: &str) -> serde_json::Value {
        json!({
            "dt_txt": dt_txt,
            "main": { "temp": temp, "feels_like": temp, "humidity": 50 },
            "weather": [{ "main": "Clouds", "description": description }]
        })
    }

    #[tokio::test]
    async fn resolve_takes_first_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "New York"))
            .and(query_param("limit", "1"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "New York", "lat": 40.71, "lon": -74.0, "country": "US" },
                { "name": "New York", "lat": 55.0, "lon": -1.6, "country": "GB" }
            ])))
            .mount(&server)
            .await;

        let loc = provider(&server).resolve("New York").await.unwrap();

        assert_eq!(loc.city_name, "New York");
        assert_eq!(loc.country_code, "US");
        assert_eq!(loc.latitude, 40.71);
        assert_eq!(loc.longitude, -74.0);
    }

    #[tokio::test]
    async fn resolve_zero_matches_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = provider(&server).resolve("Atlantis").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), LOCATION_NOT_FOUND);
    }

    #[tokio::test]
    async fn resolve_error_status_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "cod": 401, "message": "Invalid API key" })),
            )
            .mount(&server)
            .await;

        let err = provider(&server).resolve("Paris").await.unwrap_err();
        assert!(matches!(err, QueryError::Upstream(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn fetch_filters_to_noon_within_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("lat", "40.71"))
            .and(query_param("lon", "-74"))
            .and(query_param("units", "imperial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cod": "200",
                "list": [
                    entry("2024-01-01 09:00:00", 30.0, "mist"),
                    entry("2024-01-01 12:00:00", 35.5, "clear sky"),
                    entry("2024-01-02 12:00:00", 38.0, "few clouds"),
                    entry("2024-01-03 12:00:00", 40.1, "light rain"),
                    entry("2024-01-03 15:00:00", 41.0, "light rain"),
                    entry("not a timestamp", 0.0, "broken")
                ]
            })))
            .mount(&server)
            .await;

        let samples = provider(&server)
            .fetch(40.71, -74.0, range("2024-01-01", "2024-01-05"))
            .await
            .unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].date.to_string(), "2024-01-01");
        assert_eq!(samples[0].temperature, 35.5);
        assert_eq!(samples[0].description, "clear sky");
        assert_eq!(samples[2].date.to_string(), "2024-01-03");
    }

    #[tokio::test]
    async fn fetch_without_list_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cod": "200" })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .fetch(1.0, 2.0, range("2024-01-01", "2024-01-02"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), FORECAST_FETCH_FAILED);
    }

    #[test]
    fn truncate_body_is_char_safe() {
        let long = "é".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
