//! Core library for the weather query service.
//!
//! This crate defines:
//! - Shared domain models (saved queries, daily samples, date ranges)
//! - Geocoding and forecast adapters over OpenWeather
//! - Query persistence (in-memory and SQLite document stores)
//! - CSV projection of saved queries
//! - The request pipeline tying them together
//!
//! It is used by `weather-server` and `weather-cli`.

pub mod config;
pub mod direct;
pub mod error;
pub mod export;
pub mod model;
pub mod provider;
pub mod service;
pub mod store;

pub use config::ServerConfig;
pub use direct::DirectWeatherClient;
pub use error::QueryError;
pub use model::{DateRange, QueryDraft, QueryRequest, ResolvedLocation, SavedQuery, WeatherSample};
pub use provider::{ForecastSource, Geocoder, openweather::OpenWeatherProvider};
pub use service::{CsvExport, QueryService};
pub use store::QueryStore;
