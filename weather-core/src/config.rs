use anyhow::{Context, Result, anyhow};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://weather_queries.db";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_UNITS: &str = "imperial";

/// Runtime configuration of the HTTP API, taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// OpenWeather API key used by the geocoder and forecast adapters.
    pub api_key: String,

    /// Store connection string, e.g. `sqlite://weather_queries.db` or `memory://`.
    pub database_url: String,

    pub port: u16,

    /// Single origin allowed by CORS (the client dev server).
    pub allowed_origin: String,

    pub openweather_base_url: String,

    /// `imperial`, `metric` or `standard`.
    pub units: String,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("OPENWEATHER_API_KEY")
            .or_else(|| get("VITE_OPENWEATHER_API_KEY"))
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: set OPENWEATHER_API_KEY in the environment or in a .env file."
                )
            })?;

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT value '{raw}'"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_key,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            port,
            allowed_origin: get("ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            openweather_base_url: get("OPENWEATHER_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENWEATHER_BASE_URL.to_string()),
            units: get("WEATHER_UNITS").unwrap_or_else(|| DEFAULT_UNITS.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let cfg = ServerConfig::from_lookup(lookup(&[("OPENWEATHER_API_KEY", "KEY")])).unwrap();

        assert_eq!(cfg.api_key, "KEY");
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.allowed_origin, DEFAULT_ALLOWED_ORIGIN);
        assert_eq!(cfg.openweather_base_url, DEFAULT_OPENWEATHER_BASE_URL);
        assert_eq!(cfg.units, "imperial");
    }

    #[test]
    fn missing_api_key_errors_with_hint() {
        let err = ServerConfig::from_lookup(lookup(&[])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No OpenWeather API key configured"));
        assert!(msg.contains("Hint: set OPENWEATHER_API_KEY"));
    }

    #[test]
    fn vite_key_is_accepted_as_fallback() {
        let cfg =
            ServerConfig::from_lookup(lookup(&[("VITE_OPENWEATHER_API_KEY", "VITE")])).unwrap();
        assert_eq!(cfg.api_key, "VITE");
    }

    #[test]
    fn overrides_are_read() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            ("OPENWEATHER_API_KEY", "KEY"),
            ("DATABASE_URL", "memory://"),
            ("PORT", "8080"),
            ("ALLOWED_ORIGIN", "https://weather.example"),
            ("OPENWEATHER_BASE_URL", "http://127.0.0.1:9999/"),
            ("WEATHER_UNITS", "metric"),
        ]))
        .unwrap();

        assert_eq!(cfg.database_url, "memory://");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.allowed_origin, "https://weather.example");
        assert_eq!(cfg.openweather_base_url, "http://127.0.0.1:9999");
        assert_eq!(cfg.units, "metric");
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[
            ("OPENWEATHER_API_KEY", "KEY"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("Invalid PORT value"));
    }
}
