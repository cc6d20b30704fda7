use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// One day's representative reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub date: NaiveDate,
    #[serde(rename = "temp")]
    pub temperature: f64,
    pub description: String,
}

/// Best geocoding match for a free-text location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    #[serde(rename = "city")]
    pub city_name: String,
    #[serde(rename = "country")]
    pub country_code: String,
}

/// Inclusive calendar-date range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    #[serde(rename = "startDate")]
    start: NaiveDate,
    #[serde(rename = "endDate")]
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    #[serde(rename = "startDate")]
    start: NaiveDate,
    #[serde(rename = "endDate")]
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = QueryError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, QueryError> {
        if start > end {
            return Err(QueryError::validation(INVALID_RANGE));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A persisted lookup: the input, where it resolved to, and its daily samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: String,
    #[serde(rename = "location")]
    pub raw_location: String,
    #[serde(rename = "locationData")]
    pub resolved_location: ResolvedLocation,
    #[serde(rename = "dateRange")]
    pub date_range: DateRange,
    #[serde(rename = "weatherRecords")]
    pub samples: Vec<WeatherSample>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl SavedQuery {
    /// Replace every mutable field, keeping `id` and `created_at`.
    pub fn apply(&mut self, draft: QueryDraft) {
        self.raw_location = draft.raw_location;
        self.resolved_location = draft.resolved_location;
        self.date_range = draft.date_range;
        self.samples = draft.samples;
    }
}

/// Everything the store needs to create or replace a record.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDraft {
    pub raw_location: String,
    pub resolved_location: ResolvedLocation,
    pub date_range: DateRange,
    pub samples: Vec<WeatherSample>,
}

/// Body of a create/update request, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// A validated [`QueryRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryInput {
    pub location: String,
    pub range: DateRange,
}

pub const MISSING_FIELDS: &str = "Location and date range required";
pub const INVALID_RANGE: &str = "Invalid date range";

impl QueryRequest {
    pub fn new(
        location: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            location: Some(location.into()),
            start_date: Some(start_date.into()),
            end_date: Some(end_date.into()),
        }
    }

    pub fn validate(&self) -> Result<QueryInput, QueryError> {
        let (Some(location), Some(start), Some(end)) = (
            non_blank(&self.location),
            non_blank(&self.start_date),
            non_blank(&self.end_date),
        ) else {
            return Err(QueryError::validation(MISSING_FIELDS));
        };

        let start = parse_date(start).ok_or_else(|| QueryError::validation(INVALID_RANGE))?;
        let end = parse_date(end).ok_or_else(|| QueryError::validation(INVALID_RANGE))?;

        Ok(QueryInput {
            location: location.to_string(),
            range: DateRange::new(start, end)?,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (date taken in UTC).
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn validate_accepts_plain_dates() {
        let input = QueryRequest::new("  New York ", "2024-01-01", "2024-01-05")
            .validate()
            .expect("valid request");

        assert_eq!(input.location, "New York");
        assert_eq!(input.range.start(), date("2024-01-01"));
        assert_eq!(input.range.end(), date("2024-01-05"));
    }

    #[test]
    fn validate_accepts_rfc3339_timestamps() {
        let input = QueryRequest::new("Paris", "2024-03-01T00:00:00Z", "2024-03-02T23:00:00+00:00")
            .validate()
            .unwrap();
        assert_eq!(input.range.end(), date("2024-03-02"));
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let cases = [
            QueryRequest {
                location: None,
                ..QueryRequest::new("x", "2024-01-01", "2024-01-02")
            },
            QueryRequest {
                start_date: None,
                ..QueryRequest::new("x", "2024-01-01", "2024-01-02")
            },
            QueryRequest {
                end_date: Some("  ".into()),
                ..QueryRequest::new("x", "2024-01-01", "2024-01-02")
            },
            QueryRequest::new("", "2024-01-01", "2024-01-02"),
        ];

        for req in cases {
            let err = req.validate().unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.to_string(), MISSING_FIELDS);
        }
    }

    #[test]
    fn validate_rejects_reversed_or_garbage_range() {
        let reversed = QueryRequest::new("x", "2024-01-05", "2024-01-01")
            .validate()
            .unwrap_err();
        assert_eq!(reversed.to_string(), INVALID_RANGE);

        let garbage = QueryRequest::new("x", "yesterday", "2024-01-01")
            .validate()
            .unwrap_err();
        assert_eq!(garbage.to_string(), INVALID_RANGE);
    }

    #[test]
    fn single_day_range_contains_only_that_day() {
        let range = DateRange::new(date("2024-01-02"), date("2024-01-02")).unwrap();
        assert!(range.contains(date("2024-01-02")));
        assert!(!range.contains(date("2024-01-01")));
        assert!(!range.contains(date("2024-01-03")));
    }

    #[test]
    fn saved_query_uses_wire_field_names() {
        let query = SavedQuery {
            id: "abc".into(),
            raw_location: "London".into(),
            resolved_location: ResolvedLocation {
                latitude: 51.5,
                longitude: -0.12,
                city_name: "London".into(),
                country_code: "GB".into(),
            },
            date_range: DateRange::new(date("2024-01-01"), date("2024-01-02")).unwrap(),
            samples: vec![WeatherSample {
                date: date("2024-01-01"),
                temperature: 41.5,
                description: "light rain".into(),
            }],
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["location"], "London");
        assert_eq!(json["locationData"]["country"], "GB");
        assert_eq!(json["dateRange"]["startDate"], "2024-01-01");
        assert_eq!(json["weatherRecords"][0]["temp"], 41.5);

        let back: SavedQuery = serde_json::from_value(json).unwrap();
        assert_eq!(back, query);
    }

    #[test]
    fn reversed_range_fails_to_deserialize() {
        let json = serde_json::json!({"startDate": "2024-02-01", "endDate": "2024-01-01"});
        assert!(serde_json::from_value::<DateRange>(json).is_err());
    }
}
