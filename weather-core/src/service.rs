use std::sync::Arc;

use crate::{
    error::{QueryError, Result},
    export,
    model::{QueryDraft, QueryInput, QueryRequest, SavedQuery},
    provider::{ForecastSource, Geocoder},
    store::QueryStore,
};

/// CSV body plus the filename suggested to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

/// Runs one request: validate, resolve the location, fetch the forecast, persist.
#[derive(Debug, Clone)]
pub struct QueryService {
    geocoder: Arc<dyn Geocoder>,
    forecast: Arc<dyn ForecastSource>,
    store: Arc<dyn QueryStore>,
}

impl QueryService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        forecast: Arc<dyn ForecastSource>,
        store: Arc<dyn QueryStore>,
    ) -> Self {
        Self {
            geocoder,
            forecast,
            store,
        }
    }

    pub async fn create(&self, request: &QueryRequest) -> Result<SavedQuery> {
        let input = request.validate()?;
        let draft = self.build_draft(input).await?;
        let saved = self.store.create(draft).await?;

        tracing::info!(
            id = %saved.id,
            location = %saved.raw_location,
            samples = saved.samples.len(),
            "query saved"
        );
        Ok(saved)
    }

    pub async fn list(&self) -> Result<Vec<SavedQuery>> {
        let records = self.store.list().await?;
        tracing::debug!(count = records.len(), "queries listed");
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<SavedQuery> {
        self.store.get(id).await
    }

    /// Re-resolves and re-fetches, then replaces the stored record.
    ///
    /// The id is checked first so that an unknown id never reaches the adapters.
    pub async fn update(&self, id: &str, request: &QueryRequest) -> Result<SavedQuery> {
        let input = request.validate()?;
        self.store.get(id).await?;

        let draft = self.build_draft(input).await?;
        let updated = self.store.update(id, draft).await?;

        tracing::info!(
            id,
            location = %updated.raw_location,
            samples = updated.samples.len(),
            "query updated"
        );
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(id).await?;
        tracing::info!(id, "query deleted");
        Ok(())
    }

    pub async fn export_all(&self) -> Result<CsvExport> {
        let records = self.store.list().await?;
        tracing::debug!(count = records.len(), "exporting all queries");
        Ok(CsvExport {
            filename: export::export_all_filename().to_string(),
            content: export::project(&records)?,
        })
    }

    pub async fn export_one(&self, id: &str) -> Result<CsvExport> {
        let record = self.store.get(id).await?;
        tracing::debug!(id, samples = record.samples.len(), "exporting query");
        Ok(CsvExport {
            filename: export::export_one_filename(id),
            content: export::project([&record])?,
        })
    }

    async fn build_draft(&self, input: QueryInput) -> Result<QueryDraft> {
        let resolved = self
            .geocoder
            .resolve(&input.location)
            .await
            .map_err(QueryError::adapter)?;

        let samples = self
            .forecast
            .fetch(resolved.latitude, resolved.longitude, input.range)
            .await
            .map_err(QueryError::adapter)?;

        Ok(QueryDraft {
            raw_location: input.location,
            resolved_location: resolved,
            date_range: input.range,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{DateRange, ResolvedLocation, WeatherSample},
        provider::{ForecastSlot, select_noon_samples},
        store::MemoryStore,
    };
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct FakeGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn resolve(&self, location: &str) -> Result<ResolvedLocation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if location == "Atlantis" {
                return Err(QueryError::not_found("Location not found"));
            }
            Ok(ResolvedLocation {
                latitude: 40.71,
                longitude: -74.0,
                city_name: location.to_string(),
                country_code: "US".to_string(),
            })
        }
    }

    /// Noon entries for 2024-01-01..=03 only, like a feed near the end of its horizon.
    #[derive(Debug)]
    struct FakeForecast;

    #[async_trait]
    impl ForecastSource for FakeForecast {
        async fn fetch(&self, _: f64, _: f64, range: DateRange) -> Result<Vec<WeatherSample>> {
            let slots = (1..=3).flat_map(|d| {
                [0, 12].map(|h| ForecastSlot {
                    timestamp: NaiveDateTime::parse_from_str(
                        &format!("2024-01-0{d} {h:02}:00:00"),
                        "%Y-%m-%d %H:%M:%S",
                    )
                    .unwrap(),
                    temperature: f64::from(d * 10 + h),
                    description: "clear sky".to_string(),
                })
            });
            Ok(select_noon_samples(slots, range))
        }
    }

    fn service() -> (QueryService, Arc<FakeGeocoder>) {
        let geocoder = Arc::new(FakeGeocoder::default());
        let service = QueryService::new(
            geocoder.clone(),
            Arc::new(FakeForecast),
            Arc::new(MemoryStore::new()),
        );
        (service, geocoder)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn create_keeps_days_inside_range_and_horizon() {
        let (service, _) = service();

        let saved = service
            .create(&QueryRequest::new("New York", "2024-01-01", "2024-01-05"))
            .await
            .unwrap();

        let dates: Vec<NaiveDate> = saved.samples.iter().map(|s| s.date).collect();
        assert_eq!(dates, [date("2024-01-01"), date("2024-01-02"), date("2024-01-03")]);
        assert!(saved.samples.iter().all(|s| saved.date_range.contains(s.date)));
        assert_eq!(saved.resolved_location.city_name, "New York");
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let (service, _) = service();
        let saved = service
            .create(&QueryRequest::new("New York", "2024-01-02", "2024-01-02"))
            .await
            .unwrap();

        let fetched = service.get(&saved.id).await.unwrap();
        assert_eq!(fetched.raw_location, saved.raw_location);
        assert_eq!(fetched.date_range, saved.date_range);
        assert_eq!(fetched.samples, saved.samples);
    }

    #[tokio::test]
    async fn invalid_create_never_touches_store_or_adapters() {
        let (service, geocoder) = service();

        let err = service
            .create(&QueryRequest::new("New York", "2024-01-05", "2024-01-01"))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn geocoding_miss_is_wrapped_as_adapter_failure() {
        let (service, _) = service();

        let err = service
            .create(&QueryRequest::new("Atlantis", "2024-01-01", "2024-01-02"))
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::Adapter(_)));
        assert_eq!(err.to_string(), "Location not found");
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found_without_adapter_calls() {
        let (service, geocoder) = service();

        let err = service
            .update("nope", &QueryRequest::new("Boston", "2024-01-01", "2024-01-02"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn update_with_missing_fields_keeps_record() {
        let (service, geocoder) = service();
        let saved = service
            .create(&QueryRequest::new("New York", "2024-01-01", "2024-01-03"))
            .await
            .unwrap();

        for request in [
            QueryRequest::default(),
            QueryRequest::new("  ", "2024-01-01", "2024-01-02"),
        ] {
            let err = service.update(&saved.id, &request).await.unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.to_string(), "Location and date range required");
        }

        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.get(&saved.id).await.unwrap(), saved);
    }

    #[tokio::test]
    async fn update_refetches_samples() {
        let (service, geocoder) = service();
        let saved = service
            .create(&QueryRequest::new("New York", "2024-01-01", "2024-01-03"))
            .await
            .unwrap();

        let updated = service
            .update(&saved.id, &QueryRequest::new("Boston", "2024-01-03", "2024-01-04"))
            .await
            .unwrap();

        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.created_at, saved.created_at);
        assert_eq!(updated.raw_location, "Boston");
        assert_eq!(updated.samples.len(), 1);
        assert_eq!(updated.samples[0].date, date("2024-01-03"));
    }

    #[tokio::test]
    async fn delete_then_list_omits_record() {
        let (service, _) = service();
        let a = service
            .create(&QueryRequest::new("A", "2024-01-01", "2024-01-01"))
            .await
            .unwrap();
        let b = service
            .create(&QueryRequest::new("B", "2024-01-01", "2024-01-01"))
            .await
            .unwrap();

        service.delete(&a.id).await.unwrap();

        let ids: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, [b.id]);
    }

    #[tokio::test]
    async fn export_one_names_file_after_id() {
        let (service, _) = service();
        let saved = service
            .create(&QueryRequest::new("New York", "2024-01-01", "2024-01-05"))
            .await
            .unwrap();

        let export = service.export_one(&saved.id).await.unwrap();
        assert_eq!(export.filename, format!("weather_query_{}.csv", saved.id));
        assert_eq!(export.content.lines().count(), 4);

        assert!(
            service
                .export_one("missing")
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn export_all_covers_every_record() {
        let (service, _) = service();
        for loc in ["A", "B"] {
            service
                .create(&QueryRequest::new(loc, "2024-01-01", "2024-01-02"))
                .await
                .unwrap();
        }

        let export = service.export_all().await.unwrap();
        assert_eq!(export.filename, "weather_data.csv");
        assert_eq!(export.content.lines().count(), 1 + 2 * 2);
    }
}
