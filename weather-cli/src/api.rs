use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response};
use serde::Deserialize;
use weather_core::{QueryRequest, SavedQuery};

/// HTTP client for the weather-server `/api/queries` routes.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn queries_url(&self) -> String {
        format!("{}/queries", self.base_url)
    }

    fn query_url(&self, id: &str) -> String {
        format!("{}/queries/{}", self.base_url, id)
    }

    pub async fn create(
        &self,
        location: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<SavedQuery> {
        let res = self
            .http
            .post(self.queries_url())
            .json(&QueryRequest::new(location, start_date, end_date))
            .send()
            .await
            .context("Failed to reach the weather server")?;

        let res = check(res, "Failed to create weather query").await?;
        res.json().await.context("Failed to parse created query")
    }

    pub async fn list(&self) -> Result<Vec<SavedQuery>> {
        let res = self
            .http
            .get(self.queries_url())
            .send()
            .await
            .context("Failed to reach the weather server")?;

        if !res.status().is_success() {
            return Err(anyhow!("Failed to fetch queries"));
        }
        res.json().await.context("Failed to parse saved queries")
    }

    pub async fn update(
        &self,
        id: &str,
        location: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<SavedQuery> {
        let res = self
            .http
            .put(self.query_url(id))
            .json(&QueryRequest::new(location, start_date, end_date))
            .send()
            .await
            .context("Failed to reach the weather server")?;

        let res = check(res, "Failed to update query").await?;
        res.json().await.context("Failed to parse updated query")
    }

    /// Returns the server's confirmation message.
    pub async fn delete(&self, id: &str) -> Result<String> {
        let res = self
            .http
            .delete(self.query_url(id))
            .send()
            .await
            .context("Failed to reach the weather server")?;

        let res = check(res, "Failed to delete query").await?;
        let body: MessageBody = res.json().await.context("Failed to parse delete response")?;
        Ok(body.message)
    }

    /// CSV text of one saved query.
    pub async fn export_csv(&self, id: &str) -> Result<String> {
        let res = self
            .http
            .get(format!("{}/export", self.query_url(id)))
            .header(reqwest::header::ACCEPT, "text/csv")
            .send()
            .await
            .context("Failed to reach the weather server")?;

        let status = res.status();
        let text = res.text().await.context("Failed to read CSV export")?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| {
                    if text.trim().is_empty() { "Failed to export CSV".to_string() } else { text }
                });
            return Err(anyhow!(message));
        }
        Ok(text)
    }
}

/// Pass successful responses through; turn failures into `{error}` or `fallback`.
async fn check(res: Response, fallback: &str) -> Result<Response> {
    if res.status().is_success() {
        return Ok(res);
    }

    let message = res
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    Err(anyhow!(message))
}
