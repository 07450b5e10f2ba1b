use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::fragments::{
    GraphData, ImageReading, SecondaryAnalysis, parse_graph_data, parse_image_reading,
    parse_secondary,
};

use super::{AnalysisClient, AnalysisError, AnalyzeRequest, DescribeImageRequest, SecondaryRequest};

/// Client for the analysis service's `/api/analyze` and `/api/describe-image`
/// endpoints.
pub struct HttpAnalysisClient {
    client: Client,
    base_url: String,
}

impl HttpAnalysisClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<String, AnalysisError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "posting analysis request");

        let response = self.client.post(&url).json(body).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status.as_u16(), response));
        }

        let text = response.text()?;
        info!(%url, bytes = text.len(), "analysis response received");
        Ok(text)
    }
}

/// The service reports failures as `{ "error": "..." }`.
fn status_error(status: u16, response: Response) -> AnalysisError {
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("error")?.as_str().map(str::to_owned))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("analysis failed with status {status}"));

    AnalysisError::Status { status, message }
}

impl AnalysisClient for HttpAnalysisClient {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn analyze(&self, request: &AnalyzeRequest) -> Result<GraphData, AnalysisError> {
        let body = self.post("/api/analyze", request)?;
        Ok(parse_graph_data(&body)?)
    }

    fn analyze_secondary(&self, request: &SecondaryRequest) -> Result<SecondaryAnalysis, AnalysisError> {
        let body = self.post("/api/analyze/secondary", request)?;
        Ok(parse_secondary(&body)?)
    }

    fn describe_image(&self, request: &DescribeImageRequest) -> Result<ImageReading, AnalysisError> {
        let body = self.post("/api/describe-image", request)?;
        Ok(parse_image_reading(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let client = HttpAnalysisClient::new("http://localhost:3001//", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001");
        assert_eq!(client.name(), "http://localhost:3001");
    }

    #[test]
    fn unreachable_service_is_an_http_error() {
        let client = HttpAnalysisClient::new("http://127.0.0.1:9", Duration::from_millis(300)).unwrap();
        let fragments = [
            crate::fragments::Fragment::text("f1", "a"),
            crate::fragments::Fragment::text("f2", "b"),
        ];
        let request = AnalyzeRequest::new(&fragments).unwrap();

        assert!(matches!(client.analyze(&request), Err(AnalysisError::Http(_))));
    }
}
