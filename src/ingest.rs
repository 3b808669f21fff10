//! HTTP client for the analysis backend.
//!
//! Two ingestion paths exist: scraping a page through the Graph API and
//! uploading a CSV of comments. Both return an [`AnalysisResponse`] that
//! replaces the current snapshot wholesale.

use crate::config::AppConfig;
use crate::error::IngestError;
use crate::types::AnalysisResponse;
use serde::Serialize;

/// Body of `POST /scrape-analyze`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeRequest {
    /// Graph API access token
    pub graph_api_key: String,
    /// Page name or id to scrape
    pub page: String,
    /// Upper bound on scraped posts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_posts: Option<u32>,
    /// Upper bound on comments per post
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_comments: Option<u32>,
    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
}

/// Client for the ingestion endpoints.
#[derive(Debug, Clone)]
pub struct IngestClient {
    client: reqwest::Client,
    base_url: String,
}

impl IngestClient {
    /// Builds a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, IngestError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(std::time::Duration::from_secs(config.request_timeout_secs));
        Ok(Self {
            client: builder.build()?,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client against an explicit base URL with default settings.
    ///
    /// # Errors
    ///
    /// [`IngestError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(base_url: &str) -> Result<Self, IngestError> {
        reqwest::Url::parse(base_url).map_err(|e| IngestError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Self::new(&AppConfig { api_base_url: base_url.to_string(), ..AppConfig::default() })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scrapes and analyzes a page.
    ///
    /// # Errors
    ///
    /// [`IngestError::Rejected`] on a non-success status, [`IngestError::Http`]
    /// on transport or decoding failures.
    pub async fn scrape_analyze(&self, request: &ScrapeRequest) -> Result<AnalysisResponse, IngestError> {
        log::info!("Requesting scrape-analyze for page '{}'", request.page);
        let response = self
            .client
            .post(format!("{}/scrape-analyze", self.base_url))
            .json(request)
            .send()
            .await?;
        Self::decode(response, "Failed to analyze page").await
    }

    /// Uploads a CSV of comments for analysis.
    ///
    /// # Errors
    ///
    /// [`IngestError::InvalidUpload`] if the file fails [`validate_upload`];
    /// otherwise as [`IngestClient::scrape_analyze`].
    pub async fn analyze_csv(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        batch_size: u32,
    ) -> Result<AnalysisResponse, IngestError> {
        validate_upload(file_name, &bytes)?;
        log::info!("Uploading {file_name} ({} bytes) for analysis", bytes.len());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("batch_size", batch_size.to_string());

        let response = self
            .client
            .post(format!("{}/analyze-csv", self.base_url))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response, "Failed to analyze CSV").await
    }

    async fn decode(response: reqwest::Response, default_message: &str) -> Result<AnalysisResponse, IngestError> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            log::warn!("Backend returned {status}: {text}");
            let message = if text.trim().is_empty() { default_message.to_string() } else { text };
            return Err(IngestError::Rejected(message));
        }
        let body: AnalysisResponse = response.json().await?;
        log::info!(
            "Received analysis for '{}': {} comments",
            body.page_id,
            body.comments_analyzed.len()
        );
        Ok(body)
    }
}

/// Pre-flight check for a CSV upload: non-empty and named `*.csv`.
///
/// # Errors
///
/// [`IngestError::InvalidUpload`] describing the first failed check.
pub fn validate_upload(file_name: &str, bytes: &[u8]) -> Result<(), IngestError> {
    let is_csv = std::path::Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(IngestError::InvalidUpload(format!("{file_name} is not a .csv file")));
    }
    if bytes.is_empty() {
        return Err(IngestError::InvalidUpload(format!("{file_name} is empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_scrape_fields_are_omitted() {
        let request = ScrapeRequest {
            graph_api_key: "key".into(),
            page: "acme".into(),
            max_posts: Some(10),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"graph_api_key": "key", "page": "acme", "max_posts": 10})
        );
    }

    #[test]
    fn upload_check_requires_csv_extension_and_content() {
        assert!(validate_upload("comments.CSV", b"a,b").is_ok());
        assert!(matches!(validate_upload("comments.xlsx", b"a"), Err(IngestError::InvalidUpload(_))));
        assert!(matches!(validate_upload("comments.csv", b""), Err(IngestError::InvalidUpload(_))));
    }

    #[test]
    fn base_url_is_validated_and_trimmed() {
        assert!(matches!(
            IngestClient::with_base_url("not a url"),
            Err(IngestError::InvalidBaseUrl { .. })
        ));
        let client = IngestClient::with_base_url("http://localhost:9000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
    }
}
