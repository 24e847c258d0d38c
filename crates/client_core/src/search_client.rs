use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client};
use shared::{
    domain::{Page, SearchQuery, SearchResult},
    error::SearchError,
    protocol::{ApiErrorBody, SearchPhotosResponse},
};
use tracing::{debug, info};
use url::Url;

use crate::{config::ClientConfig, ImageSearchApi};

const SEARCH_PHOTOS_PATH: &str = "search/photos";
const API_VERSION: &str = "v1";
const MAX_ERROR_DETAIL_CHARS: usize = 200;

/// HTTP client for the photo search endpoint. Each instance carries its own
/// base URL and credential.
#[derive(Debug, Clone)]
pub struct ImageSearchClient {
    http: Client,
    config: ClientConfig,
}

impl ImageSearchClient {
    pub fn new(config: ClientConfig) -> Result<Self, SearchError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("image-gallery/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| SearchError::validation(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn search_photos(
        &self,
        query: &SearchQuery,
        page: Page,
    ) -> Result<SearchResult, SearchError> {
        let url = self.config.endpoint(SEARCH_PHOTOS_PATH)?;
        let mut params = vec![
            ("query", query.as_str().to_string()),
            ("page", page.get().to_string()),
        ];
        if let Some(per_page) = self.config.per_page() {
            params.push(("per_page", per_page.to_string()));
        }

        let response = self
            .http
            .get(url)
            .query(&params)
            .header(AUTHORIZATION, format!("Client-ID {}", self.config.access_key()))
            .header("Accept-Version", API_VERSION)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if let Some(remaining) = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|value| value.to_str().ok())
        {
            debug!(remaining, "search rate limit budget");
        }

        let body = response.text().await.map_err(request_error)?;
        if !status.is_success() {
            return Err(SearchError::from_status(status.as_u16(), error_detail(&body)));
        }

        let payload: SearchPhotosResponse = serde_json::from_str(&body).map_err(|err| {
            SearchError::malformed(format!("invalid search response payload: {err}"))
        })?;
        let result = SearchResult::from(payload);
        info!(
            query = %query,
            page = page.get(),
            count = result.images.len(),
            total_pages = ?result.total_pages,
            "search completed"
        );
        Ok(result)
    }

    /// Downloads thumbnail or preview bytes. Image CDN URLs need no credential.
    pub async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>, SearchError> {
        let parsed = Url::parse(url)
            .map_err(|err| SearchError::validation(format!("invalid image url '{url}': {err}")))?;
        let response = self.http.get(parsed).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::from_status(status.as_u16(), ""));
        }
        let bytes = response.bytes().await.map_err(request_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageSearchApi for ImageSearchClient {
    async fn search_photos(
        &self,
        query: &SearchQuery,
        page: Page,
    ) -> Result<SearchResult, SearchError> {
        ImageSearchClient::search_photos(self, query, page).await
    }

    async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>, SearchError> {
        ImageSearchClient::fetch_image_bytes(self, url).await
    }
}

fn request_error(err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::transport(format!("request to image service timed out: {err}"))
    } else if err.is_decode() {
        SearchError::malformed(format!("could not read image service response: {err}"))
    } else {
        SearchError::transport(format!("failed to reach image service: {err}"))
    }
}

fn error_detail(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if !parsed.errors.is_empty() {
            return parsed.summary();
        }
    }
    body.trim().chars().take(MAX_ERROR_DETAIL_CHARS).collect()
}
