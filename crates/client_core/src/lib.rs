use async_trait::async_trait;
use shared::{
    domain::{Page, SearchQuery, SearchResult},
    error::SearchError,
};

pub mod config;
pub mod controller;
mod search_client;

pub use config::{load_settings, ClientConfig, Settings, SettingsError};
pub use controller::{FetchTicket, ScrollCue, SearchController, SearchState, SettleOutcome};
pub use search_client::ImageSearchClient;

/// Remote operations the gallery front ends depend on.
#[async_trait]
pub trait ImageSearchApi: Send + Sync {
    async fn search_photos(
        &self,
        query: &SearchQuery,
        page: Page,
    ) -> Result<SearchResult, SearchError>;

    async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>, SearchError>;
}

/// Stand-in used when no usable client configuration exists; every call
/// fails with the configuration error so the UI can surface it.
pub struct MissingImageSearchApi {
    reason: SearchError,
}

impl MissingImageSearchApi {
    pub fn new(reason: SearchError) -> Self {
        Self { reason }
    }
}

#[async_trait]
impl ImageSearchApi for MissingImageSearchApi {
    async fn search_photos(
        &self,
        _query: &SearchQuery,
        _page: Page,
    ) -> Result<SearchResult, SearchError> {
        Err(self.reason.clone())
    }

    async fn fetch_image_bytes(&self, _url: &str) -> Result<Vec<u8>, SearchError> {
        Err(self.reason.clone())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
