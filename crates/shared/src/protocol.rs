//! Wire payloads of the photo search API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Image, ImageId, SearchResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPhotosResponse {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    pub results: Vec<PhotoPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoPayload {
    pub id: String,
    pub urls: PhotoUrls,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub alt_description: Option<String>,
    #[serde(default)]
    pub user: Option<PhotoAuthor>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoUrls {
    pub small: String,
    #[serde(default)]
    pub regular: Option<String>,
    #[serde(default)]
    pub full: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Body the API sends alongside 4xx/5xx statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ApiErrorBody {
    pub fn summary(&self) -> String {
        self.errors.join("; ")
    }
}

impl From<PhotoPayload> for Image {
    fn from(payload: PhotoPayload) -> Self {
        let PhotoUrls {
            small,
            regular,
            full,
            ..
        } = payload.urls;
        let full_url = regular.or(full).unwrap_or_else(|| small.clone());
        let author = payload
            .user
            .and_then(|user| user.name.or(user.username));

        Self {
            id: ImageId(payload.id),
            thumbnail_url: small,
            full_url,
            description: payload.description,
            alt_description: payload.alt_description,
            author,
            width: payload.width,
            height: payload.height,
            likes: payload.likes,
            created_at: payload.created_at,
        }
    }
}

impl From<SearchPhotosResponse> for SearchResult {
    fn from(response: SearchPhotosResponse) -> Self {
        Self {
            images: response.results.into_iter().map(Image::from).collect(),
            total: response.total,
            total_pages: response.total_pages,
        }
    }
}
