//! Client configuration: TOML settings file, environment overrides, and the
//! validated [`ClientConfig`] handed to [`crate::ImageSearchClient`].

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use shared::error::SearchError;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://api.unsplash.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const SETTINGS_FILE_NAME: &str = "gallery.toml";
/// Upper bound the search endpoint accepts for `per_page`.
pub const MAX_PER_PAGE: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub access_key: Option<String>,
    pub request_timeout_secs: u64,
    pub per_page: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            access_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            per_page: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    api_base_url: Option<String>,
    access_key: Option<String>,
    request_timeout_secs: Option<u64>,
    per_page: Option<u32>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse settings file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Loads settings from the first settings file found, then applies
/// environment overrides.
///
/// An explicit path must exist; the implicit locations (`./gallery.toml`,
/// then the platform config dir) are skipped when absent.
pub fn load_settings(explicit_path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    if let Some(path) = resolve_settings_path(explicit_path) {
        settings.apply_file(&path)?;
        tracing::debug!(path = %path.display(), "loaded settings file");
    }

    settings.apply_env(|name| std::env::var(name).ok());
    Ok(settings)
}

fn resolve_settings_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(SETTINGS_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("image_gallery").join(SETTINGS_FILE_NAME))
        .filter(|path| path.is_file())
}

impl Settings {
    pub fn apply_file(&mut self, path: &Path) -> Result<(), SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SettingsFile = toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(v) = file.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = file.access_key {
            self.access_key = Some(v);
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.per_page {
            self.per_page = Some(v);
        }
        Ok(())
    }

    /// Later names win, so `APP__*` overrides the vendor-style variable.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(v) = read("UNSPLASH_ACCESS_KEY") {
            self.access_key = Some(v);
        }
        if let Some(v) = read("APP__ACCESS_KEY") {
            self.access_key = Some(v);
        }

        if let Some(v) = read("APP__API_BASE_URL") {
            self.api_base_url = v;
        }

        if let Some(v) = read("APP__REQUEST_TIMEOUT_SECS") {
            match v.trim().parse::<u64>() {
                Ok(parsed) => self.request_timeout_secs = parsed,
                Err(err) => tracing::warn!("ignoring APP__REQUEST_TIMEOUT_SECS={v:?}: {err}"),
            }
        }

        if let Some(v) = read("APP__PER_PAGE") {
            match v.trim().parse::<u32>() {
                Ok(parsed) => self.per_page = Some(parsed),
                Err(err) => tracing::warn!("ignoring APP__PER_PAGE={v:?}: {err}"),
            }
        }
    }

    pub fn client_config(&self) -> Result<ClientConfig, SearchError> {
        let access_key = self
            .access_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                SearchError::validation(format!(
                    "missing API access key; set UNSPLASH_ACCESS_KEY or access_key in {SETTINGS_FILE_NAME}"
                ))
            })?;

        Ok(ClientConfig::new(&self.api_base_url, access_key)?
            .with_timeout(Duration::from_secs(self.request_timeout_secs.max(1)))
            .with_per_page(self.per_page))
    }
}

/// Connection parameters for one [`crate::ImageSearchClient`] instance.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: Url,
    access_key: String,
    timeout: Duration,
    per_page: Option<u32>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("access_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("per_page", &self.per_page)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(base_url: &str, access_key: impl Into<String>) -> Result<Self, SearchError> {
        let mut base_url = Url::parse(base_url.trim()).map_err(|err| {
            SearchError::validation(format!("invalid API base URL '{base_url}': {err}"))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SearchError::validation(format!(
                "API base URL must use http or https, got '{}'",
                base_url.scheme()
            )));
        }
        // Url::join replaces the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let access_key = access_key.into().trim().to_string();
        if access_key.is_empty() {
            return Err(SearchError::validation("API access key must not be empty"));
        }

        Ok(Self {
            base_url,
            access_key,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            per_page: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_per_page(mut self, per_page: Option<u32>) -> Self {
        self.per_page = per_page.map(|n| n.clamp(1, MAX_PER_PAGE));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn per_page(&self) -> Option<u32> {
        self.per_page
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, SearchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| SearchError::validation(format!("invalid endpoint path '{path}': {err}")))
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
