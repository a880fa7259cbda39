//! TMDB catalog client
//!
//! Every call goes through [`CatalogClient::fetch_with_fallback`]: one direct
//! request, and if that fails, one request through the configured relay.
//! Nothing is retried beyond that.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::browse::{DiscoverQuery, ListingMode};
use crate::models::{CastMember, CatalogItem, Genre, ItemDetails, MediaKind, TmdbItem, Video};

pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_PROXY_URL: &str = "https://api.allorigins.win/raw";

const USER_AGENT: &str = concat!("CineView/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("HTTP error: {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("no TMDB API key configured")]
    MissingApiKey,
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Blocking GET returning the response body
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<String>;
}

/// `ureq`-backed transport. Non-2xx statuses are errors.
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .timeout_connect(Some(Duration::from_secs(10)))
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> Result<String> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(code) => CatalogError::Status(code),
                other => CatalogError::Http(other.to_string()),
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(CatalogError::Status(status));
        }

        response
            .body_mut()
            .read_to_string()
            .map_err(|e| CatalogError::Http(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
}

impl TimeWindow {
    pub fn as_path(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

/// Paginated list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<T>,
    #[serde(default = "default_page")]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

fn default_page() -> u32 {
    1
}

impl Paged<TmdbItem> {
    pub fn into_items(self, kind: MediaKind) -> Vec<CatalogItem> {
        CatalogItem::from_raw_list(self.results, kind)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenreList {
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalIds {
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub facebook_id: Option<String>,
    #[serde(default)]
    pub instagram_id: Option<String>,
    #[serde(default)]
    pub twitter_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Videos {
    #[serde(default)]
    pub results: Vec<Video>,
}

/// `/{kind}/{id}` with `external_ids,credits,videos,similar` appended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbDetails {
    #[serde(flatten)]
    pub item: TmdbItem,
    #[serde(default)]
    pub external_ids: Option<ExternalIds>,
    #[serde(default)]
    pub credits: Option<Credits>,
    #[serde(default)]
    pub videos: Option<Videos>,
    #[serde(default)]
    pub similar: Option<Paged<TmdbItem>>,
}

impl TmdbDetails {
    pub fn into_details(self, kind: MediaKind) -> Option<ItemDetails> {
        let item = CatalogItem::from_raw(self.item, kind)?;
        let cast = self
            .credits
            .map(|c| c.cast.into_iter().take(ItemDetails::MAX_CAST).collect())
            .unwrap_or_default();
        let trailers = self
            .videos
            .map(|v| {
                v.results
                    .into_iter()
                    .filter(|v| v.is_trailer())
                    .take(ItemDetails::MAX_TRAILERS)
                    .collect()
            })
            .unwrap_or_default();
        let similar = self
            .similar
            .map(|s| {
                let mut items = s.into_items(kind);
                items.truncate(ItemDetails::MAX_SIMILAR);
                items
            })
            .unwrap_or_default();

        Some(ItemDetails { item, cast, trailers, similar })
    }
}

/// Connection settings for [`CatalogClient`]
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub api_key: String,
    pub api_base: String,
    pub proxy_url: String,
    pub language: Option<String>,
}

impl CatalogSettings {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            language: None,
        }
    }
}

pub struct CatalogClient<T: Transport = UreqTransport> {
    settings: CatalogSettings,
    transport: T,
}

impl CatalogClient<UreqTransport> {
    pub fn new(settings: CatalogSettings) -> Self {
        Self::with_transport(settings, UreqTransport::new())
    }
}

impl<T: Transport> CatalogClient<T> {
    pub fn with_transport(settings: CatalogSettings, transport: T) -> Self {
        Self { settings, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Full direct URL for an endpoint, including the API key
    pub fn endpoint_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        if self.settings.api_key.is_empty() {
            return Err(CatalogError::MissingApiKey);
        }

        let mut query: Vec<(&str, &str)> = vec![("api_key", self.settings.api_key.as_str())];
        if let Some(ref lang) = self.settings.language {
            if !lang.is_empty() {
                query.push(("language", lang.as_str()));
            }
        }
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        let base = format!("{}{}", self.settings.api_base.trim_end_matches('/'), path);
        Ok(Url::parse_with_params(&base, &query)?)
    }

    /// Relay URL wrapping a direct URL
    pub fn proxy_url(&self, direct: &Url) -> Result<Url> {
        Ok(Url::parse_with_params(
            &self.settings.proxy_url,
            &[("url", direct.as_str())],
        )?)
    }

    /// One direct attempt, then at most one relayed attempt
    pub fn fetch_with_fallback(&self, url: &Url) -> Result<String> {
        match self.transport.get(url.as_str()) {
            Ok(body) => return Ok(body),
            Err(e) => log::warn!("Direct fetch failed ({}), trying proxy...", e),
        }

        let relay = self.proxy_url(url)?;
        self.transport.get(relay.as_str()).map_err(|e| {
            log::error!("Proxy fetch failed: {}", e);
            e
        })
    }

    fn get_json<R: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<R> {
        let url = self.endpoint_url(path, params)?;
        let body = self.fetch_with_fallback(&url)?;
        Ok(serde_json::from_str(&body)?)
    }

    pub fn trending(&self, kind: MediaKind, window: TimeWindow, page: u32) -> Result<Paged<TmdbItem>> {
        let path = format!("/trending/{}/{}", kind.as_path(), window.as_path());
        self.get_json(&path, &[("page", page.to_string())])
    }

    pub fn popular(&self, kind: MediaKind, page: u32) -> Result<Paged<TmdbItem>> {
        let path = format!("/{}/popular", kind.as_path());
        self.get_json(&path, &[("page", page.to_string())])
    }

    pub fn top_rated(&self, kind: MediaKind, page: u32) -> Result<Paged<TmdbItem>> {
        let path = format!("/{}/top_rated", kind.as_path());
        self.get_json(&path, &[("page", page.to_string())])
    }

    pub fn by_genre(&self, genre_id: u32, kind: MediaKind, page: u32) -> Result<Paged<TmdbItem>> {
        let path = format!("/discover/{}", kind.as_path());
        self.get_json(
            &path,
            &[("with_genres", genre_id.to_string()), ("page", page.to_string())],
        )
    }

    pub fn discover(&self, query: &DiscoverQuery) -> Result<Paged<TmdbItem>> {
        let path = format!("/discover/{}", query.kind.as_path());
        self.get_json(&path, &query.params())
    }

    /// The grid listing selected by `query.mode`, at `query.page`
    pub fn listing(&self, query: &DiscoverQuery) -> Result<Paged<TmdbItem>> {
        match query.mode {
            ListingMode::Discover => self.discover(query),
            ListingMode::Popular => self.popular(query.kind, query.page),
            ListingMode::TopRated => self.top_rated(query.kind, query.page),
            ListingMode::Trending => self.trending(query.kind, TimeWindow::Week, query.page),
        }
    }

    /// Multi search across movies, series and people
    pub fn search(&self, query: &str) -> Result<Paged<TmdbItem>> {
        self.get_json("/search/multi", &[("query", query.to_string())])
    }

    pub fn genres(&self, kind: MediaKind) -> Result<GenreList> {
        let path = format!("/genre/{}/list", kind.as_path());
        self.get_json(&path, &[])
    }

    /// Details with credits, videos and similar titles; the IMDb id from
    /// `external_ids` is copied onto the item itself
    pub fn details(&self, id: u64, kind: MediaKind) -> Result<TmdbDetails> {
        let path = format!("/{}/{}", kind.as_path(), id);
        let mut details: TmdbDetails = self.get_json(
            &path,
            &[("append_to_response", "external_ids,credits,videos,similar".to_string())],
        )?;

        if let Some(imdb) = details
            .external_ids
            .as_ref()
            .and_then(|e| e.imdb_id.clone())
            .filter(|s| !s.is_empty())
        {
            details.item.imdb_id = Some(imdb);
        }

        Ok(details)
    }

    pub fn external_ids(&self, id: u64, kind: MediaKind) -> Result<ExternalIds> {
        let path = format!("/{}/{}/external_ids", kind.as_path(), id);
        self.get_json(&path, &[])
    }

    /// The item's IMDb id, looking it up when the item does not carry one
    pub fn resolve_imdb_id(&self, item: &CatalogItem) -> Result<Option<String>> {
        if let Some(ref id) = item.imdb_id {
            return Ok(Some(id.clone()));
        }
        let ids = self.external_ids(item.id, item.kind)?;
        Ok(ids.imdb_id.filter(|s| !s.is_empty()))
    }

    /// Details ready for the details page. A missing IMDb id is looked up
    /// separately; a failed lookup leaves it unset.
    pub fn item_details(&self, id: u64, kind: MediaKind) -> Result<Option<ItemDetails>> {
        let Some(mut details) = self.details(id, kind)?.into_details(kind) else {
            return Ok(None);
        };
        if details.item.imdb_id.is_none() {
            match self.resolve_imdb_id(&details.item) {
                Ok(imdb) => details.item.imdb_id = imdb,
                Err(e) => log::warn!("IMDb lookup failed for {}: {}", id, e),
            }
        }
        Ok(Some(details))
    }
}

/// Image URL for a TMDB path, `None` when there is no image
pub fn image_url(base: &str, path: Option<&str>, size: &str) -> Option<String> {
    match path {
        Some(p) if !p.is_empty() => Some(format!("{}/{}{}", base.trim_end_matches('/'), size, p)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tmdb_tests.rs"]
mod tests;
