//! Data models for CineView

use serde::{Deserialize, Serialize};

use crate::servers::{self, Server};

/// UI Tab selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Movies,
    Tv,
    Explore,
    Profile,
    Settings,
    Faq,
    Console,
}

/// Pages pushed on top of a tab
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationLevel {
    Genre { id: u32, name: String, kind: MediaKind },
    Details(u64, MediaKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Movie,
    Tv,
}

impl MediaKind {
    /// Path segment used by the TMDB API
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Movie => "Movie",
            MediaKind::Tv => "TV Show",
        }
    }

    pub fn from_media_type(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(MediaKind::Movie),
            "tv" => Some(MediaKind::Tv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// A catalog record as TMDB returns it in list and detail responses.
/// Movies use `title`/`release_date`, series use `name`/`first_air_date`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TmdbItem {
    pub id: u64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub imdb_id: Option<String>,
}

/// Movie or series descriptor used throughout the app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: u64,
    #[serde(default)]
    pub imdb_id: Option<String>,
    pub kind: MediaKind,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
}

impl CatalogItem {
    /// Convert a raw record. `media_type` (multi-search) wins over `default_kind`;
    /// anything that is not a movie or series (people) yields `None`.
    pub fn from_raw(raw: TmdbItem, default_kind: MediaKind) -> Option<Self> {
        let kind = match raw.media_type.as_deref() {
            Some(t) => MediaKind::from_media_type(t)?,
            None => default_kind,
        };

        let title = match kind {
            MediaKind::Movie => raw.title.or(raw.name),
            MediaKind::Tv => raw.name.or(raw.title),
        }
        .unwrap_or_default();

        let release_date = match kind {
            MediaKind::Movie => raw.release_date.or(raw.first_air_date),
            MediaKind::Tv => raw.first_air_date.or(raw.release_date),
        }
        .filter(|d| !d.is_empty());

        Some(Self {
            id: raw.id,
            imdb_id: raw.imdb_id.filter(|s| !s.is_empty()),
            kind,
            title,
            overview: raw.overview.unwrap_or_default(),
            poster_path: raw.poster_path.filter(|p| !p.is_empty()),
            backdrop_path: raw.backdrop_path.filter(|p| !p.is_empty()),
            vote_average: raw.vote_average.unwrap_or(0.0),
            release_date,
            genre_ids: if raw.genre_ids.is_empty() {
                raw.genres.iter().map(|g| g.id).collect()
            } else {
                raw.genre_ids
            },
            genres: raw.genres,
            runtime: raw.runtime,
            number_of_seasons: raw.number_of_seasons,
            number_of_episodes: raw.number_of_episodes,
        })
    }

    pub fn from_raw_list(raw: Vec<TmdbItem>, default_kind: MediaKind) -> Vec<Self> {
        raw.into_iter()
            .filter_map(|r| Self::from_raw(r, default_kind))
            .collect()
    }

    pub fn is_series(&self) -> bool {
        self.kind == MediaKind::Tv
    }

    /// Release year, if the date is known
    pub fn year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
    }

    pub fn display_rating(&self) -> String {
        format!("{:.1}", self.vote_average)
    }

    pub fn has_genre(&self, genre_id: u32) -> bool {
        self.genre_ids.contains(&genre_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub video_type: String,
}

impl Video {
    pub fn is_trailer(&self) -> bool {
        self.video_type == "Trailer"
    }

    pub fn watch_url(&self) -> Option<String> {
        match self.site.as_str() {
            "YouTube" => Some(format!("https://www.youtube.com/watch?v={}", self.key)),
            "Vimeo" => Some(format!("https://vimeo.com/{}", self.key)),
            _ => None,
        }
    }
}

/// Everything the detail page shows
#[derive(Debug, Clone)]
pub struct ItemDetails {
    pub item: CatalogItem,
    pub cast: Vec<CastMember>,
    pub trailers: Vec<Video>,
    pub similar: Vec<CatalogItem>,
}

impl ItemDetails {
    pub const MAX_CAST: usize = 10;
    pub const MAX_TRAILERS: usize = 2;
    pub const MAX_SIMILAR: usize = 20;
}

/// One play action: item + chosen server + optional episode coordinates
#[derive(Debug, Clone)]
pub struct PlaybackRequest<'a> {
    pub item: &'a CatalogItem,
    pub server: &'a Server,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl<'a> PlaybackRequest<'a> {
    pub fn new(item: &'a CatalogItem, server: &'a Server) -> Self {
        Self {
            item,
            server,
            season: None,
            episode: None,
        }
    }

    pub fn with_episode(mut self, season: u32, episode: u32) -> Self {
        self.season = Some(season);
        self.episode = Some(episode);
        self
    }

    pub fn stream_url(&self) -> String {
        servers::build_stream_url(
            self.server,
            self.item.id,
            self.item.imdb_id.as_deref(),
            self.season,
            self.episode,
            self.item.is_series(),
        )
    }

    pub fn download_url(&self) -> String {
        servers::download_url(
            self.item.id,
            self.item.imdb_id.as_deref(),
            self.season,
            self.episode,
            self.item.is_series(),
        )
    }
}

/// Entry in a persisted list (watchlist, history, continue watching)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    #[serde(flatten)]
    pub item: CatalogItem,
    /// Unix milliseconds
    pub added_at: i64,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
    /// Percent watched, 0-100
    #[serde(default)]
    pub progress: f32,
}

impl ListEntry {
    pub fn new(item: CatalogItem, added_at: i64) -> Self {
        Self {
            item,
            added_at,
            season: None,
            episode: None,
            progress: 0.0,
        }
    }

    pub fn with_episode(mut self, season: Option<u32>, episode: Option<u32>) -> Self {
        if self.item.is_series() {
            self.season = season;
            self.episode = episode;
        }
        self
    }

    /// "S1 E3" for series entries with known coordinates
    pub fn episode_label(&self) -> Option<String> {
        match (self.season, self.episode) {
            (Some(s), Some(e)) => Some(format!("S{} E{}", s, e)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_movie() {
        let raw: TmdbItem = serde_json::from_str(
            r#"{"id": 550, "title": "Fight Club", "release_date": "1999-10-15",
                "vote_average": 8.433, "genre_ids": [18], "poster_path": "/p.jpg"}"#,
        )
        .unwrap();
        let item = CatalogItem::from_raw(raw, MediaKind::Movie).unwrap();
        assert_eq!(item.title, "Fight Club");
        assert_eq!(item.year(), Some("1999"));
        assert_eq!(item.display_rating(), "8.4");
        assert!(!item.is_series());
        assert!(item.has_genre(18));
    }

    #[test]
    fn test_from_raw_multi_search_kinds() {
        let raw: Vec<TmdbItem> = serde_json::from_str(
            r#"[{"id": 1399, "media_type": "tv", "name": "Game of Thrones", "first_air_date": "2011-04-17"},
                {"id": 287, "media_type": "person", "name": "Brad Pitt"},
                {"id": 550, "media_type": "movie", "title": "Fight Club"}]"#,
        )
        .unwrap();
        let items = CatalogItem::from_raw_list(raw, MediaKind::Movie);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, MediaKind::Tv);
        assert_eq!(items[0].title, "Game of Thrones");
        assert_eq!(items[0].year(), Some("2011"));
        assert_eq!(items[1].kind, MediaKind::Movie);
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let raw: TmdbItem = serde_json::from_str(
            r#"{"id": 7, "title": "X", "release_date": "", "imdb_id": "", "poster_path": ""}"#,
        )
        .unwrap();
        let item = CatalogItem::from_raw(raw, MediaKind::Movie).unwrap();
        assert_eq!(item.release_date, None);
        assert_eq!(item.imdb_id, None);
        assert_eq!(item.poster_path, None);
        assert_eq!(item.year(), None);
    }

    #[test]
    fn test_list_entry_flattened_json() {
        let raw = TmdbItem {
            id: 1399,
            name: Some("Game of Thrones".to_string()),
            ..Default::default()
        };
        let item = CatalogItem::from_raw(raw, MediaKind::Tv).unwrap();
        let entry = ListEntry::new(item, 1_700_000_000_000).with_episode(Some(2), Some(5));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 1399);
        assert_eq!(json["kind"], "tv");
        assert_eq!(json["season"], 2);
        assert_eq!(entry.episode_label().as_deref(), Some("S2 E5"));
    }

    #[test]
    fn test_movie_entry_drops_episode() {
        let item = CatalogItem::from_raw(
            TmdbItem { id: 550, title: Some("Fight Club".into()), ..Default::default() },
            MediaKind::Movie,
        )
        .unwrap();
        let entry = ListEntry::new(item, 0).with_episode(Some(1), Some(1));
        assert_eq!(entry.season, None);
        assert_eq!(entry.episode_label(), None);
    }

    #[test]
    fn test_trailer_filter() {
        let v = Video {
            key: "abc".into(),
            name: "Official Trailer".into(),
            site: "YouTube".into(),
            video_type: "Trailer".into(),
        };
        assert!(v.is_trailer());
        assert_eq!(v.watch_url().as_deref(), Some("https://www.youtube.com/watch?v=abc"));
    }
}
