//! Browsing helpers: discover filters, paging and client-side filtering

use crate::models::{CatalogItem, MediaKind};

/// Original-language filters offered on the Movies and TV tabs
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
];

/// Items per home row
pub const ROW_SIZE: usize = 12;
/// Items in the hero strip
pub const HERO_SIZE: usize = 6;

/// Source of a home screen row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    Trending,
    Popular,
    Genre(u32),
    Language(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct HomeRow {
    pub title: &'static str,
    pub source: RowSource,
}

pub const HOME_ROWS: &[HomeRow] = &[
    HomeRow { title: "Trending This Week", source: RowSource::Trending },
    HomeRow { title: "Popular Now", source: RowSource::Popular },
    HomeRow { title: "Top Thrillers", source: RowSource::Genre(53) },
    HomeRow { title: "Sci-Fi", source: RowSource::Genre(878) },
    HomeRow { title: "Kids & Animation", source: RowSource::Genre(16) },
    HomeRow { title: "Action", source: RowSource::Genre(28) },
    HomeRow { title: "Comedy", source: RowSource::Genre(35) },
    HomeRow { title: "Horror", source: RowSource::Genre(27) },
    HomeRow { title: "Bollywood", source: RowSource::Language("hi") },
];

/// Discover sort orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Popularity,
    Rating,
    Newest,
    TitleAsc,
    TitleDesc,
}

impl SortBy {
    pub const ALL: [SortBy; 5] = [
        SortBy::Popularity,
        SortBy::Rating,
        SortBy::Newest,
        SortBy::TitleAsc,
        SortBy::TitleDesc,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Popularity => "Most Popular",
            SortBy::Rating => "Highest Rated",
            SortBy::Newest => "Recently Added",
            SortBy::TitleAsc => "A-Z",
            SortBy::TitleDesc => "Z-A",
        }
    }

    /// TMDB `sort_by` value; date and title fields differ per media kind
    pub fn param(&self, kind: MediaKind) -> &'static str {
        match (self, kind) {
            (SortBy::Popularity, _) => "popularity.desc",
            (SortBy::Rating, _) => "vote_average.desc",
            (SortBy::Newest, MediaKind::Movie) => "primary_release_date.desc",
            (SortBy::Newest, MediaKind::Tv) => "first_air_date.desc",
            (SortBy::TitleAsc, MediaKind::Movie) => "title.asc",
            (SortBy::TitleAsc, MediaKind::Tv) => "name.asc",
            (SortBy::TitleDesc, MediaKind::Movie) => "title.desc",
            (SortBy::TitleDesc, MediaKind::Tv) => "name.desc",
        }
    }
}

/// Which listing feeds the Movies and TV grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    /// `/discover` with the genre, language and sort filters
    #[default]
    Discover,
    Popular,
    TopRated,
    /// Weekly trending; shown as "Airing" for series
    Trending,
}

impl ListingMode {
    pub const ALL: [ListingMode; 4] = [
        ListingMode::Discover,
        ListingMode::Popular,
        ListingMode::TopRated,
        ListingMode::Trending,
    ];

    pub fn label(&self, kind: MediaKind) -> &'static str {
        match (self, kind) {
            (ListingMode::Discover, _) => "Browse",
            (ListingMode::Popular, _) => "Popular",
            (ListingMode::TopRated, _) => "Top Rated",
            (ListingMode::Trending, MediaKind::Movie) => "Trending",
            (ListingMode::Trending, MediaKind::Tv) => "Airing",
        }
    }

    /// Only discover honours the genre, language and sort filters
    pub fn uses_filters(&self) -> bool {
        *self == ListingMode::Discover
    }
}

/// Parameters for a Movies/TV listing; `params` are the `/discover/{kind}`
/// query string
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    pub kind: MediaKind,
    pub mode: ListingMode,
    pub genre: Option<u32>,
    pub language: Option<String>,
    pub sort_by: SortBy,
    pub page: u32,
}

impl DiscoverQuery {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            mode: ListingMode::default(),
            genre: None,
            language: None,
            sort_by: SortBy::default(),
            page: 1,
        }
    }

    pub fn with_genre(mut self, genre: u32) -> Self {
        self.genre = Some(genre);
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn with_mode(mut self, mode: ListingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("sort_by", self.sort_by.param(self.kind).to_string()),
            ("page", self.page.to_string()),
        ];
        if let Some(genre) = self.genre {
            params.push(("with_genres", genre.to_string()));
        }
        if let Some(ref lang) = self.language {
            params.push(("with_original_language", lang.clone()));
        }
        params
    }
}

/// Grid contents accumulated over "Load More" clicks
#[derive(Debug, Clone, Default)]
pub struct PagedList {
    pub items: Vec<CatalogItem>,
    pub page: u32,
    pub total_pages: u32,
}

impl PagedList {
    /// Merge a fetched page: page 1 replaces, later pages append
    pub fn apply(&mut self, page: u32, total_pages: u32, items: Vec<CatalogItem>) {
        if page <= 1 {
            self.items = items;
        } else {
            self.items.extend(items);
        }
        self.page = page.max(1);
        self.total_pages = total_pages.max(1);
    }

    pub fn has_more(&self) -> bool {
        self.page > 0 && self.page < self.total_pages
    }

    pub fn next_page(&self) -> u32 {
        self.page + 1
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Explore tab filter over search results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExploreFilter {
    pub kind: Option<MediaKind>,
    pub year: Option<String>,
    pub genre: Option<u32>,
}

impl ExploreFilter {
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if let Some(kind) = self.kind {
            if item.kind != kind {
                return false;
            }
        }
        if let Some(ref year) = self.year {
            if item.year() != Some(year.as_str()) {
                return false;
            }
        }
        if let Some(genre) = self.genre {
            if !item.has_genre(genre) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, items: &'a [CatalogItem]) -> Vec<&'a CatalogItem> {
        items.iter().filter(|i| self.matches(i)).collect()
    }
}

/// The last 30 years, newest first, for the year picker
pub fn recent_years(current_year: i32) -> Vec<String> {
    (0..30).map(|i| (current_year - i).to_string()).collect()
}

/// Case-insensitive substring check without allocation
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() { return true; }
    if needle.len() > haystack.len() { return false; }

    haystack.as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}
