//! CineView - Rust Edition
//! A cross-platform movie and TV catalog browser that hands playback off to
//! third-party embed servers in the system browser

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use chrono::Datelike;
use eframe::egui;
use std::process::{Command, Stdio};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

mod browse;
mod config;
mod console;
mod models;
mod search;
mod servers;
mod storage;
mod tmdb;

use browse::*;
use config::AppConfig;
use console::{ConsoleBuffer, ConsoleLogger};
use models::*;
use search::{InputOutcome, SearchDebouncer, MAX_RESULTS};
use servers::{unresolved_placeholders, IdScheme, ServerRegistry};
use storage::{JsonFileStore, ListKind, PersistedLists};
use tmdb::{image_url, CatalogClient, Paged, TimeWindow};

const CARD_WIDTH: f32 = 170.0;
const HERO_WIDTH: f32 = 300.0;
const MIN_SEASONS: u32 = 10;
const EPISODES_PER_SEASON: u32 = 24;

const FAQ: &[(&str, &str)] = &[
    ("Is CineView free?",
     "Yes. CineView only browses the public TMDB catalog and links to third-party embed servers."),
    ("Do I need an account?",
     "No. You only need a TMDB API key, entered under Settings or provided through the TMDB_API_KEY environment variable."),
    ("Why isn't a video playing?",
     "Embed servers come and go. Pick another server from the player panel; your choice is remembered for next time."),
    ("Some servers show a broken page",
     "Servers that need an IMDb id cannot play titles TMDB has no IMDb id for. The player panel warns when that happens."),
    ("Can I download movies and TV shows?",
     "The Download button opens a third-party download page for the selected title or episode."),
    ("The catalog does not load",
     "Check your API key and network. When TMDB is unreachable CineView retries once through the relay configured in Settings."),
    ("Where are my lists stored?",
     "Watchlist, history and continue-watching are JSON files in your user data directory under 'cineview'."),
];

/// Get current local time as HH:MM:SS
fn timestamp_now() -> String {
    console::timestamp_now()
}

/// First `max` characters of `text`, with an ellipsis when cut
fn snippet(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}

/// Load application icon: film frame with a play button
fn load_icon() -> egui::IconData {
    let size: usize = 64;
    let mut rgba = vec![0u8; size * size * 4];

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let nx = x as f32 / size as f32;
            let ny = y as f32 / size as f32;

            let corner_radius = 0.125;
            let dx = (corner_radius - nx).max(nx - (1.0 - corner_radius)).max(0.0);
            let dy = (corner_radius - ny).max(ny - (1.0 - corner_radius)).max(0.0);
            if dx * dx + dy * dy > corner_radius * corner_radius {
                continue;
            }

            // Sprocket holes along the top and bottom edges
            let in_strip = ny < 0.16 || ny > 0.84;
            let in_hole = in_strip && (nx * 8.0).fract() > 0.35 && (nx * 8.0).fract() < 0.65
                && ((0.05..0.11).contains(&ny) || (0.89..0.95).contains(&ny));

            // Play triangle
            let px = nx - 0.38;
            let py = ny - 0.5;
            let in_play = (0.0..=0.3).contains(&px) && py.abs() <= (0.3 - px) * 0.6;

            // Red to orange gradient (#b91c1c to #f97316)
            let t = nx * 0.5 + ny * 0.5;
            let pixel = if in_hole {
                [24, 24, 27, 255]
            } else if in_strip {
                [39, 39, 42, 255]
            } else if in_play {
                [255, 255, 255, 255]
            } else {
                [
                    (185.0 + (249.0 - 185.0) * t) as u8,
                    (28.0 + (115.0 - 28.0) * t) as u8,
                    (28.0 + (22.0 - 28.0) * t) as u8,
                    255,
                ]
            };
            rgba[idx..idx + 4].copy_from_slice(&pixel);
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}

/// Emoji-capable system fonts, first readable one wins
fn load_fonts() -> egui::FontDefinitions {
    let mut fonts = egui::FontDefinitions::default();

    let candidates: &[&str] = if cfg!(target_os = "windows") {
        &["C:\\Windows\\Fonts\\seguiemj.ttf"]
    } else if cfg!(target_os = "macos") {
        &["/System/Library/Fonts/Apple Color Emoji.ttc"]
    } else {
        &[
            "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf",
            "/usr/share/fonts/noto-emoji/NotoColorEmoji.ttf",
            "/usr/share/fonts/google-noto-emoji/NotoColorEmoji.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        ]
    };

    for path in candidates {
        if let Ok(font_data) = std::fs::read(path) {
            fonts.font_data.insert(
                "emoji".to_owned(),
                egui::FontData::from_owned(font_data).into(),
            );
            fonts.families
                .entry(egui::FontFamily::Proportional)
                .or_default()
                .push("emoji".to_owned());
            break;
        }
    }

    fonts
}

fn apply_style(ctx: &egui::Context, config: &AppConfig) {
    if config.dark_mode {
        ctx.set_visuals(egui::Visuals::dark());
    } else {
        ctx.set_visuals(egui::Visuals::light());
    }

    let size = config.font_size.clamp(10, 24) as f32;
    ctx.style_mut(|style| {
        use egui::{FontId, TextStyle};
        style.text_styles = [
            (TextStyle::Heading, FontId::proportional(size + 6.0)),
            (TextStyle::Body, FontId::proportional(size)),
            (TextStyle::Monospace, FontId::monospace(size - 1.0)),
            (TextStyle::Button, FontId::proportional(size)),
            (TextStyle::Small, FontId::proportional(size - 3.0)),
        ]
        .into();
    });
}

/// Command that opens `url` in the configured browser or the platform opener
fn browser_command(custom: &str, url: &str) -> Command {
    let mut parts = custom.split_whitespace();
    if let Some(program) = parts.next() {
        let mut cmd = Command::new(program);
        cmd.args(parts).arg(url);
        return cmd;
    }

    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("rundll32");
        cmd.arg("url.dll,FileProtocolHandler").arg(url);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

fn main() -> Result<(), eframe::Error> {
    let console = ConsoleLogger::install(log::LevelFilter::Info);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1250.0, 760.0])
            .with_min_inner_size([900.0, 550.0])
            .with_icon(load_icon()),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "CineView - Rust Edition",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_fonts(load_fonts());
            let app = CineViewApp::new(console);
            apply_style(&cc.egui_ctx, &app.config);
            Ok(Box::new(app))
        }),
    )
}

type Fetched<T> = Result<T, String>;

/// One page of converted catalog items
struct ItemPage {
    page: u32,
    total_pages: u32,
    items: Vec<CatalogItem>,
}

impl ItemPage {
    fn from_paged(paged: Paged<TmdbItem>, kind: MediaKind) -> Self {
        Self {
            page: paged.page,
            total_pages: paged.total_pages,
            items: paged.into_items(kind),
        }
    }
}

/// Background task messages
enum TaskResult {
    HomeRow { index: usize, generation: u64, result: Fetched<Vec<CatalogItem>> },
    Genres { kind: MediaKind, generation: u64, result: Fetched<Vec<Genre>> },
    Browse { kind: MediaKind, generation: u64, result: Fetched<ItemPage> },
    GenrePage { genre_id: u32, generation: u64, result: Fetched<ItemPage> },
    Search { generation: u64, result: Fetched<Vec<CatalogItem>> },
    Details { id: u64, result: Fetched<Box<ItemDetails>> },
}

/// Context for background fetch operations
struct FetchContext {
    client: Arc<CatalogClient>,
    sender: Sender<TaskResult>,
}

/// A paged listing plus the filters that produced it
#[derive(Default)]
struct BrowseState {
    query: Option<DiscoverQuery>,
    list: PagedList,
    generation: u64,
    loading: bool,
    requested: bool,
}

impl BrowseState {
    fn new(kind: MediaKind) -> Self {
        Self {
            query: Some(DiscoverQuery::new(kind)),
            ..Default::default()
        }
    }

    fn reset(&mut self) {
        self.list.clear();
        self.generation += 1;
        self.loading = false;
        self.requested = false;
    }
}

/// Home screen rows, one per `HOME_ROWS` entry
struct HomeState {
    rows: Vec<Vec<CatalogItem>>,
    requested: bool,
    generation: u64,
}

impl Default for HomeState {
    fn default() -> Self {
        Self {
            rows: vec![Vec::new(); HOME_ROWS.len()],
            requested: false,
            generation: 0,
        }
    }
}

impl HomeState {
    fn reset(&mut self) {
        self.rows = vec![Vec::new(); HOME_ROWS.len()];
        self.requested = false;
        self.generation += 1;
    }

    /// Store a fetched row unless it belongs to an earlier load
    fn accept(&mut self, generation: u64, index: usize, items: Vec<CatalogItem>) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.rows.get_mut(index) {
            Some(row) => {
                *row = items;
                true
            }
            None => false,
        }
    }
}

/// Genre lists for both media kinds
#[derive(Default)]
struct GenreState {
    movie: Vec<Genre>,
    tv: Vec<Genre>,
    requested: bool,
    generation: u64,
}

impl GenreState {
    fn reset(&mut self) {
        self.movie.clear();
        self.tv.clear();
        self.requested = false;
        self.generation += 1;
    }

    fn accept(&mut self, generation: u64, kind: MediaKind, genres: Vec<Genre>) -> bool {
        if generation != self.generation {
            return false;
        }
        match kind {
            MediaKind::Movie => self.movie = genres,
            MediaKind::Tv => self.tv = genres,
        }
        true
    }

    fn for_kind(&self, kind: MediaKind) -> &[Genre] {
        match kind {
            MediaKind::Movie => &self.movie,
            MediaKind::Tv => &self.tv,
        }
    }

    fn name(&self, id: u32) -> Option<&str> {
        self.movie
            .iter()
            .chain(self.tv.iter())
            .find(|g| g.id == id)
            .map(|g| g.name.as_str())
    }
}

/// In-memory copy of the persisted lists, refreshed after every change
#[derive(Default)]
struct ListCache {
    watchlist: Vec<ListEntry>,
    history: Vec<ListEntry>,
    continue_watching: Vec<ListEntry>,
    resume: Option<ListEntry>,
}

enum CardAction {
    Open,
    ToggleWatchlist,
}

enum DetailAction {
    Retry,
    ToggleWatchlist,
    Play,
    Download,
    CopyLink(String),
    OpenUrl(String),
    OpenGenre(Genre),
    Open(CatalogItem),
    ToggleSimilar(CatalogItem),
}

struct CineViewApp {
    config: AppConfig,
    settings_draft: AppConfig,
    client: Arc<CatalogClient>,
    registry: ServerRegistry,
    lists: PersistedLists<JsonFileStore>,
    list_cache: ListCache,
    console: ConsoleBuffer,

    // State
    current_tab: Tab,
    navigation_stack: Vec<NavigationLevel>,
    status_message: String,
    pending_tasks: usize,

    // Background task channel
    task_receiver: Receiver<TaskResult>,
    task_sender: Sender<TaskResult>,

    // Home
    home: HomeState,

    // Movies / TV tabs
    movies: BrowseState,
    shows: BrowseState,
    title_filter: String,
    genres: GenreState,

    // Genre page
    genre_page: BrowseState,
    genre_page_id: Option<u32>,

    // Search
    search_input: String,
    debouncer: SearchDebouncer,
    search_results: Vec<CatalogItem>,
    show_quick_results: bool,
    explore_filter: ExploreFilter,

    // Details and player
    details: Option<ItemDetails>,
    details_loading: bool,
    selected_server: usize,
    season: u32,
    episode: u32,

    // Profile
    profile_list: ListKind,
}

impl CineViewApp {
    fn new(console: ConsoleBuffer) -> Self {
        let config = AppConfig::load();
        let registry = ServerRegistry::builtin();
        let lists = PersistedLists::new(JsonFileStore::new(AppConfig::data_dir()));
        let (task_sender, task_receiver) = channel();
        let client = Arc::new(CatalogClient::new(config.catalog_settings()));
        let selected_server = registry.position(&config.preferred_server).unwrap_or(0);

        let status_message = if config.api_key().is_empty() {
            "No TMDB API key configured - add one in Settings".to_string()
        } else {
            "Ready".to_string()
        };

        let mut app = Self {
            settings_draft: config.clone(),
            config,
            client,
            registry,
            lists,
            list_cache: ListCache::default(),
            console,
            current_tab: Tab::Home,
            navigation_stack: Vec::new(),
            status_message,
            pending_tasks: 0,
            task_receiver,
            task_sender,
            home: HomeState::default(),
            movies: BrowseState::new(MediaKind::Movie),
            shows: BrowseState::new(MediaKind::Tv),
            title_filter: String::new(),
            genres: GenreState::default(),
            genre_page: BrowseState::default(),
            genre_page_id: None,
            search_input: String::new(),
            debouncer: SearchDebouncer::default(),
            search_results: Vec::new(),
            show_quick_results: false,
            explore_filter: ExploreFilter::default(),
            details: None,
            details_loading: false,
            selected_server,
            season: 1,
            episode: 1,
            profile_list: ListKind::Watchlist,
        };
        app.refresh_lists();
        log::info!("CineView {} started, {} servers available", env!("CARGO_PKG_VERSION"), app.registry.len());
        app
    }

    fn fetch_context(&mut self) -> FetchContext {
        self.pending_tasks += 1;
        FetchContext {
            client: Arc::clone(&self.client),
            sender: self.task_sender.clone(),
        }
    }

    fn has_api_key(&self) -> bool {
        !self.config.api_key().is_empty()
    }

    fn refresh_lists(&mut self) {
        self.list_cache = ListCache {
            watchlist: self.lists.get(ListKind::Watchlist),
            history: self.lists.get(ListKind::History),
            continue_watching: self.lists.get(ListKind::ContinueWatching),
            resume: self.lists.resume_candidate(),
        };
    }

    fn cached(&self, kind: ListKind) -> &[ListEntry] {
        match kind {
            ListKind::Watchlist => &self.list_cache.watchlist,
            ListKind::History => &self.list_cache.history,
            ListKind::ContinueWatching => &self.list_cache.continue_watching,
        }
    }

    fn is_listed(&self, id: u64) -> bool {
        self.list_cache.watchlist.iter().any(|e| e.item.id == id)
    }

    fn browse_state(&mut self, kind: MediaKind) -> &mut BrowseState {
        match kind {
            MediaKind::Movie => &mut self.movies,
            MediaKind::Tv => &mut self.shows,
        }
    }

    fn genres_for(&self, kind: MediaKind) -> &[Genre] {
        self.genres.for_kind(kind)
    }

    fn genre_name(&self, id: u32) -> Option<&str> {
        self.genres.name(id)
    }

    // === Fetching ===

    fn load_home(&mut self) {
        self.home.requested = true;
        let generation = self.home.generation;
        self.status_message = "Loading home...".to_string();

        for (index, row) in HOME_ROWS.iter().enumerate() {
            let ctx = self.fetch_context();
            let source = row.source;

            thread::spawn(move || {
                let kind = MediaKind::Movie;
                let result = match source {
                    RowSource::Trending => ctx.client.trending(kind, TimeWindow::Week, 1),
                    RowSource::Popular => ctx.client.popular(kind, 1),
                    RowSource::Genre(id) => ctx.client.by_genre(id, kind, 1),
                    RowSource::Language(code) => {
                        ctx.client.discover(&DiscoverQuery::new(kind).with_language(code))
                    }
                };
                let result = result
                    .map(|page| {
                        let mut items = page.into_items(kind);
                        items.truncate(ROW_SIZE);
                        items
                    })
                    .map_err(|e| e.to_string());
                let _ = ctx.sender.send(TaskResult::HomeRow { index, generation, result });
            });
        }
    }

    fn load_genres(&mut self) {
        self.genres.requested = true;
        let generation = self.genres.generation;
        for kind in [MediaKind::Movie, MediaKind::Tv] {
            let ctx = self.fetch_context();
            thread::spawn(move || {
                let result = ctx.client.genres(kind).map(|g| g.genres).map_err(|e| e.to_string());
                let _ = ctx.sender.send(TaskResult::Genres { kind, generation, result });
            });
        }
    }

    fn fetch_browse(&mut self, kind: MediaKind, page: u32) {
        let state = self.browse_state(kind);
        let Some(query) = state.query.clone() else { return };
        state.generation += 1;
        state.loading = true;
        state.requested = true;
        let generation = state.generation;
        let query = query.with_page(page);

        self.status_message = format!("Loading {}s (page {})...", kind.label(), page);
        let ctx = self.fetch_context();

        thread::spawn(move || {
            let result = ctx
                .client
                .listing(&query)
                .map(|p| ItemPage::from_paged(p, kind))
                .map_err(|e| e.to_string());
            let _ = ctx.sender.send(TaskResult::Browse { kind, generation, result });
        });
    }

    fn fetch_genre_page(&mut self, genre_id: u32, kind: MediaKind, page: u32) {
        if self.genre_page_id != Some(genre_id) {
            self.genre_page.reset();
            self.genre_page_id = Some(genre_id);
        }
        self.genre_page.generation += 1;
        self.genre_page.loading = true;
        self.genre_page.requested = true;
        let generation = self.genre_page.generation;

        let ctx = self.fetch_context();
        thread::spawn(move || {
            let result = ctx
                .client
                .by_genre(genre_id, kind, page)
                .map(|p| ItemPage::from_paged(p, kind))
                .map_err(|e| e.to_string());
            let _ = ctx.sender.send(TaskResult::GenrePage { genre_id, generation, result });
        });
    }

    fn fetch_details(&mut self, id: u64, kind: MediaKind) {
        self.details_loading = true;
        self.status_message = "Loading details...".to_string();

        let ctx = self.fetch_context();
        thread::spawn(move || {
            let result = ctx
                .client
                .item_details(id, kind)
                .map_err(|e| e.to_string())
                .and_then(|d| d.map(Box::new).ok_or_else(|| "Title not found".to_string()));
            let _ = ctx.sender.send(TaskResult::Details { id, result });
        });
    }

    fn start_search(&mut self, generation: u64, query: String) {
        log::info!("Searching for \"{}\"", query);
        let ctx = self.fetch_context();
        thread::spawn(move || {
            let result = ctx
                .client
                .search(&query)
                .map(|page| page.into_items(MediaKind::Movie))
                .map_err(|e| e.to_string());
            let _ = ctx.sender.send(TaskResult::Search { generation, result });
        });
    }

    fn report_error(&mut self, what: &str, error: &str) {
        log::error!("Failed to load {}: {}", what, error);
        self.status_message = format!("Failed to load {}", what);
    }

    fn process_results(&mut self) {
        while let Ok(result) = self.task_receiver.try_recv() {
            self.pending_tasks = self.pending_tasks.saturating_sub(1);

            match result {
                TaskResult::HomeRow { index, generation, result } => match result {
                    // Rows from before a settings change are dropped
                    _ if generation != self.home.generation => {}
                    Ok(items) => {
                        self.home.accept(generation, index, items);
                        if self.pending_tasks == 0 {
                            self.status_message = "Home loaded".to_string();
                        }
                    }
                    Err(e) => {
                        let title = HOME_ROWS.get(index).map(|r| r.title).unwrap_or("row");
                        self.report_error(title, &e);
                    }
                },
                TaskResult::Genres { kind, generation, result } => match result {
                    _ if generation != self.genres.generation => {}
                    Ok(genres) => {
                        log::info!("Loaded {} {} genres", genres.len(), kind.as_path());
                        self.genres.accept(generation, kind, genres);
                    }
                    Err(e) => self.report_error("genres", &e),
                },
                TaskResult::Browse { kind, generation, result } => {
                    let state = self.browse_state(kind);
                    if state.generation != generation {
                        continue;
                    }
                    state.loading = false;
                    match result {
                        Ok(page) => {
                            state.list.apply(page.page, page.total_pages, page.items);
                            let count = state.list.items.len();
                            self.status_message = format!("{} {}s loaded", count, kind.label());
                        }
                        Err(e) => self.report_error(&format!("{}s", kind.label()), &e),
                    }
                }
                TaskResult::GenrePage { genre_id, generation, result } => {
                    if self.genre_page_id != Some(genre_id) || self.genre_page.generation != generation {
                        continue;
                    }
                    self.genre_page.loading = false;
                    match result {
                        Ok(page) => {
                            self.genre_page.list.apply(page.page, page.total_pages, page.items);
                            self.status_message = format!("{} titles loaded", self.genre_page.list.items.len());
                        }
                        Err(e) => self.report_error("genre", &e),
                    }
                }
                TaskResult::Search { generation, result } => {
                    // Superseded by a newer keystroke
                    if !self.debouncer.is_current(generation) {
                        continue;
                    }
                    match result {
                        Ok(items) => {
                            log::info!("Search returned {} titles", items.len());
                            self.search_results = items;
                            self.show_quick_results = self.current_tab != Tab::Explore;
                        }
                        Err(e) => {
                            self.search_results.clear();
                            self.report_error("search results", &e);
                        }
                    }
                }
                TaskResult::Details { id, result } => {
                    let wanted = matches!(self.navigation_stack.last(), Some(NavigationLevel::Details(top, _)) if *top == id);
                    if !wanted {
                        continue;
                    }
                    self.details_loading = false;
                    match result {
                        Ok(details) => {
                            if details.item.is_series() {
                                let max = self.season_count(&details.item);
                                self.season = self.season.clamp(1, max);
                            }
                            if details.item.imdb_id.is_none() {
                                log::warn!("No IMDb id for \"{}\"", details.item.title);
                            }
                            self.status_message = details.item.title.clone();
                            self.details = Some(*details);
                        }
                        Err(e) => self.report_error("details", &e),
                    }
                }
            }
        }
    }

    // === Navigation ===

    fn open_details(&mut self, id: u64, kind: MediaKind, episode: Option<(u32, u32)>) {
        let (season, episode) = episode.unwrap_or((1, 1));
        self.season = season;
        self.episode = episode;
        self.show_quick_results = false;
        self.navigation_stack.push(NavigationLevel::Details(id, kind));
        self.fetch_details(id, kind);
    }

    fn open_genre(&mut self, genre: &Genre, kind: MediaKind) {
        self.navigation_stack.push(NavigationLevel::Genre {
            id: genre.id,
            name: genre.name.clone(),
            kind,
        });
        self.genre_page.reset();
        self.fetch_genre_page(genre.id, kind, 1);
    }

    fn go_back(&mut self) {
        self.navigation_stack.pop();

        // The page underneath may hold data for a different title or genre
        match self.navigation_stack.last().cloned() {
            Some(NavigationLevel::Details(id, kind)) => {
                if self.details.as_ref().map(|d| d.item.id) != Some(id) {
                    self.fetch_details(id, kind);
                }
            }
            Some(NavigationLevel::Genre { id, kind, .. }) => {
                if self.genre_page_id != Some(id) || self.genre_page.list.items.is_empty() {
                    self.genre_page.reset();
                    self.fetch_genre_page(id, kind, 1);
                }
            }
            None => {}
        }
    }

    fn select_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.navigation_stack.clear();
        self.title_filter.clear();
        if tab == Tab::Explore {
            self.show_quick_results = false;
        }
    }

    /// Kick off whatever the visible page needs and has not requested yet
    fn ensure_loaded(&mut self) {
        if !self.has_api_key() {
            return;
        }
        if !self.genres.requested {
            self.load_genres();
        }
        if !self.navigation_stack.is_empty() {
            return;
        }
        match self.current_tab {
            Tab::Home if !self.home.requested => self.load_home(),
            Tab::Movies if !self.movies.requested => self.fetch_browse(MediaKind::Movie, 1),
            Tab::Tv if !self.shows.requested => self.fetch_browse(MediaKind::Tv, 1),
            _ => {}
        }
    }

    // === Lists ===

    fn toggle_watchlist(&mut self, item: &CatalogItem) {
        match self.lists.toggle_watchlist(item) {
            Ok(true) => {
                log::info!("Added \"{}\" to watchlist", item.title);
                self.status_message = format!("Added to watchlist: {}", item.title);
            }
            Ok(false) => {
                log::info!("Removed \"{}\" from watchlist", item.title);
                self.status_message = format!("Removed from watchlist: {}", item.title);
            }
            Err(e) => {
                log::error!("Failed to update watchlist: {}", e);
                self.status_message = "Failed to update watchlist".to_string();
            }
        }
        self.refresh_lists();
    }

    fn evict(&mut self, kind: ListKind, id: u64) {
        if let Err(e) = self.lists.evict(kind, id) {
            log::error!("Failed to update {}: {}", kind.label(), e);
        }
        self.refresh_lists();
    }

    fn clear_list(&mut self, kind: ListKind) {
        match self.lists.clear(kind) {
            Ok(()) => log::info!("Cleared {}", kind.label()),
            Err(e) => log::error!("Failed to clear {}: {}", kind.label(), e),
        }
        self.refresh_lists();
    }

    fn set_progress(&mut self, id: u64, percent: f32) {
        if let Err(e) = self.lists.set_progress(id, percent) {
            log::error!("Failed to save progress: {}", e);
        }
        self.refresh_lists();
    }

    // === Playback ===

    fn season_count(&self, item: &CatalogItem) -> u32 {
        item.number_of_seasons.unwrap_or(0).max(MIN_SEASONS)
    }

    fn playback_request<'a>(&self, item: &'a CatalogItem) -> Option<PlaybackRequest<'a>> {
        let server = self.registry.all().get(self.selected_server)?;
        let request = PlaybackRequest::new(item, server);
        Some(if item.is_series() {
            request.with_episode(self.season, self.episode)
        } else {
            request
        })
    }

    fn open_url(&mut self, url: &str) {
        let mut cmd = browser_command(&self.config.browser_command, url);
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        match cmd.spawn() {
            Ok(_) => {
                log::info!("Opened browser: {}", url);
            }
            Err(e) => {
                log::error!("Failed to open browser: {}", e);
                self.status_message = format!("Failed to open browser: {}", e);
            }
        }
    }

    fn play(&mut self) {
        let Some(item) = self.details.as_ref().map(|d| d.item.clone()) else { return };
        let Some(request) = self.playback_request(&item) else { return };
        let url = request.stream_url();
        let server = request.server;
        let (season, episode) = (request.season, request.episode);

        log::info!("[PLAY] {} | Server: {}", item.title, server.name);
        log::info!("[PLAY] URL: {}", url);
        let missing = unresolved_placeholders(&url);
        if !missing.is_empty() {
            log::warn!("Stream URL still has placeholders: {}", missing.join(", "));
        }

        if let Err(e) = self.lists.record_play(&item, season, episode) {
            log::error!("Failed to record play: {}", e);
        }
        self.refresh_lists();
        self.status_message = format!("Playing {} on {}", item.title, server.name);
        self.open_url(&url);
    }

    fn select_server(&mut self, index: usize) {
        let Some(server) = self.registry.all().get(index) else { return };
        self.selected_server = index;
        self.config.preferred_server = server.name.to_string();
        self.settings_draft.preferred_server = server.name.to_string();
        self.config.save();
        log::info!("Preferred server: {}", server.name);
    }

    // === Settings ===

    fn apply_settings(&mut self, ctx: &egui::Context) {
        self.config = self.settings_draft.clone();
        self.config.save();
        self.selected_server = self.registry.position(&self.config.preferred_server).unwrap_or(0);
        apply_style(ctx, &self.config);

        // Catalog settings may have changed; start over with a fresh client
        self.client = Arc::new(CatalogClient::new(self.config.catalog_settings()));
        self.home.reset();
        self.genres.reset();
        self.movies.reset();
        self.shows.reset();
        self.genre_page.reset();
        self.navigation_stack.clear();
        self.details = None;

        log::info!("Settings saved");
        self.status_message = "Settings saved".to_string();
    }

    // === Rendering ===

    /// Wrapped grid of title cards; returns the clicked card, if any
    fn show_cards<'a>(
        &self,
        ui: &mut egui::Ui,
        items: impl IntoIterator<Item = &'a CatalogItem>,
    ) -> Option<(CardAction, CatalogItem)> {
        let mut clicked = None;
        ui.horizontal_wrapped(|ui| {
            for item in items {
                if let Some(action) = self.item_card(ui, item, CARD_WIDTH) {
                    clicked = Some((action, item.clone()));
                }
            }
        });
        clicked
    }

    fn item_card(&self, ui: &mut egui::Ui, item: &CatalogItem, width: f32) -> Option<CardAction> {
        let mut action = None;
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(width);
            ui.vertical(|ui| {
                let title = egui::RichText::new(&item.title).strong();
                if ui.add(egui::Label::new(title).truncate().sense(egui::Sense::click()))
                    .on_hover_text(item.title.as_str())
                    .clicked()
                {
                    action = Some(CardAction::Open);
                }
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(item.kind.label()).small().weak());
                    if let Some(year) = item.year() {
                        ui.label(egui::RichText::new(year).small());
                    }
                    ui.label(egui::RichText::new(format!("⭐ {}", item.display_rating())).small());
                });
                ui.horizontal(|ui| {
                    if ui.small_button("ℹ Details").clicked() {
                        action = Some(CardAction::Open);
                    }
                    let label = if self.is_listed(item.id) { "✔ Listed" } else { "➕ List" };
                    if ui.small_button(label).on_hover_text("Add to or remove from watchlist").clicked() {
                        action = Some(CardAction::ToggleWatchlist);
                    }
                });
            });
        });
        action
    }

    fn handle_card(&mut self, clicked: Option<(CardAction, CatalogItem)>) {
        match clicked {
            Some((CardAction::Open, item)) => self.open_details(item.id, item.kind, None),
            Some((CardAction::ToggleWatchlist, item)) => self.toggle_watchlist(&item),
            None => {}
        }
    }

    fn show_api_key_notice(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.heading("🎬 CineView");
            ui.add_space(10.0);
            ui.label("A TMDB API key is needed to browse the catalog.");
            ui.label(egui::RichText::new(format!(
                "Add one in Settings or set the {} environment variable.",
                config::API_KEY_ENV
            )).weak());
            ui.add_space(10.0);
            if ui.button("⚙ Open Settings").clicked() {
                self.select_tab(Tab::Settings);
            }
        });
    }

    fn show_resume_banner(&mut self, ui: &mut egui::Ui) {
        let Some(entry) = self.list_cache.resume.clone() else { return };
        let mut resume = false;
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("⏯ Continue watching").strong());
                ui.label(&entry.item.title);
                if let Some(label) = entry.episode_label() {
                    ui.label(egui::RichText::new(label).weak());
                }
                ui.add(egui::ProgressBar::new(entry.progress / 100.0)
                    .desired_width(120.0)
                    .text(format!("{:.0}%", entry.progress)));
                if ui.button("▶ Resume").clicked() {
                    resume = true;
                }
            });
        });
        if resume {
            let episode = entry.season.zip(entry.episode);
            self.open_details(entry.item.id, entry.item.kind, episode);
        }
    }

    fn show_home_tab(&mut self, ui: &mut egui::Ui) {
        if !self.has_api_key() {
            self.show_api_key_notice(ui);
            return;
        }

        self.show_resume_banner(ui);
        ui.add_space(6.0);

        let mut clicked = None;

        // Hero strip from the trending row
        if let Some(trending) = self.home.rows.first().filter(|r| !r.is_empty()) {
            egui::ScrollArea::horizontal().id_salt("hero").show(ui, |ui| {
                ui.horizontal(|ui| {
                    for item in trending.iter().take(HERO_SIZE) {
                        egui::Frame::group(ui.style()).show(ui, |ui| {
                            ui.set_width(HERO_WIDTH);
                            ui.vertical(|ui| {
                                ui.heading(&item.title);
                                ui.label(egui::RichText::new(format!(
                                    "{} · {} · ⭐ {}",
                                    item.kind.label(),
                                    item.year().unwrap_or("-"),
                                    item.display_rating()
                                )).weak());
                                ui.label(snippet(&item.overview, 160));
                                ui.horizontal(|ui| {
                                    if ui.button("▶ Watch").clicked() {
                                        clicked = Some((CardAction::Open, item.clone()));
                                    }
                                    let label = if self.is_listed(item.id) { "✔ Watchlist" } else { "➕ Watchlist" };
                                    if ui.button(label).clicked() {
                                        clicked = Some((CardAction::ToggleWatchlist, item.clone()));
                                    }
                                });
                            });
                        });
                    }
                });
            });
            ui.add_space(8.0);
        }

        let mut see_all = None;
        for (index, row) in HOME_ROWS.iter().enumerate() {
            ui.horizontal(|ui| {
                ui.heading(row.title);
                if let RowSource::Genre(id) = row.source {
                    if ui.small_button("See all ➡").clicked() {
                        let name = self.genre_name(id).unwrap_or(row.title).to_string();
                        see_all = Some(Genre { id, name });
                    }
                }
            });

            let items = &self.home.rows[index];
            if items.is_empty() {
                if self.pending_tasks > 0 {
                    ui.spinner();
                } else {
                    ui.label(egui::RichText::new("Nothing to show").weak());
                }
                continue;
            }

            egui::ScrollArea::horizontal().id_salt(("row", index)).show(ui, |ui| {
                ui.horizontal(|ui| {
                    for item in items {
                        if let Some(action) = self.item_card(ui, item, CARD_WIDTH) {
                            clicked = Some((action, item.clone()));
                        }
                    }
                });
            });
            ui.add_space(8.0);
        }

        self.handle_card(clicked);
        if let Some(genre) = see_all {
            self.open_genre(&genre, MediaKind::Movie);
        }
    }

    fn show_browse_tab(&mut self, ui: &mut egui::Ui, kind: MediaKind) {
        if !self.has_api_key() {
            self.show_api_key_notice(ui);
            return;
        }

        let genres = self.genres_for(kind).to_vec();
        let state = self.browse_state(kind);
        let Some(mut query) = state.query.clone() else { return };
        let before = query.clone();

        ui.horizontal(|ui| {
            ui.label("Show:");
            egui::ComboBox::from_id_salt(("mode", kind.as_path()))
                .selected_text(query.mode.label(kind))
                .show_ui(ui, |ui| {
                    for mode in ListingMode::ALL {
                        ui.selectable_value(&mut query.mode, mode, mode.label(kind));
                    }
                });

            if query.mode.uses_filters() {
                ui.label("Genre:");
                let selected = query
                    .genre
                    .and_then(|id| genres.iter().find(|g| g.id == id))
                    .map(|g| g.name.clone())
                    .unwrap_or_else(|| "All".to_string());
                egui::ComboBox::from_id_salt(("genre", kind.as_path()))
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut query.genre, None, "All");
                        for genre in &genres {
                            ui.selectable_value(&mut query.genre, Some(genre.id), genre.name.as_str());
                        }
                    });

                ui.label("Language:");
                let selected = query
                    .language
                    .as_deref()
                    .and_then(|code| LANGUAGES.iter().find(|(c, _)| *c == code))
                    .map(|(_, name)| *name)
                    .unwrap_or("Any");
                egui::ComboBox::from_id_salt(("lang", kind.as_path()))
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut query.language, None, "Any");
                        for (code, name) in LANGUAGES {
                            ui.selectable_value(&mut query.language, Some(code.to_string()), *name);
                        }
                    });

                ui.label("Sort:");
                egui::ComboBox::from_id_salt(("sort", kind.as_path()))
                    .selected_text(query.sort_by.label())
                    .show_ui(ui, |ui| {
                        for sort in SortBy::ALL {
                            ui.selectable_value(&mut query.sort_by, sort, sort.label());
                        }
                    });
            }

            ui.separator();
            ui.add(egui::TextEdit::singleline(&mut self.title_filter)
                .hint_text("Filter loaded titles...")
                .desired_width(160.0));
        });
        ui.separator();

        if query != before {
            let state = self.browse_state(kind);
            state.query = Some(query);
            state.list.clear();
            self.fetch_browse(kind, 1);
        }

        let state = match kind {
            MediaKind::Movie => &self.movies,
            MediaKind::Tv => &self.shows,
        };
        let filter = self.title_filter.as_str();
        let visible = state.list.items.iter().filter(|i| contains_ignore_case(&i.title, filter));
        let clicked = self.show_cards(ui, visible);
        let load_more = self.load_more_button(ui, state);

        self.handle_card(clicked);
        if load_more {
            let next = self.browse_state(kind).list.next_page();
            self.fetch_browse(kind, next);
        }
    }

    /// Spinner while loading, otherwise a Load More button when pages remain
    fn load_more_button(&self, ui: &mut egui::Ui, state: &BrowseState) -> bool {
        ui.add_space(8.0);
        let mut clicked = false;
        ui.vertical_centered(|ui| {
            if state.loading {
                ui.spinner();
            } else if state.list.has_more() {
                clicked = ui.button("⬇ Load More").clicked();
            } else if state.requested && state.list.items.is_empty() {
                ui.label(egui::RichText::new("No titles found").weak());
            }
        });
        clicked
    }

    fn show_genre_page(&mut self, ui: &mut egui::Ui, id: u32, name: &str, kind: MediaKind) {
        ui.heading(format!("{} · {}s", name, kind.label()));
        ui.separator();

        let clicked = self.show_cards(ui, &self.genre_page.list.items);
        let load_more = self.load_more_button(ui, &self.genre_page);

        self.handle_card(clicked);
        if load_more {
            let next = self.genre_page.list.next_page();
            self.fetch_genre_page(id, kind, next);
        }
    }

    fn show_explore_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Explore");
        ui.label(egui::RichText::new("Search with the box at the top, then narrow the results here.").weak());
        ui.separator();

        let mut genres: Vec<Genre> = self.genres.movie.clone();
        for genre in &self.genres.tv {
            if !genres.iter().any(|g| g.id == genre.id) {
                genres.push(genre.clone());
            }
        }
        let years = recent_years(chrono::Local::now().year());
        let filter = &mut self.explore_filter;

        ui.horizontal(|ui| {
            ui.label("Type:");
            let selected = filter.kind.map(|k| k.label()).unwrap_or("All");
            egui::ComboBox::from_id_salt("explore_kind")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut filter.kind, None, "All");
                    ui.selectable_value(&mut filter.kind, Some(MediaKind::Movie), "Movies");
                    ui.selectable_value(&mut filter.kind, Some(MediaKind::Tv), "TV Shows");
                });

            ui.label("Year:");
            let selected = filter.year.clone().unwrap_or_else(|| "Any".to_string());
            egui::ComboBox::from_id_salt("explore_year")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut filter.year, None, "Any");
                    for year in &years {
                        ui.selectable_value(&mut filter.year, Some(year.clone()), year.as_str());
                    }
                });

            ui.label("Genre:");
            let selected = filter
                .genre
                .and_then(|id| genres.iter().find(|g| g.id == id))
                .map(|g| g.name.clone())
                .unwrap_or_else(|| "Any".to_string());
            egui::ComboBox::from_id_salt("explore_genre")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut filter.genre, None, "Any");
                    for genre in &genres {
                        ui.selectable_value(&mut filter.genre, Some(genre.id), genre.name.as_str());
                    }
                });

            if ui.button("✖ Reset").clicked() {
                *filter = ExploreFilter::default();
            }
        });
        ui.separator();

        if self.search_input.trim().chars().count() < search::MIN_QUERY_CHARS {
            ui.label(egui::RichText::new(format!(
                "Type at least {} characters to search movies and TV shows.",
                search::MIN_QUERY_CHARS
            )).weak());
            return;
        }
        if self.debouncer.is_pending() {
            ui.spinner();
            return;
        }

        let results = self.explore_filter.apply(&self.search_results);
        ui.label(format!("{} of {} results", results.len(), self.search_results.len()));
        let clicked = self.show_cards(ui, results);
        self.handle_card(clicked);
    }

    fn show_details_page(&mut self, ui: &mut egui::Ui, id: u64, kind: MediaKind) {
        let mut action = None;
        let mut season = self.season;
        let mut episode = self.episode;
        let mut server_index = self.selected_server;

        match self.details.as_ref().filter(|d| d.item.id == id) {
            Some(details) => {
                self.render_details(ui, details, &mut season, &mut episode, &mut server_index, &mut action);
            }
            None if self.details_loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading details...");
                });
            }
            None => {
                ui.label("Details unavailable");
                if ui.button("🔄 Retry").clicked() {
                    action = Some(DetailAction::Retry);
                }
            }
        }

        let episode_changed = season != self.season || episode != self.episode;
        self.season = season;
        self.episode = episode;
        let server_changed = server_index != self.selected_server;
        if server_changed {
            self.select_server(server_index);
        }
        if (episode_changed || server_changed) && self.config.autoplay && action.is_none() {
            action = Some(DetailAction::Play);
        }

        match action {
            Some(DetailAction::Retry) => self.fetch_details(id, kind),
            Some(DetailAction::ToggleWatchlist) => {
                if let Some(item) = self.details.as_ref().map(|d| d.item.clone()) {
                    self.toggle_watchlist(&item);
                }
            }
            Some(DetailAction::Play) => self.play(),
            Some(DetailAction::Download) => {
                let url = self
                    .details
                    .as_ref()
                    .and_then(|d| self.playback_request(&d.item).map(|r| r.download_url()));
                if let Some(url) = url {
                    log::info!("Download link: {}", url);
                    self.open_url(&url);
                }
            }
            Some(DetailAction::CopyLink(url)) => {
                ui.ctx().copy_text(url);
                self.status_message = "Link copied to clipboard".to_string();
            }
            Some(DetailAction::OpenUrl(url)) => self.open_url(&url),
            Some(DetailAction::OpenGenre(genre)) => self.open_genre(&genre, kind),
            Some(DetailAction::Open(item)) => self.open_details(item.id, item.kind, None),
            Some(DetailAction::ToggleSimilar(item)) => self.toggle_watchlist(&item),
            None => {}
        }
    }

    fn render_details(
        &self,
        ui: &mut egui::Ui,
        details: &ItemDetails,
        season: &mut u32,
        episode: &mut u32,
        server_index: &mut usize,
        action: &mut Option<DetailAction>,
    ) {
        let item = &details.item;

        ui.heading(&item.title);
        ui.horizontal_wrapped(|ui| {
            ui.label(egui::RichText::new(item.kind.label()).weak());
            if let Some(year) = item.year() {
                ui.label(year);
            }
            ui.label(format!("⭐ {}", item.display_rating()));
            if let Some(runtime) = item.runtime.filter(|r| *r > 0) {
                ui.label(format!("{} min", runtime));
            }
            if let Some(seasons) = item.number_of_seasons {
                ui.label(format!("{} seasons", seasons));
            }
            if let Some(episodes) = item.number_of_episodes {
                ui.label(format!("{} episodes", episodes));
            }
        });

        ui.horizontal_wrapped(|ui| {
            for genre in &item.genres {
                if ui.small_button(&genre.name).clicked() {
                    *action = Some(DetailAction::OpenGenre(genre.clone()));
                }
            }
        });

        ui.add_space(4.0);
        ui.label(&item.overview);
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            let label = if self.is_listed(item.id) { "✔ In Watchlist" } else { "➕ Add to Watchlist" };
            if ui.button(label).clicked() {
                *action = Some(DetailAction::ToggleWatchlist);
            }
            let base = &self.config.image_base_url;
            if let Some(poster) = image_url(base, item.poster_path.as_deref(), "w500") {
                ui.hyperlink_to("🖼 Poster", poster);
            }
            if let Some(backdrop) = image_url(base, item.backdrop_path.as_deref(), "original") {
                ui.hyperlink_to("🖼 Backdrop", backdrop);
            }
            if let Some(imdb) = &item.imdb_id {
                ui.hyperlink_to("IMDb", format!("https://www.imdb.com/title/{}/", imdb));
            }
        });

        ui.separator();
        self.render_player(ui, item, season, episode, server_index, action);
        ui.separator();

        if !details.trailers.is_empty() {
            ui.heading("Trailers");
            for video in &details.trailers {
                if let Some(url) = video.watch_url() {
                    if ui.link(format!("🎞 {}", video.name)).clicked() {
                        *action = Some(DetailAction::OpenUrl(url));
                    }
                }
            }
            ui.add_space(6.0);
        }

        if !details.cast.is_empty() {
            ui.heading("Cast");
            egui::Grid::new("cast_grid")
                .num_columns(2)
                .spacing([20.0, 4.0])
                .show(ui, |ui| {
                    for member in &details.cast {
                        ui.label(egui::RichText::new(&member.name).strong());
                        ui.label(member.character.as_deref().unwrap_or(""));
                        ui.end_row();
                    }
                });
            ui.add_space(6.0);
        }

        if !details.similar.is_empty() {
            ui.heading("More Like This");
            if let Some((card, item)) = self.show_cards(ui, &details.similar) {
                *action = Some(match card {
                    CardAction::Open => DetailAction::Open(item),
                    CardAction::ToggleWatchlist => DetailAction::ToggleSimilar(item),
                });
            }
        }
    }

    fn render_player(
        &self,
        ui: &mut egui::Ui,
        item: &CatalogItem,
        season: &mut u32,
        episode: &mut u32,
        server_index: &mut usize,
        action: &mut Option<DetailAction>,
    ) {
        ui.heading("▶ Watch");

        let servers = self.registry.all();
        ui.horizontal(|ui| {
            ui.label("Server:");
            let current = servers.get(*server_index).map(|s| s.name).unwrap_or("-");
            egui::ComboBox::from_id_salt("server_combo")
                .selected_text(current)
                .width(280.0)
                .show_ui(ui, |ui| {
                    for (i, server) in servers.iter().enumerate() {
                        let badges = server.badges();
                        let text = if badges.is_empty() {
                            server.name.to_string()
                        } else {
                            format!("{}  [{}]", server.name, badges.join(", "))
                        };
                        ui.selectable_value(server_index, i, text);
                    }
                });

            if item.is_series() {
                ui.separator();
                ui.label("Season:");
                egui::ComboBox::from_id_salt("season_combo")
                    .selected_text(season.to_string())
                    .show_ui(ui, |ui| {
                        for s in 1..=self.season_count(item) {
                            ui.selectable_value(season, s, s.to_string());
                        }
                    });
                ui.label("Episode:");
                egui::ComboBox::from_id_salt("episode_combo")
                    .selected_text(episode.to_string())
                    .show_ui(ui, |ui| {
                        for e in 1..=EPISODES_PER_SEASON {
                            ui.selectable_value(episode, e, e.to_string());
                        }
                    });
            }
        });

        // Resume banner for this title
        if let Some(entry) = self.list_cache.resume.as_ref().filter(|e| e.item.id == item.id) {
            ui.horizontal(|ui| {
                let position = entry.episode_label().unwrap_or_default();
                ui.label(egui::RichText::new(format!(
                    "⏯ You stopped at {:.0}% {}",
                    entry.progress, position
                )).italics());
                if let (Some(s), Some(e)) = (entry.season, entry.episode) {
                    if ui.small_button("Jump there").clicked() {
                        *season = s;
                        *episode = e;
                    }
                }
            });
        }

        let Some(server) = servers.get(*server_index) else { return };
        let mut request = PlaybackRequest::new(item, server);
        if item.is_series() {
            request = request.with_episode(*season, *episode);
        }
        let url = request.stream_url();

        if server.scheme == IdScheme::Imdb && item.imdb_id.is_none() {
            ui.colored_label(
                egui::Color32::YELLOW,
                "⚠ This server needs an IMDb id and none is known for this title. Try another server.",
            );
        }
        let missing = unresolved_placeholders(&url);
        if !missing.is_empty() {
            ui.colored_label(
                egui::Color32::YELLOW,
                format!("⚠ Link is incomplete: {}", missing.join(", ")),
            );
        }

        ui.label(egui::RichText::new(&url).monospace().small());
        ui.horizontal(|ui| {
            if ui.button("▶ Play in browser").clicked() {
                *action = Some(DetailAction::Play);
            }
            if ui.button("📋 Copy link").clicked() {
                *action = Some(DetailAction::CopyLink(url.clone()));
            }
            if ui.button("⬇ Download").clicked() {
                *action = Some(DetailAction::Download);
            }
        });
    }

    fn show_profile_tab(&mut self, ui: &mut egui::Ui) {
        self.show_resume_banner(ui);
        ui.add_space(6.0);

        let tabs: Vec<(ListKind, String)> = [ListKind::Watchlist, ListKind::ContinueWatching, ListKind::History]
            .into_iter()
            .map(|kind| (kind, format!("{} ({})", kind.label(), self.cached(kind).len())))
            .collect();
        let mut clear = false;

        ui.horizontal(|ui| {
            for (kind, text) in tabs {
                ui.selectable_value(&mut self.profile_list, kind, text);
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                clear = ui.button("🗑 Clear").clicked();
            });
        });
        ui.separator();

        let kind = self.profile_list;
        if clear {
            self.clear_list(kind);
        }
        let entries = self.cached(kind).to_vec();
        if entries.is_empty() {
            ui.label(egui::RichText::new(format!("Your {} is empty", kind.label().to_lowercase())).weak());
            return;
        }

        let mut open = None;
        let mut remove = None;
        let mut progress = None;

        egui::Grid::new("profile_grid")
            .num_columns(5)
            .striped(true)
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                for entry in &entries {
                    if ui.link(&entry.item.title).clicked() {
                        open = Some(entry.clone());
                    }
                    ui.label(egui::RichText::new(entry.item.kind.label()).weak());
                    ui.label(entry.episode_label().unwrap_or_default());
                    ui.label(format_timestamp(entry.added_at));

                    ui.horizontal(|ui| {
                        if kind == ListKind::ContinueWatching {
                            let mut value = entry.progress;
                            let response = ui.add(egui::Slider::new(&mut value, 0.0..=100.0)
                                .suffix("%")
                                .integer());
                            if response.drag_stopped() || (response.changed() && !response.dragged()) {
                                progress = Some((entry.item.id, value));
                            }
                        }
                        if ui.small_button("✖").on_hover_text("Remove").clicked() {
                            remove = Some(entry.item.id);
                        }
                    });
                    ui.end_row();
                }
            });

        if let Some(entry) = open {
            let episode = entry.season.zip(entry.episode);
            self.open_details(entry.item.id, entry.item.kind, episode);
        }
        if let Some(id) = remove {
            self.evict(kind, id);
        }
        if let Some((id, value)) = progress {
            self.set_progress(id, value);
        }
    }

    fn show_settings_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.separator();

        let servers = self.registry.all();
        let draft = &mut self.settings_draft;

        egui::Grid::new("settings_grid")
            .num_columns(2)
            .spacing([20.0, 8.0])
            .show(ui, |ui| {
                ui.label("TMDB API key:");
                ui.add(egui::TextEdit::singleline(&mut draft.tmdb_api_key)
                    .password(true)
                    .hint_text(format!("or set {}", config::API_KEY_ENV))
                    .desired_width(320.0));
                ui.end_row();

                ui.label("API base URL:");
                ui.add(egui::TextEdit::singleline(&mut draft.api_base_url).desired_width(320.0));
                ui.end_row();

                ui.label("Image base URL:");
                ui.add(egui::TextEdit::singleline(&mut draft.image_base_url).desired_width(320.0));
                ui.end_row();

                ui.label("Relay URL:");
                ui.add(egui::TextEdit::singleline(&mut draft.proxy_url).desired_width(320.0))
                    .on_hover_text("Used once when a direct TMDB request fails.\nThe target is passed as ?url=...");
                ui.end_row();

                ui.label("Language:");
                let selected = LANGUAGES
                    .iter()
                    .find(|(code, _)| *code == draft.language)
                    .map(|(_, name)| *name)
                    .unwrap_or("Default");
                egui::ComboBox::from_id_salt("settings_lang")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut draft.language, String::new(), "Default");
                        for (code, name) in LANGUAGES {
                            ui.selectable_value(&mut draft.language, code.to_string(), *name);
                        }
                    });
                ui.end_row();

                ui.label("Default server:");
                let selected = if draft.preferred_server.is_empty() {
                    servers.first().map(|s| s.name).unwrap_or("-")
                } else {
                    draft.preferred_server.as_str()
                };
                egui::ComboBox::from_id_salt("settings_server")
                    .selected_text(selected.to_string())
                    .width(280.0)
                    .show_ui(ui, |ui| {
                        for server in servers {
                            ui.selectable_value(&mut draft.preferred_server, server.name.to_string(), server.name);
                        }
                    });
                ui.end_row();

                ui.label("Browser command:");
                ui.add(egui::TextEdit::singleline(&mut draft.browser_command)
                    .hint_text("system default")
                    .desired_width(320.0))
                    .on_hover_text("Program used to open stream links, e.g.\n• firefox\n• chromium --incognito\n\nLeave empty for the system default browser");
                ui.end_row();

                ui.label("Theme:");
                ui.checkbox(&mut draft.dark_mode, "🌙 Dark mode");
                ui.end_row();

                ui.label("Autoplay:");
                ui.checkbox(&mut draft.autoplay, "Start playing when the server or episode changes");
                ui.end_row();

                ui.label("Font size:");
                ui.add(egui::Slider::new(&mut draft.font_size, 10..=24));
                ui.end_row();
            });

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui.button("💾 Save").clicked() {
                let ctx = ui.ctx().clone();
                self.apply_settings(&ctx);
            }
            if ui.button("↺ Reset to defaults").clicked() {
                self.settings_draft = AppConfig::default();
            }
            if ui.button("✖ Discard changes").clicked() {
                self.settings_draft = self.config.clone();
            }
        });

        ui.add_space(10.0);
        ui.label(egui::RichText::new(format!(
            "Lists are stored in {}",
            AppConfig::data_dir().display()
        )).weak());
    }

    fn show_faq_tab(&self, ui: &mut egui::Ui) {
        ui.heading("Frequently Asked Questions");
        ui.separator();
        for (question, answer) in FAQ {
            egui::CollapsingHeader::new(*question).show(ui, |ui| {
                ui.label(*answer);
            });
        }
    }

    fn show_console_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Console Log");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🗑 Clear").clicked() {
                    self.console.clear();
                    self.console.push(format!("[{}] Console cleared", timestamp_now()));
                }
            });
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in self.console.snapshot() {
                    let color = if line.contains("[PLAY]") {
                        egui::Color32::GREEN
                    } else if line.contains("[ERROR]") {
                        egui::Color32::RED
                    } else if line.contains("[WARN]") {
                        egui::Color32::YELLOW
                    } else if line.contains("[INFO]") {
                        egui::Color32::LIGHT_BLUE
                    } else {
                        egui::Color32::GRAY
                    };

                    ui.label(egui::RichText::new(line).monospace().color(color));
                }
            });
    }

    fn show_quick_search(&mut self, ctx: &egui::Context) {
        if !self.show_quick_results || self.search_results.is_empty() {
            return;
        }

        let mut open = None;
        let mut see_all = false;
        egui::TopBottomPanel::top("quick_results").show(ctx, |ui| {
            for item in self.search_results.iter().take(MAX_RESULTS) {
                let text = format!(
                    "{}  ({}) · {} · ⭐ {}",
                    item.title,
                    item.year().unwrap_or("-"),
                    item.kind.label(),
                    item.display_rating()
                );
                if ui.selectable_label(false, text).clicked() {
                    open = Some((item.id, item.kind));
                }
            }
            ui.horizontal(|ui| {
                if ui.small_button("🔎 See all results").clicked() {
                    see_all = true;
                }
                if ui.small_button("✖ Close").clicked() {
                    self.show_quick_results = false;
                }
            });
        });

        if let Some((id, kind)) = open {
            self.open_details(id, kind, None);
        }
        if see_all {
            self.select_tab(Tab::Explore);
        }
    }
}

impl eframe::App for CineViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process background task results (non-blocking)
        self.process_results();

        // Fire a debounced search once its deadline passes
        let now = Instant::now();
        if let Some(ticket) = self.debouncer.poll(now) {
            self.start_search(ticket.generation, ticket.query);
        }
        if let Some(wait) = self.debouncer.time_until_due(now) {
            ctx.request_repaint_after(wait);
        }

        self.ensure_loaded();

        if self.pending_tasks > 0 {
            ctx.request_repaint();
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.show_quick_results = false;
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.heading("🎬 CineView");
                ui.separator();

                let response = ui.add(egui::TextEdit::singleline(&mut self.search_input)
                    .hint_text("🔎 Search movies & TV...")
                    .desired_width(260.0));
                if response.changed() {
                    match self.debouncer.input(&self.search_input, Instant::now()) {
                        InputOutcome::Cleared => {
                            self.search_results.clear();
                            self.show_quick_results = false;
                        }
                        InputOutcome::Scheduled => {}
                    }
                }
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    self.select_tab(Tab::Explore);
                }

                ui.separator();
                if ui.checkbox(&mut self.config.dark_mode, "🌙 Dark").changed() {
                    self.settings_draft.dark_mode = self.config.dark_mode;
                    apply_style(ctx, &self.config);
                    self.config.save();
                }
            });
            ui.add_space(5.0);
        });

        self.show_quick_search(ctx);

        // Bottom panel - Status
        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.pending_tasks > 0 || self.debouncer.is_pending() {
                    ui.spinner();
                }
                ui.label(&self.status_message);
            });
        });

        // Main content
        egui::CentralPanel::default().show(ctx, |ui| {
            // Tab bar
            let mut tab = None;
            ui.horizontal(|ui| {
                for (t, label) in [
                    (Tab::Home, "🏠 HOME"),
                    (Tab::Movies, "🎬 MOVIES"),
                    (Tab::Tv, "📺 TV SHOWS"),
                    (Tab::Explore, "🔎 EXPLORE"),
                    (Tab::Profile, "👤 PROFILE"),
                    (Tab::Settings, "⚙ SETTINGS"),
                    (Tab::Faq, "❓ FAQ"),
                ] {
                    if ui.selectable_label(self.current_tab == t, label).clicked() {
                        tab = Some(t);
                    }
                }

                // Push Console to the right
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.selectable_label(self.current_tab == Tab::Console, "🖥 CONSOLE").clicked() {
                        tab = Some(Tab::Console);
                    }
                });
            });
            if let Some(tab) = tab {
                self.select_tab(tab);
            }
            ui.separator();

            if !self.navigation_stack.is_empty() && ui.button("⬅ Back").clicked() {
                self.go_back();
            }

            if self.current_tab == Tab::Console {
                self.show_console_tab(ui);
                return;
            }

            egui::ScrollArea::vertical()
                .id_salt("main_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.set_min_width(ui.available_width());
                    match self.navigation_stack.last().cloned() {
                        Some(NavigationLevel::Details(id, kind)) => self.show_details_page(ui, id, kind),
                        Some(NavigationLevel::Genre { id, name, kind }) => {
                            self.show_genre_page(ui, id, &name, kind)
                        }
                        None => match self.current_tab {
                            Tab::Home => self.show_home_tab(ui),
                            Tab::Movies => self.show_browse_tab(ui, MediaKind::Movie),
                            Tab::Tv => self.show_browse_tab(ui, MediaKind::Tv),
                            Tab::Explore => self.show_explore_tab(ui),
                            Tab::Profile => self.show_profile_tab(ui),
                            Tab::Settings => self.show_settings_tab(ui),
                            Tab::Faq => self.show_faq_tab(ui),
                            Tab::Console => {}
                        },
                    }
                });
        });
    }
}

/// Local date and time for a Unix millisecond timestamp
fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
