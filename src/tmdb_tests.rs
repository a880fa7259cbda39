//! Tests for the TMDB catalog client

use crate::browse::{DiscoverQuery, ListingMode, SortBy};
use crate::models::{CatalogItem, MediaKind, TmdbItem};
use crate::tmdb::*;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted transport: pops one canned result per call and records URLs
struct FakeTransport {
    responses: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CatalogError::Http("no scripted response".into())))
    }
}

fn settings() -> CatalogSettings {
    let mut s = CatalogSettings::new("KEY");
    s.api_base = "https://api.test/3".to_string();
    s.proxy_url = "https://relay.test/raw".to_string();
    s
}

fn client(responses: Vec<Result<String>>) -> CatalogClient<FakeTransport> {
    CatalogClient::with_transport(settings(), FakeTransport::new(responses))
}

const PAGE: &str = r#"{"page": 1, "total_pages": 4, "total_results": 80,
    "results": [{"id": 550, "title": "Fight Club", "release_date": "1999-10-15"}]}"#;

#[test]
fn test_direct_success_makes_one_request() {
    let c = client(vec![Ok(PAGE.to_string())]);
    let page = c.popular(MediaKind::Movie, 1).unwrap();
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.total_pages, 4);

    let calls = c.transport().calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("https://api.test/3/movie/popular?"));
    assert!(calls[0].contains("api_key=KEY"));
    assert!(calls[0].contains("page=1"));
}

#[test]
fn test_direct_failure_falls_back_to_relay_once() {
    let c = client(vec![
        Err(CatalogError::Http("connection refused".into())),
        Ok(PAGE.to_string()),
    ]);
    let page = c.trending(MediaKind::Movie, TimeWindow::Week, 1).unwrap();
    assert_eq!(page.results[0].id, 550);

    let calls = c.transport().calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].starts_with("https://api.test/3/trending/movie/week?"));

    let relay = url::Url::parse(&calls[1]).unwrap();
    assert_eq!(relay.host_str(), Some("relay.test"));
    let wrapped: Vec<_> = relay.query_pairs().filter(|(k, _)| k == "url").collect();
    assert_eq!(wrapped.len(), 1);
    assert_eq!(wrapped[0].1, calls[0]);
}

#[test]
fn test_status_error_triggers_fallback() {
    let c = client(vec![Err(CatalogError::Status(503)), Ok(PAGE.to_string())]);
    assert!(c.top_rated(MediaKind::Tv, 2).is_ok());
    assert_eq!(c.transport().calls().len(), 2);
}

#[test]
fn test_both_attempts_fail_propagates_after_two() {
    let c = client(vec![
        Err(CatalogError::Status(500)),
        Err(CatalogError::Status(502)),
        Ok(PAGE.to_string()),
    ]);
    let err = c.popular(MediaKind::Movie, 1).unwrap_err();
    assert!(matches!(err, CatalogError::Status(502)));
    assert_eq!(c.transport().calls().len(), 2);
}

#[test]
fn test_malformed_body_is_decode_error() {
    let c = client(vec![Ok("<html>oops</html>".to_string())]);
    let err = c.genres(MediaKind::Movie).unwrap_err();
    assert!(matches!(err, CatalogError::Decode(_)));
    // Decoding problems are not network failures; no relay attempt
    assert_eq!(c.transport().calls().len(), 1);
}

#[test]
fn test_missing_api_key() {
    let mut s = settings();
    s.api_key.clear();
    let c = CatalogClient::with_transport(s, FakeTransport::new(vec![]));
    assert!(matches!(c.search("matrix"), Err(CatalogError::MissingApiKey)));
    assert!(c.transport().calls().is_empty());
}

#[test]
fn test_search_query_is_encoded() {
    let c = client(vec![Ok(PAGE.to_string())]);
    c.search("the lord & rings").unwrap();
    let calls = c.transport().calls();
    let url = url::Url::parse(&calls[0]).unwrap();
    assert_eq!(url.path(), "/3/search/multi");
    let query: Vec<_> = url.query_pairs().filter(|(k, _)| k == "query").collect();
    assert_eq!(query[0].1, "the lord & rings");
}

#[test]
fn test_language_param_added_when_set() {
    let mut s = settings();
    s.language = Some("fr".to_string());
    let c = CatalogClient::with_transport(s, FakeTransport::new(vec![Ok(PAGE.to_string())]));
    c.popular(MediaKind::Movie, 1).unwrap();
    assert!(c.transport().calls()[0].contains("language=fr"));
}

#[test]
fn test_discover_and_by_genre_paths() {
    let c = client(vec![Ok(PAGE.to_string()), Ok(PAGE.to_string())]);
    c.by_genre(878, MediaKind::Movie, 2).unwrap();

    let mut q = DiscoverQuery::new(MediaKind::Tv).with_language("hi");
    q.sort_by = SortBy::Rating;
    c.discover(&q).unwrap();

    let calls = c.transport().calls();
    assert!(calls[0].starts_with("https://api.test/3/discover/movie?"));
    assert!(calls[0].contains("with_genres=878"));
    assert!(calls[1].starts_with("https://api.test/3/discover/tv?"));
    assert!(calls[1].contains("with_original_language=hi"));
    assert!(calls[1].contains("sort_by=vote_average.desc"));
}

#[test]
fn test_listing_follows_mode() {
    let c = client((0..4).map(|_| Ok(PAGE.to_string())).collect());
    let base = DiscoverQuery::new(MediaKind::Tv).with_genre(18).with_page(2);

    for mode in ListingMode::ALL {
        c.listing(&base.clone().with_mode(mode)).unwrap();
    }

    let calls = c.transport().calls();
    assert_eq!(calls.len(), 4);
    assert!(calls[0].starts_with("https://api.test/3/discover/tv?"));
    assert!(calls[0].contains("with_genres=18"));
    assert!(calls[1].starts_with("https://api.test/3/tv/popular?"));
    assert!(calls[2].starts_with("https://api.test/3/tv/top_rated?"));
    assert!(calls[3].starts_with("https://api.test/3/trending/tv/week?"));
    for call in &calls[1..] {
        assert!(call.contains("page=2"));
        assert!(!call.contains("with_genres"));
    }
}

#[test]
fn test_details_hoists_imdb_id() {
    let body = r#"{
        "id": 1399, "name": "Game of Thrones", "first_air_date": "2011-04-17",
        "number_of_seasons": 8, "number_of_episodes": 73,
        "genres": [{"id": 18, "name": "Drama"}],
        "external_ids": {"imdb_id": "tt0944947"},
        "credits": {"cast": [{"id": 1, "name": "Emilia Clarke", "character": "Daenerys"}]},
        "videos": {"results": [
            {"key": "a", "name": "Teaser", "site": "YouTube", "type": "Teaser"},
            {"key": "b", "name": "Trailer", "site": "YouTube", "type": "Trailer"}
        ]},
        "similar": {"page": 1, "total_pages": 1, "results": [{"id": 1400, "name": "Other"}]}
    }"#;
    let c = client(vec![Ok(body.to_string())]);
    let details = c.details(1399, MediaKind::Tv).unwrap();
    assert_eq!(details.item.imdb_id.as_deref(), Some("tt0944947"));
    assert!(c.transport().calls()[0]
        .contains("append_to_response=external_ids%2Ccredits%2Cvideos%2Csimilar"));

    let details = details.into_details(MediaKind::Tv).unwrap();
    assert_eq!(details.item.title, "Game of Thrones");
    assert_eq!(details.item.number_of_seasons, Some(8));
    assert_eq!(details.item.genre_ids, vec![18]);
    assert_eq!(details.cast.len(), 1);
    assert_eq!(details.trailers.len(), 1);
    assert_eq!(details.trailers[0].key, "b");
    assert_eq!(details.similar[0].id, 1400);
    assert_eq!(details.similar[0].kind, MediaKind::Tv);
}

#[test]
fn test_resolve_imdb_id() {
    let c = client(vec![Ok(r#"{"imdb_id": "tt0137523"}"#.to_string())]);

    let with_id = CatalogItem::from_raw(
        TmdbItem { id: 550, imdb_id: Some("tt0137523".into()), ..Default::default() },
        MediaKind::Movie,
    )
    .unwrap();
    assert_eq!(c.resolve_imdb_id(&with_id).unwrap().as_deref(), Some("tt0137523"));
    assert!(c.transport().calls().is_empty());

    let without = CatalogItem { imdb_id: None, ..with_id };
    assert_eq!(c.resolve_imdb_id(&without).unwrap().as_deref(), Some("tt0137523"));
    assert!(c.transport().calls()[0].contains("/movie/550/external_ids"));
}

#[test]
fn test_item_details_looks_up_missing_imdb_id() {
    let body = r#"{"id": 550, "title": "Fight Club", "release_date": "1999-10-15"}"#;
    let c = client(vec![
        Ok(body.to_string()),
        Ok(r#"{"imdb_id": "tt0137523"}"#.to_string()),
    ]);
    let details = c.item_details(550, MediaKind::Movie).unwrap().unwrap();
    assert_eq!(details.item.imdb_id.as_deref(), Some("tt0137523"));

    let calls = c.transport().calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].starts_with("https://api.test/3/movie/550/external_ids?"));
}

#[test]
fn test_item_details_keeps_going_when_lookup_fails() {
    let body = r#"{"id": 550, "title": "Fight Club", "external_ids": {"imdb_id": ""}}"#;
    // Details succeed; both external id attempts fail
    let c = client(vec![
        Ok(body.to_string()),
        Err(CatalogError::Http("timeout".into())),
        Err(CatalogError::Http("timeout".into())),
    ]);
    let details = c.item_details(550, MediaKind::Movie).unwrap().unwrap();
    assert_eq!(details.item.title, "Fight Club");
    assert_eq!(details.item.imdb_id, None);
    assert_eq!(c.transport().calls().len(), 3);
}

#[test]
fn test_item_details_skips_lookup_when_present() {
    let body = r#"{"id": 550, "title": "Fight Club", "external_ids": {"imdb_id": "tt0137523"}}"#;
    let c = client(vec![Ok(body.to_string())]);
    let details = c.item_details(550, MediaKind::Movie).unwrap().unwrap();
    assert_eq!(details.item.imdb_id.as_deref(), Some("tt0137523"));
    assert_eq!(c.transport().calls().len(), 1);
}

#[test]
fn test_image_url() {
    assert_eq!(
        image_url(DEFAULT_IMAGE_BASE, Some("/abc.jpg"), "w500").as_deref(),
        Some("https://image.tmdb.org/t/p/w500/abc.jpg")
    );
    assert_eq!(image_url(DEFAULT_IMAGE_BASE, None, "w500"), None);
    assert_eq!(image_url(DEFAULT_IMAGE_BASE, Some(""), "w500"), None);
}
