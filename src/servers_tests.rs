//! Tests for the server registry and stream URL builder

use crate::servers::*;
use std::collections::HashSet;

const IMDB_SERVER: Server = Server {
    name: "x",
    scheme: IdScheme::Imdb,
    url: "https://x/embed/movie/{imdb_id}",
    url_tv: "https://x/embed/tv/{imdb_id}/{season}/{episode}",
};

const TMDB_SERVER: Server = Server {
    name: "y",
    scheme: IdScheme::Tmdb,
    url: "https://y/movie/{tmdb_id}",
    url_tv: "https://y/tv/{tmdb_id}?s={season}&e={episode}",
};

#[test]
fn test_imdb_movie_example() {
    let url = build_stream_url(&IMDB_SERVER, 550, Some("tt0137523"), None, None, false);
    assert_eq!(url, "https://x/embed/movie/tt0137523");
}

#[test]
fn test_imdb_movie_missing_id_is_empty() {
    let url = build_stream_url(&IMDB_SERVER, 550, None, None, None, false);
    assert_eq!(url, "https://x/embed/movie/");

    // An empty id counts as missing
    let url = build_stream_url(&IMDB_SERVER, 550, Some(""), None, None, false);
    assert_eq!(url, "https://x/embed/movie/");
}

#[test]
fn test_imdb_prefix_added_once() {
    let bare = build_stream_url(&IMDB_SERVER, 550, Some("0137523"), None, None, false);
    assert_eq!(bare, "https://x/embed/movie/tt0137523");
    assert_eq!(bare.matches("tt0137523").count(), 1);
    assert!(!bare.contains("tttt"));

    let prefixed = build_stream_url(&IMDB_SERVER, 550, Some("tt0137523"), None, None, false);
    assert_eq!(prefixed, bare);
}

#[test]
fn test_normalize_imdb_id() {
    assert_eq!(normalize_imdb_id("0137523"), "tt0137523");
    assert_eq!(normalize_imdb_id("tt0137523"), "tt0137523");
}

#[test]
fn test_series_season_episode_substituted() {
    let url = build_stream_url(&IMDB_SERVER, 1399, Some("tt0944947"), Some(2), Some(5), true);
    assert_eq!(url, "https://x/embed/tv/tt0944947/2/5");
    assert!(unresolved_placeholders(&url).is_empty());

    let url = build_stream_url(&TMDB_SERVER, 1399, None, Some(2), Some(5), true);
    assert_eq!(url, "https://y/tv/1399?s=2&e=5");
    assert!(unresolved_placeholders(&url).is_empty());
}

#[test]
fn test_series_missing_episode_keeps_tokens() {
    let url = build_stream_url(&TMDB_SERVER, 1399, None, Some(2), None, true);
    assert_eq!(url, "https://y/tv/1399?s={season}&e={episode}");

    let url = build_stream_url(&TMDB_SERVER, 1399, None, None, Some(5), true);
    assert_eq!(url, "https://y/tv/1399?s={season}&e={episode}");

    assert_eq!(
        unresolved_placeholders(&url),
        vec![SEASON_PLACEHOLDER, EPISODE_PLACEHOLDER]
    );
}

#[test]
fn test_series_zero_counts_as_missing() {
    let url = build_stream_url(&TMDB_SERVER, 1399, None, Some(0), Some(5), true);
    assert!(url.contains(SEASON_PLACEHOLDER));
    assert!(url.contains(EPISODE_PLACEHOLDER));
}

#[test]
fn test_movie_ignores_season_episode() {
    let url = build_stream_url(&TMDB_SERVER, 550, None, Some(2), Some(5), false);
    assert_eq!(url, "https://y/movie/550");
}

#[test]
fn test_tmdb_scheme_leaves_imdb_token() {
    static MIXED: Server = Server {
        name: "mixed",
        scheme: IdScheme::Tmdb,
        url: "https://z/{tmdb_id}/{imdb_id}",
        url_tv: "https://z/{tmdb_id}/{imdb_id}/{season}/{episode}",
    };
    let url = build_stream_url(&MIXED, 550, Some("tt0137523"), None, None, false);
    assert_eq!(url, "https://z/550/{imdb_id}");
    assert_eq!(unresolved_placeholders(&url), vec![IMDB_PLACEHOLDER]);
}

#[test]
fn test_builder_is_deterministic_for_every_server() {
    let registry = ServerRegistry::builtin();
    for server in registry.all() {
        for is_series in [false, true] {
            let a = build_stream_url(server, 550, Some("0137523"), Some(1), Some(3), is_series);
            let b = build_stream_url(server, 550, Some("0137523"), Some(1), Some(3), is_series);
            assert_eq!(a, b, "server {}", server.name);
            assert!(unresolved_placeholders(&a).is_empty(), "server {}: {}", server.name, a);
        }
    }
}

#[test]
fn test_registry_order_and_lookup() {
    let registry = ServerRegistry::builtin();
    assert_eq!(registry.len(), 37);
    assert_eq!(
        registry.default_server().map(|s| s.name),
        Some("Change Server If Not Playing")
    );
    assert_eq!(registry.position("alpha"), Some(2));

    let vidlink = registry.find("VidLink").unwrap();
    assert_eq!(vidlink.scheme, IdScheme::Tmdb);

    assert!(registry.find("vidlink").is_none());
    assert!(registry.find("does not exist").is_none());
}

#[test]
fn test_registry_names_are_unique() {
    let registry = ServerRegistry::builtin();
    let names: HashSet<_> = registry.all().iter().map(|s| s.name).collect();
    assert_eq!(names.len(), registry.len());
}

#[test]
fn test_preferred_falls_back_to_default() {
    let registry = ServerRegistry::builtin();
    assert_eq!(registry.preferred("Hexa").map(|s| s.name), Some("Hexa"));
    assert_eq!(
        registry.preferred("Removed Server").map(|s| s.name),
        registry.default_server().map(|s| s.name)
    );
}

#[test]
fn test_badges() {
    let registry = ServerRegistry::builtin();
    assert_eq!(registry.find("VidEasy (4K)").unwrap().badges(), vec!["4K"]);
    assert_eq!(registry.find("oxa fast").unwrap().badges(), vec!["Fast"]);
    assert_eq!(registry.find("low ads 9").unwrap().badges(), vec!["Low Ads"]);
    assert!(registry.find("alpha").unwrap().badges().is_empty());
}

#[test]
fn test_download_url() {
    assert_eq!(
        download_url(550, Some("tt0137523"), None, None, false),
        "https://dl.vidsrc.vip/movie/tt0137523"
    );
    assert_eq!(
        download_url(550, None, None, None, false),
        "https://dl.vidsrc.vip/movie/550"
    );
    assert_eq!(
        download_url(1399, None, Some(3), None, true),
        "https://dl.vidsrc.vip/tv/1399/3/1"
    );
}
