//! Embed server registry and stream URL construction

use serde::{Deserialize, Serialize};

/// Which catalog identifier a server expects in its URL templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    /// Canonical TMDB numeric id, substituted into `{tmdb_id}`
    Tmdb,
    /// IMDb `tt` id, substituted into `{imdb_id}`
    Imdb,
}

/// A third-party embed provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub name: &'static str,
    pub scheme: IdScheme,
    pub url: &'static str,
    pub url_tv: &'static str,
}

impl Server {
    /// Short tags shown next to the server name in the picker
    pub fn badges(&self) -> Vec<&'static str> {
        let mut badges = Vec::new();
        if self.name.contains("4K") {
            badges.push("4K");
        }
        if self.name.contains("fast") {
            badges.push("Fast");
        }
        if self.name.contains("low ads") {
            badges.push("Low Ads");
        }
        badges
    }
}

pub const TMDB_PLACEHOLDER: &str = "{tmdb_id}";
pub const IMDB_PLACEHOLDER: &str = "{imdb_id}";
pub const SEASON_PLACEHOLDER: &str = "{season}";
pub const EPISODE_PLACEHOLDER: &str = "{episode}";

/// Two-letter prefix every IMDb title id carries
pub const IMDB_PREFIX: &str = "tt";

const DOWNLOAD_BASE: &str = "https://dl.vidsrc.vip";

// Order matters: the first entry is the default and the list is the menu order.
const SERVERS: &[Server] = &[
    Server {
        name: "Change Server If Not Playing",
        scheme: IdScheme::Imdb,
        url: "https://vidsrc.vip/embed/movie/{imdb_id}",
        url_tv: "https://vidsrc.vip/embed/tv/{imdb_id}/{season}/{episode}",
    },
    Server {
        name: "All in one 🔥with download + 4k size",
        scheme: IdScheme::Tmdb,
        url: "https://iframe.pstream.mov/media/tmdb-movie-{tmdb_id}",
        url_tv: "https://iframe.pstream.mov/media/tmdb-tv-{tmdb_id}-{season}-{episode}",
    },
    Server {
        name: "alpha",
        scheme: IdScheme::Imdb,
        url: "https://vidsrc.to/embed/movie/{imdb_id}",
        url_tv: "https://vidsrc.to/embed/tv/{imdb_id}/{season}/{episode}",
    },
    Server {
        name: "beta",
        scheme: IdScheme::Imdb,
        url: "https://vidsrc.icu/embed/movie/{imdb_id}",
        url_tv: "https://vidsrc.icu/embed/tv/{imdb_id}/{season}/{episode}",
    },
    Server {
        name: "gama",
        scheme: IdScheme::Imdb,
        url: "https://vidsrc.cc/v2/embed/movie/{imdb_id}",
        url_tv: "https://vidsrc.cc/v2/embed/tv/{imdb_id}/{season}/{episode}",
    },
    Server {
        name: "penta",
        scheme: IdScheme::Imdb,
        url: "https://embed.su/embed/movie/{imdb_id}",
        url_tv: "https://embed.su/embed/tv/{imdb_id}/{season}/{episode}",
    },
    Server {
        name: "hexa",
        scheme: IdScheme::Imdb,
        url: "https://vidsrc.me/embed/movie/{imdb_id}",
        url_tv: "https://vidsrc.me/embed/tv/{imdb_id}/{season}/{episode}",
    },
    Server {
        name: "oxa fast",
        scheme: IdScheme::Imdb,
        url: "https://autoembed.pro/embed/movie/{imdb_id}",
        url_tv: "https://autoembed.pro/embed/tv/{imdb_id}/{season}/{episode}",
    },
    Server {
        name: "octa fast 8",
        scheme: IdScheme::Imdb,
        url: "https://vidfast.pro/movie/{imdb_id}",
        url_tv: "https://vidfast.pro/tv/{imdb_id}/{season}/{episode}",
    },
    Server {
        name: "low ads 9",
        scheme: IdScheme::Imdb,
        url: "https://player.autoembed.cc/embed/movie/{imdb_id}",
        url_tv: "https://player.autoembed.cc/embed/tv/{imdb_id}/{season}/{episode}",
    },
    Server {
        name: "Hd better 10",
        scheme: IdScheme::Imdb,
        url: "https://hyhd.org/embed/{imdb_id}",
        url_tv: "https://hyhd.org/embed/tv/{imdb_id}/{season}/{episode}",
    },
    Server {
        name: "11 movies",
        scheme: IdScheme::Imdb,
        url: "https://111movies.com/movie/{imdb_id}",
        url_tv: "https://111movies.com/tv/{imdb_id}/{season}/{episode}",
    },
    Server {
        name: "MultiEmbed",
        scheme: IdScheme::Tmdb,
        url: "https://multiembed.mov/?video_id={tmdb_id}&tmdb=1",
        url_tv: "https://multiembed.mov/?video_id={tmdb_id}&tmdb=1&s={season}&e={episode}",
    },
    Server {
        name: "MoviesAPI",
        scheme: IdScheme::Tmdb,
        url: "https://moviesapi.club/movie/{tmdb_id}",
        url_tv: "https://moviesapi.club/tv/{tmdb_id}-{season}-{episode}",
    },
    Server {
        name: "EmbedSU",
        scheme: IdScheme::Tmdb,
        url: "https://embed.su/embed/movie/{tmdb_id}",
        url_tv: "https://embed.su/embed/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "Hexa",
        scheme: IdScheme::Tmdb,
        url: "https://hexa.watch/watch/movie/{tmdb_id}",
        url_tv: "https://hexa.watch/watch/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "VidLink",
        scheme: IdScheme::Tmdb,
        url: "https://vidlink.pro/movie/{tmdb_id}",
        url_tv: "https://vidlink.pro/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "VidSrcXyz",
        scheme: IdScheme::Tmdb,
        url: "https://vidsrc.xyz/embed/movie/{tmdb_id}",
        url_tv: "https://vidsrc.xyz/embed/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "VidSrcRIP",
        scheme: IdScheme::Tmdb,
        url: "https://vidsrc.rip/embed/movie/{tmdb_id}",
        url_tv: "https://vidsrc.rip/embed/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "VidSrcSU",
        scheme: IdScheme::Tmdb,
        url: "https://vidsrc.su/embed/movie/{tmdb_id}",
        url_tv: "https://vidsrc.su/embed/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "VidSrcVIP",
        scheme: IdScheme::Tmdb,
        url: "https://vidsrc.vip/embed/movie/{tmdb_id}",
        url_tv: "https://vidsrc.vip/embed/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "2Embed",
        scheme: IdScheme::Tmdb,
        url: "https://www.2embed.cc/embed/{tmdb_id}",
        url_tv: "https://www.2embed.cc/embedtv/{tmdb_id}&s={season}&e={episode}",
    },
    Server {
        name: "123Embed",
        scheme: IdScheme::Tmdb,
        url: "https://play2.123embed.net/movie/{tmdb_id}",
        url_tv: "https://play2.123embed.net/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "SmashyStream",
        scheme: IdScheme::Tmdb,
        url: "https://player.smashy.stream/movie/{tmdb_id}",
        url_tv: "https://player.smashy.stream/tv/{tmdb_id}?s={season}&e={episode}",
    },
    Server {
        name: "VidEasy (4K)",
        scheme: IdScheme::Tmdb,
        url: "https://player.videasy.net/movie/{tmdb_id}?color=8834ec",
        url_tv: "https://player.videasy.net/tv/{tmdb_id}/{season}/{episode}?color=8834ec",
    },
    Server {
        name: "Vidify",
        scheme: IdScheme::Tmdb,
        url: "https://vidify.top/embed/movie/{tmdb_id}",
        url_tv: "https://vidify.top/embed/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "Flicky",
        scheme: IdScheme::Tmdb,
        url: "https://flicky.host/embed/movie/?id={tmdb_id}",
        url_tv: "https://flicky.host/embed/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "RiveStream",
        scheme: IdScheme::Tmdb,
        url: "https://rivestream.org/embed?type=movie&id={tmdb_id}",
        url_tv: "https://rivestream.org/embed?type=tv&id={tmdb_id}&season={season}&episode={episode}",
    },
    Server {
        name: "Vidora",
        scheme: IdScheme::Tmdb,
        url: "https://vidora.su/movie/{tmdb_id}",
        url_tv: "https://vidora.su/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "VidSrcCC",
        scheme: IdScheme::Tmdb,
        url: "https://vidsrc.cc/v2/embed/movie/{tmdb_id}?autoPlay=false",
        url_tv: "https://vidsrc.cc/v2/embed/tv/{tmdb_id}/{season}/{episode}?autoPlay=false",
    },
    Server {
        name: "StreamFlix",
        scheme: IdScheme::Tmdb,
        url: "https://watch.streamflix.one/movie/{tmdb_id}/watch?server=1",
        url_tv: "https://watch.streamflix.one/tv/{tmdb_id}/watch?server=1&season={season}&episode={episode}",
    },
    Server {
        name: "NebulaFlix",
        scheme: IdScheme::Tmdb,
        url: "https://nebulaflix.stream/movie?mt={tmdb_id}&server=1",
        url_tv: "https://nebulaflix.stream/show?st={tmdb_id}&season={season}&episode={episode}&server=1",
    },
    Server {
        name: "VidJoy",
        scheme: IdScheme::Tmdb,
        url: "https://vidjoy.pro/embed/movie/{tmdb_id}",
        url_tv: "https://vidjoy.pro/embed/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "VidZee",
        scheme: IdScheme::Tmdb,
        url: "https://player.vidzee.wtf/embed/movie/{tmdb_id}",
        url_tv: "https://player.vidzee.wtf/embed/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "Spenflix",
        scheme: IdScheme::Tmdb,
        url: "https://spencerdevs.xyz/movie/{tmdb_id}",
        url_tv: "https://spencerdevs.xyz/tv/{tmdb_id}/{season}/{episode}",
    },
    Server {
        name: "Frembed (FR)",
        scheme: IdScheme::Tmdb,
        url: "https://frembed.icu/api/film.php?id={tmdb_id}",
        url_tv: "https://frembed.icu/api/serie.php?id={tmdb_id}&sa={season}&epi={episode}",
    },
    Server {
        name: "UEmbed (premium)",
        scheme: IdScheme::Tmdb,
        url: "https://uembed.site/?id={tmdb_id}&apikey=thisisforsurenotapremiumkey_right?",
        url_tv: "https://uembed.site/?id={tmdb_id}&season={season}&episode={episode}&apikey=thisisforsurenotapremiumkey_right?",
    },
];

/// Read-only view over an ordered server table
#[derive(Debug, Clone, Copy)]
pub struct ServerRegistry {
    servers: &'static [Server],
}

impl Default for ServerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ServerRegistry {
    /// The built-in provider table
    pub fn builtin() -> Self {
        Self { servers: SERVERS }
    }

    pub fn from_static(servers: &'static [Server]) -> Self {
        Self { servers }
    }

    pub fn all(&self) -> &'static [Server] {
        self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Exact, case-sensitive name lookup
    pub fn find(&self, name: &str) -> Option<&'static Server> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.servers.iter().position(|s| s.name == name)
    }

    pub fn default_server(&self) -> Option<&'static Server> {
        self.servers.first()
    }

    /// Named server if it still exists, otherwise the default
    pub fn preferred(&self, name: &str) -> Option<&'static Server> {
        self.find(name).or_else(|| self.default_server())
    }
}

/// Prefix a bare IMDb id with `tt` unless it already carries it
pub fn normalize_imdb_id(id: &str) -> String {
    if id.starts_with(IMDB_PREFIX) {
        id.to_string()
    } else {
        format!("{}{}", IMDB_PREFIX, id)
    }
}

/// Build the embed URL for an item on a given server.
///
/// Never fails. When an identifier the template needs is missing, the output
/// is left structurally incomplete: an IMDb server with no IMDb id gets an
/// empty substitution, and series URLs without both a season and an episode
/// keep their `{season}`/`{episode}` tokens.
pub fn build_stream_url(
    server: &Server,
    tmdb_id: u64,
    imdb_id: Option<&str>,
    season: Option<u32>,
    episode: Option<u32>,
    is_series: bool,
) -> String {
    let template = if is_series { server.url_tv } else { server.url };

    let mut url = template.replace(TMDB_PLACEHOLDER, &tmdb_id.to_string());

    match server.scheme {
        IdScheme::Imdb => {
            let imdb = match imdb_id {
                Some(id) if !id.is_empty() => normalize_imdb_id(id),
                _ => String::new(),
            };
            url = url.replace(IMDB_PLACEHOLDER, &imdb);
        }
        // TMDB servers never look at the IMDb id; a stray token stays verbatim
        IdScheme::Tmdb => {}
    }

    if is_series {
        match (season, episode) {
            (Some(s), Some(e)) if s > 0 && e > 0 => {
                url = url
                    .replace(SEASON_PLACEHOLDER, &s.to_string())
                    .replace(EPISODE_PLACEHOLDER, &e.to_string());
            }
            _ => {}
        }
    }

    url
}

/// Placeholder tokens still present in a built URL
pub fn unresolved_placeholders(url: &str) -> Vec<&'static str> {
    [TMDB_PLACEHOLDER, IMDB_PLACEHOLDER, SEASON_PLACEHOLDER, EPISODE_PLACEHOLDER]
        .into_iter()
        .filter(|token| url.contains(token))
        .collect()
}

/// Direct download link; prefers the IMDb id, season/episode default to 1
pub fn download_url(
    tmdb_id: u64,
    imdb_id: Option<&str>,
    season: Option<u32>,
    episode: Option<u32>,
    is_series: bool,
) -> String {
    let id = match imdb_id {
        Some(imdb) if !imdb.is_empty() => imdb.to_string(),
        _ => tmdb_id.to_string(),
    };

    if is_series {
        format!(
            "{}/tv/{}/{}/{}",
            DOWNLOAD_BASE,
            id,
            season.unwrap_or(1),
            episode.unwrap_or(1)
        )
    } else {
        format!("{}/movie/{}", DOWNLOAD_BASE, id)
    }
}

#[cfg(test)]
#[path = "servers_tests.rs"]
mod tests;
