//! Canonical name rendering and canonical-form checks.
//!
//! Rendering is a pure function of (item, config): identical inputs always
//! yield identical strings, which is what makes re-runs idempotent. The
//! canonical-form checks are the inverse question, asked by the index guard:
//! does this name already follow the grammar.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::PathBuf;

use crate::config::Config;
use crate::media::{MediaItem, MediaKind};

static MOVIE_CANONICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.+ \((?:18|19|20)\d{2}\)(?: \[[^\[\]]+\])?$").expect("movie canonical pattern")
});

static EPISODE_CANONICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+) S(\d{2})E\d{2}(?: \[[^\[\]]+\])?$").expect("episode canonical pattern")
});

static SEASON_DIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Season (\d{2})$").expect("season dir pattern"));

/// Render the canonical filename for a media item, extension included.
///
/// TV: `<Show> S<NN>E<NN> [<Quality>].<ext>`
/// Movie: `<Title> (<Year>) [<Quality>].<ext>`
/// The quality segment is omitted entirely when absent or disabled.
pub fn render(item: &MediaItem, config: &Config) -> String {
    let base = match &item.kind {
        MediaKind::Episode {
            show,
            season,
            episode,
            quality,
        } => {
            let mut name = format!("{} S{:02}E{:02}", sanitize(show), season, episode);
            push_quality(&mut name, quality.as_deref(), config);
            name
        }
        MediaKind::Movie {
            title,
            year,
            quality,
        } => {
            let mut name = format!("{} ({})", sanitize(title), year);
            push_quality(&mut name, quality.as_deref(), config);
            name
        }
    };
    format!("{}.{}", base, item.extension)
}

/// The canonical path of an item relative to its library section root
/// (`tv/` or `movies/`).
pub fn canonical_rel_path(item: &MediaItem, config: &Config) -> PathBuf {
    match &item.kind {
        MediaKind::Episode { show, season, .. } => PathBuf::from(sanitize(show))
            .join(season_dir_name(*season))
            .join(render(item, config)),
        MediaKind::Movie { .. } => PathBuf::from(render(item, config)),
    }
}

fn push_quality(name: &mut String, quality: Option<&str>, config: &Config) {
    if !config.settings.include_quality {
        return;
    }
    if let Some(q) = quality {
        let q = sanitize(q);
        if !q.is_empty() {
            name.push_str(" [");
            name.push_str(&q);
            name.push(']');
        }
    }
}

/// The canonical season directory name, two-digit zero-padded.
pub fn season_dir_name(season: u8) -> String {
    format!("Season {:02}", season)
}

/// Strip filesystem-illegal and control characters. Never truncates.
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|&c| {
            !matches!(c, ':' | '/' | '\\' | '*' | '?' | '"' | '<' | '>' | '|') && !c.is_control()
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when a file stem already follows `<Title> (<Year>) [<Quality>]`.
pub fn is_canonical_movie_stem(stem: &str) -> bool {
    MOVIE_CANONICAL_RE.is_match(stem)
}

/// When a file stem follows `<Show> S<NN>E<NN> [<Quality>]`, returns the
/// show prefix and the season number.
pub fn parse_canonical_episode_stem(stem: &str) -> Option<(String, u8)> {
    let caps = EPISODE_CANONICAL_RE.captures(stem)?;
    let show = caps.get(1)?.as_str().to_string();
    let season = caps.get(2)?.as_str().parse().ok()?;
    Some((show, season))
}

/// When a directory name is a canonical season folder, returns its number.
pub fn parse_season_dir(name: &str) -> Option<u8> {
    let caps = SEASON_DIR_RE.captures(name)?;
    caps.get(1)?.as_str().parse().ok()
}
