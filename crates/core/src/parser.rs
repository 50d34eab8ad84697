//! Conservative filename parsing.
//!
//! Extracts structured metadata (title, year, season/episode, quality) from
//! release-style filenames. The grammar is deliberately strict: when the
//! season/episode token or the year cannot be located, the answer is `None`
//! and the file is left untouched. Never best-effort.

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::config::Config;

/// Which grammar to apply, derived from where the file lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindHint {
    Tv,
    Movie,
}

/// Structured metadata extracted from a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedName {
    Episode {
        /// Fallback title from the text before the season token; only used
        /// when no directory-derived show name is available.
        title: Option<String>,
        season: u8,
        episode: u8,
        quality: Option<String>,
    },
    Movie {
        title: String,
        year: u16,
        quality: Option<String>,
    },
}

/// Films predate everything else; no year below this is plausible.
const MIN_YEAR: u16 = 1888;

/// Function words kept lowercase by title casing unless first or last.
const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "in", "nor", "of", "on", "or", "so", "the",
    "to", "up", "yet",
];

static SEASON_EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bs(\d{1,2})e(\d{1,2})\b").expect("season/episode pattern"));

static FOUR_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("year pattern"));

/// Parse a filename into structured metadata, or `None` when it does not
/// fit the grammar for the hinted kind.
pub fn parse(filename: &str, hint: KindHint, config: &Config) -> Option<ParsedName> {
    let stem = filename.rsplit_once('.').map(|(s, _)| s).unwrap_or(filename);

    match hint {
        KindHint::Tv => parse_episode(stem, config),
        KindHint::Movie => parse_movie(stem, config),
    }
}

fn parse_episode(stem: &str, config: &Config) -> Option<ParsedName> {
    let caps = SEASON_EPISODE_RE.captures(stem)?;
    let token = caps.get(0)?;
    let season: u8 = caps.get(1)?.as_str().parse().ok()?;
    let episode: u8 = caps.get(2)?.as_str().parse().ok()?;

    let title = normalize_title(&stem[..token.start()], config);
    let title = (!title.is_empty()).then_some(title);

    Some(ParsedName::Episode {
        title,
        season,
        episode,
        quality: extract_quality(stem, config),
    })
}

fn parse_movie(stem: &str, config: &Config) -> Option<ParsedName> {
    let (year_start, year) = find_year(stem)?;

    let title = normalize_title(&stem[..year_start], config);
    if title.is_empty() {
        return None;
    }

    Some(ParsedName::Movie {
        title,
        year,
        quality: extract_quality(stem, config),
    })
}

/// Locate the release year: a 4-digit number in `[1888, current_year + 1]`
/// enclosed by non-digit boundaries. When several candidates appear the last
/// one wins, leaving earlier ones in the title (titles can be years too).
fn find_year(stem: &str) -> Option<(usize, u16)> {
    let max_year = (Utc::now().year() + 1) as u16;
    let bytes = stem.as_bytes();
    let mut found = None;

    for m in FOUR_DIGITS_RE.find_iter(stem) {
        let before_ok = m.start() == 0 || !bytes[m.start() - 1].is_ascii_digit();
        let after_ok = m.end() == stem.len() || !bytes[m.end()].is_ascii_digit();
        if !before_ok || !after_ok {
            continue;
        }
        let year: u16 = match m.as_str().parse() {
            Ok(y) => y,
            Err(_) => continue,
        };
        if (MIN_YEAR..=max_year).contains(&year) {
            found = Some((m.start(), year));
        }
    }
    found
}

/// First quality token from the configured vocabulary found in the name,
/// case-insensitive, rendered with the configured casing. `None` when
/// quality inclusion is disabled.
pub fn extract_quality(name: &str, config: &Config) -> Option<String> {
    if !config.settings.include_quality {
        return None;
    }
    let lower = name.to_lowercase();
    config
        .media
        .quality_tokens
        .iter()
        .find(|token| lower.contains(&token.to_lowercase()))
        .cloned()
}

/// Fold release junk out of a raw name fragment and apply the configured
/// casing: bracketed segments are dropped, `.`/`_` runs become single
/// spaces, whitespace is collapsed and trimmed.
pub fn normalize_title(raw: &str, config: &Config) -> String {
    let folded = fold_junk(raw);
    if config.settings.capitalize {
        title_case(&folded)
    } else {
        folded
    }
}

fn fold_junk(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth: usize = 0;

    for ch in raw.chars() {
        match ch {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            '.' | '_' | '-' if out.ends_with(' ') => {}
            '.' | '_' => out.push(' '),
            _ => out.push(ch),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title-case each word except minor function words, which stay lowercase
/// unless they are the first or last word.
fn title_case(title: &str) -> String {
    let words: Vec<&str> = title.split_whitespace().collect();
    if words.is_empty() {
        return String::new();
    }
    let last = words.len() - 1;

    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i != 0 && i != last && MINOR_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                capitalize_word(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
