//! Filename cleanup.
//!
//! Turns release-style names such as `Heat.1995.1080p.BluRay.x264-GRP.mkv`
//! into a searchable title (`Heat`) and pulls out the release year when one
//! is present.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use scenescribe_common::paths::is_video_file;

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]|\(([^)]*)\)|【([^】]*)】").unwrap());

static BRACKETED_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[(【]\s*((?:19|20)\d{2})\s*[\])】]").unwrap());

static RESOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:\d{3,4}[pi]|4k|8k|uhd)$").unwrap());

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:19|20)\d{2}$").unwrap());

/// Encoding, source and release markers. Compared lowercase.
const RELEASE_TAGS: &[&str] = &[
    "x264", "x265", "h264", "h265", "hevc", "avc", "xvid", "divx", "bluray", "blu-ray", "bdrip",
    "brrip", "bdremux", "remux", "web-dl", "webdl", "webrip", "hdtv", "hdrip", "dvdrip",
    "dvdscr", "dvd", "aac", "ac3", "eac3", "ddp", "dd5", "dts", "dts-hd", "truehd", "atmos", "flac",
    "hdr", "hdr10", "hdr10+", "dv", "dovi", "sdr", "10bit", "8bit", "proper", "repack", "extended",
    "unrated", "internal", "limited", "multi", "subbed", "dubbed", "imax",
];

fn is_release_token(token: &str) -> bool {
    let lower = token.to_lowercase();
    if RESOLUTION.is_match(&lower) || RELEASE_TAGS.contains(&lower.as_str()) {
        return true;
    }
    // `x264-GROUP`, `DTS-HD`, `WEB-DL`: the part before the dash decides.
    lower
        .split_once('-')
        .map(|(head, _)| RESOLUTION.is_match(head) || RELEASE_TAGS.contains(&head))
        .unwrap_or(false)
}

fn has_non_latin_letters(text: &str) -> bool {
    text.chars().any(|c| c.is_alphabetic() && (c as u32) > 0x024F)
}

fn strip_video_extension(name: &str) -> &str {
    let path = Path::new(name);
    if is_video_file(path) {
        if let Some((stem, _)) = name.rsplit_once('.') {
            return stem;
        }
    }
    name
}

/// Clean a file name into a title suitable for lookups.
///
/// Removes the container extension, bracketed years and release groups, and
/// everything from the first resolution/encoding tag onward. Bracketed text
/// in a non-Latin script is kept. Dots and underscores become spaces.
///
/// # Examples
///
/// ```
/// use scenescribe::naming::clean_title;
///
/// assert_eq!(clean_title("Heat.1995.1080p.BluRay.x264-GRP.mkv"), "Heat");
/// assert_eq!(clean_title("[Group] Spirited Away (2001) [1080p].mkv"), "Spirited Away");
/// assert_eq!(clean_title("Spirited Away (千と千尋の神隠し).mkv"), "Spirited Away 千と千尋の神隠し");
/// ```
pub fn clean_title(file_name: &str) -> String {
    let name = strip_video_extension(file_name.trim());

    let unbracketed = BRACKETED.replace_all(name, |caps: &Captures<'_>| {
        let inner = caps
            .iter()
            .skip(1)
            .flatten()
            .next()
            .map(|m| m.as_str())
            .unwrap_or("");
        if has_non_latin_letters(inner) {
            format!(" {inner} ")
        } else {
            " ".to_string()
        }
    });

    let spaced = unbracketed.replace(['.', '_'], " ");

    let mut tokens: Vec<&str> = Vec::new();
    for token in spaced.split_whitespace() {
        if is_release_token(token) {
            break;
        }
        let token = token.trim_matches('-');
        if !token.is_empty() {
            tokens.push(token);
        }
    }

    // A bare year right before the release tags belongs to the release, not
    // the title.
    if tokens.len() > 1 && tokens.last().is_some_and(|t| YEAR.is_match(t)) {
        tokens.pop();
    }

    tokens.join(" ")
}

/// Release year of a video.
///
/// Looks for a bracketed year in the file name, then in the parent directory
/// name (`Movies/Heat [1995]/heat.mkv`), then for a bare year directly in
/// front of the release tags of the file name.
///
/// # Examples
///
/// ```
/// use scenescribe::naming::extract_year;
/// use std::path::Path;
///
/// assert_eq!(extract_year(Path::new("/m/Heat [1995]/heat.mkv")), Some(1995));
/// assert_eq!(extract_year(Path::new("/m/Heat.1995.1080p.mkv")), Some(1995));
/// assert_eq!(extract_year(Path::new("/m/heat.mkv")), None);
/// ```
pub fn extract_year(path: &Path) -> Option<u16> {
    let file_name = path.file_name()?.to_string_lossy();
    let parent = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());

    let bracketed = |text: &str| {
        BRACKETED_YEAR
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u16>().ok())
    };

    bracketed(&file_name)
        .or_else(|| parent.as_deref().and_then(bracketed))
        .or_else(|| bare_year(&file_name))
}

fn bare_year(file_name: &str) -> Option<u16> {
    let name = strip_video_extension(file_name);
    let spaced = name.replace(['.', '_'], " ");
    let tokens: Vec<&str> = spaced.split_whitespace().collect();
    let first_tag = tokens.iter().position(|t| is_release_token(t))?;
    if first_tag < 2 {
        return None;
    }
    let candidate = tokens[first_tag - 1];
    if YEAR.is_match(candidate) {
        candidate.parse().ok()
    } else {
        None
    }
}
