//! Korean administrative-region label parser.
//!
//! Splits labels such as `"경기도 수원시 장안구 파장동(4111113000)"` into a
//! province / city / district hierarchy using a single suffix table. Every
//! dataset and chart goes through [`parse_region`]; there is no other
//! region-splitting logic in the workspace.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Suffix table
// ---------------------------------------------------------------------------

/// Suffixes that mark a province-level token (`도`, `특별시`, `광역시`, ...).
///
/// Longer suffixes are listed first; matching is by `ends_with`, so the
/// order only matters for readability.
pub const PROVINCE_SUFFIXES: &[&str] = &[
    "특별자치도",
    "특별자치시",
    "특별시",
    "광역시",
    "자치시",
    "자치도",
    "도",
    "시",
];

/// Suffixes that mark a city-level token.
pub const CITY_SUFFIXES: &[&str] = &["시", "군", "구"];

/// Suffixes that mark a district-level token (neighbourhood, township,
/// village, and road-name districts).
pub const DISTRICT_SUFFIXES: &[&str] = &["동", "구", "면", "읍", "리", "가", "로", "길"];

static PARENTHESIZED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").expect("valid regex"));

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the district tier is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Any remaining token becomes the district.
    #[default]
    Lenient,
    /// The district token must carry one of [`DISTRICT_SUFFIXES`].
    Strict,
}

/// Hierarchical decomposition of a region label. Unmatched tiers are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RegionParts {
    pub province: String,
    pub city: String,
    pub district: String,
}

impl RegionParts {
    /// Space-joined non-empty parts.
    pub fn label(&self) -> String {
        [&self.province, &self.city, &self.district]
            .into_iter()
            .filter(|p| !p.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Like [`label`](Self::label), but falls back to the cleaned raw
    /// label when no tier matched (e.g. `"전국"`).
    pub fn display_label(&self, raw: &str) -> String {
        if self.is_empty() {
            clean_label(raw)
        } else {
            self.label()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.province.is_empty() && self.city.is_empty() && self.district.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Strip parenthesized administrative codes and collapse whitespace.
///
/// ```
/// use atlasboard_core::region::clean_label;
///
/// assert_eq!(clean_label("서울특별시  종로구 (1111000000)"), "서울특별시 종로구");
/// ```
pub fn clean_label(raw: &str) -> String {
    let stripped = PARENTHESIZED_RE.replace_all(raw, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a region label in [`ParseMode::Lenient`] mode.
pub fn parse_region(label: &str) -> RegionParts {
    parse_region_with(label, ParseMode::Lenient)
}

/// Parse a region label.
///
/// The first token is the province when it carries a province suffix; the
/// next token is the city when it carries a city suffix; the next remaining
/// token is the district (subject to `mode`). A province-level city without
/// a city tier, such as `"세종특별자치시 조치원읍"`, yields an empty city.
pub fn parse_region_with(label: &str, mode: ParseMode) -> RegionParts {
    let cleaned = clean_label(label);
    let mut tokens = cleaned.split(' ').filter(|t| !t.is_empty()).peekable();
    let mut parts = RegionParts::default();

    if let Some(first) = tokens.peek() {
        if is_hangul_name(first, false) && has_suffix(first, PROVINCE_SUFFIXES) {
            parts.province = first.to_string();
            tokens.next();
        }
    }

    // Without a province tier the label is not an administrative path.
    if parts.province.is_empty() {
        return parts;
    }

    if let Some(second) = tokens.peek() {
        if is_hangul_name(second, true) && has_suffix(second, CITY_SUFFIXES) {
            parts.city = second.to_string();
            tokens.next();
        }
    }

    if let Some(third) = tokens.next() {
        let accepted = match mode {
            ParseMode::Lenient => true,
            ParseMode::Strict => has_suffix(third, DISTRICT_SUFFIXES),
        };
        if accepted {
            parts.district = third.to_string();
        }
    }

    parts
}

/// `true` when `token` ends with one of `suffixes` and has at least one
/// character in front of it.
fn has_suffix(token: &str, suffixes: &[&str]) -> bool {
    suffixes
        .iter()
        .any(|s| token.len() > s.len() && token.ends_with(s))
}

/// Hangul syllables only, optionally with ASCII digits (`신당5동`).
fn is_hangul_name(token: &str, allow_digits: bool) -> bool {
    token
        .chars()
        .all(|c| ('가'..='힣').contains(&c) || (allow_digits && c.is_ascii_digit()))
}
