use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// The fixed catalog used when the themes file is absent or holds no numbered
/// lines. Each entry is "English:Korean"; the leading number is display order.
pub const DEFAULT_THEME_LIST: [&str; 8] = [
    "1. The Ground Beneath:믿음",
    "2. Even So, Light:소망 / 위로",
    "3. Held Quietly:사랑",
    "4. The Gentle Joy:감사 / 기쁨",
    "5. Still Waters:평안 / 인도하심",
    "6. The Listening Room:기도 / 묵상",
    "7. Walk Bold:결단 / 용기 / 행동",
    "8. Known and Named:정체성 / 존재",
];

/// Label shown for verses with no recorded theme.
pub const UNCLASSIFIED: &str = "미분류";

static NUMBERED_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[).]\s").unwrap());
static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[).]\s*").unwrap());
static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").unwrap());

fn default_themes() -> Vec<String> {
    DEFAULT_THEME_LIST.iter().map(|s| s.to_string()).collect()
}

/// Reads the ordered theme catalog: the numbered lines of the themes file, or
/// the fixed default list when the file is missing or yields none.
pub async fn read_themes(path: &Path) -> Result<Vec<String>> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(default_themes()),
        Err(err) => {
            return Err(err).with_context(|| format!("read themes: {}", path.display()));
        }
    };
    let themes: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && NUMBERED_LINE_RE.is_match(line))
        .map(str::to_string)
        .collect();
    if themes.is_empty() {
        Ok(default_themes())
    } else {
        Ok(themes)
    }
}

/// Splits a theme string into its (English, Korean) labels on the first of
/// `:`, `—`, or `/`. A leading "N." ordinal is dropped first; on the em-dash
/// branch a parenthetical remark on the Korean side is stripped.
pub fn parse_theme(theme: &str) -> (String, String) {
    let cleaned = LEADING_NUMBER_RE.replace(theme.trim(), "").into_owned();
    if let Some((left, right)) = cleaned.split_once(':') {
        return (left.trim().to_string(), right.trim().to_string());
    }
    if let Some((left, right)) = cleaned.split_once('—') {
        // right may read like "믿음 (Faith)"
        let korean = PAREN_RE.replace_all(right, "").trim().to_string();
        return (left.trim().to_string(), korean);
    }
    if let Some((left, right)) = cleaned.split_once('/') {
        return (left.trim().to_string(), right.trim().to_string());
    }
    (cleaned, String::new())
}

/// Maps an arbitrary or legacy theme string onto the catalog entry whose
/// English label (case-insensitive) or Korean label matches; unchanged when
/// nothing matches. Input-compatibility shim for historical free-text rows.
pub fn normalize_theme_display(theme: &str, catalog: &[String]) -> String {
    if catalog.iter().any(|item| item == theme) {
        return theme.to_string();
    }
    let lookup: HashMap<String, &String> = catalog
        .iter()
        .map(|item| (parse_theme(item).0.to_lowercase(), item))
        .collect();
    let (theme_en, theme_ko) = parse_theme(theme);
    if !theme_en.is_empty() {
        if let Some(item) = lookup.get(&theme_en.to_lowercase()) {
            return (*item).clone();
        }
    }
    if !theme_ko.is_empty() {
        for item in catalog {
            if parse_theme(item).1 == theme_ko {
                return item.clone();
            }
        }
    }
    theme.to_string()
}

/// Groups used verses by effective theme, in catalog order with unknown
/// themes sorted after the catalog alphabetically.
pub fn group_used_by_theme(
    used: &[String],
    theme_map: &HashMap<String, String>,
    catalog: &[String],
) -> Vec<(String, Vec<String>)> {
    let order: HashMap<&str, usize> = catalog
        .iter()
        .enumerate()
        .map(|(idx, item)| (item.as_str(), idx))
        .collect();
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for verse in used {
        let raw = theme_map
            .get(verse)
            .map(String::as_str)
            .unwrap_or(UNCLASSIFIED);
        let theme = normalize_theme_display(raw, catalog);
        grouped.entry(theme).or_default().push(verse.clone());
    }
    let mut groups: Vec<(String, Vec<String>)> = grouped.into_iter().collect();
    groups.sort_by(|a, b| {
        let ka = (order.get(a.0.as_str()).copied().unwrap_or(10_000), &a.0);
        let kb = (order.get(b.0.as_str()).copied().unwrap_or(10_000), &b.0);
        ka.cmp(&kb)
    });
    groups
}
