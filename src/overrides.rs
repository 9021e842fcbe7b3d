use crate::csvio;
use crate::theme::normalize_theme_display;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

const HEADER: [&str; 2] = ["verse_reference", "theme"];

/// Loads the verse -> theme override map. Missing file is an empty map; rows
/// missing either column are dropped.
pub async fn load_theme_overrides(path: &Path) -> Result<HashMap<String, String>> {
    let mut overrides = HashMap::new();
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(overrides),
        Err(err) => {
            return Err(err).with_context(|| format!("read theme overrides: {}", path.display()));
        }
    };
    for row in csvio::parse(&text).into_iter().skip(1) {
        let verse = row.first().map(|s| s.trim()).unwrap_or_default();
        let theme = row.get(1).map(|s| s.trim()).unwrap_or_default();
        if !verse.is_empty() && !theme.is_empty() {
            overrides.insert(verse.to_string(), theme.to_string());
        }
    }
    Ok(overrides)
}

/// Upserts one override row by exact reference match and rewrites the whole
/// file. Malformed rows encountered on the read pass are dropped on write.
pub async fn save_theme_override(path: &Path, verse: &str, theme: &str) -> Result<()> {
    let mut rows: Vec<(String, String)> = Vec::new();
    if let Ok(text) = fs::read_to_string(path).await {
        for row in csvio::parse(&text).into_iter().skip(1) {
            let v = row.first().map(|s| s.trim()).unwrap_or_default();
            let t = row.get(1).map(|s| s.trim()).unwrap_or_default();
            rows.push((v.to_string(), t.to_string()));
        }
    }
    let mut updated = false;
    for row in rows.iter_mut() {
        if row.0 == verse {
            row.1 = theme.to_string();
            updated = true;
            break;
        }
    }
    if !updated {
        rows.push((verse.to_string(), theme.to_string()));
    }

    let mut output = csvio::encode_row(&HEADER);
    for (v, t) in &rows {
        if !v.is_empty() && !t.is_empty() {
            output.push_str(&csvio::encode_row(&[v, t]));
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.ok();
    }
    fs::write(path, output)
        .await
        .with_context(|| format!("write theme overrides: {}", path.display()))?;
    Ok(())
}

/// Merges generation-log themes with overrides (overrides win) and maps every
/// value onto the catalog for display.
pub fn effective_theme_map(
    log_map: &HashMap<String, String>,
    overrides: &HashMap<String, String>,
    catalog: &[String],
) -> HashMap<String, String> {
    let mut merged = log_map.clone();
    for (verse, theme) in overrides {
        merged.insert(verse.clone(), theme.clone());
    }
    merged
        .into_iter()
        .map(|(verse, theme)| {
            let display = normalize_theme_display(&theme, catalog);
            (verse, display)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::DEFAULT_THEME_LIST;

    fn catalog() -> Vec<String> {
        DEFAULT_THEME_LIST.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn upsert_replaces_matching_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("used-themes.csv");

        save_theme_override(&path, "히브리서 11:1", "1. The Ground Beneath:믿음")
            .await
            .unwrap();
        save_theme_override(&path, "로마서 8:28", "3. Held Quietly:사랑")
            .await
            .unwrap();
        save_theme_override(&path, "히브리서 11:1", "2. Even So, Light:소망 / 위로")
            .await
            .unwrap();

        let overrides = load_theme_overrides(&path).await.unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(
            overrides["히브리서 11:1"],
            "2. Even So, Light:소망 / 위로"
        );
    }

    #[tokio::test]
    async fn malformed_rows_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("used-themes.csv");
        tokio::fs::write(
            &path,
            "verse_reference,theme\r\n히브리서 11:1,\r\n,고아 주제\r\n로마서 8:28,사랑\r\n",
        )
        .await
        .unwrap();

        let overrides = load_theme_overrides(&path).await.unwrap();
        assert_eq!(overrides.len(), 1);

        save_theme_override(&path, "시편 23:1", "평안").await.unwrap();
        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(!text.contains("고아 주제"));
        assert!(text.contains("로마서 8:28,사랑"));
    }

    #[test]
    fn overrides_take_precedence_over_log() {
        let catalog = catalog();
        let mut log_map = HashMap::new();
        log_map.insert("히브리서 11:1".to_string(), "Held Quietly".to_string());
        let mut overrides = HashMap::new();
        overrides.insert("히브리서 11:1".to_string(), "Even So, Light".to_string());

        let effective = effective_theme_map(&log_map, &overrides, &catalog);
        assert_eq!(effective["히브리서 11:1"], "2. Even So, Light:소망 / 위로");
    }

    #[test]
    fn merged_themes_are_display_normalized() {
        let catalog = catalog();
        let mut log_map = HashMap::new();
        log_map.insert("로마서 8:28".to_string(), "held quietly".to_string());
        let effective = effective_theme_map(&log_map, &HashMap::new(), &catalog);
        assert_eq!(effective["로마서 8:28"], "3. Held Quietly:사랑");
    }
}
