use crate::csvio;
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

const HEADER: [&str; 2] = ["verse_reference", "created_at"];
const TIMESTAMP_FMT: &str = "%Y-%m-%dT%H:%M:%S";

/// Returns the references whose badge is younger than 24 hours and compacts
/// the file down to exactly those rows. Rows with an unparseable timestamp
/// expire with the rest; a missing file stays missing.
pub async fn load_new_badges(path: &Path, now: NaiveDateTime) -> Result<HashSet<String>> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("read badges: {}", path.display()));
        }
    };

    let mut recent: Vec<(String, NaiveDateTime)> = Vec::new();
    for row in csvio::parse(&text).into_iter().skip(1) {
        let verse = row.first().map(|s| s.trim()).unwrap_or_default();
        let raw_time = row.get(1).map(|s| s.trim()).unwrap_or_default();
        if verse.is_empty() || raw_time.is_empty() {
            continue;
        }
        let created_at = match NaiveDateTime::parse_from_str(raw_time, TIMESTAMP_FMT) {
            Ok(ts) => ts,
            Err(_) => continue,
        };
        if now - created_at <= Duration::hours(24) {
            recent.push((verse.to_string(), created_at));
        }
    }

    // Read-and-compact: expired rows are removed for good, not just filtered.
    let mut output = csvio::encode_row(&HEADER);
    for (verse, created_at) in &recent {
        output.push_str(&csvio::encode_row(&[
            verse,
            &created_at.format(TIMESTAMP_FMT).to_string(),
        ]));
    }
    fs::write(path, output)
        .await
        .with_context(|| format!("compact badges: {}", path.display()))?;

    Ok(recent.into_iter().map(|(verse, _)| verse).collect())
}

/// Upserts the badge row for one reference with the given creation time.
pub async fn save_new_badge(path: &Path, verse: &str, now: NaiveDateTime) -> Result<()> {
    let stamp = now.format(TIMESTAMP_FMT).to_string();
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
            row.1 = stamp.clone();
            updated = true;
            break;
        }
    }
    if !updated {
        rows.push((verse.to_string(), stamp));
    }

    let mut output = csvio::encode_row(&HEADER);
    for (v, t) in &rows {
        if !v.is_empty() {
            output.push_str(&csvio::encode_row(&[v, t]));
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.ok();
    }
    fs::write(path, output)
        .await
        .with_context(|| format!("write badges: {}", path.display()))?;
    Ok(())
}
