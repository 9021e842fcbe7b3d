use crate::csvio;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const LOG_HEADER: [&str; 10] = [
    "date",
    "theme",
    "verse_reference",
    "english_title",
    "korean_title",
    "size",
    "palette",
    "layout_summary",
    "file_paths",
    "notes",
];

/// One accepted brief, as recorded in the append-only poster log. Rows are
/// never edited or deleted; corrections live in the theme override CSV.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogEntry {
    pub date: String,
    pub theme: String,
    pub verse_reference: String,
    pub english_title: String,
    pub korean_title: String,
    pub size: String,
    pub palette: String,
    pub layout_summary: String,
    /// Semicolon-joined artifact paths, brief file first.
    pub file_paths: String,
    pub notes: String,
}

impl LogEntry {
    fn to_row(&self) -> [&str; 10] {
        [
            &self.date,
            &self.theme,
            &self.verse_reference,
            &self.english_title,
            &self.korean_title,
            &self.size,
            &self.palette,
            &self.layout_summary,
            &self.file_paths,
            &self.notes,
        ]
    }

    fn from_row(row: &[String]) -> Self {
        let col = |idx: usize| row.get(idx).cloned().unwrap_or_default();
        Self {
            date: col(0),
            theme: col(1),
            verse_reference: col(2),
            english_title: col(3),
            korean_title: col(4),
            size: col(5),
            palette: col(6),
            layout_summary: col(7),
            file_paths: col(8),
            notes: col(9),
        }
    }
}

/// Appends one row, creating the file with its header first when absent.
pub async fn append_log(path: &Path, entry: &LogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.ok();
    }
    let mut payload = String::new();
    if fs::metadata(path).await.is_err() {
        payload.push_str(&csvio::encode_row(&LOG_HEADER));
    }
    payload.push_str(&csvio::encode_row(&entry.to_row()));

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("open poster log: {}", path.display()))?;
    file.write_all(payload.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// All rows in file order. Missing file is an empty log.
pub async fn load_entries(path: &Path) -> Result<Vec<LogEntry>> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("read poster log: {}", path.display()));
        }
    };
    Ok(csvio::parse(&text)
        .into_iter()
        .skip(1)
        .map(|row| LogEntry::from_row(&row))
        .collect())
}

/// Folds the log into verse -> theme; the last row for a reference wins.
pub async fn load_used_theme_map(path: &Path) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for entry in load_entries(path).await? {
        let verse = entry.verse_reference.trim();
        let theme = entry.theme.trim();
        if !verse.is_empty() && !theme.is_empty() {
            map.insert(verse.to_string(), theme.to_string());
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(verse: &str, theme: &str) -> LogEntry {
        LogEntry {
            date: "2025-06-10".to_string(),
            theme: theme.to_string(),
            verse_reference: verse.to_string(),
            english_title: "Anchor".to_string(),
            korean_title: "핵심".to_string(),
            size: "A2".to_string(),
            palette: "1도".to_string(),
            layout_summary: "1단계: \"so loved\"\n2단계: 축소".to_string(),
            file_paths: "briefs/20250610_faith_3-16.md".to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn append_creates_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posters-log.csv");

        append_log(&path, &entry("요한복음 3:16", "믿음")).await.unwrap();
        append_log(&path, &entry("로마서 8:28", "사랑")).await.unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(text.matches("date,theme,verse_reference").count(), 1);

        let entries = load_entries(&path).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].verse_reference, "요한복음 3:16");
        assert_eq!(entries[1].theme, "사랑");
    }

    #[tokio::test]
    async fn multiline_layout_summary_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posters-log.csv");
        let original = entry("시편 23:1", "평안");

        append_log(&path, &original).await.unwrap();
        let entries = load_entries(&path).await.unwrap();
        assert_eq!(entries[0], original);
    }

    #[tokio::test]
    async fn theme_map_last_row_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posters-log.csv");

        append_log(&path, &entry("요한복음 3:16", "믿음")).await.unwrap();
        append_log(&path, &entry("요한복음 3:16", "소망")).await.unwrap();

        let map = load_used_theme_map(&path).await.unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["요한복음 3:16"], "소망");
    }
}
