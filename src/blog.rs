use crate::brief::PosterBrief;
use crate::csvio;
use anyhow::{Context, Result};
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

const BLOG_LOG_HEADER: [&str; 6] = [
    "date",
    "title",
    "theme",
    "verse_reference",
    "hashtags",
    "body_preview",
];
const PREVIEW_CHARS: usize = 140;
const HISTORY_LIMIT: usize = 30;

static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\S+").unwrap());

/// A generated blog post after normalization: body without the trailing
/// hashtag line, hashtags split out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub hashtags: String,
}

/// One row of the blog history listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogLogRow {
    pub date: String,
    pub title: String,
    pub theme: String,
    pub verse_reference: String,
    pub hashtags: String,
    pub body_preview: String,
}

/// Moves a trailing hashtag line out of the body into `hashtags`. When the
/// model echoes the hashtags both inline and in the field, the duplicate body
/// line is dropped.
pub fn normalize_blog_result(payload: &serde_json::Value) -> BlogPost {
    let mut post: BlogPost = serde_json::from_value(payload.clone()).unwrap_or_default();
    post.title = post.title.trim().to_string();
    post.body = post.body.trim().to_string();
    post.hashtags = post.hashtags.trim().to_string();

    if post.body.is_empty() {
        return post;
    }
    let mut lines: Vec<String> = post.body.lines().map(|l| l.trim_end().to_string()).collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if let Some(last) = lines.last() {
        let last = last.trim().to_string();
        if post.hashtags.is_empty() && HASHTAG_RE.is_match(&last) {
            post.hashtags = last;
            lines.pop();
        } else if !post.hashtags.is_empty() && last == post.hashtags {
            lines.pop();
        }
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    post.body = lines.join("\n").trim().to_string();
    post
}

/// Appends one history row; the body is flattened to a single line and cut to
/// its first 140 characters.
pub async fn append_blog_log(path: &Path, post: &BlogPost, brief: &PosterBrief) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.ok();
    }
    let mut payload = String::new();
    if fs::metadata(path).await.is_err() {
        payload.push_str(&csvio::encode_row(&BLOG_LOG_HEADER));
    }

    let flat = post.body.trim().replace('\n', " ");
    let preview: String = flat.chars().take(PREVIEW_CHARS).collect();
    let theme = if !brief.theme_display.is_empty() {
        brief.theme_display.clone()
    } else {
        brief.theme_en.clone()
    };
    let date = Local::now().format("%Y-%m-%d").to_string();
    payload.push_str(&csvio::encode_row(&[
        &date,
        &post.title,
        &theme,
        &brief.verse_reference,
        &post.hashtags,
        &preview,
    ]));

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("open blog log: {}", path.display()))?;
    file.write_all(payload.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Most recent posts first, capped at thirty rows.
pub async fn load_blog_history(path: &Path) -> Result<Vec<BlogLogRow>> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("read blog log: {}", path.display()));
        }
    };
    let col = |row: &[String], idx: usize| {
        row.get(idx).map(|s| s.trim().to_string()).unwrap_or_default()
    };
    let mut rows: Vec<BlogLogRow> = csvio::parse(&text)
        .into_iter()
        .skip(1)
        .map(|row| BlogLogRow {
            date: col(&row, 0),
            title: col(&row, 1),
            theme: col(&row, 2),
            verse_reference: col(&row, 3),
            hashtags: col(&row, 4),
            body_preview: col(&row, 5),
        })
        .collect();
    rows.reverse();
    rows.truncate(HISTORY_LIMIT);
    Ok(rows)
}

/// Draft id -> generated image paths, stored as pretty JSON next to the logs.
pub async fn load_blog_images(path: &Path) -> HashMap<String, Vec<String>> {
    match fs::read_to_string(path).await {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(map) => map,
            Err(err) => {
                warn!("blog image map unreadable, starting empty: {}", err);
                HashMap::new()
            }
        },
        Err(_) => HashMap::new(),
    }
}

/// Records the generated section images for one draft, preserving entries for
/// other drafts.
pub async fn record_blog_images(path: &Path, draft_id: &str, paths: &[String]) -> Result<()> {
    let mut map = load_blog_images(path).await;
    map.insert(draft_id.to_string(), paths.to_vec());
    save_blog_images(path, &map).await
}

pub async fn save_blog_images(path: &Path, map: &HashMap<String, Vec<String>>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create blog image dir: {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(map)?;
    fs::write(path, text)
        .await
        .with_context(|| format!("write blog images: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trailing_hashtag_line_moves_out_of_the_body() {
        let post = normalize_blog_result(&json!({
            "title": " 제목, 히브리서 11:1 ",
            "body": "첫 문단\n\n둘째 문단\n\n#믿음 #묵상\n",
            "hashtags": "",
        }));
        assert_eq!(post.title, "제목, 히브리서 11:1");
        assert_eq!(post.body, "첫 문단\n\n둘째 문단");
        assert_eq!(post.hashtags, "#믿음 #묵상");
    }

    #[test]
    fn duplicated_hashtag_line_is_dropped_once() {
        let post = normalize_blog_result(&json!({
            "title": "t",
            "body": "본문\n#소망",
            "hashtags": "#소망",
        }));
        assert_eq!(post.body, "본문");
        assert_eq!(post.hashtags, "#소망");
    }

    #[tokio::test]
    async fn history_is_newest_first_with_truncated_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog-log.csv");
        let brief = PosterBrief {
            theme_display: "1. The Ground Beneath:믿음".to_string(),
            verse_reference: "히브리서 11:1".to_string(),
            ..PosterBrief::default()
        };

        let long_body = "가".repeat(200);
        let first = BlogPost {
            title: "첫 글".to_string(),
            body: format!("{}\n다음 줄", long_body),
            hashtags: "#믿음".to_string(),
        };
        append_blog_log(&path, &first, &brief).await.unwrap();
        let second = BlogPost {
            title: "둘째 글".to_string(),
            body: "짧은 본문".to_string(),
            hashtags: String::new(),
        };
        append_blog_log(&path, &second, &brief).await.unwrap();

        let rows = load_blog_history(&path).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "둘째 글");
        assert_eq!(rows[1].title, "첫 글");
        assert_eq!(rows[1].body_preview.chars().count(), 140);
        assert!(!rows[1].body_preview.contains('\n'));
    }

    #[tokio::test]
    async fn image_map_round_trips_and_tolerates_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog-images.json");

        let mut map = HashMap::new();
        map.insert(
            "20250610120000_ab12".to_string(),
            vec!["logs/blog-images/a.png".to_string()],
        );
        save_blog_images(&path, &map).await.unwrap();
        assert_eq!(load_blog_images(&path).await, map);

        tokio::fs::write(&path, "{broken").await.unwrap();
        assert!(load_blog_images(&path).await.is_empty());
    }

    #[tokio::test]
    async fn recording_images_keeps_other_drafts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog-images.json");

        record_blog_images(&path, "20250610120000_ab12", &["a.png".to_string()])
            .await
            .unwrap();
        record_blog_images(
            &path,
            "20250611093000_cd34",
            &["b.png".to_string(), "c.png".to_string()],
        )
        .await
        .unwrap();

        let map = load_blog_images(&path).await;
        assert_eq!(map.len(), 2);
        assert_eq!(map["20250610120000_ab12"], vec!["a.png"]);
        assert_eq!(map["20250611093000_cd34"], vec!["b.png", "c.png"]);
    }
}
