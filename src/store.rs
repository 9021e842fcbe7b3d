use anyhow::{Context, Result};
use chrono::Local;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Timestamped id with a short random suffix, safe to embed in a file name.
pub fn new_draft_id() -> String {
    let stamp = Local::now().format("%Y%m%d%H%M%S");
    let suffix: u16 = rand::thread_rng().r#gen();
    format!("{}_{:04x}", stamp, suffix)
}

fn draft_path(drafts_dir: &Path, draft_id: &str) -> Result<PathBuf> {
    // Ids come back from form fields, so reject anything path-like.
    let ok = !draft_id.is_empty()
        && draft_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !ok {
        anyhow::bail!("invalid draft id: {}", draft_id);
    }
    Ok(drafts_dir.join(format!("{}.json", draft_id)))
}

/// Writes one draft payload under its id, creating the drafts directory.
pub async fn save_draft<T: Serialize>(
    drafts_dir: &Path,
    draft_id: &str,
    value: &T,
) -> Result<()> {
    let path = draft_path(drafts_dir, draft_id)?;
    fs::create_dir_all(drafts_dir)
        .await
        .with_context(|| format!("create drafts dir: {}", drafts_dir.display()))?;
    let text = serde_json::to_string_pretty(value)?;
    fs::write(&path, text)
        .await
        .with_context(|| format!("write draft: {}", path.display()))?;
    Ok(())
}

/// Reads a draft back; `None` when the id is unknown or the file is corrupt.
pub async fn load_draft<T: DeserializeOwned>(drafts_dir: &Path, draft_id: &str) -> Option<T> {
    let path = draft_path(drafts_dir, draft_id).ok()?;
    let text = fs::read_to_string(&path).await.ok()?;
    serde_json::from_str(&text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::BlogPost;

    #[test]
    fn draft_ids_are_filename_safe() {
        let id = new_draft_id();
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        assert_eq!(id.len(), "20250610120000_ab12".len());
    }

    #[tokio::test]
    async fn drafts_round_trip_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let post = BlogPost {
            title: "제목".to_string(),
            body: "본문".to_string(),
            hashtags: "#믿음".to_string(),
        };
        let id = new_draft_id();

        save_draft(dir.path(), &id, &post).await.unwrap();
        let loaded: BlogPost = load_draft(dir.path(), &id).await.unwrap();
        assert_eq!(loaded, post);

        let missing: Option<BlogPost> = load_draft(dir.path(), "20250101000000_dead").await;
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn path_like_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_draft(dir.path(), "../escape", &serde_json::json!({})).await;
        assert!(err.is_err());
        let none: Option<serde_json::Value> = load_draft(dir.path(), "a/b").await;
        assert!(none.is_none());
    }
}
