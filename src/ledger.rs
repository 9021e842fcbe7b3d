use crate::reference::normalize_ref;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Reads the full ledger as a set of normalized references. A missing file is
/// an empty ledger. Only Markdown bullet lines count; everything else in the
/// file is ignored.
pub async fn read_used_verses(path: &Path) -> Result<BTreeSet<String>> {
    let mut verses = BTreeSet::new();
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(verses),
        Err(err) => {
            return Err(err).with_context(|| format!("read ledger: {}", path.display()));
        }
    };
    for line in text.lines() {
        if let Some(raw) = line.trim().strip_prefix('-') {
            let verse = normalize_ref(raw.trim());
            if !verse.is_empty() {
                verses.insert(verse);
            }
        }
    }
    Ok(verses)
}

/// Appends one reference as a new bullet line. Duplicates (after
/// normalization) are silently ignored; existing lines are never rewritten.
pub async fn append_used_verse(path: &Path, verse: &str) -> Result<()> {
    let verse = normalize_ref(verse);
    if verse.is_empty() {
        return Ok(());
    }
    let used = read_used_verses(path).await?;
    if used.contains(&verse) {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.ok();
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("open ledger for append: {}", path.display()))?;
    file.write_all(format!("- {}\n", verse).as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Rewrites the ledger without the bullet line for the given reference.
/// No-ops when the file does not exist or the reference is blank.
pub async fn remove_used_verse(path: &Path, verse: &str) -> Result<()> {
    let verse = normalize_ref(verse);
    if verse.is_empty() || fs::metadata(path).await.is_err() {
        return Ok(());
    }
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("read ledger: {}", path.display()))?;
    let target = format!("- {}", verse);
    let kept: Vec<&str> = text.lines().filter(|line| line.trim() != target).collect();
    let mut output = kept.join("\n");
    if !kept.is_empty() {
        output.push('\n');
    }
    fs::write(path, output)
        .await
        .with_context(|| format!("rewrite ledger: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("used-verses.md");
        assert!(read_used_verses(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_normalizes_and_ignores_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("used-verses.md");

        append_used_verse(&path, "Hebrews 11:1").await.unwrap();
        append_used_verse(&path, "히브리서11:1").await.unwrap();
        append_used_verse(&path, "히브리서 11:1").await.unwrap();

        let used = read_used_verses(&path).await.unwrap();
        assert_eq!(used.len(), 1);
        assert!(used.contains("히브리서 11:1"));

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(text, "- 히브리서 11:1\n");
    }

    #[tokio::test]
    async fn add_then_remove_restores_prior_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("used-verses.md");

        append_used_verse(&path, "요한복음 3:16").await.unwrap();
        append_used_verse(&path, "로마서 8:28").await.unwrap();
        let before = read_used_verses(&path).await.unwrap();

        append_used_verse(&path, "시편 23:1").await.unwrap();
        remove_used_verse(&path, "Psalm 23:1").await.unwrap();

        let after = read_used_verses(&path).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn remove_on_missing_file_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("used-verses.md");
        remove_used_verse(&path, "요한복음 3:16").await.unwrap();
        assert!(tokio::fs::metadata(&path).await.is_err());
    }
}
