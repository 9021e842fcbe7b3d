use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::warn;

/// Progress file for the background shorts job. Written whole on every
/// update; the frontend polls it between page loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<OutputItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputItem {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub path: String,
}

impl Progress {
    pub fn in_progress(first_step: &str) -> Self {
        Self {
            status: "in_progress".to_string(),
            steps: vec![first_step.to_string()],
            outputs: Vec::new(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            status: "error".to_string(),
            steps: vec![message.to_string()],
            outputs: Vec::new(),
        }
    }
}

/// Missing or corrupt file reads as an empty record; a stale half-write must
/// never wedge the polling loop.
pub async fn load_progress(path: &Path) -> Progress {
    match fs::read_to_string(path).await {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(progress) => progress,
            Err(err) => {
                warn!("progress file unreadable, treating as empty: {}", err);
                Progress::default()
            }
        },
        Err(_) => Progress::default(),
    }
}

pub async fn save_progress(path: &Path, progress: &Progress) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create progress dir: {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(progress)?;
    fs::write(path, text)
        .await
        .with_context(|| format!("write progress: {}", path.display()))?;
    Ok(())
}

/// Re-reads the file before appending so steps written by earlier phases of
/// the job survive.
pub async fn push_step(path: &Path, step: &str) -> Result<()> {
    let mut progress = load_progress(path).await;
    progress.steps.push(step.to_string());
    save_progress(path, &progress).await
}
