use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::warn;

/// User-editable settings stored as `logs/settings.json`. A missing or
/// corrupt file reads as defaults and self-heals on the next save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub naver_id: String,
    #[serde(default)]
    pub naver_password: String,
    #[serde(default)]
    pub naver_write_url: String,
    #[serde(default)]
    pub chrome_profile_dir: String,
}

pub async fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path).await {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("settings file unreadable, using defaults: {}", err);
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

pub async fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create settings dir: {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(settings)?;
    fs::write(path, text)
        .await
        .with_context(|| format!("write settings: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn corrupt_settings_read_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let settings = load_settings(&path).await;
        assert!(settings.openai_api_key.is_empty());

        // Next save overwrites the corrupt file.
        let fixed = Settings {
            openai_api_key: "sk-test".to_string(),
            ..Settings::default()
        };
        save_settings(&path, &fixed).await.unwrap();
        assert_eq!(load_settings(&path).await.openai_api_key, "sk-test");
    }
}
