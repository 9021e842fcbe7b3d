use crate::settings;
use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BLOG_MODEL: &str = "gpt-5.2";

/// All ambient state, resolved once at startup and passed by reference into
/// every component. Nothing reads process environment after this is built.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_root: PathBuf,
    pub used_verses_path: PathBuf,
    pub themes_path: PathBuf,
    pub briefs_dir: PathBuf,
    pub log_path: PathBuf,
    pub theme_map_path: PathBuf,
    pub new_badge_path: PathBuf,
    pub settings_path: PathBuf,
    pub blog_log_path: PathBuf,
    pub blog_image_map_path: PathBuf,
    pub blog_images_dir: PathBuf,
    pub shorts_dir: PathBuf,
    pub shorts_progress_path: PathBuf,
    pub drafts_dir: PathBuf,
    pub openai_api_key: String,
    pub openai_model: String,
    pub blog_model: String,
}

impl Config {
    /// Builds the path layout for a project root, with no credentials set.
    /// Tests and offline tooling start here.
    pub fn for_project_root<P: Into<PathBuf>>(root: P) -> Self {
        let root = root.into();
        let logs = root.join("logs");
        Self {
            used_verses_path: root.join("used-verses.md"),
            themes_path: root.join("themes.md"),
            briefs_dir: root.join("briefs"),
            log_path: logs.join("posters-log.csv"),
            theme_map_path: logs.join("used-themes.csv"),
            new_badge_path: logs.join("new-verses.csv"),
            settings_path: logs.join("settings.json"),
            blog_log_path: logs.join("blog-log.csv"),
            blog_image_map_path: logs.join("blog-images.json"),
            blog_images_dir: logs.join("blog-images"),
            shorts_dir: logs.join("shorts"),
            shorts_progress_path: logs.join("shorts").join("progress.json"),
            drafts_dir: logs.join("drafts"),
            project_root: root,
            openai_api_key: String::new(),
            openai_model: DEFAULT_MODEL.to_string(),
            blog_model: DEFAULT_BLOG_MODEL.to_string(),
        }
    }

    /// Full startup load: `.env`-style file beside the binary plus the saved
    /// settings file. The settings file wins for the API key so the key can
    /// be rotated without touching `.env`. Fails when no key is found.
    pub async fn load(root: PathBuf, env_path: &Path) -> Result<Self> {
        let mut config = Self::for_project_root(root);
        let env = read_env_file(env_path).await;

        if let Some(model) = env.get("OPENAI_MODEL") {
            config.openai_model = model.clone();
        }
        if let Some(model) = env.get("BLOG_MODEL") {
            config.blog_model = model.clone();
        }
        if let Some(key) = env.get("OPENAI_API_KEY") {
            config.openai_api_key = key.clone();
        }

        let saved = settings::load_settings(&config.settings_path).await;
        if !saved.openai_api_key.is_empty() {
            config.openai_api_key = saved.openai_api_key;
        }

        if config.openai_api_key.is_empty() {
            anyhow::bail!(
                "OPENAI_API_KEY is not set (checked {} and {})",
                env_path.display(),
                config.settings_path.display()
            );
        }
        Ok(config)
    }
}

/// KEY=VALUE lines; blanks and `#` comments skipped, surrounding quotes on
/// values dropped. A missing file is an empty map.
async fn read_env_file(path: &Path) -> HashMap<String, String> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(_) => return HashMap::new(),
    };
    let mut env = HashMap::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"');
            if !key.is_empty() {
                env.insert(key.to_string(), value.to_string());
            }
        }
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn env_file_and_settings_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join(".env");
        tokio::fs::write(
            &env_path,
            "# creds\nOPENAI_API_KEY=\"sk-env\"\nOPENAI_MODEL=gpt-4o-mini\n",
        )
        .await
        .unwrap();

        let config = Config::load(dir.path().to_path_buf(), &env_path).await.unwrap();
        assert_eq!(config.openai_api_key, "sk-env");
        assert_eq!(config.openai_model, "gpt-4o-mini");

        // Saved settings override the env key.
        let saved = settings::Settings {
            openai_api_key: "sk-settings".to_string(),
            ..settings::Settings::default()
        };
        settings::save_settings(&config.settings_path, &saved).await.unwrap();
        let reloaded = Config::load(dir.path().to_path_buf(), &env_path).await.unwrap();
        assert_eq!(reloaded.openai_api_key, "sk-settings");
    }

    #[tokio::test]
    async fn missing_key_is_a_fatal_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().to_path_buf(), &dir.path().join(".env")).await;
        assert!(result.is_err());
    }

    #[test]
    fn paths_hang_off_the_project_root() {
        let config = Config::for_project_root("/tmp/lfl");
        assert_eq!(config.used_verses_path, PathBuf::from("/tmp/lfl/used-verses.md"));
        assert_eq!(config.log_path, PathBuf::from("/tmp/lfl/logs/posters-log.csv"));
        assert_eq!(
            config.shorts_progress_path,
            PathBuf::from("/tmp/lfl/logs/shorts/progress.json")
        );
    }
}
