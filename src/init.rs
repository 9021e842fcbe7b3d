use crate::config::Config;
use anyhow::Result;
use tokio::fs;

/// Creates every directory the studio writes into under the project root.
pub async fn ensure_directories(config: &Config) -> Result<()> {
    let dirs = [
        &config.briefs_dir,
        &config.blog_images_dir,
        &config.shorts_dir,
        &config.drafts_dir,
    ];
    for dir in dirs {
        if fs::metadata(dir).await.is_err() {
            fs::create_dir_all(dir).await?;
            eprintln!("[INFO] Created directory: {}", dir.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn all_working_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_project_root(dir.path());
        ensure_directories(&config).await.unwrap();
        assert!(config.briefs_dir.is_dir());
        assert!(config.blog_images_dir.is_dir());
        assert!(config.shorts_dir.is_dir());
        assert!(config.drafts_dir.is_dir());
    }
}
