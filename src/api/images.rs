use crate::config::Config;
use crate::{logi, logw};
use anyhow::{Context, Result};
use base64::Engine;
use reqwest::Client;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;

const IMAGE_MODEL: &str = "gpt-image-1-mini";

/// Generates one PNG per prompt into `output_dir`, numbered in prompt order.
/// A failed prompt is logged and skipped so one bad cut does not sink the
/// whole batch.
pub async fn generate_images(
    client: &Client,
    cfg: &Config,
    prompts: &[String],
    output_dir: &Path,
    size: &str,
    file_stem: &str,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("create image dir: {}", output_dir.display()))?;

    let mut paths = Vec::new();
    for (idx, prompt) in prompts.iter().enumerate() {
        let out_path = output_dir.join(format!("{}_{:02}.png", file_stem, idx + 1));
        match generate_one(client, cfg, prompt, size).await {
            Ok(bytes) => {
                fs::write(&out_path, &bytes)
                    .await
                    .with_context(|| format!("write image: {}", out_path.display()))?;
                logi(format!("Image saved: {}", out_path.display()));
                paths.push(out_path);
            }
            Err(err) => {
                logw(format!("Image generation failed for cut {}: {}", idx + 1, err));
            }
        }
    }
    Ok(paths)
}

async fn generate_one(client: &Client, cfg: &Config, prompt: &str, size: &str) -> Result<Vec<u8>> {
    let body = json!({
        "model": IMAGE_MODEL,
        "prompt": prompt,
        "size": size,
        "quality": "low",
    });

    let resp = client
        .post("https://api.openai.com/v1/images/generations")
        .bearer_auth(&cfg.openai_api_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await
        .context("Image request failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        let snippet = raw.chars().take(800).collect::<String>();
        anyhow::bail!("Image HTTP {}: {}", status.as_u16(), snippet);
    }

    let root: serde_json::Value =
        serde_json::from_str(&raw).context("Image response parse failed")?;
    let first = root
        .get("data")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .context("Image response has no data")?;

    if let Some(b64) = first.get("b64_json").and_then(|v| v.as_str()) {
        return base64::engine::general_purpose::STANDARD
            .decode(b64)
            .context("Image base64 decode failed");
    }
    if let Some(url) = first.get("url").and_then(|v| v.as_str()) {
        let bytes = client
            .get(url)
            .timeout(std::time::Duration::from_secs(120))
            .send()
            .await
            .context("Image download failed")?
            .bytes()
            .await
            .context("Image download read failed")?;
        return Ok(bytes.to_vec());
    }
    anyhow::bail!("Image response carried neither b64_json nor url")
}
