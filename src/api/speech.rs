use crate::config::Config;
use crate::srt::Segment;
use anyhow::{Context, Result};
use reqwest::multipart;
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use tokio::fs;

const TTS_MODEL: &str = "gpt-4o-mini-tts";
const TRANSCRIBE_MODEL: &str = "whisper-1";

/// Renders the narration script as an mp3 at `out_path`.
pub async fn build_voiceover(
    client: &Client,
    cfg: &Config,
    script: &str,
    voice: &str,
    out_path: &Path,
) -> Result<()> {
    let voice = if voice.is_empty() { "alloy" } else { voice };
    let body = json!({
        "model": TTS_MODEL,
        "voice": voice,
        "input": script,
        "format": "mp3",
    });

    let resp = client
        .post("https://api.openai.com/v1/audio/speech")
        .bearer_auth(&cfg.openai_api_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(60))
        .send()
        .await
        .context("TTS request failed")?;

    let status = resp.status();
    if !status.is_success() {
        let raw = resp.text().await.unwrap_or_default();
        let snippet = raw.chars().take(800).collect::<String>();
        anyhow::bail!("TTS HTTP {}: {}", status.as_u16(), snippet);
    }

    let bytes = resp.bytes().await.context("TTS response read failed")?;
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create audio dir: {}", parent.display()))?;
    }
    fs::write(out_path, &bytes)
        .await
        .with_context(|| format!("write voiceover: {}", out_path.display()))?;
    Ok(())
}

/// Whisper transcription of the rendered voiceover, segment timestamps only.
/// The segments drive subtitle timing, not the original script text.
pub async fn transcribe_with_timestamps(
    client: &Client,
    cfg: &Config,
    audio_path: &Path,
) -> Result<Vec<Segment>> {
    let bytes = fs::read(audio_path)
        .await
        .with_context(|| format!("read voiceover: {}", audio_path.display()))?;
    let file_name = audio_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio.mp3".to_string());

    let part = multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("audio/mpeg")
        .context("audio mime type")?;
    let form = multipart::Form::new()
        .part("file", part)
        .text("model", TRANSCRIBE_MODEL)
        .text("response_format", "verbose_json")
        .text("timestamp_granularities[]", "segment");

    let resp = client
        .post("https://api.openai.com/v1/audio/transcriptions")
        .bearer_auth(&cfg.openai_api_key)
        .multipart(form)
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await
        .context("Transcription request failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        let snippet = raw.chars().take(800).collect::<String>();
        anyhow::bail!("Transcription HTTP {}: {}", status.as_u16(), snippet);
    }

    let root: serde_json::Value =
        serde_json::from_str(&raw).context("Transcription response parse failed")?;
    let mut segments = Vec::new();
    if let Some(items) = root.get("segments").and_then(|v| v.as_array()) {
        for item in items {
            let text = item
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .trim()
                .to_string();
            if text.is_empty() {
                continue;
            }
            segments.push(Segment {
                start: item.get("start").and_then(|v| v.as_f64()).unwrap_or(0.0),
                end: item.get("end").and_then(|v| v.as_f64()).unwrap_or(0.0),
                text,
            });
        }
    }
    if segments.is_empty() {
        anyhow::bail!("Transcription returned no segments");
    }
    Ok(segments)
}
