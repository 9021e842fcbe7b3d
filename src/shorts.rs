use crate::api::{images, speech};
use crate::config::Config;
use crate::progress::{self, OutputItem, Progress};
use crate::srt;
use crate::{logi, logok, logw};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const SHORTS_IMAGE_SIZE: &str = "1024x1536";

/// Everything the background job needs, captured before the thread starts so
/// it never touches shared state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShortsJob {
    #[serde(default)]
    pub script: String,
    /// Pre-uploaded cut images; when none survive the existence check the job
    /// generates its own from `image_prompts`.
    #[serde(default)]
    pub image_paths: Vec<String>,
    #[serde(default)]
    pub image_prompts: Vec<String>,
    #[serde(default)]
    pub voice: String,
    #[serde(default)]
    pub total_seconds: f64,
}

/// Draft returned by the script writer, held in the session store between
/// the draft and make steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShortsDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub image_prompts: Vec<String>,
}

/// Fires the job on its own thread with its own runtime so the caller's loop
/// is never blocked. Progress lands in the progress file, not a channel.
pub fn spawn_shorts_job(config: Config, job: ShortsJob) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(err) => {
                logw(format!("Shorts runtime init failed: {}", err));
                return;
            }
        };
        rt.block_on(async {
            let progress_path = config.shorts_progress_path.clone();
            let _ = progress::save_progress(&progress_path, &Progress::in_progress("작업 시작")).await;
            match run_shorts_job(&config, &job).await {
                Ok(outputs) => {
                    let mut done = progress::load_progress(&progress_path).await;
                    done.status = "done".to_string();
                    done.steps.push("완료".to_string());
                    done.outputs = outputs;
                    let _ = progress::save_progress(&progress_path, &done).await;
                    logok("Shorts job finished");
                }
                Err(err) => {
                    logw(format!("Shorts job failed: {}", err));
                    let _ =
                        progress::save_progress(&progress_path, &Progress::error(&err.to_string()))
                            .await;
                }
            }
        });
    });
}

async fn run_shorts_job(config: &Config, job: &ShortsJob) -> Result<Vec<OutputItem>> {
    let script = job.script.trim();
    if script.is_empty() {
        anyhow::bail!("스크립트가 비어 있습니다.");
    }
    let client = reqwest::Client::new();
    let output_dir = config.shorts_dir.clone();
    let progress_path = &config.shorts_progress_path;

    progress::push_step(progress_path, "나레이션 생성 중...").await?;
    let voice_path = output_dir.join("shorts_voiceover.mp3");
    speech::build_voiceover(&client, config, script, &job.voice, &voice_path).await?;
    logi(format!("Voiceover saved: {}", voice_path.display()));

    progress::push_step(progress_path, "자막 타임코드 생성 중...").await?;
    let merged = match speech::transcribe_with_timestamps(&client, config, &voice_path).await {
        Ok(segments) => srt::split_long_segments(srt::merge_segments_by_sentence(&segments)),
        Err(err) => {
            logw(format!("Transcription failed, using even timing: {}", err));
            srt::evenly_timed_segments(script, job.total_seconds)
        }
    };
    let srt_path = output_dir.join("shorts_video.srt");
    srt::write_srt(&merged, &srt_path).await?;

    progress::push_step(progress_path, "이미지 준비 중...").await?;
    let mut image_paths: Vec<PathBuf> = Vec::new();
    for raw in &job.image_paths {
        let path = PathBuf::from(raw);
        if !raw.is_empty() && tokio::fs::metadata(&path).await.is_ok() {
            image_paths.push(path);
        }
    }
    if image_paths.is_empty() {
        if job.image_prompts.is_empty() {
            anyhow::bail!("이미지 프롬프트가 없습니다.");
        }
        image_paths = images::generate_images(
            &client,
            config,
            &job.image_prompts,
            &output_dir.join("images"),
            SHORTS_IMAGE_SIZE,
            "shorts_cut",
        )
        .await?;
    }

    let mut outputs = vec![OutputItem {
        label: "나레이션 오디오".to_string(),
        path: voice_path.to_string_lossy().into_owned(),
    }];
    outputs.push(OutputItem {
        label: "자막 파일".to_string(),
        path: srt_path.to_string_lossy().into_owned(),
    });
    for (idx, path) in image_paths.iter().enumerate() {
        outputs.push(OutputItem {
            label: format!("컷 이미지 {}", idx + 1),
            path: path.to_string_lossy().into_owned(),
        });
    }
    Ok(outputs)
}

/// Parses the draft payload returned by the script writer.
pub fn parse_shorts_draft(value: &serde_json::Value) -> Result<ShortsDraft> {
    let mut draft: ShortsDraft = serde_json::from_value(value.clone())
        .map_err(|err| anyhow::anyhow!("숏츠 초안 파싱 실패: {}", err))?;
    draft.title = draft.title.trim().to_string();
    draft.script = draft.script.trim().to_string();
    draft.image_prompts.retain(|p| !p.trim().is_empty());
    if draft.script.is_empty() {
        anyhow::bail!("숏츠 스크립트가 비어 있습니다.");
    }
    Ok(draft)
}

/// "60초" and friends: digits and dots only, defaulting to 60.
pub fn parse_length_seconds(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().unwrap_or(60.0)
}
