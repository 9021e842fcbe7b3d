use crate::api::openai;
use crate::brief::{self, PosterBrief};
use crate::config::Config;
use crate::genlog::{self, LogEntry};
use crate::ledger;
use crate::reference::{has_latin, normalize_ref, slugify};
use crate::theme;
use crate::{badges, logi, logok, overrides};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;

const MAX_BRIEF_ATTEMPTS: usize = 6;
const MAX_VERSE_ATTEMPTS: usize = 5;

static QUOTED_SPAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]*""#).unwrap());

/// Korean-only payload fields; Latin letters anywhere in them reject the
/// attempt.
const KOREAN_ONLY_FIELDS: [&str; 5] = [
    "meaning_core",
    "meaning_emotion",
    "meaning_moment",
    "spatial_context",
    "one_line_intent",
];

/// Produces a structured JSON payload for a prompt. The production
/// implementation calls the OpenAI Responses API; tests substitute a scripted
/// stub.
#[async_trait]
pub trait BriefGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<serde_json::Value>;
}

pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: Config,
}

impl OpenAiGenerator {
    pub fn new(client: reqwest::Client, config: Config) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl BriefGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<serde_json::Value> {
        openai::call_openai_json(&self.client, &self.config, &self.config.openai_model, prompt)
            .await
    }
}

/// One rejected attempt. The display text doubles as the corrective note
/// appended to the next attempt's prompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("주의: verse_reference가 비어 있습니다. 반드시 채워주세요.")]
    MissingReference,
    #[error("주의: 직전 결과가 사용된 말씀({0})이었습니다. 반드시 다른 구절을 선택하세요.")]
    AlreadyUsed(String),
    #[error(
        "주의: english_verse 또는 korean_verse가 비어 있습니다. \
         ESV 영어 본문과 개역개정 한글 본문을 모두 작성하세요."
    )]
    EmptyVerseText,
    #[error("주의: verse_reference_en이 비어 있거나 영어 책 이름이 아닙니다. 예: 2 Corinthians 5:7")]
    BadEnglishReference,
    #[error("주의: {0} 필드에 영어가 포함되었습니다. 해당 필드들은 반드시 한국어로만 작성하세요.")]
    LatinInKoreanField(String),
    #[error(
        "주의: emphasis_most/emphasis_can_drop는 \
         english_verse에서 그대로 발췌한 영어 구절이어야 합니다."
    )]
    BadEmphasisExcerpts,
    #[error(
        "주의: design_guide에는 emphasis_most와 \
         emphasis_can_drop를 영어 원문 그대로 포함해야 합니다."
    )]
    GuideMissingExcerpts,
    #[error("주의: design_guide 설명은 한국어로만 작성하세요. 영어는 따옴표 안의 발췌 구절만 허용됩니다.")]
    LatinInGuide,
    #[error(
        "주의: one_line_intent가 메모 문구를 그대로 복사했습니다. \
         새로운 한국어 문장으로 다시 작성하세요."
    )]
    CopiedIntent,
}

/// Planner form input, already trimmed by the caller.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    pub theme: String,
    pub size: String,
    pub tone: String,
    pub notes: String,
    pub color_mode: String,
}

/// An accepted, fully persisted brief.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub brief: PosterBrief,
    pub brief_path: PathBuf,
    pub attempts: usize,
}

/// The seven ordered acceptance checks. The first failure wins so corrective
/// notes stay specific.
pub fn validate_brief(
    data: &PosterBrief,
    used: &BTreeSet<String>,
    notes: &str,
) -> Result<String, ValidationFailure> {
    let verse_ref = normalize_ref(&data.verse_reference);
    if verse_ref.is_empty() {
        return Err(ValidationFailure::MissingReference);
    }
    if used.contains(&verse_ref) {
        return Err(ValidationFailure::AlreadyUsed(verse_ref));
    }

    let english_verse = data.english_verse.trim();
    let korean_verse = data.korean_verse.trim();
    if english_verse.is_empty() || korean_verse.is_empty() {
        return Err(ValidationFailure::EmptyVerseText);
    }

    let verse_reference_en = data.verse_reference_en.trim();
    if verse_reference_en.is_empty() || !has_latin(verse_reference_en) {
        return Err(ValidationFailure::BadEnglishReference);
    }

    let korean_values = [
        &data.meaning_core,
        &data.meaning_emotion,
        &data.meaning_moment,
        &data.spatial_context,
        &data.one_line_intent,
    ];
    for (field, value) in KOREAN_ONLY_FIELDS.iter().zip(korean_values) {
        if has_latin(value) {
            return Err(ValidationFailure::LatinInKoreanField(field.to_string()));
        }
    }

    let emphasis_most = data.emphasis_most.trim();
    let emphasis_can_drop = data.emphasis_can_drop.trim();
    let english_lower = english_verse.to_lowercase();
    if emphasis_most.is_empty()
        || emphasis_can_drop.is_empty()
        || !english_lower.contains(&emphasis_most.to_lowercase())
        || !english_lower.contains(&emphasis_can_drop.to_lowercase())
        || !has_latin(emphasis_most)
        || !has_latin(emphasis_can_drop)
    {
        return Err(ValidationFailure::BadEmphasisExcerpts);
    }

    let design_guide = data.design_guide.trim();
    let guide_lower = design_guide.to_lowercase();
    if design_guide.is_empty()
        || !guide_lower.contains(&emphasis_most.to_lowercase())
        || !guide_lower.contains(&emphasis_can_drop.to_lowercase())
    {
        return Err(ValidationFailure::GuideMissingExcerpts);
    }
    let guide_cleaned = QUOTED_SPAN_RE.replace_all(design_guide, "");
    if has_latin(&guide_cleaned) {
        return Err(ValidationFailure::LatinInGuide);
    }

    let one_line_intent = data.one_line_intent.trim();
    if !notes.is_empty() && !one_line_intent.is_empty() && notes.contains(one_line_intent) {
        return Err(ValidationFailure::CopiedIntent);
    }

    Ok(verse_ref)
}

/// Verse pre-pass: up to five short JSON calls until the model names a
/// reference not in the ledger. Empty string means the pre-pass gave up.
pub async fn select_new_verse(
    generator: &dyn BriefGenerator,
    theme_label: &str,
    used: &BTreeSet<String>,
) -> String {
    let prompt = crate::prompts::build_verse_prompt(theme_label, used);
    for _ in 0..MAX_VERSE_ATTEMPTS {
        let Ok(value) = generator.generate(&prompt).await else {
            continue;
        };
        let raw = value
            .get("verse_reference")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let verse_ref = normalize_ref(raw);
        if !verse_ref.is_empty() && !used.contains(&verse_ref) {
            return verse_ref;
        }
    }
    String::new()
}

/// Runs the whole planning cycle for one request: verse choice, up to six
/// generation attempts with accumulated corrective notes, then persistence of
/// the accepted brief across the ledger, log, badge, and override files.
pub async fn plan(
    config: &Config,
    generator: &dyn BriefGenerator,
    request: &PlanRequest,
) -> Result<PlanOutcome> {
    let used = ledger::read_used_verses(&config.used_verses_path).await?;
    let catalog = theme::read_themes(&config.themes_path).await?;

    if !catalog.contains(&request.theme) {
        anyhow::bail!("주제를 8가지 중에서 선택해 주세요.");
    }

    let notes = request.notes.trim();
    let mut chosen_verse = String::new();
    if !notes.is_empty() {
        for used_ref in &used {
            if !used_ref.is_empty() && notes.contains(used_ref.as_str()) {
                anyhow::bail!("이미 제작된 말씀입니다. 다른 말씀으로 다시 시도해 주세요.");
            }
        }
        chosen_verse = notes.to_string();
    }
    if chosen_verse.is_empty() {
        chosen_verse = select_new_verse(generator, &request.theme, &used).await;
        if chosen_verse.is_empty() {
            anyhow::bail!("새로운 말씀을 찾지 못했습니다. 다시 시도해 주세요.");
        }
        logi(format!("Verse selected: {}", chosen_verse));
    }

    let base_prompt = crate::prompts::build_poster_prompt(
        &request.theme,
        &request.size,
        &request.tone,
        &chosen_verse,
        &used,
        &catalog,
        &request.color_mode,
    );

    let mut corrective_notes = String::new();
    let mut accepted: Option<(PosterBrief, String, usize)> = None;
    for attempt in 1..=MAX_BRIEF_ATTEMPTS {
        let prompt = format!("{}{}", base_prompt, corrective_notes);
        let value = generator.generate(&prompt).await?;
        let mut data = PosterBrief::from_json(&value)?;
        data.color_mode = request.color_mode.clone();

        match validate_brief(&data, &used, notes) {
            Ok(verse_ref) => {
                accepted = Some((data, verse_ref, attempt));
                break;
            }
            Err(failure) => {
                logi(format!("Attempt {} rejected: {}", attempt, failure));
                corrective_notes.push_str("\n\n");
                corrective_notes.push_str(&failure.to_string());
            }
        }
    }

    let Some((mut data, verse_ref, attempts)) = accepted else {
        anyhow::bail!("새로운 말씀을 찾지 못했습니다. 다시 시도해 주세요.");
    };

    data.verse_reference = verse_ref.clone();
    let (theme_en, theme_ko) = theme::parse_theme(&request.theme);
    data.theme_en = theme_en;
    data.theme_ko = theme_ko;
    data.theme_display = request.theme.clone();

    fs::create_dir_all(&config.briefs_dir)
        .await
        .with_context(|| format!("create briefs dir: {}", config.briefs_dir.display()))?;

    if catalog.contains(&request.theme) {
        overrides::save_theme_override(&config.theme_map_path, &verse_ref, &request.theme).await?;
    }

    let theme_slug = slugify(&data.theme_en);
    let verse_slug = slugify(&verse_ref.replace(':', "-"));
    let date_tag = Local::now().format("%Y%m%d").to_string();
    let brief_path = config
        .briefs_dir
        .join(format!("{}_{}_{}.md", date_tag, theme_slug, verse_slug));

    let brief_text = brief::write_brief(&data, &request.size);
    fs::write(&brief_path, brief_text)
        .await
        .with_context(|| format!("write brief: {}", brief_path.display()))?;

    let entry = LogEntry {
        date: Local::now().format("%Y-%m-%d").to_string(),
        theme: data.theme_display.clone(),
        verse_reference: verse_ref.clone(),
        english_title: data.anchor_text.clone(),
        korean_title: data.meaning_core.clone(),
        size: request.size.clone(),
        palette: data.color_mode.clone(),
        layout_summary: data.design_guide.clone(),
        file_paths: brief_path.to_string_lossy().into_owned(),
        notes: notes.to_string(),
    };
    genlog::append_log(&config.log_path, &entry).await?;
    ledger::append_used_verse(&config.used_verses_path, &verse_ref).await?;
    badges::save_new_badge(&config.new_badge_path, &verse_ref, Local::now().naive_local()).await?;

    logok(format!("Brief accepted after {} attempt(s): {}", attempts, verse_ref));
    Ok(PlanOutcome {
        brief: data,
        brief_path,
        attempts,
    })
}
