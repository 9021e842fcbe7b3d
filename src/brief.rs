use crate::genlog;
use crate::theme::{self, UNCLASSIFIED};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// The structured poster-brief payload returned by the generation
/// collaborator and fixed up by the planner before persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosterBrief {
    #[serde(default)]
    pub theme_en: String,
    #[serde(default)]
    pub theme_ko: String,
    #[serde(default)]
    pub theme_display: String,
    #[serde(default)]
    pub anchor_text: String,
    #[serde(default)]
    pub verse_reference: String,
    #[serde(default)]
    pub verse_reference_en: String,
    #[serde(default)]
    pub english_verse: String,
    #[serde(default)]
    pub korean_verse: String,
    #[serde(default)]
    pub meaning_core: String,
    #[serde(default)]
    pub meaning_emotion: String,
    #[serde(default)]
    pub meaning_moment: String,
    #[serde(default)]
    pub emphasis_most: String,
    #[serde(default)]
    pub emphasis_can_drop: String,
    #[serde(default)]
    pub design_guide: String,
    #[serde(default)]
    pub spatial_context: String,
    #[serde(default)]
    pub one_line_intent: String,
    #[serde(default)]
    pub color_mode: String,
}

impl PosterBrief {
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone()).context("Failed to parse poster brief JSON")
    }
}

/// One row of the brief listing: logged briefs carry their log metadata,
/// stray `.md` files in the briefs directory show up unrecorded.
#[derive(Debug, Clone, PartialEq)]
pub struct BriefEntry {
    pub date: String,
    pub theme: String,
    pub verse_reference: String,
    pub brief_path: String,
    pub source: BriefSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BriefSource {
    Log,
    File,
}

/// Renders the brief Markdown with its fixed section layout. The section
/// titles double as the parse keys of `parse_brief_file`.
pub fn write_brief(data: &PosterBrief, size: &str) -> String {
    format!(
        "# Letter for Living Poster Brief\n\n\
         ## Theme\n\
         - English: {theme_en}\n\
         - Korean: {theme_ko}\n\n\
         ## Verse\n\
         - Reference: {verse}\n\
         - Reference (EN): {verse_en}\n\
         - English (ESV): {english}\n\
         - Korean (개역개정): {korean}\n\n\
         ## 앵커 텍스트 (디자인 언어)\n\
         - {anchor}\n\n\
         ## 말씀 출처\n\
         - {verse}\n\
         - {verse_en}\n\
         - {english}\n\
         - {korean}\n\n\
         ## 말씀의 의미\n\
         - 핵심 의미: {core}\n\
         - 감정 포인트: {emotion}\n\
         - 붙잡는 순간: {moment}\n\n\
         ## 핵심 강조 요소\n\
         - 가장 중요한 부분: {most}\n\
         - 생략 가능 부분: {drop}\n\n\
         ## 디자인 가이드 (컬러/레이아웃)\n\
         {guide}\n\n\
         ## 공간 속 사용 맥락\n\
         - {spatial}\n\n\
         ## 기획 의도 한 줄\n\
         - {intent}\n\n\
         ## Production Notes\n\
         - Size: {size} vertical\n",
        theme_en = data.theme_en,
        theme_ko = data.theme_ko,
        verse = data.verse_reference,
        verse_en = data.verse_reference_en,
        english = data.english_verse,
        korean = data.korean_verse,
        anchor = data.anchor_text,
        core = data.meaning_core,
        emotion = data.meaning_emotion,
        moment = data.meaning_moment,
        most = data.emphasis_most,
        drop = data.emphasis_can_drop,
        guide = data.design_guide,
        spatial = data.spatial_context,
        intent = data.one_line_intent,
        size = size,
    )
}

/// Parses a brief Markdown file back into its payload. Unknown sections are
/// skipped; the design-guide section is captured verbatim line by line.
pub async fn parse_brief_file(path: &Path) -> Result<PosterBrief> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("read brief: {}", path.display()))?;
    let mut result = PosterBrief::default();
    let mut design_lines: Vec<String> = Vec::new();
    let mut section = String::new();

    for raw in text.lines() {
        let line = raw.trim();
        if let Some(title) = line.strip_prefix("## ") {
            section = title.trim().to_string();
            continue;
        }
        if section == "디자인 가이드 (컬러/레이아웃)" {
            if let Some(rest) = line.strip_prefix("- ") {
                design_lines.push(rest.trim().to_string());
            } else if !line.is_empty() {
                design_lines.push(line.to_string());
            }
            continue;
        }
        let Some(content) = line.strip_prefix("- ") else {
            continue;
        };
        let content = content.trim();
        match section.as_str() {
            "Theme" => {
                if let Some(rest) = content.strip_prefix("English:") {
                    result.theme_en = rest.trim().to_string();
                } else if let Some(rest) = content.strip_prefix("Korean:") {
                    result.theme_ko = rest.trim().to_string();
                }
            }
            "Verse" => {
                if let Some(rest) = content.strip_prefix("Reference (EN):") {
                    result.verse_reference_en = rest.trim().to_string();
                } else if let Some(rest) = content.strip_prefix("Reference:") {
                    result.verse_reference = rest.trim().to_string();
                } else if let Some(rest) = content.strip_prefix("English (ESV):") {
                    result.english_verse = rest.trim().to_string();
                } else if let Some(rest) = content.strip_prefix("Korean (개역개정):") {
                    result.korean_verse = rest.trim().to_string();
                }
            }
            "앵커 텍스트 (디자인 언어)" => result.anchor_text = content.to_string(),
            "말씀의 의미" => {
                if let Some(rest) = content.strip_prefix("핵심 의미:") {
                    result.meaning_core = rest.trim().to_string();
                } else if let Some(rest) = content.strip_prefix("감정 포인트:") {
                    result.meaning_emotion = rest.trim().to_string();
                } else if let Some(rest) = content.strip_prefix("붙잡는 순간:") {
                    result.meaning_moment = rest.trim().to_string();
                }
            }
            "핵심 강조 요소" => {
                if let Some(rest) = content.strip_prefix("가장 중요한 부분:") {
                    result.emphasis_most = rest.trim().to_string();
                } else if let Some(rest) = content.strip_prefix("생략 가능 부분:") {
                    result.emphasis_can_drop = rest.trim().to_string();
                }
            }
            "공간 속 사용 맥락" => result.spatial_context = content.to_string(),
            "기획 의도 한 줄" => result.one_line_intent = content.to_string(),
            _ => {}
        }
    }
    if !design_lines.is_empty() {
        result.design_guide = design_lines.join("\n");
    }
    Ok(result)
}

/// Builds verse -> project-relative brief link from the poster log. Only the
/// first artifact path of a row counts, and only when the file still exists
/// under the project root.
pub async fn load_brief_links(
    log_path: &Path,
    project_root: &Path,
) -> Result<HashMap<String, String>> {
    let mut links = HashMap::new();
    for entry in genlog::load_entries(log_path).await? {
        let verse = entry.verse_reference.trim();
        let first = entry
            .file_paths
            .split(';')
            .next()
            .map(str::trim)
            .unwrap_or_default();
        if verse.is_empty() || first.is_empty() {
            continue;
        }
        let brief = PathBuf::from(first);
        if fs::metadata(&brief).await.is_err() {
            continue;
        }
        let Some(rel) = pathdiff::diff_paths(&brief, project_root) else {
            continue;
        };
        if rel.starts_with("..") {
            continue;
        }
        links.insert(verse.to_string(), rel.to_string_lossy().into_owned());
    }
    Ok(links)
}

/// Brief listing: every logged row plus any `.md` files in the briefs
/// directory the log never recorded.
pub async fn load_brief_entries(
    project_root: &Path,
    log_path: &Path,
    briefs_dir: &Path,
    catalog: &[String],
) -> Result<Vec<BriefEntry>> {
    let mut entries = Vec::new();
    let mut logged_paths: HashSet<String> = HashSet::new();

    for entry in genlog::load_entries(log_path).await? {
        let first = entry
            .file_paths
            .split(';')
            .next()
            .map(str::trim)
            .unwrap_or_default();
        if first.is_empty() {
            continue;
        }
        let Some(rel) = pathdiff::diff_paths(Path::new(first), project_root) else {
            continue;
        };
        if rel.starts_with("..") {
            continue;
        }
        let rel = rel.to_string_lossy().into_owned();
        logged_paths.insert(rel.clone());
        let raw_theme = entry.theme.trim();
        entries.push(BriefEntry {
            date: entry.date.trim().to_string(),
            theme: if raw_theme.is_empty() {
                String::new()
            } else {
                theme::normalize_theme_display(raw_theme, catalog)
            },
            verse_reference: entry.verse_reference.trim().to_string(),
            brief_path: rel,
            source: BriefSource::Log,
        });
    }

    if fs::metadata(briefs_dir).await.is_ok() {
        let mut files: Vec<PathBuf> = WalkDir::new(briefs_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
            .collect();
        files.sort();
        for file in files {
            let Some(rel) = pathdiff::diff_paths(&file, project_root) else {
                continue;
            };
            let rel = rel.to_string_lossy().into_owned();
            if logged_paths.contains(&rel) {
                continue;
            }
            entries.push(BriefEntry {
                date: String::new(),
                theme: UNCLASSIFIED.to_string(),
                verse_reference: String::new(),
                brief_path: rel,
                source: BriefSource::File,
            });
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genlog::LogEntry;
    use crate::theme::DEFAULT_THEME_LIST;

    fn sample_brief() -> PosterBrief {
        PosterBrief {
            theme_en: "The Ground Beneath".to_string(),
            theme_ko: "믿음".to_string(),
            anchor_text: "Faith is the assurance".to_string(),
            verse_reference: "히브리서 11:1".to_string(),
            verse_reference_en: "Hebrews 11:1".to_string(),
            english_verse: "Now faith is the assurance of things hoped for".to_string(),
            korean_verse: "믿음은 바라는 것들의 실상이요".to_string(),
            meaning_core: "핵심".to_string(),
            meaning_emotion: "감정".to_string(),
            meaning_moment: "순간".to_string(),
            emphasis_most: "faith is".to_string(),
            emphasis_can_drop: "hoped for".to_string(),
            design_guide: "1단계\n2단계".to_string(),
            spatial_context: "서재".to_string(),
            one_line_intent: "의도 한 줄".to_string(),
            ..PosterBrief::default()
        }
    }

    #[tokio::test]
    async fn brief_markdown_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.md");
        let original = sample_brief();

        tokio::fs::write(&path, write_brief(&original, "A2")).await.unwrap();
        let parsed = parse_brief_file(&path).await.unwrap();

        assert_eq!(parsed.theme_en, original.theme_en);
        assert_eq!(parsed.verse_reference, original.verse_reference);
        assert_eq!(parsed.verse_reference_en, original.verse_reference_en);
        assert_eq!(parsed.english_verse, original.english_verse);
        assert_eq!(parsed.emphasis_most, original.emphasis_most);
        assert_eq!(parsed.design_guide, original.design_guide);
        assert_eq!(parsed.one_line_intent, original.one_line_intent);
    }

    #[tokio::test]
    async fn links_skip_missing_and_foreign_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let log_path = root.join("logs").join("posters-log.csv");
        let briefs = root.join("briefs");
        tokio::fs::create_dir_all(&briefs).await.unwrap();

        let existing = briefs.join("a.md");
        tokio::fs::write(&existing, "# brief").await.unwrap();

        let mut entry = LogEntry {
            verse_reference: "히브리서 11:1".to_string(),
            file_paths: existing.to_string_lossy().into_owned(),
            ..LogEntry::default()
        };
        genlog::append_log(&log_path, &entry).await.unwrap();

        entry.verse_reference = "로마서 8:28".to_string();
        entry.file_paths = "/elsewhere/b.md".to_string();
        genlog::append_log(&log_path, &entry).await.unwrap();

        let links = load_brief_links(&log_path, root).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links["히브리서 11:1"], "briefs/a.md");
    }

    #[tokio::test]
    async fn listing_includes_unlogged_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let log_path = root.join("logs").join("posters-log.csv");
        let briefs = root.join("briefs");
        tokio::fs::create_dir_all(&briefs).await.unwrap();

        let logged = briefs.join("logged.md");
        tokio::fs::write(&logged, "# brief").await.unwrap();
        let stray = briefs.join("stray.md");
        tokio::fs::write(&stray, "# stray").await.unwrap();

        let entry = LogEntry {
            date: "2025-06-10".to_string(),
            theme: "The Ground Beneath".to_string(),
            verse_reference: "히브리서 11:1".to_string(),
            file_paths: logged.to_string_lossy().into_owned(),
            ..LogEntry::default()
        };
        genlog::append_log(&log_path, &entry).await.unwrap();

        let catalog: Vec<String> = DEFAULT_THEME_LIST.iter().map(|s| s.to_string()).collect();
        let entries = load_brief_entries(root, &log_path, &briefs, &catalog)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source, BriefSource::Log);
        assert_eq!(entries[0].theme, "1. The Ground Beneath:믿음");
        assert_eq!(entries[1].source, BriefSource::File);
        assert_eq!(entries[1].brief_path, "briefs/stray.md");
        assert_eq!(entries[1].theme, UNCLASSIFIED);
    }
}
