use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tokio::fs;

/// One timed subtitle span, seconds from the start of the audio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

const SENTENCE_ENDINGS: [&str; 7] = [".", "!", "?", "다.", "요.", "죠.", "네."];

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

fn ends_sentence(text: &str) -> bool {
    SENTENCE_ENDINGS.iter().any(|suffix| text.ends_with(suffix))
}

/// Whisper cuts on pauses, not sentences; this glues consecutive segments
/// back together until one ends on sentence-final punctuation.
pub fn merge_segments_by_sentence(segments: &[Segment]) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::new();
    let mut buffer: Option<Segment> = None;
    for seg in segments {
        let text = seg.text.trim();
        if text.is_empty() {
            continue;
        }
        match buffer.as_mut() {
            None => {
                buffer = Some(Segment {
                    start: seg.start,
                    end: seg.end,
                    text: text.to_string(),
                });
            }
            Some(current) => {
                current.end = seg.end;
                current.text = format!("{} {}", current.text, text).trim().to_string();
            }
        }
        if ends_sentence(text) {
            if let Some(done) = buffer.take() {
                merged.push(done);
            }
        }
    }
    if let Some(rest) = buffer {
        merged.push(rest);
    }
    merged
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut last = 0;
    for m in SENTENCE_SPLIT_RE.find_iter(text) {
        // Keep the punctuation with its sentence, drop the whitespace.
        let punct_end = last
            + text[last..m.end()]
                .rfind(|c: char| matches!(c, '.' | '!' | '?'))
                .map(|i| i + 1)
                .unwrap_or(m.end() - last);
        let part = text[last..punct_end].trim();
        if !part.is_empty() {
            parts.push(part.to_string());
        }
        last = m.end();
    }
    let tail = text[last..].trim();
    if !tail.is_empty() {
        parts.push(tail.to_string());
    }
    parts
}

/// When transcription collapsed the whole narration into one segment, splits
/// it by sentence and divides the span evenly. A zero-length span gets 0.8s
/// per sentence.
pub fn split_long_segments(segments: Vec<Segment>) -> Vec<Segment> {
    if segments.len() != 1 {
        return segments;
    }
    let seg = &segments[0];
    let sentences = split_sentences(seg.text.trim());
    if sentences.len() <= 1 {
        return segments;
    }
    let start = seg.start;
    let mut end = seg.end;
    if end <= start {
        end = start + 0.8 * sentences.len() as f64;
    }
    let per = (end - start) / sentences.len() as f64;
    sentences
        .into_iter()
        .enumerate()
        .map(|(idx, text)| Segment {
            start: start + idx as f64 * per,
            end: start + (idx + 1) as f64 * per,
            text,
        })
        .collect()
}

/// Caption timing without a transcription: the script's sentences share the
/// narration length evenly. Used when the transcription call fails so the
/// shorts job still ships a subtitle file.
pub fn evenly_timed_segments(script: &str, total_seconds: f64) -> Vec<Segment> {
    let mut lines: Vec<String> = script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if lines.len() <= 1 {
        if let Some(only) = lines.first() {
            let sentences = split_sentences(only);
            if sentences.len() > 1 {
                lines = sentences;
            }
        }
    }
    if lines.is_empty() {
        return Vec::new();
    }
    let per = total_seconds.max(1.0) / lines.len() as f64;
    lines
        .into_iter()
        .enumerate()
        .map(|(idx, text)| Segment {
            start: idx as f64 * per,
            end: (idx + 1) as f64 * per,
            text,
        })
        .collect()
}

pub fn format_srt_time(seconds: f64) -> String {
    let millis = (seconds * 1000.0) as i64;
    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    let secs = (millis % 60_000) / 1000;
    let ms = millis % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, ms)
}

/// Renders numbered SRT blocks; empty segments are skipped and text is
/// collapsed to one line.
pub fn render_srt(segments: &[Segment]) -> String {
    let mut blocks = Vec::new();
    for (idx, seg) in segments.iter().enumerate() {
        let text = WHITESPACE_RE
            .replace_all(seg.text.replace('\n', " ").trim(), " ")
            .into_owned();
        if text.is_empty() {
            continue;
        }
        blocks.push(format!(
            "{}\n{} --> {}\n{}\n",
            idx + 1,
            format_srt_time(seg.start),
            format_srt_time(seg.end),
            text
        ));
    }
    blocks.join("\n")
}

pub async fn write_srt(segments: &[Segment], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create srt dir: {}", parent.display()))?;
    }
    fs::write(path, render_srt(segments))
        .await
        .with_context(|| format!("write srt: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> Segment {
        Segment {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn merge_joins_until_sentence_final_punctuation() {
        let input = vec![
            seg(0.0, 1.2, "오늘도"),
            seg(1.2, 2.5, "괜찮은 척했나요."),
            seg(2.5, 4.0, "누구에게도 말하지 못한"),
            seg(4.0, 5.5, "마음이 있진 않나요?"),
        ];
        let merged = merge_segments_by_sentence(&input);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "오늘도 괜찮은 척했나요.");
        assert_eq!(merged[0].start, 0.0);
        assert_eq!(merged[0].end, 2.5);
        assert_eq!(merged[1].text, "누구에게도 말하지 못한 마음이 있진 않나요?");
    }

    #[test]
    fn merge_keeps_an_unterminated_tail() {
        let input = vec![seg(0.0, 1.0, "끝나지 않은 문장")];
        let merged = merge_segments_by_sentence(&input);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "끝나지 않은 문장");
    }

    #[test]
    fn single_segment_is_split_with_even_timing() {
        let input = vec![seg(0.0, 6.0, "첫 문장입니다. 둘째 문장입니다. 셋째 문장입니다.")];
        let split = split_long_segments(input);
        assert_eq!(split.len(), 3);
        assert_eq!(split[0].text, "첫 문장입니다.");
        assert!((split[0].end - 2.0).abs() < 1e-9);
        assert!((split[1].start - 2.0).abs() < 1e-9);
        assert!((split[2].end - 6.0).abs() < 1e-9);
    }

    #[test]
    fn multi_segment_input_passes_through() {
        let input = vec![seg(0.0, 1.0, "하나."), seg(1.0, 2.0, "둘.")];
        assert_eq!(split_long_segments(input.clone()), input);
    }

    #[test]
    fn zero_length_span_falls_back_to_estimated_timing() {
        let input = vec![seg(3.0, 3.0, "하나입니다. 둘입니다.")];
        let split = split_long_segments(input);
        assert_eq!(split.len(), 2);
        assert!((split[1].end - 4.6).abs() < 1e-9);
    }

    #[test]
    fn script_lines_share_the_narration_length_evenly() {
        let script = "오늘도 괜찮은 척했나요.\n\n그 마음, 혼자만의 것이었을까요?";
        let segments = evenly_timed_segments(script, 60.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "오늘도 괜찮은 척했나요.");
        assert!((segments[0].end - 30.0).abs() < 1e-9);
        assert!((segments[1].start - 30.0).abs() < 1e-9);
        assert!((segments[1].end - 60.0).abs() < 1e-9);
    }

    #[test]
    fn single_line_script_is_split_by_sentence() {
        let segments = evenly_timed_segments("첫 문장입니다. 둘째 문장입니다.", 30.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text, "둘째 문장입니다.");
        assert!(evenly_timed_segments("  \n ", 30.0).is_empty());
    }

    #[test]
    fn srt_blocks_are_numbered_with_comma_millis() {
        let rendered = render_srt(&[
            seg(0.0, 2.5, "첫  줄\n이어짐"),
            seg(2.5, 61.75, "둘째 줄"),
        ]);
        assert!(rendered.starts_with("1\n00:00:00,000 --> 00:00:02,500\n첫 줄 이어짐\n"));
        assert!(rendered.contains("2\n00:00:02,500 --> 00:01:01,750\n둘째 줄\n"));
    }
}
