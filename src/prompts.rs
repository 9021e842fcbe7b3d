//! Prompt assembly for the generation collaborators. Templates are Korean
//! because the briefs, blog posts, and scripts ship in Korean; English shows
//! up only where the ESV source text is quoted.

use crate::brief::PosterBrief;
use std::collections::BTreeSet;

fn used_block(used: &BTreeSet<String>) -> String {
    if used.is_empty() {
        "(none)".to_string()
    } else {
        used.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

/// Verse-only pre-pass: asks for a single unused reference in Korean book
/// name form, strict JSON.
pub fn build_verse_prompt(theme: &str, used: &BTreeSet<String>) -> String {
    format!(
        "너는 성경 구절을 선택하는 에디터다.\n\
         주제에 맞는 성경 구절을 한국어 책 이름 형식으로 1개만 반환하라.\n\
         이미 사용된 구절은 절대 선택하지 않는다.\n\n\
         주제: {theme}\n\
         이미 사용된 구절:\n{used}\n\n\
         출력은 반드시 JSON만 반환한다.\n\
         {{\n  \"verse_reference\": \"\"\n}}",
        theme = theme,
        used = used_block(used),
    )
}

/// The full poster-brief template: language rules, the fixed section layout,
/// the design-guide micro-format, and the strict JSON schema the planner
/// validates against.
pub fn build_poster_prompt(
    theme: &str,
    size: &str,
    tone: &str,
    notes: &str,
    used: &BTreeSet<String>,
    catalog: &[String],
    color_mode: &str,
) -> String {
    let themes_block = if catalog.is_empty() {
        "(themes unavailable)".to_string()
    } else {
        catalog.join("\n")
    };
    let color_text = if color_mode.is_empty() {
        "(not specified)"
    } else {
        color_mode
    };
    let notes_text = if notes.is_empty() { "(none)" } else { notes };
    let tone_text = if tone.is_empty() { "(none)" } else { tone };

    format!(
        "SYSTEM INSTRUCTION\n\n\
너는 '영문 성경 말씀(ESV)을 기준으로\n\
영업용 타이포그래피 포스터 기획서를 작성하는\n\
전문 디자인 기획자'다.\n\n\
이 작업은 '문서 정리'나 '요약'이 아니다.\n\
아래 템플릿의 각 항목을\n\
반드시 새로 기획하고 새로 작성해야 한다.\n\n\
⚠️ 매우 중요:\n\
- 아래에 포함된 모든 예시(ex)는 설명용이다.\n\
- 예시 문구를 그대로 복사하거나 재사용하는 것은 금지한다.\n\
- 출력 결과에는 예시 문구가 단 한 줄도 포함되면 안 된다.\n\
- 모든 문장은 새로 작성해야 한다.\n\n\
────────────────────\n\n\
[언어 및 기준 규칙]\n\n\
1. 실제 포스터 디자인에 사용되는 문장은\n\
   반드시 영어 성경 말씀(ESV)만을 기준으로 한다.\n\
2. 한글 문장은 설명·해석·기획용 레이어이며,\n\
   디자인 문장으로 취급하지 않는다.\n\
3. 모든 강조, 생략, 레이아웃 판단은\n\
   ESV 영어 문장을 기준으로 수행한다.\n\n\
────────────────────\n\n\
[출력 규칙]\n\n\
- 아래 템플릿의 제목과 순서를 절대 변경하지 말 것.\n\
- 모든 항목을 빠짐없이 채울 것.\n\
- 기획서 톤으로 간결하고 명확하게 작성할 것.\n\
- 감성적인 수식어나 설교체 문장은 사용하지 말 것.\n\n\
────────────────────\n\n\
테마\n\
{theme}\n\n\
앵커 텍스트 (디자인 언어)\n\
- 실제 포스터 디자인에 사용할 핵심 문장 1개만 제시할 것.\n\
- 영어 문장만 작성할 것. 설명/예시 문구는 쓰지 말 것.\n\n\
말씀 출처\n\
- ESV 영어 성경 말씀을 먼저 작성할 것.\n\
- 그 아래에 동일 구절의 한글 개역개정 번역을 병기할 것.\n\
- 구절 표기는 영문/한글 각각 정확히 표기할 것.\n\
- 각 본문은 1~2문장으로 완결된 구절 텍스트를 적을 것.\n\
- verse_reference_en에는 영문 책 이름으로 표기할 것 (예: 2 Corinthians 5:7).\n\n\
말씀의 의미\n\
- 핵심 의미: 영어 말씀의 신학적·메시지적 핵심을 한글로 설명\n\
- 감정 포인트: 이 말씀이 전달하는 정서적 무게감\n\
- 붙잡는 순간: 어떤 신앙적 상황에서 이 말씀이 힘이 되는지\n\n\
핵심 강조 요소\n\
- 시각적으로 가장 중요한 부분:\n\
  → ESV 영어 문장 중 타이포그래피에서\n\
    가장 크게 또는 가장 무겁게 다뤄야 할 단어/구절\n\
- 생략해도 되는 부분:\n\
  → 의미를 해치지 않고\n\
    보조적으로 축약·분해 가능한 영어 구절\n\
- 위 두 항목은 반드시 english_verse에서 그대로 발췌한 영어 구절만 작성할 것.\n\n\
디자인 가이드 (컬러, 레이아웃)\n\
아래 형식을 반드시 그대로 따른다. (순서/레이블 고정)\n\n\
1️⃣ 문장을 디자인용 단어 단위로 해체\n\
- 원문: \"...\"\n\
- 이 문장은 디자인적으로 3개의 층으로 나눠야 한다.\n\
(A) 행위: \"...\"\n\
의미/감정 1~2줄\n\
(B) 기준: \"...\"\n\
의미/감정 1~2줄\n\
(C) 대비(부정): \"...\"\n\
의미/감정 1~2줄\n\
👉 A+B가 핵심이고, C는 배경으로 밀어낸다는 결론 1줄\n\n\
2️⃣ 단어별 시각적 역할 정의 (핵심 3개)\n\
- 🔴 \"핵심 동사/행위\": 역할/형태/위치/시각적 인상 (각 1줄)\n\
- 🔵 \"핵심 기준/대상\": 역할/형태/위치/시각적 인상 (각 1줄)\n\
- ⚪ \"배제/감쇠 구절\": 역할/형태/위치/시각적 인상 (각 1줄)\n\
* 위 3개 영어 구절은 반드시 english_verse에서 직접 발췌해 따옴표로 표기한다.\n\
* emphasis_most는 🔵 항목에 반드시 포함, emphasis_can_drop는 ⚪ 항목에 반드시 포함.\n\n\
3️⃣ 문장 구조를 디자인 구조로 재조립\n\
- 안 1: [작은 글자] / [큰 글자] / [아주 작은 글자]\n\
- 안 2: 2~3줄 변형안\n\
👉 \"문장이 아니라 신앙의 구조를 보여준다\"는 결론 1줄 포함\n\n\
4️⃣ 컬러를 의미 단위로 쓰는 법\n\
- 배경: 컬러명 + 의미\n\
- 핵심: 컬러명 + 의미\n\
- 보조: 컬러명 + 의미\n\
👉 제작도수(컬러) 설정을 반드시 반영할 것\n\n\
마지막 한 줄\n\
- \"말씀을 그림으로 재현하지 않고, 영적 위계를 시각적 위계로 번역한다.\"를 포함.\n\n\
규칙:\n\
- 한국어로만 작성한다. 영어는 따옴표 안의 발췌 구절만 허용.\n\
- ESV 영어 문장을 기준으로 줄바꿈/크기/시선 흐름을 설명한다.\n\n\
공간 속 사용 맥락\n\
- 이 포스터가 어울리는 공간\n\
- 이 문구가 가장 잘 전달될 사람 또는 상황\n\
(한글로 작성)\n\n\
기획 의도 한 줄\n\
- 전체 기획을 관통하는 의도를\n\
  한글 한 문장으로 명확히 작성할 것.\n\
- 입력 메모에 적힌 문장을 그대로 복사하지 말고 새 문장으로 쓸 것.\n\n\
────────────────────\n\n\
이 템플릿을 기준으로\n\
아래 성경 구절을 사용해 기획서를 작성하라.\n\n\
[입력 구절]\n\
- 성경 구절 (ESV): {notes}\n\n\
프로젝트 정보:\n\
- Themes list:\n{themes}\n\
- Use the provided theme exactly.\n\
- Avoid any verse references already used:\n{used}\n\
- Do NOT recommend or return any verse from the used list.\n\
- Size: {size} vertical.\n\
- Color mode: {color}\n\
- Tone keywords: {tone}\n\
- Translations: English = ESV, Korean = 개역개정\n\
- verse_reference는 반드시 한글 책 이름 형식으로만 작성 (예: 히브리서 11:1). 쉼표/마침표 금지.\n\
- verse_reference_en은 반드시 영문 책 이름 형식으로만 작성 (예: 2 Corinthians 5:7).\n\n\
반드시 JSON으로만 응답. 아래 구조를 유지:\n\
{{\n\
  \"theme_en\": \"\",\n\
  \"theme_ko\": \"\",\n\
  \"anchor_text\": \"\",\n\
  \"verse_reference\": \"\",\n\
  \"verse_reference_en\": \"\",\n\
  \"english_verse\": \"\",\n\
  \"korean_verse\": \"\",\n\
  \"meaning_core\": \"\",\n\
  \"meaning_emotion\": \"\",\n\
  \"meaning_moment\": \"\",\n\
  \"emphasis_most\": \"\",\n\
  \"emphasis_can_drop\": \"\",\n\
  \"design_guide\": \"\",\n\
  \"spatial_context\": \"\",\n\
  \"one_line_intent\": \"\"\n\
}}",
        theme = theme,
        notes = notes_text,
        themes = themes_block,
        used = used_block(used),
        size = size,
        color = color_text,
        tone = tone_text,
    )
}

/// Short-form video script prompt: question-first, no preaching, the verse
/// appears quietly near the end.
pub fn build_shorts_prompt(
    brief: &PosterBrief,
    length_seconds: &str,
    cuts_count: u32,
    extra_prompt: &str,
) -> String {
    let verse_text = if brief.korean_verse.is_empty() {
        &brief.english_verse
    } else {
        &brief.korean_verse
    };
    let extra = extra_prompt.trim();
    let extra_block = if extra.is_empty() {
        String::new()
    } else {
        format!("\n추가 요청:\n{extra}\n")
    };

    format!(
        "너는 성경 말씀을 직접 설교하지 않고,\n\
사람의 보편적인 상태와 질문을 통해\n\
조용한 울림을 만드는 숏폼 영상 감독이자 작가다.\n\n\
이 숏츠의 목표는\n\
기독교인이 아닌 사람도\n\
종교 콘텐츠라는 거부감 없이\n\
끝까지 보게 만드는 것이다.\n\n\
⚠️ 반드시 지켜야 할 원칙:\n\n\
1. 설명하지 않는다.\n\
2. 가르치지 않는다.\n\
3. 하나님, 예수, 신앙, 교회라는 단어를\n\
   본문(제목/스크립트/자막/나레이션)에 직접 사용하지 않는다.\n\
4. 질문 → 여백 → 말씀의 흐름을 따른다.\n\
5. 감정은 과장하지 않고 담담하게 유지한다.\n\
6. 정답을 제시하지 않는다.\n\
7. 성경 구절은 영상 후반부에만 조용히 등장시킨다.\n\
8. 성경 배경 설명이나 인물 소개는 절대 하지 않는다.\n\n\
────────────────────\n\n\
[입력 말씀]\n\
- 성경 구절: {verse}\n\
- 본문(개역개정 or ESV): {verse_text}\n\n\
────────────────────\n\n\
[제작 조건]\n\
- 전체 길이: {length}\n\
- 컷 수: {cuts}컷\n\
- 각 컷은 이미지 프롬프트 1개와 짝을 이룬다.\n\
{extra_block}\n\
반드시 JSON으로만 응답. 아래 구조를 유지:\n\
{{\n\
  \"title\": \"\",\n\
  \"script\": \"\",\n\
  \"image_prompts\": [\"\"]\n\
}}",
        verse = brief.verse_reference,
        verse_text = verse_text,
        length = length_seconds,
        cuts = cuts_count,
        extra_block = extra_block,
    )
}

/// Devotional blog post prompt with the fixed section flow and the closing
/// site-link paragraph.
pub fn build_blog_prompt(brief: &PosterBrief, hashtags_count: u32, site_link: &str) -> String {
    let theme_display = if brief.theme_display.is_empty() {
        &brief.theme_en
    } else {
        &brief.theme_display
    };
    let site_link = if site_link.is_empty() {
        "YOUR_LINK"
    } else {
        site_link
    };

    format!(
        "SYSTEM INSTRUCTION\n\n\
너는 신앙 묵상 기반 블로그 글을 쓰는 에디터다.\n\n\
- 입력으로 주어진 성경 구절만 사용한다.\n\
  (구절을 새로 만들거나 변경하지 않는다)\n\n\
필수 흐름:\n\
1) 본문 시작: 한글 성경 구절 1~2문장을 쌍따옴표로 한 문단\n\
2) 다음 문단: 성경 구절 표기만 단독 문단\n\
3) 배경 설명: \"배경\" 소제목 아래, 당시 상황·화자·청중 중심\n\
4) 중요성/의미 요약: \"의미\" 소제목 아래\n\
5) 묵상: \"묵상\" 소제목 아래, 함께 생각을 나누는 어조\n\
6) 속성값 정리: \"체크리스트\" 소제목 아래 \"항목: 내용\" 줄\n\
   (적용 대상 / 상황·맥락 / 핵심 메시지 / 기억할 문장 / 실천 포인트)\n\
7) Q&A: \"되짚어볼 질문\" 소제목 아래 Q./A. 3~5문항\n\
8) 요약 정리: \"요약\" 소제목 아래 불릿 3~5개\n\
9) 마지막 문단: {site}를 자연스럽게 연결한 뒤 고정 문장\n\
   \"더 많은 묵상과 영감을 원하신다면, 저희 프로젝트를 확인해 보세요.\"\n\n\
톤: 따뜻하지만 분명한 묵상체\n\
분량: 2000~3000자\n\
해시태그: {hashtags}개 (글 마지막 줄에만)\n\n\
제목 규칙:\n\
- 오늘의 말씀과 어울리는 제목을 스스로 정한다\n\
- 제목 형식은 \"말씀제목, 말씀표기\"로 한다\n\n\
자료:\n\
- 주제: {theme}\n\
- 성경 구절: {verse}\n\
- 성경 구절 (EN): {verse_en}\n\
- 본문 (개역개정): {korean}\n\
- 본문 (ESV): {english}\n\
- 앵커 텍스트: {anchor}\n\
- 기획 의도: {intent}\n\n\
반드시 JSON으로만 응답. 아래 구조를 유지:\n\
{{\n\
  \"title\": \"\",\n\
  \"body\": \"\",\n\
  \"hashtags\": \"\"\n\
}}",
        site = site_link,
        hashtags = hashtags_count,
        theme = theme_display,
        verse = brief.verse_reference,
        verse_en = brief.verse_reference_en,
        korean = brief.korean_verse,
        english = brief.english_verse,
        anchor = brief.anchor_text,
        intent = brief.one_line_intent,
    )
}

/// Two classical-painting image prompts derived from the accepted brief, one
/// per blog section.
pub fn build_image_prompts(brief: &PosterBrief) -> Vec<(String, String)> {
    let theme = if brief.theme_display.is_empty() {
        &brief.theme_en
    } else {
        &brief.theme_display
    };
    let verse_en = if brief.verse_reference_en.is_empty() {
        &brief.verse_reference
    } else {
        &brief.verse_reference_en
    };
    let scripture = if !brief.korean_verse.is_empty() {
        brief.korean_verse.clone()
    } else if !brief.english_verse.is_empty() {
        brief.english_verse.clone()
    } else {
        verse_en.clone()
    };

    let base = format!(
        "A classical-style biblical painting depicting the scene described in the scripture.\n\n\
Scripture (for scene extraction): {scripture}\n\
Verse reference: {verse_en}\n\
Theme: {theme}\n\n\
Scene description:\n\
- Time period: biblical era (Old Testament or 1st century)\n\
- Location: state the place described in the scripture\n\
- Characters: the people described in the scripture, with relationships\n\
- Action: depict the action described in the scripture\n\n\
Composition:\n\
- Perspective: medium-wide, painterly composition\n\
- Focus: the central action described in the scripture\n\
- Background: historically accurate environment of the biblical world\n\n\
Mood & lighting:\n\
- Reverent, solemn, sacred atmosphere\n\
- Soft, natural light emphasizing spiritual significance\n\
- Calm and dignified tone, no exaggerated drama\n\n\
Style:\n\
- classical religious painting\n\
- realistic anatomy and fabric\n\
- oil painting texture\n\
- muted, earthy color palette\n\
- high detail, museum-quality artwork\n\n\
Restrictions:\n\
- no modern elements\n\
- no text or inscriptions\n\
- no stylization, no cartoon\n\
- no fantasy elements"
    );

    vec![
        (
            "말씀 구절".to_string(),
            format!(
                "{base}\n\nSection focus:\nA quiet, anchored image that can sit before the verse itself.\nScene cues:\nAncient stone room at dawn, clay oil lamp, linen cloth, soft shadows."
            ),
        ),
        (
            "본론".to_string(),
            format!(
                "{base}\n\nSection focus:\nA reflective moment that deepens the theme without explaining it.\nScene cues:\nHands resting on a stone ledge, distant hills, muted sky."
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verse_prompt_lists_used_references() {
        let mut used = BTreeSet::new();
        used.insert("요한복음 3:16".to_string());
        used.insert("로마서 8:28".to_string());
        let prompt = build_verse_prompt("믿음", &used);
        assert!(prompt.contains("요한복음 3:16"));
        assert!(prompt.contains("로마서 8:28"));
        assert!(prompt.contains("\"verse_reference\""));
    }

    #[test]
    fn poster_prompt_carries_constraints() {
        let used = BTreeSet::new();
        let catalog = vec!["1. The Ground Beneath:믿음".to_string()];
        let prompt =
            build_poster_prompt("1. The Ground Beneath:믿음", "A2", "", "", &used, &catalog, "1도");
        assert!(prompt.contains("Size: A2 vertical."));
        assert!(prompt.contains("Color mode: 1도"));
        assert!(prompt.contains("(none)"));
        assert!(prompt.contains("\"one_line_intent\""));
    }

    #[test]
    fn image_prompts_fall_back_to_reference() {
        let brief = PosterBrief {
            verse_reference: "요한복음 3:16".to_string(),
            ..PosterBrief::default()
        };
        let prompts = build_image_prompts(&brief);
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].1.contains("요한복음 3:16"));
    }
}
