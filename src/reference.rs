use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// English -> Korean book names, keyed by the lowercased English name with
/// spaces removed ("1corinthians", "songofsolomon", ...). 66 canonical books;
/// "psalm" is an extra alias for the common singular form.
static BOOK_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("genesis", "창세기"),
        ("exodus", "출애굽기"),
        ("leviticus", "레위기"),
        ("numbers", "민수기"),
        ("deuteronomy", "신명기"),
        ("joshua", "여호수아"),
        ("judges", "사사기"),
        ("ruth", "룻기"),
        ("1samuel", "사무엘상"),
        ("2samuel", "사무엘하"),
        ("1kings", "열왕기상"),
        ("2kings", "열왕기하"),
        ("1chronicles", "역대상"),
        ("2chronicles", "역대하"),
        ("ezra", "에스라"),
        ("nehemiah", "느헤미야"),
        ("esther", "에스더"),
        ("job", "욥기"),
        ("psalms", "시편"),
        ("psalm", "시편"),
        ("proverbs", "잠언"),
        ("ecclesiastes", "전도서"),
        ("songofsolomon", "아가"),
        ("isaiah", "이사야"),
        ("jeremiah", "예레미야"),
        ("lamentations", "예레미야애가"),
        ("ezekiel", "에스겔"),
        ("daniel", "다니엘"),
        ("hosea", "호세아"),
        ("joel", "요엘"),
        ("amos", "아모스"),
        ("obadiah", "오바댜"),
        ("jonah", "요나"),
        ("micah", "미가"),
        ("nahum", "나훔"),
        ("habakkuk", "하박국"),
        ("zephaniah", "스바냐"),
        ("haggai", "학개"),
        ("zechariah", "스가랴"),
        ("malachi", "말라기"),
        ("matthew", "마태복음"),
        ("mark", "마가복음"),
        ("luke", "누가복음"),
        ("john", "요한복음"),
        ("acts", "사도행전"),
        ("romans", "로마서"),
        ("1corinthians", "고린도전서"),
        ("2corinthians", "고린도후서"),
        ("galatians", "갈라디아서"),
        ("ephesians", "에베소서"),
        ("philippians", "빌립보서"),
        ("colossians", "골로새서"),
        ("1thessalonians", "데살로니가전서"),
        ("2thessalonians", "데살로니가후서"),
        ("1timothy", "디모데전서"),
        ("2timothy", "디모데후서"),
        ("titus", "디도서"),
        ("philemon", "빌레몬서"),
        ("hebrews", "히브리서"),
        ("james", "야고보서"),
        ("1peter", "베드로전서"),
        ("2peter", "베드로후서"),
        ("1john", "요한일서"),
        ("2john", "요한이서"),
        ("3john", "요한삼서"),
        ("jude", "유다서"),
        ("revelation", "요한계시록"),
    ])
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static LATIN_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z])(\d)").unwrap());
static HANGUL_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([가-힣]+)\s*(\d)").unwrap());
static PREFIXED_BOOK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([1-3])\s*([A-Za-z]+)\s+(.+)$").unwrap());
static PLAIN_BOOK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z]+)\s+(.+)$").unwrap());
static SLUG_KEEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());

/// Canonicalizes a free-form verse citation into its stored form: Korean book
/// name, single spaces, ASCII hyphen, no spacing around the colon. English
/// book names (with an optional 1-3 prefix) are translated through the book
/// table; anything unrecognized passes through with only the cleanup applied,
/// so irregular citations still converge on one spelling. Idempotent.
pub fn normalize_ref(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let dashed = trimmed.replace('–', "-").replace('—', "-");
    let collapsed = WHITESPACE_RE.replace_all(&dashed, " ").into_owned();
    let coloned = collapsed.replace(" :", ":").replace(": ", ":");
    let stripped = coloned.trim_matches([' ', ',', '.']);
    // Split concatenated forms like "Hebrews11:1" / "히브리서11:1".
    let spaced = LATIN_DIGIT_RE.replace_all(stripped, "$1 $2").into_owned();
    let spaced = HANGUL_DIGIT_RE.replace_all(&spaced, "$1 $2").into_owned();

    if let Some(caps) = PREFIXED_BOOK_RE.captures(&spaced) {
        let key = format!("{}{}", &caps[1], caps[2].to_lowercase());
        if let Some(book) = BOOK_MAP.get(key.as_str()) {
            return join_book(book, &caps[3]);
        }
    }
    if let Some(caps) = PLAIN_BOOK_RE.captures(&spaced) {
        let key = caps[1].to_lowercase();
        if let Some(book) = BOOK_MAP.get(key.as_str()) {
            return join_book(book, &caps[2]);
        }
    }
    spaced
}

fn join_book(book: &str, rest: &str) -> String {
    let rest: String = rest
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ':' || *c == '-')
        .collect();
    format!("{} {}", book, rest).trim().to_string()
}

/// True when the text contains at least one Latin letter.
pub fn has_latin(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic())
}

/// ASCII slug for file names; falls back to "poster" when nothing survives.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let kept = SLUG_KEEP_RE.replace_all(&lower, "");
    let slug = WHITESPACE_RE
        .replace_all(kept.trim(), "-")
        .trim_matches('-')
        .to_string();
    if slug.is_empty() {
        "poster".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_english_book_names() {
        assert_eq!(normalize_ref("Hebrews 11:1"), "히브리서 11:1");
        assert_eq!(normalize_ref("John 3:16"), "요한복음 3:16");
        assert_eq!(normalize_ref("Revelation 21:4"), "요한계시록 21:4");
    }

    #[test]
    fn handles_numbered_prefixes() {
        assert_eq!(normalize_ref("1 Corinthians 13:4"), "고린도전서 13:4");
        assert_eq!(normalize_ref("2Corinthians 5:7"), "고린도후서 5:7");
        assert_eq!(normalize_ref("3 John 1:2"), "요한삼서 1:2");
    }

    #[test]
    fn splits_concatenated_citations() {
        assert_eq!(normalize_ref("Hebrews11:1"), normalize_ref("Hebrews 11:1"));
        assert_eq!(normalize_ref("히브리서11:1"), "히브리서 11:1");
    }

    #[test]
    fn cross_language_equivalence() {
        assert_eq!(normalize_ref("Hebrews 11:1"), normalize_ref("히브리서 11:1"));
        assert_eq!(normalize_ref("Psalm 23:1"), normalize_ref("시편 23:1"));
    }

    #[test]
    fn cleans_punctuation_and_dashes() {
        assert_eq!(normalize_ref("로마서 8 : 28,"), "로마서 8:28");
        assert_eq!(normalize_ref("시편 23:1–3"), "시편 23:1-3");
        assert_eq!(normalize_ref("  요한복음   3:16.  "), "요한복음 3:16");
    }

    #[test]
    fn unknown_books_pass_through_cleaned() {
        assert_eq!(normalize_ref("Wisdom 2:1"), "Wisdom 2:1");
        assert_eq!(normalize_ref(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "Hebrews11:1",
            "1 Corinthians 13:4-7",
            "히브리서 11:1",
            "시편23:1",
            "John 3 : 16.",
            "Wisdom 2:1",
            "로마서 8:28",
        ];
        for sample in samples {
            let once = normalize_ref(sample);
            assert_eq!(normalize_ref(&once), once, "not idempotent for {sample}");
        }
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("The Ground Beneath"), "the-ground-beneath");
        assert_eq!(slugify("요한복음 3-16"), "3-16");
        assert_eq!(slugify("***"), "poster");
    }

    #[test]
    fn latin_detection() {
        assert!(has_latin("so loved"));
        assert!(!has_latin("하나님이 세상을"));
        assert!(!has_latin(""));
    }
}
