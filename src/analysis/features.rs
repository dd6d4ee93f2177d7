use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parser::blocks::{classify_lines, count_blocks};

static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[#*_`\[\](){}]").unwrap());
static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[а-яёa-z]+").unwrap());
static SENTENCE_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());
static PARAGRAPH_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());
static MULTILEVEL_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+").unwrap());
static ARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"статья|пункт|подпункт|раздел|глава").unwrap());
static FORMAL_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"должностная инструкция|положение|регламент|приказ").unwrap());

static DATE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b\d{1,2}\.\d{1,2}\.\d{4}\b",
        r"(?i)\b\d{1,2}\s+(?:января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря)\s+\d{4}",
        r"\b\d{4}\s*г\.",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});
static ORG_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b[А-ЯЁ][а-яё]+\s+[А-ЯЁ][а-яё]+\s+[А-ЯЁ][а-яё]+",
        r#"\b(?:ООО|ЗАО|ОАО|ПАО|АО)\s+["«][^"»]+["»]"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});
static POSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:[а-яё]+\s+)?[а-яё]*(?:директор|менеджер|специалист|инженер|бухгалтер|секретар|администратор|консультант|аналитик)[а-яё]*",
    )
    .unwrap()
});
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").unwrap());

const STOP_WORDS: &[&str] = &[
    "и", "в", "на", "с", "по", "для", "от", "до", "при", "за", "под", "над", "между", "через",
    "без", "про", "против", "около", "возле", "что", "как", "где", "когда", "почему", "зачем",
    "который", "какой", "чей", "сколько", "насколько", "откуда", "куда", "отсюда", "туда",
    "здесь", "там", "везде", "нигде", "всюду", "не", "ни", "да", "нет", "или", "либо", "то",
    "если", "хотя", "чтобы", "пока", "пусть", "будто", "словно", "точно", "именно", "его",
    "она", "они", "это", "также",
];

const FORMAL_INDICATORS: &[&str] = &[
    "согласно", "в соответствии", "на основании", "в целях", "с целью", "в связи", "в рамках",
    "посредством", "путем", "в ходе", "в процессе", "настоящий", "данный", "указанный",
    "вышеуказанный", "нижеследующий", "должен", "обязан", "вправе", "имеет право",
    "несет ответственность", "осуществляет", "обеспечивает", "контролирует", "утверждает",
];

const POSITIVE_WORDS: &[&str] = &[
    "хорошо", "отлично", "успешно", "эффективно", "качественно", "положительно", "улучшение",
    "развитие", "достижение",
];

const NEGATIVE_WORDS: &[&str] = &[
    "плохо", "неудовлетворительно", "проблема", "ошибка", "недостаток", "нарушение",
    "отрицательно", "ухудшение", "снижение",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFeatures {
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub heading_count: usize,
    pub list_count: usize,
    pub table_count: usize,
    /// Whitespace-separated tokens per sentence.
    pub avg_sentence_length: f64,
    pub vocabulary_richness: f64,
    pub structure_complexity: f64,
    pub formality_score: f64,
}

/// Coarse named entities keyed by class. All four classes are always present.
pub type ExtractedEntities = BTreeMap<String, Vec<String>>;

pub const ENTITY_CLASSES: [&str; 4] = ["dates", "organizations", "positions", "numbers"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl Default for Sentiment {
    fn default() -> Self {
        Sentiment {
            positive: 0.0,
            negative: 0.0,
            neutral: 1.0,
        }
    }
}

pub fn extract(text: &str) -> DocumentFeatures {
    let words = extract_words(text);
    let sentences = extract_sentences(text);
    let paragraph_count = PARAGRAPH_SPLIT_RE
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .count();
    let counts = count_blocks(&classify_lines(text));

    let word_count = words.len();
    let sentence_count = sentences.len();
    let avg_sentence_length = if sentence_count > 0 {
        sentences.iter().map(|s| s.split_whitespace().count()).sum::<usize>() as f64
            / sentence_count as f64
    } else {
        0.0
    };
    let vocabulary_richness = if word_count > 0 {
        words.iter().collect::<HashSet<_>>().len() as f64 / word_count as f64
    } else {
        0.0
    };

    DocumentFeatures {
        word_count,
        sentence_count,
        paragraph_count,
        heading_count: counts.headings,
        list_count: counts.lists,
        table_count: counts.tables,
        avg_sentence_length,
        vocabulary_richness,
        structure_complexity: structure_complexity(
            counts.headings,
            counts.lists,
            counts.tables,
            paragraph_count,
        ),
        formality_score: formality_score(text, word_count),
    }
}

/// Lower-cased alphabetic tokens longer than two characters, stop words removed.
pub fn extract_words(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let clean = MARKUP_RE.replace_all(&lower, " ");
    let clean = URL_RE.replace_all(&clean, " ");
    WORD_RE
        .find_iter(&clean)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn extract_sentences(text: &str) -> Vec<&str> {
    SENTENCE_SPLIT_RE
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() >= 10)
        .collect()
}

fn structure_complexity(headings: usize, lists: usize, tables: usize, paragraphs: usize) -> f64 {
    if paragraphs == 0 {
        return 0.0;
    }
    let ratio = |n: usize| (n as f64 / paragraphs as f64).min(1.0);
    (ratio(headings) * 0.4 + ratio(lists) * 0.3 + ratio(tables) * 0.3).min(1.0)
}

fn formality_score(text: &str, word_count: usize) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    let lower = text.to_lowercase();
    let hits: usize = FORMAL_INDICATORS
        .iter()
        .map(|ind| lower.matches(ind).count())
        .sum();

    let mut score = hits as f64 / word_count as f64;
    if MULTILEVEL_NUMBER_RE.is_match(text) {
        score += 0.1;
    }
    if ARTICLE_RE.is_match(&lower) {
        score += 0.1;
    }
    if FORMAL_TYPE_RE.is_match(&lower) {
        score += 0.1;
    }
    score.min(1.0)
}

/// Independent pattern passes per class; overlaps between classes are kept.
pub fn extract_entities(text: &str) -> ExtractedEntities {
    let mut entities: ExtractedEntities = ENTITY_CLASSES
        .iter()
        .map(|c| (c.to_string(), Vec::new()))
        .collect();

    let lower = text.to_lowercase();
    let passes: [(&str, Vec<(usize, String)>); 4] = [
        ("dates", find_all(&DATE_RES, text)),
        ("organizations", find_all(&ORG_RES, text)),
        (
            "positions",
            POSITION_RE
                .find_iter(&lower)
                .map(|m| (m.start(), m.as_str().trim().to_string()))
                .collect(),
        ),
        (
            "numbers",
            NUMBER_RE
                .find_iter(text)
                .map(|m| (m.start(), m.as_str().to_string()))
                .collect(),
        ),
    ];

    for (class, mut found) in passes {
        found.sort_by_key(|(pos, _)| *pos);
        if let Some(list) = entities.get_mut(class) {
            list.extend(found.into_iter().map(|(_, s)| s));
        }
    }
    entities
}

fn find_all(patterns: &[Regex], text: &str) -> Vec<(usize, String)> {
    patterns
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| (m.start(), m.as_str().trim().to_string())))
        .collect()
}

/// Share of positive and negative dictionary words among all extracted words.
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let words = extract_words(text);
    if words.is_empty() {
        return Sentiment::default();
    }
    let positive = words.iter().filter(|w| POSITIVE_WORDS.contains(&w.as_str())).count();
    let negative = words.iter().filter(|w| NEGATIVE_WORDS.contains(&w.as_str())).count();
    let total = words.len() as f64;

    let positive = positive as f64 / total;
    let negative = negative as f64 / total;
    Sentiment {
        positive,
        negative,
        neutral: (1.0 - positive - negative).max(0.0),
    }
}

/// Long words with a near-duplicate (one contains the other, lengths
/// within two characters) elsewhere in the vocabulary.
pub fn terminology_variations(words: &[String]) -> usize {
    let vocab: Vec<&str> = {
        let mut seen = HashSet::new();
        words
            .iter()
            .map(String::as_str)
            .filter(|w| seen.insert(*w))
            .collect()
    };
    vocab
        .iter()
        .filter(|&&w| {
            let len = w.chars().count();
            len > 4
                && vocab.iter().any(|&other| {
                    other != w
                        && (other.contains(w) || w.contains(other))
                        && len.abs_diff(other.chars().count()) <= 2
                })
        })
        .count()
}

// ── Tests ──
