//! Five-axis quality scoring of a structured document.
//!
//! Every score is on the `0.0..=1.0` scale. The overall score is the weighted
//! sum of structure, content, consistency and completeness; formatting is
//! reported separately.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::classify::DocumentType;
use super::features::{extract_words, terminology_variations, DocumentFeatures};
use crate::config::QualityThresholds;
use crate::parser::blocks::{
    classify_lines, count_blocks, heading_case_is_consistent, numbering_is_sequential,
};
use crate::parser::{SectionKind, SectionMap};

/// Anything that is neither text, punctuation nor markdown syntax.
static ARTIFACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\w\s.,!?;:()\[\]{}"'«»№%/+=#*_`|>~\-–—]"#).unwrap());
static DOUBLE_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\s]  +").unwrap());
static EXTRA_BREAKS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n[ \t]*\n").unwrap());
static REPEATED_PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]{2,}").unwrap());
static UPPER_LATIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z]{3,}\b").unwrap());

const JOB_DESCRIPTION_SECTIONS: &[&str] =
    &["общие положения", "обязанности", "права", "ответственность"];
const REPORT_SECTIONS: &[&str] = &["введение", "результаты", "выводы"];
const REGULATION_SECTIONS: &[&str] = &[
    "общие положения",
    "основные понятия",
    "порядок",
    "заключительные положения",
];

/// Minimum content length for a section to count as filled.
const FILLED_SECTION_CHARS: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub overall_score: f64,
    pub structure_score: f64,
    pub content_score: f64,
    pub consistency_score: f64,
    pub completeness_score: f64,
    pub formatting_score: f64,
    pub issues: Vec<String>,
    pub critical_issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Coarse bucket recorded as `processing_quality`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    High,
    Medium,
    Low,
}

impl QualityLevel {
    pub const ALL: [QualityLevel; 3] = [QualityLevel::High, QualityLevel::Medium, QualityLevel::Low];

    /// Counts numbered sections with substantial extracted content.
    pub fn from_filled_sections(sections: &SectionMap) -> Self {
        let filled = SectionKind::NUMBERED
            .iter()
            .filter(|kind| {
                sections
                    .get(*kind)
                    .is_some_and(|c| c.trim().chars().count() > FILLED_SECTION_CHARS)
            })
            .count();
        match filled {
            n if n >= 4 => QualityLevel::High,
            n if n >= 2 => QualityLevel::Medium,
            _ => QualityLevel::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityLevel::High => "high",
            QualityLevel::Medium => "medium",
            QualityLevel::Low => "low",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QualityAssessor {
    thresholds: QualityThresholds,
}

impl QualityAssessor {
    pub fn new(thresholds: QualityThresholds) -> Self {
        QualityAssessor { thresholds }
    }

    pub fn assess(
        &self,
        text: &str,
        features: &DocumentFeatures,
        doc_type: DocumentType,
        extracted: &Map<String, Value>,
    ) -> QualityAssessment {
        let artifacts = ARTIFACT_RE.find_iter(text).count();

        let structure_score = self.structure_score(features);
        let content_score = self.content_score(features, doc_type, extracted, artifacts);
        let consistency_score = self.consistency_score(text);
        let completeness_score = completeness_score(text, doc_type, extracted);
        let formatting_score = formatting_score(text, features);

        let w = &self.thresholds.weights;
        let overall_score = structure_score * w.structure
            + content_score * w.content
            + consistency_score * w.consistency
            + completeness_score * w.completeness;

        let issues = self.issues(text, features, artifacts);
        let critical_issues = self.critical_issues(features, artifacts);
        let recommendations = self.recommendations(
            [
                structure_score,
                content_score,
                consistency_score,
                completeness_score,
                formatting_score,
            ],
            artifacts as f64 > self.artifact_limit(features, self.thresholds.max_artifact_ratio),
        );

        QualityAssessment {
            overall_score: overall_score.clamp(0.0, 1.0),
            structure_score,
            content_score,
            consistency_score,
            completeness_score,
            formatting_score,
            issues,
            critical_issues,
            recommendations,
        }
    }

    fn artifact_limit(&self, features: &DocumentFeatures, ratio: f64) -> f64 {
        features.word_count as f64 * ratio
    }

    fn structure_score(&self, f: &DocumentFeatures) -> f64 {
        let t = &self.thresholds;
        let mut score: f64 = 1.0;
        if f.heading_count == 0 {
            score -= 0.3;
        } else if (f.heading_count as f64) < f.paragraph_count as f64 / 5.0 {
            score -= 0.1;
        }
        if f.structure_complexity < t.min_structure_complexity {
            score -= 0.2;
        }
        if f.avg_sentence_length > t.max_avg_sentence_length {
            score -= 0.2;
        }
        if f.list_count == 0 && f.table_count == 0 {
            score -= 0.1;
        }
        score.max(0.0)
    }

    fn content_score(
        &self,
        f: &DocumentFeatures,
        doc_type: DocumentType,
        extracted: &Map<String, Value>,
        artifacts: usize,
    ) -> f64 {
        let t = &self.thresholds;
        let mut score: f64 = 1.0;
        if f.word_count < t.min_word_count {
            score -= 0.3;
        }
        if f.vocabulary_richness < t.min_vocabulary_richness {
            score -= 0.2;
        }
        if doc_type.is_formal() && f.formality_score < t.min_formality_score {
            score -= 0.2;
        }
        if extracted.len() < t.min_extracted_fields {
            score -= 0.2;
        }
        if artifacts as f64 > self.artifact_limit(f, t.max_artifact_ratio) {
            score -= 0.3;
        }
        score.max(0.0)
    }

    fn consistency_score(&self, text: &str) -> f64 {
        let blocks = classify_lines(text);
        let mut score: f64 = 1.0;
        if !numbering_is_sequential(&blocks) {
            score -= 0.3;
        }

        let words = extract_words(text);
        let unique = words.iter().collect::<HashSet<_>>().len();
        let variations = terminology_variations(&words);
        if variations as f64 > unique as f64 * self.thresholds.max_term_variation_ratio {
            score -= 0.2;
        }

        if !heading_case_is_consistent(&blocks) {
            score -= 0.1;
        }
        score.max(0.0)
    }

    fn issues(&self, text: &str, f: &DocumentFeatures, artifacts: usize) -> Vec<String> {
        let t = &self.thresholds;
        let mut issues = Vec::new();
        if f.heading_count == 0 {
            issues.push("Отсутствуют заголовки".to_string());
        }
        if f.avg_sentence_length > t.issue_sentence_length {
            issues.push("Слишком длинные предложения (усложняют восприятие)".to_string());
        }
        if f.paragraph_count < t.issue_min_paragraphs {
            issues.push("Недостаточное разделение на абзацы".to_string());
        }
        if f.word_count < t.issue_word_count {
            issues.push("Слишком короткий документ".to_string());
        }
        if f.vocabulary_richness < t.issue_vocabulary_richness {
            issues.push("Низкое разнообразие словаря".to_string());
        }
        if artifacts as f64 > self.artifact_limit(f, t.max_artifact_ratio) {
            issues.push(format!("Множественные артефакты конвертации ({artifacts})"));
        }
        if text.to_lowercase().contains("требует заполнения") {
            issues.push("Документ содержит незаполненные разделы".to_string());
        }
        if UPPER_LATIN_RE.is_match(text) {
            issues.push(
                "Обнаружены слова в верхнем регистре (возможно, ошибки форматирования)".to_string(),
            );
        }
        issues
    }

    fn critical_issues(&self, f: &DocumentFeatures, artifacts: usize) -> Vec<String> {
        let t = &self.thresholds;
        let mut critical = Vec::new();
        if f.word_count < t.critical_word_count {
            critical.push("Критически малый объем документа".to_string());
        }
        if f.heading_count == 0 && f.paragraph_count < t.critical_min_paragraphs {
            critical.push("Полное отсутствие структуры документа".to_string());
        }
        if artifacts as f64 > self.artifact_limit(f, t.critical_artifact_ratio) {
            critical.push("Критическое количество артефактов конвертации".to_string());
        }
        if f.vocabulary_richness < t.critical_vocabulary_richness {
            critical.push("Крайне низкое качество текста".to_string());
        }
        critical
    }

    /// `scores` in axis order: structure, content, consistency, completeness, formatting.
    fn recommendations(&self, scores: [f64; 5], artifacts: bool) -> Vec<String> {
        const ADVICE: [&[&str]; 5] = [
            &[
                "Добавьте заголовки для лучшей структуризации",
                "Разбейте длинные абзацы на более короткие",
            ],
            &[
                "Расширьте содержание документа",
                "Используйте более разнообразную лексику",
            ],
            &[
                "Проверьте согласованность терминологии",
                "Унифицируйте стиль заголовков",
            ],
            &[
                "Добавьте недостающие обязательные разделы",
                "Заполните все необходимые поля",
            ],
            &["Устраните лишние пробелы, пустые строки и повторы знаков препинания"],
        ];

        let cutoff = self.thresholds.recommendation_cutoff;
        let mut out: Vec<String> = scores
            .iter()
            .zip(ADVICE)
            .filter(|(score, _)| **score < cutoff)
            .flat_map(|(_, advice)| advice.iter().map(|s| s.to_string()))
            .collect();
        if artifacts {
            out.push("Выполните дополнительную очистку от артефактов конвертации".to_string());
        }
        if out.is_empty() {
            out.push("Документ соответствует основным требованиям качества".to_string());
        }
        out
    }
}

fn completeness_score(text: &str, doc_type: DocumentType, extracted: &Map<String, Value>) -> f64 {
    let required = match doc_type {
        DocumentType::JobDescription => JOB_DESCRIPTION_SECTIONS,
        DocumentType::Report => REPORT_SECTIONS,
        DocumentType::Regulation => REGULATION_SECTIONS,
        DocumentType::Instruction | DocumentType::Generic => {
            return match extracted.len() {
                n if n > 5 => 1.0,
                n if n > 2 => 0.8,
                n if n > 0 => 0.5,
                _ => 0.2,
            };
        }
    };
    let lower = text.to_lowercase();
    let found = required.iter().filter(|s| lower.contains(*s)).count();
    found as f64 / required.len() as f64
}

fn formatting_score(text: &str, f: &DocumentFeatures) -> f64 {
    let markdown_headings = count_blocks(&classify_lines(text)).markdown_headings;
    let defects = [
        DOUBLE_SPACE_RE.is_match(text),
        EXTRA_BREAKS_RE.is_match(text),
        markdown_headings > 0 && markdown_headings != f.heading_count,
        REPEATED_PUNCT_RE.is_match(text),
    ]
    .iter()
    .filter(|d| **d)
    .count();
    (1.0 - 0.2 * defects as f64).max(0.0)
}

// ── Tests ──
