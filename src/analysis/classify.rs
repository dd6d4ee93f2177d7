use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::features::{DocumentFeatures, ExtractedEntities};
use crate::config::ClassifierWeights;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^#\s+(?:должностная\s+инструкция[:\s]*)?(.+)$").unwrap()
});
static FUNCTIONS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"функции[:\s]*").unwrap());
static PERIOD_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"за\s+(\d{4})\s+год",
        r"за\s+([а-яёa-z]+\s+\d{4})",
        r"период[:\s]*([^\n]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static STRONG_JOB_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)должностн\w*\s+инструкци\w*",
        r"(?i)общие положения",
        r"(?i)должностные обязанности",
        r"(?i)функции.*должности",
        r"(?i)права.*работника",
        r"(?i)ответственность.*работника",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});
static WEAK_JOB_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)подчиняется",
        r"(?i)имеет право",
        r"(?i)несет ответственность",
        r"(?i)трудовой договор",
        r"(?i)рабочее место",
        r"(?i)квалификационные требования",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    JobDescription,
    Report,
    Regulation,
    Instruction,
    Generic,
}

impl DocumentType {
    /// Evaluation order; ties resolve to the earlier entry.
    pub const ORDER: [DocumentType; 5] = [
        DocumentType::JobDescription,
        DocumentType::Report,
        DocumentType::Regulation,
        DocumentType::Instruction,
        DocumentType::Generic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::JobDescription => "job_description",
            DocumentType::Report => "report",
            DocumentType::Regulation => "regulation",
            DocumentType::Instruction => "instruction",
            DocumentType::Generic => "generic",
        }
    }

    /// Types that are expected to read as formal administrative prose.
    pub fn is_formal(self) -> bool {
        matches!(self, DocumentType::JobDescription | DocumentType::Regulation)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeClassifier {
    weights: ClassifierWeights,
}

impl TypeClassifier {
    pub fn new(weights: ClassifierWeights) -> Self {
        TypeClassifier { weights }
    }

    /// Best-scoring type and its confidence in `0.0..=1.0`.
    pub fn classify(
        &self,
        text: &str,
        features: &DocumentFeatures,
        entities: &ExtractedEntities,
    ) -> (DocumentType, f64) {
        let mut best = (DocumentType::Generic, 0u32);
        for ty in DocumentType::ORDER {
            let score = self.score(ty, text, features, entities);
            if score > best.1 {
                best = (ty, score);
            }
        }

        match best {
            (_, 0) => (DocumentType::Generic, self.weights.generic_confidence),
            (ty, score) => (ty, (score as f64 / self.weights.confidence_divisor).min(1.0)),
        }
    }

    pub fn score(
        &self,
        ty: DocumentType,
        text: &str,
        features: &DocumentFeatures,
        entities: &ExtractedEntities,
    ) -> u32 {
        let w = &self.weights;
        let lower = text.to_lowercase();
        let has = |needle: &str| lower.contains(needle);
        let non_empty = |class: &str| entities.get(class).is_some_and(|v| !v.is_empty());
        let hits = |needles: &[&str]| needles.iter().filter(|n| has(n)).count() as u32;

        match ty {
            DocumentType::JobDescription => {
                let mut score = 0;
                if has("должностн") && has("инструкци") {
                    score += w.strong_keyword;
                }
                score += hits(&["обязанности", "права", "ответственность"]) * w.supporting_keyword;
                if non_empty("positions") {
                    score += w.entity_bonus;
                }
                score
            }
            DocumentType::Report => {
                let mut score = 0;
                if has("отчет") || has("отчёт") {
                    score += w.strong_keyword;
                }
                score += hits(&["результат", "анализ", "вывод"]) * w.supporting_keyword;
                if non_empty("dates") {
                    score += w.entity_bonus;
                }
                score
            }
            DocumentType::Regulation => {
                let mut score = 0;
                if has("положени") {
                    score += w.strong_keyword;
                }
                if has("общие положения") {
                    score += w.key_phrase;
                }
                if has("цели") && has("задачи") {
                    score += w.supporting_keyword;
                }
                score
            }
            DocumentType::Instruction => {
                let mut score = 0;
                if has("инструкци") && !has("должностн") {
                    score += w.strong_keyword;
                }
                score += hits(&["порядок", "алгоритм"]) * w.supporting_keyword;
                if features.list_count > w.list_bonus_threshold {
                    score += w.list_bonus;
                }
                score
            }
            DocumentType::Generic => 0,
        }
    }
}

/// Content gate for directories that mix job descriptions with other files.
pub fn is_job_like(text: &str, min_chars: usize) -> bool {
    if text.chars().count() < min_chars {
        return false;
    }
    let strong = STRONG_JOB_RES.iter().filter(|re| re.is_match(text)).count();
    if strong >= 3 {
        return true;
    }
    let weak = WEAK_JOB_RES.iter().filter(|re| re.is_match(text)).count();
    strong >= 1 && weak >= 2
}

/// Key fields for the detected type, merged with every non-empty entity class.
pub fn extract_structured_data(
    text: &str,
    doc_type: DocumentType,
    entities: &ExtractedEntities,
) -> Map<String, Value> {
    let mut data = Map::new();
    for (class, values) in entities {
        if !values.is_empty() {
            data.insert(class.clone(), Value::from(values.clone()));
        }
    }

    let lower = text.to_lowercase();
    match doc_type {
        DocumentType::JobDescription => {
            if let Some(caps) = TITLE_RE.captures(text) {
                let title = caps[1].trim();
                if !title.is_empty() {
                    data.insert("position".into(), Value::from(title));
                }
            }
            if let Some(m) = FUNCTIONS_RE.find(&lower) {
                let rest = &lower[m.end()..];
                let end = [rest.find("\n\n"), rest.find("\n##")]
                    .into_iter()
                    .flatten()
                    .min()
                    .unwrap_or(rest.len());
                let functions = rest[..end].trim();
                if !functions.is_empty() {
                    data.insert("functions".into(), Value::from(functions));
                }
            }
        }
        DocumentType::Report => {
            let period = PERIOD_RES
                .iter()
                .find_map(|re| re.captures(&lower).map(|c| c[1].trim().to_string()));
            if let Some(period) = period.filter(|p| !p.is_empty()) {
                data.insert("report_period".into(), Value::from(period));
            }
        }
        DocumentType::Regulation | DocumentType::Instruction | DocumentType::Generic => {}
    }
    data
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::{extract, extract_entities};

    fn classify(text: &str) -> (DocumentType, f64) {
        TypeClassifier::default().classify(text, &extract(text), &extract_entities(text))
    }

    #[test]
    fn job_description() {
        let text = "Должностная инструкция бухгалтера. Обязанности, права и ответственность.";
        let (ty, confidence) = classify(text);
        assert_eq!(ty, DocumentType::JobDescription);
        // 20 + 3 * 10 + 15 positions
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn report() {
        let (ty, confidence) = classify("Отчет о работе. Результат и выводы.");
        assert_eq!(ty, DocumentType::Report);
        assert!((confidence - 40.0 / 50.0).abs() < 1e-9);
    }

    #[test]
    fn regulation() {
        let (ty, _) = classify("Положение об отделе. Общие положения. Цели и задачи отдела.");
        assert_eq!(ty, DocumentType::Regulation);
    }

    #[test]
    fn instruction_with_many_lists() {
        let text = "Инструкция по охране труда. Порядок действий:\n- а\n- б\n- в\n- г\n- д\n- е";
        let (ty, confidence) = classify(text);
        assert_eq!(ty, DocumentType::Instruction);
        assert!((confidence - 40.0 / 50.0).abs() < 1e-9);
    }

    #[test]
    fn nothing_matches_is_generic() {
        assert_eq!(classify("Some unrelated text"), (DocumentType::Generic, 0.1));
        assert_eq!(classify(""), (DocumentType::Generic, 0.1));
    }

    #[test]
    fn tie_goes_to_earlier_type() {
        // report: "отчет" 20; instruction: "инструкция" 20
        let (ty, _) = classify("отчет инструкция");
        assert_eq!(ty, DocumentType::Report);
    }

    #[test]
    fn deterministic() {
        let text = "Должностная инструкция менеджера. Порядок работы. Отчет.";
        let first = classify(text);
        for _ in 0..10 {
            assert_eq!(classify(text), first);
        }
    }

    #[test]
    fn custom_weights() {
        let weights = ClassifierWeights {
            strong_keyword: 50,
            ..ClassifierWeights::default()
        };
        let text = "отчет";
        let (ty, confidence) =
            TypeClassifier::new(weights).classify(text, &extract(text), &extract_entities(text));
        assert_eq!(ty, DocumentType::Report);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&DocumentType::JobDescription).unwrap(),
            "\"job_description\""
        );
        assert_eq!(DocumentType::Generic.to_string(), "generic");
    }

    #[test]
    fn job_like_gate() {
        let strong = "ДОЛЖНОСТНАЯ ИНСТРУКЦИЯ главного бухгалтера\n\n1. Общие положения\n\
                      Текст общих положений достаточно длинный.\n2. Должностные обязанности\n\
                      Ведет учет.";
        assert!(is_job_like(strong, 100));

        let weak = "Общие положения. Работник подчиняется директору и имеет право на отпуск. \
                    Дополнительный текст для длины документа, чтобы пройти порог.";
        assert!(is_job_like(weak, 100));

        assert!(!is_job_like("Должностная инструкция. Общие положения.", 100));
        let readme = "Это описание проекта, которое не похоже на должностную инструкцию \
                      вообще никак, но оно достаточно длинное, чтобы пройти порог длины.";
        assert!(!is_job_like(readme, 100));
    }

    #[test]
    fn structured_data_for_job_description() {
        let text = "# Должностная инструкция: Главный бухгалтер\n\n## 2. Функции\n\nУчет и отчетность\n\n## 3. Обязанности";
        let entities = extract_entities(text);
        let data = extract_structured_data(text, DocumentType::JobDescription, &entities);
        assert_eq!(data["position"], "Главный бухгалтер");
        assert_eq!(data["functions"], "учет и отчетность");
        assert!(data.contains_key("positions"));
        assert!(!data.contains_key("dates"));
    }

    #[test]
    fn structured_data_for_report() {
        let text = "Отчет за 2023 год";
        let data = extract_structured_data(text, DocumentType::Report, &extract_entities(text));
        assert_eq!(data["report_period"], "2023");
        assert_eq!(data["numbers"], serde_json::json!(["2023"]));
    }
}
