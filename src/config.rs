//! Tunable constants for the pipeline.
//!
//! Every threshold, weight and policy list used by the analysis stages
//! lives here. Defaults reproduce the stock behaviour; a TOML file and
//! `DOCNORM_*` environment variables can override any field, e.g.
//! `DOCNORM_QUALITY__MIN_WORD_COUNT=40`.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: QualityThresholds,
    pub classifier: ClassifierWeights,
    pub policy: PolicySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    pub min_word_count: usize,
    pub max_avg_sentence_length: f64,
    pub min_vocabulary_richness: f64,
    pub min_structure_complexity: f64,
    pub min_formality_score: f64,
    pub min_extracted_fields: usize,
    /// Artifact characters per word above which content is penalized.
    pub max_artifact_ratio: f64,
    pub max_term_variation_ratio: f64,
    /// Sub-scores below this produce recommendations.
    pub recommendation_cutoff: f64,

    pub issue_word_count: usize,
    pub critical_word_count: usize,
    pub issue_sentence_length: f64,
    pub issue_min_paragraphs: usize,
    pub critical_min_paragraphs: usize,
    pub issue_vocabulary_richness: f64,
    pub critical_vocabulary_richness: f64,
    pub critical_artifact_ratio: f64,

    pub weights: ScoreWeights,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        QualityThresholds {
            min_word_count: 50,
            max_avg_sentence_length: 25.0,
            min_vocabulary_richness: 0.3,
            min_structure_complexity: 0.1,
            min_formality_score: 0.2,
            min_extracted_fields: 3,
            max_artifact_ratio: 0.05,
            max_term_variation_ratio: 0.1,
            recommendation_cutoff: 0.7,
            issue_word_count: 100,
            critical_word_count: 20,
            issue_sentence_length: 30.0,
            issue_min_paragraphs: 3,
            critical_min_paragraphs: 2,
            issue_vocabulary_richness: 0.2,
            critical_vocabulary_richness: 0.1,
            critical_artifact_ratio: 0.1,
            weights: ScoreWeights::default(),
        }
    }
}

/// Weights of the four axes in the overall score. Formatting is reported
/// on its own and has no weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub structure: f64,
    pub content: f64,
    pub consistency: f64,
    pub completeness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            structure: 0.25,
            content: 0.35,
            consistency: 0.20,
            completeness: 0.20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierWeights {
    pub strong_keyword: u32,
    pub supporting_keyword: u32,
    /// Multi-word phrases that pin a type, e.g. "общие положения".
    pub key_phrase: u32,
    pub entity_bonus: u32,
    pub list_bonus: u32,
    /// Instructions get `list_bonus` once they have more list items than this.
    pub list_bonus_threshold: usize,
    pub confidence_divisor: f64,
    pub generic_confidence: f64,
}

impl Default for ClassifierWeights {
    fn default() -> Self {
        ClassifierWeights {
            strong_keyword: 20,
            supporting_keyword: 10,
            key_phrase: 15,
            entity_bonus: 15,
            list_bonus: 10,
            list_bonus_threshold: 5,
            confidence_divisor: 50.0,
            generic_confidence: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    /// A directory is processed without `--force` only if its path
    /// contains one of these names.
    pub safe_markers: Vec<String>,
    /// Files below a directory with one of these names are never touched.
    pub protected_dirs: Vec<String>,
    /// Case-insensitive regexes matched against the file name.
    pub protected_names: Vec<String>,
    pub markup_extensions: Vec<String>,
    /// Shorter texts never pass the job-description gate.
    pub job_like_min_chars: usize,
}

impl Default for PolicySettings {
    fn default() -> Self {
        let strings = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        PolicySettings {
            safe_markers: strings(&[
                "Conversion",
                "converted",
                "documents",
                "markdown",
                "temp",
                "test",
            ]),
            protected_dirs: strings(&[
                ".git",
                ".svn",
                ".hg",
                "node_modules",
                "venv",
                ".venv",
                "__pycache__",
                "target",
                "documentation_management",
            ]),
            protected_names: strings(&[
                r"^readme(\..*)?$",
                r"^changelog(\..*)?$",
                r"^license(\..*)?$",
                r"^processing_report.*\.md$",
            ]),
            markup_extensions: strings(&["md", "markdown"]),
            job_like_min_chars: 100,
        }
    }
}

impl Settings {
    /// Defaults, then the optional file, then `DOCNORM_*` variables.
    pub fn load(file: Option<&Path>) -> Result<Settings> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings: Settings = builder
            .add_source(
                config::Environment::with_prefix("DOCNORM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let q = &self.quality;
        let ratios = [
            ("quality.min_vocabulary_richness", q.min_vocabulary_richness),
            ("quality.min_structure_complexity", q.min_structure_complexity),
            ("quality.min_formality_score", q.min_formality_score),
            ("quality.max_artifact_ratio", q.max_artifact_ratio),
            ("quality.max_term_variation_ratio", q.max_term_variation_ratio),
            ("quality.recommendation_cutoff", q.recommendation_cutoff),
            ("quality.critical_artifact_ratio", q.critical_artifact_ratio),
            ("classifier.generic_confidence", self.classifier.generic_confidence),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Configuration(format!(
                    "{name} must be within 0.0..=1.0, got {value}"
                )));
            }
        }

        let w = &q.weights;
        let total = w.structure + w.content + w.consistency + w.completeness;
        if [w.structure, w.content, w.consistency, w.completeness]
            .iter()
            .any(|x| *x < 0.0)
            || total <= 0.0
        {
            return Err(Error::Configuration(
                "quality.weights must be non-negative with a positive sum".into(),
            ));
        }

        if self.classifier.confidence_divisor <= 0.0 {
            return Err(Error::Configuration(
                "classifier.confidence_divisor must be positive".into(),
            ));
        }
        if self.policy.markup_extensions.is_empty() {
            return Err(Error::Configuration(
                "policy.markup_extensions must not be empty".into(),
            ));
        }

        self.policy.compile_protected_names()?;
        Ok(())
    }
}

impl PolicySettings {
    pub fn compile_protected_names(&self) -> Result<Vec<Regex>> {
        self.protected_names
            .iter()
            .map(|p| {
                Regex::new(&format!("(?i){p}")).map_err(|e| {
                    Error::Configuration(format!("invalid protected name pattern {p:?}: {e}"))
                })
            })
            .collect()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn bad_protected_pattern_is_configuration_error() {
        let mut settings = Settings::default();
        settings.policy.protected_names.push("([unclosed".into());
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn ratio_out_of_range_rejected() {
        let mut settings = Settings::default();
        settings.quality.recommendation_cutoff = 7.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docnorm.toml");
        std::fs::write(
            &path,
            "[quality]\nmin_word_count = 40\n\n[classifier]\nstrong_keyword = 25\n",
        )
        .unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.quality.min_word_count, 40);
        assert_eq!(settings.classifier.strong_keyword, 25);
        // untouched fields keep their defaults
        assert_eq!(settings.classifier.supporting_keyword, 10);
        assert_eq!(settings.policy.markup_extensions, vec!["md", "markdown"]);
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/docnorm.toml"))).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
