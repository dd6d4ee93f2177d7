//! Provenance footer appended to every processed document.
//!
//! ```text
//! <!-- METADATA
//! { ...pretty JSON... }
//! -->
//! ```
//!
//! A parseable block whose `processing_status` is `"structured"` is the only
//! signal that a file was already processed.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analysis::{
    DocumentFeatures, DocumentType, ExtractedEntities, QualityAssessment, QualityLevel, Sentiment,
};
use crate::error::Result;
use crate::parser::ProcessingLevel;

pub const PROCESSED_MARKER: &str = "structured";
pub const AUTHOR: &str = "docnorm";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BLOCK_OPEN: &str = "<!-- METADATA";
const BLOCK_CLOSE: &str = "-->";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub created_at: String,
    pub updated_at: String,
    pub author: String,
    pub version: String,
    pub processing_status: String,
    pub processing_level: ProcessingLevel,
    pub filename: String,
    pub document_type: DocumentType,
    pub position: String,
    pub department: String,
    pub processing_quality: QualityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_analysis: Option<DocumentAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_assessment: Option<QualitySummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub type_confidence: f64,
    pub features: DocumentFeatures,
    pub entities: ExtractedEntities,
    pub sentiment: Sentiment,
}

/// Scores rounded to two decimals; recommendations reduced to a count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub overall_score: f64,
    pub structure_score: f64,
    pub content_score: f64,
    pub consistency_score: f64,
    pub completeness_score: f64,
    pub formatting_score: f64,
    pub issues: Vec<String>,
    pub critical_issues_count: usize,
    pub recommendations_count: usize,
}

impl From<&QualityAssessment> for QualitySummary {
    fn from(q: &QualityAssessment) -> Self {
        QualitySummary {
            overall_score: round2(q.overall_score),
            structure_score: round2(q.structure_score),
            content_score: round2(q.content_score),
            consistency_score: round2(q.consistency_score),
            completeness_score: round2(q.completeness_score),
            formatting_score: round2(q.formatting_score),
            issues: q.issues.clone(),
            critical_issues_count: q.critical_issues.len(),
            recommendations_count: q.recommendations.len(),
        }
    }
}

impl DocumentMetadata {
    /// Basic-level metadata stamped with the current local time.
    pub fn new(
        filename: impl Into<String>,
        level: ProcessingLevel,
        document_type: DocumentType,
        position: impl Into<String>,
        department: impl Into<String>,
        processing_quality: QualityLevel,
    ) -> Self {
        let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
        DocumentMetadata {
            created_at: now.clone(),
            updated_at: now,
            author: AUTHOR.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            processing_status: PROCESSED_MARKER.to_string(),
            processing_level: level,
            filename: filename.into(),
            document_type,
            position: position.into(),
            department: department.into(),
            processing_quality,
            document_analysis: None,
            quality_assessment: None,
            extracted_data: None,
        }
    }

    /// Attach the advanced-level analysis sections.
    pub fn with_analysis(
        mut self,
        analysis: DocumentAnalysis,
        quality: &QualityAssessment,
        extracted: Map<String, Value>,
    ) -> Self {
        self.document_analysis = Some(DocumentAnalysis {
            type_confidence: round2(analysis.type_confidence),
            ..analysis
        });
        self.quality_assessment = Some(QualitySummary::from(quality));
        self.extracted_data = Some(extracted);
        self
    }

    /// Keep the creation time of an earlier pass.
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }
}

/// `content` followed by one blank line and exactly one metadata block.
pub fn write(content: &str, meta: &DocumentMetadata) -> Result<String> {
    let json = serde_json::to_string_pretty(meta)?.replace(BLOCK_CLOSE, "--\\u003e");
    Ok(format!(
        "{}\n\n{BLOCK_OPEN}\n{json}\n{BLOCK_CLOSE}\n",
        content.trim_end()
    ))
}

/// Byte range of the last block's JSON body and the block start.
fn locate(content: &str) -> Option<(usize, &str)> {
    let start = content.rfind(BLOCK_OPEN)?;
    let body_start = start + BLOCK_OPEN.len();
    let body_len = content[body_start..].find(BLOCK_CLOSE)?;
    Some((start, &content[body_start..body_start + body_len]))
}

pub fn parse(content: &str) -> Option<DocumentMetadata> {
    let (_, body) = locate(content)?;
    serde_json::from_str(body.trim()).ok()
}

/// Blocks written by other versions only need a matching status field.
pub fn is_already_processed(content: &str) -> bool {
    locate(content)
        .and_then(|(_, body)| serde_json::from_str::<Value>(body.trim()).ok())
        .and_then(|v| v.get("processing_status")?.as_str().map(|s| s == PROCESSED_MARKER))
        .unwrap_or(false)
}

/// Content without a trailing metadata block.
pub fn strip(content: &str) -> &str {
    let Some((start, body)) = locate(content) else {
        return content;
    };
    let tail_start = start + BLOCK_OPEN.len() + body.len() + BLOCK_CLOSE.len();
    if content[tail_start..].trim().is_empty() {
        content[..start].trim_end()
    } else {
        content
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DocumentMetadata {
        DocumentMetadata::new(
            "ПР Бухгалтер.md",
            ProcessingLevel::Basic,
            DocumentType::JobDescription,
            "бухгалтер",
            "финансовый_отдел",
            QualityLevel::Medium,
        )
    }

    #[test]
    fn block_layout() {
        let out = write("# Заголовок\n\nТекст\n\n\n", &sample()).unwrap();
        assert!(out.starts_with("# Заголовок\n\nТекст\n\n<!-- METADATA\n{\n"));
        assert!(out.ends_with("}\n-->\n"));
        assert_eq!(out.matches(BLOCK_OPEN).count(), 1);
        assert!(out.contains("\"processing_status\": \"structured\""));
        assert!(out.contains("\"author\": \"docnorm\""));
        assert!(!out.contains("document_analysis"));
    }

    #[test]
    fn parse_round_trip() {
        let meta = sample();
        let out = write("Текст", &meta).unwrap();
        assert_eq!(parse(&out), Some(meta));
        assert_eq!(strip(&out), "Текст");
    }

    #[test]
    fn timestamps_use_fixed_format() {
        let meta = sample();
        assert!(chrono::NaiveDateTime::parse_from_str(&meta.created_at, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(meta.created_at, meta.updated_at);
        let meta = meta.with_created_at("2024-01-02 03:04:05");
        assert_eq!(meta.created_at, "2024-01-02 03:04:05");
    }

    #[test]
    fn already_processed_detection() {
        let out = write("Текст", &sample()).unwrap();
        assert!(is_already_processed(&out));
        assert!(!is_already_processed("Текст без блока"));
        assert!(!is_already_processed(
            "Текст\n\n<!-- METADATA\n{\"processing_status\": \"draft\"}\n-->\n"
        ));
        assert!(!is_already_processed("Текст\n\n<!-- METADATA\n{не json}\n-->\n"));
        // foreign block with extra fields still counts
        assert!(is_already_processed(
            "Текст\n\n<!-- METADATA\n{\"processing_status\": \"structured\", \"x\": 1}\n-->\n"
        ));
    }

    #[test]
    fn strip_keeps_non_trailing_block() {
        let text = "<!-- METADATA\n{}\n-->\nпродолжение";
        assert_eq!(strip(text), text);
        assert_eq!(strip("без блока"), "без блока");
    }

    #[test]
    fn closing_marker_in_values_is_escaped() {
        let mut meta = sample();
        meta.position = "a --> b".into();
        let out = write("Текст", &meta).unwrap();
        assert_eq!(out.matches(BLOCK_CLOSE).count(), 1);
        assert_eq!(parse(&out).unwrap().position, "a --> b");
    }

    #[test]
    fn advanced_sections() {
        let quality = QualityAssessment {
            overall_score: 0.8567,
            recommendations: vec!["a".into(), "b".into()],
            ..QualityAssessment::default()
        };
        let analysis = DocumentAnalysis {
            doc_type: DocumentType::JobDescription,
            type_confidence: 0.333333,
            features: DocumentFeatures::default(),
            entities: ExtractedEntities::new(),
            sentiment: Sentiment::default(),
        };
        let meta = sample().with_analysis(analysis, &quality, Map::new());
        let summary = meta.quality_assessment.as_ref().unwrap();
        assert_eq!(summary.overall_score, 0.86);
        assert_eq!(summary.recommendations_count, 2);
        assert_eq!(meta.document_analysis.as_ref().unwrap().type_confidence, 0.33);

        let out = write("Текст", &meta).unwrap();
        assert!(out.contains("\"type\": \"job_description\""));
        assert_eq!(parse(&out), Some(meta));
    }
}
