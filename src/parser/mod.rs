pub mod blocks;
pub mod position;
pub mod sections;
pub mod structure;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use sections::{SectionExtractor, SectionKind, SectionMap};
pub use structure::{DocumentInfo, DocumentStructurer};

/// How hard the extractor searches and how richly the structurer formats.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingLevel {
    /// Numbered section headings only, plain paragraph formatting.
    Basic,
    /// Full pattern cascade, sub-topic formatting, rich metadata.
    #[default]
    Advanced,
}

impl ProcessingLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingLevel::Basic => "basic",
            ProcessingLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ProcessingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(ProcessingLevel::Basic),
            "advanced" => Ok(ProcessingLevel::Advanced),
            other => Err(format!("unknown processing level: {other}")),
        }
    }
}

/// Two-pass pipeline: raw text → section map → canonical document.
pub fn restructure(text: &str, position: &str, level: ProcessingLevel) -> (SectionMap, String) {
    let sections = SectionExtractor::new(level).extract_sections(text);
    let document = DocumentStructurer::new(level).structure(&sections, position);
    (sections, document)
}
