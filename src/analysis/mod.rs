pub mod classify;
pub mod features;
pub mod quality;

pub use classify::{DocumentType, TypeClassifier};
pub use features::{DocumentFeatures, ExtractedEntities, Sentiment};
pub use quality::{QualityAssessment, QualityAssessor, QualityLevel};
