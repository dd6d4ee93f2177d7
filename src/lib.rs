//! Post-conversion normalization of Russian job-description documents.
//!
//! Markdown produced by a DOCX converter is cleaned, classified, cut into
//! sections and rebuilt into one canonical layout with a metadata footer.

pub mod analysis;
pub mod config;
pub mod discover;
pub mod error;
pub mod metadata;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod report;

pub use error::{Error, Result};
pub use pipeline::{process_directory, Pipeline, ProcessOptions, ProcessingResults};
pub use report::{generate_report, ReportFormat};
