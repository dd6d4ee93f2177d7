//! Directory runs: discover, gate, transform, persist, tally.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::analysis::classify::{extract_structured_data, is_job_like};
use crate::analysis::features::{analyze_sentiment, extract, extract_entities};
use crate::analysis::{DocumentType, QualityAssessment, QualityAssessor, QualityLevel, TypeClassifier};
use crate::config::Settings;
use crate::discover::{self, FilePolicy};
use crate::error::{Error, Result};
use crate::metadata::{self, DocumentAnalysis, DocumentMetadata};
use crate::normalize::normalize;
use crate::parser::position::{department_from_path, normalize_position_name, resolve_position};
use crate::parser::{restructure, ProcessingLevel, SectionMap};

const CHUNK_SIZE: usize = 64;

pub const SKIP_ALREADY_PROCESSED: &str = "already processed";
pub const SKIP_NOT_JOB_LIKE: &str = "not a job description";
pub const SKIP_UNSAFE_DIRECTORY: &str = "unsafe directory";

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Reprocess marked files and ignore the safe-directory policy.
    pub force: bool,
    /// Run every stage but write nothing.
    pub dry_run: bool,
    /// File-name glob, matched recursively.
    pub pattern: String,
    pub level: ProcessingLevel,
    /// Skip files that do not read like a job description.
    pub require_job_like: bool,
    /// Process each chunk on the rayon pool (needs the `rayon` feature).
    pub parallel: bool,
    pub show_progress: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        ProcessOptions {
            force: false,
            dry_run: false,
            pattern: "*.md".to_string(),
            level: ProcessingLevel::default(),
            require_job_like: false,
            parallel: false,
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Processed { quality: QualityLevel },
    DryRun { quality: QualityLevel },
    Skipped { reason: String },
    Errored { message: String },
}

/// Per-run tally. `processed + skipped + errors == total` always holds.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResults {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub total: usize,
    /// Processed entries that were not written.
    pub dry_run: usize,
    pub files_processed: Vec<String>,
    pub files_skipped: Vec<String>,
    pub files_errored: Vec<String>,
    pub quality_stats: BTreeMap<QualityLevel, usize>,
    pub refused_reason: Option<String>,
}

impl Default for ProcessingResults {
    fn default() -> Self {
        ProcessingResults {
            processed: 0,
            skipped: 0,
            errors: 0,
            total: 0,
            dry_run: 0,
            files_processed: Vec::new(),
            files_skipped: Vec::new(),
            files_errored: Vec::new(),
            quality_stats: QualityLevel::ALL.iter().map(|q| (*q, 0)).collect(),
            refused_reason: None,
        }
    }
}

impl ProcessingResults {
    pub fn record(&mut self, path: &Path, outcome: FileOutcome) {
        let shown = path.display();
        self.total += 1;
        match outcome {
            FileOutcome::Processed { quality } => {
                self.processed += 1;
                self.files_processed.push(shown.to_string());
                *self.quality_stats.entry(quality).or_default() += 1;
            }
            FileOutcome::DryRun { quality } => {
                self.processed += 1;
                self.dry_run += 1;
                self.files_processed.push(format!("{shown} (dry-run)"));
                *self.quality_stats.entry(quality).or_default() += 1;
            }
            FileOutcome::Skipped { reason } => {
                self.skipped += 1;
                self.files_skipped.push(format!("{shown}: {reason}"));
            }
            FileOutcome::Errored { message } => {
                self.errors += 1;
                self.files_errored.push(format!("{shown}: {message}"));
            }
        }
    }

    /// Processed share of all matched files, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.processed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Everything one file turns into, before anything is written.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub document: String,
    pub metadata: DocumentMetadata,
    pub sections: SectionMap,
    pub doc_type: DocumentType,
    pub confidence: f64,
    pub assessment: QualityAssessment,
}

pub struct Pipeline {
    settings: Settings,
    options: ProcessOptions,
    policy: FilePolicy,
    classifier: TypeClassifier,
    assessor: QualityAssessor,
}

impl Pipeline {
    pub fn new(settings: Settings, options: ProcessOptions) -> Result<Self> {
        settings.validate()?;
        glob::Pattern::new(&options.pattern).map_err(|source| Error::Pattern {
            pattern: options.pattern.clone(),
            source,
        })?;
        if options.parallel && !cfg!(feature = "rayon") {
            warn!("built without the rayon feature, processing sequentially");
        }

        Ok(Pipeline {
            policy: FilePolicy::from_settings(&settings.policy)?,
            classifier: TypeClassifier::new(settings.classifier.clone()),
            assessor: QualityAssessor::new(settings.quality.clone()),
            settings,
            options,
        })
    }

    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    pub fn process_directory(&self, dir: &Path) -> Result<ProcessingResults> {
        let files = discover::find_files(dir, &self.options.pattern)?;
        let mut results = ProcessingResults::default();

        if !self.options.force && !self.policy.is_safe_directory(dir) {
            warn!("Refusing to process {}: not a conversion directory", dir.display());
            results.refused_reason = Some(format!(
                "{} is not a recognized conversion directory (use --force to override)",
                dir.display()
            ));
            for path in &files {
                results.record(
                    path,
                    FileOutcome::Skipped {
                        reason: SKIP_UNSAFE_DIRECTORY.to_string(),
                    },
                );
            }
            return Ok(results);
        }

        info!(
            files = files.len(),
            level = %self.options.level,
            dry_run = self.options.dry_run,
            "Processing {}",
            dir.display()
        );
        let pb = self.progress_bar(files.len());
        for chunk in files.chunks(CHUNK_SIZE) {
            let outcomes = self.run_chunk(dir, chunk);
            for (path, outcome) in chunk.iter().zip(outcomes) {
                results.record(path, outcome);
            }
            pb.inc(chunk.len() as u64);
        }
        pb.finish_and_clear();

        info!(
            processed = results.processed,
            skipped = results.skipped,
            errors = results.errors,
            "Run complete"
        );
        Ok(results)
    }

    #[cfg(feature = "rayon")]
    fn run_chunk(&self, root: &Path, chunk: &[PathBuf]) -> Vec<FileOutcome> {
        if self.options.parallel {
            chunk.par_iter().map(|p| self.process_in(root, p)).collect()
        } else {
            chunk.iter().map(|p| self.process_in(root, p)).collect()
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn run_chunk(&self, root: &Path, chunk: &[PathBuf]) -> Vec<FileOutcome> {
        chunk.iter().map(|p| self.process_in(root, p)).collect()
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    /// Single file, with protected directories checked from its parent.
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        let root = path.parent().unwrap_or(Path::new(""));
        self.process_in(root, path)
    }

    fn process_in(&self, root: &Path, path: &Path) -> FileOutcome {
        match self.try_process(root, path) {
            Ok(outcome) => {
                debug!(path = %path.display(), ?outcome, "done");
                outcome
            }
            Err(e) => {
                warn!("{}: {e}", path.display());
                FileOutcome::Errored { message: e.reason() }
            }
        }
    }

    fn try_process(&self, root: &Path, path: &Path) -> Result<FileOutcome> {
        if let Some(reason) = self.policy.protection_reason(root, path) {
            return Ok(FileOutcome::Skipped { reason });
        }

        let raw = read_text(path)?;
        if !self.options.force && metadata::is_already_processed(&raw) {
            return Ok(FileOutcome::Skipped {
                reason: SKIP_ALREADY_PROCESSED.to_string(),
            });
        }
        if self.options.require_job_like
            && !is_job_like(metadata::strip(&raw), self.settings.policy.job_like_min_chars)
        {
            return Ok(FileOutcome::Skipped {
                reason: SKIP_NOT_JOB_LIKE.to_string(),
            });
        }

        let transformed = self.transform(&raw, path)?;
        let quality = transformed.metadata.processing_quality;
        if self.options.dry_run {
            return Ok(FileOutcome::DryRun { quality });
        }

        write_atomic(path, &transformed.document)?;
        info!(
            path = %path.display(),
            doc_type = %transformed.doc_type,
            quality = %quality,
            "Structured"
        );
        Ok(FileOutcome::Processed { quality })
    }

    /// Pure transformation of file content; `path` only feeds naming.
    pub fn transform(&self, raw: &str, path: &Path) -> Result<Transformed> {
        let level = self.options.level;
        let previous = metadata::parse(raw);
        let text = normalize(metadata::strip(raw));

        let features = extract(&text);
        let entities = extract_entities(&text);
        let (doc_type, confidence) = self.classifier.classify(&text, &features, &entities);
        let extracted = extract_structured_data(&text, doc_type, &entities);

        let position = resolve_position(&text, path);
        let (sections, structured) = restructure(&text, &position, level);

        let assessment =
            self.assessor
                .assess(&structured, &extract(&structured), doc_type, &extracted);
        let quality = QualityLevel::from_filled_sections(&sections);

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut meta = DocumentMetadata::new(
            filename,
            level,
            doc_type,
            normalize_position_name(&position),
            department_from_path(path),
            quality,
        );
        if level == ProcessingLevel::Advanced {
            let analysis = DocumentAnalysis {
                doc_type,
                type_confidence: confidence,
                sentiment: analyze_sentiment(&text),
                features,
                entities,
            };
            meta = meta.with_analysis(analysis, &assessment, extracted);
        }
        if let Some(prev) = previous {
            meta = meta.with_created_at(prev.created_at);
        }

        let document = metadata::write(&structured, &meta)?;
        Ok(Transformed {
            document,
            metadata: meta,
            sections,
            doc_type,
            confidence,
            assessment,
        })
    }
}

/// Process `dir` with default settings and the advanced level.
pub fn process_directory(
    dir: &Path,
    force: bool,
    dry_run: bool,
    pattern: &str,
) -> Result<ProcessingResults> {
    let options = ProcessOptions {
        force,
        dry_run,
        pattern: pattern.to_string(),
        ..ProcessOptions::default()
    };
    Pipeline::new(Settings::default(), options)?.process_directory(dir)
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    String::from_utf8(bytes).map_err(|_| Error::Encoding {
        path: path.to_path_buf(),
    })
}

/// Temp file in the target's directory, persisted over the target.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| Error::io(tmp.path(), e))?;
    if let Ok(meta) = fs::metadata(path) {
        // keep the original mode instead of the temp file's 0600
        if let Err(e) = fs::set_permissions(tmp.path(), meta.permissions()) {
            warn!("{}: could not keep file permissions: {e}", path.display());
        }
    }
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Temp root with a `converted` directory inside, which passes the
    /// safe-directory check.
    fn workspace() -> (TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("converted");
        fs::create_dir(&dir).unwrap();
        (tmp, dir)
    }

    fn numbered_headings(doc: &str) -> usize {
        doc.lines()
            .filter(|l| {
                l.strip_prefix("## ")
                    .and_then(|rest| rest.chars().next())
                    .is_some_and(|c| c.is_ascii_digit())
            })
            .count()
    }

    fn assert_counts(r: &ProcessingResults, matched: usize) {
        assert_eq!(r.processed + r.skipped + r.errors, r.total);
        assert_eq!(r.total, matched);
    }

    #[test]
    fn bare_document_end_to_end() {
        let (_tmp, dir) = workspace();
        let file = dir.join("doc.md");
        fs::write(&file, "# Bare Title\n\nSome unrelated text with no sections.").unwrap();

        let first = process_directory(&dir, false, false, "*.md").unwrap();
        assert_eq!(first.processed, 1);
        assert_counts(&first, 1);

        let doc = fs::read_to_string(&file).unwrap();
        assert!(doc.starts_with("# Должностная инструкция: Bare Title\n\n## Информация о документе"));
        assert_eq!(numbered_headings(&doc), 6);
        assert!(doc.contains("## 7. Согласование и утверждение"));
        assert_eq!(doc.matches("<!-- METADATA").count(), 1);
        assert!(doc.contains("\"processing_status\": \"structured\""));

        let second = process_directory(&dir, false, false, "*.md").unwrap();
        assert_eq!(second.processed, 0);
        assert_eq!(second.skipped, 1);
        assert!(second.files_skipped[0].ends_with(SKIP_ALREADY_PROCESSED));
        assert_eq!(fs::read_to_string(&file).unwrap(), doc);
    }

    #[test]
    fn force_rewrites_single_block_and_keeps_created_at() {
        let (_tmp, dir) = workspace();
        let file = dir.join("doc.md");
        fs::write(&file, "# Bare Title\n\nSome unrelated text with no sections.").unwrap();
        process_directory(&dir, false, false, "*.md").unwrap();
        let first = metadata::parse(&fs::read_to_string(&file).unwrap()).unwrap();

        let forced = process_directory(&dir, true, false, "*.md").unwrap();
        assert_eq!(forced.processed, 1);
        let doc = fs::read_to_string(&file).unwrap();
        assert_eq!(doc.matches("<!-- METADATA").count(), 1);
        let second = metadata::parse(&doc).unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.position, "bare_title");
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_tmp, dir) = workspace();
        let file = dir.join("doc.md");
        fs::write(&file, "old").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o640)).unwrap();

        write_atomic(&file, "new").unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "new");
        assert_eq!(fs::metadata(&file).unwrap().permissions().mode() & 0o777, 0o640);
    }

    #[test]
    fn forced_reprocess_keeps_document_body() {
        let (_tmp, dir) = workspace();
        let single = dir.join("ПР Юрист.md");
        fs::write(
            &single,
            "# Юрист\n\n5. Ответственность\nЮрист несет ответственность за ненадлежащее исполнение обязанностей - в порядке, установленном законодательством.",
        )
        .unwrap();
        let full = dir.join("ПР Бухгалтер.md");
        fs::copy("tests/fixtures/buhgalter.md", &full).unwrap();

        process_directory(&dir, false, false, "*.md").unwrap();
        let first: Vec<String> = [&single, &full]
            .iter()
            .map(|f| fs::read_to_string(f).unwrap())
            .collect();

        let forced = process_directory(&dir, true, false, "*.md").unwrap();
        assert_eq!(forced.processed, 2);
        for (file, before) in [&single, &full].iter().zip(&first) {
            let after = fs::read_to_string(file).unwrap();
            assert_eq!(metadata::strip(&after), metadata::strip(before));
            assert_eq!(after.matches("**Руководитель структурного подразделения:**").count(), 1);
            assert!(!after.contains("- _(Функции"));
            assert!(!after.contains(" ###"));
        }

        let doc = &first[0];
        assert!(doc.contains(
            "- Юрист несет ответственность за ненадлежащее исполнение обязанностей - в порядке, установленном законодательством."
        ));
        assert!(doc.contains("## 2. Функции\n\n_(Функции должности указываются отдельно)_"));
    }

    #[test]
    fn protected_files_untouched_even_with_force() {
        let (_tmp, dir) = workspace();
        fs::create_dir(dir.join(".git")).unwrap();
        let readme = dir.join("README.md");
        let hidden = dir.join(".git/notes.md");
        fs::write(&readme, "# Readme").unwrap();
        fs::write(&hidden, "# Notes").unwrap();
        fs::write(dir.join("doc.md"), "# Юрист\n\nТекст.").unwrap();

        for force in [false, true] {
            let r = process_directory(&dir, force, false, "*.md").unwrap();
            assert_counts(&r, 3);
            assert!(r.files_skipped.iter().any(|s| s.contains("README.md")));
            assert!(r.files_skipped.iter().any(|s| s.contains("protected directory .git")));
            assert_eq!(fs::read_to_string(&readme).unwrap(), "# Readme");
            assert_eq!(fs::read_to_string(&hidden).unwrap(), "# Notes");
        }
    }

    #[test]
    fn unsafe_directory_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("doc.md");
        fs::write(&file, "# Title").unwrap();

        let mut settings = Settings::default();
        settings.policy.safe_markers = vec!["no-such-marker-anywhere".into()];
        let pipeline = Pipeline::new(settings.clone(), ProcessOptions::default()).unwrap();
        let r = pipeline.process_directory(tmp.path()).unwrap();
        assert_eq!(r.skipped, 1);
        assert!(r.files_skipped[0].ends_with(SKIP_UNSAFE_DIRECTORY));
        assert!(r.refused_reason.is_some());
        assert_eq!(fs::read_to_string(&file).unwrap(), "# Title");

        let forced = ProcessOptions {
            force: true,
            ..ProcessOptions::default()
        };
        let r = Pipeline::new(settings, forced).unwrap().process_directory(tmp.path()).unwrap();
        assert_eq!(r.processed, 1);
        assert!(r.refused_reason.is_none());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let (_tmp, dir) = workspace();
        let file = dir.join("doc.md");
        fs::write(&file, "# Title\n\nТекст").unwrap();
        let r = process_directory(&dir, false, true, "*.md").unwrap();
        assert_eq!((r.processed, r.dry_run), (1, 1));
        assert!(r.files_processed[0].ends_with("(dry-run)"));
        assert_eq!(fs::read_to_string(&file).unwrap(), "# Title\n\nТекст");
    }

    #[test]
    fn unreadable_file_is_an_error_entry() {
        let (_tmp, dir) = workspace();
        fs::write(dir.join("bad.md"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
        fs::write(dir.join("good.md"), "# Title").unwrap();
        let r = process_directory(&dir, false, false, "*.md").unwrap();
        assert_counts(&r, 2);
        assert_eq!((r.processed, r.errors), (1, 1));
        assert!(r.files_errored[0].contains("bad.md: file is not valid UTF-8"));
        assert_eq!(fs::read(dir.join("bad.md")).unwrap(), vec![0xff, 0xfe, 0x00, 0x41]);
    }

    #[test]
    fn job_like_gate_skips_other_documents() {
        let (_tmp, dir) = workspace();
        fs::write(dir.join("notes.md"), "Some unrelated text with no sections.").unwrap();
        let options = ProcessOptions {
            require_job_like: true,
            ..ProcessOptions::default()
        };
        let r = Pipeline::new(Settings::default(), options)
            .unwrap()
            .process_directory(&dir)
            .unwrap();
        assert_eq!(r.skipped, 1);
        assert!(r.files_skipped[0].ends_with(SKIP_NOT_JOB_LIKE));
    }

    #[test]
    fn missing_directory_fails_the_run() {
        let err = process_directory(Path::new("/no/such/converted"), false, false, "*.md").unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound(_)));
    }

    #[test]
    fn invalid_pattern_rejected_up_front() {
        let options = ProcessOptions {
            pattern: "[".into(),
            ..ProcessOptions::default()
        };
        assert!(matches!(
            Pipeline::new(Settings::default(), options),
            Err(Error::Pattern { .. })
        ));
    }

    #[test]
    fn fixture_in_department_directory() {
        let (_tmp, dir) = workspace();
        let dept = dir.join("Финансовый отдел");
        fs::create_dir(&dept).unwrap();
        let file = dept.join("ПР Бухгалтер.md");
        fs::copy("tests/fixtures/buhgalter.md", &file).unwrap();

        let r = process_directory(&dir, false, false, "*.md").unwrap();
        assert_eq!(r.processed, 1);
        assert_eq!(r.quality_stats[&QualityLevel::High], 1);

        let doc = fs::read_to_string(&file).unwrap();
        assert!(doc.starts_with("# Должностная инструкция: Бухгалтер\n"));
        assert!(doc.contains("### 1.5. Подчиненность\n\nБухгалтер подчиняется непосредственно главному бухгалтеру."));
        assert!(doc.contains("Основные функции:\n\n- Ведение бухгалтерского учета имущества, обязательств и хозяйственных операций."));
        assert!(doc.contains("Сотрудник исполняет следующие обязанности:\n\n1. Принимает"));
        assert!(doc.contains("3. Участвует в проведении инвентаризаций"));
        assert!(doc.contains("- за причинение материального ущерба организации."));
        assert!(!doc.contains("consultant.ru"));

        let meta = metadata::parse(&doc).unwrap();
        assert_eq!(meta.document_type, DocumentType::JobDescription);
        assert_eq!(meta.department, "финансовый_отдел");
        assert_eq!(meta.position, "бухгалтер");
        assert_eq!(meta.processing_quality, QualityLevel::High);
        assert!(meta.quality_assessment.is_some());
        assert!(meta.document_analysis.is_some());
    }

    #[test]
    fn basic_level_metadata_is_lean() {
        let (_tmp, dir) = workspace();
        let file = dir.join("doc.md");
        fs::write(&file, "# Title\n\nТекст").unwrap();
        let options = ProcessOptions {
            level: ProcessingLevel::Basic,
            ..ProcessOptions::default()
        };
        Pipeline::new(Settings::default(), options)
            .unwrap()
            .process_directory(&dir)
            .unwrap();
        let meta = metadata::parse(&fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(meta.processing_level, ProcessingLevel::Basic);
        assert!(meta.document_analysis.is_none());
        assert!(meta.extracted_data.is_none());
    }

    #[test]
    fn parallel_matches_sequential_order() {
        let (_tmp, dir) = workspace();
        for name in ["a.md", "b.md", "c.md"] {
            fs::write(dir.join(name), "# Title\n\nТекст").unwrap();
        }
        let options = ProcessOptions {
            parallel: true,
            dry_run: true,
            ..ProcessOptions::default()
        };
        let r = Pipeline::new(Settings::default(), options)
            .unwrap()
            .process_directory(&dir)
            .unwrap();
        assert_eq!(r.processed, 3);
        let names: Vec<_> = r
            .files_processed
            .iter()
            .map(|s| s.rsplit('/').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, ["a.md (dry-run)", "b.md (dry-run)", "c.md (dry-run)"]);
    }

    #[test]
    fn results_serialize_to_plain_mapping() {
        let mut r = ProcessingResults::default();
        r.record(Path::new("a.md"), FileOutcome::Processed { quality: QualityLevel::Low });
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["processed"], 1);
        assert_eq!(json["quality_stats"]["low"], 1);
        assert_eq!(json["quality_stats"]["high"], 0);
        assert!((r.success_rate() - 100.0).abs() < 1e-9);
    }
}
