use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;

use docnorm::config::Settings;
use docnorm::metadata;
use docnorm::normalize::normalize;
use docnorm::parser::ProcessingLevel;
use docnorm::report::{summary_line, ReportFormat, Reporter};
use docnorm::{Pipeline, ProcessOptions};

#[derive(Parser)]
#[command(
    name = "docnorm",
    version,
    about = "Normalize converted job descriptions into one canonical structure"
)]
struct Cli {
    /// Settings file (TOML); DOCNORM_* variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Structure every matching file below a directory, in place
    Process {
        dir: PathBuf,
        /// Reprocess marked files and skip the safe-directory check
        #[arg(long)]
        force: bool,
        /// Run every stage but write nothing
        #[arg(long)]
        dry_run: bool,
        /// File-name glob, matched recursively
        #[arg(short, long, default_value = "*.md")]
        pattern: String,
        #[arg(long, value_enum, default_value_t = ProcessingLevel::Advanced)]
        level: ProcessingLevel,
        /// Skip files that do not read like a job description
        #[arg(long)]
        require_job_like: bool,
        /// Process files on all cores
        #[arg(long)]
        parallel: bool,
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        report: ReportFormat,
        /// Where the report file goes (default: current directory)
        #[arg(long)]
        report_dir: Option<PathBuf>,
        /// Overwrite processing_report.md instead of writing a timestamped copy
        #[arg(long)]
        update_report: bool,
    },
    /// Classify and score one file without writing it
    Analyze {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = ProcessingLevel::Advanced)]
        level: ProcessingLevel,
    },
    /// Print the normalized text of one file
    Clean { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process {
            dir,
            force,
            dry_run,
            pattern,
            level,
            require_job_like,
            parallel,
            report,
            report_dir,
            update_report,
        } => {
            let settings = load_settings(cli.config.as_deref())?;
            let options = ProcessOptions {
                force,
                dry_run,
                pattern,
                level,
                require_job_like,
                parallel,
                show_progress: true,
            };
            let pipeline = Pipeline::new(settings, options)?;
            let results = pipeline
                .process_directory(&dir)
                .with_context(|| format!("Failed to process {}", dir.display()))?;

            let saved = Reporter::new()
                .update_existing(update_report)
                .generate(&results, report, report_dir.as_deref())
                .context("Failed to write report")?;
            if let Some(path) = saved {
                println!("Report saved to {}", path.display());
            }
            println!("{}", summary_line(&results));
            Ok(())
        }
        Commands::Analyze { file, level } => {
            let settings = load_settings(cli.config.as_deref())?;
            let options = ProcessOptions {
                level,
                ..ProcessOptions::default()
            };
            let pipeline = Pipeline::new(settings, options)?;
            let raw = read_file(&file)?;
            let t = pipeline.transform(&raw, &file)?;
            let summary = json!({
                "file": file.display().to_string(),
                "already_processed": metadata::is_already_processed(&raw),
                "document_type": t.doc_type,
                "confidence": t.confidence,
                "position": t.metadata.position,
                "department": t.metadata.department,
                "processing_quality": t.metadata.processing_quality,
                "sections": t.sections.keys().map(|k| k.key()).collect::<Vec<_>>(),
                "quality": t.assessment,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Clean { file } => {
            let raw = read_file(&file)?;
            println!("{}", normalize(metadata::strip(&raw)));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    Settings::load(path).context("Failed to load settings")
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
