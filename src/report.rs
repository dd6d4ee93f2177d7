//! Run summaries: a console block or a `processing_report.md` file.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::analysis::QualityLevel;
use crate::error::{Error, Result};
use crate::metadata::TIMESTAMP_FORMAT;
use crate::pipeline::ProcessingResults;

pub const REPORT_FILE: &str = "processing_report.md";

const SHOW_ALL_LIMIT: usize = 20;
const SHOW_EDGE: usize = 10;
const SHOW_LIST: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Print to stdout.
    #[default]
    Console,
    /// Write a markdown report file.
    File,
}

pub struct Reporter {
    generated_at: DateTime<Local>,
    update_existing: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::at(Local::now())
    }

    pub fn at(generated_at: DateTime<Local>) -> Self {
        Reporter {
            generated_at,
            update_existing: false,
        }
    }

    /// Overwrite `processing_report.md` instead of writing a timestamped copy.
    pub fn update_existing(mut self, update: bool) -> Self {
        self.update_existing = update;
        self
    }

    fn timestamp(&self) -> String {
        self.generated_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Console output returns `None`; file output returns the written path.
    pub fn generate(
        &self,
        results: &ProcessingResults,
        format: ReportFormat,
        output_dir: Option<&Path>,
    ) -> Result<Option<PathBuf>> {
        match format {
            ReportFormat::Console => {
                print!("{}", self.console_report(results));
                Ok(None)
            }
            ReportFormat::File => {
                let dir = match output_dir {
                    Some(d) => d.to_path_buf(),
                    None => std::env::current_dir().map_err(|e| Error::io(".", e))?,
                };
                fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
                let path = self.report_path(&dir);
                let content = self.markdown_report(results)?;
                fs::write(&path, content).map_err(|e| Error::io(&path, e))?;
                info!("Report saved to {}", path.display());
                Ok(Some(path))
            }
        }
    }

    pub fn report_path(&self, dir: &Path) -> PathBuf {
        let path = dir.join(REPORT_FILE);
        if path.exists() && !self.update_existing {
            let stamp = self.generated_at.format("%Y%m%d_%H%M%S");
            dir.join(format!("processing_report_{stamp}.md"))
        } else {
            path
        }
    }

    pub fn console_report(&self, r: &ProcessingResults) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "\n{rule}");
        let _ = writeln!(out, "ОТЧЕТ О ПОСТОБРАБОТКЕ ДОКУМЕНТОВ");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Время обработки: {}", self.timestamp());
        let _ = writeln!(out, "Всего файлов:    {}", r.total);
        let _ = writeln!(out, "Обработано:      {}", r.processed);
        if r.dry_run > 0 {
            let _ = writeln!(out, "  из них без записи (dry-run): {}", r.dry_run);
        }
        let _ = writeln!(out, "Пропущено:       {}", r.skipped);
        let _ = writeln!(out, "Ошибок:          {}", r.errors);
        if r.total > 0 {
            let _ = writeln!(out, "Процент успеха:  {:.1}%", r.success_rate());
        }
        if let Some(reason) = &r.refused_reason {
            let _ = writeln!(out, "\nОбработка отклонена: {reason}");
        }

        if quality_total(r) > 0 {
            let _ = writeln!(out, "\nСТАТИСТИКА КАЧЕСТВА:");
            for (level, label) in quality_labels() {
                let _ = writeln!(out, "  {label}: {} файлов", quality_count(r, level));
            }
        }

        if !r.files_errored.is_empty() {
            let _ = writeln!(out, "\nОШИБКИ ({}):", r.files_errored.len());
            for e in r.files_errored.iter().take(SHOW_LIST) {
                let _ = writeln!(out, "  - {e}");
            }
            if r.files_errored.len() > SHOW_LIST {
                let _ = writeln!(out, "  ... и еще {} ошибок", r.files_errored.len() - SHOW_LIST);
            }
        }

        let _ = writeln!(out, "\nОБЩИЙ СТАТУС: {}", status(r));
        let _ = writeln!(out, "{rule}");
        out
    }

    pub fn markdown_report(&self, r: &ProcessingResults) -> Result<String> {
        let ts = self.timestamp();
        let version = env!("CARGO_PKG_VERSION");
        let mut out = String::new();

        if self.update_existing {
            out.push_str("# Отчет о постобработке документов (обновлен)\n\n");
        } else {
            out.push_str("# Отчет о постобработке документов\n\n");
        }
        let _ = writeln!(out, "**Дата создания:** {ts}");
        let _ = writeln!(out, "**Генератор:** docnorm v{version}\n");

        out.push_str("## Краткое резюме\n\n");
        let _ = writeln!(out, "- **Успешно обработано:** {} документов", r.processed);
        if r.dry_run > 0 {
            let _ = writeln!(out, "- **Без записи (dry-run):** {}", r.dry_run);
        }
        let _ = writeln!(out, "- **Пропущено:** {} документов", r.skipped);
        let _ = writeln!(out, "- **Ошибок:** {}", r.errors);
        let _ = writeln!(out, "- **Всего файлов:** {}\n", r.total);
        let _ = writeln!(out, "**Общий статус:** {}\n", status(r));
        if r.total > 0 {
            let _ = writeln!(out, "**Процент успеха:** {:.1}%\n", r.success_rate());
        }
        if let Some(reason) = &r.refused_reason {
            let _ = writeln!(out, "**Обработка отклонена:** {reason}\n");
        }
        out.push_str("---\n\n");

        let total = quality_total(r);
        if total > 0 {
            out.push_str("## Статистика качества обработки\n\n");
            out.push_str("| Качество | Количество файлов | Процент | Описание |\n");
            out.push_str("|----------|-------------------|---------|----------|\n");
            for (level, label) in quality_labels() {
                let count = quality_count(r, level);
                let _ = writeln!(
                    out,
                    "| **{label}** | {count} | {:.1}% | {} |",
                    count as f64 / total as f64 * 100.0,
                    quality_description(level)
                );
            }
            out.push('\n');
        }

        if !r.files_processed.is_empty() {
            out.push_str("## Детали обработки\n\n### Успешно обработанные файлы\n\n");
            let n = r.files_processed.len();
            if n <= SHOW_ALL_LIMIT {
                for (i, f) in r.files_processed.iter().enumerate() {
                    let _ = writeln!(out, "{}. `{}`", i + 1, short_name(f));
                }
            } else {
                for (i, f) in r.files_processed.iter().take(SHOW_EDGE).enumerate() {
                    let _ = writeln!(out, "{}. `{}`", i + 1, short_name(f));
                }
                let _ = writeln!(out, "... (пропущено {} файлов) ...", n - 2 * SHOW_EDGE);
                for (i, f) in r.files_processed.iter().enumerate().skip(n - SHOW_EDGE) {
                    let _ = writeln!(out, "{}. `{}`", i + 1, short_name(f));
                }
            }
            out.push('\n');
        }

        if !r.files_skipped.is_empty() {
            out.push_str("### Пропущенные файлы\n\n");
            for f in r.files_skipped.iter().take(SHOW_LIST) {
                let _ = writeln!(out, "- `{}`", short_name(f));
            }
            if r.files_skipped.len() > SHOW_LIST {
                let _ = writeln!(out, "- ... и еще {} файлов", r.files_skipped.len() - SHOW_LIST);
            }
            out.push('\n');
        }

        if !r.files_errored.is_empty() {
            out.push_str("### Ошибки обработки\n\n");
            for e in r.files_errored.iter().take(SHOW_LIST) {
                let _ = writeln!(out, "- {e}");
            }
            if r.files_errored.len() > SHOW_LIST {
                let _ = writeln!(out, "- ... и еще {} ошибок", r.files_errored.len() - SHOW_LIST);
            }
            out.push('\n');
        }

        out.push_str("---\n\n## Рекомендации\n\n");
        let low = quality_count(r, QualityLevel::Low);
        if low > 0 {
            let _ = writeln!(out, "### Документы с низким качеством ({low} шт.)\n");
            out.push_str("1. Найдите документы с `\"processing_quality\": \"low\"` в метаданных\n");
            out.push_str("2. Дополните содержимое разделов вручную\n");
            out.push_str("3. Обновите метаданные после доработки\n\n");
        }
        if !r.files_errored.is_empty() {
            let _ = writeln!(out, "### Устранение ошибок ({} шт.)\n", r.files_errored.len());
            out.push_str("1. Проверьте права доступа к файлам\n");
            out.push_str("2. Убедитесь в корректности кодировки файлов (UTF-8)\n");
            out.push_str("3. Проверьте структуру исходных документов\n");
            out.push_str("4. Повторите обработку с флагом `--force`\n\n");
        }
        if low == 0 && r.files_errored.is_empty() {
            out.push_str("Дополнительных действий не требуется.\n\n");
        }

        out.push_str("---\n\n## Техническая информация\n\n");
        let _ = writeln!(out, "**Время выполнения:** {ts}");
        let _ = writeln!(out, "**Версия обработчика:** docnorm v{version}");
        out.push_str("**Формат данных:** Markdown с JSON метаданными\n\n");

        let meta = json!({
            "report_type": "processing_report",
            "generated_at": ts,
            "generator": "docnorm",
            "version": version,
            "statistics": r,
        });
        let _ = writeln!(out, "<!-- REPORT METADATA\n{}\n-->", serde_json::to_string_pretty(&meta)?);
        Ok(out)
    }
}

/// Print or save a report with the current time and no update of an existing file.
pub fn generate_report(
    results: &ProcessingResults,
    format: ReportFormat,
    output_dir: Option<&Path>,
) -> Result<Option<PathBuf>> {
    Reporter::new().generate(results, format, output_dir)
}

pub fn status(r: &ProcessingResults) -> &'static str {
    if r.errors == 0 {
        "Задача выполнена успешно"
    } else if r.processed > 0 {
        "Выполнено с предупреждениями"
    } else {
        "Выполнение не удалось"
    }
}

/// One line for logs and quiet runs.
pub fn summary_line(r: &ProcessingResults) -> String {
    if r.total == 0 {
        return "Нет файлов для обработки".to_string();
    }
    let mut line = format!("Обработка завершена: {}/{} файлов", r.processed, r.total);
    if r.skipped > 0 {
        let _ = write!(line, ", пропущено: {}", r.skipped);
    }
    if r.errors > 0 {
        let _ = write!(line, ", ошибок: {}", r.errors);
    }
    line
}

fn quality_labels() -> [(QualityLevel, &'static str); 3] {
    [
        (QualityLevel::High, "Высокое"),
        (QualityLevel::Medium, "Среднее"),
        (QualityLevel::Low, "Низкое"),
    ]
}

fn quality_description(level: QualityLevel) -> &'static str {
    match level {
        QualityLevel::High => "Все разделы заполнены структурированным содержимым",
        QualityLevel::Medium => "Большинство разделов заполнено",
        QualityLevel::Low => "Только структура, минимум содержимого",
    }
}

fn quality_count(r: &ProcessingResults, level: QualityLevel) -> usize {
    r.quality_stats.get(&level).copied().unwrap_or(0)
}

fn quality_total(r: &ProcessingResults) -> usize {
    r.quality_stats.values().sum()
}

/// Last path component of a listing entry, keeping any `: reason` suffix.
fn short_name(entry: &str) -> String {
    Path::new(entry)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.to_string())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FileOutcome;
    use chrono::TimeZone;

    fn reporter() -> Reporter {
        Reporter::at(Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap())
    }

    fn results(processed: usize, skipped: usize, errored: usize) -> ProcessingResults {
        let mut r = ProcessingResults::default();
        for i in 0..processed {
            r.record(
                Path::new(&format!("/docs/converted/f{i:02}.md")),
                FileOutcome::Processed { quality: QualityLevel::Low },
            );
        }
        for i in 0..skipped {
            r.record(
                Path::new(&format!("/docs/converted/s{i:02}.md")),
                FileOutcome::Skipped { reason: "already processed".into() },
            );
        }
        for i in 0..errored {
            r.record(
                Path::new(&format!("/docs/converted/e{i:02}.md")),
                FileOutcome::Errored { message: "permission denied".into() },
            );
        }
        r
    }

    #[test]
    fn statuses() {
        assert_eq!(status(&results(1, 0, 0)), "Задача выполнена успешно");
        assert_eq!(status(&results(1, 0, 1)), "Выполнено с предупреждениями");
        assert_eq!(status(&results(0, 0, 1)), "Выполнение не удалось");
    }

    #[test]
    fn summary() {
        assert_eq!(summary_line(&ProcessingResults::default()), "Нет файлов для обработки");
        assert_eq!(
            summary_line(&results(2, 1, 1)),
            "Обработка завершена: 2/4 файлов, пропущено: 1, ошибок: 1"
        );
    }

    #[test]
    fn console_block() {
        let out = reporter().console_report(&results(3, 1, 0));
        assert!(out.contains("Время обработки: 2024-05-06 07:08:09"));
        assert!(out.contains("Всего файлов:    4"));
        assert!(out.contains("Процент успеха:  75.0%"));
        assert!(out.contains("Низкое: 3 файлов"));
        assert!(out.contains("ОБЩИЙ СТАТУС: Задача выполнена успешно"));
    }

    #[test]
    fn long_lists_are_capped() {
        let out = reporter().markdown_report(&results(25, 12, 11)).unwrap();
        assert!(out.contains("10. `f09.md`"));
        assert!(out.contains("... (пропущено 5 файлов) ..."));
        assert!(!out.contains("`f10.md`"));
        assert!(out.contains("16. `f15.md`"));
        assert!(out.contains("25. `f24.md`"));
        assert!(out.contains("- `s09.md: already processed`"));
        assert!(out.contains("- ... и еще 2 файлов"));
        assert!(out.contains("- ... и еще 1 ошибок"));
        assert!(out.contains("### Документы с низким качеством (25 шт.)"));
    }

    #[test]
    fn report_metadata_block() {
        let out = reporter().markdown_report(&results(2, 0, 0)).unwrap();
        assert!(out.ends_with("}\n-->\n"));
        let start = out.find("<!-- REPORT METADATA\n").unwrap() + "<!-- REPORT METADATA\n".len();
        let end = out.rfind("\n-->").unwrap();
        let meta: serde_json::Value = serde_json::from_str(&out[start..end]).unwrap();
        assert_eq!(meta["generated_at"], "2024-05-06 07:08:09");
        assert_eq!(meta["statistics"]["processed"], 2);
        assert_eq!(meta["statistics"]["quality_stats"]["low"], 2);
    }

    #[test]
    fn file_report_versions_existing() {
        let dir = tempfile::tempdir().unwrap();
        let r = results(1, 0, 0);

        let first = reporter().generate(&r, ReportFormat::File, Some(dir.path())).unwrap();
        assert_eq!(first, Some(dir.path().join(REPORT_FILE)));

        let second = reporter().generate(&r, ReportFormat::File, Some(dir.path())).unwrap();
        assert_eq!(second, Some(dir.path().join("processing_report_20240506_070809.md")));

        let updated = reporter()
            .update_existing(true)
            .generate(&r, ReportFormat::File, Some(dir.path()))
            .unwrap();
        assert_eq!(updated, Some(dir.path().join(REPORT_FILE)));
        let text = fs::read_to_string(dir.path().join(REPORT_FILE)).unwrap();
        assert!(text.starts_with("# Отчет о постобработке документов (обновлен)"));
    }

    #[test]
    fn console_format_writes_nothing() {
        let out = reporter().generate(&results(1, 0, 0), ReportFormat::Console, None).unwrap();
        assert_eq!(out, None);
    }
}
