use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").unwrap());
static TITLE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^должностная\s+инструкция[\s:\-–—]*").unwrap());
static FILE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:ПР|пр)\s+").unwrap());
static NON_IDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\-]").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const DEFAULT_POSITION: &str = "специалист";
const DEFAULT_DEPARTMENT: &str = "общий_отдел";

/// Directory names that say nothing about the department.
const GENERIC_DIRS: &[&str] = &[
    "docs", "documents", "markdown", "converted", "conversion", "src", "dst", "temp", "test",
    "tests", "output", "input",
];

/// Position from the top-level title, e.g. `# Должностная инструкция: Юрист`.
pub fn position_from_title(text: &str) -> Option<String> {
    let caps = TITLE_RE.captures(text)?;
    let title = caps[1].replace("**", "");
    let title = TITLE_PREFIX_RE.replace(title.trim(), "");
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Position from a file name such as `ПР Главный бухгалтер.md`.
pub fn position_from_filename(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    let name = FILE_PREFIX_RE.replace(stem.trim(), "");
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

pub fn resolve_position(text: &str, path: &Path) -> String {
    position_from_title(text)
        .or_else(|| position_from_filename(path))
        .unwrap_or_else(|| DEFAULT_POSITION.to_string())
}

/// Lower-case identifier: whitespace to `_`, punctuation dropped.
pub fn normalize_position_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let joined = SPACE_RE.replace_all(&lower, "_");
    let ident = NON_IDENT_RE.replace_all(&joined, "");
    if ident.is_empty() {
        DEFAULT_POSITION.to_string()
    } else {
        ident.into_owned()
    }
}

/// Nearest parent directory that is not a generic container name.
pub fn department_from_path(path: &Path) -> String {
    let parents = path.parent().into_iter().flat_map(|p| p.components().rev());
    for component in parents {
        let name = component.as_os_str().to_string_lossy();
        let lower = name.to_lowercase();
        if lower.is_empty() || GENERIC_DIRS.contains(&lower.as_str()) {
            continue;
        }
        let ident = normalize_position_name(&name);
        if ident != DEFAULT_POSITION && ident.chars().any(char::is_alphanumeric) {
            return ident;
        }
    }
    DEFAULT_DEPARTMENT.to_string()
}
