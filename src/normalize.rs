use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static CRLF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n?").unwrap());
static ESCAPED_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\[ \t]*\n").unwrap());
static ESCAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\(\S)").unwrap());
static TRAILING_BACKSLASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)\\[ \t]*$").unwrap());
static MEDIA_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)!\[[^\]]*\]\([^)]*media/[^)]*\).*$").unwrap());
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)(?:\{[^}]*\})?").unwrap());
static TABLE_RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\+[-=:+]*\+.*$").unwrap());
static TABLE_ROW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^.*\|.*\|.*$").unwrap());
static FENCED_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)-{15,}.*?-{15,}").unwrap());
static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{15,}|_{15,}|[─━═]{15,}").unwrap());
static INLINE_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static ANY_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static FILL_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_{3,}").unwrap());

/// Legal-database boilerplate, removed before whitespace collapse.
static BOILERPLATE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?s)Документ предоставлен.*?www\.consultant\.ru[^\n]*",
        r"Дата сохранения:[^\n]*",
        r"\*\*Актуально на[^*]*\*\*",
        r"Форма:[^\n]*",
        r"\(Подготовлен для системы[^)]*\)",
        r"(?s)См\.:.*?Путеводитель[^\n]*",
        r"(?s)-- -- -+ --.*?-- -- -+ --",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

struct Pass {
    name: &'static str,
    apply: fn(&str) -> String,
}

const PASSES: &[Pass] = &[
    Pass { name: "line_endings", apply: line_endings },
    Pass { name: "escaped_breaks", apply: escaped_breaks },
    Pass { name: "media", apply: media },
    Pass { name: "boilerplate", apply: boilerplate },
    Pass { name: "tables", apply: tables },
    Pass { name: "separators", apply: separators },
    Pass { name: "whitespace", apply: whitespace },
];

/// Strip conversion artifacts and collapse whitespace.
///
/// Runs the ordered passes until the text stops changing, so
/// `normalize(normalize(x)) == normalize(x)`. No pass ever lengthens
/// the text, which bounds the loop.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let start = text.clone();
        for pass in PASSES {
            let before = text.len();
            text = (pass.apply)(&text);
            if text.len() != before {
                debug!(pass = pass.name, removed = before.saturating_sub(text.len()), "normalize");
            }
        }
        if text == start {
            return text;
        }
    }
}

/// Single-line form of a fragment: whitespace runs collapsed, fill-in
/// underscores dropped.
pub fn clean_inline(text: &str) -> String {
    let text = FILL_LINE_RE.replace_all(text, "");
    ANY_SPACE_RE.replace_all(text.trim(), " ").trim().to_string()
}

fn line_endings(text: &str) -> String {
    CRLF_RE
        .replace_all(text, "\n")
        .chars()
        .filter_map(|c| match c {
            '\u{00A0}' | '\u{202F}' => Some(' '),
            '\u{200B}' | '\u{FEFF}' => None,
            c => Some(c),
        })
        .collect()
}

fn escaped_breaks(text: &str) -> String {
    let text = ESCAPED_BREAK_RE.replace_all(text, " ");
    let text = ESCAPE_RE.replace_all(&text, "$1");
    TRAILING_BACKSLASH_RE.replace_all(&text, "").into_owned()
}

fn media(text: &str) -> String {
    let text = MEDIA_LINE_RE.replace_all(text, "");
    IMAGE_RE.replace_all(&text, "").into_owned()
}

fn boilerplate(text: &str) -> String {
    BOILERPLATE
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
}

fn tables(text: &str) -> String {
    let text = TABLE_RULE_RE.replace_all(text, "");
    TABLE_ROW_RE.replace_all(&text, "").into_owned()
}

fn separators(text: &str) -> String {
    let text = FENCED_SEPARATOR_RE.replace_all(text, "");
    SEPARATOR_RE.replace_all(&text, "").into_owned()
}

fn whitespace(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|l| INLINE_SPACE_RE.replace_all(l.trim(), " ").into_owned())
        .collect();
    let joined = lines.join("\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}

// ── Tests ──
