//! Canonical job-description layout.
//!
//! Output order is fixed: title, document-info block, the five numbered
//! sections, an optional conclusion, and the sign-off block. Every
//! numbered section is always present; missing content becomes a
//! placeholder paragraph so the document stays structurally complete.

use std::sync::LazyLock;

use regex::Regex;

use super::sections::{is_placeholder_only, SectionKind, SectionMap};
use super::ProcessingLevel;
use crate::normalize::clean_inline;

/// `N.K.` sub-item marker; a following digit rules out dates like `03.03.2023`.
static SUB_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^|[\s(*])(\d{1,2})\.(\d{1,2})\.?(?:\s+|$)").unwrap()
});
/// `### 1.K. Title` sub-topic heading of an already structured document.
static SUBTOPIC_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^###[ \t]+1\.(\d{1,2})\.[^\n]*$").unwrap());
static EXTRA_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^1\.(\d{1,2})\.[ \t]").unwrap());
static ITEM_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-–—•*+]\s|\d{1,2}(?:\.\d{1,2})*[.)]\s)").unwrap()
});
/// Leading bullet and/or `N.` / `N.K.` number, e.g. `- 4.1. `.
static ITEM_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-–—•*+]\s*)?(?:\d{1,2}(?:\.\d{1,2})*[.)](?:\s+|$))?").unwrap()
});
/// A clause starts at a line-leading dash, or at an inline dash followed by
/// `за`. Dashes inside a clause (`- за … - в порядке …`) do not split.
static DASH_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*[-–—•][ \t]+|\s[-–—•][ \t]+(?P<za>за\b)").unwrap()
});
static CLAUSE_NOISE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,2}\.\d").unwrap());
static LIST_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)[-–—•][ \t]+|;").unwrap());
static BLANK_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

const FILL_ITEMS: [&str; 2] = [
    "`____________________________`;",
    "`____________________________`.",
];

const DEFAULT_LIABILITY: [&str; 3] = [
    "за ненадлежащее исполнение или неисполнение своих должностных обязанностей - в порядке, установленном трудовым законодательством РФ;",
    "за правонарушения, совершенные в процессе осуществления своей деятельности, - в порядке, установленном действующим законодательством РФ;",
    "за причинение материального ущерба организации - в порядке, установленном трудовым законодательством РФ.",
];

const SIGNATURES: &str = "\
### Подписи

**Руководитель структурного подразделения:** _________________ _(инициалы, фамилия)_

**Дата:** _(дата)_

### Ознакомление сотрудника

С документом ознакомлен(а), один экземпляр получил(а) на руки и обязуюсь хранить его на рабочем месте.

**Подпись сотрудника:** _________________ _(инициалы, фамилия)_

**Дата:** _(дата)_";

pub const CONCLUSION_HEADING: &str = "## 6. Заключительные положения";
pub const SIGNATURES_HEADING: &str = "## 7. Согласование и утверждение";

/// Optional values for the document-info block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub organization: Option<String>,
    pub approved_by: Option<String>,
    pub approval_date: Option<String>,
}

struct Subtopic {
    title: &'static str,
    keywords: &'static [&'static str],
    placeholder: &'static str,
}

const GENERAL_SUBTOPICS: [Subtopic; 6] = [
    Subtopic {
        title: "Категория должности",
        keywords: &["относится к категории"],
        placeholder: "_(Информация о категории должности)_",
    },
    Subtopic {
        title: "Требования к образованию и опыту",
        keywords: &["образовани", "принимается лицо", "требовани", "стаж"],
        placeholder: "_(Требования к образованию и опыту работы)_",
    },
    Subtopic {
        title: "Знания и навыки",
        keywords: &["должен знать"],
        placeholder: "_(Перечень необходимых знаний и навыков)_",
    },
    Subtopic {
        title: "Руководящие документы",
        keywords: &["руководствуется"],
        placeholder: "_(Перечень руководящих документов)_",
    },
    Subtopic {
        title: "Подчиненность",
        keywords: &["подчиняется"],
        placeholder: "_(Информация о подчиненности)_",
    },
    Subtopic {
        title: "Замещение",
        keywords: &["замещ", "отсутств", "отпуск"],
        placeholder: "_(Порядок замещения при отсутствии)_",
    },
];

pub struct DocumentStructurer {
    level: ProcessingLevel,
}

impl DocumentStructurer {
    pub fn new(level: ProcessingLevel) -> Self {
        DocumentStructurer { level }
    }

    pub fn structure(&self, sections: &SectionMap, position: &str) -> String {
        self.structure_with_info(sections, position, &DocumentInfo::default())
    }

    pub fn structure_with_info(
        &self,
        sections: &SectionMap,
        position: &str,
        info: &DocumentInfo,
    ) -> String {
        let mut parts: Vec<String> = vec![
            format!("# Должностная инструкция: {position}"),
            "## Информация о документе".to_string(),
            format!(
                "**Организация:** {}",
                fill(&info.organization, "_(наименование организации)_")
            ),
            format!(
                "**Утверждено:** {}",
                fill(&info.approved_by, "_(подпись, инициалы, фамилия руководителя)_")
            ),
            format!("**Дата утверждения:** {}", fill(&info.approval_date, "_(дата)_")),
        ];

        for kind in SectionKind::NUMBERED {
            let number = kind.number().unwrap_or_default();
            parts.push(format!("## {number}. {}", kind.title()));
            let body = match sections.get(&kind) {
                Some(content) => self.format_section(kind, content),
                None => self.missing_section(kind, position),
            };
            parts.push(body);
        }

        if let Some(conclusion) = sections.get(&SectionKind::Conclusion) {
            let body = paragraphs(conclusion);
            if !body.is_empty() {
                parts.push(CONCLUSION_HEADING.to_string());
                parts.push(body);
            }
        }

        parts.push(SIGNATURES_HEADING.to_string());
        parts.push(SIGNATURES.to_string());

        let mut out = parts.join("\n\n");
        out.push('\n');
        out
    }

    fn format_section(&self, kind: SectionKind, content: &str) -> String {
        match kind {
            SectionKind::General => self.format_general(content),
            SectionKind::Functions => format_functions(content),
            SectionKind::Duties => {
                format_enumerated(content, 3, "Сотрудник исполняет следующие обязанности:")
            }
            SectionKind::Rights => format_enumerated(content, 4, "Сотрудник имеет право:"),
            SectionKind::Responsibility => format_responsibility(content),
            SectionKind::Conclusion => paragraphs(content),
        }
    }

    fn missing_section(&self, kind: SectionKind, position: &str) -> String {
        match (self.level, kind) {
            (ProcessingLevel::Advanced, SectionKind::General) => default_general(position),
            (ProcessingLevel::Advanced, SectionKind::Functions) => {
                "_(Функции должности указываются отдельно)_".into()
            }
            (ProcessingLevel::Advanced, SectionKind::Duties) => {
                "_(Обязанности указываются отдельно)_".into()
            }
            (ProcessingLevel::Advanced, SectionKind::Rights) => {
                "_(Права указываются отдельно)_".into()
            }
            (ProcessingLevel::Advanced, SectionKind::Responsibility) => {
                "_(Виды ответственности указываются отдельно)_".into()
            }
            (ProcessingLevel::Basic, SectionKind::General) => "_(Общие положения должности)_".into(),
            (ProcessingLevel::Basic, SectionKind::Functions) => "_(Функции должности)_".into(),
            (ProcessingLevel::Basic, SectionKind::Duties) => "_(Должностные обязанности)_".into(),
            (ProcessingLevel::Basic, SectionKind::Rights) => "_(Права сотрудника)_".into(),
            (ProcessingLevel::Basic, SectionKind::Responsibility) => {
                "_(Виды ответственности)_".into()
            }
            (_, SectionKind::Conclusion) => String::new(),
        }
    }

    fn format_general(&self, content: &str) -> String {
        let plain = || {
            let body = paragraphs(content);
            if body.is_empty() {
                "_(Общие положения должности)_".to_string()
            } else {
                body
            }
        };
        if self.level == ProcessingLevel::Basic {
            return plain();
        }

        let mut items = structured_subtopics(content);
        if items.is_empty() {
            items = numbered_items(content, Some(1));
        }
        if items.is_empty() {
            return plain();
        }

        let mut blocks = Vec::new();
        for (idx, topic) in GENERAL_SUBTOPICS.iter().enumerate() {
            let minor = idx as u32 + 1;
            let text = items
                .iter()
                .filter(|(m, _)| *m == minor)
                .map(|(_, t)| t.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            blocks.push(format!("### 1.{minor}. {}", topic.title));
            blocks.push(format_subtopic(minor, topic, &text));
        }
        // sub-items beyond the known six are kept verbatim
        for (minor, text) in items.iter().filter(|(m, _)| *m as usize > GENERAL_SUBTOPICS.len()) {
            blocks.push(format!("1.{minor}. {text}"));
        }
        blocks.join("\n\n")
    }
}

fn fill(value: &Option<String>, placeholder: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}

fn format_subtopic(minor: u32, topic: &Subtopic, text: &str) -> String {
    if !text.is_empty() && is_placeholder_only(text) {
        return text.to_string();
    }
    let lower = text.to_lowercase();
    if text.is_empty() || !topic.keywords.iter().any(|k| lower.contains(k)) {
        return topic.placeholder.to_string();
    }
    match minor {
        3 => lead_in_list(text, "должен знать", "Сотрудник должен знать:"),
        4 => lead_in_list(
            text,
            "руководствуется",
            "Сотрудник в своей деятельности руководствуется:",
        ),
        _ => text.to_string(),
    }
}

/// Items following `marker` rendered as a dash list under `heading`.
fn lead_in_list(text: &str, marker: &str, heading: &str) -> String {
    let lower = text.to_lowercase();
    let Some(pos) = lower.find(marker) else {
        return text.to_string();
    };
    // `to_lowercase` keeps byte offsets for Cyrillic and ASCII
    let tail = text
        .get(pos + marker.len()..)
        .unwrap_or_default()
        .trim_start_matches([':', ' ']);

    let items: Vec<String> = LIST_SPLIT_RE
        .split(tail)
        .map(|s| clean_inline(s).trim_end_matches([';', '.', ',']).trim().to_string())
        .filter(|s| s.chars().count() > 3)
        .collect();

    if items.is_empty() {
        return text.to_string();
    }
    let list: Vec<String> = items.iter().map(|i| format!("- {i}")).collect();
    format!("{heading}\n\n{}", list.join("\n"))
}

fn format_functions(content: &str) -> String {
    let mut items = sub_items(content, 2);
    if items.is_empty() {
        items = paragraph_items(content, 5);
    }
    let list: Vec<String> = if items.is_empty() {
        FILL_ITEMS.iter().map(|i| format!("- {i}")).collect()
    } else {
        items.iter().map(|i| format!("- {i}")).collect()
    };
    format!("Основные функции:\n\n{}", list.join("\n"))
}

fn format_enumerated(content: &str, major: u32, intro: &str) -> String {
    let mut items = sub_items(content, major);
    if items.is_empty() {
        items = paragraph_items(content, 10);
    }
    let list: Vec<String> = if items.is_empty() {
        FILL_ITEMS
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {item}", i + 1))
            .collect()
    } else {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {item}", i + 1))
            .collect()
    };
    format!("{intro}\n\n{}", list.join("\n"))
}

fn format_responsibility(content: &str) -> String {
    let mut items: Vec<String> = dash_clauses(content)
        .into_iter()
        .map(clean_inline)
        .filter(|c| {
            c.chars().count() >= 10 && !CLAUSE_NOISE_RE.is_match(c) && !c.ends_with(':')
        })
        .collect();
    if items.is_empty() {
        items = sub_items(content, 5);
    }
    if items.is_empty() {
        items = DEFAULT_LIABILITY.iter().map(|s| s.to_string()).collect();
    }
    let list: Vec<String> = items.iter().map(|i| format!("- {i}")).collect();
    format!("Сотрудник привлекается к ответственности:\n\n{}", list.join("\n"))
}

fn dash_clauses(content: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut start = 0;
    for caps in DASH_CLAUSE_RE.captures_iter(content) {
        let Some(m) = caps.get(0) else { continue };
        clauses.push(&content[start..m.start()]);
        start = caps.name("za").map_or(m.end(), |za| za.start());
    }
    clauses.push(&content[start..]);
    clauses
}

/// Sub-item texts numbered under `major`; a renumbered section falls back to
/// line-leading `N.K.` markers of any major.
fn sub_items(content: &str, major: u32) -> Vec<String> {
    let mut items = numbered_items(content, Some(major));
    if items.is_empty() {
        items = numbered_items(content, None);
    }
    items.into_iter().map(|(_, t)| t).collect()
}

/// `(minor, text)` for every `major.minor.` sub-item, in source order.
/// `None` accepts any major but only at the start of a line.
fn numbered_items(content: &str, major: Option<u32>) -> Vec<(u32, String)> {
    let markers: Vec<(u32, usize, usize)> = SUB_ITEM_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            let number = caps.get(1)?;
            let found: u32 = number.as_str().parse().ok()?;
            let minor: u32 = caps[2].parse().ok()?;
            let accepted = match major {
                Some(want) => found == want,
                None => starts_line(content, number.start()),
            };
            accepted.then_some((minor, m.start(), m.end()))
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, &(minor, _, end))| {
            let stop = markers.get(i + 1).map_or(content.len(), |next| next.1);
            (minor, clean_inline(&content[end..stop]))
        })
        .filter(|(_, text)| !text.is_empty())
        .collect()
}

fn starts_line(content: &str, at: usize) -> bool {
    content[..at]
        .rsplit('\n')
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| c.is_whitespace() || c == '*')
        .is_empty()
}

/// Sub-topics read back from `### 1.K.` headings. Extra `1.K.` paragraphs
/// after a body keep their own number.
fn structured_subtopics(content: &str) -> Vec<(u32, String)> {
    let headings: Vec<(u32, usize, usize)> = SUBTOPIC_HEADING_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            Some((caps[1].parse().ok()?, m.start(), m.end()))
        })
        .collect();

    let mut items = Vec::new();
    for (i, &(minor, _, end)) in headings.iter().enumerate() {
        let stop = headings.get(i + 1).map_or(content.len(), |next| next.1);
        let body = &content[end..stop];
        let (body, extras) = match EXTRA_ITEM_RE.find(body) {
            Some(m) => (&body[..m.start()], numbered_items(&body[m.start()..], Some(1))),
            None => (body, Vec::new()),
        };
        items.push((minor, body.trim().to_string()));
        items.extend(extras);
    }
    items
}

/// Items separated by blank lines or list markers; wrapped lines are joined.
fn paragraph_items(content: &str, min_chars: usize) -> Vec<String> {
    let mut raw: Vec<String> = Vec::new();
    let mut current = String::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || ITEM_START_RE.is_match(line) {
            flush(&mut raw, &mut current);
        }
        if !line.is_empty() {
            current.push_str(line);
            current.push(' ');
        }
    }
    flush(&mut raw, &mut current);

    raw.into_iter()
        .map(|item| clean_inline(&ITEM_MARKER_RE.replace(&item, "")))
        .filter(|item| item.chars().count() > min_chars && !item.ends_with(':'))
        .collect()
}

fn flush(items: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        items.push(trimmed.to_string());
    }
    current.clear();
}

fn paragraphs(content: &str) -> String {
    BLANK_LINE_RE
        .split(content)
        .map(clean_inline)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn default_general(position: &str) -> String {
    format!(
        "\
### 1.1. Категория должности

_(Укажите категорию должности {position})_

### 1.2. Требования к образованию и опыту

_(Укажите требования к образованию и опыту для должности {position})_

### 1.3. Знания и навыки

Сотрудник должен знать:

- _(перечень необходимых знаний)_
- основы трудового законодательства
- правила внутреннего трудового распорядка
- правила охраны труда и техники безопасности

### 1.4. Руководящие документы

Сотрудник в своей деятельности руководствуется:

- настоящей должностной инструкцией
- положением о структурном подразделении
- _(иные документы)_

### 1.5. Подчиненность

_(Укажите, кому подчиняется сотрудник)_

### 1.6. Замещение

_(Порядок замещения при отсутствии сотрудника)_"
    )
}

// ── Tests ──
