use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::ProcessingLevel;

/// Start of the next top-level section: a markdown or bold heading with a
/// single-level number, any `#`/`##` heading, or a plain `N. <known title>`
/// line. Sub-items such as `1.1.` never match.
static BOUNDARY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?m)^[ \t]*#{1,6}[ \t]*\d{1,2}\.?[ \t]+\S",
        r"(?m)^[ \t]*#{1,2}[ \t]+\S",
        r"(?m)^[ \t]*\*\*[ \t]*\d{1,2}\.[ \t]",
        r"(?mi)^[ \t]*\d{1,2}\.[ \t]*(?:общие положения|основные функции|функции|должностные обязанности|обязанности|права|ответственность|заключительные положения)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static CLOSING_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"─", r"(?i)с документом", r"(?i)лист ознакомления"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_\([^)\n]*\)_").unwrap());
static HEADING_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[^\n]*$").unwrap());

static RULES: LazyLock<Vec<SectionRule>> = LazyLock::new(build_rules);

/// True when nothing but `_(…)_` fill-in markers and headings is left,
/// as in the placeholder bodies of an already structured document.
pub(crate) fn is_placeholder_only(text: &str) -> bool {
    let text = PLACEHOLDER_RE.replace_all(text, "");
    let text = HEADING_LINE_RE.replace_all(&text, "");
    !text.chars().any(char::is_alphanumeric)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    General,
    Functions,
    Duties,
    Rights,
    Responsibility,
    Conclusion,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::General,
        SectionKind::Functions,
        SectionKind::Duties,
        SectionKind::Rights,
        SectionKind::Responsibility,
        SectionKind::Conclusion,
    ];

    /// The five sections every canonical document carries.
    pub const NUMBERED: [SectionKind; 5] = [
        SectionKind::General,
        SectionKind::Functions,
        SectionKind::Duties,
        SectionKind::Rights,
        SectionKind::Responsibility,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SectionKind::General => "general",
            SectionKind::Functions => "functions",
            SectionKind::Duties => "duties",
            SectionKind::Rights => "rights",
            SectionKind::Responsibility => "responsibility",
            SectionKind::Conclusion => "conclusion",
        }
    }

    pub fn number(self) -> Option<u8> {
        match self {
            SectionKind::General => Some(1),
            SectionKind::Functions => Some(2),
            SectionKind::Duties => Some(3),
            SectionKind::Rights => Some(4),
            SectionKind::Responsibility => Some(5),
            SectionKind::Conclusion => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::General => "Общие положения",
            SectionKind::Functions => "Функции",
            SectionKind::Duties => "Должностные обязанности",
            SectionKind::Rights => "Права",
            SectionKind::Responsibility => "Ответственность",
            SectionKind::Conclusion => "Заключительные положения",
        }
    }

    /// Regex alternatives for the section title as it appears in sources.
    fn title_pattern(self) -> &'static str {
        match self {
            SectionKind::General => r"общие\s+положения",
            SectionKind::Functions => r"(?:основные\s+)?функции",
            SectionKind::Duties => r"(?:должностные\s+)?обязанности",
            SectionKind::Rights => r"права",
            SectionKind::Responsibility => r"ответственность",
            SectionKind::Conclusion => r"заключительные\s+положения",
        }
    }

    /// Lead-in phrase used when the section has no heading at all.
    fn phrase_pattern(self) -> Option<&'static str> {
        match self {
            SectionKind::General => None,
            SectionKind::Functions => Some(r"(?i)основные\s+функции\s*:"),
            SectionKind::Duties => Some(r"(?i)(?:исполняет|выполняет)\s+следующие\s+(?:должностные\s+)?обязанности\s*:"),
            SectionKind::Rights => Some(r"(?i)имеет\s+право\s*:"),
            SectionKind::Responsibility => Some(r"(?i)(?:привлекается\s+к|несет)\s+ответственност[ьи]\s*:?"),
            SectionKind::Conclusion => None,
        }
    }

    fn stops_at_closing(self) -> bool {
        matches!(self, SectionKind::Responsibility | SectionKind::Conclusion)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw text per section; a missing key means the section was not found.
pub type SectionMap = BTreeMap<SectionKind, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// `**N. Title**`
    Bold,
    /// `N. Title` at line start, optionally behind `#`.
    Numbered,
    /// Title heading with any number, or a lead-in phrase anywhere.
    Keyword,
}

impl Tier {
    fn enabled_for(self, level: ProcessingLevel) -> bool {
        match level {
            ProcessingLevel::Basic => matches!(self, Tier::Bold | Tier::Numbered),
            ProcessingLevel::Advanced => true,
        }
    }
}

#[derive(Debug)]
pub struct SectionRule {
    pub kind: SectionKind,
    pub tier: Tier,
    start: Regex,
    /// Stop on the next section keyword heading rather than only numbered ones.
    extra_stops: bool,
}

impl SectionRule {
    /// Text from the end of the start match up to the nearest boundary.
    fn capture<'a>(&self, text: &'a str) -> Option<&'a str> {
        let m = self.start.find(text)?;
        let rest = &text[m.end()..];

        let mut end = rest.len();
        let mut stops: Vec<&Regex> = BOUNDARY_RES.iter().collect();
        if self.kind.stops_at_closing() {
            stops.extend(CLOSING_RES.iter());
        }
        for re in stops {
            if let Some(b) = re.find(rest) {
                end = end.min(b.start());
            }
        }
        if self.extra_stops {
            for re in keyword_heading_stops(self.kind) {
                if let Some(b) = re.find(rest) {
                    end = end.min(b.start());
                }
            }
        }

        let captured = rest[..end].trim();
        (!is_placeholder_only(captured)).then_some(captured)
    }
}

static KEYWORD_HEADINGS: LazyLock<Vec<(SectionKind, Regex)>> = LazyLock::new(|| {
    SectionKind::ALL
        .iter()
        .map(|&kind| {
            let pattern = format!(
                r"(?mi)^[ \t]*(?:#{{1,6}}[ \t]*)?(?:\*\*)?[ \t]*(?:\d{{1,2}}\.)?[ \t]*{}\b",
                kind.title_pattern()
            );
            (kind, Regex::new(&pattern).unwrap())
        })
        .collect()
});

fn keyword_heading_stops(kind: SectionKind) -> impl Iterator<Item = &'static Regex> {
    KEYWORD_HEADINGS
        .iter()
        .filter(move |(k, _)| *k != kind)
        .map(|(_, re)| re)
}

fn build_rules() -> Vec<SectionRule> {
    let mut rules = Vec::new();
    for kind in SectionKind::ALL {
        let title = kind.title_pattern();
        let number = kind
            .number()
            .map(|n| n.to_string())
            .unwrap_or_else(|| r"\d{1,2}".to_string());

        rules.push(SectionRule {
            kind,
            tier: Tier::Bold,
            start: Regex::new(&format!(
                r"(?mi)^[ \t]*\*\*[ \t]*{number}\.[ \t]*{title}[^*\n]*\*\*[:.]?"
            ))
            .unwrap(),
            extra_stops: false,
        });
        rules.push(SectionRule {
            kind,
            tier: Tier::Numbered,
            start: Regex::new(&format!(
                r"(?mi)^[ \t]*(?:#{{1,6}}[ \t]*)?{number}\.[ \t]*{title}\b[^\n]*"
            ))
            .unwrap(),
            extra_stops: false,
        });
        rules.push(SectionRule {
            kind,
            tier: Tier::Keyword,
            start: Regex::new(&format!(
                r"(?mi)^[ \t]*(?:#{{1,6}}[ \t]*)?(?:\*\*)?[ \t]*(?:\d{{1,2}}\.)?[ \t]*{title}\b[^\n]*"
            ))
            .unwrap(),
            extra_stops: true,
        });
        if let Some(phrase) = kind.phrase_pattern() {
            rules.push(SectionRule {
                kind,
                tier: Tier::Keyword,
                start: Regex::new(phrase).unwrap(),
                extra_stops: true,
            });
        }
    }
    rules
}

/// Ordered pattern cascade per section, filtered by processing level.
pub struct SectionExtractor {
    level: ProcessingLevel,
}

impl SectionExtractor {
    pub fn new(level: ProcessingLevel) -> Self {
        SectionExtractor { level }
    }

    pub fn rules(&self) -> impl Iterator<Item = &'static SectionRule> + '_ {
        RULES.iter().filter(|r| r.tier.enabled_for(self.level))
    }

    /// First non-empty capture per section wins.
    pub fn extract_sections(&self, text: &str) -> SectionMap {
        let mut sections = SectionMap::new();
        for rule in self.rules() {
            if sections.contains_key(&rule.kind) {
                continue;
            }
            if let Some(captured) = rule.capture(text) {
                sections.insert(rule.kind, captured.to_string());
            }
        }
        sections
    }
}

// ── Tests ──
