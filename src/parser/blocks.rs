use std::sync::LazyLock;

use regex::Regex;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());
static BOLD_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*([^*]+?)\*\*:?$").unwrap());
static LIST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*+]\s+(.+)$").unwrap());
static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}(?:\.\d{1,3})*)[.)]\s*(\S.*)$").unwrap());
static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\|.*\|").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    /// A line that is nothing but bold text, e.g. `**2. Функции**`.
    BoldHeading(String),
    ListItem(String),
    NumberedItem { number: String, text: String },
    TableRow(String),
    Text(String),
    Empty,
}

impl Block {
    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Heading { .. } | Block::BoldHeading(_))
    }
}

pub fn classify_lines(markdown: &str) -> Vec<Block> {
    if markdown.trim().is_empty() {
        return vec![Block::Empty];
    }

    markdown.lines().map(|l| classify_line(l.trim())).collect()
}

fn classify_line(line: &str) -> Block {
    if line.is_empty() {
        return Block::Empty;
    }

    if let Some(caps) = HEADING_RE.captures(line) {
        return Block::Heading {
            level: caps[1].len() as u8,
            text: caps[2].trim().to_string(),
        };
    }

    if let Some(caps) = BOLD_HEADING_RE.captures(line) {
        return Block::BoldHeading(caps[1].trim().to_string());
    }

    if TABLE_RE.is_match(line) {
        return Block::TableRow(line.to_string());
    }

    if let Some(caps) = LIST_RE.captures(line) {
        return Block::ListItem(caps[1].to_string());
    }

    if let Some(caps) = NUMBERED_RE.captures(line) {
        return Block::NumberedItem {
            number: caps[1].to_string(),
            text: caps[2].to_string(),
        };
    }

    Block::Text(line.to_string())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockCounts {
    /// Markdown `#` headings plus bold-only heading lines.
    pub headings: usize,
    pub markdown_headings: usize,
    pub lists: usize,
    pub numbered: usize,
    pub tables: usize,
}

pub fn count_blocks(blocks: &[Block]) -> BlockCounts {
    let mut counts = BlockCounts::default();
    for block in blocks {
        match block {
            Block::Heading { .. } => {
                counts.headings += 1;
                counts.markdown_headings += 1;
            }
            Block::BoldHeading(_) => counts.headings += 1,
            Block::ListItem(_) => counts.lists += 1,
            Block::NumberedItem { .. } => counts.numbered += 1,
            Block::TableRow(_) => counts.tables += 1,
            Block::Text(_) | Block::Empty => {}
        }
    }
    counts
}

/// True when every run of single-level numbered items between two headings
/// counts 1, 2, 3 … without gaps. Sub-items like `1.2.` are ignored.
pub fn numbering_is_sequential(blocks: &[Block]) -> bool {
    let mut expected = 1u32;
    for block in blocks {
        match block {
            b if b.is_heading() => expected = 1,
            Block::NumberedItem { number, .. } if !number.contains('.') => {
                match number.parse::<u32>() {
                    Ok(n) if n == expected => expected += 1,
                    _ => return false,
                }
            }
            _ => {}
        }
    }
    true
}

/// Markdown headings must all start upper-case or all start lower-case.
pub fn heading_case_is_consistent(blocks: &[Block]) -> bool {
    let mut upper = 0;
    let mut total = 0;
    for block in blocks {
        if let Block::Heading { text, .. } = block {
            let Some(first) = text.chars().find(|c| c.is_alphabetic()) else {
                continue;
            };
            total += 1;
            if first.is_uppercase() {
                upper += 1;
            }
        }
    }
    upper == 0 || upper == total
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading() {
        let blocks = classify_lines("## 1. Общие положения");
        assert!(matches!(&blocks[0], Block::Heading { level: 2, text } if text == "1. Общие положения"));
    }

    #[test]
    fn bold_heading() {
        let blocks = classify_lines("**2. Функции**");
        assert!(matches!(&blocks[0], Block::BoldHeading(t) if t == "2. Функции"));
    }

    #[test]
    fn bold_label_with_value_is_text() {
        let blocks = classify_lines("**Организация:** _(наименование организации)_");
        assert!(matches!(&blocks[0], Block::Text(_)));
    }

    #[test]
    fn list_item() {
        let blocks = classify_lines("- основы трудового законодательства");
        assert!(matches!(&blocks[0], Block::ListItem(t) if t == "основы трудового законодательства"));
    }

    #[test]
    fn bold_is_not_list() {
        let blocks = classify_lines("**Дата:** 01.01.2024");
        assert!(!matches!(&blocks[0], Block::ListItem(_)));
    }

    #[test]
    fn numbered_items() {
        let blocks = classify_lines("3.1. Осуществляет контроль\n1) Первый\n12. Двенадцатый");
        assert!(matches!(&blocks[0], Block::NumberedItem { number, text } if number == "3.1" && text == "Осуществляет контроль"));
        assert!(matches!(&blocks[1], Block::NumberedItem { number, .. } if number == "1"));
        assert!(matches!(&blocks[2], Block::NumberedItem { number, .. } if number == "12"));
    }

    #[test]
    fn year_is_not_numbered() {
        let blocks = classify_lines("2024 год");
        assert!(matches!(&blocks[0], Block::Text(_)));
    }

    #[test]
    fn table_row() {
        let blocks = classify_lines("| Должность | Отдел |");
        assert!(matches!(&blocks[0], Block::TableRow(_)));
    }

    #[test]
    fn empty_string() {
        let blocks = classify_lines("");
        assert_eq!(blocks.len(), 1);
        assert!(matches!(&blocks[0], Block::Empty));
    }

    #[test]
    fn counts() {
        let md = "# Заголовок\n\n**Раздел**\n\n- пункт\n- пункт\n1. первый\n| a | b |\nтекст";
        let c = count_blocks(&classify_lines(md));
        assert_eq!(c.headings, 2);
        assert_eq!(c.markdown_headings, 1);
        assert_eq!(c.lists, 2);
        assert_eq!(c.numbered, 1);
        assert_eq!(c.tables, 1);
    }

    #[test]
    fn numbering_restarts_after_heading() {
        let md = "## Обязанности\n1. а\n2. б\n## Права\n1. в\n2. г\n3. д";
        assert!(numbering_is_sequential(&classify_lines(md)));
    }

    #[test]
    fn numbering_gap_detected() {
        let md = "## Обязанности\n1. а\n3. б";
        assert!(!numbering_is_sequential(&classify_lines(md)));
    }

    #[test]
    fn sub_numbering_ignored() {
        let md = "1. Общие положения\n1.1. а\n1.2. б\n2. Функции\n2.1. в";
        assert!(numbering_is_sequential(&classify_lines(md)));
    }

    #[test]
    fn heading_case() {
        assert!(heading_case_is_consistent(&classify_lines("# Один\n## Два")));
        assert!(heading_case_is_consistent(&classify_lines("## 1. Общие\n## 2. Функции")));
        assert!(!heading_case_is_consistent(&classify_lines("# Один\n## два")));
    }
}
