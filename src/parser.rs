//! Markdown catalog parser.
//!
//! Turns the loosely structured catalog document into an ordered list of
//! [`Entry`] records. The parser is total: lines it cannot make sense of are
//! skipped, never rejected.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::entry::{Category, Entry};

/// Marker phrases that open each catalog section, matched as plain substrings.
pub const SECTION_MARKERS: [(&str, Category); 3] = [
    (
        "These servers aim to demonstrate MCP features",
        Category::Reference,
    ),
    (
        "Official integrations are maintained by companies",
        Category::Official,
    ),
    (
        "A growing set of community-developed and maintained servers",
        Category::Community,
    ),
];

lazy_static! {
    /// `- **[name](url)** - description`
    static ref BOLD_LINE: Regex =
        Regex::new(r"^\s*(?:-\s*)?\*\*\[([^\]]+)\]\(([^)]+)\)\*\*\s*-\s*(.+)$").unwrap();
    /// `- [name](url) (by author) - description`
    static ref AUTHORED_LINE: Regex =
        Regex::new(r"^\s*(?:-\s*)?\[([^\]]+)\]\(([^)]+)\)\s*\(by\s+([^)]+)\)\s*-\s*(.+)$").unwrap();
    /// `- [name](url) - description`
    static ref PLAIN_LINE: Regex =
        Regex::new(r"^\s*(?:-\s*)?\[([^\]]+)\]\(([^)]+)\)\s*-\s*(.+)$").unwrap();
    /// Inline markdown link outside code; the label is kept.
    static ref INLINE_LINK: Regex = Regex::new(r"\[([^\]`]+)\]\([^)`]+\)").unwrap();
    /// Backtick-quoted inline code span.
    static ref CODE_SPAN: Regex = Regex::new(r"`[^`]*`").unwrap();
}

/// The competing shapes an entry line can take.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LineShape {
    Bold,
    Authored,
    Plain,
}

impl LineShape {
    /// Evaluation order. The first shape that matches wins.
    pub const PRIORITY: [LineShape; 3] = [LineShape::Bold, LineShape::Authored, LineShape::Plain];

    fn pattern(self) -> &'static Regex {
        match self {
            LineShape::Bold => &BOLD_LINE,
            LineShape::Authored => &AUTHORED_LINE,
            LineShape::Plain => &PLAIN_LINE,
        }
    }

    /// Matches `line` against this shape alone.
    pub fn capture(self, line: &str) -> Option<RawEntry<'_>> {
        let caps = self.pattern().captures(line)?;
        let raw = match self {
            LineShape::Bold | LineShape::Plain => RawEntry {
                name: group(&caps, 1),
                url: group(&caps, 2),
                author: None,
                description: group(&caps, 3),
            },
            LineShape::Authored => RawEntry {
                name: group(&caps, 1),
                url: group(&caps, 2),
                author: Some(group(&caps, 3)),
                description: group(&caps, 4),
            },
        };
        Some(raw)
    }
}

fn group<'h>(caps: &Captures<'h>, i: usize) -> &'h str {
    caps.get(i).map_or("", |m| m.as_str())
}

/// Fields captured from an entry line before cleanup.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RawEntry<'a> {
    pub name: &'a str,
    pub url: &'a str,
    pub author: Option<&'a str>,
    pub description: &'a str,
}

/// Resolves a line against every shape in priority order.
pub fn match_line(line: &str) -> Option<(LineShape, RawEntry<'_>)> {
    LineShape::PRIORITY
        .iter()
        .find_map(|shape| shape.capture(line).map(|raw| (*shape, raw)))
}

/// Returns the category whose marker phrase appears in `line`, if any.
pub fn section_of(line: &str) -> Option<Category> {
    SECTION_MARKERS
        .iter()
        .find(|(marker, _)| line.contains(*marker))
        .map(|(_, category)| *category)
}

/// Leading whitespace is ignored here as it is by the line shapes, so an
/// indented `[[...]]` reference is rejected too.
fn is_entry_candidate(line: &str) -> bool {
    line.contains('[') && line.contains("](") && !line.trim_start().starts_with("[[")
}

fn strip_links(text: &str) -> String {
    let mut text = text.to_string();
    while INLINE_LINK.is_match(&text) {
        text = INLINE_LINK.replace_all(&text, "$1").into_owned();
    }
    text
}

/// Replaces every inline markdown link with its label and trims the result.
///
/// Code spans are copied verbatim. Replacement repeats until no link is
/// left, so cleaning an already cleaned description changes nothing.
pub fn clean_description(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for span in CODE_SPAN.find_iter(raw) {
        out.push_str(&strip_links(&raw[last..span.start()]));
        out.push_str(span.as_str());
        last = span.end();
    }
    out.push_str(&strip_links(&raw[last..]));
    out.trim().to_string()
}

fn build_entry(raw: RawEntry<'_>, category: Category) -> Option<Entry> {
    let name = raw.name.trim();
    let description = clean_description(raw.description);
    if name.is_empty() || description.is_empty() {
        return None;
    }
    let url = raw.url.trim();
    let author = raw
        .author
        .map(str::trim)
        .filter(|author| !author.is_empty())
        .map(str::to_string);

    Some(Entry {
        name: name.to_string(),
        description,
        category,
        link: url.starts_with("http").then(|| url.to_string()),
        github: url.contains("github.com").then(|| url.to_string()),
        author,
    })
}

/// Parses the whole catalog document, preserving source order.
pub fn parse_document(text: &str) -> Vec<Entry> {
    let mut category: Option<Category> = None;
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for (index, line) in text.lines().enumerate() {
        if let Some(section) = section_of(line) {
            tracing::debug!("Line {}: entering {} section", index + 1, section);
            category = Some(section);
        }

        let Some(current) = category else { continue };
        if !is_entry_candidate(line) {
            continue;
        }

        match match_line(line).and_then(|(_, raw)| build_entry(raw, current)) {
            Some(entry) => entries.push(entry),
            None => {
                skipped += 1;
                tracing::debug!("Line {}: no entry shape matched, skipping", index + 1);
            }
        }
    }

    tracing::debug!(
        "Parsed {} entries ({} candidate lines skipped)",
        entries.len(),
        skipped
    );
    entries
}
