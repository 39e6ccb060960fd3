//! Heuristic segmenter: flat body text in, ordered content blocks out.
//!
//! Paragraph segments (text split on blank lines) run through an ordered
//! rule cascade; the first matching rule claims the segment and no later
//! rule is tried, so rule order is load-bearing. The cascade never invents
//! text: concatenating the block texts (markers and emphasis delimiters
//! aside) reproduces the input modulo whitespace, and `preserves_content`
//! checks exactly that.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ContentBlock, Emphasis, TextRun};

static ATTRIBUTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["'\u{201d}]?\s*[-\u{2013}\u{2014}]\s*[A-Z][\w.,' ]{1,60}$"#)
        .expect("attribution pattern")
});

static REPORTED_SPEECH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(jesus|christ|the lord|god|paul|scripture)\s+(said|says|declared|told|wrote)\b")
        .expect("reported speech pattern")
});

static SCRIPTURE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    const BOOKS: &str = "Genesis|Exodus|Deuteronomy|Psalm|Psalms|Proverbs|Ecclesiastes|Isaiah\
|Jeremiah|Daniel|Matthew|Mark|Luke|John|Acts|Romans|Corinthians|Galatians|Ephesians\
|Philippians|Colossians|Thessalonians|Timothy|Titus|Hebrews|James|Peter|Jude|Revelation";
    Regex::new(&format!(r"\b({BOOKS})\s+\d+[:.]\d+")).expect("scripture reference pattern")
});

static NUMBER_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}[.)]\s+").expect("number marker pattern"));

static NUMBER_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}[.)]$").expect("number token pattern"));

const TITLE_LEAD_WORDS: [&str; 14] = [
    "how", "why", "what", "when", "where", "who", "is", "are", "can", "should", "will", "do",
    "does", "stop",
];

/// Convert body text into an ordered block sequence.
pub fn normalize_blocks(body: &str) -> Vec<ContentBlock> {
    segments(body)
        .into_iter()
        .enumerate()
        .map(|(idx, segment)| classify_segment(&segment, idx == 0))
        .collect()
}

fn segments(body: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in body.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }
    out
}

/// The ordered cascade. First match wins; a segment that is both short and
/// quote-like is a quote because the quote rule runs first.
fn classify_segment(segment: &str, is_first: bool) -> ContentBlock {
    let text = segment.trim();

    if is_first && is_main_title(text) {
        return ContentBlock::Heading {
            level: 1,
            text: text.to_owned(),
        };
    }

    if is_byline(text) {
        return ContentBlock::Heading {
            level: 3,
            text: text.to_owned(),
        };
    }

    if is_quote_like(text) {
        return ContentBlock::Blockquote {
            paragraphs: vec![vec![TextRun::plain(text)]],
        };
    }

    if let Some(list) = as_list(text) {
        return list;
    }

    if is_subheading(text) {
        return ContentBlock::Heading {
            level: 2,
            text: text.to_owned(),
        };
    }

    ContentBlock::Paragraph {
        runs: parse_emphasis_runs(text),
    }
}

fn is_main_title(text: &str) -> bool {
    if text.contains('\n') {
        return false;
    }
    let length = text.chars().count();
    if length == 0 || length >= 100 || text.ends_with('.') {
        return false;
    }
    if is_quote_like(text) {
        return false;
    }

    if text.contains("By ") {
        return true;
    }
    let first_word = text.split_whitespace().next().unwrap_or_default();
    if TITLE_LEAD_WORDS.contains(&first_word.to_ascii_lowercase().as_str()) {
        return true;
    }
    text.chars().next().is_some_and(char::is_uppercase)
}

fn is_byline(text: &str) -> bool {
    text.starts_with("By ") && text.chars().count() < 50
}

pub fn is_quote_like(text: &str) -> bool {
    if has_boundary_quotes(text) {
        return true;
    }
    if ATTRIBUTION_RE.is_match(text) {
        return true;
    }
    REPORTED_SPEECH_RE.is_match(text) || SCRIPTURE_REF_RE.is_match(text)
}

fn has_boundary_quotes(text: &str) -> bool {
    const OPENERS: [char; 3] = ['"', '\u{201c}', '\u{2018}'];
    const CLOSERS: [char; 3] = ['"', '\u{201d}', '\u{2019}'];

    let Some(first) = text.chars().next() else {
        return false;
    };
    if OPENERS.contains(&first) {
        // Opening quote plus any later closing quote counts; attributions
        // may trail after the close.
        return text.chars().skip(1).any(|c| CLOSERS.contains(&c));
    }
    let Some(last) = text.chars().last() else {
        return false;
    };
    CLOSERS.contains(&last) && text.chars().rev().skip(1).any(|c| OPENERS.contains(&c))
}

fn as_list(text: &str) -> Option<ContentBlock> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    if lines.is_empty() {
        return None;
    }

    let marked = lines
        .iter()
        .filter(|line| line_marker(line).is_some())
        .count();
    let first_marked = line_marker(lines[0]).is_some();

    if !first_marked && marked * 2 <= lines.len() {
        return None;
    }
    if marked == 0 {
        return None;
    }

    let numeric = lines
        .iter()
        .filter(|line| matches!(line_marker(line), Some(Marker::Number)))
        .count();
    // Numbering style for the whole block follows the majority of marked
    // lines, even when bullet styles are mixed.
    let ordered = numeric * 2 > marked;

    let items = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| parse_emphasis_runs(strip_marker(line)))
        .collect();

    Some(ContentBlock::List { ordered, items })
}

#[derive(Debug, PartialEq, Eq)]
enum Marker {
    Bullet,
    Number,
}

fn line_marker(line: &str) -> Option<Marker> {
    for bullet in ["- ", "* ", "\u{2022} ", "+ "] {
        if line.starts_with(bullet) {
            return Some(Marker::Bullet);
        }
    }
    if NUMBER_MARKER_RE.is_match(line) {
        return Some(Marker::Number);
    }
    None
}

fn strip_marker(line: &str) -> &str {
    for bullet in ["- ", "* ", "\u{2022} ", "+ "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }
    if let Some(found) = NUMBER_MARKER_RE.find(line) {
        return line[found.end()..].trim_start();
    }
    line
}

fn is_subheading(text: &str) -> bool {
    if text.contains('\n') {
        return false;
    }
    let length = text.chars().count();
    if text.ends_with('?') && length < 60 {
        return true;
    }
    length < 50 && !text.ends_with(['.', '!', '?'])
}

/// Parse `**bold**` and `*italic*` delimiters into emphasis runs. Unpaired
/// delimiters are kept as literal text. Line breaks inside a paragraph
/// collapse to spaces.
pub fn parse_emphasis_runs(text: &str) -> Vec<TextRun> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut runs: Vec<TextRun> = Vec::new();
    let mut plain = String::new();
    let mut cursor = 0usize;

    while cursor < text.len() {
        let rest = &text[cursor..];

        if rest.starts_with("**")
            && let Some(rel_close) = rest[2..].find("**")
        {
            let inner = &rest[2..2 + rel_close];
            if !inner.is_empty() {
                flush_plain(&mut runs, &mut plain);
                runs.push(TextRun {
                    text: inner.to_owned(),
                    emphasis: Emphasis::Bold,
                });
                cursor += rel_close + 4;
                continue;
            }
        }

        if rest.starts_with('*')
            && !rest.starts_with("**")
            && let Some(rel_close) = rest[1..].find('*')
        {
            let inner = &rest[1..1 + rel_close];
            if !inner.is_empty() {
                flush_plain(&mut runs, &mut plain);
                runs.push(TextRun {
                    text: inner.to_owned(),
                    emphasis: Emphasis::Italic,
                });
                cursor += rel_close + 2;
                continue;
            }
        }

        let ch = rest.chars().next().unwrap_or('\0');
        plain.push(ch);
        cursor += ch.len_utf8().max(1);
    }

    flush_plain(&mut runs, &mut plain);
    if runs.is_empty() {
        runs.push(TextRun::plain(""));
    }
    runs
}

fn flush_plain(runs: &mut Vec<TextRun>, plain: &mut String) {
    if plain.is_empty() {
        return;
    }
    runs.push(TextRun::plain(std::mem::take(plain)));
}

/// Flatten a block sequence back to words, the inverse direction of the
/// preservation contract.
pub fn reconstruct_text(blocks: &[ContentBlock]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for block in blocks {
        match block {
            ContentBlock::Heading { text, .. } => parts.push(text.clone()),
            ContentBlock::Paragraph { runs } => parts.push(runs_text(runs)),
            ContentBlock::Blockquote { paragraphs } => {
                for runs in paragraphs {
                    parts.push(runs_text(runs));
                }
            }
            ContentBlock::List { items, .. } => {
                for runs in items {
                    parts.push(runs_text(runs));
                }
            }
            ContentBlock::Image { .. } => {}
        }
    }
    parts.join("\n")
}

fn runs_text(runs: &[TextRun]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

/// Words of `text` after stripping structural decoration: standalone list
/// marker tokens and markdown emphasis delimiters. Marker tokens are
/// dropped wherever they occur, not only at line starts, so the check is
/// insensitive to line boundaries; paragraph runs collapse them while
/// list parsing strips markers, and both sides must tokenize the same.
pub fn content_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|word| {
            let cleaned: String = word.chars().filter(|c| *c != '*').collect();
            if cleaned.is_empty() || is_marker_token(&cleaned) {
                None
            } else {
                Some(cleaned)
            }
        })
        .collect()
}

fn is_marker_token(token: &str) -> bool {
    matches!(token, "-" | "+" | "\u{2022}") || NUMBER_TOKEN_RE.is_match(token)
}

/// The "never invent words" contract for the heuristic path: block text
/// must be exactly the source words, in order.
pub fn preserves_content(source: &str, blocks: &[ContentBlock]) -> bool {
    content_words(source) == content_words(&reconstruct_text(blocks))
}
