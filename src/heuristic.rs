//! Deterministic metadata fallbacks. These run whenever the AI stage is
//! unavailable or its output fails verification, so they must produce
//! reasonable results on their own.

/// Category taxonomy shared by the heuristic bucketing and the AI prompt.
/// Each entry is a category name plus the keywords that vote for it.
pub const CATEGORY_BUCKETS: [(&str, [&str; 5]); 6] = [
    (
        "Leadership",
        ["leader", "leadership", "manage", "vision", "strategy"],
    ),
    (
        "Ministry",
        ["ministry", "church", "congregation", "pastor", "shepherd"],
    ),
    (
        "Prayer",
        ["prayer", "pray", "intercession", "devotion", "worship"],
    ),
    (
        "Theology",
        ["doctrine", "scripture", "theology", "gospel", "biblical"],
    ),
    (
        "Culture",
        ["culture", "society", "community", "nation", "family"],
    ),
    (
        "Discipleship",
        ["disciple", "discipleship", "mentor", "growth", "formation"],
    ),
];

/// Used when no bucket reaches the keyword threshold.
pub const DEFAULT_CATEGORIES: [&str; 2] = ["Ministry", "Leadership"];

const EXCERPT_TARGET_CHARS: usize = 200;
const EXCERPT_MAX_SENTENCES: usize = 3;
const TITLE_MAX_CHARS: usize = 100;
const CATEGORY_KEYWORD_THRESHOLD: usize = 2;
const CATEGORY_CAP: usize = 3;

/// First one to three sentences of the body, capped near 200 chars, always
/// ending in terminal punctuation.
pub fn generate_excerpt(body: &str) -> String {
    let text = collapse_whitespace(body);
    if text.is_empty() {
        return String::new();
    }

    let mut excerpt = String::new();
    for (count, sentence) in split_sentences(&text).into_iter().enumerate() {
        if count >= EXCERPT_MAX_SENTENCES {
            break;
        }
        let candidate_len = excerpt.chars().count() + sentence.chars().count() + 1;
        if !excerpt.is_empty() && candidate_len > EXCERPT_TARGET_CHARS {
            break;
        }
        if !excerpt.is_empty() {
            excerpt.push(' ');
        }
        excerpt.push_str(&sentence);
    }

    if excerpt.is_empty() {
        // No sentence boundary at all; take a prefix.
        excerpt = text;
    }

    if excerpt.chars().count() > EXCERPT_TARGET_CHARS {
        return truncate_with_ellipsis(&excerpt, EXCERPT_TARGET_CHARS);
    }
    if !excerpt.ends_with(['.', '!', '?']) {
        excerpt.push('.');
    }
    excerpt
}

/// Split on sentence punctuation, keeping the punctuation with its
/// sentence. Quotation marks after the terminator stay attached too.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            while let Some(&next) = chars.peek() {
                if matches!(next, '"' | '\u{201d}' | '\'' | ')') {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            let sentence = current.trim().to_owned();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_owned());
    }
    sentences
}

/// Strip leading bullet/number markers, normalize whitespace, cap at 100
/// chars with an ellipsis.
pub fn clean_title(raw: &str) -> String {
    let mut title = raw.trim();

    loop {
        let stripped = title
            .trim_start_matches(['-', '*', '\u{2022}', '#', '>'])
            .trim_start();
        let stripped = strip_number_marker(stripped);
        if stripped == title {
            break;
        }
        title = stripped;
    }

    let title = collapse_whitespace(title);
    truncate_with_ellipsis(&title, TITLE_MAX_CHARS)
}

fn strip_number_marker(text: &str) -> &str {
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits > 3 {
        return text;
    }
    let rest = &text[digits..];
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(after) => after.trim_start(),
        None => text,
    }
}

/// Keyword-bucket category suggestion. A bucket is suggested only when at
/// least two of its keywords appear in the body (case-insensitive); ties
/// broken by bucket order; capped at three. Falls back to a fixed pair.
pub fn suggest_categories(body: &str) -> Vec<String> {
    let haystack = body.to_ascii_lowercase();

    let mut scored: Vec<(&str, usize)> = Vec::new();
    for (category, keywords) in CATEGORY_BUCKETS {
        let hits = keywords
            .iter()
            .filter(|keyword| haystack.contains(*keyword))
            .count();
        if hits >= CATEGORY_KEYWORD_THRESHOLD {
            scored.push((category, hits));
        }
    }

    if scored.is_empty() {
        return DEFAULT_CATEGORIES.iter().map(|c| (*c).to_owned()).collect();
    }

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(CATEGORY_CAP)
        .map(|(category, _)| category.to_owned())
        .collect()
}

pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_takes_leading_sentences_and_keeps_punctuation() {
        let body = "Leadership is influence. Nothing more, nothing less! \
                    A third sentence here? A fourth that should not appear.";
        let excerpt = generate_excerpt(body);
        assert_eq!(
            excerpt,
            "Leadership is influence. Nothing more, nothing less! A third sentence here?"
        );
    }

    #[test]
    fn excerpt_without_terminator_gains_one() {
        let excerpt = generate_excerpt("A short thought with no period");
        assert_eq!(excerpt, "A short thought with no period.");
    }

    #[test]
    fn excerpt_of_one_giant_sentence_is_ellipsized() {
        let body = format!("{} end.", "word ".repeat(80));
        let excerpt = generate_excerpt(&body);
        assert!(excerpt.chars().count() <= 200);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn title_cleanup_strips_markers() {
        assert_eq!(clean_title("- A Bulleted Title"), "A Bulleted Title");
        assert_eq!(clean_title("3. Numbered  Title "), "Numbered Title");
        assert_eq!(clean_title("\u{2022} Dotted"), "Dotted");
        let long = "t".repeat(150);
        assert!(clean_title(&long).chars().count() <= 100);
    }

    #[test]
    fn categories_require_two_keyword_hits() {
        // "leader" + "vision" = 2 hits for Leadership; nothing else crosses.
        let body = "A leader casts vision for the team.";
        assert_eq!(suggest_categories(body), vec!["Leadership".to_owned()]);

        // One hit only: default pair.
        let body = "A leader of the expedition packed supplies.";
        assert_eq!(
            suggest_categories(body),
            vec!["Ministry".to_owned(), "Leadership".to_owned()]
        );
    }

    #[test]
    fn categories_capped_at_three_and_ordered_by_hits() {
        let body = "The pastor led the church congregation in prayer and worship, \
                    with devotion to scripture and the gospel, teaching doctrine, \
                    casting vision as a leader with strategy to manage growth.";
        let categories = suggest_categories(body);
        assert_eq!(categories.len(), 3);
        assert!(categories.contains(&"Ministry".to_owned()));
    }
}
