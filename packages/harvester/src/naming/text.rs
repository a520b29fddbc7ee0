//! Free-text cleanup for identifier derivation.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Innermost bracketed span: `[...]` or `(...)` with no nested brackets.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BRACKET_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\[\]]*\]|\([^()]*\)").expect("valid regex"));

/// Clause deferring to another document: "defined in", "as specified in", ...
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CROSS_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:as\s+)?(?:defined|specified|described)\s+in\b").expect("valid regex")
});

/// Sentence or clause boundary: `.`, `,` or `;` followed by whitespace.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CLAUSE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,;]\s").expect("valid regex"));

/// Boilerplate opening of many CBOR tag descriptions.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TAG_CONTAINS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^A CBOR tag that contains (?:an?|either)\s+").expect("valid regex")
});

/// Colon that ends a heading (`Foo: bar`), but not one inside `urn:x` or `https://`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HEADING_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(?:\s|$)").expect("valid regex"));

/// Remove a leading "A CBOR tag that contains a/an/either".
pub fn strip_tag_boilerplate(text: &str) -> &str {
    match TAG_CONTAINS.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Drop the outer brackets of text that is bracketed as a whole.
///
/// `[COSE algorithm identifier, Base Hash value]` becomes its inner text.
pub fn unwrap_brackets(text: &str) -> &str {
    let trimmed = text.trim();
    for (open, close) in [('[', ']'), ('(', ')')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            if !inner.contains(close) {
                return inner;
            }
        }
    }
    trimmed
}

/// Cut text before a clause that defers to an external document.
///
/// Truncates at the first sentence or clause boundary before the phrase,
/// or at the phrase itself when there is none.
///
/// # Examples
/// ```
/// use iana_harvester::naming::truncate_cross_reference;
///
/// assert_eq!(
///     truncate_cross_reference(
///         "A collection of NCMS metadata elements. The key value pairs of the map are defined in AdatP-5636.4"
///     ),
///     "A collection of NCMS metadata elements"
/// );
/// ```
pub fn truncate_cross_reference(text: &str) -> &str {
    let Some(m) = CROSS_REFERENCE.find(text) else {
        return text;
    };
    let head = &text[..m.start()];
    let cut = CLAUSE_BOUNDARY
        .find(head)
        .map_or(m.start(), |b| b.start());
    text[..cut].trim_end()
}

/// Remove every bracketed span, including nested ones, and stray brackets.
///
/// # Examples
/// ```
/// use iana_harvester::naming::strip_citations;
///
/// assert_eq!(strip_citations("Binary UUID ([RFC4122, Section 4.1.2])").trim(), "Binary UUID");
/// ```
pub fn strip_citations(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = BRACKET_SPAN.replace_all(&current, " ").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current.replace(['[', ']', '(', ')'], " ")
}

/// Keep only the heading of a description.
///
/// Cuts at the first heading colon, semicolon or sentence end.
pub fn first_clause(text: &str) -> &str {
    let mut end = text.len();
    if let Some(m) = HEADING_COLON.find(text) {
        end = end.min(m.start());
    }
    if let Some(i) = text.find(';') {
        end = end.min(i);
    }
    if let Some(i) = text.find(". ") {
        end = end.min(i);
    }
    text[..end].trim()
}

/// Split text into uppercase ASCII identifier words.
///
/// Characters are decomposed first so accented letters keep their base
/// letter; anything else that is not alphanumeric separates words. `+` is
/// spelled out as `PLUS`.
pub fn identifier_words(text: &str) -> Vec<String> {
    let ascii: String = text
        .nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .replace('+', " PLUS ");
    ascii
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_uppercase)
        .collect()
}
