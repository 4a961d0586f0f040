/*!
 * Text normalization for caption payloads.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// @const: Decimal numeric or named entity
static ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#\d+|[a-zA-Z]+);").unwrap()
});

// @const: A newline and the whitespace run that follows it
static NEWLINE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r?\n\s*").unwrap()
});

/// Named entities that are decoded; anything else is left untouched
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
];

/// Decode the fixed named entity set and decimal numeric entities
pub fn decode_html_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            if let Some(digits) = body.strip_prefix('#') {
                return digits
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string());
            }

            NAMED_ENTITIES
                .iter()
                .find(|(name, _)| *name == body)
                .map(|(_, replacement)| replacement.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Decode entities, collapse each newline plus following whitespace into a
/// single newline, and trim
pub fn normalize_transcript(text: &str) -> String {
    let decoded = decode_html_entities(text);
    NEWLINE_RUN_REGEX.replace_all(&decoded, "\n").trim().to_string()
}

/// Normalize each segment, drop the empty ones, and join with newlines
pub fn join_segments<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    segments
        .into_iter()
        .map(|segment| normalize_transcript(segment.as_ref()))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
