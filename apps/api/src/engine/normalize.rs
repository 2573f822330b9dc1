//! Text normalization: line splitting, trimming, mojibake repair and detection.
//!
//! All functions are pure and idempotent over their own output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Corrupted punctuation produced by UTF-8 text decoded as Windows-1252, and the
/// plain character each one stands for. Longer sequences come first so that the
/// bare `â€` prefix is only rewritten once nothing more specific matches.
const MOJIBAKE_TABLE: &[(&str, &str)] = &[
    ("â€\u{201c}", "-"), // en dash
    ("â€\u{201d}", "-"), // em dash
    ("â€œ", "\""),  // left double quote
    ("â€\u{9d}", "\""), // right double quote
    ("â€˜", "'"),   // left single quote
    ("â€™", "'"),   // right single quote / apostrophe
    ("â€¢", "•"),   // bullet
    ("â€¦", "..."), // ellipsis
    ("â€", "\""),   // right double quote with its last byte lost
    ("Â\u{a0}", " "), // no-break space
];

/// Well-formed typographic punctuation flattened to ASCII before parsing.
const TYPOGRAPHIC_TABLE: &[(char, &str)] = &[
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{201c}', "\""),
    ('\u{201d}', "\""),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{2026}', "..."),
];

/// Leading list markers the parsing collaborator sometimes leaves on bullet text.
const BULLET_MARKERS: &[char] = &['-', ' ', '•', '·', '∙', '→', '▪'];

static PROBLEMATIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"â€|[\x00-\x08\x0B\x0C\x0E-\x1F]|\x{FFFD}").expect("static pattern")
});

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Splits every part on line breaks and returns the trimmed, non-empty lines in order.
///
/// Accepts a single block (`split_to_lines([text])`) or an already-split sequence.
pub fn split_to_lines<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .flat_map(|part| {
            part.as_ref()
                .split(is_line_break)
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// String form of an arbitrary JSON value, trimmed. `null` becomes `""`.
pub fn trim(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// `Some(trimmed)` unless the input is blank.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Rewrites known mojibake and typographic punctuation, and maps sub/superscript
/// digits to ASCII digits.
pub fn repair_encoding(text: &str) -> String {
    let mut repaired = text.to_string();
    for (broken, fixed) in MOJIBAKE_TABLE {
        if repaired.contains(broken) {
            repaired = repaired.replace(broken, fixed);
        }
    }

    let mut out = String::with_capacity(repaired.len());
    for c in repaired.chars() {
        if let Some((_, fixed)) = TYPOGRAPHIC_TABLE.iter().find(|(from, _)| *from == c) {
            out.push_str(fixed);
        } else if let Some(digit) = script_digit(c) {
            out.push(digit);
        } else {
            out.push(c);
        }
    }
    out
}

fn script_digit(c: char) -> Option<char> {
    let value = match c {
        '\u{2080}'..='\u{2089}' => c as u32 - 0x2080,
        '\u{2070}' => 0,
        '\u{00b9}' => 1,
        '\u{00b2}' => 2,
        '\u{00b3}' => 3,
        '\u{2074}'..='\u{2079}' => c as u32 - 0x2070,
        _ => return None,
    };
    char::from_digit(value, 10)
}

/// True when the text still carries mojibake, stray control characters or U+FFFD.
/// Advisory only.
pub fn has_problematic_characters(text: &str) -> bool {
    PROBLEMATIC.is_match(text)
}

/// Trims and removes leading bullet markers (`- • · ∙ → ▪`).
pub fn strip_bullet_marker(text: &str) -> String {
    text.trim().trim_start_matches(BULLET_MARKERS).trim().to_string()
}
