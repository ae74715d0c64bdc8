//! Text canonicalization ahead of statblock parsing.

use lazy_static::lazy_static;
use regex::Regex;

/// Canonical field separator used on type lines.
pub const DASH: char = '—';

lazy_static! {
    static ref MINUS_SIGN: Regex = Regex::new(r"\u{2212}").unwrap();
    static ref DASH_BEFORE_DIGIT: Regex = Regex::new(r"[\u{2012}-\u{2015}](\d)").unwrap();
    static ref DASH_VARIANTS: Regex = Regex::new(r"[\u{2012}\u{2013}\u{2015}]|-{2,}").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"[ \t\u{00A0}\u{2009}\u{202F}]+").unwrap();
}

/// Unify line endings and dashes, then split into trimmed, non-empty lines.
///
/// A minus sign, or a dash glyph directly in front of a digit, becomes an
/// ASCII `-` so signed numbers survive; other dashes become [`DASH`].
pub fn normalize(text: &str) -> Vec<String> {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let signed = MINUS_SIGN.replace_all(&unified, "-");
    let signed = DASH_BEFORE_DIGIT.replace_all(&signed, "-${1}");
    let dashed = DASH_VARIANTS.replace_all(&signed, DASH.to_string());

    dashed
        .split('\n')
        .map(|line| WHITESPACE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Title-case every word: `GIANT  RAT` becomes `Giant Rat`.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-case the first letter and lower-case the rest.
pub fn sentence_case(text: &str) -> String {
    let mut chars = text.trim().chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}
