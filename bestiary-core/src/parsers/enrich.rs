//! Inline markup for save references and dice rolls.
//!
//! The markup is inert text for a presentation layer:
//! `save versus Hold` becomes `@Save[hold]{save versus Hold}` and `2d6+1`
//! becomes `[[/r 2d6+1]]`.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref SAVE_REFERENCE: Regex =
        Regex::new(r"(?i)\bsave\s+(?:versus|vs\.?)\s+(doom|ray|hold|blast|spell)s?\b").unwrap();
    static ref DICE_TOKEN: Regex = Regex::new(r"\b\d+d\d+(?:\s*[+-]\s*\d+\b)?\b").unwrap();
}

/// Wrap save-versus phrases and dice formulas in annotation markup.
pub fn enrich(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let with_saves = SAVE_REFERENCE.replace_all(text, |caps: &Captures| {
        format!("@Save[{}]{{{}}}", caps[1].to_lowercase(), &caps[0])
    });
    DICE_TOKEN
        .replace_all(&with_saves, |caps: &Captures| {
            let formula: String = caps[0].split_whitespace().collect();
            format!("[[/r {}]]", formula)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrich_save_reference() {
        assert_eq!(
            enrich("Paralysed unless a save versus Hold succeeds."),
            "Paralysed unless a @Save[hold]{save versus Hold} succeeds."
        );
        assert_eq!(enrich("save vs. spells"), "@Save[spell]{save vs. spells}");
    }

    #[test]
    fn test_enrich_dice() {
        assert_eq!(
            enrich("Deals 2d6 + 1 damage, then 1d4."),
            "Deals [[/r 2d6+1]] damage, then [[/r 1d4]]."
        );
    }

    #[test]
    fn test_enrich_leaves_other_tokens() {
        assert_eq!(enrich("Hoard 2d6sp, lasts 1 turn"), "Hoard 2d6sp, lasts 1 turn");
        assert_eq!(enrich(""), "");
    }

    #[test]
    fn test_enrich_combined() {
        assert_eq!(
            enrich("1d6 fire, save versus Blast for half"),
            "[[/r 1d6]] fire, @Save[blast]{save versus Blast} for half"
        );
    }
}
