//! Name/description header and type-line anchor.

use crate::error::{BestiaryError, Result};
use crate::models::{Alignment, Intelligence, MonsterType, Size, StatblockFormat};
use crate::parsers::keywords::{
    has_alignment_marker, resolve_alignment, resolve_intelligence, resolve_monster_type,
    resolve_size,
};
use crate::parsers::normalize::{DASH, title_case};
use lazy_static::lazy_static;
use regex::Regex;

/// Minimum number of non-empty lines a statblock must have.
pub const MIN_LINES: usize = 4;

lazy_static! {
    static ref AC_LINE: Regex = Regex::new(r"^(?i:AC)\s*\d").unwrap();
}

/// Decomposed `SIZE TYPE—INTELLIGENCE—ALIGNMENT` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeLine {
    pub size: Size,
    pub monster_type: MonsterType,
    pub intelligence: Intelligence,
    pub alignment: Alignment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub name: String,
    pub description: String,
    /// Always present in the native grammar, optional in the alternate one.
    pub type_line: Option<TypeLine>,
    /// Index of the anchor line within the normalized lines.
    pub anchor: usize,
}

/// A line with two dash separators and an alignment keyword.
pub fn is_type_line(line: &str) -> bool {
    line.matches(DASH).count() >= 2 && has_alignment_marker(line)
}

pub fn is_alternate_stats_line(line: &str) -> bool {
    AC_LINE.is_match(line)
}

/// Find the anchor line and split off the name and description above it.
pub fn locate_header(lines: &[String], format: StatblockFormat) -> Result<Header> {
    if lines.len() < MIN_LINES {
        return Err(BestiaryError::Structural { lines: lines.len() });
    }

    let is_anchor: fn(&str) -> bool = match format {
        StatblockFormat::Native => is_type_line,
        StatblockFormat::Alternate => is_alternate_stats_line,
    };

    let anchor = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| is_anchor(line))
        .map(|(idx, _)| idx)
        .ok_or_else(|| BestiaryError::AnchorNotFound {
            format: format.to_string(),
        })?;

    tracing::debug!("Anchor for {} statblock at line {}: {}", format, anchor, lines[anchor]);

    let name = title_case(&lines[0]);
    let between = &lines[1..anchor];

    let (type_line, description) = match format {
        StatblockFormat::Native => (Some(decompose_type_line(&lines[anchor])), between.join(" ")),
        StatblockFormat::Alternate => {
            let type_idx = between.iter().position(|line| is_type_line(line));
            let type_line = type_idx.map(|idx| decompose_type_line(&between[idx]));
            let description = between
                .iter()
                .enumerate()
                .filter(|(idx, _)| Some(*idx) != type_idx)
                .map(|(_, line)| line.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            (type_line, description)
        }
    };

    Ok(Header {
        name,
        description,
        type_line,
        anchor,
    })
}

/// Split a type line on the dash glyph into size/type, intelligence and alignment.
pub fn decompose_type_line(line: &str) -> TypeLine {
    let parts: Vec<&str> = line.splitn(3, DASH).map(str::trim).collect();
    let kind = parts.first().copied().unwrap_or_default();

    let intelligence = parts
        .get(1)
        .and_then(|part| resolve_intelligence(part))
        .unwrap_or_default();
    let alignment = match parts.get(2) {
        Some(part) => resolve_alignment(part),
        None => resolve_alignment(line),
    };

    TypeLine {
        size: resolve_size(kind).unwrap_or_default(),
        monster_type: resolve_monster_type(kind).unwrap_or_default(),
        intelligence,
        alignment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::normalize::normalize;

    #[test]
    fn test_structural_error_below_four_lines() {
        let lines = normalize("Goblin\nA fairy.\nSMALL FAIRY—SENTIENT—CHAOTIC");
        for format in [StatblockFormat::Native, StatblockFormat::Alternate] {
            let err = locate_header(&lines, format).unwrap_err();
            assert!(matches!(err, BestiaryError::Structural { lines: 3 }));
        }
    }

    #[test]
    fn test_native_anchor_and_description() {
        let lines = normalize(
            "GOBLIN KING\nA fat, cruel fairy.\nRules the warren.\nSMALL FAIRY—SENTIENT—CHAOTIC\nLevel 3 AC 13",
        );
        let header = locate_header(&lines, StatblockFormat::Native).unwrap();
        assert_eq!(header.name, "Goblin King");
        assert_eq!(header.description, "A fat, cruel fairy. Rules the warren.");
        assert_eq!(header.anchor, 3);

        let type_line = header.type_line.unwrap();
        assert_eq!(type_line.size, Size::Small);
        assert_eq!(type_line.monster_type, MonsterType::Fairy);
        assert_eq!(type_line.intelligence, Intelligence::Sentient);
        assert_eq!(type_line.alignment, Alignment::Chaotic);
    }

    #[test]
    fn test_native_anchor_missing() {
        let lines = normalize("Goblin\nA fairy.\nLevel 1 AC 12\nSpeed 40");
        let err = locate_header(&lines, StatblockFormat::Native).unwrap_err();
        assert!(matches!(err, BestiaryError::AnchorNotFound { .. }));
    }

    #[test]
    fn test_alternate_anchor_with_optional_type_line() {
        let lines = normalize(
            "Troll\nHUGE MONSTROSITY — SEMI-INTELLIGENT — CHAOTIC\nRegenerating brutes.\nAC 4 [15], HD 6+3 (30hp)",
        );
        let header = locate_header(&lines, StatblockFormat::Alternate).unwrap();
        assert_eq!(header.anchor, 3);
        assert_eq!(header.description, "Regenerating brutes.");
        let type_line = header.type_line.unwrap();
        assert_eq!(type_line.size, Size::Large);
        assert_eq!(type_line.intelligence, Intelligence::SemiIntelligent);
    }

    #[test]
    fn test_alternate_anchor_missing() {
        let lines = normalize("Troll\nBrutes.\nHD 6+3\nMV 120'");
        let err = locate_header(&lines, StatblockFormat::Alternate).unwrap_err();
        assert!(matches!(err, BestiaryError::AnchorNotFound { .. }));
    }

    #[test]
    fn test_special_alignment_phrases() {
        let type_line = decompose_type_line("MEDIUM MORTAL—SENTIENT—ANY ALIGNMENT");
        assert_eq!(type_line.alignment, Alignment::Neutral);
        assert_eq!(type_line.monster_type, MonsterType::Mortal);
        assert!(is_type_line("MEDIUM MORTAL—GENIUS—ALIGNMENT BY INDIVIDUAL"));
    }

    #[test]
    fn test_type_line_defaults() {
        let type_line = decompose_type_line("ODD—THING—LAWFUL");
        assert_eq!(type_line.size, Size::Medium);
        assert_eq!(type_line.monster_type, MonsterType::Mortal);
        assert_eq!(type_line.intelligence, Intelligence::Animal);
        assert_eq!(type_line.alignment, Alignment::Lawful);
    }
}
