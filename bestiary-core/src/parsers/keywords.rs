//! Keyword tables for decomposing creature type lines.
//!
//! Tables are checked in order, so more specific keywords come first
//! (`demi-fey` before `fairy`, `semi-intelligent` before `intelligent`).

use crate::models::{Alignment, Intelligence, MonsterType, Size};

pub const SIZES: &[(&str, Size)] = &[
    ("tiny", Size::Small),
    ("small", Size::Small),
    ("medium", Size::Medium),
    ("man-sized", Size::Medium),
    ("large", Size::Large),
    ("huge", Size::Large),
    ("gigantic", Size::Large),
];

pub const MONSTER_TYPES: &[(&str, MonsterType)] = &[
    ("demi-fey", MonsterType::DemiFey),
    ("demifey", MonsterType::DemiFey),
    ("animal", MonsterType::Animal),
    ("bug", MonsterType::Bug),
    ("construct", MonsterType::Construct),
    ("dragon", MonsterType::Dragon),
    ("fairy", MonsterType::Fairy),
    ("fungus", MonsterType::Fungus),
    ("monstrosity", MonsterType::Monstrosity),
    ("mortal", MonsterType::Mortal),
    ("plant", MonsterType::Plant),
    ("undead", MonsterType::Undead),
];

pub const INTELLIGENCES: &[(&str, Intelligence)] = &[
    ("semi-intelligent", Intelligence::SemiIntelligent),
    ("semi intelligent", Intelligence::SemiIntelligent),
    ("mindless", Intelligence::Mindless),
    ("sentient", Intelligence::Sentient),
    ("genius", Intelligence::Genius),
    ("animal", Intelligence::Animal),
];

/// Phrases that mark a type line's alignment part.
pub const ALIGNMENT_MARKERS: &[&str] = &[
    "lawful",
    "neutral",
    "chaotic",
    "any alignment",
    "alignment by individual",
];

/// Resolve the first word of `text` that names a size.
pub fn resolve_size(text: &str) -> Option<Size> {
    text.split(|c: char| !c.is_alphanumeric() && c != '-')
        .map(str::to_lowercase)
        .find_map(|word| {
            SIZES
                .iter()
                .find(|(key, _)| *key == word)
                .map(|(_, size)| *size)
        })
}

pub fn resolve_monster_type(text: &str) -> Option<MonsterType> {
    let lower = text.to_lowercase();
    MONSTER_TYPES
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, kind)| *kind)
}

pub fn resolve_intelligence(text: &str) -> Option<Intelligence> {
    let lower = text.to_lowercase();
    INTELLIGENCES
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, intelligence)| *intelligence)
}

/// Lawful or chaotic by substring, anything else (including "any alignment") is neutral.
pub fn resolve_alignment(text: &str) -> Alignment {
    let lower = text.to_lowercase();
    if lower.contains("any alignment") || lower.contains("alignment by individual") {
        Alignment::Neutral
    } else if lower.contains("lawful") {
        Alignment::Lawful
    } else if lower.contains("chaotic") {
        Alignment::Chaotic
    } else {
        Alignment::Neutral
    }
}

pub fn has_alignment_marker(text: &str) -> bool {
    let lower = text.to_lowercase();
    ALIGNMENT_MARKERS.iter().any(|marker| lower.contains(marker))
}
