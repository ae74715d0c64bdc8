//! Statblock parsing pipeline.
//!
//! Text flows through the submodules in order: normalize, locate the header
//! anchor, split the remaining lines into sections, extract stats, parse
//! attacks and abilities, enrich, cross-reference, and finally assemble the
//! [`CreatureRecord`].

pub mod abilities;
pub mod attacks;
pub mod blocks;
pub mod crossref;
pub mod enrich;
pub mod header;
pub mod keywords;
pub mod normalize;
pub mod stats;

use crate::error::Result;
use crate::models::{AbilityEntry, CreatureRecord, StatblockFormat};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SOURCE_PREFIX: Regex = Regex::new(r"^Source\s+([^.]+?)\s*\.\s*(.*)$").unwrap();
}

/// `Source X. Rest` becomes `(Source X) Rest`.
fn format_source_prefix(description: &str) -> String {
    match SOURCE_PREFIX.captures(description) {
        Some(caps) => format!("(Source {}) {}", &caps[1], &caps[2]).trim().to_string(),
        None => description.to_string(),
    }
}

fn enrich_abilities(abilities: Vec<AbilityEntry>) -> Vec<AbilityEntry> {
    abilities
        .into_iter()
        .map(|ability| AbilityEntry {
            description: enrich::enrich(&ability.description),
            ..ability
        })
        .collect()
}

/// Parse one statblock in the given grammar.
///
/// Fails only when the text is too short or has no anchor line; every other
/// gap falls back to a default value.
pub fn parse_statblock(text: &str, format: StatblockFormat) -> Result<CreatureRecord> {
    let lines = normalize::normalize(text);
    let header = header::locate_header(&lines, format)?;

    let record = match format {
        StatblockFormat::Native => build_native(&lines, header),
        StatblockFormat::Alternate => build_alternate(&lines, header),
    };

    tracing::debug!(
        "Parsed {} statblock '{}': {} attacks, {} abilities",
        format,
        record.name,
        record.attacks.len(),
        record.special_abilities.len()
    );
    Ok(record)
}

fn build_native(lines: &[String], header: header::Header) -> CreatureRecord {
    let sections = blocks::split_native(&lines[header.anchor + 1..]);
    let fields = stats::extract_native(&sections.stats);
    let type_line = header.type_line.unwrap_or_default();

    let abilities = enrich_abilities(abilities::parse_abilities(&sections.ability_lines));

    let mut attacks = match attacks::native_attack_text(&sections.stats) {
        Some(text) => attacks::parse_native_attacks(&text),
        None => {
            tracing::debug!("No attack text for '{}'", header.name);
            Vec::new()
        }
    };
    for attack in attacks.iter_mut() {
        attack.attack_effect = enrich::enrich(&attack.attack_effect);
    }
    crossref::resolve_effects(&mut attacks, &abilities);

    let treasure_type = if sections.treasure.is_empty() {
        fields.treasure_type
    } else {
        sections.treasure
    };

    CreatureRecord {
        name: header.name,
        description: format_source_prefix(&header.description),
        size: type_line.size,
        monster_type: type_line.monster_type,
        intelligence: type_line.intelligence,
        alignment: type_line.alignment,
        level: fields.level,
        ac: fields.ac,
        hp_dice: fields.hp_dice,
        hp_value: fields.hp_value,
        saves: fields.saves,
        attacks,
        speed: fields.speed,
        movement: fields.movement,
        morale: fields.morale,
        xp_award: fields.xp_award,
        encounters: fields.encounters,
        lair_chance: fields.lair_chance,
        treasure_type,
        behaviour: sections.behaviour,
        speech: sections.speech,
        possessions: sections.possessions,
        special_abilities: abilities,
    }
}

fn build_alternate(lines: &[String], header: header::Header) -> CreatureRecord {
    let sections = blocks::split_alternate(&lines[header.anchor..]);
    let fields = stats::extract_alternate(&sections.stats, &header.description);

    let abilities = enrich_abilities(abilities::parse_abilities(&sections.ability_lines));

    let mut attacks = match attacks::alternate_attack_text(&sections.stats) {
        Some(text) => attacks::parse_alternate_attacks(&text, fields.attack_bonus),
        None => Vec::new(),
    };
    crossref::resolve_effects(&mut attacks, &abilities);

    // Without a type line only size (from the description) and AL are known.
    let type_line = header.type_line.unwrap_or_else(|| header::TypeLine {
        size: keywords::resolve_size(&header.description).unwrap_or_default(),
        ..header::TypeLine::default()
    });
    let alignment = fields.alignment.unwrap_or(type_line.alignment);

    CreatureRecord {
        name: header.name,
        description: format_source_prefix(&header.description),
        size: type_line.size,
        monster_type: type_line.monster_type,
        intelligence: type_line.intelligence,
        alignment,
        level: fields.level,
        ac: fields.ac,
        hp_dice: fields.hp_dice,
        hp_value: fields.hp_value,
        saves: fields.saves,
        attacks,
        speed: fields.speed,
        movement: fields.movement,
        morale: fields.morale,
        xp_award: fields.xp_award,
        encounters: fields.encounters,
        lair_chance: fields.lair_chance,
        treasure_type: fields.treasure_type,
        behaviour: String::new(),
        speech: String::new(),
        possessions: String::new(),
        special_abilities: abilities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BestiaryError;
    use crate::models::{Alignment, AttackType, Intelligence, MonsterType, Size, NO_DAMAGE};

    const GOBLIN: &str = "GOBLIN
Source Dolmenwood Monster Book. A small, cruel fairy
that lurks in the roots of old trees.
SMALL FAIRY—SENTIENT—CHAOTIC
Level 1 AC 13 HP 1d8 (4) Saves D12 R13 H14 B15 S16
Attacks Weapon (+0) or bite (+1, 1d4) and gaze (see below)
Speed 30 Morale 7 XP 10 Encounters 2d6 (25% in lair)
Behaviour Cowardly, attacks from ambush.
Speech Goblish Possessions None
Hoard C4
Gaze: Paralysed unless a save versus Hold succeeds; lasts 1d4 rounds.
Cold iron: Takes +1 damage from cold iron weapons.";

    const ORC: &str = "Orc
Large, hateful humanoids.
AC 6 [13], HD 1 (6hp), Att 1 × weapon (1d8) or 2 × claw (1d3), THAC0 19 [0],
MV 120' (40'), SV D12 W13 P14 B15 S16 (1), ML 8, AL Chaotic, XP 10, NA 2d4 (1d6 × 10), TT D
▶ Hate the sun: −1 to hit in daylight.";

    #[test]
    fn test_native_statblock() {
        let record = parse_statblock(GOBLIN, StatblockFormat::Native).unwrap();
        assert_eq!(record.name, "Goblin");
        assert!(record.description.starts_with("(Source Dolmenwood Monster Book) A small"));
        assert_eq!(record.size, Size::Small);
        assert_eq!(record.monster_type, MonsterType::Fairy);
        assert_eq!(record.intelligence, Intelligence::Sentient);
        assert_eq!(record.alignment, Alignment::Chaotic);
        assert_eq!(record.level, 1);
        assert_eq!(record.ac, 13);
        assert_eq!(record.hp_value, 4);
        assert_eq!(record.saves.spell, 16);
        assert_eq!(record.speed, 30);
        assert_eq!(record.xp_award, 10);
        assert_eq!(record.encounters, "2d6");
        assert_eq!(record.lair_chance, 25);
        assert_eq!(record.behaviour, "Cowardly, attacks from ambush.");
        assert_eq!(record.speech, "Goblish");
        assert_eq!(record.treasure_type, "C4");

        assert_eq!(record.attacks.len(), 3);
        let groups: String = record.attacks.iter().map(|a| a.attack_group).collect();
        assert_eq!(groups, "abb");
        let gaze = &record.attacks[2];
        assert_eq!(gaze.attack_type, AttackType::Save);
        assert_eq!(gaze.attack_damage, NO_DAMAGE);
        assert!(gaze.attack_effect.starts_with("Paralysed unless a @Save[hold]{save versus Hold}"));

        assert_eq!(record.special_abilities.len(), 2);
        assert!(record.special_abilities[0].description.contains("[[/r 1d4]] rounds"));
    }

    #[test]
    fn test_native_defaults() {
        let text = "Rat\nA rat.\nSMALL ANIMAL—ANIMAL—NEUTRAL\nLevel 1 AC 15";
        let record = parse_statblock(text, StatblockFormat::Native).unwrap();
        assert_eq!(record.ac, 15);
        assert_eq!(record.morale, 7);
        assert_eq!(record.hp_dice, "1d8");
        assert_eq!(record.speed, 40);
        assert!(record.attacks.is_empty());
    }

    #[test]
    fn test_alternate_statblock() {
        let record = parse_statblock(ORC, StatblockFormat::Alternate).unwrap();
        assert_eq!(record.name, "Orc");
        assert_eq!(record.size, Size::Large);
        assert_eq!(record.alignment, Alignment::Chaotic);
        assert_eq!(record.ac, 13);
        assert_eq!(record.hp_dice, "1d8");
        assert_eq!(record.hp_value, 6);
        assert_eq!(record.speed, 40);
        assert_eq!(record.morale, 8);
        assert_eq!(record.encounters, "1d6 × 10");
        assert_eq!(record.treasure_type, "D");

        assert_eq!(record.attacks.len(), 2);
        assert_eq!(record.attacks[0].attack_bonus, 0);
        assert_eq!(record.attacks[0].attack_damage, "1d8");
        assert_eq!(record.attacks[1].num_attacks, 2);
        assert_eq!(record.attacks[1].attack_group, 'b');

        assert_eq!(record.special_abilities.len(), 1);
        assert_eq!(record.special_abilities[0].name, "Hate the sun");
    }

    #[test]
    fn test_alternate_descending_ac() {
        let text = "Golem\nA clay giant.\nHuge and slow.\nAC 2, HD 8, Att 1 × fist (2d8), THAC0 12, ML 12";
        let record = parse_statblock(text, StatblockFormat::Alternate).unwrap();
        assert_eq!(record.ac, 17);
        assert_eq!(record.size, Size::Large);
        assert_eq!(record.attacks[0].attack_bonus, 7);
    }

    #[test]
    fn test_oversized_hit_dice_do_not_panic() {
        let text = "Titan\nA vast giant.\nCloud-tall.\nAC 2, HD 999999999, Att 1 × fist (2d8), THAC0 12";
        let record = parse_statblock(text, StatblockFormat::Alternate).unwrap();
        assert_eq!(record.hp_value, 4);
        assert_eq!(record.attacks.len(), 1);

        let text = "Rat\nA rat.\nSMALL ANIMAL—ANIMAL—NEUTRAL\nLevel 1 AC 12 HP 60000d60000";
        let record = parse_statblock(text, StatblockFormat::Native).unwrap();
        assert_eq!(record.hp_value, 4);
    }

    #[test]
    fn test_native_minus_glyph_and_colon_stats() {
        let text = "Rat\nA rat.\nSMALL ANIMAL—ANIMAL—NEUTRAL\n\
                    Level 1 AC 12 Attacks Bite (\u{2212}1, 1d4)\n\
                    Speed 40 Morale: 9 XP 10\n\
                    Behaviour Sly.";
        let record = parse_statblock(text, StatblockFormat::Native).unwrap();
        assert_eq!(record.attacks.len(), 1);
        assert_eq!(record.attacks[0].attack_bonus, -1);
        assert_eq!(record.morale, 9);
        assert_eq!(record.xp_award, 10);
        assert_eq!(record.behaviour, "Sly.");
        assert!(record.special_abilities.is_empty());
    }

    #[test]
    fn test_structural_and_anchor_errors() {
        let short = "One\nTwo\nThree";
        for format in [StatblockFormat::Native, StatblockFormat::Alternate] {
            let err = parse_statblock(short, format).unwrap_err();
            assert!(matches!(err, BestiaryError::Structural { .. }));
        }

        let err = parse_statblock("One\nTwo\nThree\nFour", StatblockFormat::Native).unwrap_err();
        assert!(matches!(err, BestiaryError::AnchorNotFound { .. }));
    }

    #[test]
    fn test_source_prefix() {
        assert_eq!(format_source_prefix("Source Book. Rest"), "(Source Book) Rest");
        assert_eq!(format_source_prefix("Plain text."), "Plain text.");
    }
}
