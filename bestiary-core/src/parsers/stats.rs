//! Stat-field extraction for both statblock grammars.
//!
//! Every field is an independent pattern match over the stats text. A miss
//! leaves the documented default in place; nothing here can fail.

use crate::models::{Alignment, Movement, Saves};
use crate::parsers::keywords::resolve_alignment;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    // Native grammar
    static ref LEVEL: Regex = Regex::new(r"(?i)\bLevel\s*:?\s*(\d+)").unwrap();
    static ref NATIVE_AC: Regex = Regex::new(r"(?i)\bAC\s*:?\s*(\d+)").unwrap();
    static ref NATIVE_HP: Regex =
        Regex::new(r"(?i)\bHP\s+(\d+\s*d\s*\d+(?:\s*[+-]\s*\d+)?)?\s*(?:\(?\s*(\d+)\s*\)?)?").unwrap();
    static ref NATIVE_SAVES: Regex = Regex::new(
        r"(?i)\bSaves?\s+D\s*(\d+)\W+R\s*(\d+)\W+H\s*(\d+)\W+B\s*(\d+)\W+S\s*(\d+)"
    )
    .unwrap();
    static ref SPEED: Regex = Regex::new(r"(?i)\bSpeed\s*:?\s*(\d+)").unwrap();
    static ref FLY: Regex = Regex::new(r"(?i)\bFly\s*:?\s*(\d+)").unwrap();
    static ref SWIM: Regex = Regex::new(r"(?i)\bSwim\s*:?\s*(\d+)").unwrap();
    static ref CLIMB: Regex = Regex::new(r"(?i)\bClimb\s*:?\s*(\d+)").unwrap();
    static ref BURROW: Regex = Regex::new(r"(?i)\bBurrow\s*:?\s*(\d+)").unwrap();
    static ref MORALE: Regex = Regex::new(r"(?i)\bMorale\s*:?\s*(\d+)").unwrap();
    static ref ENCOUNTERS: Regex = Regex::new(r"(?i)\b(?:Encounters?|Enc)\s*:?\s+([^\s(,]+)").unwrap();

    // Shared
    static ref XP: Regex = Regex::new(r"(?i)\bXP\s*:?\s*(\d[\d,]*)").unwrap();
    static ref LAIR_PERCENT: Regex = Regex::new(r"(?i)(\d+)\s*%\s*in\s+lair").unwrap();
    static ref ALWAYS_IN_LAIR: Regex =
        Regex::new(r"(?i)\balways\s+in\s+(?:its\s+|their\s+|a\s+)?lair").unwrap();
    static ref DICE_FORMULA: Regex = Regex::new(r"(?i)^(\d+)d(\d+)([+-]\d+)?$").unwrap();

    // Alternate grammar
    static ref ALT_AC: Regex = Regex::new(r"(?i)\bAC\s*(-?\d+)(?:\s*\[\s*(-?\d+)\s*\])?").unwrap();
    static ref HIT_DICE: Regex =
        Regex::new(r"(?i)\bHD\s*(\d+)(?:\s*([+-])\s*(\d+))?\**(?:\s*\(\s*(\d+)\s*hp\s*\))?").unwrap();
    static ref THAC0: Regex = Regex::new(r"(?i)\bTHAC0\s*(\d+)").unwrap();
    static ref ALT_SAVES: Regex = Regex::new(
        r"(?i)\bSV\s*D\s*(\d+)\W*W\s*(\d+)\W*P\s*(\d+)\W*B\s*(\d+)\W*S\s*(\d+)"
    )
    .unwrap();
    static ref MOVE_FIELD: Regex = Regex::new(r"\bMV\s*([^,]*)").unwrap();
    static ref MOVE_RATE: Regex = Regex::new(r"(\d+)\s*['′]?\s*(?:\(\s*(\d+)\s*['′]?\s*\))?").unwrap();
    static ref ALT_MORALE: Regex = Regex::new(r"(?i)\bML\s*(\d+)").unwrap();
    static ref ALT_ALIGNMENT: Regex = Regex::new(r"\bAL\s+([A-Za-z]+)").unwrap();
    static ref NUMBER_APPEARING: Regex =
        Regex::new(r"\bNA\s+([^\s,(]+)(?:\s*\(\s*([^)]*?)\s*\))?").unwrap();
    static ref TREASURE_TYPE: Regex = Regex::new(r"\bTT\s+([^,]+)").unwrap();
}

pub const DEFAULT_LEVEL: i32 = 1;
pub const DEFAULT_AC: i32 = 10;
pub const DEFAULT_HP_DICE: &str = "1d8";
pub const DEFAULT_HP_VALUE: i32 = 4;
pub const DEFAULT_SPEED: i32 = 40;
pub const DEFAULT_MORALE: i32 = 7;

/// Ascending AC and to-hit bonuses convert from the descending scale via `19 - n`.
pub const DESCENDING_BASE: i32 = 19;

/// Stat values recovered from a statblock, defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct StatFields {
    pub level: i32,
    pub ac: i32,
    pub hp_dice: String,
    pub hp_value: i32,
    pub saves: Saves,
    /// Single to-hit bonus applied to every attack (alternate grammar only).
    pub attack_bonus: Option<i32>,
    pub speed: i32,
    pub movement: Movement,
    pub morale: i32,
    pub xp_award: i32,
    pub encounters: String,
    pub lair_chance: i32,
    pub treasure_type: String,
    /// `AL` field of the alternate grammar.
    pub alignment: Option<Alignment>,
}

impl Default for StatFields {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            ac: DEFAULT_AC,
            hp_dice: DEFAULT_HP_DICE.to_string(),
            hp_value: DEFAULT_HP_VALUE,
            saves: Saves::default(),
            attack_bonus: None,
            speed: DEFAULT_SPEED,
            movement: Movement::default(),
            morale: DEFAULT_MORALE,
            xp_award: 0,
            encounters: String::new(),
            lair_chance: 0,
            treasure_type: String::new(),
            alignment: None,
        }
    }
}

fn capture_int(caps: &Captures, group: usize) -> Option<i32> {
    caps.get(group)?.as_str().trim().parse().ok()
}

fn find_int(re: &Regex, text: &str) -> Option<i32> {
    re.captures(text).and_then(|caps| capture_int(&caps, 1))
}

fn parse_xp(text: &str) -> Option<i32> {
    let caps = XP.captures(text)?;
    caps.get(1)?.as_str().replace(',', "").parse().ok()
}

/// Average roll of a `NdM±K` formula, at least 1. `None` when the formula
/// does not parse or overflows.
pub fn average_hp(formula: &str) -> Option<i32> {
    let caps = DICE_FORMULA.captures(formula)?;
    let count: i32 = capture_int(&caps, 1)?;
    let sides: i32 = capture_int(&caps, 2)?;
    let modifier: i32 = capture_int(&caps, 3).unwrap_or(0);
    let total = count.checked_mul(sides.checked_add(1)?)? / 2;
    Some(total.checked_add(modifier)?.max(1))
}

/// `19 - n`, or `None` on overflow.
fn from_descending(value: i32) -> Option<i32> {
    DESCENDING_BASE.checked_sub(value)
}

fn extract_lair_chance(texts: &[&str]) -> i32 {
    for text in texts {
        if ALWAYS_IN_LAIR.is_match(text) {
            return 100;
        }
        if let Some(chance) = find_int(&LAIR_PERCENT, text) {
            return chance.clamp(0, 100);
        }
    }
    0
}

/// Extract stats from the joined native stat lines.
pub fn extract_native(stats: &str) -> StatFields {
    let mut fields = StatFields::default();

    if let Some(level) = find_int(&LEVEL, stats) {
        fields.level = level.max(1);
    }
    if let Some(ac) = find_int(&NATIVE_AC, stats) {
        fields.ac = ac;
    }

    if let Some(caps) = NATIVE_HP.captures(stats) {
        let dice = caps.get(1).map(|m| m.as_str().split_whitespace().collect::<String>());
        let value = capture_int(&caps, 2);
        if let Some(dice) = dice {
            fields.hp_value = value
                .or_else(|| average_hp(&dice))
                .unwrap_or(DEFAULT_HP_VALUE);
            fields.hp_dice = dice;
        } else if let Some(value) = value {
            fields.hp_value = value;
        }
    } else {
        tracing::debug!("No HP field, using {} ({})", DEFAULT_HP_DICE, DEFAULT_HP_VALUE);
    }

    if let Some(caps) = NATIVE_SAVES.captures(stats) {
        fields.saves = saves_from_captures(&caps);
    }

    if let Some(speed) = find_int(&SPEED, stats) {
        fields.speed = speed;
    }
    fields.movement = Movement {
        swim: find_int(&SWIM, stats).unwrap_or(0),
        fly: find_int(&FLY, stats).unwrap_or(0),
        climb: find_int(&CLIMB, stats).unwrap_or(0),
        burrow: find_int(&BURROW, stats).unwrap_or(0),
    };

    if let Some(morale) = find_int(&MORALE, stats) {
        fields.morale = morale.clamp(2, 12);
    }
    if let Some(xp) = parse_xp(stats) {
        fields.xp_award = xp.max(0);
    }
    if let Some(caps) = ENCOUNTERS.captures(stats) {
        fields.encounters = caps[1].to_string();
    }
    fields.lair_chance = extract_lair_chance(&[stats]);

    fields
}

fn saves_from_captures(caps: &Captures) -> Saves {
    let defaults = Saves::default();
    Saves {
        doom: capture_int(caps, 1).unwrap_or(defaults.doom),
        ray: capture_int(caps, 2).unwrap_or(defaults.ray),
        hold: capture_int(caps, 3).unwrap_or(defaults.hold),
        blast: capture_int(caps, 4).unwrap_or(defaults.blast),
        spell: capture_int(caps, 5).unwrap_or(defaults.spell),
    }
}

/// Convert an alternate-grammar rate like `120' (40')` to an encounter speed.
fn encounter_rate(segment: &str) -> Option<i32> {
    let caps = MOVE_RATE.captures(segment)?;
    match capture_int(&caps, 2) {
        Some(encounter) => Some(encounter),
        None => {
            let exploration = capture_int(&caps, 1)?;
            Some((exploration as f64 / 3.0).round() as i32)
        }
    }
}

fn extract_alternate_movement(field: &str, fields: &mut StatFields) {
    let mut base_speed = None;
    for segment in field.split('/') {
        let lower = segment.to_lowercase();
        let Some(rate) = encounter_rate(segment) else {
            continue;
        };
        if lower.contains("fly") || lower.contains("flying") {
            fields.movement.fly = rate;
        } else if lower.contains("swim") {
            fields.movement.swim = rate;
        } else if lower.contains("climb") {
            fields.movement.climb = rate;
        } else if lower.contains("burrow") {
            fields.movement.burrow = rate;
        } else if base_speed.is_none() {
            base_speed = Some(rate);
        }
    }
    if let Some(speed) = base_speed {
        fields.speed = speed;
    }
}

/// Extract stats from the combined alternate-grammar line.
///
/// `description` is consulted only for the lair chance.
pub fn extract_alternate(stats: &str, description: &str) -> StatFields {
    let mut fields = StatFields::default();

    if let Some(caps) = ALT_AC.captures(stats) {
        fields.ac = match capture_int(&caps, 2) {
            Some(ascending) => ascending,
            None => capture_int(&caps, 1)
                .and_then(from_descending)
                .unwrap_or(DEFAULT_AC),
        };
    }

    if let Some(caps) = HIT_DICE.captures(stats) {
        let count = capture_int(&caps, 1).unwrap_or(1);
        let modifier = match (caps.get(2), capture_int(&caps, 3)) {
            (Some(sign), Some(value)) if sign.as_str() == "-" => -value,
            (_, Some(value)) => value,
            _ => 0,
        };
        fields.level = count.max(1);
        fields.hp_dice = match modifier {
            0 => format!("{}d8", count),
            m if m > 0 => format!("{}d8+{}", count, m),
            m => format!("{}d8{}", count, m),
        };
        fields.hp_value = capture_int(&caps, 4)
            .or_else(|| average_hp(&fields.hp_dice))
            .unwrap_or(DEFAULT_HP_VALUE);
    }

    fields.attack_bonus = find_int(&THAC0, stats).and_then(from_descending);

    if let Some(caps) = ALT_SAVES.captures(stats) {
        fields.saves = saves_from_captures(&caps);
    }

    if let Some(caps) = MOVE_FIELD.captures(stats) {
        extract_alternate_movement(&caps[1], &mut fields);
    }

    if let Some(morale) = find_int(&ALT_MORALE, stats) {
        fields.morale = morale.clamp(2, 12);
    }
    if let Some(xp) = parse_xp(stats) {
        fields.xp_award = xp.max(0);
    }
    fields.alignment = ALT_ALIGNMENT
        .captures(stats)
        .map(|caps| resolve_alignment(&caps[1]));

    if let Some(caps) = NUMBER_APPEARING.captures(stats) {
        let wilderness = caps.get(2).map(|m| m.as_str().trim()).filter(|s| !s.is_empty());
        fields.encounters = wilderness.unwrap_or(&caps[1]).to_string();
    }

    if let Some(caps) = TREASURE_TYPE.captures(stats) {
        let treasure = caps[1].trim();
        if !treasure.eq_ignore_ascii_case("none") {
            fields.treasure_type = treasure.to_string();
        }
    }

    fields.lair_chance = extract_lair_chance(&[stats, description]);

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_full_line() {
        let stats = "Level 3 AC 14 HP 3d8 (13) Saves D11 R12 H13 B14 S15 \
                     Attacks Bite (+2, 1d6) Speed 30 Fly 60 Morale 8 XP 1,250 \
                     Encounters 2d4 (25% in lair)";
        let fields = extract_native(stats);
        assert_eq!(fields.level, 3);
        assert_eq!(fields.ac, 14);
        assert_eq!(fields.hp_dice, "3d8");
        assert_eq!(fields.hp_value, 13);
        assert_eq!(
            fields.saves,
            Saves { doom: 11, ray: 12, hold: 13, blast: 14, spell: 15 }
        );
        assert_eq!(fields.speed, 30);
        assert_eq!(fields.movement.fly, 60);
        assert_eq!(fields.movement.swim, 0);
        assert_eq!(fields.morale, 8);
        assert_eq!(fields.xp_award, 1250);
        assert_eq!(fields.encounters, "2d4");
        assert_eq!(fields.lair_chance, 25);
        assert_eq!(fields.attack_bonus, None);
    }

    #[test]
    fn test_native_explicit_ac() {
        assert_eq!(extract_native("AC 15").ac, 15);
        assert_eq!(extract_native("Speed 20 Level 2 AC 15 HP 2d8").ac, 15);
    }

    #[test]
    fn test_native_defaults() {
        let fields = extract_native("nothing useful here");
        assert_eq!(fields, StatFields::default());
        assert_eq!(fields.morale, 7);
        assert_eq!(fields.speed, 40);
        assert_eq!(fields.hp_dice, "1d8");
        assert_eq!(fields.hp_value, 4);
        assert_eq!(fields.saves.spell, 10);
    }

    #[test]
    fn test_native_hp_without_value_uses_average() {
        let fields = extract_native("Level 2 AC 12 HP 2d8+2 Saves D12 R13 H14 B15 S16");
        assert_eq!(fields.hp_dice, "2d8+2");
        assert_eq!(fields.hp_value, 11);
    }

    #[test]
    fn test_native_fields_with_colons() {
        let fields = extract_native("Level: 2 AC: 12 Speed 40 Morale: 9 XP: 10 Encounters: 1d4");
        assert_eq!(fields.level, 2);
        assert_eq!(fields.ac, 12);
        assert_eq!(fields.speed, 40);
        assert_eq!(fields.morale, 9);
        assert_eq!(fields.xp_award, 10);
        assert_eq!(fields.encounters, "1d4");
    }

    #[test]
    fn test_morale_clamped() {
        assert_eq!(extract_native("Morale 15").morale, 12);
        assert_eq!(extract_native("Morale 1").morale, 2);
        assert_eq!(extract_alternate("AC 5, ML 0", "").morale, 2);
    }

    #[test]
    fn test_always_in_lair() {
        assert_eq!(extract_native("Encounters 1 (always in lair)").lair_chance, 100);
    }

    #[test]
    fn test_alternate_descending_ac() {
        assert_eq!(extract_alternate("AC 2, HD 4", "").ac, 17);
        assert_eq!(extract_alternate("AC 6 [13], HD 1", "").ac, 13);
    }

    #[test]
    fn test_alternate_full_line() {
        let stats = "AC 6 [13], HD 2+1* (10hp), Att 2 × claw (1d4), THAC0 17 [+2], \
                     MV 120' (40') / 180' (60') flying, SV D12 W13 P14 B15 S16 (2), \
                     ML 8, AL Chaotic, XP 35, NA 1d6 (2d6), TT C";
        let fields = extract_alternate(stats, "Always in lair at night.");
        assert_eq!(fields.level, 2);
        assert_eq!(fields.hp_dice, "2d8+1");
        assert_eq!(fields.hp_value, 10);
        assert_eq!(fields.attack_bonus, Some(2));
        assert_eq!(
            fields.saves,
            Saves { doom: 12, ray: 13, hold: 14, blast: 15, spell: 16 }
        );
        assert_eq!(fields.speed, 40);
        assert_eq!(fields.movement.fly, 60);
        assert_eq!(fields.morale, 8);
        assert_eq!(fields.alignment, Some(Alignment::Chaotic));
        assert_eq!(fields.xp_award, 35);
        assert_eq!(fields.encounters, "2d6");
        assert_eq!(fields.treasure_type, "C");
        assert_eq!(fields.lair_chance, 100);
    }

    #[test]
    fn test_alternate_hd_without_override_and_exploration_speed() {
        let fields = extract_alternate("AC 7, HD 1-1, MV 90' / swim 60', TT None", "");
        assert_eq!(fields.level, 1);
        assert_eq!(fields.hp_dice, "1d8-1");
        assert_eq!(fields.hp_value, 3);
        assert_eq!(fields.speed, 30);
        assert_eq!(fields.movement.swim, 20);
        assert_eq!(fields.treasure_type, "");
    }

    #[test]
    fn test_average_hp() {
        assert_eq!(average_hp("3d8"), Some(13));
        assert_eq!(average_hp("1d4-3"), Some(1));
        assert_eq!(average_hp("lots"), None);
        assert_eq!(average_hp("60000d60000"), None);
        assert_eq!(average_hp("1d8+2147483647"), None);
    }

    #[test]
    fn test_oversized_numbers_fall_back_to_defaults() {
        let fields = extract_native("Level 2 AC 12 HP 60000d60000");
        assert_eq!(fields.hp_dice, "60000d60000");
        assert_eq!(fields.hp_value, DEFAULT_HP_VALUE);

        let fields = extract_alternate("AC -2147483648, HD 999999999, THAC0 2147483647", "");
        assert_eq!(fields.ac, DEFAULT_AC);
        assert_eq!(fields.level, 999999999);
        assert_eq!(fields.hp_dice, "999999999d8");
        assert_eq!(fields.hp_value, DEFAULT_HP_VALUE);
        assert_eq!(fields.attack_bonus, Some(19 - 2147483647));
    }
}
