//! Data models for parsed creature statblocks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder damage for attacks that roll nothing.
pub const NO_DAMAGE: &str = "—";

/// Damage placeholder for the generic `Weapon (+N)` attack.
pub const WEAPON_DAMAGE: &str = "by weapon";

/// Which statblock grammar the input text follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatblockFormat {
    #[default]
    Native,
    Alternate,
}

impl fmt::Display for StatblockFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatblockFormat::Native => write!(f, "native"),
            StatblockFormat::Alternate => write!(f, "alternate"),
        }
    }
}

impl FromStr for StatblockFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(StatblockFormat::Native),
            "alternate" | "alt" => Ok(StatblockFormat::Alternate),
            other => Err(format!(
                "unknown statblock format '{}' (expected 'native' or 'alternate')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MonsterType {
    Animal,
    Bug,
    Construct,
    DemiFey,
    Dragon,
    Fairy,
    Fungus,
    Monstrosity,
    #[default]
    Mortal,
    Plant,
    Undead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intelligence {
    Mindless,
    #[default]
    Animal,
    SemiIntelligent,
    Sentient,
    Genius,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Lawful,
    #[default]
    Neutral,
    Chaotic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackType {
    #[default]
    Attack,
    Save,
}

/// Save targets, one per save category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Saves {
    pub doom: i32,
    pub ray: i32,
    pub hold: i32,
    pub blast: i32,
    pub spell: i32,
}

impl Default for Saves {
    fn default() -> Self {
        Self {
            doom: 10,
            ray: 10,
            hold: 10,
            blast: 10,
            spell: 10,
        }
    }
}

/// Secondary movement rates, 0 when the creature lacks the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Movement {
    pub swim: i32,
    pub fly: i32,
    pub climb: i32,
    pub burrow: i32,
}

/// A single attack line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackEntry {
    pub num_attacks: u32,
    pub attack_name: String,
    pub attack_bonus: i32,
    pub attack_damage: String,
    pub attack_effect: String,
    pub attack_type: AttackType,
    pub range_short: i32,
    pub range_medium: i32,
    pub range_long: i32,
    /// Letter `a`-`f`; attacks sharing a letter are used together.
    pub attack_group: char,
}

impl Default for AttackEntry {
    fn default() -> Self {
        Self {
            num_attacks: 1,
            attack_name: String::new(),
            attack_bonus: 0,
            attack_damage: NO_DAMAGE.to_string(),
            attack_effect: String::new(),
            attack_type: AttackType::Attack,
            range_short: 0,
            range_medium: 0,
            range_long: 0,
            attack_group: 'a',
        }
    }
}

/// A named special ability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityEntry {
    pub name: String,
    pub description: String,
}

impl AbilityEntry {
    /// The name with any parenthetical qualifier removed.
    pub fn base_name(&self) -> &str {
        match self.name.find('(') {
            Some(idx) => self.name[..idx].trim(),
            None => self.name.trim(),
        }
    }

    /// Contents of the parenthetical qualifier, e.g. `DC 15` for `Paralysis (DC 15)`.
    pub fn qualifier(&self) -> Option<&str> {
        let open = self.name.find('(')?;
        let close = self.name.rfind(')')?;
        if close <= open {
            return None;
        }
        let inner = self.name[open + 1..close].trim();
        if inner.is_empty() { None } else { Some(inner) }
    }
}

/// Normalized creature parsed from a statblock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureRecord {
    pub name: String,
    pub description: String,
    pub size: Size,
    pub monster_type: MonsterType,
    pub intelligence: Intelligence,
    pub alignment: Alignment,
    pub level: i32,
    pub ac: i32,
    pub hp_dice: String,
    pub hp_value: i32,
    pub saves: Saves,
    pub attacks: Vec<AttackEntry>,
    pub speed: i32,
    pub movement: Movement,
    pub morale: i32,
    pub xp_award: i32,
    pub encounters: String,
    pub lair_chance: i32,
    pub treasure_type: String,
    pub behaviour: String,
    pub speech: String,
    pub possessions: String,
    pub special_abilities: Vec<AbilityEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_base_name_and_qualifier() {
        let ability = AbilityEntry {
            name: "Paralysis (DC 15)".to_string(),
            description: "Stiff as a board.".to_string(),
        };
        assert_eq!(ability.base_name(), "Paralysis");
        assert_eq!(ability.qualifier(), Some("DC 15"));

        let plain = AbilityEntry {
            name: "Dark sight".to_string(),
            description: String::new(),
        };
        assert_eq!(plain.base_name(), "Dark sight");
        assert_eq!(plain.qualifier(), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("native".parse::<StatblockFormat>(), Ok(StatblockFormat::Native));
        assert_eq!(" Alternate ".parse::<StatblockFormat>(), Ok(StatblockFormat::Alternate));
        assert!("yaml".parse::<StatblockFormat>().is_err());
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(serde_json::to_string(&MonsterType::DemiFey).unwrap(), "\"demi-fey\"");
        assert_eq!(
            serde_json::to_string(&Intelligence::SemiIntelligent).unwrap(),
            "\"semi-intelligent\""
        );
        assert_eq!(serde_json::to_string(&AttackType::Save).unwrap(), "\"save\"");
    }
}
