//! Splits the lines below the anchor into stats, metadata fields and ability text.

use crate::parsers::abilities::{parse_ability_opener, strip_bullet};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STAT_KEYWORD: Regex = Regex::new(
        r"^(?:Level|AC|HP|Saves?|Att|Attacks?|Speed|Fly|Swim|Climb|Burrow|Morale|XP|Encounters?|Enc)\b"
    )
    .unwrap();
    static ref CONNECTIVE: Regex = Regex::new(r"^(?i:and|or)\b").unwrap();
    static ref METADATA_KEYWORD: Regex =
        Regex::new(r"\b(Behaviou?r|Speech|Possessions|Hoard|Treasure)\b\s*:?").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Behaviour,
    Speech,
    Possessions,
    Treasure,
}

impl MetadataField {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "Behaviour" | "Behavior" => Some(Self::Behaviour),
            "Speech" => Some(Self::Speech),
            "Possessions" => Some(Self::Possessions),
            "Hoard" | "Treasure" => Some(Self::Treasure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Stats,
    Metadata(MetadataField),
    Abilities,
}

/// Lines below the anchor, sorted into their sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatblockSections {
    pub stats: String,
    pub behaviour: String,
    pub speech: String,
    pub possessions: String,
    pub treasure: String,
    pub ability_lines: Vec<String>,
}

impl StatblockSections {
    fn field_mut(&mut self, field: MetadataField) -> &mut String {
        match field {
            MetadataField::Behaviour => &mut self.behaviour,
            MetadataField::Speech => &mut self.speech,
            MetadataField::Possessions => &mut self.possessions,
            MetadataField::Treasure => &mut self.treasure,
        }
    }
}

fn append(target: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

/// Split a line at every metadata keyword it carries, when it starts with one.
fn split_metadata_line(line: &str) -> Vec<(MetadataField, String)> {
    let matches: Vec<_> = METADATA_KEYWORD.captures_iter(line).collect();
    let Some(first) = matches.first() else {
        return Vec::new();
    };
    if first.get(0).map(|m| m.start()) != Some(0) {
        return Vec::new();
    }

    let mut fields = Vec::new();
    for (idx, caps) in matches.iter().enumerate() {
        let (Some(whole), Some(keyword)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = matches
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(line.len());
        if let Some(field) = MetadataField::from_keyword(keyword.as_str()) {
            fields.push((field, line[whole.end()..end].trim().to_string()));
        }
    }
    fields
}

fn is_keyword_name(name: &str) -> bool {
    let name = name.trim();
    (STAT_KEYWORD.is_match(name) && name.split_whitespace().count() == 1)
        || MetadataField::from_keyword(name).is_some()
}

/// Classify native-grammar lines following the anchor.
///
/// The first line is always stats. Once an ability opener is seen every
/// later line belongs to the ability block.
pub fn split_native(lines: &[String]) -> StatblockSections {
    let mut sections = StatblockSections::default();
    let mut section = Section::Stats;

    for (idx, line) in lines.iter().enumerate() {
        if section == Section::Abilities {
            sections.ability_lines.push(line.clone());
            continue;
        }
        if idx == 0 {
            append(&mut sections.stats, line);
            continue;
        }

        let metadata = split_metadata_line(line);
        if !metadata.is_empty() {
            for (field, value) in metadata {
                append(sections.field_mut(field), &value);
                section = Section::Metadata(field);
            }
            continue;
        }

        if STAT_KEYWORD.is_match(line) {
            section = Section::Stats;
            append(&mut sections.stats, line);
            continue;
        }

        if let Some(opener) = parse_ability_opener(line) {
            if !is_keyword_name(&opener.base) {
                tracing::trace!("Ability block starts at: {}", line);
                section = Section::Abilities;
                sections.ability_lines.push(line.clone());
                continue;
            }
        }

        if CONNECTIVE.is_match(line) {
            section = Section::Stats;
            append(&mut sections.stats, line);
            continue;
        }

        match section {
            Section::Stats => append(&mut sections.stats, line),
            Section::Metadata(field) => append(sections.field_mut(field), line),
            Section::Abilities => sections.ability_lines.push(line.clone()),
        }
    }

    sections
}

/// Alternate grammar: the stats line runs until the first ability opener.
pub fn split_alternate(lines: &[String]) -> StatblockSections {
    let mut sections = StatblockSections::default();
    let mut in_abilities = false;

    for (idx, line) in lines.iter().enumerate() {
        let stripped = strip_bullet(line);
        if !in_abilities && idx > 0 && parse_ability_opener(stripped).is_some() {
            in_abilities = true;
        }
        if in_abilities {
            sections.ability_lines.push(stripped.to_string());
        } else {
            append(&mut sections.stats, line);
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.trim().to_string()).collect()
    }

    #[test]
    fn test_native_sections() {
        let sections = split_native(&lines(
            "Level 2 AC 13 HP 2d8 (9) Saves D12 R13 H14 B15 S16
             Attacks 2 claws (+1, 1d4)
             and bite (+1, 1d6) Speed 40 Morale 8 XP 20
             Encounters 1d6 (30% in lair)
             Behaviour Sly and hungry,
             hunts at dusk.
             Speech None Possessions None
             Hoard C2
             Pounce (when charging): Attacks twice.
             Behaviour: this line is ability text now.",
        ));
        assert!(sections.stats.starts_with("Level 2 AC 13"));
        assert!(sections.stats.contains("and bite (+1, 1d6) Speed 40"));
        assert!(sections.stats.ends_with("Encounters 1d6 (30% in lair)"));
        assert_eq!(sections.behaviour, "Sly and hungry, hunts at dusk.");
        assert_eq!(sections.speech, "None");
        assert_eq!(sections.possessions, "None");
        assert_eq!(sections.treasure, "C2");
        assert_eq!(
            sections.ability_lines,
            vec![
                "Pounce (when charging): Attacks twice.",
                "Behaviour: this line is ability text now."
            ]
        );
    }

    #[test]
    fn test_keyword_with_colon_is_metadata() {
        let sections = split_native(&lines("Level 1 AC 11\nHoard: R1\nSpeech: Goblish"));
        assert_eq!(sections.treasure, "R1");
        assert_eq!(sections.speech, "Goblish");
        assert!(sections.ability_lines.is_empty());
    }

    #[test]
    fn test_stat_line_with_colon_stays_stats() {
        let sections = split_native(&lines(
            "Level 1 AC 11 Attacks Bite (+0, 1d4)
             Speed 40 Morale: 9 XP 10
             Behaviour Sly.
             Burrowing: Digs through soil.",
        ));
        assert!(sections.stats.ends_with("Speed 40 Morale: 9 XP 10"));
        assert_eq!(sections.behaviour, "Sly.");
        assert_eq!(sections.ability_lines, vec!["Burrowing: Digs through soil."]);
    }

    #[test]
    fn test_alternate_sections() {
        let sections = split_alternate(&lines(
            "AC 6 [13], HD 1 (4hp), Att 1 × weapon (1d6),
             THAC0 19 [0], MV 60' (20'), ML 7
             ▶ Infravision: 60'.
             ▶ Hate dwarves: Attack on sight.
             Even when outnumbered.",
        ));
        assert_eq!(
            sections.stats,
            "AC 6 [13], HD 1 (4hp), Att 1 × weapon (1d6), THAC0 19 [0], MV 60' (20'), ML 7"
        );
        assert_eq!(
            sections.ability_lines,
            vec![
                "Infravision: 60'.",
                "Hate dwarves: Attack on sight.",
                "Even when outnumbered."
            ]
        );
    }
}
