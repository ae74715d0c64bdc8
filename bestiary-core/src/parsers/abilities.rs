//! Special-ability block parsing.

use crate::models::AbilityEntry;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `Name (optional qualifier): description`, name capitalized and at most 40 chars.
    static ref ABILITY_OPENER: Regex =
        Regex::new(r"^([A-Z][^:()]{0,39}?)\s*(?:\(([^()]*)\))?\s*:\s*(.*)$").unwrap();
    static ref BULLET: Regex = Regex::new(r"^(?:[▶►•*·—-]\s*)+").unwrap();
}

/// The opening line of an ability, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbilityOpener {
    /// Full display name, qualifier included.
    pub name: String,
    pub base: String,
    pub qualifier: Option<String>,
    pub description: String,
}

pub fn parse_ability_opener(line: &str) -> Option<AbilityOpener> {
    let caps = ABILITY_OPENER.captures(line.trim())?;
    let base = caps.get(1)?.as_str().trim().to_string();
    let qualifier = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|q| !q.is_empty());
    let name = match &qualifier {
        Some(q) => format!("{} ({})", base, q),
        None => base.clone(),
    };

    Some(AbilityOpener {
        name,
        base,
        qualifier,
        description: caps.get(3).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
    })
}

/// Remove list bullets such as `▶` or `•` from the start of a line.
pub fn strip_bullet(line: &str) -> &str {
    match BULLET.find(line) {
        Some(m) => line[m.end()..].trim_start(),
        None => line,
    }
}

/// Group ability lines into entries; lines before the first opener are dropped.
pub fn parse_abilities(lines: &[String]) -> Vec<AbilityEntry> {
    let mut abilities: Vec<AbilityEntry> = Vec::new();

    for line in lines {
        let line = strip_bullet(line);
        if let Some(opener) = parse_ability_opener(line) {
            abilities.push(AbilityEntry {
                name: opener.name,
                description: opener.description,
            });
            continue;
        }

        match abilities.last_mut() {
            Some(current) => {
                if !current.description.is_empty() {
                    current.description.push(' ');
                }
                current.description.push_str(line.trim());
            }
            None => tracing::debug!("Dropping text before first ability: {}", line),
        }
    }

    abilities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_opener_with_qualifier() {
        let opener = parse_ability_opener("Paralysis (DC 15): Victims cannot move.").unwrap();
        assert_eq!(opener.name, "Paralysis (DC 15)");
        assert_eq!(opener.base, "Paralysis");
        assert_eq!(opener.qualifier.as_deref(), Some("DC 15"));
        assert_eq!(opener.description, "Victims cannot move.");
    }

    #[test]
    fn test_opener_rejects_lowercase_and_long_names() {
        assert!(parse_ability_opener("note: lowercase").is_none());
        assert!(parse_ability_opener(
            "This sentence is far too long to be an ability name really: text"
        )
        .is_none());
        assert!(parse_ability_opener("No colon here").is_none());
    }

    #[test]
    fn test_multiline_abilities() {
        let abilities = parse_abilities(&lines(&[
            "stray preamble",
            "Dark sight: Can see in darkness.",
            "Even magical darkness.",
            "▶ Regeneration (1 HP/round): Heals each round.",
        ]));
        assert_eq!(abilities.len(), 2);
        assert_eq!(abilities[0].name, "Dark sight");
        assert_eq!(abilities[0].description, "Can see in darkness. Even magical darkness.");
        assert_eq!(abilities[1].name, "Regeneration (1 HP/round)");
        assert_eq!(abilities[1].description, "Heals each round.");
    }

    #[test]
    fn test_strip_bullet() {
        assert_eq!(strip_bullet("▶ Infravision: 60'"), "Infravision: 60'");
        assert_eq!(strip_bullet("• Fly"), "Fly");
        assert_eq!(strip_bullet("Plain"), "Plain");
    }
}
