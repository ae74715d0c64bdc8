//! Resolves attack effect text against the parsed special abilities.

use crate::models::{AbilityEntry, AttackEntry};

pub const SEE_BELOW: &str = "see below";
pub const SEE_SPECIAL_ABILITIES: &str = "see special abilities";

/// Lowercased, trimmed and de-pluralized comparison form.
fn match_key(text: &str) -> String {
    let lower = text.trim().trim_end_matches('.').trim().to_lowercase();
    if lower.ends_with("ies") && lower.len() > 4 {
        format!("{}y", &lower[..lower.len() - 3])
    } else if lower.ends_with('s') && !lower.ends_with("ss") && lower.len() > 3 {
        lower[..lower.len() - 1].to_string()
    } else {
        lower
    }
}

fn find_ability<'a>(abilities: &'a [AbilityEntry], key: &str) -> Option<&'a AbilityEntry> {
    let key = match_key(key);
    if key.is_empty() {
        return None;
    }
    abilities.iter().find(|ability| match_key(ability.base_name()) == key)
}

/// Keys to try for an attack, highest priority first.
fn candidate_keys(attack: &AttackEntry) -> Vec<String> {
    let effect = attack.attack_effect.trim();
    let placeholder = effect.is_empty() || effect.eq_ignore_ascii_case(SEE_BELOW);
    let mut keys = Vec::new();

    if placeholder {
        keys.push(attack.attack_name.clone());
    } else {
        let name = attack.attack_name.trim();
        keys.push(effect.to_string());
        keys.push(format!("{}ing {}", effect, name));
        if let Some(stem) = effect.strip_suffix('e') {
            keys.push(format!("{}ing {}", stem, name));
        }
    }
    keys
}

fn resolved_effect(ability: &AbilityEntry) -> String {
    match ability.qualifier() {
        Some(qualifier) => format!("({}) {}", qualifier, ability.description),
        None => ability.description.clone(),
    }
}

/// Replace effect placeholders and ability names with ability descriptions.
///
/// When several abilities share a name the first one in list order wins.
pub fn resolve_effects(attacks: &mut [AttackEntry], abilities: &[AbilityEntry]) {
    for attack in attacks.iter_mut() {
        let resolved = candidate_keys(attack)
            .iter()
            .find_map(|key| find_ability(abilities, key));

        match resolved {
            Some(ability) => {
                tracing::trace!(
                    "Resolved effect of '{}' via ability '{}'",
                    attack.attack_name,
                    ability.name
                );
                attack.attack_effect = resolved_effect(ability);
            }
            None if attack.attack_effect.trim().eq_ignore_ascii_case(SEE_BELOW) => {
                attack.attack_effect = SEE_SPECIAL_ABILITIES.to_string();
            }
            None => {}
        }
    }
}
