//! Attack segmentation and parsing.
//!
//! Native statblocks mix three attack shapes in one run of text:
//!
//! ```text
//! 2 claws (+2, 1d4) and bite (+2, 1d6 + poison) or breath (3d8) or gaze (paralysis)
//! └─ to-hit ───────┘     └─ to-hit ───────────┘    └ damage ─┘    └ effect-only ┘
//! ```
//!
//! Each shape is matched by its own pass, in that order. A pass only sees text
//! no earlier pass has claimed, so no span is parsed twice. Alternate-grammar
//! attacks are comma/`and`/`or` separated segments of the form `2 × claw (1d4)`.

use crate::models::{AttackEntry, AttackType, NO_DAMAGE, WEAPON_DAMAGE};
use crate::parsers::normalize::sentence_case;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::ops::Range;

const NAME: &str = r"[A-Za-z][A-Za-z'’\- ]*?";
const COUNT: &str = r"(?:(\d+)\s*(?:×\s*)?)?";
const DETAIL: &str = r"(?:[^()]|\([^()]*\))*";

/// Number of distinct attack group letters before wrapping back to `a`.
pub const GROUP_LETTERS: u8 = 6;

lazy_static! {
    static ref ATTACK_MARKER: Regex = Regex::new(r"\bAtt(?:acks?)?\b\s*:?\s*").unwrap();
    static ref NATIVE_STOP: Regex =
        Regex::new(r"\b(?:Speed|Fly|Swim|Climb|Burrow|Morale|XP|Encounters?|Enc)\b").unwrap();
    static ref ALTERNATE_STOP: Regex = Regex::new(r"\b(?:THAC0|MV)\b").unwrap();

    static ref TO_HIT_ATTACK: Regex = Regex::new(&format!(
        r"{COUNT}\b({NAME})\s*\(\s*([+-]\s*\d+)\s*[,;]\s*({DETAIL})\)"
    ))
    .unwrap();
    static ref DAMAGE_ATTACK: Regex = Regex::new(&format!(
        r"{COUNT}\b({NAME})\s*\(\s*(\d+d\d+(?:\s*[+-]\s*\d+\b)?)\s*(?:[,;]\s*({DETAIL}))?\)"
    ))
    .unwrap();
    static ref EFFECT_ATTACK: Regex =
        Regex::new(&format!(r"{COUNT}\b({NAME})\s*\(([^(),]*)\)")).unwrap();

    static ref RANGE_TRIPLE: Regex = Regex::new(
        r"(?i)[,;]?\s*(?:range\s*)?(\d+)\s*/\s*(\d+)\s*/\s*(\d+)\s*(?:'|′|ft\.?|feet)?"
    )
    .unwrap();
    static ref WHEN_MOUNTED: Regex =
        Regex::new(r"(?i)[,;]?\s*\(?\s*\bwhen\s+mounted\b\s*\)?").unwrap();
    static ref SAVE_PHRASE: Regex =
        Regex::new(r"(?i)[,;]?\s*\b(save\s+(?:versus|vs\.?)\s+.*)$").unwrap();
    static ref ALTERNATIVE_DAMAGE: Regex =
        Regex::new(r"(?i)^(\d+d\d+(?:\s*[+-]\s*\d+\b)?|\d+)\s+or\s+(.+)$").unwrap();
    static ref DICE_WITH_TEXT: Regex = Regex::new(
        r"(?i)^(\d+d\d+(?:\s*[+-]\s*\d+\b)?)\s*(?:\+|plus\b|,|and\b)?\s*([^\d\s].*)$"
    )
    .unwrap();
    static ref DICE_TOKEN: Regex = Regex::new(r"(?i)\b\d+d\d+(?:\s*[+-]\s*\d+\b)?").unwrap();
    static ref SIGNED_INT: Regex = Regex::new(r"^[+-]\s*\d+$").unwrap();

    static ref LEADING_CONNECTIVE: Regex = Regex::new(r"(?i)^(?:(or|and)\b\s*)+").unwrap();
    static ref OR_WORD: Regex = Regex::new(r"(?i)\bor\b").unwrap();
    static ref ALTERNATE_SEGMENT: Regex =
        Regex::new(r"(?i)^(?:(\d+)\s*(?:×|x\b)?\s*)?(.+?)\s*(?:\((.*)\))?$").unwrap();
}

/// How an attack is joined to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separator {
    /// `and` or a comma: usable together.
    Together,
    /// `or`: an alternative, starts a new group.
    Alternative,
}

/// Byte ranges of the attack text already consumed by a pass.
#[derive(Debug, Default)]
struct ClaimedSpans {
    spans: Vec<Range<usize>>,
}

impl ClaimedSpans {
    fn contains(&self, idx: usize) -> bool {
        self.spans.iter().any(|span| span.contains(&idx))
    }

    fn claim(&mut self, span: Range<usize>) {
        self.spans.push(span);
    }

    /// The text with claimed spans blanked; byte offsets are unchanged.
    fn unclaimed_view(&self, text: &str) -> String {
        let mut view = String::with_capacity(text.len());
        for (idx, ch) in text.char_indices() {
            if self.contains(idx) {
                view.extend(std::iter::repeat_n(' ', ch.len_utf8()));
            } else {
                view.push(ch);
            }
        }
        view
    }
}

/// An attack with its position in the attack text.
#[derive(Debug)]
struct LocatedAttack {
    span: Range<usize>,
    connective: Option<Separator>,
    entry: AttackEntry,
}

/// Find the attack text in a stats string: after `Att`/`Attacks` up to the
/// first `stop` marker outside parentheses.
fn attack_text(stats: &str, stop: &Regex) -> Option<String> {
    let marker = ATTACK_MARKER.find(stats)?;
    let rest = &stats[marker.end()..];

    let end = stop
        .find_iter(rest)
        .find(|m| paren_depth(&rest[..m.start()]) == 0)
        .map(|m| m.start())
        .unwrap_or(rest.len());

    let text = rest[..end].trim().trim_end_matches([',', ';']).trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn paren_depth(text: &str) -> i32 {
    text.chars().fold(0, |depth, ch| match ch {
        '(' => depth + 1,
        ')' => (depth - 1).max(0),
        _ => depth,
    })
}

pub fn native_attack_text(stats: &str) -> Option<String> {
    attack_text(stats, &NATIVE_STOP)
}

pub fn alternate_attack_text(stats: &str) -> Option<String> {
    attack_text(stats, &ALTERNATE_STOP)
}

fn strip_grouping_brackets(text: &str) -> String {
    text.chars().filter(|c| *c != '[' && *c != ']').collect()
}

fn leading_connective(text: &str) -> Option<Separator> {
    LEADING_CONNECTIVE.find(text).map(|m| {
        if m.as_str().to_lowercase().split_whitespace().any(|w| w == "or") {
            Separator::Alternative
        } else {
            Separator::Together
        }
    })
}

/// Strip `or`/`and` artifacts from a name and sentence-case it.
fn clean_name(raw: &str) -> (String, Option<Separator>) {
    let trimmed = raw.trim();
    let name = LEADING_CONNECTIVE.replace(trimmed, "");
    (sentence_case(&name), leading_connective(trimmed))
}

fn parse_count(caps: &Captures) -> u32 {
    caps.get(1)
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(1)
}

fn parse_bonus(raw: &str) -> i32 {
    raw.split_whitespace().collect::<String>().parse().unwrap_or(0)
}

/// Damage, effect and ranges recovered from the clause after the bonus.
#[derive(Debug, Default, PartialEq)]
struct AttackDetail {
    damage: String,
    effect: String,
    ranges: (i32, i32, i32),
}

fn tidy(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .to_string()
}

fn decompose_detail(detail: &str) -> AttackDetail {
    let mut rest = detail.trim().to_string();
    let mut result = AttackDetail::default();

    if let Some(caps) = RANGE_TRIPLE.captures(&rest) {
        let value = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        result.ranges = (value(1), value(2), value(3));
        let span = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        rest.replace_range(span, "");
    }

    let mounted = WHEN_MOUNTED.is_match(&rest);
    if mounted {
        rest = WHEN_MOUNTED.replace(&rest, "").into_owned();
    }

    let mut save = None;
    if let Some(caps) = SAVE_PHRASE.captures(&rest) {
        save = caps.get(1).map(|m| tidy(m.as_str()));
        let start = caps.get(0).map(|m| m.start()).unwrap_or(rest.len());
        rest.truncate(start);
    }

    let rest = tidy(&rest);
    let mut effects = Vec::new();

    if let Some(caps) = ALTERNATIVE_DAMAGE.captures(&rest) {
        result.damage = caps[1].to_string();
        effects.push(format!("or {}", caps[2].trim()));
    } else if let Some(caps) = DICE_WITH_TEXT.captures(&rest) {
        result.damage = caps[1].to_string();
        effects.push(tidy(&caps[2]));
    } else if !rest.is_empty() {
        result.damage = rest.clone();
    } else {
        result.damage = NO_DAMAGE.to_string();
    }

    if mounted {
        effects.push("when mounted".to_string());
    }
    effects.extend(save);

    result.effect = effects
        .into_iter()
        .filter(|e| !e.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    result
}

/// Run one pass over the unclaimed text and claim every match.
fn run_pass<F>(text: &str, pattern: &Regex, claims: &mut ClaimedSpans, mut build: F) -> Vec<LocatedAttack>
where
    F: FnMut(&Captures) -> Option<AttackEntry>,
{
    let view = claims.unclaimed_view(text);
    let mut found = Vec::new();

    for caps in pattern.captures_iter(&view) {
        let (Some(whole), Some(raw_name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let Some(mut entry) = build(&caps) else {
            continue;
        };
        let (name, connective) = clean_name(raw_name.as_str());
        if name.is_empty() {
            continue;
        }
        entry.attack_name = name;
        entry.num_attacks = parse_count(&caps);
        found.push(LocatedAttack {
            span: whole.range(),
            connective,
            entry,
        });
    }

    for attack in &found {
        claims.claim(attack.span.clone());
    }
    found
}

fn group_letter(index: usize) -> char {
    (b'a' + (index % GROUP_LETTERS as usize) as u8) as char
}

/// Order attacks by position and assign group letters.
fn assign_groups(text: &str, mut attacks: Vec<LocatedAttack>) -> Vec<AttackEntry> {
    attacks.sort_by_key(|a| a.span.start);

    let mut group = 0usize;
    let mut previous_end: Option<usize> = None;
    let mut entries = Vec::with_capacity(attacks.len());

    for mut attack in attacks {
        if let Some(end) = previous_end {
            let gap = text.get(end..attack.span.start).unwrap_or("");
            let alternative = attack.connective == Some(Separator::Alternative) || OR_WORD.is_match(gap);
            if alternative {
                group += 1;
            }
        }
        attack.entry.attack_group = group_letter(group);
        previous_end = Some(attack.span.end);
        entries.push(attack.entry);
    }

    entries
}

/// Parse native-grammar attack text.
pub fn parse_native_attacks(text: &str) -> Vec<AttackEntry> {
    let text = strip_grouping_brackets(text);
    let mut claims = ClaimedSpans::default();
    let mut attacks = Vec::new();

    attacks.extend(run_pass(&text, &TO_HIT_ATTACK, &mut claims, |caps| {
        let detail = decompose_detail(caps.get(4).map(|m| m.as_str()).unwrap_or(""));
        Some(AttackEntry {
            attack_bonus: parse_bonus(&caps[3]),
            attack_damage: detail.damage,
            attack_effect: detail.effect,
            attack_type: AttackType::Attack,
            range_short: detail.ranges.0,
            range_medium: detail.ranges.1,
            range_long: detail.ranges.2,
            ..AttackEntry::default()
        })
    }));

    attacks.extend(run_pass(&text, &DAMAGE_ATTACK, &mut claims, |caps| {
        let clause = match caps.get(4) {
            Some(extra) => format!("{}, {}", &caps[3], extra.as_str()),
            None => caps[3].to_string(),
        };
        let detail = decompose_detail(&clause);
        Some(AttackEntry {
            attack_damage: detail.damage,
            attack_effect: detail.effect,
            attack_type: AttackType::Attack,
            range_short: detail.ranges.0,
            range_medium: detail.ranges.1,
            range_long: detail.ranges.2,
            ..AttackEntry::default()
        })
    }));

    attacks.extend(run_pass(&text, &EFFECT_ATTACK, &mut claims, |caps| {
        let clause = caps[3].trim();
        let name = LEADING_CONNECTIVE.replace(caps[2].trim(), "").to_lowercase();
        if (name == "weapon" || name == "weapons") && SIGNED_INT.is_match(clause) {
            return Some(AttackEntry {
                attack_bonus: parse_bonus(clause),
                attack_damage: WEAPON_DAMAGE.to_string(),
                attack_type: AttackType::Attack,
                ..AttackEntry::default()
            });
        }
        Some(AttackEntry {
            attack_damage: NO_DAMAGE.to_string(),
            attack_effect: clause.to_string(),
            attack_type: AttackType::Save,
            ..AttackEntry::default()
        })
    }));

    tracing::trace!("Parsed {} native attacks from: {}", attacks.len(), text);
    assign_groups(&text, attacks)
}

/// Split at top-level `,`, ` and `, ` or `, never inside parentheses.
fn split_segments(text: &str) -> Vec<(Separator, String)> {
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut separator = Separator::Together;
    let mut idx = 0usize;

    let word_at = |idx: usize, word: &str| {
        text.get(idx..idx + word.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(word))
    };

    while let Some(ch) = text[idx..].chars().next() {
        match ch {
            '(' => depth += 1,
            ')' => depth = (depth - 1).max(0),
            _ => {}
        }

        if depth == 0 {
            let boundary = if ch == ',' {
                Some((Separator::Together, 1))
            } else if word_at(idx, " or ") {
                Some((Separator::Alternative, 4))
            } else if word_at(idx, " and ") {
                Some((Separator::Together, 5))
            } else {
                None
            };

            if let Some((next, width)) = boundary {
                segments.push((separator, text[start..idx].to_string()));
                separator = next;
                idx += width;
                start = idx;
                continue;
            }
        }
        idx += ch.len_utf8();
    }
    segments.push((separator, text[start..].to_string()));
    segments
}

fn parse_alternate_segment(segment: &str, attack_bonus: i32) -> Option<AttackEntry> {
    let caps = ALTERNATE_SEGMENT.captures(segment.trim())?;
    let name = sentence_case(caps.get(2)?.as_str());
    if name.is_empty() {
        return None;
    }
    let mut entry = AttackEntry {
        num_attacks: parse_count(&caps),
        attack_name: name,
        ..AttackEntry::default()
    };

    match caps.get(3).map(|m| m.as_str().trim()) {
        Some(bracket) => match DICE_TOKEN.find(bracket) {
            Some(dice) => {
                entry.attack_damage = dice.as_str().split_whitespace().collect();
                let remainder = format!("{}{}", &bracket[..dice.start()], &bracket[dice.end()..]);
                let remainder = tidy(&remainder);
                let remainder = remainder
                    .trim_start_matches(|c: char| c == '+' || c.is_whitespace())
                    .trim_start_matches("plus ");
                entry.attack_effect = tidy(remainder);
                entry.attack_bonus = attack_bonus;
                entry.attack_type = AttackType::Attack;
            }
            None => {
                entry.attack_damage = NO_DAMAGE.to_string();
                entry.attack_effect = bracket.to_string();
                entry.attack_type = AttackType::Save;
            }
        },
        None => {
            entry.attack_bonus = attack_bonus;
            entry.attack_type = AttackType::Attack;
        }
    }
    Some(entry)
}

/// Parse alternate-grammar attack text; `attack_bonus` comes from the THAC0 field.
pub fn parse_alternate_attacks(text: &str, attack_bonus: Option<i32>) -> Vec<AttackEntry> {
    let text = strip_grouping_brackets(text);
    let bonus = attack_bonus.unwrap_or(0);

    let mut entries = Vec::new();
    let mut group = 0usize;
    let mut pending_alternative = false;

    for (separator, segment) in split_segments(&text) {
        let trimmed = segment.trim();
        let connective = leading_connective(trimmed);
        let stripped = LEADING_CONNECTIVE.replace(trimmed, "");

        pending_alternative |= separator == Separator::Alternative
            || connective == Some(Separator::Alternative);

        let Some(mut entry) = parse_alternate_segment(&stripped, bonus) else {
            continue;
        };
        if !entries.is_empty() && pending_alternative {
            group += 1;
        }
        pending_alternative = false;
        entry.attack_group = group_letter(group);
        entries.push(entry);
    }

    entries
}
