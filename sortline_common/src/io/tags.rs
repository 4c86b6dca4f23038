//! Tag-name matching for points that carry only a Factory I/O tag `name`.
//!
//! Matching runs in three tiers, each over the points not yet claimed:
//! 1. exact match of the normalized name against one of the role's aliases,
//! 2. containment in either direction (closest length wins),
//! 3. best token overlap (at least one shared token).

use std::collections::BTreeSet;

/// Lowercase the name and keep only ASCII alphanumerics and roll signs.
///
/// `"Turntable 0 (Front Limit)"` → `"turntable0frontlimit"`
pub fn normalize(name: &str) -> String {
    name.trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Split a name into lowercase alphanumeric tokens.
pub fn tokens(name: &str) -> BTreeSet<String> {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
        .collect()
}

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Contains,
    Tokens,
}

/// A tag name offered for matching.
#[derive(Debug, Clone)]
pub struct TagCandidate {
    /// Original tag name.
    pub name: String,
    normalized: String,
    tokens: BTreeSet<String>,
}

impl TagCandidate {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            normalized: normalize(name),
            tokens: tokens(name),
        }
    }
}

/// Find the best candidate for a set of aliases.
///
/// `claimed[i]` marks candidates already bound to another role; they are
/// skipped. Returns the candidate index and the tier that matched.
pub fn best_match(
    aliases: &[String],
    candidates: &[TagCandidate],
    claimed: &[bool],
) -> Option<(usize, MatchTier)> {
    let free = || unclaimed(candidates, claimed);
    let normalized: Vec<String> = aliases.iter().map(|a| normalize(a)).collect();

    // Tier 1: exact.
    for alias in &normalized {
        if let Some((i, _)) = free().find(|(_, c)| &c.normalized == alias) {
            return Some((i, MatchTier::Exact));
        }
    }

    // Tier 2: containment, closest length first.
    let mut best: Option<(usize, usize)> = None;
    for alias in normalized.iter().filter(|a| !a.is_empty()) {
        for (i, c) in free() {
            if c.normalized.is_empty() {
                continue;
            }
            if c.normalized.contains(alias.as_str()) || alias.contains(c.normalized.as_str()) {
                let distance = c.normalized.len().abs_diff(alias.len());
                if best.is_none_or(|(_, d)| distance < d) {
                    best = Some((i, distance));
                }
            }
        }
    }
    if let Some((i, _)) = best {
        return Some((i, MatchTier::Contains));
    }

    // Tier 3: token overlap.
    let mut best: Option<(usize, usize)> = None;
    for alias in aliases {
        let alias_tokens = tokens(alias);
        for (i, c) in free() {
            let score = alias_tokens.intersection(&c.tokens).count();
            if score > 0 && best.is_none_or(|(_, s)| score > s) {
                best = Some((i, score));
            }
        }
    }
    best.map(|(i, _)| (i, MatchTier::Tokens))
}

fn unclaimed<'a>(
    candidates: &'a [TagCandidate],
    claimed: &'a [bool],
) -> impl Iterator<Item = (usize, &'a TagCandidate)> + 'a {
    candidates
        .iter()
        .enumerate()
        .filter(move |(i, _)| !claimed.get(*i).copied().unwrap_or(false))
}
