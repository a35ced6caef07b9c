//! Tonal-center candidates from a weighted vote over chord roots.

use serde::Serialize;
use tracing::debug;

use crate::chord::ParsedChord;
use crate::key::KeySignature;
use crate::types::PitchClass;

const FIRST_CHORD_WEIGHT: f64 = 3.0;
const LAST_CHORD_WEIGHT: f64 = 3.0;
const PER_CHORD_WEIGHT: f64 = 0.5;
const RETURNS_HOME_BONUS: f64 = 5.0;

/// Where a candidate's parent key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentSource {
    /// Given by the caller.
    Supplied,
    /// Assumed: the candidate tonic as a major key.
    Inferred,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TonicCandidate {
    pub tonic: PitchClass,
    pub parent_key: KeySignature,
    pub parent_source: ParentSource,
    /// Vote total; 0.0 for a parent-key root that received no votes.
    pub weight: f64,
}

impl TonicCandidate {
    pub fn parent_supplied(&self) -> bool {
        self.parent_source == ParentSource::Supplied
    }
}

/// Vote for tonal centers and return the strongest, best first.
///
/// Keeps at most `max_candidates` vote winners. A supplied parent key's
/// root is appended when the vote did not already keep it, so both
/// readings get scored.
pub fn resolve_tonic(
    chords: &[ParsedChord],
    parent_key: Option<KeySignature>,
    max_candidates: usize,
) -> Vec<TonicCandidate> {
    let (first, last) = match (chords.first(), chords.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };

    let mut votes = [0.0_f64; 12];
    // First appearance of each root, for stable tie-breaks.
    let mut first_seen = [usize::MAX; 12];

    for (i, chord) in chords.iter().enumerate() {
        let pc = (chord.root % 12) as usize;
        votes[pc] += PER_CHORD_WEIGHT;
        first_seen[pc] = first_seen[pc].min(i);
    }
    votes[first.root as usize] += FIRST_CHORD_WEIGHT;
    votes[last.root as usize] += LAST_CHORD_WEIGHT;
    if first.root == last.root {
        votes[first.root as usize] += RETURNS_HOME_BONUS;
    }

    let mut ranked: Vec<PitchClass> = (0..12u8).filter(|&pc| votes[pc as usize] > 0.0).collect();
    ranked.sort_by(|&a, &b| {
        votes[b as usize]
            .total_cmp(&votes[a as usize])
            .then(first_seen[a as usize].cmp(&first_seen[b as usize]))
    });
    ranked.truncate(max_candidates.max(1));

    let candidate = |tonic: PitchClass| match parent_key {
        Some(key) => TonicCandidate {
            tonic,
            parent_key: key,
            parent_source: ParentSource::Supplied,
            weight: votes[tonic as usize],
        },
        None => TonicCandidate {
            tonic,
            parent_key: KeySignature::major(tonic),
            parent_source: ParentSource::Inferred,
            weight: votes[tonic as usize],
        },
    };

    let mut candidates: Vec<TonicCandidate> = ranked.into_iter().map(&candidate).collect();

    if let Some(key) = parent_key {
        if !candidates.iter().any(|c| c.tonic == key.tonic) {
            candidates.push(candidate(key.tonic));
        }
    }

    debug!(
        candidates = ?candidates.iter().map(|c| (c.tonic, c.weight)).collect::<Vec<_>>(),
        "resolved tonic candidates"
    );

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::parse_chord;

    fn chords(symbols: &[&str]) -> Vec<ParsedChord> {
        symbols.iter().map(|s| parse_chord(s).unwrap()).collect()
    }

    #[test]
    fn returning_home_wins() {
        let candidates = resolve_tonic(&chords(&["G", "F", "C", "G"]), None, 2);
        assert_eq!(candidates[0].tonic, 7);
        // G: 0.5*2 + 3 + 3 + 5 = 12
        assert_eq!(candidates[0].weight, 12.0);
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn ties_keep_first_appearance() {
        // Am and G both get 0.5 + 3
        let candidates = resolve_tonic(&chords(&["Am", "F", "C", "G"]), None, 2);
        assert_eq!(candidates[0].tonic, 9);
        assert_eq!(candidates[1].tonic, 7);
    }

    #[test]
    fn inferred_parent_is_major_on_tonic() {
        let candidates = resolve_tonic(&chords(&["Dm", "G", "Dm"]), None, 1);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].parent_key, KeySignature::major(2));
        assert_eq!(candidates[0].parent_source, ParentSource::Inferred);
    }

    #[test]
    fn supplied_parent_root_is_always_proposed() {
        let parent = KeySignature::major(0);
        let candidates = resolve_tonic(&chords(&["G", "F", "G"]), Some(parent), 1);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].tonic, 7);
        assert_eq!(candidates[1].tonic, 0);
        assert_eq!(candidates[1].weight, 0.0);
        assert!(candidates.iter().all(TonicCandidate::parent_supplied));
    }

    #[test]
    fn supplied_parent_not_duplicated() {
        let parent = KeySignature::major(7);
        let candidates = resolve_tonic(&chords(&["G", "F", "G"]), Some(parent), 2);
        assert_eq!(candidates.iter().filter(|c| c.tonic == 7).count(), 1);
    }

    #[test]
    fn empty_input_has_no_candidates() {
        assert!(resolve_tonic(&[], None, 2).is_empty());
    }
}
