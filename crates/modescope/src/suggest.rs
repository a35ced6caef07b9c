//! Rank modal readings of a bare pitch-class collection.

use serde::Serialize;
use tracing::debug;

use crate::key::{estimate_key, KeyEstimate, KeySignature};
use crate::modes::Mode;
use crate::notes::note_name;
use crate::types::PitchClass;

const COVERAGE_WEIGHT: f64 = 0.7;
const COMPLETENESS_WEIGHT: f64 = 0.3;
const HINT_BONUS: f64 = 0.1;
const SCORE_CEILING: f64 = 0.95;
const MIN_DISTINCT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeSuggestion {
    pub tonic: PitchClass,
    pub mode: Mode,
    /// e.g. "D Dorian"
    pub name: String,
    pub parent_key: KeySignature,
    pub parent_key_name: String,
    pub score: f64,
    /// Share of the input inside the scale.
    pub coverage: f64,
    /// Share of the scale present in the input.
    pub completeness: f64,
    pub missing: Vec<String>,
    pub outside: Vec<String>,
}

/// Distinct pitch classes of `notes` in ascending order. MIDI numbers
/// reduce mod 12.
pub fn pitch_class_set(notes: &[u8]) -> Vec<PitchClass> {
    let mut set: Vec<PitchClass> = notes.iter().map(|n| n % 12).collect();
    set.sort_unstable();
    set.dedup();
    set
}

/// Every tonic × mode reading of `notes`, best first, at most `limit`.
///
/// Returns an empty list for fewer than three distinct pitch classes.
pub fn suggest_modes(notes: &[u8], tonic_hint: Option<PitchClass>, limit: usize) -> Vec<ModeSuggestion> {
    let set = pitch_class_set(notes);
    if set.len() < MIN_DISTINCT {
        debug!(distinct = set.len(), "too few pitch classes to suggest modes");
        return Vec::new();
    }
    let hint = tonic_hint.map(|h| h % 12);

    let mut suggestions: Vec<ModeSuggestion> = (0..12u8)
        .flat_map(|tonic| Mode::ALL.into_iter().map(move |mode| (tonic, mode)))
        .map(|(tonic, mode)| score(&set, tonic, mode, hint))
        .collect();

    suggestions.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| (Some(b.tonic) == hint).cmp(&(Some(a.tonic) == hint)))
            .then_with(|| a.tonic.cmp(&b.tonic))
            .then_with(|| a.mode.cmp(&b.mode))
    });
    suggestions.truncate(limit);
    suggestions
}

fn score(set: &[PitchClass], tonic: PitchClass, mode: Mode, hint: Option<PitchClass>) -> ModeSuggestion {
    let scale: Vec<PitchClass> = mode.intervals().iter().map(|i| (tonic + i) % 12).collect();
    let parent_key = mode.parent_key(tonic);
    let flats = parent_key.prefers_flats();

    let inside = set.iter().filter(|pc| scale.contains(pc)).count();
    let coverage = inside as f64 / set.len() as f64;
    let completeness = inside as f64 / scale.len() as f64;

    let mut score = COVERAGE_WEIGHT * coverage + COMPLETENESS_WEIGHT * completeness;
    if hint == Some(tonic) {
        score += HINT_BONUS;
    }

    ModeSuggestion {
        tonic,
        mode,
        name: format!("{} {}", note_name(tonic, flats), mode),
        parent_key_name: parent_key.to_string(),
        parent_key,
        score: score.clamp(0.0, SCORE_CEILING),
        coverage,
        completeness,
        missing: scale
            .iter()
            .filter(|pc| !set.contains(pc))
            .map(|&pc| note_name(pc, flats).to_string())
            .collect(),
        outside: set
            .iter()
            .filter(|pc| !scale.contains(pc))
            .map(|&pc| note_name(pc, flats).to_string())
            .collect(),
    }
}

/// Count each note once into a 12-bin histogram.
pub fn histogram(notes: &[u8]) -> [f64; 12] {
    let mut bins = [0.0; 12];
    for note in notes {
        bins[(note % 12) as usize] += 1.0;
    }
    bins
}

/// Major/minor key estimate for a note collection, repeats weighted.
pub fn estimate_key_from_notes(notes: &[u8]) -> Option<KeyEstimate> {
    estimate_key(&histogram(notes))
}
