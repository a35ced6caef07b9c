//! Typed evidence for one tonic candidate.

use crate::chord::{ParsedChord, Triad};
use crate::notes;
use crate::patterns::VampPattern;
use crate::tonic::TonicCandidate;
use crate::types::{interval_above, Evidence};

const FRAMED_BY_TONIC: f64 = 0.8;
const OPENS_AND_CLOSES_ON_TONIC: f64 = 0.75;
const CLOSES_ON_TONIC: f64 = 0.7;
const VAMP: f64 = 0.75;
const FLAT_SEVEN_CADENCE: f64 = 0.85;
const FLAT_TWO_CADENCE: f64 = 0.9;
const DEGREE_PRESENT: f64 = 0.7;
const DIFFERS_FROM_PARENT: f64 = 0.6;

/// Collect the evidence for reading `candidate.tonic` as home.
pub fn collect_evidence(
    chords: &[ParsedChord],
    candidate: &TonicCandidate,
    vamp: Option<&VampPattern>,
) -> Vec<Evidence> {
    let mut evidence = Vec::new();
    let (first, last) = match (chords.first(), chords.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return evidence,
    };

    let tonic = candidate.tonic;
    let interval = |chord: &ParsedChord| interval_above(tonic, chord.root);

    if first.same_harmony(last) && first.root == tonic {
        evidence.push(Evidence::structural(
            FRAMED_BY_TONIC,
            format!("Opens and closes on the same tonic chord ({})", first.symbol),
        ));
    } else if first.root == tonic && last.root == tonic {
        evidence.push(Evidence::structural(
            OPENS_AND_CLOSES_ON_TONIC,
            format!("Opens and closes on the tonic ({} … {})", first.symbol, last.symbol),
        ));
    } else if last.root == tonic {
        evidence.push(Evidence::structural(
            CLOSES_ON_TONIC,
            format!("Resolves to the tonic ({})", last.symbol),
        ));
    }

    if let Some(vamp) = vamp {
        evidence.push(Evidence::structural(
            VAMP,
            format!("Two-chord vamp {} establishes the tonic by repetition", vamp.label()),
        ));
    }

    let resolves_from = |from: u8| {
        chords.windows(2).any(|pair| {
            interval(&pair[0]) == from && pair[0].quality.triad() == Triad::Major && interval(&pair[1]) == 0
        })
    };
    if resolves_from(10) {
        evidence.push(Evidence::cadential(FLAT_SEVEN_CADENCE, "bVII → I cadence (Mixolydian)"));
    }
    if resolves_from(1) {
        evidence.push(Evidence::cadential(FLAT_TWO_CADENCE, "bII → i cadence (Phrygian)"));
    }

    if chords.iter().any(|c| interval(c) == 10) {
        evidence.push(Evidence::intervallic(DEGREE_PRESENT, "bVII chord present (flattened 7th)"));
    }
    if chords.iter().any(|c| interval(c) == 1) {
        evidence.push(Evidence::intervallic(DEGREE_PRESENT, "bII chord present (flattened 2nd)"));
    }

    if candidate.parent_supplied() && candidate.parent_key.tonic != tonic {
        evidence.push(Evidence::contextual(
            DIFFERS_FROM_PARENT,
            format!(
                "Tonic {} differs from the parent key {}: a mode of that key",
                notes::note_name(tonic, candidate.parent_key.prefers_flats()),
                candidate.parent_key
            ),
        ));
    }

    evidence
}
