//! Chromatic elements: secondary dominants, borrowed chords, mediants.

use serde::Serialize;

use crate::chord::{ChordQuality, Triad};
use crate::functional::{FunctionalAnalysis, FunctionalChord};
use crate::key::KeySignature;

const RESOLVED_SECONDARY: f64 = 0.9;
const UNRESOLVED_SECONDARY: f64 = 0.8;
const BORROWED: f64 = 0.75;
const MEDIANT: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChromaticKind {
    SecondaryDominant,
    BorrowedChord,
    ChromaticMediant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChromaticElement {
    pub kind: ChromaticKind,
    pub symbol: String,
    pub numeral: String,
    /// Index among the parsed chords.
    pub position: usize,
    /// Secondary target numeral, or the key a borrowed chord comes from.
    pub target: Option<String>,
    /// A secondary dominant moved to its target.
    pub resolves: bool,
    pub strength: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChromaticAnalysis {
    pub elements: Vec<ChromaticElement>,
    pub secondary_dominants: usize,
    pub borrowed_chords: usize,
    pub chromatic_mediants: usize,
    /// Mean element strength.
    pub confidence: f64,
}

impl ChromaticAnalysis {
    pub fn has_secondary_dominants(&self) -> bool {
        self.secondary_dominants > 0
    }
}

/// Classify a non-diatonic chord. Checked in order: secondary dominant,
/// borrowed from the parallel key (including the Neapolitan bII), then
/// chromatic mediant.
pub fn classify_chromatic(
    chord: &FunctionalChord,
    position: usize,
    next: Option<&FunctionalChord>,
    key: &KeySignature,
) -> Option<ChromaticElement> {
    if chord.diatonic {
        return None;
    }

    let numeral = chord.numeral.to_string();
    let element = |kind, target: Option<String>, resolves, strength, description: String| ChromaticElement {
        kind,
        symbol: chord.symbol.clone(),
        numeral: numeral.clone(),
        position,
        target,
        resolves,
        strength,
        description,
    };

    if let Some(target) = &chord.numeral.of {
        let target_interval = target.interval();
        let resolves = next.is_some_and(|n| n.interval == target_interval);
        let description = if resolves {
            format!("Secondary dominant {} ({}) resolves to {}", numeral, chord.symbol, target)
        } else {
            format!("Secondary dominant {} ({}) toward {}", numeral, chord.symbol, target)
        };
        return Some(element(
            ChromaticKind::SecondaryDominant,
            Some(target.to_string()),
            resolves,
            if resolves { RESOLVED_SECONDARY } else { UNRESOLVED_SECONDARY },
            description,
        ));
    }

    let parallel = KeySignature {
        tonic: key.tonic,
        is_minor: !key.is_minor,
    };
    let neapolitan = chord.interval == 1 && chord.quality == ChordQuality::Major;
    if parallel.is_diatonic(chord.root, chord.quality) || neapolitan {
        let description = if neapolitan {
            format!("Neapolitan {} ({}) borrowed from {}", numeral, chord.symbol, parallel)
        } else {
            format!("Borrowed chord {} ({}) from {}", numeral, chord.symbol, parallel)
        };
        return Some(element(
            ChromaticKind::BorrowedChord,
            Some(parallel.to_string()),
            false,
            BORROWED,
            description,
        ));
    }

    let mediant_interval = matches!(chord.interval, 3 | 4 | 8 | 9);
    let mediant_triad = matches!(chord.quality.triad(), Triad::Major | Triad::Minor);
    if mediant_interval && mediant_triad {
        return Some(element(
            ChromaticKind::ChromaticMediant,
            None,
            false,
            MEDIANT,
            format!("Chromatic mediant {} ({})", numeral, chord.symbol),
        ));
    }

    None
}

/// Summarise the chromatic elements a functional reading found.
pub fn scan_chromatic(functional: &FunctionalAnalysis) -> Option<ChromaticAnalysis> {
    let elements = functional.chromatic_elements.clone();
    if elements.is_empty() {
        return None;
    }

    let count = |kind| elements.iter().filter(|e| e.kind == kind).count();
    let confidence = elements.iter().map(|e| e.strength).sum::<f64>() / elements.len() as f64;

    Some(ChromaticAnalysis {
        secondary_dominants: count(ChromaticKind::SecondaryDominant),
        borrowed_chords: count(ChromaticKind::BorrowedChord),
        chromatic_mediants: count(ChromaticKind::ChromaticMediant),
        confidence,
        elements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::Progression;
    use crate::functional::analyze_functional;
    use modeconf::AnalysisConfig;

    fn scan(symbols: &[&str], key: &str) -> Option<ChromaticAnalysis> {
        let progression = Progression::parse_lenient(symbols);
        let functional =
            analyze_functional(&progression, Some(key.parse().unwrap()), &AnalysisConfig::default()).unwrap();
        scan_chromatic(&functional)
    }

    #[test]
    fn resolved_secondary_dominant() {
        let chromatic = scan(&["C", "A7", "Dm", "G", "C"], "C major").unwrap();
        assert_eq!(chromatic.secondary_dominants, 1);
        let element = &chromatic.elements[0];
        assert_eq!(element.numeral, "V7/ii");
        assert_eq!(element.target.as_deref(), Some("ii"));
        assert!(element.resolves);
        assert_eq!(element.strength, 0.9);
        assert_eq!(chromatic.confidence, 0.9);
    }

    #[test]
    fn unresolved_secondary_dominant() {
        let chromatic = scan(&["C", "E", "F", "C"], "C major").unwrap();
        assert_eq!(chromatic.elements[0].numeral, "V/vi");
        assert!(!chromatic.elements[0].resolves);
        assert_eq!(chromatic.elements[0].strength, 0.8);
    }

    #[test]
    fn borrowed_from_parallel_minor() {
        let chromatic = scan(&["C", "Fm", "C"], "C major").unwrap();
        assert_eq!(chromatic.borrowed_chords, 1);
        assert_eq!(chromatic.elements[0].target.as_deref(), Some("C minor"));

        let chromatic = scan(&["C", "Ab", "Bb", "C"], "C major").unwrap();
        assert_eq!(chromatic.borrowed_chords, 2);
        assert_eq!(chromatic.confidence, 0.75);
    }

    #[test]
    fn neapolitan_counts_as_borrowed() {
        let chromatic = scan(&["C", "Db", "G", "C"], "C major").unwrap();
        assert_eq!(chromatic.elements[0].kind, ChromaticKind::BorrowedChord);
        assert!(chromatic.elements[0].description.starts_with("Neapolitan"));
    }

    #[test]
    fn chromatic_mediant() {
        let chromatic = scan(&["C", "Abm", "C"], "C major").unwrap();
        assert_eq!(chromatic.chromatic_mediants, 1);
        assert_eq!(chromatic.elements[0].strength, 0.7);
    }

    #[test]
    fn diatonic_progression_has_no_chromatic_analysis() {
        assert!(scan(&["C", "F", "G", "C"], "C major").is_none());
    }
}
