//! Static pattern tables and the matchers that run over them.
//!
//! Sequences are written as normalized Roman numeral tokens; matching runs
//! against normalized numerals, so extensions never prevent a match.

use serde::Serialize;
use tracing::debug;

use crate::modes::Mode::{self, *};
use crate::roman::{self, Accidental, RomanNumeral};
use PatternContext::{Cadential, Structural};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternContext {
    Structural,
    Cadential,
}

/// A known progression shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternTemplate {
    pub sequence: &'static [&'static str],
    pub strength: f64,
    /// Modes this shape points to; several for ambiguous shapes.
    pub modes: &'static [Mode],
    pub context: PatternContext,
}

impl PatternTemplate {
    pub fn label(&self) -> String {
        self.sequence.join("-")
    }
}

const fn template(
    sequence: &'static [&'static str],
    strength: f64,
    modes: &'static [Mode],
    context: PatternContext,
) -> PatternTemplate {
    PatternTemplate {
        sequence,
        strength,
        modes,
        context,
    }
}

/// Plain tonal shapes. An exact match on a progression free of modal
/// colour rules out a modal reading.
pub static FUNCTIONAL_PATTERNS: [PatternTemplate; 11] = [
    template(&["I", "IV", "V", "I"], 0.95, &[], Cadential),
    template(&["I", "V", "I"], 0.9, &[], Cadential),
    template(&["ii", "V", "I"], 0.9, &[], Cadential),
    template(&["i", "iv", "V", "i"], 0.9, &[], Cadential),
    template(&["I", "ii", "V", "I"], 0.9, &[], Cadential),
    template(&["I", "IV", "V"], 0.85, &[], Structural),
    template(&["vi", "IV", "I", "V"], 0.85, &[], Structural),
    template(&["I", "V", "vi", "IV"], 0.85, &[], Structural),
    template(&["I", "vi", "IV", "V"], 0.85, &[], Structural),
    template(&["IV", "V", "I"], 0.85, &[], Cadential),
    template(&["V", "I"], 0.7, &[], Cadential),
];

/// Characteristic shapes per mode.
pub static MODAL_PATTERNS: [PatternTemplate; 26] = [
    // Shared by Ionian and Mixolydian; resolved by the parent key.
    template(&["I", "IV", "I"], 0.85, &[Ionian, Mixolydian], Structural),
    template(&["I", "IV"], 0.75, &[Ionian, Mixolydian], Structural),
    // Mixolydian
    template(&["I", "bVII", "IV", "I"], 0.95, &[Mixolydian], Cadential),
    template(&["I", "bVII", "I"], 0.9, &[Mixolydian], Cadential),
    template(&["bVII", "IV", "I"], 0.85, &[Mixolydian], Cadential),
    template(&["I", "bVII", "IV"], 0.85, &[Mixolydian], Structural),
    template(&["I", "bVII"], 0.8, &[Mixolydian], Structural),
    template(&["bVII", "I"], 0.75, &[Mixolydian], Cadential),
    template(&["I", "v", "I"], 0.8, &[Mixolydian], Structural),
    // Dorian
    template(&["i", "IV", "bVII", "i"], 0.95, &[Dorian], Cadential),
    template(&["i", "IV", "i"], 0.9, &[Dorian], Structural),
    template(&["i", "IV"], 0.8, &[Dorian], Structural),
    template(&["i", "ii", "i"], 0.8, &[Dorian], Structural),
    // Phrygian
    template(&["i", "bII", "i"], 0.95, &[Phrygian], Cadential),
    template(&["i", "bII", "bIII", "i"], 0.9, &[Phrygian], Cadential),
    template(&["i", "bII"], 0.85, &[Phrygian], Structural),
    template(&["bII", "i"], 0.85, &[Phrygian], Cadential),
    // Lydian
    template(&["I", "#IV", "I"], 0.95, &[Lydian], Structural),
    template(&["I", "II", "I"], 0.9, &[Lydian], Structural),
    template(&["I", "II"], 0.8, &[Lydian], Structural),
    template(&["I", "#iv°", "I"], 0.85, &[Lydian], Structural),
    // Aeolian
    template(&["i", "bVII", "iv", "i"], 0.95, &[Aeolian], Cadential),
    template(&["i", "bVI", "bVII", "i"], 0.9, &[Aeolian], Cadential),
    template(&["i", "bVI", "bVII"], 0.85, &[Aeolian], Structural),
    template(&["i", "bVII", "bVI"], 0.8, &[Aeolian], Structural),
    // Locrian
    template(&["i°", "bII", "i°"], 0.85, &[Locrian], Structural),
];

/// A shape that looks modal but is better explained another way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoilPattern {
    pub sequence: &'static [&'static str],
    pub explanation: &'static str,
}

impl FoilPattern {
    pub fn label(&self) -> String {
        self.sequence.join("-")
    }
}

pub static FOIL_PATTERNS: [FoilPattern; 7] = [
    FoilPattern {
        sequence: &["i", "iv", "i"],
        explanation: "minor iv is Aeolian colour, not Dorian",
    },
    FoilPattern {
        sequence: &["i", "V", "i"],
        explanation: "minor-key authentic cadence",
    },
    FoilPattern {
        sequence: &["i", "iv", "V", "i"],
        explanation: "harmonic-minor cadential progression",
    },
    FoilPattern {
        sequence: &["vi", "IV", "I", "V"],
        explanation: "pop progression in the relative major",
    },
    FoilPattern {
        sequence: &["I", "V", "vi", "IV"],
        explanation: "pop axis progression",
    },
    FoilPattern {
        sequence: &["i", "bVI", "bIII", "bVII"],
        explanation: "pop axis progression heard from the relative minor",
    },
    FoilPattern {
        sequence: &["I", "vi", "IV", "V"],
        explanation: "doo-wop progression",
    },
];

/// A two-chord back-and-forth that establishes its first chord as tonic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VampPattern {
    pub sequence: [&'static str; 2],
    /// Minimum confidence a recognised vamp receives.
    pub floor: f64,
}

impl VampPattern {
    pub fn label(&self) -> String {
        self.sequence.join("-")
    }
}

pub static VAMP_PATTERNS: [VampPattern; 5] = [
    VampPattern {
        sequence: ["I", "IV"],
        floor: 0.70,
    },
    VampPattern {
        sequence: ["i", "IV"],
        floor: 0.70,
    },
    VampPattern {
        sequence: ["I", "II"],
        floor: 0.70,
    },
    VampPattern {
        sequence: ["I", "bVII"],
        floor: 0.72,
    },
    VampPattern {
        sequence: ["i", "bII"],
        floor: 0.72,
    },
];

/// A modal template found in a progression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternMatch {
    /// Dash-joined sequence, e.g. "I-bVII-IV-I"
    pub pattern: String,
    pub sequence: Vec<String>,
    pub strength: f64,
    pub modes: Vec<Mode>,
    pub context: PatternContext,
    /// Number of windows the sequence occupied.
    pub match_count: usize,
    /// The sequence is the whole progression.
    pub exact: bool,
}

impl PatternMatch {
    pub fn score(&self) -> f64 {
        self.strength * self.match_count as f64
    }
}

fn normalized_tokens(numerals: &[RomanNumeral]) -> Vec<String> {
    numerals.iter().map(|n| n.normalized().to_string()).collect()
}

/// Whether any numeral is one of the modal colour degrees
/// `bVII`, `bII`, `II`, `#IV`, `bVI`, `bIII`.
pub fn has_modal_marker(numerals: &[RomanNumeral]) -> bool {
    numerals.iter().filter(|n| !n.is_secondary()).any(|n| {
        matches!(
            (n.accidental, n.degree, n.upper),
            (Accidental::Flat, 7 | 2 | 6 | 3, _) | (Accidental::Natural, 2, true) | (Accidental::Sharp, 4, _)
        )
    })
}

/// The functional template that rules out a modal reading, if any.
///
/// Fires only on an exact whole-progression match stronger than
/// `threshold`, and never when a modal marker degree is present.
pub fn functional_prescreen(numerals: &[RomanNumeral], threshold: f64) -> Option<&'static PatternTemplate> {
    if has_modal_marker(numerals) {
        return None;
    }

    let tokens = normalized_tokens(numerals);
    FUNCTIONAL_PATTERNS
        .iter()
        .filter(|t| t.strength > threshold)
        .find(|t| t.sequence.iter().copied().eq(tokens.iter().map(String::as_str)))
}

/// Every modal template occurring in the progression, strongest first.
///
/// Counts each contiguous window equal to the template. Sorted by
/// `strength × match_count`, then by length, so longer shapes win ties.
pub fn match_modal_patterns(numerals: &[RomanNumeral]) -> Vec<PatternMatch> {
    let tokens = normalized_tokens(numerals);

    let mut matches: Vec<PatternMatch> = MODAL_PATTERNS
        .iter()
        .filter_map(|template| {
            let len = template.sequence.len();
            if len == 0 || len > tokens.len() {
                return None;
            }

            let match_count = tokens
                .windows(len)
                .filter(|window| window.iter().map(String::as_str).eq(template.sequence.iter().copied()))
                .count();

            (match_count > 0).then(|| PatternMatch {
                pattern: template.label(),
                sequence: template.sequence.iter().map(|s| s.to_string()).collect(),
                strength: template.strength,
                modes: template.modes.to_vec(),
                context: template.context,
                match_count,
                exact: len == tokens.len(),
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score()
            .total_cmp(&a.score())
            .then(b.sequence.len().cmp(&a.sequence.len()))
    });

    if let Some(best) = matches.first() {
        debug!(pattern = %best.pattern, count = best.match_count, total = matches.len(), "modal pattern matches");
    }

    matches
}

/// The foil the whole progression matches, raw or with extensions stripped.
pub fn match_foil(numerals: &[RomanNumeral]) -> Option<&'static FoilPattern> {
    let raw = roman::join(numerals);
    let normalized = roman::join_normalized(numerals);

    FOIL_PATTERNS.iter().find(|foil| {
        let label = foil.label();
        label == raw || label == normalized
    })
}

/// The vamp a progression forms: exactly two distinct chords alternating,
/// starting with the first chord of a known vamp.
pub fn match_vamp(numerals: &[RomanNumeral]) -> Option<&'static VampPattern> {
    let tokens = normalized_tokens(numerals);
    if tokens.len() < 2 || tokens.windows(2).any(|pair| pair[0] == pair[1]) {
        return None;
    }

    let (a, b) = (&tokens[0], &tokens[1]);
    let alternates = tokens
        .iter()
        .enumerate()
        .all(|(i, t)| if i % 2 == 0 { t == a } else { t == b });
    if !alternates {
        return None;
    }

    VAMP_PATTERNS
        .iter()
        .find(|v| v.sequence[0] == a.as_str() && v.sequence[1] == b.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numerals(tokens: &[&str]) -> Vec<RomanNumeral> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    #[test]
    fn every_template_token_is_a_normalized_numeral() {
        let all_sequences = FUNCTIONAL_PATTERNS
            .iter()
            .chain(MODAL_PATTERNS.iter())
            .map(|t| t.sequence)
            .chain(FOIL_PATTERNS.iter().map(|f| f.sequence));

        for sequence in all_sequences {
            for token in sequence {
                let numeral: RomanNumeral = token.parse().unwrap();
                assert_eq!(numeral.normalized().to_string(), *token);
            }
        }
        for vamp in &VAMP_PATTERNS {
            for token in vamp.sequence {
                assert!(token.parse::<RomanNumeral>().is_ok());
            }
        }
    }

    #[test]
    fn strengths_are_in_range() {
        for t in FUNCTIONAL_PATTERNS.iter().chain(MODAL_PATTERNS.iter()) {
            assert!((0.0..=1.0).contains(&t.strength), "{}", t.label());
        }
    }

    #[test]
    fn prescreen_rejects_plain_cadences() {
        let found = functional_prescreen(&numerals(&["I", "V", "I"]), 0.8).unwrap();
        assert_eq!(found.label(), "I-V-I");

        let found = functional_prescreen(&numerals(&["ii7", "V7", "Imaj7"]), 0.8).unwrap();
        assert_eq!(found.label(), "ii-V-I");
    }

    #[test]
    fn prescreen_skips_weak_and_partial_matches() {
        // V-I is only 0.7
        assert!(functional_prescreen(&numerals(&["V", "I"]), 0.8).is_none());
        // sub-sequence only
        assert!(functional_prescreen(&numerals(&["vi", "I", "V", "I"]), 0.8).is_none());
    }

    #[test]
    fn prescreen_never_fires_with_modal_markers() {
        assert!(has_modal_marker(&numerals(&["I", "bVII", "IV", "I"])));
        assert!(has_modal_marker(&numerals(&["I", "II", "I"])));
        assert!(!has_modal_marker(&numerals(&["I", "ii", "V", "I"])));
        assert!(!has_modal_marker(&numerals(&["I", "V/V", "V", "I"])));
    }

    #[test]
    fn windowed_matches_sorted_by_score() {
        let matches = match_modal_patterns(&numerals(&["I", "bVII", "IV", "I"]));
        assert_eq!(matches[0].pattern, "I-bVII-IV-I");
        assert!(matches[0].exact);
        assert!(matches.iter().any(|m| m.pattern == "bVII-IV-I" && !m.exact));
        assert!(matches.iter().any(|m| m.pattern == "I-bVII"));
    }

    #[test]
    fn repeated_windows_accumulate() {
        let matches = match_modal_patterns(&numerals(&["I", "bVII", "I", "bVII", "I"]));
        let i_bvii_i = matches.iter().find(|m| m.pattern == "I-bVII-I").unwrap();
        assert_eq!(i_bvii_i.match_count, 2);
        let i_bvii = matches.iter().find(|m| m.pattern == "I-bVII").unwrap();
        assert_eq!(i_bvii.match_count, 2);
        // 0.9 × 2 beats 0.8 × 2
        assert_eq!(matches[0].pattern, "I-bVII-I");
    }

    #[test]
    fn foils_match_raw_and_normalized() {
        assert_eq!(match_foil(&numerals(&["i", "V", "i"])).unwrap().label(), "i-V-i");
        assert_eq!(match_foil(&numerals(&["i7", "V7", "i7"])).unwrap().label(), "i-V-i");
        assert!(match_foil(&numerals(&["i", "V", "i", "V"])).is_none());
    }

    #[test]
    fn vamps_must_alternate() {
        assert_eq!(match_vamp(&numerals(&["I", "bVII"])).unwrap().floor, 0.72);
        assert_eq!(match_vamp(&numerals(&["I", "IV", "I", "IV"])).unwrap().label(), "I-IV");
        assert!(match_vamp(&numerals(&["I", "IV", "V"])).is_none());
        assert!(match_vamp(&numerals(&["IV", "I"])).is_none());
        assert!(match_vamp(&numerals(&["I", "I"])).is_none());
    }
}
