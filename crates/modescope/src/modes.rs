//! The seven diatonic modes and the ordered rules that pick one.

use serde::{Deserialize, Serialize};

use crate::chord::{ChordQuality, ParsedChord, Triad};
use crate::key::KeySignature;
use crate::patterns::PatternMatch;
use crate::types::{interval_above, PitchClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl Mode {
    /// In parent-scale rotation order.
    pub const ALL: [Mode; 7] = [
        Mode::Ionian,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Aeolian,
        Mode::Locrian,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Ionian => "Ionian",
            Mode::Dorian => "Dorian",
            Mode::Phrygian => "Phrygian",
            Mode::Lydian => "Lydian",
            Mode::Mixolydian => "Mixolydian",
            Mode::Aeolian => "Aeolian",
            Mode::Locrian => "Locrian",
        }
    }

    /// Scale intervals above the modal tonic.
    pub fn intervals(self) -> [u8; 7] {
        match self {
            Mode::Ionian => [0, 2, 4, 5, 7, 9, 11],
            Mode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Mode::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            Mode::Lydian => [0, 2, 4, 6, 7, 9, 11],
            Mode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            Mode::Aeolian => [0, 2, 3, 5, 7, 8, 10],
            Mode::Locrian => [0, 1, 3, 5, 6, 8, 10],
        }
    }

    /// Semitones from the parent major tonic up to this mode's tonic.
    pub fn parent_interval(self) -> u8 {
        match self {
            Mode::Ionian => 0,
            Mode::Dorian => 2,
            Mode::Phrygian => 4,
            Mode::Lydian => 5,
            Mode::Mixolydian => 7,
            Mode::Aeolian => 9,
            Mode::Locrian => 11,
        }
    }

    pub fn from_parent_interval(interval: u8) -> Option<Mode> {
        Mode::ALL
            .into_iter()
            .find(|m| m.parent_interval() == interval % 12)
    }

    /// The major key this mode on `tonic` is a rotation of.
    pub fn parent_key(self, tonic: PitchClass) -> KeySignature {
        KeySignature::major((tonic + 12 - self.parent_interval()) % 12)
    }

    pub fn tonic_triad(self) -> Triad {
        match self {
            Mode::Ionian | Mode::Lydian | Mode::Mixolydian => Triad::Major,
            Mode::Dorian | Mode::Phrygian | Mode::Aeolian => Triad::Minor,
            Mode::Locrian => Triad::Diminished,
        }
    }

    /// The colour tone that sets this mode apart from plain major or minor,
    /// and the chords that carry it.
    pub fn characteristic(self) -> Option<Characteristic> {
        let (description, chords): (&'static str, &'static [(u8, Triad)]) = match self {
            Mode::Ionian => return None,
            Mode::Dorian => ("raised 6th", &[(5, Triad::Major)]),
            Mode::Phrygian => ("flattened 2nd", &[(1, Triad::Major)]),
            Mode::Lydian => (
                "raised 4th",
                &[(2, Triad::Major), (6, Triad::Major), (6, Triad::Diminished)],
            ),
            Mode::Mixolydian => ("flattened 7th", &[(10, Triad::Major), (7, Triad::Minor)]),
            Mode::Aeolian => ("flattened 6th", &[(8, Triad::Major)]),
            Mode::Locrian => ("flattened 5th", &[(0, Triad::Diminished), (6, Triad::Major)]),
        };
        Some(Characteristic { description, chords })
    }
}

/// A mode's colour tone and the chords (interval above the tonic, triad)
/// that sound it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Characteristic {
    pub description: &'static str,
    pub chords: &'static [(u8, Triad)],
}

impl Characteristic {
    pub fn sounded_by(&self, interval: u8, triad: Triad) -> bool {
        self.chords.contains(&(interval, triad))
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What the mode rules look at for one tonic candidate.
#[derive(Debug, Clone, Copy)]
pub struct ModeContext<'a> {
    pub tonic: PitchClass,
    pub chords: &'a [ParsedChord],
    pub best_pattern: Option<&'a PatternMatch>,
    /// Only caller-supplied parent keys; inferred ones carry no information.
    pub supplied_parent: Option<KeySignature>,
}

impl<'a> ModeContext<'a> {
    /// Quality of the first chord on the tonic.
    pub fn tonic_quality(&self) -> Option<ChordQuality> {
        self.chords
            .iter()
            .find(|c| c.root == self.tonic)
            .map(|c| c.quality)
    }

    /// Tonic triad, assumed major when no chord sits on the tonic.
    pub fn tonic_triad(&self) -> Triad {
        self.tonic_quality()
            .map(ChordQuality::triad)
            .unwrap_or(Triad::Major)
    }

    fn minor_tonic(&self) -> bool {
        self.tonic_triad() == Triad::Minor
    }

    fn major_tonic(&self) -> bool {
        self.tonic_triad() == Triad::Major
    }

    /// Whether some chord sits `interval` above the tonic with a triad
    /// accepted by `triad`.
    fn has(&self, interval: u8, triad: impl Fn(Triad) -> bool) -> bool {
        self.chords
            .iter()
            .any(|c| interval_above(self.tonic, c.root) == interval && triad(c.quality.triad()))
    }

    fn parent_interval(&self) -> Option<u8> {
        self.supplied_parent
            .map(|key| interval_above(key.relative_major_tonic(), self.tonic))
    }
}

fn any(_: Triad) -> bool {
    true
}

fn major(triad: Triad) -> bool {
    triad == Triad::Major
}

fn minor(triad: Triad) -> bool {
    triad == Triad::Minor
}

/// One step of the mode cascade.
pub struct ModeRule {
    pub name: &'static str,
    pub decide: fn(&ModeContext<'_>) -> Option<Mode>,
}

/// Evaluated in order; the first rule returning a mode wins.
pub static MODE_RULES: [ModeRule; 6] = [
    ModeRule {
        name: "diminished tonic",
        decide: diminished_tonic,
    },
    ModeRule {
        name: "dominant-seventh tonic with major IV",
        decide: dominant_seventh_tonic,
    },
    ModeRule {
        name: "pattern match",
        decide: pattern_match,
    },
    ModeRule {
        name: "marker degrees",
        decide: marker_degrees,
    },
    ModeRule {
        name: "parent key interval",
        decide: parent_key_interval,
    },
    ModeRule {
        name: "tonic quality fallback",
        decide: fallback,
    },
];

fn diminished_tonic(ctx: &ModeContext<'_>) -> Option<Mode> {
    (ctx.tonic_triad() == Triad::Diminished).then_some(Mode::Locrian)
}

fn dominant_seventh_tonic(ctx: &ModeContext<'_>) -> Option<Mode> {
    (ctx.tonic_quality() == Some(ChordQuality::Dominant7) && ctx.has(5, major)).then_some(Mode::Mixolydian)
}

fn pattern_match(ctx: &ModeContext<'_>) -> Option<Mode> {
    let pattern = ctx.best_pattern?;
    match pattern.modes.as_slice() {
        [] => None,
        [only] => Some(*only),
        modes => {
            // Ambiguous shapes such as I-IV: the parent key decides.
            let by_parent = ctx
                .parent_interval()
                .and_then(Mode::from_parent_interval)
                .filter(|m| modes.contains(m));
            by_parent.or_else(|| modes.first().copied())
        }
    }
}

fn marker_degrees(ctx: &ModeContext<'_>) -> Option<Mode> {
    if ctx.minor_tonic() && ctx.has(1, any) {
        Some(Mode::Phrygian)
    } else if ctx.major_tonic() && (ctx.has(2, major) || ctx.has(6, any)) {
        Some(Mode::Lydian)
    } else if ctx.minor_tonic() && ctx.has(5, major) && ctx.has(10, any) {
        Some(Mode::Dorian)
    } else if ctx.minor_tonic() && ctx.has(5, minor) && ctx.has(10, any) && ctx.has(8, any) {
        Some(Mode::Aeolian)
    } else if ctx.major_tonic() && ctx.has(10, major) {
        Some(Mode::Mixolydian)
    } else {
        None
    }
}

fn parent_key_interval(ctx: &ModeContext<'_>) -> Option<Mode> {
    let mode = Mode::from_parent_interval(ctx.parent_interval()?)?;
    (mode.tonic_triad() == ctx.tonic_triad()).then_some(mode)
}

fn fallback(ctx: &ModeContext<'_>) -> Option<Mode> {
    Some(if ctx.minor_tonic() {
        Mode::Aeolian
    } else {
        Mode::Ionian
    })
}

/// Run the cascade, returning the mode and the name of the rule that chose it.
pub fn determine_mode(ctx: &ModeContext<'_>) -> (Mode, &'static str) {
    MODE_RULES
        .iter()
        .find_map(|rule| (rule.decide)(ctx).map(|mode| (mode, rule.name)))
        .unwrap_or((Mode::Ionian, "tonic quality fallback"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::parse_chord;
    use crate::patterns::PatternContext;

    fn chords(symbols: &[&str]) -> Vec<ParsedChord> {
        symbols.iter().map(|s| parse_chord(s).unwrap()).collect()
    }

    fn decide(tonic: PitchClass, symbols: &[&str], parent: Option<KeySignature>) -> (Mode, &'static str) {
        let chords = chords(symbols);
        let ctx = ModeContext {
            tonic,
            chords: &chords,
            best_pattern: None,
            supplied_parent: parent,
        };
        determine_mode(&ctx)
    }

    #[test]
    fn parent_interval_table() {
        assert_eq!(Mode::from_parent_interval(7), Some(Mode::Mixolydian));
        assert_eq!(Mode::from_parent_interval(2), Some(Mode::Dorian));
        assert_eq!(Mode::from_parent_interval(1), None);
        assert_eq!(Mode::Mixolydian.parent_key(7), KeySignature::major(0));
        assert_eq!(Mode::Dorian.parent_key(0), KeySignature::major(10));
    }

    #[test]
    fn half_diminished_tonic_is_locrian() {
        assert_eq!(decide(11, &["Bm7b5", "C", "Bm7b5"], None).0, Mode::Locrian);
    }

    #[test]
    fn dominant_seventh_tonic_with_major_four() {
        let (mode, rule) = decide(0, &["C7", "F", "C7"], Some(KeySignature::major(5)));
        assert_eq!(mode, Mode::Mixolydian);
        assert_eq!(rule, "dominant-seventh tonic with major IV");
    }

    #[test]
    fn ambiguous_pattern_resolved_by_parent() {
        let chords = chords(&["G", "C", "G"]);
        let pattern = PatternMatch {
            pattern: "I-IV-I".into(),
            sequence: vec!["I".into(), "IV".into(), "I".into()],
            strength: 0.85,
            modes: vec![Mode::Ionian, Mode::Mixolydian],
            context: PatternContext::Structural,
            match_count: 1,
            exact: true,
        };

        let mut ctx = ModeContext {
            tonic: 7,
            chords: &chords,
            best_pattern: Some(&pattern),
            supplied_parent: Some(KeySignature::major(0)),
        };
        assert_eq!(determine_mode(&ctx).0, Mode::Mixolydian);

        ctx.supplied_parent = Some(KeySignature::major(7));
        assert_eq!(determine_mode(&ctx).0, Mode::Ionian);

        ctx.supplied_parent = None;
        assert_eq!(determine_mode(&ctx).0, Mode::Ionian);
    }

    #[test]
    fn marker_degrees_discriminate() {
        assert_eq!(decide(4, &["Em", "F", "Em"], None).0, Mode::Phrygian);
        assert_eq!(decide(5, &["F", "G", "F"], None).0, Mode::Lydian);
        assert_eq!(decide(2, &["Dm", "G", "C", "Dm"], None).0, Mode::Dorian);
        assert_eq!(decide(9, &["Am", "Dm", "G", "F", "Am"], None).0, Mode::Aeolian);
        assert_eq!(decide(7, &["G", "F", "G"], None).0, Mode::Mixolydian);
    }

    #[test]
    fn parent_interval_needs_matching_tonic_triad() {
        // E minor over C major: Phrygian by parent interval, no markers
        let (mode, rule) = decide(4, &["Em", "Am", "Em"], Some(KeySignature::major(0)));
        assert_eq!(mode, Mode::Phrygian);
        assert_eq!(rule, "parent key interval");

        // E major cannot be Phrygian; falls through
        let (mode, rule) = decide(4, &["E", "A", "E"], Some(KeySignature::major(0)));
        assert_eq!(mode, Mode::Ionian);
        assert_eq!(rule, "tonic quality fallback");
    }

    #[test]
    fn fallback_by_tonic_quality() {
        assert_eq!(decide(9, &["Am", "Dm", "Am"], None), (Mode::Aeolian, "tonic quality fallback"));
        assert_eq!(decide(0, &["C", "Am", "C"], None), (Mode::Ionian, "tonic quality fallback"));
    }
}
