//! Functional harmony: key center, chord functions, cadences and
//! progression type.

use modeconf::AnalysisConfig;
use serde::Serialize;
use tracing::{debug, info};

use crate::chord::{ChordQuality, Progression, Triad};
use crate::chromatic::{classify_chromatic, ChromaticElement};
use crate::key::KeySignature;
use crate::roman::RomanNumeral;
use crate::tonic::resolve_tonic;
use crate::types::{interval_above, Evidence, PitchClass};

const AUTHENTIC: f64 = 0.9;
const PLAGAL: f64 = 0.7;
const DECEPTIVE: f64 = 0.8;
const HALF: f64 = 0.6;

const OPENS_ON_TONIC: f64 = 0.7;
const CLOSES_ON_TONIC: f64 = 0.8;
const SUPPLIED_KEY: f64 = 0.6;
const INFERRED_KEY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordFunction {
    Tonic,
    Predominant,
    Dominant,
    Subdominant,
    LeadingTone,
    Chromatic,
}

impl ChordFunction {
    /// Function of a diatonic chord `interval` semitones above the key's tonic.
    pub fn for_interval(interval: u8, minor_key: bool) -> ChordFunction {
        match (minor_key, interval % 12) {
            (_, 0) => ChordFunction::Tonic,
            (_, 2) => ChordFunction::Predominant,
            (false, 4) | (false, 9) | (true, 3) => ChordFunction::Tonic,
            (_, 5) => ChordFunction::Subdominant,
            (_, 7) => ChordFunction::Dominant,
            (true, 8) => ChordFunction::Predominant,
            (true, 10) => ChordFunction::Dominant,
            (_, 11) => ChordFunction::LeadingTone,
            _ => ChordFunction::Chromatic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceKind {
    Authentic,
    Plagal,
    Deceptive,
    Half,
}

impl std::fmt::Display for CadenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CadenceKind::Authentic => write!(f, "authentic"),
            CadenceKind::Plagal => write!(f, "plagal"),
            CadenceKind::Deceptive => write!(f, "deceptive"),
            CadenceKind::Half => write!(f, "half"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cadence {
    pub kind: CadenceKind,
    /// Index of the arrival chord among the parsed chords.
    pub position: usize,
    pub strength: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionType {
    JazzIiVI,
    PopAxis,
    Blues,
    CircleOfFifths,
    Cadential,
    Unclassified,
}

impl ProgressionType {
    /// A recognised idiom rather than a fallback.
    pub fn is_named(self) -> bool {
        !matches!(self, ProgressionType::Cadential | ProgressionType::Unclassified)
    }

    pub fn label(self) -> &'static str {
        match self {
            ProgressionType::JazzIiVI => "jazz ii-V-I",
            ProgressionType::PopAxis => "pop vi-IV-I-V axis",
            ProgressionType::Blues => "blues I-IV-V",
            ProgressionType::CircleOfFifths => "circle of fifths",
            ProgressionType::Cadential => "cadential",
            ProgressionType::Unclassified => "unclassified",
        }
    }
}

/// One parsed chord read against the key center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionalChord {
    pub symbol: String,
    pub root: PitchClass,
    pub quality: ChordQuality,
    /// Semitones above the key's tonic.
    pub interval: u8,
    pub numeral: RomanNumeral,
    pub function: ChordFunction,
    pub diatonic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionalAnalysis {
    pub key_center: KeySignature,
    pub key_name: String,
    pub key_supplied: bool,
    pub chords: Vec<FunctionalChord>,
    /// One per input token; "?" for tokens that did not parse.
    pub roman_numerals: Vec<String>,
    pub cadences: Vec<Cadence>,
    pub progression_type: ProgressionType,
    pub chromatic_elements: Vec<ChromaticElement>,
    pub diatonic_ratio: f64,
    pub confidence: f64,
    pub evidence: Vec<Evidence>,
    pub characteristics: Vec<String>,
}

impl FunctionalAnalysis {
    pub fn strongest_cadence(&self) -> Option<&Cadence> {
        self.cadences
            .iter()
            .max_by(|a, b| a.strength.total_cmp(&b.strength))
    }
}

/// Read `progression` as tonal harmony in `parent_key`, or in a key
/// inferred from the tonic vote when none is given.
///
/// Returns `None` when the progression cannot support any classification.
pub fn analyze_functional(
    progression: &Progression,
    parent_key: Option<KeySignature>,
    config: &AnalysisConfig,
) -> Option<FunctionalAnalysis> {
    if let Err(reason) = progression.check() {
        debug!(%reason, "no functional analysis");
        return None;
    }

    let parsed = progression.chords();
    let key = match parent_key {
        Some(key) => key,
        None => {
            let tonic = resolve_tonic(parsed, None, 1).first()?.tonic;
            let minor = progression
                .quality_at(tonic)
                .is_some_and(|q| q.triad() == Triad::Minor);
            KeySignature { tonic, is_minor: minor }
        }
    };

    let chords: Vec<FunctionalChord> = parsed
        .iter()
        .map(|c| {
            let interval = interval_above(key.tonic, c.root);
            let diatonic = key.is_diatonic(c.root, c.quality);
            FunctionalChord {
                symbol: c.symbol.clone(),
                root: c.root,
                quality: c.quality,
                interval,
                numeral: RomanNumeral::functional(c.root, c.quality, &key),
                function: if diatonic {
                    ChordFunction::for_interval(interval, key.is_minor)
                } else {
                    ChordFunction::Chromatic
                },
                diatonic,
            }
        })
        .collect();

    let cadences = detect_cadences(&chords, &key);
    let progression_type = classify_progression(&chords, &key, !cadences.is_empty());

    let chromatic_elements: Vec<ChromaticElement> = chords
        .iter()
        .enumerate()
        .filter_map(|(i, c)| classify_chromatic(c, i, chords.get(i + 1), &key))
        .collect();

    let diatonic_count = chords.iter().filter(|c| c.diatonic).count();
    let diatonic_ratio = diatonic_count as f64 / chords.len() as f64;

    let opens_on_tonic = chords.first().is_some_and(|c| c.interval == 0);
    let closes_on_tonic = chords.last().is_some_and(|c| c.interval == 0);

    let mut evidence: Vec<Evidence> = cadences
        .iter()
        .map(|c| Evidence::cadential(c.strength, c.description.clone()))
        .collect();
    if opens_on_tonic {
        evidence.push(Evidence::structural(OPENS_ON_TONIC, "Opens on the tonic"));
    }
    if closes_on_tonic {
        evidence.push(Evidence::structural(CLOSES_ON_TONIC, "Closes on the tonic"));
    }
    evidence.push(Evidence::intervallic(
        diatonic_ratio,
        format!("{} of {} chords diatonic to {}", diatonic_count, chords.len(), key),
    ));
    if parent_key.is_some() {
        evidence.push(Evidence::contextual(SUPPLIED_KEY, format!("Key center {} supplied", key)));
    } else {
        evidence.push(Evidence::contextual(
            INFERRED_KEY,
            format!("Key center {} inferred from opening and closing chords", key),
        ));
    }

    let strongest = cadences.iter().map(|c| c.strength).fold(0.0, f64::max);
    let mut confidence = 0.45 * diatonic_ratio + 0.3 * strongest;
    if opens_on_tonic {
        confidence += 0.1;
    }
    if closes_on_tonic {
        confidence += 0.1;
    }
    if progression_type.is_named() {
        confidence += 0.1;
    }
    let confidence = confidence.clamp(0.0, config.max_confidence);

    let mut characteristics = Vec::new();
    if progression_type.is_named() {
        characteristics.push(format!("Progression type: {}", progression_type.label()));
    }
    for cadence in &cadences {
        characteristics.push(cadence.description.clone());
    }
    for element in &chromatic_elements {
        characteristics.push(element.description.clone());
    }

    let roman_numerals = progression.align(
        &chords.iter().map(|c| c.numeral.to_string()).collect::<Vec<_>>(),
        "?".to_string(),
    );

    info!(key = %key, kind = progression_type.label(), confidence, "functional reading");

    Some(FunctionalAnalysis {
        key_name: key.to_string(),
        key_center: key,
        key_supplied: parent_key.is_some(),
        chords,
        roman_numerals,
        cadences,
        progression_type,
        chromatic_elements,
        diatonic_ratio,
        confidence,
        evidence,
        characteristics,
    })
}

fn is_dominant(chord: &FunctionalChord) -> bool {
    chord.interval == 7 && chord.quality.is_dominant_shape()
}

fn detect_cadences(chords: &[FunctionalChord], key: &KeySignature) -> Vec<Cadence> {
    let submediant = if key.is_minor { 8 } else { 9 };
    let mut cadences = Vec::new();

    for (i, pair) in chords.windows(2).enumerate() {
        let (from, to) = (&pair[0], &pair[1]);
        let found = if is_dominant(from) && to.interval == 0 {
            Some((CadenceKind::Authentic, AUTHENTIC))
        } else if from.interval == 5 && to.interval == 0 {
            Some((CadenceKind::Plagal, PLAGAL))
        } else if is_dominant(from) && to.interval == submediant {
            Some((CadenceKind::Deceptive, DECEPTIVE))
        } else {
            None
        };

        if let Some((kind, strength)) = found {
            cadences.push(Cadence {
                kind,
                position: i + 1,
                strength,
                description: format!(
                    "{} cadence {} → {} ({} → {})",
                    capitalize(&kind.to_string()),
                    from.numeral,
                    to.numeral,
                    from.symbol,
                    to.symbol
                ),
            });
        }
    }

    if let Some(last) = chords.last() {
        if is_dominant(last) {
            cadences.push(Cadence {
                kind: CadenceKind::Half,
                position: chords.len() - 1,
                strength: HALF,
                description: format!("Half cadence ending on {} ({})", last.numeral, last.symbol),
            });
        }
    }

    cadences
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn classify_progression(chords: &[FunctionalChord], key: &KeySignature, has_cadence: bool) -> ProgressionType {
    let is_major = |c: &FunctionalChord| c.quality.triad() == Triad::Major;

    let jazz = chords.windows(3).any(|w| {
        w[0].interval == 2 && w[1].interval == 7 && is_major(&w[1]) && w[2].interval == 0
    });
    if jazz {
        return ProgressionType::JazzIiVI;
    }

    // The axis is read from the relative major so vi-IV-I-V and
    // i-bVI-bIII-bVII are the same loop.
    let home = key.relative_major_tonic();
    let axis: [(u8, Triad); 4] = [(9, Triad::Minor), (5, Triad::Major), (0, Triad::Major), (7, Triad::Major)];
    let pop = chords.windows(4).any(|w| {
        (0..4).any(|rotation| {
            w.iter().enumerate().all(|(i, c)| {
                let (interval, triad) = axis[(i + rotation) % 4];
                interval_above(home, c.root) == interval && c.quality.triad() == triad
            })
        })
    });
    if pop {
        return ProgressionType::PopAxis;
    }

    let blues_window = chords.windows(3).any(|w| {
        w[0].interval == 0 && w[1].interval == 5 && w[2].interval == 7 && w.iter().all(is_major)
    });
    let dominant_on = |interval: u8| {
        chords
            .iter()
            .any(|c| c.interval == interval && c.quality == ChordQuality::Dominant7)
    };
    if blues_window || (dominant_on(0) && dominant_on(5) && dominant_on(7)) {
        return ProgressionType::Blues;
    }

    let mut run = 0;
    let mut longest = 0;
    for pair in chords.windows(2) {
        if interval_above(pair[0].root, pair[1].root) == 5 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    if longest >= 3 {
        return ProgressionType::CircleOfFifths;
    }

    if has_cadence {
        ProgressionType::Cadential
    } else {
        ProgressionType::Unclassified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromatic::ChromaticKind;

    fn run(symbols: &[&str], parent: Option<&str>) -> FunctionalAnalysis {
        let progression = Progression::parse_lenient(symbols);
        let parent = parent.map(|p| p.parse().unwrap());
        analyze_functional(&progression, parent, &AnalysisConfig::default()).unwrap()
    }

    fn kinds(analysis: &FunctionalAnalysis) -> Vec<CadenceKind> {
        analysis.cadences.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn authentic_cadence_in_inferred_key() {
        let analysis = run(&["C", "G", "C"], None);
        assert_eq!(analysis.key_center, KeySignature::major(0));
        assert!(!analysis.key_supplied);
        assert_eq!(analysis.roman_numerals, vec!["I", "V", "I"]);
        assert_eq!(kinds(&analysis), vec![CadenceKind::Authentic]);
        assert_eq!(analysis.diatonic_ratio, 1.0);
        // 0.45 + 0.27 + 0.1 + 0.1
        assert!((analysis.confidence - 0.92).abs() < 1e-9);
    }

    #[test]
    fn minor_key_inferred_from_tonic_chord() {
        let analysis = run(&["Am", "Dm", "E7", "Am"], None);
        assert_eq!(analysis.key_center, KeySignature::minor(9));
        assert_eq!(analysis.roman_numerals, vec!["i", "iv", "V7", "i"]);
        assert_eq!(kinds(&analysis), vec![CadenceKind::Authentic]);
    }

    #[test]
    fn chord_functions() {
        let analysis = run(&["C", "Dm", "F", "G", "Am", "Bdim"], Some("C major"));
        let functions: Vec<ChordFunction> = analysis.chords.iter().map(|c| c.function).collect();
        assert_eq!(
            functions,
            vec![
                ChordFunction::Tonic,
                ChordFunction::Predominant,
                ChordFunction::Subdominant,
                ChordFunction::Dominant,
                ChordFunction::Tonic,
                ChordFunction::LeadingTone,
            ]
        );
    }

    #[test]
    fn plagal_deceptive_and_half_cadences() {
        assert_eq!(kinds(&run(&["C", "F", "C"], Some("C major"))), vec![CadenceKind::Plagal]);
        assert_eq!(
            kinds(&run(&["C", "G", "Am"], Some("C major"))),
            vec![CadenceKind::Deceptive]
        );
        assert_eq!(kinds(&run(&["C", "F", "G"], Some("C major"))), vec![CadenceKind::Half]);
    }

    #[test]
    fn minor_five_is_not_a_half_cadence() {
        assert!(kinds(&run(&["C", "Bb", "C", "Gm"], Some("C major"))).is_empty());
        assert_eq!(kinds(&run(&["Am", "Dm", "E7"], Some("A minor"))), vec![CadenceKind::Half]);
    }

    #[test]
    fn jazz_two_five_one() {
        let analysis = run(&["Dm7", "G7", "Cmaj7"], Some("C major"));
        assert_eq!(analysis.progression_type, ProgressionType::JazzIiVI);
        assert_eq!(analysis.roman_numerals, vec!["ii7", "V7", "Imaj7"]);
        assert!(analysis.confidence > 0.9);
    }

    #[test]
    fn pop_axis_in_any_rotation() {
        assert_eq!(
            run(&["Am", "F", "C", "G"], Some("C major")).progression_type,
            ProgressionType::PopAxis
        );
        assert_eq!(
            run(&["C", "G", "Am", "F"], Some("C major")).progression_type,
            ProgressionType::PopAxis
        );
    }

    #[test]
    fn blues_and_circle() {
        assert_eq!(
            run(&["C7", "F7", "C7", "G7", "F7", "C7"], None).progression_type,
            ProgressionType::Blues
        );
        assert_eq!(
            run(&["Em", "Am", "Dm", "G"], Some("C major")).progression_type,
            ProgressionType::CircleOfFifths
        );
    }

    #[test]
    fn chromatic_chords_are_tagged() {
        let analysis = run(&["C", "D7", "G", "C"], Some("C major"));
        assert_eq!(analysis.roman_numerals, vec!["I", "V7/V", "V", "I"]);
        assert_eq!(analysis.chords[1].function, ChordFunction::Chromatic);
        assert_eq!(analysis.chromatic_elements.len(), 1);
        assert_eq!(analysis.chromatic_elements[0].kind, ChromaticKind::SecondaryDominant);
        assert!(analysis.diatonic_ratio < 1.0);
    }

    #[test]
    fn static_harmony_has_no_analysis() {
        let progression = Progression::parse_lenient(&["C", "C"]);
        assert!(analyze_functional(&progression, None, &AnalysisConfig::default()).is_none());
    }
}
