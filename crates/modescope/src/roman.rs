//! Roman numeral spelling and parsing.
//!
//! Numerals are spelled relative to a tonic using major-scale degrees, with
//! `b`/`#` for everything outside the major scale. Case follows the chord's
//! triad: uppercase for major, augmented and suspended, lowercase for minor
//! and diminished. A numeral can name a secondary target (`V7/ii`).

use serde::{Deserialize, Serialize};

use crate::chord::{ChordQuality, Triad};
use crate::error::NumeralParseError;
use crate::key::KeySignature;
use crate::types::{interval_above, PitchClass};

/// Semitones above the tonic for degrees I..VII of the major scale.
const DEGREE_INTERVALS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

const UPPER_NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// Canonical spelling of each interval: flats for lowered degrees, `#IV`
/// for the tritone.
const INTERVAL_SPELLING: [(Accidental, u8); 12] = [
    (Accidental::Natural, 1),
    (Accidental::Flat, 2),
    (Accidental::Natural, 2),
    (Accidental::Flat, 3),
    (Accidental::Natural, 3),
    (Accidental::Natural, 4),
    (Accidental::Sharp, 4),
    (Accidental::Natural, 5),
    (Accidental::Flat, 6),
    (Accidental::Natural, 6),
    (Accidental::Flat, 7),
    (Accidental::Natural, 7),
];

/// Suffixes accepted when parsing. Anything else is rejected.
const KNOWN_SUFFIXES: &[&str] = &[
    "", "7", "9", "11", "13", "6", "maj7", "maj9", "°", "°7", "ø", "ø7", "+", "+7", "sus", "sus2",
    "sus4", "7sus4",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accidental {
    Natural,
    Flat,
    Sharp,
}

impl Accidental {
    fn prefix(self) -> &'static str {
        match self {
            Accidental::Natural => "",
            Accidental::Flat => "b",
            Accidental::Sharp => "#",
        }
    }

    fn offset(self) -> i8 {
        match self {
            Accidental::Natural => 0,
            Accidental::Flat => -1,
            Accidental::Sharp => 1,
        }
    }
}

/// A scale-degree label such as `bVII`, `ii7` or `V7/vi`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RomanNumeral {
    pub accidental: Accidental,
    /// 1..=7
    pub degree: u8,
    pub upper: bool,
    pub suffix: String,
    /// Secondary target: `V/ii` has `of = Some(ii)`.
    pub of: Option<Box<RomanNumeral>>,
}

impl RomanNumeral {
    fn plain(interval: u8, upper: bool, suffix: &str) -> Self {
        let (accidental, degree) = INTERVAL_SPELLING[(interval % 12) as usize];
        Self {
            accidental,
            degree,
            upper,
            suffix: suffix.to_string(),
            of: None,
        }
    }

    /// Spell a chord `interval` semitones above a free modal tonic.
    pub fn modal(interval: u8, quality: ChordQuality) -> Self {
        Self::plain(interval, quality.triad().is_upper(), suffix_for(quality))
    }

    /// Spell a chord against a known key.
    ///
    /// Diatonic chords take their case from the key's expected degree.
    /// Chromatic major or dominant-seventh chords a fifth above a diatonic,
    /// non-diminished degree become secondary dominants (`V/V`, `V7/vi`).
    /// Everything else falls back to the modal spelling (`bVII`, `bVI`).
    pub fn functional(root: PitchClass, quality: ChordQuality, key: &KeySignature) -> Self {
        let interval = interval_above(key.tonic, root);

        if let Some(degree) = key.diatonic_degree(root, quality) {
            let upper = match quality.triad() {
                Triad::Suspended => true,
                _ => degree.triad.is_upper(),
            };
            return Self::plain(interval, upper, suffix_for(quality));
        }

        if let Some(target) = secondary_target(interval, quality, key) {
            let mut numeral = Self::plain(7, true, suffix_for(quality));
            numeral.of = Some(Box::new(target));
            return numeral;
        }

        Self::modal(interval, quality)
    }

    /// Semitones above the tonic. Secondary numerals add their own interval
    /// to their target's.
    pub fn interval(&self) -> u8 {
        let base = DEGREE_INTERVALS[(self.degree.clamp(1, 7) - 1) as usize] as i8;
        let own = (base + self.accidental.offset()).rem_euclid(12) as u8;
        match &self.of {
            Some(target) => (own + target.interval()) % 12,
            None => own,
        }
    }

    pub fn is_secondary(&self) -> bool {
        self.of.is_some()
    }

    /// The same numeral with extension suffixes stripped: `7`, `maj7`,
    /// `sus` disappear, half-diminished collapses to `°`.
    pub fn normalized(&self) -> Self {
        let suffix = if self.suffix.starts_with('°') || self.suffix.starts_with('ø') {
            "°"
        } else if self.suffix.starts_with('+') {
            "+"
        } else {
            ""
        };

        Self {
            accidental: self.accidental,
            degree: self.degree,
            upper: self.upper,
            suffix: suffix.to_string(),
            of: self.of.as_ref().map(|t| Box::new(t.normalized())),
        }
    }
}

fn suffix_for(quality: ChordQuality) -> &'static str {
    match quality {
        ChordQuality::Major | ChordQuality::Minor => "",
        ChordQuality::Major7 => "maj7",
        ChordQuality::Minor7 | ChordQuality::Dominant7 => "7",
        ChordQuality::Diminished => "°",
        ChordQuality::HalfDiminished => "ø7",
        ChordQuality::Augmented => "+",
        ChordQuality::Sus2 | ChordQuality::Sus4 => "sus",
    }
}

/// The diatonic degree a chromatic dominant-shaped chord resolves to.
fn secondary_target(interval: u8, quality: ChordQuality, key: &KeySignature) -> Option<RomanNumeral> {
    if !quality.is_dominant_shape() {
        return None;
    }

    let target = (interval + 5) % 12;
    if target == 0 {
        return None;
    }

    key.degrees()
        .iter()
        .find(|d| d.interval == target)
        .filter(|d| d.triad != Triad::Diminished)
        .map(|d| RomanNumeral::plain(target, d.triad.is_upper(), ""))
}

impl std::fmt::Display for RomanNumeral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let numeral = UPPER_NUMERALS[(self.degree.clamp(1, 7) - 1) as usize];
        f.write_str(self.accidental.prefix())?;
        if self.upper {
            f.write_str(numeral)?;
        } else {
            f.write_str(&numeral.to_ascii_lowercase())?;
        }
        f.write_str(&self.suffix)?;
        if let Some(target) = &self.of {
            write!(f, "/{}", target)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for RomanNumeral {
    type Err = NumeralParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let err = |reason| NumeralParseError {
            token: token.to_string(),
            reason,
        };

        let (head, target) = match token.split_once('/') {
            Some((head, target)) => (head, Some(target.parse::<RomanNumeral>().map_err(|_| err("invalid secondary target"))?)),
            None => (token, None),
        };

        let (accidental, rest) = if let Some(rest) = head.strip_prefix('b').or_else(|| head.strip_prefix('♭')) {
            (Accidental::Flat, rest)
        } else if let Some(rest) = head.strip_prefix('#').or_else(|| head.strip_prefix('♯')) {
            (Accidental::Sharp, rest)
        } else {
            (Accidental::Natural, head)
        };

        let numeral_len = rest
            .chars()
            .take_while(|c| matches!(c, 'I' | 'V' | 'i' | 'v'))
            .count();
        let (numeral, suffix) = rest.split_at(numeral_len);

        if numeral.is_empty() {
            return Err(err("missing numeral"));
        }

        let upper = numeral.chars().all(|c| c.is_ascii_uppercase());
        let lower = numeral.chars().all(|c| c.is_ascii_lowercase());
        if !upper && !lower {
            return Err(err("mixed-case numeral"));
        }

        let degree = UPPER_NUMERALS
            .iter()
            .position(|n| n.eq_ignore_ascii_case(numeral))
            .ok_or_else(|| err("not a scale degree I-VII"))?;

        if !KNOWN_SUFFIXES.contains(&suffix) {
            return Err(err("unknown suffix"));
        }

        Ok(Self {
            accidental,
            degree: degree as u8 + 1,
            upper,
            suffix: suffix.to_string(),
            of: target.map(Box::new),
        })
    }
}

impl From<RomanNumeral> for String {
    fn from(numeral: RomanNumeral) -> Self {
        numeral.to_string()
    }
}

impl TryFrom<String> for RomanNumeral {
    type Error = NumeralParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Join numerals into the dash-separated form patterns are written in.
pub fn join(numerals: &[RomanNumeral]) -> String {
    numerals
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

/// Normalize and join: `i7-V7-i7` becomes `i-V-i`.
pub fn join_normalized(numerals: &[RomanNumeral]) -> String {
    numerals
        .iter()
        .map(|n| n.normalized().to_string())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spell(interval: u8, quality: ChordQuality) -> String {
        RomanNumeral::modal(interval, quality).to_string()
    }

    #[test]
    fn modal_spellings() {
        assert_eq!(spell(0, ChordQuality::Major), "I");
        assert_eq!(spell(10, ChordQuality::Major), "bVII");
        assert_eq!(spell(1, ChordQuality::Major), "bII");
        assert_eq!(spell(6, ChordQuality::Major), "#IV");
        assert_eq!(spell(5, ChordQuality::Minor), "iv");
        assert_eq!(spell(2, ChordQuality::Minor7), "ii7");
        assert_eq!(spell(0, ChordQuality::Major7), "Imaj7");
        assert_eq!(spell(7, ChordQuality::Dominant7), "V7");
        assert_eq!(spell(11, ChordQuality::Diminished), "vii°");
        assert_eq!(spell(11, ChordQuality::HalfDiminished), "viiø7");
        assert_eq!(spell(8, ChordQuality::Augmented), "bVI+");
        assert_eq!(spell(2, ChordQuality::Sus4), "IIsus");
    }

    #[test]
    fn every_interval_and_quality_roundtrips() {
        for interval in 0..12u8 {
            for quality in ChordQuality::ALL {
                let numeral = RomanNumeral::modal(interval, quality);
                let parsed: RomanNumeral = numeral.to_string().parse().unwrap();
                assert_eq!(parsed, numeral);
                assert_eq!(parsed.interval(), interval, "{}", numeral);
            }
        }
    }

    #[test]
    fn functional_spells_secondary_dominants() {
        let c = KeySignature::major(0);
        assert_eq!(RomanNumeral::functional(2, ChordQuality::Major, &c).to_string(), "V/V");
        assert_eq!(RomanNumeral::functional(4, ChordQuality::Dominant7, &c).to_string(), "V7/vi");
        assert_eq!(RomanNumeral::functional(0, ChordQuality::Dominant7, &c).to_string(), "V7/IV");
        assert_eq!(RomanNumeral::functional(9, ChordQuality::Major, &c).to_string(), "V/ii");
    }

    #[test]
    fn functional_falls_back_to_borrowed_spelling() {
        let c = KeySignature::major(0);
        assert_eq!(RomanNumeral::functional(10, ChordQuality::Major, &c).to_string(), "bVII");
        assert_eq!(RomanNumeral::functional(8, ChordQuality::Major, &c).to_string(), "bVI");
        assert_eq!(RomanNumeral::functional(5, ChordQuality::Minor, &c).to_string(), "iv");
        // vii° is never a secondary target
        assert_eq!(RomanNumeral::functional(6, ChordQuality::Major, &c).to_string(), "#IV");
    }

    #[test]
    fn functional_diatonic_chords() {
        let c = KeySignature::major(0);
        assert_eq!(RomanNumeral::functional(7, ChordQuality::Dominant7, &c).to_string(), "V7");
        assert_eq!(RomanNumeral::functional(2, ChordQuality::Minor7, &c).to_string(), "ii7");

        let a_minor = KeySignature::minor(9);
        assert_eq!(RomanNumeral::functional(4, ChordQuality::Major, &a_minor).to_string(), "V");
        assert_eq!(RomanNumeral::functional(5, ChordQuality::Major, &a_minor).to_string(), "bVI");
        assert_eq!(RomanNumeral::functional(11, ChordQuality::Major, &a_minor).to_string(), "V/V");
    }

    #[test]
    fn secondary_interval_adds_target() {
        let numeral: RomanNumeral = "V7/ii".parse().unwrap();
        assert_eq!(numeral.interval(), 9);
        assert!(numeral.is_secondary());
        assert_eq!("V/V".parse::<RomanNumeral>().unwrap().interval(), 2);
    }

    #[test]
    fn normalization_strips_extensions() {
        let parse = |s: &str| s.parse::<RomanNumeral>().unwrap().normalized().to_string();
        assert_eq!(parse("i7"), "i");
        assert_eq!(parse("Imaj7"), "I");
        assert_eq!(parse("IVsus"), "IV");
        assert_eq!(parse("viiø7"), "vii°");
        assert_eq!(parse("V7/vi"), "V/vi");
        assert_eq!(parse("bIII+"), "bIII+");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<RomanNumeral>().is_err());
        assert!("b".parse::<RomanNumeral>().is_err());
        assert!("Iv".parse::<RomanNumeral>().is_err());
        assert!("VIII".parse::<RomanNumeral>().is_err());
        assert!("Ixyz".parse::<RomanNumeral>().is_err());
        assert!("V/".parse::<RomanNumeral>().is_err());
    }

    #[test]
    fn join_forms() {
        let numerals: Vec<RomanNumeral> = ["i7", "V7", "i7"].iter().map(|s| s.parse().unwrap()).collect();
        assert_eq!(join(&numerals), "i7-V7-i7");
        assert_eq!(join_normalized(&numerals), "i-V-i");
    }

    #[test]
    fn serializes_as_token() {
        let numeral: RomanNumeral = "bVII".parse().unwrap();
        assert_eq!(serde_json::to_value(&numeral).unwrap(), "bVII");
    }
}
