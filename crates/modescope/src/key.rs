//! Key signatures, diatonic quality tables, and profile-based key estimation.

use serde::{Deserialize, Serialize};

use crate::chord::{ChordQuality, Seventh, Triad};
use crate::error::KeyParseError;
use crate::notes;
use crate::types::{interval_above, PitchClass};

/// Krumhansl-Kessler major key profile (duration-weighted perception studies).
const MAJOR_PROFILE: [f64; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];

/// Krumhansl-Kessler minor key profile.
const MINOR_PROFILE: [f64; 12] = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

/// Major-key tonics conventionally written with flats: F, Bb, Eb, Ab, Db, Gb.
const FLAT_MAJOR_TONICS: [u8; 6] = [5, 10, 3, 8, 1, 6];

/// A major or minor key such as "Bb major".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySignature {
    pub tonic: PitchClass,
    pub is_minor: bool,
}

impl KeySignature {
    pub fn major(tonic: PitchClass) -> Self {
        Self {
            tonic: tonic % 12,
            is_minor: false,
        }
    }

    pub fn minor(tonic: PitchClass) -> Self {
        Self {
            tonic: tonic % 12,
            is_minor: true,
        }
    }

    /// Tonic of the major key sharing this key's signature.
    pub fn relative_major_tonic(&self) -> PitchClass {
        if self.is_minor {
            (self.tonic + 3) % 12
        } else {
            self.tonic
        }
    }

    /// Whether notes in this key are spelled with flats.
    pub fn prefers_flats(&self) -> bool {
        FLAT_MAJOR_TONICS.contains(&self.relative_major_tonic())
    }

    pub fn tonic_name(&self) -> &'static str {
        notes::note_name(self.tonic, self.prefers_flats())
    }

    /// The diatonic degree table for this key.
    pub fn degrees(&self) -> &'static [DiatonicDegree] {
        if self.is_minor {
            &MINOR_DEGREES
        } else {
            &MAJOR_DEGREES
        }
    }

    /// The degree a chord on `root` with `quality` occupies, if it is diatonic.
    pub fn diatonic_degree(&self, root: PitchClass, quality: ChordQuality) -> Option<&'static DiatonicDegree> {
        let interval = interval_above(self.tonic, root);
        self.degrees()
            .iter()
            .find(|d| d.interval == interval && d.accepts(quality))
    }

    pub fn is_diatonic(&self, root: PitchClass, quality: ChordQuality) -> bool {
        self.diatonic_degree(root, quality).is_some()
    }

    /// Whether any diatonic degree sits on this interval, regardless of quality.
    pub fn has_degree_at(&self, interval: u8) -> bool {
        self.degrees().iter().any(|d| d.interval == interval % 12)
    }
}

impl std::fmt::Display for KeySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let quality = if self.is_minor { "minor" } else { "major" };
        write!(f, "{} {}", self.tonic_name(), quality)
    }
}

impl std::str::FromStr for KeySignature {
    type Err = KeyParseError;

    /// `<Letter>[#|b] [major|minor|maj|min|m]`, case-insensitive. A missing
    /// quality means major; `"Am"` and `"A m"` are both A minor.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars.next().ok_or(KeyParseError::Empty)?.to_ascii_uppercase();
        if !matches!(letter, 'A'..='G') {
            return Err(KeyParseError::MissingRoot(s.to_string()));
        }

        let rest = chars.as_str();
        let accidental_len: usize = rest
            .chars()
            .take_while(|c| matches!(c, '#' | 'b' | '♯' | '♭'))
            .map(char::len_utf8)
            .sum();

        let (accidental, quality) = rest.split_at(accidental_len);
        let mut root = String::new();
        root.push(letter);
        root.push_str(accidental);

        let tonic = notes::pitch_class(&root).ok_or_else(|| KeyParseError::UnknownRoot(root.clone()))?;

        let is_minor = match quality.trim().to_ascii_lowercase().as_str() {
            "" | "major" | "maj" => false,
            "minor" | "min" | "m" => true,
            other => {
                return Err(KeyParseError::UnknownQuality {
                    quality: other.to_string(),
                })
            }
        };

        Ok(Self {
            tonic,
            is_minor,
        })
    }
}

/// Expected chord on one scale degree of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiatonicDegree {
    /// Semitones above the key's tonic.
    pub interval: u8,
    pub triad: Triad,
    /// Seventh expected when the chord carries one.
    pub seventh: Option<Seventh>,
}

impl DiatonicDegree {
    const fn new(interval: u8, triad: Triad, seventh: Option<Seventh>) -> Self {
        Self {
            interval,
            triad,
            seventh,
        }
    }

    /// Whether a chord of `quality` fits this degree. Suspended chords fit
    /// any degree with a perfect fifth.
    pub fn accepts(&self, quality: ChordQuality) -> bool {
        match quality.triad() {
            Triad::Suspended => self.triad != Triad::Diminished,
            triad if triad != self.triad => false,
            _ => match quality.seventh() {
                Some(seventh) => self.seventh == Some(seventh),
                None => true,
            },
        }
    }
}

pub static MAJOR_DEGREES: [DiatonicDegree; 7] = [
    DiatonicDegree::new(0, Triad::Major, Some(Seventh::Major)),
    DiatonicDegree::new(2, Triad::Minor, Some(Seventh::Minor)),
    DiatonicDegree::new(4, Triad::Minor, Some(Seventh::Minor)),
    DiatonicDegree::new(5, Triad::Major, Some(Seventh::Major)),
    DiatonicDegree::new(7, Triad::Major, Some(Seventh::Dominant)),
    DiatonicDegree::new(9, Triad::Minor, Some(Seventh::Minor)),
    DiatonicDegree::new(11, Triad::Diminished, Some(Seventh::HalfDiminished)),
];

/// Natural minor plus the harmonic-minor V and vii°.
pub static MINOR_DEGREES: [DiatonicDegree; 9] = [
    DiatonicDegree::new(0, Triad::Minor, Some(Seventh::Minor)),
    DiatonicDegree::new(2, Triad::Diminished, Some(Seventh::HalfDiminished)),
    DiatonicDegree::new(3, Triad::Major, Some(Seventh::Major)),
    DiatonicDegree::new(5, Triad::Minor, Some(Seventh::Minor)),
    DiatonicDegree::new(7, Triad::Major, Some(Seventh::Dominant)),
    DiatonicDegree::new(7, Triad::Minor, Some(Seventh::Minor)),
    DiatonicDegree::new(8, Triad::Major, Some(Seventh::Major)),
    DiatonicDegree::new(10, Triad::Major, Some(Seventh::Dominant)),
    DiatonicDegree::new(11, Triad::Diminished, None),
];

/// Result of profile-based key estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyEstimate {
    pub key: KeySignature,
    /// Best Pearson correlation, -1.0–1.0
    pub correlation: f64,
    /// Correlation mapped to 0.0–1.0 as (r + 1) / 2
    pub confidence: f64,
}

/// Estimate the key of a weighted pitch-class histogram using the
/// Krumhansl-Schmuckler algorithm.
///
/// Correlates the histogram against all 24 major/minor key profiles and
/// returns the best match. Returns `None` for an empty histogram.
pub fn estimate_key(histogram: &[f64; 12]) -> Option<KeyEstimate> {
    let total: f64 = histogram.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut normalized = [0.0; 12];
    for (n, h) in normalized.iter_mut().zip(histogram) {
        *n = h / total;
    }

    let mut best = KeySignature::major(0);
    let mut best_corr = -1.0_f64;

    for root in 0..12u8 {
        // Rotate histogram so root = index 0
        let mut rotated = [0.0; 12];
        for (i, slot) in rotated.iter_mut().enumerate() {
            *slot = normalized[(i + root as usize) % 12];
        }

        let major_corr = pearson(&rotated, &MAJOR_PROFILE);
        if major_corr > best_corr {
            best_corr = major_corr;
            best = KeySignature::major(root);
        }

        let minor_corr = pearson(&rotated, &MINOR_PROFILE);
        if minor_corr > best_corr {
            best_corr = minor_corr;
            best = KeySignature::minor(root);
        }
    }

    Some(KeyEstimate {
        key: best,
        correlation: (best_corr * 10000.0).round() / 10000.0,
        confidence: (((best_corr + 1.0) / 2.0) * 10000.0).round() / 10000.0,
    })
}

/// Pearson correlation coefficient between two 12-element arrays.
fn pearson(x: &[f64; 12], y: &[f64; 12]) -> f64 {
    let x_mean: f64 = x.iter().sum::<f64>() / 12.0;
    let y_mean: f64 = y.iter().sum::<f64>() / 12.0;

    let mut num = 0.0;
    let mut x_sq = 0.0;
    let mut y_sq = 0.0;

    for i in 0..12 {
        let xd = x[i] - x_mean;
        let yd = y[i] - y_mean;
        num += xd * yd;
        x_sq += xd * xd;
        y_sq += yd * yd;
    }

    let denom = (x_sq * y_sq).sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    num / denom
}
