//! Chord symbol parsing and the parsed progression.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ChordParseError;
use crate::notes;
use crate::types::{NoDataReason, PitchClass};

/// Chord quality, decided once at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Major7,
    Minor7,
    Dominant7,
    Diminished,
    HalfDiminished,
    Augmented,
    Sus2,
    Sus4,
}

/// The triad underneath a quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Triad {
    Major,
    Minor,
    Diminished,
    Augmented,
    Suspended,
}

impl Triad {
    /// Whether a Roman numeral for this triad is written uppercase.
    pub fn is_upper(self) -> bool {
        matches!(self, Triad::Major | Triad::Augmented | Triad::Suspended)
    }
}

/// The seventh stacked on a triad, when there is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seventh {
    Major,
    Minor,
    Dominant,
    HalfDiminished,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 10] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Major7,
        ChordQuality::Minor7,
        ChordQuality::Dominant7,
        ChordQuality::Diminished,
        ChordQuality::HalfDiminished,
        ChordQuality::Augmented,
        ChordQuality::Sus2,
        ChordQuality::Sus4,
    ];

    pub fn triad(self) -> Triad {
        match self {
            ChordQuality::Major | ChordQuality::Major7 | ChordQuality::Dominant7 => Triad::Major,
            ChordQuality::Minor | ChordQuality::Minor7 => Triad::Minor,
            ChordQuality::Diminished | ChordQuality::HalfDiminished => Triad::Diminished,
            ChordQuality::Augmented => Triad::Augmented,
            ChordQuality::Sus2 | ChordQuality::Sus4 => Triad::Suspended,
        }
    }

    pub fn seventh(self) -> Option<Seventh> {
        match self {
            ChordQuality::Major7 => Some(Seventh::Major),
            ChordQuality::Minor7 => Some(Seventh::Minor),
            ChordQuality::Dominant7 => Some(Seventh::Dominant),
            ChordQuality::HalfDiminished => Some(Seventh::HalfDiminished),
            _ => None,
        }
    }

    pub fn is_minor(self) -> bool {
        self.triad() == Triad::Minor
    }

    pub fn is_major(self) -> bool {
        self.triad() == Triad::Major
    }

    /// Major triad or dominant seventh: the shapes that can act as a dominant.
    pub fn is_dominant_shape(self) -> bool {
        matches!(self, ChordQuality::Major | ChordQuality::Dominant7)
    }

    /// Suffix for chord symbol display
    pub fn suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Diminished => "dim",
            ChordQuality::HalfDiminished => "m7b5",
            ChordQuality::Augmented => "aug",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
        }
    }
}

/// A chord symbol reduced to root and quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedChord {
    /// The symbol as written: "Bbm7"
    pub symbol: String,
    /// Root spelling as written: "Bb"
    pub root_name: String,
    pub root: PitchClass,
    pub quality: ChordQuality,
}

impl ParsedChord {
    /// Same root and same quality.
    pub fn same_harmony(&self, other: &ParsedChord) -> bool {
        self.root == other.root && self.quality == other.quality
    }
}

impl std::str::FromStr for ParsedChord {
    type Err = ChordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_chord(s)
    }
}

/// Parse a chord symbol such as `"Cmaj7"`, `"Bbm7"`, `"F#dim"` or `"G/B"`.
///
/// The root is an uppercase letter A–G followed by any accidentals; the
/// remainder decides the quality, most specific check first. Slash basses
/// are ignored.
pub fn parse_chord(symbol: &str) -> Result<ParsedChord, ChordParseError> {
    let trimmed = symbol.trim();
    let letter = trimmed.chars().next().ok_or(ChordParseError::Empty)?;

    if !matches!(letter, 'A'..='G') {
        return Err(ChordParseError::MissingRoot {
            symbol: trimmed.to_string(),
        });
    }

    let root_len = letter.len_utf8()
        + trimmed[letter.len_utf8()..]
            .chars()
            .take_while(|c| matches!(c, '#' | 'b' | '♯' | '♭'))
            .map(char::len_utf8)
            .sum::<usize>();
    let root_name = &trimmed[..root_len];

    let root = notes::pitch_class(root_name).ok_or_else(|| ChordParseError::UnknownRoot {
        symbol: trimmed.to_string(),
        root: root_name.to_string(),
    })?;

    let quality = classify_quality(&trimmed[root_len..]);

    Ok(ParsedChord {
        symbol: trimmed.to_string(),
        root_name: root_name.replace('♯', "#").replace('♭', "b"),
        root,
        quality,
    })
}

/// Decide the quality from everything after the root.
fn classify_quality(rest: &str) -> ChordQuality {
    let rest = rest.split('/').next().unwrap_or("");
    let rest = strip_additions(rest);
    let rest = rest.as_str();

    if rest.contains("m7b5") || rest.contains("m7-5") || rest.contains('ø') {
        ChordQuality::HalfDiminished
    } else if rest.contains("dim") || rest.contains('°') || rest.starts_with('o') {
        ChordQuality::Diminished
    } else if rest.contains("aug") || rest.contains('+') {
        ChordQuality::Augmented
    } else if ["maj7", "maj9", "ma7", "M7", "M9", "Δ"]
        .iter()
        .any(|m| rest.contains(m))
    {
        ChordQuality::Major7
    } else if ["m7", "min7", "mi7", "-7", "m9", "mi9", "m11", "mi11", "m13", "mi13"]
        .iter()
        .any(|m| rest.contains(m))
    {
        ChordQuality::Minor7
    } else if ["7", "9", "11", "13"].iter().any(|m| rest.contains(m)) {
        ChordQuality::Dominant7
    } else if (rest.starts_with('m') && !rest.starts_with("maj")) || rest.starts_with('-') {
        ChordQuality::Minor
    } else if rest.contains("sus2") {
        ChordQuality::Sus2
    } else if rest.contains("sus") {
        ChordQuality::Sus4
    } else {
        ChordQuality::Major
    }
}

/// Remove added-tone and sixth markings ("add9", "6", "69", "6/9") that do
/// not change the quality.
fn strip_additions(rest: &str) -> String {
    let mut out = String::with_capacity(rest.len());
    let mut remaining = rest;

    while !remaining.is_empty() {
        if let Some(after) = remaining.strip_prefix("add") {
            remaining = after.trim_start_matches(|c: char| c.is_ascii_digit());
        } else if let Some(after) = remaining.strip_prefix("69") {
            remaining = after;
        } else if let Some(after) = remaining.strip_prefix('6') {
            remaining = after;
        } else {
            let mut chars = remaining.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            remaining = chars.as_str();
        }
    }

    out
}

/// Split a progression string into chord tokens. Whitespace and `|` bar
/// markers both separate; bar-only tokens such as `:` vanish.
pub fn split_progression(input: &str) -> Vec<&str> {
    input
        .split(|c: char| c.is_whitespace() || c == '|')
        .filter(|token| !token.is_empty() && !token.chars().all(|c| c == ':'))
        .collect()
}

/// A chord token that could not be parsed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedChord {
    pub index: usize,
    pub token: String,
    pub error: String,
}

/// An ordered progression: the tokens as given, the chords that parsed,
/// and which token each chord came from.
///
/// Immutable once built; every analyzer reads the same instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progression {
    tokens: Vec<String>,
    chords: Vec<ParsedChord>,
    /// For each token, the index of its chord in `chords`.
    slots: Vec<Option<usize>>,
    skipped: Vec<SkippedChord>,
}

impl Progression {
    /// Parse every token, failing on the first unparseable one.
    pub fn parse_strict<S: AsRef<str>>(tokens: &[S]) -> Result<Self, ChordParseError> {
        let chords = tokens
            .iter()
            .map(|t| parse_chord(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
            slots: (0..chords.len()).map(Some).collect(),
            chords,
            skipped: Vec::new(),
        })
    }

    /// Parse every token, skipping the ones that fail.
    pub fn parse_lenient<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut chords = Vec::new();
        let mut slots = Vec::with_capacity(tokens.len());
        let mut skipped = Vec::new();

        for (index, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            match parse_chord(token) {
                Ok(chord) => {
                    slots.push(Some(chords.len()));
                    chords.push(chord);
                }
                Err(e) => {
                    warn!(index, token, error = %e, "skipping unparseable chord");
                    slots.push(None);
                    skipped.push(SkippedChord {
                        index,
                        token: token.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Self {
            tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
            chords,
            slots,
            skipped,
        }
    }

    /// Split a progression string and parse it leniently.
    pub fn from_input(input: &str) -> Self {
        Self::parse_lenient(&split_progression(input))
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn chords(&self) -> &[ParsedChord] {
        &self.chords
    }

    pub fn skipped(&self) -> &[SkippedChord] {
        &self.skipped
    }

    /// Whether the progression can support any classification.
    ///
    /// Needs at least two parsed chords that are not all identical.
    pub fn check(&self) -> Result<(), NoDataReason> {
        match self.tokens.len() {
            0 => return Err(NoDataReason::Empty),
            1 => return Err(NoDataReason::SingleChord),
            _ => {}
        }

        if self.chords.len() < 2 {
            return Err(NoDataReason::TooFewValidChords {
                valid: self.chords.len(),
            });
        }

        let first = &self.chords[0];
        if self.chords.iter().all(|c| c.same_harmony(first)) {
            return Err(NoDataReason::StaticHarmony);
        }

        Ok(())
    }

    /// Spread one value per parsed chord back over the original tokens,
    /// using `missing` for tokens that failed to parse.
    pub fn align<T: Clone>(&self, per_chord: &[T], missing: T) -> Vec<T> {
        self.slots
            .iter()
            .map(|slot| {
                slot.and_then(|i| per_chord.get(i).cloned())
                    .unwrap_or_else(|| missing.clone())
            })
            .collect()
    }

    /// Root spelling the user wrote for a pitch class, if any chord has it.
    pub fn spelling_of(&self, pitch_class: PitchClass) -> Option<&str> {
        self.chords
            .iter()
            .find(|c| c.root == pitch_class)
            .map(|c| c.root_name.as_str())
    }

    /// Quality of the first chord rooted on `pitch_class`.
    pub fn quality_at(&self, pitch_class: PitchClass) -> Option<ChordQuality> {
        self.chords
            .iter()
            .find(|c| c.root == pitch_class)
            .map(|c| c.quality)
    }
}
