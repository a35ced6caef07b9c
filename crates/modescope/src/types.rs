use serde::{Deserialize, Serialize};

/// Pitch class 0–11 (C=0, C#=1, ...)
pub type PitchClass = u8;

/// Interval in semitones above a tonic, always reduced to 0–11.
pub fn interval_above(tonic: PitchClass, pitch_class: PitchClass) -> u8 {
    (pitch_class % 12 + 12 - tonic % 12) % 12
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// Position-based: tonic framing, two-chord vamps.
    Structural,
    /// Resolutions between adjacent chords.
    Cadential,
    /// Presence of a characteristic scale degree anywhere.
    Intervallic,
    /// Relationship to the caller-supplied parent key.
    Contextual,
}

impl std::fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvidenceKind::Structural => write!(f, "structural"),
            EvidenceKind::Cadential => write!(f, "cadential"),
            EvidenceKind::Intervallic => write!(f, "intervallic"),
            EvidenceKind::Contextual => write!(f, "contextual"),
        }
    }
}

/// One weighted observation supporting an interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(rename = "type")]
    pub kind: EvidenceKind,
    /// 0.0–1.0
    pub strength: f64,
    pub description: String,
}

impl Evidence {
    pub fn new(kind: EvidenceKind, strength: f64, description: impl Into<String>) -> Self {
        Self {
            kind,
            strength: strength.clamp(0.0, 1.0),
            description: description.into(),
        }
    }

    pub fn structural(strength: f64, description: impl Into<String>) -> Self {
        Self::new(EvidenceKind::Structural, strength, description)
    }

    pub fn cadential(strength: f64, description: impl Into<String>) -> Self {
        Self::new(EvidenceKind::Cadential, strength, description)
    }

    pub fn intervallic(strength: f64, description: impl Into<String>) -> Self {
        Self::new(EvidenceKind::Intervallic, strength, description)
    }

    pub fn contextual(strength: f64, description: impl Into<String>) -> Self {
        Self::new(EvidenceKind::Contextual, strength, description)
    }
}

/// Why an analyzer produced no result at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum NoDataReason {
    /// No chord tokens were given.
    Empty,
    /// Exactly one chord token was given.
    SingleChord,
    /// Every chord is the same root and quality.
    StaticHarmony,
    /// Too many tokens failed to parse.
    TooFewValidChords { valid: usize },
}

impl std::fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoDataReason::Empty => write!(f, "empty progression"),
            NoDataReason::SingleChord => write!(f, "a single chord cannot establish a tonal center"),
            NoDataReason::StaticHarmony => write!(f, "static harmony (every chord is identical)"),
            NoDataReason::TooFewValidChords { valid } => {
                write!(f, "only {} recognizable chord(s); at least 2 are needed", valid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_wraps_below_tonic() {
        assert_eq!(interval_above(7, 5), 10); // F over G is bVII
        assert_eq!(interval_above(0, 7), 7);
        assert_eq!(interval_above(4, 4), 0);
    }

    #[test]
    fn evidence_strength_is_clamped() {
        let e = Evidence::structural(1.4, "too strong");
        assert_eq!(e.strength, 1.0);
        assert_eq!(e.kind, EvidenceKind::Structural);
    }

    #[test]
    fn evidence_serializes_kind_as_type() {
        let e = Evidence::cadential(0.85, "bVII → I");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "cadential");
    }
}
