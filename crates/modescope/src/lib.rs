//! Harmonic analysis of chord progressions.
//!
//! Parses chord symbols into a [`Progression`], then reads it three ways:
//! modally ([`analyze_modal`]), functionally ([`analyze_functional`]) and
//! both at once through [`ComprehensiveAnalyzer`], which also scans for
//! chromatic chords. Everything here is pure and synchronous.

pub mod analyzer;
pub mod chord;
pub mod chromatic;
pub mod comprehensive;
pub mod confidence;
pub mod error;
pub mod evidence;
pub mod functional;
pub mod key;
pub mod modal;
pub mod modes;
pub mod notes;
pub mod patterns;
pub mod region;
pub mod roman;
pub mod suggest;
pub mod tonic;
pub mod types;

pub use analyzer::{HarmonyAnalyzer, HeuristicAnalyzer};
pub use chord::{parse_chord, split_progression, ChordQuality, ParsedChord, Progression};
pub use chromatic::{ChromaticAnalysis, ChromaticElement, ChromaticKind};
pub use comprehensive::{ComprehensiveAnalysis, ComprehensiveAnalyzer, PrimaryApproach};
pub use error::{AnalysisError, ChordParseError, KeyParseError, NumeralParseError};
pub use functional::{analyze_functional, CadenceKind, FunctionalAnalysis, ProgressionType};
pub use key::{estimate_key, KeyEstimate, KeySignature};
pub use modal::{analyze_modal, ModalAnalysis, ModalOutcome};
pub use modes::Mode;
pub use region::{classify_local_region, compare_regions, RegionClassification, RegionType};
pub use roman::RomanNumeral;
pub use suggest::{suggest_modes, ModeSuggestion};
pub use types::{Evidence, EvidenceKind, NoDataReason, PitchClass};

use modeconf::AnalysisConfig;

/// Parse a parent key string, treating blank input as absent.
pub fn parse_parent_key(parent_key: Option<&str>) -> Result<Option<KeySignature>, KeyParseError> {
    match parent_key.map(str::trim) {
        None | Some("") => Ok(None),
        Some(key) => key.parse().map(Some),
    }
}

/// Split and leniently parse a progression string, reporting why it
/// cannot be analyzed when it cannot.
pub fn prepare(input: &str) -> Result<Progression, NoDataReason> {
    let progression = Progression::from_input(input);
    progression.check()?;
    Ok(progression)
}

/// Modal analysis with default tunables. Unparseable chords are skipped.
///
/// Only a malformed parent key is an error; thin or functional input
/// comes back as a non-`Found` outcome.
pub fn analyze<S: AsRef<str>>(chords: &[S], parent_key: Option<&str>) -> Result<ModalOutcome, AnalysisError> {
    let parent = parse_parent_key(parent_key)?;
    let progression = Progression::parse_lenient(chords);
    Ok(analyze_modal(&progression, parent, &AnalysisConfig::default()))
}

/// Like [`analyze`], but any unparseable chord is an error.
pub fn analyze_strict<S: AsRef<str>>(chords: &[S], parent_key: Option<&str>) -> Result<ModalOutcome, AnalysisError> {
    let parent = parse_parent_key(parent_key)?;
    let progression = Progression::parse_strict(chords)?;
    Ok(analyze_modal(&progression, parent, &AnalysisConfig::default()))
}

/// Functional, modal and chromatic readings with default tunables.
pub fn analyze_comprehensive<S: AsRef<str>>(
    chords: &[S],
    parent_key: Option<&str>,
) -> Result<Option<ComprehensiveAnalysis>, AnalysisError> {
    let parent = parse_parent_key(parent_key)?;
    let progression = Progression::parse_lenient(chords);
    Ok(ComprehensiveAnalyzer::new(AnalysisConfig::default()).analyze(&progression, parent))
}
