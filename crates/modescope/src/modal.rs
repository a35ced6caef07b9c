//! Modal analysis: which tonic and mode best explain a progression.

use modeconf::AnalysisConfig;
use serde::Serialize;
use tracing::{debug, info};

use crate::chord::{ParsedChord, Progression};
use crate::confidence::{calculate_confidence, ConfidenceBreakdown, ConfidenceInputs};
use crate::evidence::collect_evidence;
use crate::key::KeySignature;
use crate::modes::{determine_mode, Mode, ModeContext};
use crate::notes;
use crate::patterns::{self, FoilPattern, PatternMatch};
use crate::roman::{self, RomanNumeral};
use crate::tonic::{resolve_tonic, TonicCandidate};
use crate::types::{interval_above, Evidence, EvidenceKind, NoDataReason, PitchClass};

/// A modal reading of a progression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalAnalysis {
    pub tonic: PitchClass,
    pub tonic_name: String,
    pub mode: Mode,
    /// "G Mixolydian"
    pub mode_name: String,
    /// The supplied parent key, or the major key the mode is a rotation of.
    pub parent_key: KeySignature,
    pub parent_key_name: String,
    pub parent_key_supplied: bool,
    /// One per input token; "?" for tokens that did not parse.
    pub roman_numerals: Vec<String>,
    pub confidence: f64,
    pub evidence: Vec<Evidence>,
    pub characteristics: Vec<String>,
    pub pattern_matches: Vec<PatternMatch>,
    /// Name of the mode rule that decided.
    pub mode_rule: &'static str,
    pub breakdown: ConfidenceBreakdown,
}

/// What the modal analyzer concluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModalOutcome {
    /// The input cannot support any classification.
    NoData { reason: NoDataReason },
    /// The best reading stayed under the reporting threshold.
    BelowThreshold {
        best_confidence: f64,
        best_mode: String,
        /// Foil that capped every candidate, if one matched.
        foil: Option<String>,
    },
    /// A plain functional progression; no modal reading attempted.
    RejectedFunctional { pattern: String, reason: String },
    Found(Box<ModalAnalysis>),
}

impl ModalOutcome {
    pub fn found(&self) -> Option<&ModalAnalysis> {
        match self {
            ModalOutcome::Found(analysis) => Some(analysis),
            _ => None,
        }
    }

    pub fn into_found(self) -> Option<ModalAnalysis> {
        match self {
            ModalOutcome::Found(analysis) => Some(*analysis),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ModalOutcome::Found(_))
    }

    /// Confidence of the best reading, whether or not it was reported.
    pub fn confidence(&self) -> Option<f64> {
        match self {
            ModalOutcome::Found(analysis) => Some(analysis.confidence),
            ModalOutcome::BelowThreshold { best_confidence, .. } => Some(*best_confidence),
            _ => None,
        }
    }
}

/// One tonic candidate, fully scored.
struct ScoredCandidate {
    candidate: TonicCandidate,
    numerals: Vec<RomanNumeral>,
    pattern_matches: Vec<PatternMatch>,
    evidence: Vec<Evidence>,
    mode: Mode,
    mode_rule: &'static str,
    breakdown: ConfidenceBreakdown,
    foil: Option<&'static FoilPattern>,
    confidence: f64,
}

fn modal_numerals(chords: &[ParsedChord], tonic: PitchClass) -> Vec<RomanNumeral> {
    chords
        .iter()
        .map(|c| RomanNumeral::modal(interval_above(tonic, c.root), c.quality))
        .collect()
}

fn score_candidate(chords: &[ParsedChord], candidate: TonicCandidate, config: &AnalysisConfig) -> ScoredCandidate {
    let numerals = modal_numerals(chords, candidate.tonic);
    let normalized = roman::join_normalized(&numerals);
    let pattern_matches = patterns::match_modal_patterns(&numerals);
    let vamp = patterns::match_vamp(&numerals);
    let evidence = collect_evidence(chords, &candidate, vamp);

    let ctx = ModeContext {
        tonic: candidate.tonic,
        chords,
        best_pattern: pattern_matches.first(),
        supplied_parent: candidate.parent_supplied().then_some(candidate.parent_key),
    };
    let (mode, mode_rule) = determine_mode(&ctx);

    let breakdown = calculate_confidence(
        &ConfidenceInputs {
            evidence: &evidence,
            best_pattern: pattern_matches.first(),
            vamp,
            normalized: &normalized,
            mode,
            parent_supplied: candidate.parent_supplied(),
        },
        config,
    );

    debug!(
        tonic = candidate.tonic,
        numerals = %normalized,
        mode = %mode,
        rule = mode_rule,
        confidence = breakdown.confidence,
        "scored tonic candidate"
    );

    ScoredCandidate {
        confidence: breakdown.confidence,
        foil: patterns::match_foil(&numerals),
        candidate,
        numerals,
        pattern_matches,
        evidence,
        mode,
        mode_rule,
        breakdown,
    }
}

/// Hold every candidate whose numerals match a foil to `ceiling`. Returns
/// the first foil seen.
fn cap_foiled(scored: &mut [ScoredCandidate], ceiling: f64) -> Option<&'static FoilPattern> {
    let mut first = None;
    for s in scored.iter_mut() {
        if let Some(foil) = s.foil {
            debug!(tonic = s.candidate.tonic, foil = %foil.label(), ceiling, "foil pattern caps candidate");
            s.confidence = s.confidence.min(ceiling);
            first = first.or(Some(foil));
        }
    }
    first
}

/// Find the tonic and mode that best explain `progression`.
///
/// Plain functional progressions are rejected before any candidate is
/// scored. A candidate matching a foil is capped at the foil ceiling before
/// the best one is chosen. Readings below `modal_min_confidence` are not
/// reported.
pub fn analyze_modal(
    progression: &Progression,
    parent_key: Option<KeySignature>,
    config: &AnalysisConfig,
) -> ModalOutcome {
    if let Err(reason) = progression.check() {
        debug!(%reason, "no modal analysis");
        return ModalOutcome::NoData { reason };
    }

    let chords = progression.chords();
    let candidates = resolve_tonic(chords, parent_key, config.max_tonic_candidates);
    let Some(lead) = candidates.first() else {
        return ModalOutcome::NoData {
            reason: NoDataReason::TooFewValidChords { valid: chords.len() },
        };
    };

    let lead_numerals = modal_numerals(chords, lead.tonic);
    if let Some(template) = patterns::functional_prescreen(&lead_numerals, config.functional_prescreen_strength) {
        info!(pattern = %template.label(), "functional progression, modal reading rejected");
        return ModalOutcome::RejectedFunctional {
            pattern: template.label(),
            reason: format!(
                "{} is a functional progression (strength {:.2}) with no modal colour tones",
                template.label(),
                template.strength
            ),
        };
    }

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|c| score_candidate(chords, c, config))
        .collect();

    let foil = cap_foiled(&mut scored, config.foil_ceiling);

    // Strictly greater keeps the earlier candidate on ties.
    let mut best_index = 0;
    for (i, s) in scored.iter().enumerate() {
        if s.confidence > scored[best_index].confidence {
            best_index = i;
        }
    }
    let best = scored.swap_remove(best_index);

    let tonic_name = spell_tonic(progression, &best.candidate);
    let mode_name = format!("{} {}", tonic_name, best.mode);

    if best.confidence < config.modal_min_confidence {
        info!(mode = %mode_name, confidence = best.confidence, "modal reading below threshold");
        return ModalOutcome::BelowThreshold {
            best_confidence: best.confidence,
            best_mode: mode_name,
            foil: best.foil.or(foil).map(|f| format!("{} ({})", f.label(), f.explanation)),
        };
    }

    let parent_key = if best.candidate.parent_supplied() {
        best.candidate.parent_key
    } else {
        best.mode.parent_key(best.candidate.tonic)
    };

    let characteristics = characteristics(chords, &best);
    let roman_numerals = progression.align(
        &best.numerals.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "?".to_string(),
    );

    info!(mode = %mode_name, confidence = best.confidence, "modal reading found");

    ModalOutcome::Found(Box::new(ModalAnalysis {
        tonic: best.candidate.tonic,
        tonic_name,
        mode: best.mode,
        mode_name,
        parent_key_name: parent_key.to_string(),
        parent_key,
        parent_key_supplied: best.candidate.parent_supplied(),
        roman_numerals,
        confidence: best.confidence,
        evidence: best.evidence,
        characteristics,
        pattern_matches: best.pattern_matches,
        mode_rule: best.mode_rule,
        breakdown: best.breakdown,
    }))
}

/// The user's spelling of the tonic when a chord has it, else the parent
/// key's accidentals.
fn spell_tonic(progression: &Progression, candidate: &TonicCandidate) -> String {
    progression
        .spelling_of(candidate.tonic)
        .map(str::to_string)
        .unwrap_or_else(|| {
            notes::note_name(candidate.tonic, candidate.parent_key.prefers_flats()).to_string()
        })
}

fn characteristics(chords: &[ParsedChord], best: &ScoredCandidate) -> Vec<String> {
    let mut out = Vec::new();
    let tonic = best.candidate.tonic;

    if let Some(characteristic) = best.mode.characteristic() {
        let carrier = chords.iter().zip(&best.numerals).find(|(c, _)| {
            characteristic.sounded_by(interval_above(tonic, c.root), c.quality.triad())
        });
        if let Some((chord, numeral)) = carrier {
            out.push(format!(
                "{} ({}) supplies the {} of {}",
                numeral, chord.symbol, characteristic.description, best.mode
            ));
        }
    }

    out.extend(
        best.evidence
            .iter()
            .filter(|e| e.kind == EvidenceKind::Cadential)
            .map(|e| e.description.clone()),
    );

    if let Some(pattern) = best.pattern_matches.first() {
        if pattern.modes.contains(&best.mode) {
            out.push(format!("Characteristic {} pattern: {}", best.mode, pattern.pattern));
        }
    }

    out
}
