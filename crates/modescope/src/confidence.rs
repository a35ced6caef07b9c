//! Combine evidence and pattern strength into one bounded score.

use modeconf::AnalysisConfig;
use serde::Serialize;
use tracing::debug;

use crate::modes::Mode;
use crate::patterns::{PatternMatch, VampPattern};
use crate::types::{Evidence, EvidenceKind};

const PATTERN_WEIGHT: f64 = 0.3;
const STRUCTURAL_BONUS: f64 = 0.1;
const CONSISTENCY_BONUS: f64 = 0.1;

/// Everything the calculator reads for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInputs<'a> {
    pub evidence: &'a [Evidence],
    pub best_pattern: Option<&'a PatternMatch>,
    pub vamp: Option<&'a VampPattern>,
    /// Normalized numeral string, e.g. "I-IV-I"
    pub normalized: &'a str,
    pub mode: Mode,
    pub parent_supplied: bool,
}

/// How a confidence value was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceBreakdown {
    pub evidence_mean: f64,
    pub pattern_bonus: f64,
    pub structural_bonus: f64,
    pub consistency_bonus: f64,
    pub raw: f64,
    /// Highest special-case floor that applied, with its reason.
    pub floor: Option<(f64, &'static str)>,
    pub capped_for_missing_parent: bool,
    pub confidence: f64,
}

pub fn calculate_confidence(inputs: &ConfidenceInputs<'_>, config: &AnalysisConfig) -> ConfidenceBreakdown {
    let evidence = inputs.evidence;

    let evidence_mean = if evidence.is_empty() {
        0.0
    } else {
        evidence.iter().map(|e| e.strength).sum::<f64>() / evidence.len() as f64
    };

    let pattern_bonus = inputs
        .best_pattern
        .map(|p| p.strength * p.match_count as f64 * PATTERN_WEIGHT)
        .unwrap_or(0.0);

    let structural_bonus = if evidence.iter().any(|e| e.kind == EvidenceKind::Structural) {
        STRUCTURAL_BONUS
    } else {
        0.0
    };

    let kinds = distinct_kinds(evidence);
    let consistency_bonus = if kinds >= 2 { CONSISTENCY_BONUS } else { 0.0 };

    let raw = evidence_mean + pattern_bonus + structural_bonus + consistency_bonus;

    let mut floors: Vec<(f64, &'static str)> = Vec::new();
    if inputs.best_pattern.is_some_and(|p| p.strength >= 0.85) {
        floors.push((0.75, "strong pattern match"));
    }
    if kinds >= 2 && evidence_mean > 0.7 {
        floors.push((0.72, "consistent strong evidence"));
    }
    if let Some(vamp) = inputs.vamp {
        floors.push((vamp.floor, "two-chord vamp"));
    }
    if inputs.normalized == "I-IV-I" && inputs.mode == Mode::Ionian {
        floors.push((0.78, "plagal I-IV-I framing"));
    }
    if inputs.normalized == "i-IV-i" || inputs.normalized == "I-bVII-I" {
        floors.push((0.75, "canonical modal neighbour motion"));
    }

    let floor = floors.into_iter().max_by(|a, b| a.0.total_cmp(&b.0));

    let mut confidence = match floor {
        Some((value, _)) => raw.max(value),
        None => raw,
    };

    let capped_for_missing_parent = !inputs.parent_supplied && confidence > config.missing_parent_key_cap;
    if capped_for_missing_parent {
        confidence = config.missing_parent_key_cap;
    }

    let confidence = confidence.clamp(0.0, config.max_confidence);

    debug!(
        evidence_mean,
        pattern_bonus,
        raw,
        floor = ?floor,
        capped_for_missing_parent,
        confidence,
        "confidence breakdown"
    );

    ConfidenceBreakdown {
        evidence_mean,
        pattern_bonus,
        structural_bonus,
        consistency_bonus,
        raw,
        floor,
        capped_for_missing_parent,
        confidence,
    }
}

fn distinct_kinds(evidence: &[Evidence]) -> usize {
    let mut kinds: Vec<EvidenceKind> = evidence.iter().map(|e| e.kind).collect();
    kinds.sort();
    kinds.dedup();
    kinds.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{PatternContext, VAMP_PATTERNS};

    fn pattern(strength: f64, count: usize) -> PatternMatch {
        PatternMatch {
            pattern: "I-bVII-IV-I".into(),
            sequence: vec![],
            strength,
            modes: vec![Mode::Mixolydian],
            context: PatternContext::Cadential,
            match_count: count,
            exact: true,
        }
    }

    fn inputs<'a>(
        evidence: &'a [Evidence],
        best_pattern: Option<&'a PatternMatch>,
        normalized: &'a str,
        parent_supplied: bool,
    ) -> ConfidenceInputs<'a> {
        ConfidenceInputs {
            evidence,
            best_pattern,
            vamp: None,
            normalized,
            mode: Mode::Mixolydian,
            parent_supplied,
        }
    }

    #[test]
    fn bonuses_add_up_and_clamp() {
        let evidence = vec![
            Evidence::structural(0.8, "framed"),
            Evidence::intervallic(0.7, "bVII"),
            Evidence::contextual(0.6, "parent"),
        ];
        let best = pattern(0.95, 1);
        let result = calculate_confidence(
            &inputs(&evidence, Some(&best), "I-bVII-IV-I", true),
            &AnalysisConfig::default(),
        );

        assert!((result.evidence_mean - 0.7).abs() < 1e-9);
        assert!((result.pattern_bonus - 0.285).abs() < 1e-9);
        assert_eq!(result.structural_bonus, 0.1);
        assert_eq!(result.consistency_bonus, 0.1);
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn missing_parent_caps() {
        let evidence = vec![Evidence::structural(0.8, "framed"), Evidence::intervallic(0.7, "bVII")];
        let best = pattern(0.95, 1);
        let result = calculate_confidence(
            &inputs(&evidence, Some(&best), "I-bVII-IV-I", false),
            &AnalysisConfig::default(),
        );
        assert!(result.capped_for_missing_parent);
        assert_eq!(result.confidence, 0.65);
    }

    #[test]
    fn floors_raise_weak_scores() {
        let evidence = vec![Evidence::intervallic(0.3, "weak")];
        let result = calculate_confidence(&inputs(&evidence, None, "i-IV-i", true), &AnalysisConfig::default());
        assert!(result.raw < 0.75);
        assert_eq!(result.floor.map(|f| f.0), Some(0.75));
        assert_eq!(result.confidence, 0.75);
    }

    #[test]
    fn vamp_floor_applies() {
        let evidence = vec![Evidence::structural(0.1, "weak")];
        let vamp = VAMP_PATTERNS.iter().find(|v| v.label() == "I-bVII");
        let mut input = inputs(&evidence, None, "I-bVII", true);
        input.vamp = vamp;
        let result = calculate_confidence(&input, &AnalysisConfig::default());
        assert_eq!(result.confidence, 0.72);
    }

    #[test]
    fn ionian_plagal_floor_only_for_ionian() {
        let evidence: Vec<Evidence> = vec![];
        let mut input = inputs(&evidence, None, "I-IV-I", true);
        assert_eq!(calculate_confidence(&input, &AnalysisConfig::default()).confidence, 0.0);

        input.mode = Mode::Ionian;
        assert_eq!(calculate_confidence(&input, &AnalysisConfig::default()).confidence, 0.78);
    }

    #[test]
    fn configured_ceiling_is_respected() {
        let evidence = vec![Evidence::structural(1.0, "framed"), Evidence::cadential(1.0, "cadence")];
        let best = pattern(0.95, 3);
        let config = AnalysisConfig {
            max_confidence: 0.9,
            ..AnalysisConfig::default()
        };
        let result = calculate_confidence(&inputs(&evidence, Some(&best), "x", true), &config);
        assert_eq!(result.confidence, 0.9);
    }
}
