use std::sync::Arc;

use modeconf::AnalysisConfig;
use serde::Serialize;
use tracing::info;

use crate::analyzer::{HarmonyAnalyzer, HeuristicAnalyzer};
use crate::chord::Progression;
use crate::chromatic::{scan_chromatic, ChromaticAnalysis};
use crate::functional::FunctionalAnalysis;
use crate::key::KeySignature;
use crate::modal::{ModalAnalysis, ModalOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryApproach {
    Functional,
    Modal,
    Chromatic,
}

impl std::fmt::Display for PrimaryApproach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryApproach::Functional => write!(f, "functional"),
            PrimaryApproach::Modal => write!(f, "modal"),
            PrimaryApproach::Chromatic => write!(f, "chromatic"),
        }
    }
}

/// Functional, modal and chromatic readings merged into one result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComprehensiveAnalysis {
    pub functional: FunctionalAnalysis,
    /// Present only when the modal reading clears the inclusion threshold.
    pub modal: Option<ModalAnalysis>,
    /// Why the modal reading was left out, when it was.
    pub modal_exclusion: Option<String>,
    /// Present only when the chromatic scan clears its threshold.
    pub chromatic: Option<ChromaticAnalysis>,
    pub primary_approach: PrimaryApproach,
    pub confidence: f64,
    pub explanation: String,
}

/// Runs both analyzers over one progression and picks the primary
/// explanation.
pub struct ComprehensiveAnalyzer {
    analyzer: Arc<dyn HarmonyAnalyzer>,
    config: AnalysisConfig,
}

impl ComprehensiveAnalyzer {
    /// Create with the default heuristic analyzer.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            analyzer: Arc::new(HeuristicAnalyzer::new(config.clone())),
            config,
        }
    }

    /// Create with a custom analyzer backend.
    pub fn with_analyzer(analyzer: Arc<dyn HarmonyAnalyzer>, config: AnalysisConfig) -> Self {
        Self { analyzer, config }
    }

    pub fn analyzer(&self) -> &Arc<dyn HarmonyAnalyzer> {
        &self.analyzer
    }

    /// Returns `None` when the functional analyzer has nothing to say,
    /// which happens exactly when the progression has no usable data.
    pub fn analyze(
        &self,
        progression: &Progression,
        parent_key: Option<KeySignature>,
    ) -> Option<ComprehensiveAnalysis> {
        let functional = self.analyzer.analyze_functional(progression, parent_key)?;
        let modal_outcome = self.analyzer.analyze_modal(progression, parent_key);

        let threshold = self.config.modal_inclusion_threshold;
        let (modal, modal_exclusion) = match modal_outcome {
            ModalOutcome::Found(analysis) if analysis.confidence >= threshold => (Some(*analysis), None),
            ModalOutcome::Found(analysis) => (
                None,
                Some(format!(
                    "{} at {:.2} is below the inclusion threshold {:.2}",
                    analysis.mode_name, analysis.confidence, threshold
                )),
            ),
            ModalOutcome::BelowThreshold {
                best_confidence,
                best_mode,
                foil,
            } => (
                None,
                Some(match foil {
                    Some(foil) => format!("{} capped at {:.2} by foil {}", best_mode, best_confidence, foil),
                    None => format!("best reading {} only reached {:.2}", best_mode, best_confidence),
                }),
            ),
            ModalOutcome::RejectedFunctional { reason, .. } => (None, Some(reason)),
            ModalOutcome::NoData { reason } => (None, Some(reason.to_string())),
        };

        let chromatic = scan_chromatic(&functional).filter(|c| c.confidence >= self.config.chromatic_min_confidence);

        let primary_approach = if chromatic.as_ref().is_some_and(ChromaticAnalysis::has_secondary_dominants) {
            PrimaryApproach::Chromatic
        } else if modal
            .as_ref()
            .is_some_and(|m| !m.characteristics.is_empty() && functional.cadences.is_empty())
        {
            PrimaryApproach::Modal
        } else {
            PrimaryApproach::Functional
        };

        let confidence = match &modal {
            Some(m) => ((functional.confidence + m.confidence) / 2.0).min(1.0),
            None => functional.confidence,
        };

        let explanation = explain(primary_approach, &functional, modal.as_ref(), chromatic.as_ref());

        info!(approach = %primary_approach, confidence, "comprehensive analysis");

        Some(ComprehensiveAnalysis {
            functional,
            modal,
            modal_exclusion,
            chromatic,
            primary_approach,
            confidence,
            explanation,
        })
    }
}

fn explain(
    approach: PrimaryApproach,
    functional: &FunctionalAnalysis,
    modal: Option<&ModalAnalysis>,
    chromatic: Option<&ChromaticAnalysis>,
) -> String {
    let cadences = functional
        .cadences
        .iter()
        .map(|c| c.kind.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut text = match approach {
        PrimaryApproach::Chromatic => {
            let summary = chromatic
                .map(|c| {
                    format!(
                        "{} secondary dominant(s), {} borrowed chord(s), {} chromatic mediant(s)",
                        c.secondary_dominants, c.borrowed_chords, c.chromatic_mediants
                    )
                })
                .unwrap_or_default();
            format!("Chromatic harmony in {}: {}.", functional.key_name, summary)
        }
        PrimaryApproach::Modal => match modal {
            Some(m) => {
                let colour = m
                    .characteristics
                    .first()
                    .map(|c| format!(" {}.", c))
                    .unwrap_or_default();
                format!(
                    "Modal harmony: {} (parent key {}).{} No functional cadences support a {} reading.",
                    m.mode_name, m.parent_key_name, colour, functional.key_name
                )
            }
            None => format!("Modal harmony over {}.", functional.key_name),
        },
        PrimaryApproach::Functional => {
            let shape = if functional.progression_type.is_named() {
                format!("{} progression", functional.progression_type.label())
            } else {
                "tonal progression".to_string()
            };
            if cadences.is_empty() {
                format!("Functional harmony in {}: {}.", functional.key_name, shape)
            } else {
                format!(
                    "Functional harmony in {}: {} with {} cadence.",
                    functional.key_name, shape, cadences
                )
            }
        }
    };

    if approach != PrimaryApproach::Modal {
        if let Some(m) = modal {
            text.push_str(&format!(
                " A modal reading as {} is also plausible ({:.0}%).",
                m.mode_name,
                m.confidence * 100.0
            ));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functional::ProgressionType;

    fn run(symbols: &[&str], parent: Option<&str>) -> Option<ComprehensiveAnalysis> {
        let analyzer = ComprehensiveAnalyzer::new(AnalysisConfig::default());
        let progression = Progression::parse_lenient(symbols);
        analyzer.analyze(&progression, parent.map(|p| p.parse().unwrap()))
    }

    #[test]
    fn modal_progression_without_cadences_is_primary_modal() {
        let result = run(&["Em", "F", "Em"], Some("C major")).unwrap();
        let modal = result.modal.as_ref().unwrap();
        assert_eq!(modal.mode_name, "E Phrygian");
        assert!(result.functional.cadences.is_empty());
        assert_eq!(result.primary_approach, PrimaryApproach::Modal);
        assert!(result.explanation.starts_with("Modal harmony: E Phrygian"));
        let expected = (result.functional.confidence + modal.confidence) / 2.0;
        assert!((result.confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn minor_five_ending_stays_modal() {
        let result = run(&["C", "Bb", "C", "Gm"], Some("C major")).unwrap();
        assert_eq!(result.functional.roman_numerals, vec!["I", "bVII", "I", "v"]);
        assert!(result.functional.cadences.is_empty());
        assert_eq!(result.modal.as_ref().unwrap().mode_name, "C Mixolydian");
        assert_eq!(result.primary_approach, PrimaryApproach::Modal);
    }

    #[test]
    fn cadences_keep_functional_primary_with_modal_alternative() {
        let result = run(&["G", "F", "C", "G"], Some("C major")).unwrap();
        assert_eq!(result.modal.as_ref().unwrap().mode_name, "G Mixolydian");
        assert!(!result.functional.cadences.is_empty());
        assert_eq!(result.primary_approach, PrimaryApproach::Functional);
        assert!(result.explanation.contains("modal reading as G Mixolydian"));
    }

    #[test]
    fn authentic_cadence_is_functional() {
        let result = run(&["C", "G", "C"], None).unwrap();
        assert!(result.modal.is_none());
        assert!(result.modal_exclusion.unwrap().contains("functional"));
        assert_eq!(result.primary_approach, PrimaryApproach::Functional);
        assert_eq!(result.confidence, result.functional.confidence);
        assert!(result.explanation.contains("authentic"));
    }

    #[test]
    fn secondary_dominant_makes_chromatic_primary() {
        let result = run(&["C", "A7", "Dm", "G7", "C"], Some("C major")).unwrap();
        assert_eq!(result.primary_approach, PrimaryApproach::Chromatic);
        assert_eq!(result.chromatic.as_ref().unwrap().secondary_dominants, 1);
        assert!(result.explanation.starts_with("Chromatic harmony in C major"));
    }

    #[test]
    fn pop_progression_excludes_modal() {
        let result = run(&["Am", "F", "C", "G"], None).unwrap();
        assert!(result.modal.is_none());
        assert_eq!(result.functional.progression_type, ProgressionType::PopAxis);
        assert_eq!(result.primary_approach, PrimaryApproach::Functional);
    }

    #[test]
    fn no_data_gives_no_result() {
        assert!(run(&["C"], None).is_none());
        assert!(run(&["C", "C"], None).is_none());
        assert!(run(&[], None).is_none());
    }
}
