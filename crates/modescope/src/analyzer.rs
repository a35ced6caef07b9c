use modeconf::AnalysisConfig;

use crate::chord::Progression;
use crate::functional::{analyze_functional, FunctionalAnalysis};
use crate::key::KeySignature;
use crate::modal::{analyze_modal, ModalOutcome};

/// Trait for harmonic analysis backends.
///
/// `HeuristicAnalyzer` runs the rule tables in this crate. Both methods
/// read the same immutable progression and can run in either order or
/// concurrently.
pub trait HarmonyAnalyzer: Send + Sync {
    fn analyze_modal(&self, progression: &Progression, parent_key: Option<KeySignature>) -> ModalOutcome;

    fn analyze_functional(
        &self,
        progression: &Progression,
        parent_key: Option<KeySignature>,
    ) -> Option<FunctionalAnalysis>;
}

/// Rule-based analyzer: weighted tonic vote, pattern tables, evidence
/// scoring and the mode cascade.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAnalyzer {
    config: AnalysisConfig,
}

impl HeuristicAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

impl HarmonyAnalyzer for HeuristicAnalyzer {
    fn analyze_modal(&self, progression: &Progression, parent_key: Option<KeySignature>) -> ModalOutcome {
        analyze_modal(progression, parent_key, &self.config)
    }

    fn analyze_functional(
        &self,
        progression: &Progression,
        parent_key: Option<KeySignature>,
    ) -> Option<FunctionalAnalysis> {
        analyze_functional(progression, parent_key, &self.config)
    }
}
