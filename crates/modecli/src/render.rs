//! Human-readable output.

use modescope::{
    ComprehensiveAnalysis, Evidence, FunctionalAnalysis, ModalAnalysis, ModalOutcome, NoDataReason, Progression,
    RegionClassification,
};
use owo_colors::OwoColorize;

use crate::commands::SuggestReport;

/// Colors only when writing to a terminal.
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().bright_cyan().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn accent(&self, text: &str) -> String {
        if self.color {
            text.bright_green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn warn(&self, text: &str) -> String {
        if self.color {
            text.bright_yellow().to_string()
        } else {
            text.to_string()
        }
    }
}

fn percent(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

fn field(palette: &Palette, label: &str, value: impl std::fmt::Display) {
    println!("{} {}", palette.dim(&format!("{:<16}", format!("{}:", label))), value);
}

fn list(palette: &Palette, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}", palette.heading(title));
    for item in items {
        println!("  - {}", item);
    }
}

fn evidence_lines(evidence: &[Evidence]) -> Vec<String> {
    evidence
        .iter()
        .map(|e| format!("[{} {:.2}] {}", e.kind, e.strength, e.description))
        .collect()
}

/// Written to stderr alongside the logs.
pub fn skipped(progression: &Progression, palette: &Palette) {
    for skip in progression.skipped() {
        eprintln!(
            "{}",
            palette.warn(&format!("Skipped chord {} '{}': {}", skip.index + 1, skip.token, skip.error))
        );
    }
}

pub fn no_data(reason: &NoDataReason, palette: &Palette) {
    println!("{} {}", palette.warn("No result:"), reason);
}

pub fn modal_outcome(outcome: &ModalOutcome, palette: &Palette) {
    match outcome {
        ModalOutcome::Found(analysis) => modal(analysis, palette),
        ModalOutcome::BelowThreshold {
            best_confidence,
            best_mode,
            foil,
        } => {
            println!(
                "{} best reading {} at {}",
                palette.warn("No confident modal reading:"),
                best_mode,
                percent(*best_confidence)
            );
            if let Some(foil) = foil {
                field(palette, "Foil", foil);
            }
        }
        ModalOutcome::RejectedFunctional { reason, .. } => {
            println!("{} {}", palette.warn("Not modal:"), reason);
        }
        ModalOutcome::NoData { reason } => no_data(reason, palette),
    }
}

pub fn modal(analysis: &ModalAnalysis, palette: &Palette) {
    let source = if analysis.parent_key_supplied { "supplied" } else { "inferred" };
    field(palette, "Mode", palette.accent(&analysis.mode_name));
    field(palette, "Parent key", format!("{} ({})", analysis.parent_key_name, source));
    field(palette, "Numerals", analysis.roman_numerals.join("  "));
    field(palette, "Confidence", percent(analysis.confidence));
    field(palette, "Decided by", analysis.mode_rule);
    list(palette, "Characteristics", &analysis.characteristics);
    list(palette, "Evidence", &evidence_lines(&analysis.evidence));
}

pub fn functional(analysis: &FunctionalAnalysis, palette: &Palette) {
    let source = if analysis.key_supplied { "supplied" } else { "inferred" };
    field(palette, "Key", format!("{} ({})", palette.accent(&analysis.key_name), source));
    field(palette, "Numerals", analysis.roman_numerals.join("  "));
    field(palette, "Progression", analysis.progression_type.label());
    field(palette, "Diatonic", percent(analysis.diatonic_ratio));
    field(palette, "Confidence", percent(analysis.confidence));
    let cadences: Vec<String> = analysis.cadences.iter().map(|c| c.description.clone()).collect();
    list(palette, "Cadences", &cadences);
    let chromatic: Vec<String> = analysis
        .chromatic_elements
        .iter()
        .map(|e| e.description.clone())
        .collect();
    list(palette, "Chromatic", &chromatic);
}

pub fn comprehensive(result: &ComprehensiveAnalysis, palette: &Palette) {
    field(palette, "Primary", palette.accent(&result.primary_approach.to_string()));
    field(palette, "Confidence", percent(result.confidence));
    println!("{}", result.explanation);

    println!();
    println!("{}", palette.heading("Functional"));
    functional(&result.functional, palette);

    println!();
    println!("{}", palette.heading("Modal"));
    match (&result.modal, &result.modal_exclusion) {
        (Some(modal_analysis), _) => modal(modal_analysis, palette),
        (None, Some(why)) => println!("{} {}", palette.dim("not included:"), why),
        (None, None) => println!("{}", palette.dim("not included")),
    }

    if let Some(chromatic) = &result.chromatic {
        println!();
        println!("{}", palette.heading("Chromatic"));
        field(palette, "Secondary dom.", chromatic.secondary_dominants);
        field(palette, "Borrowed", chromatic.borrowed_chords);
        field(palette, "Mediants", chromatic.chromatic_mediants);
        field(palette, "Confidence", percent(chromatic.confidence));
    }
}

pub fn suggestions(report: &SuggestReport, palette: &Palette) {
    if let Some(estimate) = &report.key_estimate {
        field(
            palette,
            "Key estimate",
            format!("{} ({})", palette.accent(&estimate.key.to_string()), percent(estimate.confidence)),
        );
    }

    if report.suggestions.is_empty() {
        println!("{}", palette.warn("Need at least 3 distinct pitch classes to suggest modes"));
        return;
    }

    for (rank, s) in report.suggestions.iter().enumerate() {
        println!(
            "{:>2}. {} {} {}",
            rank + 1,
            palette.accent(&format!("{:<16}", s.name)),
            percent(s.score),
            palette.dim(&format!("(parent {})", s.parent_key_name))
        );
        if !s.missing.is_empty() {
            println!("    missing: {}", s.missing.join(" "));
        }
        if !s.outside.is_empty() {
            println!("    outside: {}", s.outside.join(" "));
        }
    }
}

pub fn region(region: &RegionClassification, palette: &Palette) {
    field(palette, "Region", palette.accent(&region.region_type.to_string()));
    field(palette, "Confidence", percent(region.confidence));
    field(palette, "Global key", &region.global_key_name);
    field(
        palette,
        "Local key",
        format!("{} ({})", region.local_key_name, percent(region.local_key_confidence)),
    );
    if region.cadence.detected {
        field(palette, "Cadence", format!("tonic and dominant, {}", percent(region.cadence.strength)));
    }
    if !region.borrowed.is_empty() {
        field(palette, "Borrowed", region.borrowed.join(" "));
    }
}
