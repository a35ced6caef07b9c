use anyhow::{Context, Result};
use modeconf::{ConfigSources, ModeConfig};
use modescope::notes::parse_note;
use modescope::suggest::estimate_key_from_notes;
use modescope::{
    analyze_functional, analyze_modal, classify_local_region, parse_parent_key, suggest_modes,
    ComprehensiveAnalyzer, KeyEstimate, KeySignature, ModeSuggestion, NoDataReason, Progression,
};
use serde::Serialize;
use tracing::info;

use crate::render::{self, Palette};
use crate::View;

/// JSON envelope for readings that can come back empty.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Report<T> {
    Found(T),
    NoData { reason: NoDataReason },
}

#[derive(Debug, Serialize)]
pub struct SuggestReport {
    pub key_estimate: Option<KeyEstimate>,
    pub suggestions: Vec<ModeSuggestion>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing result")?;
    println!("{}", text);
    Ok(())
}

fn no_data_reason(progression: &Progression) -> NoDataReason {
    progression.check().err().unwrap_or(NoDataReason::TooFewValidChords {
        valid: progression.chords().len(),
    })
}

pub fn analyze(
    config: &ModeConfig,
    input: &str,
    key: Option<&str>,
    view: View,
    json: bool,
    palette: &Palette,
) -> Result<()> {
    let parent = parse_parent_key(key).with_context(|| format!("parsing parent key '{}'", key.unwrap_or_default()))?;
    let progression = Progression::from_input(input);
    info!(chords = progression.chords().len(), skipped = progression.skipped().len(), ?view, "analyzing");

    if !json {
        render::skipped(&progression, palette);
    }

    match view {
        View::Modal => {
            let outcome = analyze_modal(&progression, parent, &config.analysis);
            if json {
                print_json(&outcome)
            } else {
                render::modal_outcome(&outcome, palette);
                Ok(())
            }
        }
        View::Functional => match analyze_functional(&progression, parent, &config.analysis) {
            Some(analysis) if json => print_json(&Report::Found(analysis)),
            Some(analysis) => {
                render::functional(&analysis, palette);
                Ok(())
            }
            None => no_data(&progression, json, palette),
        },
        View::Comprehensive => {
            let analyzer = ComprehensiveAnalyzer::new(config.analysis.clone());
            match analyzer.analyze(&progression, parent) {
                Some(result) if json => print_json(&Report::Found(result)),
                Some(result) => {
                    render::comprehensive(&result, palette);
                    Ok(())
                }
                None => no_data(&progression, json, palette),
            }
        }
    }
}

fn no_data(progression: &Progression, json: bool, palette: &Palette) -> Result<()> {
    let reason = no_data_reason(progression);
    if json {
        print_json(&Report::<()>::NoData { reason })
    } else {
        render::no_data(&reason, palette);
        Ok(())
    }
}

fn parse_notes(notes: &[String]) -> Result<Vec<u8>> {
    notes
        .iter()
        .map(|n| parse_note(n).with_context(|| format!("'{}' is not a note name or MIDI number", n)))
        .collect()
}

pub fn suggest(notes: &[String], tonic: Option<&str>, top: usize, json: bool, palette: &Palette) -> Result<()> {
    let pitch_classes = parse_notes(notes)?;

    let hint = tonic
        .map(|t| parse_note(t).with_context(|| format!("tonic '{}' is not a note name or MIDI number", t)))
        .transpose()?;

    let report = SuggestReport {
        key_estimate: estimate_key_from_notes(&pitch_classes),
        suggestions: suggest_modes(&pitch_classes, hint, top),
    };

    if json {
        print_json(&report)
    } else {
        render::suggestions(&report, palette);
        Ok(())
    }
}

pub fn region(notes: &[String], key: &str, json: bool, palette: &Palette) -> Result<()> {
    let global: KeySignature = key.parse().with_context(|| format!("parsing key '{}'", key))?;
    let pitch_classes = parse_notes(notes)?;
    let region = classify_local_region(global, &pitch_classes).context("no notes to classify")?;
    info!(region = %region.region_type, local = %region.local_key_name, "classified passage");

    if json {
        print_json(&region)
    } else {
        render::region(&region, palette);
        Ok(())
    }
}

pub fn show_config(config: &ModeConfig, sources: &ConfigSources, palette: &Palette) {
    if sources.files.is_empty() {
        println!("{}", palette.dim("# no config files found, using defaults"));
    }
    for file in &sources.files {
        println!("{}", palette.dim(&format!("# file: {}", file.display())));
    }
    for var in &sources.env_overrides {
        println!("{}", palette.dim(&format!("# env: {}", var)));
    }
    println!();
    print!("{}", config.to_toml());
}
