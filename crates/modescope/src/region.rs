//! Compare a local passage against the key of the whole piece.
//!
//! A passage is either in the global key, a modulation (a new key with a
//! tonic-dominant cadence behind it) or a modal shift that borrows tones
//! without settling anywhere new.

use serde::Serialize;
use tracing::debug;

use crate::key::{KeyEstimate, KeySignature};
use crate::modes::Mode;
use crate::notes::note_name;
use crate::suggest::{estimate_key_from_notes, histogram};
use crate::types::PitchClass;

const STABLE_CONFIDENCE: f64 = 0.95;
const MODULATION_KEY_CONFIDENCE: f64 = 0.8;
const MODULATION_CADENCE_STRENGTH: f64 = 0.6;
const BORROWED_TONE_PENALTY: f64 = 0.15;
const MODAL_SHIFT_FLOOR: f64 = 0.5;
/// Tonic plus dominant share of the histogram is scaled up by this much.
const CADENCE_SCALE: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionType {
    Stable,
    Modulation,
    ModalShift,
}

impl std::fmt::Display for RegionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionType::Stable => write!(f, "stable"),
            RegionType::Modulation => write!(f, "modulation"),
            RegionType::ModalShift => write!(f, "modal shift"),
        }
    }
}

/// Whether tonic and dominant dominate a pitch-class histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CadenceSupport {
    pub detected: bool,
    pub strength: f64,
}

impl CadenceSupport {
    pub const NONE: CadenceSupport = CadenceSupport {
        detected: false,
        strength: 0.0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionClassification {
    pub global_key: KeySignature,
    pub global_key_name: String,
    pub local_key: KeySignature,
    pub local_key_name: String,
    pub local_key_confidence: f64,
    pub cadence: CadenceSupport,
    pub region_type: RegionType,
    pub confidence: f64,
    /// Local scale tones absent from the global scale, spelled for the local key.
    pub borrowed: Vec<String>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pitch classes of the key's scale; minor keys use the natural minor.
pub fn scale_of(key: KeySignature) -> Vec<PitchClass> {
    let mode = if key.is_minor { Mode::Aeolian } else { Mode::Ionian };
    mode.intervals().iter().map(|i| (key.tonic + i) % 12).collect()
}

/// Tonic and dominant both among the three strongest bins counts as a
/// cadence; strength is their scaled share of the total, at most 1.0.
pub fn cadence_support(bins: &[f64; 12], key: KeySignature) -> CadenceSupport {
    let total: f64 = bins.iter().sum();
    if total <= 0.0 {
        return CadenceSupport::NONE;
    }

    let tonic = key.tonic as usize;
    let dominant = (tonic + 7) % 12;

    let mut order: Vec<usize> = (0..12).collect();
    order.sort_by(|&a, &b| bins[b].total_cmp(&bins[a]).then(a.cmp(&b)));
    let top = &order[..3];

    if top.contains(&tonic) && top.contains(&dominant) {
        CadenceSupport {
            detected: true,
            strength: round2((bins[tonic] + bins[dominant]) / total * CADENCE_SCALE).min(1.0),
        }
    } else {
        CadenceSupport::NONE
    }
}

/// Label a local key estimate against the global key.
pub fn classify_region(global: KeySignature, local: &KeyEstimate, cadence: CadenceSupport) -> RegionClassification {
    let (region_type, confidence, borrowed) = if global == local.key {
        (RegionType::Stable, STABLE_CONFIDENCE, Vec::new())
    } else {
        let global_scale = scale_of(global);
        let flats = local.key.prefers_flats();
        let mut borrowed_pcs: Vec<PitchClass> = scale_of(local.key)
            .into_iter()
            .filter(|pc| !global_scale.contains(pc))
            .collect();
        borrowed_pcs.sort_unstable();
        let borrowed: Vec<String> = borrowed_pcs.iter().map(|&pc| note_name(pc, flats).to_string()).collect();

        let modulation = local.confidence > MODULATION_KEY_CONFIDENCE
            && cadence.detected
            && cadence.strength > MODULATION_CADENCE_STRENGTH;

        if modulation {
            let confidence = round2(local.confidence * 0.5 + cadence.strength * 0.5);
            (RegionType::Modulation, confidence, borrowed)
        } else {
            let penalty = borrowed.len() as f64 * BORROWED_TONE_PENALTY;
            let confidence = round2((1.0 - penalty).max(MODAL_SHIFT_FLOOR));
            (RegionType::ModalShift, confidence, borrowed)
        }
    };

    debug!(%global, local = %local.key, %region_type, confidence, "classified region");

    RegionClassification {
        global_key: global,
        global_key_name: global.to_string(),
        local_key: local.key,
        local_key_name: local.key.to_string(),
        local_key_confidence: local.confidence,
        cadence,
        region_type,
        confidence,
        borrowed,
    }
}

/// Estimate the key of `local_notes` and classify it against `global`.
///
/// Returns `None` when there are no notes.
pub fn classify_local_region(global: KeySignature, local_notes: &[u8]) -> Option<RegionClassification> {
    let local = estimate_key_from_notes(local_notes)?;
    let cadence = cadence_support(&histogram(local_notes), local.key);
    Some(classify_region(global, &local, cadence))
}

/// Estimate both keys from notes, then classify the local passage.
pub fn compare_regions(global_notes: &[u8], local_notes: &[u8]) -> Option<RegionClassification> {
    let global = estimate_key_from_notes(global_notes)?;
    classify_local_region(global.key, local_notes)
}
