//! Note names and the note → pitch-class table.

use crate::types::PitchClass;

const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Black-key pitch classes conventionally spelled with flats when no
/// other spelling context is available.
pub static FLAT_DEFAULT_ROOTS: [u8; 5] = [1, 3, 6, 8, 10];

/// Every accepted root spelling, including the enharmonic aliases
/// B#=C, Cb=B, E#=F, Fb=E.
static NOTE_TABLE: [(&str, PitchClass); 21] = [
    ("C", 0),
    ("B#", 0),
    ("C#", 1),
    ("Db", 1),
    ("D", 2),
    ("D#", 3),
    ("Eb", 3),
    ("E", 4),
    ("Fb", 4),
    ("E#", 5),
    ("F", 5),
    ("F#", 6),
    ("Gb", 6),
    ("G", 7),
    ("G#", 8),
    ("Ab", 8),
    ("A", 9),
    ("A#", 10),
    ("Bb", 10),
    ("B", 11),
    ("Cb", 11),
];

pub fn note_name(pitch_class: PitchClass, use_flats: bool) -> &'static str {
    let idx = (pitch_class % 12) as usize;
    if use_flats {
        NOTE_NAMES_FLAT[idx]
    } else {
        NOTE_NAMES_SHARP[idx]
    }
}

/// Name with no key context: naturals as-is, black keys as flats.
pub fn default_name(pitch_class: PitchClass) -> &'static str {
    note_name(pitch_class, FLAT_DEFAULT_ROOTS.contains(&(pitch_class % 12)))
}

/// Look up a spelled root (`"F#"`, `"Bb"`, `"E#"`). The letter must be
/// uppercase; `♯`/`♭` are accepted as `#`/`b`.
pub fn pitch_class(name: &str) -> Option<PitchClass> {
    let normalized: String = name
        .chars()
        .map(|c| match c {
            '♯' => '#',
            '♭' => 'b',
            other => other,
        })
        .collect();

    NOTE_TABLE
        .iter()
        .find(|(spelling, _)| *spelling == normalized)
        .map(|&(_, pc)| pc)
}

/// Parse a note given either as a name (`"Eb"`, case-insensitive letter)
/// or as a MIDI note number (`"63"`, 0 to 127), returning its pitch class.
pub fn parse_note(token: &str) -> Option<PitchClass> {
    let token = token.trim();
    if let Ok(midi) = token.parse::<u8>() {
        return (midi <= 127).then_some(midi % 12);
    }

    let mut chars = token.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let mut spelled = String::new();
    spelled.push(letter);
    spelled.extend(chars);
    pitch_class(&spelled)
}
