use thiserror::Error;

/// Failure to read a chord symbol such as `"Bbm7"`.
///
/// Scoped to a single chord: callers decide whether one bad token aborts
/// the whole progression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChordParseError {
    #[error("empty chord symbol")]
    Empty,

    #[error("chord symbol '{symbol}' does not start with a root letter A-G")]
    MissingRoot { symbol: String },

    #[error("unknown root note '{root}' in chord symbol '{symbol}'")]
    UnknownRoot { symbol: String, root: String },
}

/// Failure to read a parent key such as `"Bb major"` or `"f# minor"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("empty key")]
    Empty,

    #[error("key '{0}' does not start with a note letter A-G")]
    MissingRoot(String),

    #[error("unknown key root '{0}'")]
    UnknownRoot(String),

    #[error("unknown key quality '{quality}' (expected major, minor, maj, min or m)")]
    UnknownQuality { quality: String },
}

/// Failure to read a Roman numeral token such as `"bVII"` or `"V7/ii"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid Roman numeral '{token}': {reason}")]
pub struct NumeralParseError {
    pub token: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Chord(#[from] ChordParseError),

    #[error(transparent)]
    Key(#[from] KeyParseError),

    #[error(transparent)]
    Numeral(#[from] NumeralParseError),
}
