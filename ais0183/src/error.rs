use std::fmt;

use crate::normalizer::BufferSlot;

/// Recoverable conditions raised while normalizing and decoding NMEA lines.
///
/// None of these abort processing: the engine reports them through its error
/// handler and stays usable for subsequent lines. Each variant carries the
/// offending line plus whatever context is needed to diagnose it without
/// access to the engine's internal state.
#[derive(Debug, Clone, PartialEq)]
pub enum AisError {
    /// The sentence checksum did not match its trailer.
    InvalidChecksum { line: String },
    /// The checksum of a sentence synthesized from reassembled fragments did
    /// not validate. This indicates a construction bug, not bad input, so
    /// the synthesized sentence is still returned.
    InvalidChecksumInConstructed { line: String },
    /// A multiline fragment carried no resolvable receive station.
    NoStationFound { line: String },
    /// The sentence had fewer comma-separated fields than an AIS sentence
    /// can have.
    TooFewFields { line: String, fields: usize },
    /// No usable timestamp on either the sentence fields or the tag block.
    MissingTimestamps { line: String, parts: Vec<String> },
    /// Fragment timestamps of one message spread beyond the allowed window.
    DifferingTimestamps {
        line: String,
        timestamp: String,
        parts: Vec<String>,
    },
    /// A final fragment arrived with no preceding fragments buffered.
    OnlyMessageEnd { line: String, slot: BufferSlot },
    /// The external bit-level payload decoder failed.
    Decode {
        line: String,
        error_type: String,
        error: String,
    },
}

impl fmt::Display for AisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AisError::InvalidChecksum { line } => {
                write!(f, "Invalid checksum: {line}")
            }
            AisError::InvalidChecksumInConstructed { line } => {
                write!(f, "Invalid checksum in constructed one-liner: {line}")
            }
            AisError::NoStationFound { line } => {
                write!(f, "No station found: {line}")
            }
            AisError::TooFewFields { line, fields } => {
                write!(f, "Too few fields, got {fields} but needed 6: {line}")
            }
            AisError::MissingTimestamps { line, parts } => {
                write!(f, "Timestamps missing: {line}, parts: {parts:?}")
            }
            AisError::DifferingTimestamps {
                line,
                timestamp,
                parts,
            } => {
                write!(
                    f,
                    "Timestamps not all the same for {timestamp}: {line}, parts: {parts:?}"
                )
            }
            AisError::OnlyMessageEnd { line, slot } => {
                write!(f, "Do not have the preceding packets for {slot:?}: {line}")
            }
            AisError::Decode {
                line,
                error_type,
                error,
            } => {
                write!(f, "Error while decoding AIS: {error_type}: {error} (origin: {line})")
            }
        }
    }
}

impl std::error::Error for AisError {}
