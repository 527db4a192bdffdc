//! AIS over NMEA 0183 Library
//!
//! This library turns a raw stream of NMEA 0183 text lines into complete,
//! checksum-valid AIS sentences ready for bit-level decoding:
//! - NMEA XOR checksum validation and computation
//! - NMEA 4.10 tag block parsing (station, timestamp, grouping metadata)
//! - Stateful multiline reassembly with per-stream buffering
//! - A decode adapter seam for plugging in a bit-level payload decoder
//!
//! # Features
//!
//! - **Multiline Assembly**: Fragments of up to 9 sentences are correlated
//!   by station, sequence id and radio channel, and merged into a single
//!   synthesized sentence with a fresh checksum
//! - **Temporal Consistency**: Fragment timestamps must agree within a
//!   configurable window before a message is accepted
//! - **Permissive Pass-Through**: Non-AIS sentences are forwarded unchanged
//! - **Recoverable Errors**: Every condition is reported to an injectable
//!   handler; processing never stops on bad input
//!
//! # Example
//!
//! ```no_run
//! use ais0183::{Normalizer, NormalizerConfig};
//!
//! let mut normalizer = Normalizer::new(NormalizerConfig::default());
//!
//! for line in std::io::stdin().lines() {
//!     let line = line.unwrap();
//!     if let Some(msg) = normalizer.process(&format!("{line}\n")) {
//!         print!("{}", msg.sentence);
//!     }
//! }
//! ```

pub mod checksum;
pub mod decoder;
pub mod error;
pub mod normalizer;
pub mod tagblock;

// Re-export commonly used types
pub use checksum::{checksum, checksum_str, is_checksum_valid};
pub use decoder::{DecodeFailure, Decoder, DecoderConfig, PayloadDecoder};
pub use error::AisError;
pub use normalizer::{BufferSlot, NormalizedSentence, Normalizer, NormalizerConfig};
pub use tagblock::TagBlock;
