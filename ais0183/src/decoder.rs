use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AisError;
use crate::normalizer::{Normalizer, NormalizerConfig};

/// Failure reported by a bit-level payload decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeFailure {
    /// Short failure class, e.g. `"AisDecodeError"`
    pub kind: String,
    pub message: String,
}

/// Bit-level AIS payload decoder.
///
/// The 6-bit armoring and the per-message-type field layouts are outside
/// this crate; implement this trait over whichever decoder is in use and
/// return the decoded fields as a JSON object.
pub trait PayloadDecoder {
    fn decode_payload(&self, body: &str, fill_bits: u32) -> Result<Map<String, Value>, DecodeFailure>;
}

impl<F> PayloadDecoder for F
where
    F: Fn(&str, u32) -> Result<Map<String, Value>, DecodeFailure>,
{
    fn decode_payload(&self, body: &str, fill_bits: u32) -> Result<Map<String, Value>, DecodeFailure> {
        self(body, fill_bits)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DecoderConfig {
    /// Attach the original NMEA line(s) to the output under an `"nmea"` key
    pub keep_nmea: bool,
    pub normalizer: NormalizerConfig,
}

/// Line-by-line AIS decoder: reassembly plus bit-level decoding.
///
/// Wraps a [`Normalizer`] and hands every completed sentence to the supplied
/// [`PayloadDecoder`]. Decode failures are reported through the normalizer's
/// error handler and swallowed; the engine stays usable for the next line.
pub struct Decoder<D: PayloadDecoder> {
    normalizer: Normalizer,
    payload_decoder: D,
    keep_nmea: bool,
}

impl<D: PayloadDecoder> Decoder<D> {
    /// Create a decoder whose errors are logged via `tracing::error!`.
    pub fn new(config: DecoderConfig, payload_decoder: D) -> Self {
        Self {
            normalizer: Normalizer::new(config.normalizer),
            payload_decoder,
            keep_nmea: config.keep_nmea,
        }
    }

    /// Create a decoder with a custom error sink, shared with the inner
    /// normalizer.
    pub fn with_error_handler<F>(config: DecoderConfig, payload_decoder: D, handler: F) -> Self
    where
        F: FnMut(AisError) + 'static,
    {
        Self {
            normalizer: Normalizer::with_error_handler(config.normalizer, handler),
            payload_decoder,
            keep_nmea: config.keep_nmea,
        }
    }

    /// Decode a single NMEA line.
    ///
    /// Returns a JSON object holding the decoded AIS fields plus any tag
    /// block keys (and the original line(s) under `"nmea"` when `keep_nmea`
    /// is set) once a line completes a message, `None` otherwise.
    pub fn decode(&mut self, line: &str) -> Option<Map<String, Value>> {
        let normalized = self.normalizer.process(line)?;

        // Payload is the 6th comma field, fill bits the digit before the
        // checksum. Pass-through lines may not have either; that is reported
        // as a decode condition rather than crashing.
        let body = normalized.sentence.split(',').nth(5);
        let fill_bits = normalized
            .sentence
            .split('*')
            .next()
            .and_then(|head| head.chars().last())
            .and_then(|c| c.to_digit(10));
        let (Some(body), Some(fill_bits)) = (body, fill_bits) else {
            self.normalizer.report_err(AisError::Decode {
                line: normalized.origin.trim().to_string(),
                error_type: "MalformedSentence".to_string(),
                error: "no payload or fill bits field".to_string(),
            });
            return None;
        };

        let mut record = match self.payload_decoder.decode_payload(body, fill_bits) {
            Ok(record) => record,
            Err(failure) => {
                self.normalizer.report_err(AisError::Decode {
                    line: normalized.origin.trim().to_string(),
                    error_type: failure.kind,
                    error: failure.message,
                });
                return None;
            }
        };

        for (key, value) in &normalized.tagblock {
            record.insert(key.clone(), Value::String(value.clone()));
        }
        if self.keep_nmea {
            record.insert("nmea".to_string(), Value::String(normalized.origin));
        }
        Some(record)
    }
}
