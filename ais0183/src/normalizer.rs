use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checksum::{checksum_str, is_checksum_valid};
use crate::error::AisError;
use crate::tagblock::{self, TagBlock};

/// Options controlling multiline reassembly.
///
/// The defaults match a strict receiver: checksums are enforced, fragments
/// must carry a resolvable station and numeric timestamps, and radio
/// channels A/B are kept as distinct streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Verify the NMEA checksum before processing a line
    pub validate_checksum: bool,
    /// Accept fragments with no resolvable station, under an "UNKNOWN" identity
    pub allow_unknown: bool,
    /// Maximum timestamp skew, in seconds, across fragments of one message
    pub window: f64,
    /// Do not consult the tag block station when resolving identity
    pub ignore_tagblock_station: bool,
    /// Fold radio channels A and B into one stream
    pub treat_ab_equal: bool,
    /// Keep processing lines whose checksum failed instead of dropping them
    pub pass_invalid_checksums: bool,
    /// Tolerate fragments without usable timestamps
    pub allow_missing_timestamps: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            validate_checksum: true,
            allow_unknown: false,
            window: 2.0,
            ignore_tagblock_station: false,
            treat_ab_equal: false,
            pass_invalid_checksums: false,
            allow_missing_timestamps: false,
        }
    }
}

/// Identity under which in-flight fragments of one multiline message are
/// grouped. Two fragments belong to the same logical message iff their slots
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferSlot {
    tagblock_station: Option<String>,
    station: Option<String>,
    sequence: String,
    /// `None` when channels A/B are folded into one stream
    channel: Option<String>,
}

/// One buffered fragment, owned by its slot until reassembly.
struct Packet {
    payload: String,
    timestamp: String,
    tagblock: TagBlock,
    origline: String,
}

/// A complete sentence ready for bit-level decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSentence {
    /// Tag block metadata, merged across fragments (earliest fragment wins)
    pub tagblock: TagBlock,
    /// Single checksum-valid sentence, newline-terminated
    pub sentence: String,
    /// Original line(s) as passed in, concatenated in arrival order
    pub origin: String,
}

/// Stateful engine that assembles single or multiline AIS messages.
///
/// Feed it one raw NMEA line at a time; it returns a [`NormalizedSentence`]
/// once a line completes a message, `None` otherwise. Partial messages are
/// kept in per-stream buffers owned by this instance, so independent engines
/// (e.g. one per connection) do not share state.
///
/// Recoverable conditions are reported to the configured error handler and
/// never poison the engine; the default handler logs through `tracing`.
pub struct Normalizer {
    config: NormalizerConfig,
    buffers: HashMap<BufferSlot, Vec<Packet>>,
    handle_err: Box<dyn FnMut(AisError)>,
}

impl Normalizer {
    /// Create a normalizer whose errors are logged via `tracing::error!`.
    pub fn new(config: NormalizerConfig) -> Self {
        Self::with_error_handler(config, |err| tracing::error!("{err}"))
    }

    /// Create a normalizer with a custom error sink.
    pub fn with_error_handler<F>(config: NormalizerConfig, handler: F) -> Self
    where
        F: FnMut(AisError) + 'static,
    {
        Self {
            config,
            buffers: HashMap::new(),
            handle_err: Box::new(handler),
        }
    }

    /// Number of multiline messages currently awaiting completion.
    pub fn pending(&self) -> usize {
        self.buffers.len()
    }

    pub(crate) fn report_err(&mut self, err: AisError) {
        (self.handle_err)(err);
    }

    /// Process a single NMEA line.
    ///
    /// Returns the completed message when this line finishes one: either the
    /// line itself (single-fragment fast path and non-AIS pass-through) or a
    /// freshly synthesized sentence carrying the concatenated payload of all
    /// fragments. Returns `None` while a multiline message is incomplete or
    /// when the line is dropped with a reported error.
    pub fn process(&mut self, origline: &str) -> Option<NormalizedSentence> {
        let (tagblock, rest) = tagblock::parse(origline);
        // Get rid of DOS line endings
        let line = format!("{}\n", rest.trim());

        // Anything that does not look like an AIS sentence is forwarded
        // unchanged, without checksum or field validation
        if line.len() < 7 || !matches!(line.get(3..6), Some("VDM") | Some("VDO")) {
            return Some(NormalizedSentence {
                tagblock,
                sentence: line,
                origin: origline.to_string(),
            });
        }

        if self.config.validate_checksum && !is_checksum_valid(&line) {
            self.report_err(AisError::InvalidChecksum {
                line: line.trim().to_string(),
            });
            if !self.config.pass_invalid_checksums {
                return None;
            }
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 6 {
            self.report_err(AisError::TooFewFields {
                line: line.trim().to_string(),
                fields: fields.len(),
            });
            return None;
        }

        // Total NMEA lines that compose this message, 1..9
        let Ok(total_sentences) = fields[1].trim().parse::<u32>() else {
            debug!("unparsable fragment count, dropping: {}", line.trim());
            return None;
        };
        if total_sentences == 1 {
            // A single line needs no work, pass it along
            return Some(NormalizedSentence {
                tagblock,
                sentence: line,
                origin: origline.to_string(),
            });
        }

        let Ok(sentence_num) = fields[2].trim().parse::<u32>() else {
            debug!("unparsable fragment index, dropping: {}", line.trim());
            return None;
        };
        let payload = fields[5].to_string();
        // Epoch UTC when present, always the last field
        let timestamp = fields.last().map_or("", |f| f.trim()).to_string();

        // Receive station: first trailing field starting with 'r' or 'b'
        let mut station: Option<String> = None;
        for fld in fields.iter().skip(6).rev() {
            if fld.starts_with('r') || fld.starts_with('b') {
                station = Some(fld.trim().to_string());
                break;
            }
        }

        let tagblock_station = if self.config.ignore_tagblock_station {
            None
        } else {
            tagblock.get("tagblock_station").cloned()
        };

        if station.is_none() && self.config.allow_unknown {
            station = Some("UNKNOWN".to_string());
        }
        if station.is_none() && tagblock_station.is_none() {
            self.report_err(AisError::NoStationFound {
                line: line.trim().to_string(),
            });
            return None;
        }

        // Sequence id and channel make a unique stream
        let slot = BufferSlot {
            tagblock_station,
            station,
            sequence: fields[3].to_string(),
            channel: if self.config.treat_ab_equal {
                None
            } else {
                Some(fields[4].to_string())
            },
        };

        let packet = Packet {
            payload,
            timestamp: timestamp.clone(),
            tagblock: tagblock.clone(),
            origline: origline.to_string(),
        };

        if sentence_num == 1 {
            // Overwrite any partials: the receiver restarted this message
            self.buffers.insert(slot, vec![packet]);
            return None;
        }

        if total_sentences > sentence_num {
            self.buffers.entry(slot).or_default().push(packet);
            return None;
        }

        // Final fragment: take the whole buffered sequence
        let Some(mut parts) = self.buffers.remove(&slot) else {
            self.report_err(AisError::OnlyMessageEnd {
                line: line.trim().to_string(),
                slot,
            });
            return None;
        };
        parts.push(packet);

        // Sanity check: every fragment must sit within the allowed window of
        // the final fragment's timestamp. Plain sentence timestamps are
        // preferred, with the tag block timestamp as fallback for both sides.
        let final_ts = timestamp.parse::<f64>();
        let final_tagblock_ts = tagblock
            .get("tagblock_timestamp")
            .and_then(|v| v.parse::<f64>().ok());
        let mut ts1 = 0f64;
        for part in &parts {
            let ts2;
            match (part.timestamp.parse::<f64>(), &final_ts) {
                (Ok(a), Ok(b)) => {
                    ts1 = a;
                    ts2 = *b;
                }
                _ => {
                    let part_tagblock_ts = part
                        .tagblock
                        .get("tagblock_timestamp")
                        .and_then(|v| v.parse::<f64>().ok());
                    match (part_tagblock_ts, final_tagblock_ts) {
                        (Some(a), Some(b)) => {
                            ts1 = a;
                            ts2 = b;
                        }
                        _ if self.config.allow_missing_timestamps => {
                            ts1 = 0.0;
                            ts2 = 0.0;
                        }
                        _ => {
                            self.report_err(AisError::MissingTimestamps {
                                line: line.trim().to_string(),
                                parts: origins(&parts),
                            });
                            return None;
                        }
                    }
                }
            }
            if ts1 > ts2 + self.config.window || ts1 < ts2 - self.config.window {
                self.report_err(AisError::DifferingTimestamps {
                    line: line.trim().to_string(),
                    timestamp: timestamp.clone(),
                    parts: origins(&parts),
                });
                return None;
            }
        }

        let full_payload: String = parts.iter().map(|p| p.payload.as_str()).collect();

        // Merge tag blocks so that earlier fragments' keys are never
        // overwritten by later ones
        let mut merged = TagBlock::new();
        for part in &parts {
            for (key, value) in &part.tagblock {
                merged
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }

        // Mirror the final fragment as much as possible: same talker,
        // sequence id and channel, fragment count forced to 1,1
        let fill_field = fields
            .get(6)
            .map(|f| f.split_once('*').map_or(*f, |(head, _)| head))
            .unwrap_or("");
        let body = format!(
            "{},1,1,{},{},{},{}*",
            fields[0], fields[3], fields[4], full_payload, fill_field
        );
        let mut out = format!("{body}{}", checksum_str(&body));

        if ts1 == 0.0 {
            // Timestamps were allowed missing: keep any trailing fields but
            // do not emit the unreliable timestamp
            if fields.len() > 8 {
                out = format!("{out},{}", fields[7..fields.len() - 1].join(","));
            }
        } else {
            out = format!(
                "{out},{}",
                fields.get(7..).unwrap_or(&[]).join(",")
            );
        }

        if !is_checksum_valid(&out) {
            // Construction bug, not bad input: report but still return
            self.report_err(AisError::InvalidChecksumInConstructed {
                line: line.trim().to_string(),
            });
        }

        let out = format!("{}\n", out.trim());
        let origin: String = parts.iter().map(|p| p.origline.as_str()).collect();
        Some(NormalizedSentence {
            tagblock: merged,
            sentence: out,
            origin,
        })
    }
}

fn origins(parts: &[Packet]) -> Vec<String> {
    parts.iter().map(|p| p.origline.trim().to_string()).collect()
}
