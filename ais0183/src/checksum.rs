/// NMEA 0183 checksum utilities.
///
/// The checksum of a sentence is the XOR of every byte between the leading
/// `!`/`$` and the `*` delimiter, written as two uppercase hex digits after
/// the `*`. All functions here are pure and never panic on malformed input.

/// Drop an optional `\...\` tagblock prefix. The tagblock carries its own
/// checksum and is not covered by the sentence checksum.
fn strip_tagblock(sentence: &str) -> &str {
    if let Some(rest) = sentence.strip_prefix('\\') {
        if let Some(end) = rest.find('\\') {
            return &rest[end + 1..];
        }
    }
    sentence
}

/// Return the body of a sentence that the checksum covers: anything after an
/// optional `\...\` tagblock prefix and the leading `!`/`$`, up to the first
/// `*` (or end of string).
fn checksum_body(sentence: &str) -> &str {
    let mut body = strip_tagblock(sentence);
    if let Some(rest) = body.strip_prefix('!').or_else(|| body.strip_prefix('$')) {
        body = rest;
    }
    match body.find('*') {
        Some(pos) => &body[..pos],
        None => body,
    }
}

/// Compute the XOR checksum of a sentence.
pub fn checksum(sentence: &str) -> u8 {
    checksum_body(sentence).bytes().fold(0u8, |acc, b| acc ^ b)
}

/// Compute the checksum as the two uppercase hex digits that follow `*` in a
/// well-formed sentence. The `*` itself is not included.
pub fn checksum_str(sentence: &str) -> String {
    format!("{:02X}", checksum(sentence))
}

/// Check a sentence against its embedded checksum.
///
/// The two characters following the first `*` past any tagblock prefix are
/// compared (case-insensitive) with the computed checksum. Returns `false` on a malformed trailer
/// (missing `*`, fewer than two digits, non-hex digits) rather than erroring.
pub fn is_checksum_valid(sentence: &str) -> bool {
    let sentence = strip_tagblock(sentence);
    let Some(star) = sentence.find('*') else {
        return false;
    };
    let trailer = &sentence[star + 1..];
    let Some(digits) = trailer.get(..2) else {
        return false;
    };
    match u8::from_str_radix(digits, 16) {
        Ok(expected) => checksum(sentence) == expected,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_known_sentence() {
        // Real-world sample, second half of a two-part type 5 message
        assert_eq!(checksum_str("!AIVDM,2,2,6,A,00000000008,2*2A"), "2A");
        assert!(is_checksum_valid("!AIVDM,2,2,6,A,00000000008,2*2A"));
    }

    #[test]
    fn test_checksum_ignores_tagblock_prefix() {
        let line = r"\s:rORBCOMM008,c:1418169601*3C\!AIVDM,2,2,6,A,00000000008,2*2A";
        assert!(is_checksum_valid(line));
        // The tagblock's own checksum must not shadow the sentence trailer
        let bad = r"\s:rORBCOMM008,c:1418169601*3C\!AIVDM,2,2,6,A,00000000008,2*FF";
        assert!(!is_checksum_valid(bad));
    }

    #[test]
    fn test_checksum_stops_at_first_star() {
        // USCG feeds append station and timestamp after the checksum
        assert!(is_checksum_valid(
            "!AIVDM,2,2,6,A,00000000008,2*2A,r003669945,1241544035"
        ));
    }

    #[test]
    fn test_invalid_checksum_detected() {
        assert!(!is_checksum_valid(
            "!AIVDM,1,1,,B,ENjOspPr?@6a9Qh70`62aP100000PaJ<;co0P00000N010,4*0B"
        ));
    }

    #[test]
    fn test_checksum_case_insensitive() {
        let body = "!AIVDM,1,1,,A,14eG;o@034o8sd<L9i:a;WF>062D,0*";
        let cs = checksum_str(body);
        assert!(is_checksum_valid(&format!("{body}{cs}")));
        assert!(is_checksum_valid(&format!("{body}{}", cs.to_lowercase())));
    }

    #[test]
    fn test_malformed_trailer() {
        assert!(!is_checksum_valid("!AIVDM,1,1,,A,abc,0"));
        assert!(!is_checksum_valid("!AIVDM,1,1,,A,abc,0*"));
        assert!(!is_checksum_valid("!AIVDM,1,1,,A,abc,0*5"));
        assert!(!is_checksum_valid("!AIVDM,1,1,,A,abc,0*ZZ"));
    }

    #[test]
    fn test_round_trip() {
        for body in [
            "!AIVDM,1,1,,B,70C<HvRftSLBTtwN4oTg8261,0*",
            "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*",
            "!AIVDM,2,1,6,A,53@o0E000001Q0CG37U8u<Tp4q@D00000000000018330400000000000000,0*",
        ] {
            let cs = checksum_str(body);
            assert!(is_checksum_valid(&format!("{body}{cs}")), "{body}");
        }
    }
}
