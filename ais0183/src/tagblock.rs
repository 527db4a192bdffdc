/// NMEA 4.10 tag block parsing.
///
/// Receiving infrastructure often prefixes sentences with a `\key:value,...\`
/// block carrying metadata such as the receiving station and a UNIX
/// timestamp, e.g.
///
/// `\g:1-2-1604,s:rORBCOMM008,c:1418169601*37\!AIVDM,2,1,6,A,...,0*63`
///
/// The parser only extracts the fields; the tag block's own `*checksum`
/// suffix is stripped without being validated. Values are kept as raw
/// strings so the caller decides how to interpret timestamps.
use std::collections::BTreeMap;

/// Parsed tag block metadata, keyed by long field names
/// (`tagblock_station`, `tagblock_timestamp`, ...).
pub type TagBlock = BTreeMap<String, String>;

/// Split an optional tag block off a raw line.
///
/// Returns the parsed metadata and the remainder of the line. A line without
/// a leading `\` (or with an unterminated tag block) is returned unchanged
/// with an empty map.
pub fn parse(raw_line: &str) -> (TagBlock, &str) {
    let mut tags = TagBlock::new();

    let Some(after_open) = raw_line.strip_prefix('\\') else {
        return (tags, raw_line);
    };
    let Some(close) = after_open.find('\\') else {
        return (tags, raw_line);
    };
    let block = &after_open[..close];
    let rest = &after_open[close + 1..];

    // Drop the tag block's own checksum, if present
    let block = block.rsplit_once('*').map_or(block, |(fields, _)| fields);

    for field in block.split(',') {
        let Some((key, value)) = field.split_once(':') else {
            continue;
        };
        match key {
            "c" => insert(&mut tags, "tagblock_timestamp", value),
            "d" => insert(&mut tags, "tagblock_destination", value),
            "n" => insert(&mut tags, "tagblock_line_count", value),
            "r" => insert(&mut tags, "tagblock_relative_time", value),
            "s" => insert(&mut tags, "tagblock_station", value),
            "t" => insert(&mut tags, "tagblock_text", value),
            "g" => parse_group(&mut tags, value),
            other => insert(&mut tags, &format!("tagblock_{other}"), value),
        }
    }

    (tags, rest)
}

/// Expand `g:<sentence>-<groupsize>-<id>` into its three parts; anything
/// else is kept raw under `tagblock_group`.
fn parse_group(tags: &mut TagBlock, value: &str) {
    let parts: Vec<&str> = value.split('-').collect();
    if parts.len() == 3 {
        insert(tags, "tagblock_sentence", parts[0]);
        insert(tags, "tagblock_groupsize", parts[1]);
        insert(tags, "tagblock_id", parts[2]);
    } else {
        insert(tags, "tagblock_group", value);
    }
}

fn insert(tags: &mut TagBlock, key: &str, value: &str) {
    tags.insert(key.to_string(), value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_tagblock() {
        let line = "!AIVDM,1,1,,B,00000000008,2*2A";
        let (tags, rest) = parse(line);
        assert!(tags.is_empty());
        assert_eq!(rest, line);
    }

    #[test]
    fn test_full_tagblock() {
        let line = r"\g:1-2-1604,s:rORBCOMM008,c:1418169601,T:2014-12-10 00.00.01*37\!AIVDM,2,1,6,A,53@o0E,0*63";
        let (tags, rest) = parse(line);
        assert_eq!(rest, "!AIVDM,2,1,6,A,53@o0E,0*63");
        assert_eq!(tags.get("tagblock_station").unwrap(), "rORBCOMM008");
        assert_eq!(tags.get("tagblock_timestamp").unwrap(), "1418169601");
        assert_eq!(tags.get("tagblock_sentence").unwrap(), "1");
        assert_eq!(tags.get("tagblock_groupsize").unwrap(), "2");
        assert_eq!(tags.get("tagblock_id").unwrap(), "1604");
        // Unknown keys are kept with the generic prefix
        assert_eq!(tags.get("tagblock_T").unwrap(), "2014-12-10 00.00.01");
    }

    #[test]
    fn test_timestamp_kept_as_string() {
        let (tags, _) = parse(r"\c:1241544035*53\!AIVDM,1,1,,A,x,0*00");
        assert_eq!(tags.get("tagblock_timestamp").unwrap(), "1241544035");
    }

    #[test]
    fn test_malformed_group_kept_raw() {
        let (tags, _) = parse(r"\g:1-2*00\!AIVDM,1,1,,A,x,0*00");
        assert_eq!(tags.get("tagblock_group").unwrap(), "1-2");
        assert!(!tags.contains_key("tagblock_sentence"));
    }

    #[test]
    fn test_unterminated_tagblock_returned_unchanged() {
        let line = r"\s:rORBCOMM008,c:1418169601!AIVDM,1,1,,A,x,0*00";
        let (tags, rest) = parse(line);
        assert!(tags.is_empty());
        assert_eq!(rest, line);
    }

    #[test]
    fn test_fields_without_colon_skipped() {
        let (tags, rest) = parse(r"\s:r17PDUT1,bogus,c:1272439747*00\!AIVDM,1,1,,B,x,0*00");
        assert_eq!(tags.len(), 2);
        assert_eq!(rest, "!AIVDM,1,1,,B,x,0*00");
    }
}
