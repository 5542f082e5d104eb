//! TXT record helpers

use crate::records::{CanonicalRecord, RecordData};

/// Maximum octets in one TXT character-string segment
pub const MAX_TXT_SEGMENT: usize = 255;

/// Splits single-segment TXT records longer than 255 octets into segments of
/// at most 255 octets, on character boundaries. Providers reject longer
/// segments. Records that already carry multiple segments are left alone:
/// the caller chose a segmentation.
pub fn split_single_long_txt(records: &mut [CanonicalRecord]) {
    for record in records.iter_mut() {
        if let RecordData::TXT { segments } = &mut record.data {
            if segments.len() == 1 && segments[0].len() > MAX_TXT_SEGMENT {
                let long = std::mem::take(&mut segments[0]);
                *segments = split_at_octet_boundary(&long, MAX_TXT_SEGMENT);
            }
        }
    }
}

fn split_at_octet_boundary(s: &str, max: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut rest = s;
    while rest.len() > max {
        let mut cut = max;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        segments.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
    segments.push(rest.to_string());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txt(segments: Vec<&str>) -> CanonicalRecord {
        CanonicalRecord::new(
            "@",
            "example.com",
            300,
            RecordData::TXT {
                segments: segments.into_iter().map(String::from).collect(),
            },
        )
    }

    fn segments(record: &CanonicalRecord) -> &[String] {
        match &record.data {
            RecordData::TXT { segments } => segments,
            other => panic!("not a TXT record: {:?}", other),
        }
    }

    #[test]
    fn test_short_segment_unchanged() {
        let mut records = vec![txt(vec!["hello"])];
        split_single_long_txt(&mut records);
        assert_eq!(segments(&records[0]), ["hello"]);
    }

    #[test]
    fn test_exactly_255_unchanged() {
        let s = "a".repeat(255);
        let mut records = vec![txt(vec![&s])];
        split_single_long_txt(&mut records);
        assert_eq!(segments(&records[0]), [s]);
    }

    #[test]
    fn test_long_segment_split() {
        let s = "a".repeat(600);
        let mut records = vec![txt(vec![&s])];
        split_single_long_txt(&mut records);
        let segs = segments(&records[0]);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].len(), 255);
        assert_eq!(segs[1].len(), 255);
        assert_eq!(segs[2].len(), 90);
        assert_eq!(segs.concat(), s);
    }

    #[test]
    fn test_multibyte_not_split_mid_character() {
        // 2 octets per character, so a naive cut at 255 lands mid-character
        let s = "é".repeat(200);
        let mut records = vec![txt(vec![&s])];
        split_single_long_txt(&mut records);
        let segs = segments(&records[0]);
        assert!(segs.iter().all(|seg| seg.len() <= MAX_TXT_SEGMENT));
        assert_eq!(segs[0].len(), 254);
        assert_eq!(segs.concat(), s);
    }

    #[test]
    fn test_multi_segment_record_left_alone() {
        let long = "b".repeat(300);
        let mut records = vec![txt(vec![&long, "suffix"])];
        split_single_long_txt(&mut records);
        assert_eq!(segments(&records[0]).len(), 2);
    }
}
