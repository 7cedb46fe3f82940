//! Sequence codec for the `Elements` column
//!
//! A dialogue group's ordered elements are stored as a single text payload.

use crate::Result;

/// Encodes an ordered list of strings into a storage payload and back.
///
/// Implementations must round-trip exactly: `deserialize(serialize(seq)) == seq`.
pub trait SequenceCodec: Send + Sync {
    fn serialize(&self, elements: &[String]) -> Result<String>;

    fn deserialize(&self, payload: &str) -> Result<Vec<String>>;
}

/// JSON array codec (the default)
#[derive(Debug, Clone, Copy)]
pub struct JsonSequenceCodec {
    pretty: bool,
}

impl JsonSequenceCodec {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Single-line output
    pub fn compact() -> Self {
        Self::new(false)
    }
}

impl Default for JsonSequenceCodec {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SequenceCodec for JsonSequenceCodec {
    fn serialize(&self, elements: &[String]) -> Result<String> {
        let payload = if self.pretty {
            serde_json::to_string_pretty(elements)?
        } else {
            serde_json::to_string(elements)?
        };
        Ok(payload)
    }

    fn deserialize(&self, payload: &str) -> Result<Vec<String>> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_round_trip_preserves_order_and_content() {
        let samples = [
            list(&[]),
            list(&["Hi"]),
            list(&["", "  padded  ", "line\nbreak", "\"quoted\"", "ünïcødé ✨"]),
            list(&["b", "a", "b"]),
        ];
        for codec in [JsonSequenceCodec::default(), JsonSequenceCodec::compact()] {
            for sample in &samples {
                let payload = codec.serialize(sample).unwrap();
                assert_eq!(&codec.deserialize(&payload).unwrap(), sample);
            }
        }
    }

    #[test]
    fn test_pretty_and_compact_interoperate() {
        let elements = list(&["one", "two"]);
        let pretty = JsonSequenceCodec::default().serialize(&elements).unwrap();
        assert!(pretty.contains('\n'));
        assert_eq!(JsonSequenceCodec::compact().deserialize(&pretty).unwrap(), elements);
    }

    #[test]
    fn test_malformed_payload() {
        let codec = JsonSequenceCodec::default();
        for payload in ["", "not json", "{\"a\": 1}", "[1, 2]"] {
            let err = codec.deserialize(payload).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Serialization);
        }
    }
}
