use serde::{Deserialize, Serialize};

use super::error::PersonalityError;
use super::layout;
use super::reader::PersonalityReader;
use crate::payload::base64;
use crate::payload::hexdump;

/// Detected payload layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalityFormat {
    Simple,
    Complex,
}

/// One channel of a fixture profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    /// Channel position, 0-based.
    pub index: usize,
    /// Device-internal capability identifier for this channel.
    pub trait_id: u16,
    /// Set when the entry's flag byte equals the group-boundary marker.
    pub has_flag: bool,
}

/// Decoded fixture channel-capability profile.
///
/// A pure function of the payload bytes. `header_value` is present only for
/// the complex layout and is read unsigned; observed values exceed the
/// signed 32-bit range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub format: PersonalityFormat,
    pub channel_count: usize,
    pub channels: Vec<ChannelEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_value: Option<u32>,
    /// Raw payload bytes as space-separated hex, kept for diagnostics.
    pub raw_hex: String,
}

impl Personality {
    /// Trait IDs joined for display, flagged entries starred:
    /// `"1007, 1001, 1002*, 4001"`.
    pub fn format_trait_ids(&self) -> String {
        self.channels
            .iter()
            .map(|entry| {
                if entry.has_flag {
                    format!("{}*", entry.trait_id)
                } else {
                    entry.trait_id.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Decode a base64 personality attribute.
///
/// Returns `None` for absent/blank input and for payloads that are not
/// valid base64. An unrecognized byte shape is not a failure: it decodes to
/// a zero-channel result that still carries the raw hex.
pub fn decode_personality(text: Option<&str>) -> Option<Personality> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    let bytes = base64::decode(text).ok()?;
    if bytes.is_empty() {
        return None;
    }

    // Ordered heuristics; several layouts share a byte-length pattern, so
    // the branch order is load-bearing.
    if bytes.len() == layout::SIMPLE_LEN {
        return parse_simple(&bytes).ok();
    }
    if bytes.len() > layout::SIMPLE_LEN
        && (bytes.len() - layout::HEADER_LEN) % layout::ENTRY_LEN == 0
    {
        return parse_complex(&bytes).ok();
    }
    // Headerless multiple of the entry size: contiguous simple entries.
    if bytes.len() % layout::ENTRY_LEN == 0 {
        return parse_simple(&bytes).ok();
    }

    // Unknown shape: keep the bytes visible, report no channels.
    Some(Personality {
        format: PersonalityFormat::Simple,
        channel_count: 0,
        channels: Vec::new(),
        header_value: None,
        raw_hex: hexdump::hex_string(&bytes),
    })
}

fn parse_simple(bytes: &[u8]) -> Result<Personality, PersonalityError> {
    let reader = PersonalityReader::new(bytes);
    let channels = parse_entries(&reader, 0)?;
    Ok(Personality {
        format: PersonalityFormat::Simple,
        channel_count: channels.len(),
        channels,
        header_value: None,
        raw_hex: hexdump::hex_string(bytes),
    })
}

fn parse_complex(bytes: &[u8]) -> Result<Personality, PersonalityError> {
    let reader = PersonalityReader::new(bytes);
    let header_value = reader.read_u32_le(layout::HEADER_VALUE_OFFSET)?;
    let channels = parse_entries(&reader, layout::HEADER_LEN)?;
    Ok(Personality {
        format: PersonalityFormat::Complex,
        channel_count: channels.len(),
        channels,
        header_value: Some(header_value),
        raw_hex: hexdump::hex_string(bytes),
    })
}

fn parse_entries(
    reader: &PersonalityReader<'_>,
    start: usize,
) -> Result<Vec<ChannelEntry>, PersonalityError> {
    let count = (reader.len() - start) / layout::ENTRY_LEN;
    let mut channels = Vec::with_capacity(count);
    for index in 0..count {
        let offset = start + index * layout::ENTRY_LEN;
        let trait_id = reader.read_u16_le(offset + layout::ENTRY_TRAIT_ID_OFFSET)?;
        let flag = reader.read_u8(offset + layout::ENTRY_FLAG_OFFSET)?;
        channels.push(ChannelEntry {
            index,
            trait_id,
            has_flag: flag == layout::FLAG_GROUP_BOUNDARY,
        });
    }
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    use super::{PersonalityFormat, decode_personality};
    use crate::payload::personality::layout;

    fn entry(trait_id: u16, flag: u8) -> [u8; 4] {
        let id = trait_id.to_le_bytes();
        [id[0], id[1], 0x00, flag]
    }

    fn encode(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    #[test]
    fn sixteen_bytes_decode_as_simple() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&entry(1001, 0x00));
        payload.extend_from_slice(&entry(1002, 0x01));
        payload.extend_from_slice(&entry(1003, 0x00));
        payload.extend_from_slice(&entry(1005, 0x00));

        let parsed = decode_personality(Some(&encode(&payload))).unwrap();
        assert_eq!(parsed.format, PersonalityFormat::Simple);
        assert_eq!(parsed.channel_count, 4);
        assert_eq!(parsed.channels.len(), 4);
        assert_eq!(parsed.header_value, None);

        assert_eq!(parsed.channels[0].index, 0);
        assert_eq!(parsed.channels[0].trait_id, 1001);
        assert!(!parsed.channels[0].has_flag);
        assert_eq!(parsed.channels[1].trait_id, 1002);
        assert!(parsed.channels[1].has_flag);
    }

    #[test]
    fn headered_payload_decodes_as_complex() {
        let header_value: u32 = 3_000_000_001;
        let mut payload = Vec::new();
        payload.extend_from_slice(&header_value.to_le_bytes());
        payload.extend_from_slice(&[0x00; 4]);
        payload.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]);
        for trait_id in [1007u16, 1001, 1002, 4001, 4002, 2001] {
            payload.extend_from_slice(&entry(trait_id, u8::from(trait_id == 1002)));
        }
        assert_eq!(payload.len(), layout::HEADER_LEN + 6 * layout::ENTRY_LEN);

        let parsed = decode_personality(Some(&encode(&payload))).unwrap();
        assert_eq!(parsed.format, PersonalityFormat::Complex);
        assert_eq!(parsed.channel_count, 6);
        assert_eq!(parsed.header_value, Some(header_value));
        assert_eq!(parsed.channels[0].trait_id, 1007);
        assert!(parsed.channels[2].has_flag);
        assert_eq!(parsed.format_trait_ids(), "1007, 1001, 1002*, 4001, 4002, 2001");
    }

    #[test]
    fn header_rule_wins_over_the_headerless_fallback() {
        // 20 bytes is both "12-byte header + 2 entries" and "5 contiguous
        // entries"; the header interpretation must win.
        let mut payload = Vec::new();
        payload.extend_from_slice(&100u32.to_le_bytes());
        payload.extend_from_slice(&[0x00; 8]);
        payload.extend_from_slice(&entry(1001, 0x00));
        payload.extend_from_slice(&entry(1002, 0x00));

        let parsed = decode_personality(Some(&encode(&payload))).unwrap();
        assert_eq!(parsed.format, PersonalityFormat::Complex);
        assert_eq!(parsed.channel_count, 2);
        assert_eq!(parsed.header_value, Some(100));
    }

    #[test]
    fn headerless_multiple_of_entry_size_falls_back_to_simple() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&entry(2001, 0x00));
        payload.extend_from_slice(&entry(2002, 0x00));

        let parsed = decode_personality(Some(&encode(&payload))).unwrap();
        assert_eq!(parsed.format, PersonalityFormat::Simple);
        assert_eq!(parsed.channel_count, 2);
        assert_eq!(parsed.channels[1].trait_id, 2002);
    }

    #[test]
    fn unknown_shape_degrades_to_zero_channels() {
        let payload = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];

        let parsed = decode_personality(Some(&encode(&payload))).unwrap();
        assert_eq!(parsed.format, PersonalityFormat::Simple);
        assert_eq!(parsed.channel_count, 0);
        assert!(parsed.channels.is_empty());
        assert_eq!(parsed.header_value, None);
        assert_eq!(parsed.raw_hex, "01 02 03 04 05 06 07");
    }

    #[test]
    fn absent_or_blank_input_is_none() {
        assert!(decode_personality(None).is_none());
        assert!(decode_personality(Some("")).is_none());
        assert!(decode_personality(Some("   ")).is_none());
    }

    #[test]
    fn malformed_base64_is_none() {
        assert!(decode_personality(Some("!!!")).is_none());
    }

    #[test]
    fn flag_byte_must_equal_marker_exactly() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&entry(1001, 0x02));
        payload.extend_from_slice(&entry(1002, 0x01));
        payload.extend_from_slice(&entry(1003, 0xff));
        payload.extend_from_slice(&entry(1004, 0x00));

        let parsed = decode_personality(Some(&encode(&payload))).unwrap();
        assert!(!parsed.channels[0].has_flag);
        assert!(parsed.channels[1].has_flag);
        assert!(!parsed.channels[2].has_flag);
    }
}
