use serde::{Deserialize, Serialize};

use super::error::FrameError;
use super::layout;
use super::reader::FrameReader;
use crate::payload::base64;

/// One sparse channel record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameChannel {
    /// DMX address, 1-indexed (storage is 0-indexed).
    pub address: u16,
    /// DMX value 0-255.
    pub value: u8,
}

/// One decoded DMX snapshot.
///
/// Record order is preserved as stored; duplicate addresses are kept. How
/// duplicates resolve is a consumer concern (`build_dmx_state` lets the
/// later record win).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub frame_index: u16,
    pub channels: Vec<FrameChannel>,
}

/// Decode a base64 frame text node. `None` for malformed base64 or a
/// payload shorter than the sequence number.
pub fn decode_frame(text: &str) -> Option<Frame> {
    let bytes = base64::decode(text).ok()?;
    parse_frame(&bytes).ok()
}

fn parse_frame(bytes: &[u8]) -> Result<Frame, FrameError> {
    let reader = FrameReader::new(bytes);
    reader.require_len(layout::MIN_LEN)?;
    let frame_index = reader.read_u16_le(layout::FRAME_INDEX_OFFSET)?;

    let mut channels = Vec::new();
    let mut offset = layout::RECORD_START;
    // A tail shorter than one record is discarded silently.
    while offset + layout::RECORD_LEN <= reader.len() {
        let address = reader.read_u16_le(offset + layout::RECORD_ADDRESS_OFFSET)?;
        let value_low = reader.read_u8(offset + layout::RECORD_VALUE_LOW_OFFSET)?;
        let value_high = reader.read_u8(offset + layout::RECORD_VALUE_HIGH_OFFSET)?;
        let value = if value_high == layout::VALUE_HIGH_FULL {
            layout::DMX_VALUE_FULL
        } else {
            value_low
        };
        channels.push(FrameChannel {
            // Stored 0-indexed, reported 1-indexed.
            address: address.wrapping_add(1),
            value,
        });
        offset += layout::RECORD_LEN;
    }

    Ok(Frame {
        frame_index,
        channels,
    })
}
