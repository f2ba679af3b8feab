//! DMX state reconstruction and fixture channel mapping.
//!
//! `build_dmx_state` collapses a cue's frame payloads into one sparse
//! address-to-value map; `map_fixture_channels` projects that map onto the
//! patched fixtures using their decoded personalities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Fixture;
use crate::payload::frame::decode_frame;

/// Sparse DMX map: address (1-indexed) to value (0-255).
pub type DmxState = BTreeMap<u16, u8>;

/// Build the DMX state for a cue from its base64 frame texts.
///
/// Current policy: only the first frame is applied; it carries the full
/// sparse snapshot and subsequent frames are ignored. Within that frame,
/// later records overwrite earlier ones at the same address.
pub fn build_dmx_state(frame_texts: &[String]) -> DmxState {
    let mut state = DmxState::new();
    let Some(first) = frame_texts.first() else {
        return state;
    };
    if let Some(frame) = decode_frame(first) {
        for channel in frame.channels {
            state.insert(channel.address, channel.value);
        }
    }
    state
}

/// One resolved channel of a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelValue {
    /// Trait ID rendering (`"1002*"` when flagged), or `"ChN"` when the
    /// fixture has no decoded personality.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trait_id: Option<u16>,
    pub value: u8,
}

/// Resolved channel values for one fixture, recomputed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureChannelData {
    pub fixture_index: u32,
    pub label: String,
    /// First DMX address of the fixture, 1-indexed.
    pub start_address: u32,
    pub channels: Vec<ChannelValue>,
}

/// Project a DMX state onto the patched fixtures.
///
/// Channel count comes from the fixture's decoded personality, falling back
/// to `default_channel_count`. Fixtures whose every resolved value is zero
/// are omitted; output order matches input order.
pub fn map_fixture_channels(
    state: &DmxState,
    fixtures: &[Fixture],
    default_channel_count: usize,
) -> Vec<FixtureChannelData> {
    let mut result = Vec::new();

    for fixture in fixtures {
        let start_address = u32::from(fixture.address) + 1;
        let personality = fixture.decoded_personality.as_ref();
        let channel_count = personality.map_or(default_channel_count, |p| p.channel_count);

        let mut channels = Vec::with_capacity(channel_count);
        let mut has_data = false;
        for i in 0..channel_count {
            let address = start_address + i as u32;
            let value = u16::try_from(address)
                .ok()
                .and_then(|addr| state.get(&addr).copied())
                .unwrap_or(0);

            let entry = personality.and_then(|p| p.channels.get(i));
            let name = match entry {
                Some(entry) if entry.has_flag => format!("{}*", entry.trait_id),
                Some(entry) => entry.trait_id.to_string(),
                None => format!("Ch{}", i + 1),
            };

            channels.push(ChannelValue {
                name,
                trait_id: entry.map(|e| e.trait_id),
                value,
            });
            if value > 0 {
                has_data = true;
            }
        }

        if has_data {
            result.push(FixtureChannelData {
                fixture_index: fixture.index,
                label: fixture.label.clone(),
                start_address,
                channels,
            });
        }
    }

    result
}
