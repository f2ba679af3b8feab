//! Cueback core library for decoding lighting-console backup files.
//!
//! A console backup is an XML document whose attributes and text nodes
//! carry base64-encoded binary payloads: fixture channel-capability
//! profiles ("personalities") and sparse per-cue DMX snapshots ("frames").
//! The payload layouts are reverse engineered; format detection is an
//! ordered sequence of length heuristics driven by layout/reader/parser
//! modules per format. Decoding is byte-oriented and side-effect free; all
//! I/O is isolated in `parse_backup_file` and the CLI.
//!
//! Invariants:
//! - Every decoder is total: malformed or truncated input yields an absent
//!   or degenerate value, never a panic or an escaping error.
//! - Fixtures, fixture playbacks and tracks are sorted by their index
//!   attribute; everything else keeps document order.
//! - A decode failure on one fixture or cue never aborts the rest of the
//!   document.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use cueback_core::parse_backup_file;
//!
//! let backup = parse_backup_file(Path::new("backup.xml"))?;
//! println!("fixtures: {}", backup.patch.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod dmx;
mod document;
mod payload;

pub use dmx::{ChannelValue, DmxState, FixtureChannelData, build_dmx_state, map_fixture_channels};
pub use document::tree::{XmlElement, XmlError};
pub use document::{DocumentError, parse_backup_file, parse_backup_xml};
pub use payload::frame::{Frame, FrameChannel, decode_frame};
pub use payload::hexdump::{hex_dump, payload_hex_dump};
pub use payload::personality::{ChannelEntry, Personality, PersonalityFormat, decode_personality};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the input's modification time is unknown.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Versioned report envelope around one decoded backup.
///
/// # Examples
/// ```
/// use cueback_core::{BackupDocument, make_report};
///
/// let report = make_report("backup.xml", 123, BackupDocument::default());
/// assert_eq!(report.report_version, cueback_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the console firmware version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp, normally the input file's modification time.
    pub generated_at: String,
    /// Input file metadata.
    pub input: InputInfo,
    /// The decoded backup document.
    pub backup: BackupDocument,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use cueback_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "cueback".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "cueback");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "cueback").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input file metadata embedded in reports.
///
/// # Examples
/// ```
/// use cueback_core::InputInfo;
///
/// let input = InputInfo {
///     path: "backup.xml".to_string(),
///     bytes: 1024,
/// };
/// assert_eq!(input.bytes, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Fully decoded backup document, immutable once built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupDocument {
    /// Device identification from the root element.
    pub header: BackupHeader,
    /// Patched fixtures, sorted by index.
    pub patch: Vec<Fixture>,
    /// Plain playbacks (timing metadata only, no frame data).
    pub playbacks: Vec<Playback>,
    /// Fixture playbacks with embedded frame payloads, sorted by index.
    pub fixture_playbacks: Vec<FixturePlayback>,
    /// Show-control action list.
    pub show_control: ActionList,
    /// Audio tracks, sorted by index.
    pub tracks: Vec<Track>,
}

/// Attributes of the root `core` element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupHeader {
    pub device: String,
    pub version_pcb: String,
    pub version_firmware: String,
    pub pcb_serial: String,
    pub mac_address: String,
    pub backup_utility: String,
    pub utility_version: String,
    pub protocol_version: String,
}

/// One patched fixture.
///
/// `personality` keeps the raw base64 attribute; `decoded_personality` is
/// `None` when the attribute is absent, blank or not valid base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub index: u32,
    pub label: String,
    /// DMX start address, 0-indexed as stored.
    pub address: u16,
    pub virtual_dimmer: bool,
    /// Raw base64 personality attribute.
    pub personality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_personality: Option<Personality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Original element, re-serialized for diagnostics.
    pub raw_xml: String,
}

/// Playback precedence, case-normalized from the document.
///
/// # Examples
/// ```
/// use cueback_core::Precedence;
///
/// assert_eq!(Precedence::from_attr(Some("htp")), Precedence::Htp);
/// assert_eq!(Precedence::from_attr(Some("bogus")), Precedence::Ltp);
/// assert_eq!(Precedence::from_attr(None), Precedence::Ltp);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precedence {
    #[serde(rename = "LTP")]
    Ltp,
    #[serde(rename = "HTP")]
    Htp,
    Priority,
}

impl Precedence {
    /// Normalize a raw attribute value; anything unrecognized is LTP.
    pub fn from_attr(raw: Option<&str>) -> Self {
        match raw.unwrap_or("").to_ascii_uppercase().as_str() {
            "HTP" => Precedence::Htp,
            "PRIORITY" => Precedence::Priority,
            _ => Precedence::Ltp,
        }
    }
}

/// Plain playback: cue timing metadata without frame data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playback {
    /// Position in document order; plain playbacks carry no trustworthy
    /// index attribute.
    pub index: u32,
    pub label: String,
    pub release: String,
    pub precedence: Precedence,
    pub repeat: String,
    pub timecode_offset: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cues: Vec<Cue>,
}

/// Fixture playback: cues carry embedded frame payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturePlayback {
    pub index: u32,
    pub label: String,
    pub release: String,
    pub precedence: Precedence,
    pub repeat: String,
    pub timecode_enabled: bool,
    pub timecode_offset: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cues: Vec<Cue>,
    /// Original element, re-serialized for diagnostics.
    pub raw_xml: String,
}

/// One stored playback step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cue {
    pub index: u32,
    pub label: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<FramePayload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frame_fx: Vec<FramePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_xml: Option<String>,
}

/// One base64 frame text node together with its decode result.
///
/// `decoded` is `None` when the payload is malformed; the failure stays
/// local to this payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramePayload {
    /// Raw base64 text as stored in the document.
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded: Option<Frame>,
}

/// Show-control action list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionList {
    pub enabled: bool,
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

/// One show-control action: a trigger and the tasks it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub label: String,
    pub trigger: Trigger,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
    /// Original element, re-serialized for diagnostics.
    pub raw_xml: String,
}

/// Trigger condition of an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: String,
    pub value: String,
    /// Edge selection; the console writes "Change", "Rise" or "Fall".
    pub flank: String,
}

/// One task executed by an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "type")]
    pub task_type: String,
    pub feature: String,
    pub function: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<TaskParameter>,
}

/// One parameter of a task; the value is the element's text content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskParameter {
    pub index: u32,
    #[serde(rename = "type")]
    pub param_type: String,
    pub value: String,
}

/// Audio track metadata.
///
/// # Examples
/// ```
/// use cueback_core::Track;
///
/// let track = Track {
///     index: 0,
///     label: "intro".to_string(),
///     version: "1".to_string(),
///     frames: 4410,
///     filesize: 17640,
///     sample_rate: 44100,
///     external: false,
/// };
/// assert_eq!(track.sample_rate, 44100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub index: u32,
    pub label: String,
    pub version: String,
    pub frames: u32,
    pub filesize: u64,
    pub sample_rate: u32,
    pub external: bool,
}

/// Wrap a decoded backup into a report with base fields filled.
///
/// `generated_at` starts at [`DEFAULT_GENERATED_AT`]; callers that know the
/// input's modification time overwrite it.
///
/// # Examples
/// ```
/// use cueback_core::{BackupDocument, make_report};
///
/// let report = make_report("backup.xml", 42, BackupDocument::default());
/// assert_eq!(report.input.bytes, 42);
/// assert_eq!(report.generated_at, cueback_core::DEFAULT_GENERATED_AT);
/// ```
pub fn make_report(input_path: &str, input_bytes: u64, backup: BackupDocument) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "cueback".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        backup,
    }
}
