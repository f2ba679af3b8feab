//! Hex renderings of raw payload bytes for diagnostics.

use crate::payload::base64;

/// Space-separated lowercase hex, the form carried by decoded personalities.
pub(crate) fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classic 16-bytes-per-line dump: offset, hex column, ASCII column.
/// Non-printable bytes render as `.`.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut lines = Vec::new();
    for (line, chunk) in bytes.chunks(16).enumerate() {
        let offset = line * 16;
        let hex = hex_string(chunk);
        let ascii: String = chunk
            .iter()
            .map(|&b| if (0x20..0x7f).contains(&b) { b as char } else { '.' })
            .collect();
        lines.push(format!("{offset:04x}: {hex:<48} {ascii}"));
    }
    lines.join("\n")
}

/// Hex-dump a base64 payload. `None` when the payload is not valid base64.
pub fn payload_hex_dump(text: &str) -> Option<String> {
    let bytes = base64::decode(text).ok()?;
    Some(hex_dump(&bytes))
}
