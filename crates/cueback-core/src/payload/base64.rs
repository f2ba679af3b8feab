use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Decode a base64 attribute or text-node payload into raw bytes.
///
/// Empty input is an empty buffer, not an error. Surrounding whitespace is
/// tolerated; embedded whitespace is malformed input.
pub(crate) fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text.trim())
}
