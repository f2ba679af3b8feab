use thiserror::Error;

/// Errors raised by frame payload reads.
///
/// These never escape the decoder boundary: `decode_frame` converts them
/// into an absent result.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
}
