use thiserror::Error;

/// Errors raised by personality payload reads.
///
/// These never escape the decoder boundary: `decode_personality` converts
/// them into an absent result.
#[derive(Debug, Error)]
pub enum PersonalityError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
}
