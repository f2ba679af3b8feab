//! Sparse DMX frame decoding.
//!
//! A frame is one DMX snapshot captured within a cue: a 16-bit sequence
//! number followed by 4-byte records of (address, value low, value high).
//! Only non-zero channels are stored. A trailing remainder shorter than one
//! record is dropped, not an error.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{Frame, FrameChannel, decode_frame};
