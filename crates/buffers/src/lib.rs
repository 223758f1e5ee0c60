//! Byte buffer primitives for the twpb wire codec.
//!
//! [`Writer`] is an auto-growing output buffer, [`Reader`] a cursor over a
//! borrowed byte slice whose reads are bounds-checked.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

/// Failure of a bounds-checked buffer read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("invalid UTF-8")]
    InvalidUtf8,
}
