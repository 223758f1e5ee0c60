use std::path::PathBuf;

use twpb::{DecodeError, DescriptorError, EncodeError};

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid schema: {0}")]
    Descriptor(#[from] DescriptorError),
    #[error("{file}: encode failed: {source}")]
    Encode { file: String, source: EncodeError },
    #[error("{file}: decode failed: {source}")]
    Decode { file: String, source: DecodeError },
    #[error("{file}: {path}: expected {expected}, found {actual}")]
    Mismatch {
        file: String,
        path: String,
        expected: String,
        actual: String,
    },
    #[error("{0}")]
    Usage(String),
}
