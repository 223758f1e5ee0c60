//! Codec configuration.

/// Default maximum nesting depth of embedded messages.
pub const DEFAULT_RECURSION_LIMIT: usize = 100;

/// How a repeated occurrence of a singular embedded-message field combines
/// with the value decoded so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddedMerge {
    /// Field-wise recursive merge, as standard protobuf parsers do.
    #[default]
    Merge,
    /// The later occurrence replaces the earlier one.
    LastWins,
}

/// Options shared by [`MessageDecoder`](crate::MessageDecoder) and
/// [`MessageEncoder`](crate::MessageEncoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Embedded messages nested deeper than this fail to decode.
    pub recursion_limit: usize,
    /// Keep fields missing from the descriptor table so they re-encode.
    /// When false they are skipped.
    pub preserve_unknown_fields: bool,
    pub embedded_merge: EmbeddedMerge,
    /// Emit implicit-presence scalars even when they hold their zero value.
    pub emit_default_values: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            preserve_unknown_fields: true,
            embedded_merge: EmbeddedMerge::Merge,
            emit_default_values: false,
        }
    }
}
