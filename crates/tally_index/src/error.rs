//! Error types for decoding persisted indexes.

/// Structural corruption found while decoding a persisted index.
///
/// Any of these invalidates the whole load: a partially populated index
/// would silently lose target attribution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// An entry references a target position past the end of the target list.
    #[error("entry {entry} references target index {index}, but only {len} targets are recorded")]
    TargetIndexOutOfRange {
        /// Position of the offending entry.
        entry: usize,
        /// The out-of-range index.
        index: u32,
        /// Number of recorded targets.
        len: usize,
    },

    /// An entry references an artifact position past the end of the artifact list.
    #[error(
        "entry {entry} references artifact index {index}, but only {len} artifacts are recorded"
    )]
    ArtifactIndexOutOfRange {
        /// Position of the offending entry.
        entry: usize,
        /// The out-of-range index.
        index: u32,
        /// Number of recorded artifacts.
        len: usize,
    },
}
