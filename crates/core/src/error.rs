//! Error types for `patterndiff-core`: one `thiserror`-derived enum, flat
//! per crate rather than per module.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
  #[error("source text could not be parsed: {0}")]
  Parse(String),

  /// A pre-order index used by an edit script or the matcher fell outside
  /// the stream it was meant to index into. This indicates a malformed
  /// pattern (e.g. one loaded from an untrusted store) rather than a logic
  /// bug in a freshly generated script, so it is surfaced as an `Err`
  /// instead of a panic.
  #[error("index {index} out of range for a stream of length {len}")]
  IndexOutOfRange { index: usize, len: usize },

  #[error("wildcard at node {0:?} has no linked use")]
  UnlinkedWildcard(crate::arena::NodeId),
}
