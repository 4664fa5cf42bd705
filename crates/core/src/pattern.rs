//! Pattern creation: wraps a pair of original/modified source
//! texts into a single [`Pattern`] -- shared arena, both root ids, and the
//! similarity pairing connecting them.
//!
//! `patterndiff-core` never parses source text itself; it is generic over a
//! [`SourceParser`] implementation supplied by the host-language crate
//! (`patterndiff-lang`, for Python), keeping the core tree-sitter agnostic
//! of any one grammar.

use serde::{Deserialize, Serialize};

use crate::arena::{Arena, NodeId};
use crate::differ::Differencer;
use crate::error::CoreError;
use crate::pairing::Pairing;

/// Parses source text into the wrapped AST model, allocating nodes into a
/// caller-supplied [`Arena`] so that an original/modified pair ends up
/// sharing one arena (required for `Insert` operations to splice subtrees
/// between the two without copying).
pub trait SourceParser {
  fn parse(&self, arena: &mut Arena, text: &str) -> Result<NodeId, CoreError>;
}

/// A mined original/modified pair plus the node-to-node similarity pairing
/// between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
  pub arena: Arena,
  pub original: NodeId,
  pub modified: NodeId,
  pub pairing: Pairing,
}

impl Pattern {
  /// Parses `original_text`/`modified_text` with `parser` into a shared
  /// arena and connects their nodes with `differencer`. Mirrors
  /// `PatternCreator.create_pattern`.
  pub fn create<P: SourceParser>(
    parser: &P,
    differencer: &Differencer,
    original_text: &str,
    modified_text: &str,
  ) -> Result<Self, CoreError> {
    let mut arena = Arena::new();
    let original = parser.parse(&mut arena, original_text)?;
    let modified = parser.parse(&mut arena, modified_text)?;
    let pairing = differencer.connect_nodes(&arena, original, modified);
    Ok(Pattern { arena, original, modified, pairing })
  }
}
