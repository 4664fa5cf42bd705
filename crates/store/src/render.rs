//! The `Renderer` seam: turning a wrapped
//! [`Node`] subtree back into source text. Kept generic over the host
//! language for the same reason [`patterndiff_core::pattern::SourceParser`]
//! is: `patterndiff-store`'s emitters never parse or unparse anything
//! themselves, a host-language crate (`patterndiff-lang`, for Python)
//! supplies the concrete implementation.

use patterndiff_core::{Arena, NodeId};

/// `resolve_use(index)` returns the already-rendered text a matched
/// wildcard captured (joined, if the wildcard absorbed more than one
/// sibling), or `None` if this index has no captured text -- in which case
/// a renderer falls back to rendering the `Use`'s own wrapped subtree.
pub trait Renderer {
  fn render(&self, arena: &Arena, node: NodeId, resolve_use: &dyn Fn(u32) -> Option<String>) -> String;
}
