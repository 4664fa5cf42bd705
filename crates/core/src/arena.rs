//! Dense storage for [`Node`](crate::node::Node) values.
//!
//! Trees in this crate are not self-owning recursive enums: every `Node`
//! references its children by [`NodeId`], a handle into an [`Arena`]. This
//! gives the pairing map used by the differencer and matcher a stable,
//! cheap-to-hash identity (a `u32`) instead of requiring pointer identity or
//! a `Rc<RefCell<_>>` graph, matching the "arena index is cleanest" guidance
//! for wildcard/use linkage.
//!
//! An original/modified pair produced by the same [`crate::pattern::PatternCreator`]
//! call lives in one shared `Arena`, so `Insert` edit operations can splice a
//! subtree from the modified tree into the original stream without copying.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::node::Node;

/// A handle into an [`Arena`]. Stable for the lifetime of the arena; never
/// reused, so `(NodeId, NodeId)` pairs make a sound hash-map key even across
/// many mutations of the arena's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// Owns every [`Node`] allocated while wrapping, differencing or refining a
/// single pattern. Nodes are never removed; edit-script application and
/// refinement allocate new entries rather than mutating existing ones, so
/// old `NodeId`s referenced by an in-progress pairing map stay valid.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Arena {
  nodes: Vec<Node>,
}

impl Arena {
  pub fn new() -> Self {
    Self { nodes: Vec::new() }
  }

  pub fn alloc(&mut self, node: Node) -> NodeId {
    let id = NodeId(self.nodes.len() as u32);
    self.nodes.push(node);
    id
  }

  pub fn get(&self, id: NodeId) -> &Node {
    &self.nodes[id.index()]
  }

  pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
    &mut self.nodes[id.index()]
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}

impl Index<NodeId> for Arena {
  type Output = Node;
  fn index(&self, id: NodeId) -> &Node {
    self.get(id)
  }
}

impl IndexMut<NodeId> for Arena {
  fn index_mut(&mut self, id: NodeId) -> &mut Node {
    self.get_mut(id)
  }
}
