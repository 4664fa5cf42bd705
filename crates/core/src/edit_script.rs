//! Edit scripts: the Delete/Update/Insert operations that turn
//! an `original` tree into its paired `modified` tree, generated from a
//! [`Pairing`](crate::pairing::Pairing) and applicable back onto any stream
//! derived from (or structurally close to) `original`.
//!
//! `apply` always walks operations from the highest pre-order index to the
//! lowest. Applying them in ascending order would corrupt every subsequent
//! index once an earlier `Delete`/`Insert` shifts the stream; descending
//! order keeps every not-yet-applied operation's index
//! valid since nothing at or below its position has moved yet.

use std::collections::VecDeque;

use crate::arena::{Arena, NodeId};
use crate::error::CoreError;
use crate::node::{self, Order};
use crate::pairing::Pairing;

#[derive(Debug, Clone)]
pub enum Op {
  /// Delete the subtree rooted at pre-order index `index` in `original`.
  Delete { index: usize },
  /// Replace the leaf at pre-order index `index` in `original` with the
  /// leaf `replacement` (always a leaf, since the generator only emits
  /// `Update` when both sides are leaves).
  Update { index: usize, replacement: NodeId },
  /// Splice the pre-order stream `subtree` (captured at generation time)
  /// in before pre-order index `index`.
  Insert { index: usize, subtree: Vec<NodeId> },
}

impl Op {
  fn index(&self) -> usize {
    match self {
      Op::Delete { index } | Op::Update { index, .. } | Op::Insert { index, .. } => *index,
    }
  }
}

/// An ordered (by ascending pre-order index) list of [`Op`]s. Matches
/// `EditScript.changes`, which the original keeps sorted on every `add`.
#[derive(Debug, Clone, Default)]
pub struct EditScript {
  ops: Vec<Op>,
}

impl EditScript {
  pub fn new(mut ops: Vec<Op>) -> Self {
    ops.sort_by_key(|op| op.index());
    Self { ops }
  }

  pub fn push(&mut self, op: Op) {
    let pos = self.ops.partition_point(|o| o.index() <= op.index());
    self.ops.insert(pos, op);
  }

  pub fn ops(&self) -> &[Op] {
    &self.ops
  }

  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }

  /// Generates the script that turns `original` into `modified`, given the
  /// similarity pairing between them. Mirrors
  /// `EditScriptGenerator.generate`: a first pass over `original`'s
  /// pre-order stream decides `Delete`/`Update`, a second pass over
  /// `modified`'s decides `Insert`.
  pub fn generate(
    arena: &Arena,
    original: NodeId,
    modified: NodeId,
    pairing: &Pairing,
    sim_threshold: f64,
  ) -> Self {
    let in_org = node::walk(arena, original, Order::Pre);
    let in_mod = node::walk(arena, modified, Order::Pre);
    let mut pairing = pairing.clone();
    let mut ops = Vec::new();

    let mut index = 1usize;
    while index < in_org.len() {
      let n = in_org[index];
      if arena.get(n).is_leaf() && matches!(arena.get(n), crate::node::Node::Start | crate::node::Node::End) {
        index += 1;
        continue;
      }
      let found = pairing.iter().find(|((a, _), _)| *a == n).map(|(&(a, b), &s)| (a, b, s));
      match found {
        None => {
          ops.push(Op::Delete { index });
          pairing = filter_subtree(arena, &pairing, n);
          index += node::num_children(arena, n);
        }
        Some((_, b, sim)) => {
          if sim < sim_threshold {
            ops.push(Op::Delete { index });
            pairing = filter_subtree(arena, &pairing, n);
            index += node::num_children(arena, n);
          } else if !node::is_mutable_against(arena, n, b) {
            ops.push(Op::Delete { index });
            pairing = filter_subtree(arena, &pairing, n);
            index += node::num_children(arena, n);
          } else if arena.get(n).is_leaf() && node::similarity(arena, n, b, &pairing) < 1.0 {
            ops.push(Op::Update { index, replacement: b });
          }
        }
      }
      index += 1;
    }

    let mut index = 1usize;
    while index < in_mod.len() {
      let n = in_mod[index];
      if matches!(arena.get(n), crate::node::Node::Start | crate::node::Node::End) {
        index += 1;
        continue;
      }
      let found = pairing.iter().find(|((_, b), _)| *b == n).map(|(&(a, b), &s)| (a, b, s));
      match found {
        None => {
          let subtree = node::walk(arena, n, Order::Pre);
          let skip = subtree.len();
          ops.push(Op::Insert { index, subtree });
          index += skip - 1;
        }
        Some((a, _, _)) => {
          if !node::is_mutable_against(arena, a, n) {
            let subtree = node::walk(arena, n, Order::Pre);
            let skip = subtree.len();
            ops.push(Op::Insert { index, subtree });
            index += skip - 1;
          }
        }
      }
      index += 1;
    }

    EditScript::new(ops)
  }

  /// Applies this script to `original`, producing the pre-order stream of
  /// the resulting tree. Operations are walked from the highest index to
  /// the lowest so that applying one never invalidates another's index.
  ///
  /// Returns [`CoreError::IndexOutOfRange`] rather than panicking when an
  /// op's index no longer fits `stream` -- a malformed pattern (e.g. one
  /// loaded from a store whose stream was truncated) should surface as an
  /// error, not take down the caller.
  pub fn apply_to_stream(&self, arena: &mut Arena, mut stream: Vec<NodeId>) -> Result<Vec<NodeId>, CoreError> {
    for op in self.ops.iter().rev() {
      match op {
        Op::Delete { index } => {
          let node = *checked_get(&stream, *index)?;
          let span = 1 + node::num_children(arena, node);
          let end = checked_end(&stream, *index, span)?;
          stream.splice(*index..end, std::iter::empty());
        }
        Op::Update { index, replacement } => {
          let node = *checked_get(&stream, *index)?;
          let span = 1 + node::num_children(arena, node);
          let end = checked_end(&stream, *index, span)?;
          let replacement_stream = node::walk(arena, *replacement, Order::Pre);
          stream.splice(*index..end, replacement_stream);
        }
        Op::Insert { index, subtree } => {
          if *index > stream.len() {
            return Err(CoreError::IndexOutOfRange { index: *index, len: stream.len() });
          }
          stream.splice(*index..*index, subtree.iter().copied());
        }
      }
    }
    Ok(stream)
  }

  /// Applies this script to `original` and rebuilds the resulting tree,
  /// returning the root [`NodeId`] of the reconstructed (modified) tree.
  pub fn apply(&self, arena: &mut Arena, original: NodeId) -> Result<NodeId, CoreError> {
    let stream = node::walk(arena, original, Order::Pre);
    let applied = self.apply_to_stream(arena, stream)?;
    let mut queue: VecDeque<NodeId> = applied.into_iter().collect();
    Ok(node::reconstruct(arena, &mut queue))
  }

  /// The edit distance the refiner uses to find the two nearest patterns:
  /// the sum, over every operation, of `1 + num_children` of the subtree it
  /// touches (the node at `index` in `original` for `Delete`/`Update`, the
  /// captured subtree itself for `Insert`). Mirrors
  /// `pattern_refinement.py::calculate_distance`.
  pub fn size(&self, arena: &Arena, original: NodeId) -> Result<usize, CoreError> {
    let in_org = node::walk(arena, original, Order::Pre);
    self
      .ops
      .iter()
      .map(|op| match op {
        Op::Delete { index } | Op::Update { index, .. } => {
          Ok(1 + node::num_children(arena, *checked_get(&in_org, *index)?))
        }
        Op::Insert { subtree, .. } => Ok(subtree.len()),
      })
      .sum()
  }
}

fn checked_get(stream: &[NodeId], index: usize) -> Result<&NodeId, CoreError> {
  stream.get(index).ok_or(CoreError::IndexOutOfRange { index, len: stream.len() })
}

fn checked_end(stream: &[NodeId], index: usize, span: usize) -> Result<usize, CoreError> {
  let end = index + span;
  if end > stream.len() {
    return Err(CoreError::IndexOutOfRange { index: end, len: stream.len() });
  }
  Ok(end)
}

fn filter_subtree(arena: &Arena, pairing: &Pairing, deleted: NodeId) -> Pairing {
  let subtree: std::collections::HashSet<NodeId> = node::walk(arena, deleted, Order::Pre).into_iter().collect();
  pairing.iter().filter(|((a, _), _)| !subtree.contains(a)).map(|(&k, &v)| (k, v)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::node::{ConstKind, Node};

  fn assign(arena: &mut Arena, name: &str, literal: &str) -> NodeId {
    let target = arena.alloc(Node::Variable { name: name.into() });
    let value = arena.alloc(Node::Constant { literal: literal.into(), kind: ConstKind::Number });
    arena.alloc(Node::Assign { target, op: "=".into(), value })
  }

  #[test]
  fn update_on_identical_trees_is_empty() {
    let mut arena = Arena::new();
    let a = assign(&mut arena, "x", "1");
    let b = assign(&mut arena, "x", "1");
    let mut pairing = Pairing::new();
    for (x, y) in node::walk(&arena, a, Order::Pre).into_iter().zip(node::walk(&arena, b, Order::Pre)) {
      pairing.insert((x, y), 1.0);
    }
    let script = EditScript::generate(&arena, a, b, &pairing, 0.5);
    assert!(script.is_empty());
  }

  #[test]
  fn update_changes_a_single_constant() {
    let mut arena = Arena::new();
    let a = assign(&mut arena, "x", "1");
    let b = assign(&mut arena, "x", "2");

    let target_a = match arena.get(a) {
      Node::Assign { target, .. } => *target,
      _ => unreachable!(),
    };
    let (target_b, value_a, value_b) = match (arena.get(a).clone(), arena.get(b).clone()) {
      (Node::Assign { target: t2, value: v1, .. }, Node::Assign { value: v2, .. }) => (t2, v1, v2),
      _ => unreachable!(),
    };
    let mut pairing = Pairing::new();
    pairing.insert((a, b), 1.0);
    pairing.insert((target_a, target_b), 1.0);
    pairing.insert((value_a, value_b), 0.5);

    let script = EditScript::generate(&arena, a, b, &pairing, 0.3);
    assert_eq!(script.ops().len(), 1);
    assert!(matches!(script.ops()[0], Op::Update { replacement, .. } if replacement == value_b));

    let rebuilt = script.apply(&mut arena, a).unwrap();
    assert!(node::equals(&arena, rebuilt, b));
  }
}
