//! Brings two independently-created [`Pattern`](patterndiff_core::Pattern)s
//! into one shared [`Arena`] so the refiner can diff and splice across them.
//!
//! The arena-of-handles design (see `patterndiff-core::arena`) makes a
//! `NodeId` meaningless outside the `Arena` that allocated it, so crossing
//! from one pattern's arena into another's requires an explicit deep copy
//! first.

use std::collections::HashMap;

use patterndiff_core::{Arena, Node, NodeId};

/// Deep-copies the subtree rooted at `root` (in `src`) into `dst`, returning
/// its new root id. `memo` is shared across repeated calls so a node
/// reachable from more than one root (e.g. both a pattern's `original` and
/// its `pairing` values) is only ever cloned once.
pub(crate) fn clone_subtree(dst: &mut Arena, src: &Arena, root: NodeId, memo: &mut HashMap<NodeId, NodeId>) -> NodeId {
  if let Some(&id) = memo.get(&root) {
    return id;
  }
  let remapped = remap(src.get(root).clone(), dst, src, memo);
  let id = dst.alloc(remapped);
  memo.insert(root, id);
  id
}

fn remap(node: Node, dst: &mut Arena, src: &Arena, memo: &mut HashMap<NodeId, NodeId>) -> Node {
  let mut go = |id: NodeId| clone_subtree(dst, src, id, memo);
  match node {
    Node::Variable { name } => Node::Variable { name },
    Node::Constant { literal, kind } => Node::Constant { literal, kind },
    Node::FunctionName { name } => Node::FunctionName { name },
    Node::Function { callee, args, start, end } => Node::Function {
      callee: go(callee),
      args: args.into_iter().map(&mut go).collect(),
      start: go(start),
      end: go(end),
    },
    Node::Assign { target, op, value } => Node::Assign { target: go(target), op, value: go(value) },
    Node::Compare { op, left, right } => Node::Compare { op: go(op), left: go(left), right: go(right) },
    Node::BoolOperation { op, left, right } => Node::BoolOperation { op: go(op), left: go(left), right: go(right) },
    Node::UnaryOperation { op, operand } => Node::UnaryOperation { op: go(op), operand: go(operand) },
    Node::Condition { inner } => Node::Condition { inner: go(inner) },
    Node::If { cond, body, next } => Node::If { cond: go(cond), body: go(body), next: go(next) },
    Node::ElIf { cond, body, next } => Node::ElIf { cond: go(cond), body: go(body), next: go(next) },
    Node::Else { body } => Node::Else { body: go(body) },
    Node::While { test, body } => Node::While { test: go(test), body: go(body) },
    Node::For { target, iter, body } => Node::For { target: go(target), iter: go(iter), body: go(body) },
    Node::Body { start, children, end } => Node::Body {
      start: go(start),
      children: children.into_iter().map(&mut go).collect(),
      end: go(end),
    },
    Node::Empty => Node::Empty,
    Node::Start => Node::Start,
    Node::End => Node::End,
    Node::Wildcard { wrapped, source, index } => Node::Wildcard { wrapped: go(wrapped), source, index },
    Node::Use { wrapped, source, index } => Node::Use { wrapped: go(wrapped), source, index },
    Node::Opaque { text } => Node::Opaque { text },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use patterndiff_core::ConstKind;

  #[test]
  fn clones_a_subtree_with_fresh_ids_but_identical_shape() {
    let mut src = Arena::new();
    let target = src.alloc(Node::Variable { name: "x".into() });
    let value = src.alloc(Node::Constant { literal: "1".into(), kind: ConstKind::Number });
    let assign = src.alloc(Node::Assign { target, op: "=".into(), value });

    let mut dst = Arena::new();
    let mut memo = HashMap::new();
    let cloned = clone_subtree(&mut dst, &src, assign, &mut memo);

    assert!(patterndiff_core::node::equals(&dst, cloned, cloned));
    match dst.get(cloned) {
      Node::Assign { .. } => {}
      other => panic!("expected Assign, got {other:?}"),
    }
  }
}
