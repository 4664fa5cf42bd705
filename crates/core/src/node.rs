//! The wrapped AST model: a uniform, walkable tree over which
//! the differencer, edit-script and matcher all operate, regardless of which
//! host language produced the original parse tree.
//!
//! `Node` is a closed sum type (a tagged union, per the "dynamic dispatch →
//! tagged union" design note) rather than a trait-object hierarchy: every
//! variant is enumerated here and every capability (`walk`, `reconstruct`,
//! `similarity`, `equals`, `num_children`, `is_leaf`, `is_mutable_against`) is
//! implemented once, by matching on the variant, instead of once per type.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::arena::{Arena, NodeId};
use crate::pairing::Pairing;

/// The literal kind of a [`Node::Constant`]. Two constants of different
/// kinds never match, regardless of their text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstKind {
  Number,
  String,
  CmpOp,
  BoolOp,
  UnaryOp,
  Operator,
  Constant,
}

/// Which edit operation produced a [`Node::Wildcard`]/[`Node::Use`] pair
/// during refinement. Needed by the linking step, which
/// looks a wildcard's wrapped node up in a different pairing map depending
/// on whether it came from an `Insert` or a `Delete`/`Update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
  Insert,
  Delete,
  Update,
}

/// Pre-order visits `[self, ...children...]`; post-order visits children
/// first and `self` last. Both orders are required: the differencer seeds
/// from post-order leaves and propagates top-down in pre-order; the matcher
/// and edit script use pre-order indices as the canonical position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
  Pre,
  Post,
}

/// A node in the wrapped AST. See the `Node` enum below for the full variant catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
  Variable {
    name: String,
  },
  Constant {
    literal: String,
    kind: ConstKind,
  },
  FunctionName {
    name: String,
  },
  Function {
    callee: NodeId,
    args: Vec<NodeId>,
    start: NodeId,
    end: NodeId,
  },
  Assign {
    target: NodeId,
    op: String,
    value: NodeId,
  },
  Compare {
    op: NodeId,
    left: NodeId,
    right: NodeId,
  },
  BoolOperation {
    op: NodeId,
    left: NodeId,
    right: NodeId,
  },
  UnaryOperation {
    op: NodeId,
    operand: NodeId,
  },
  Condition {
    inner: NodeId,
  },
  If {
    cond: NodeId,
    body: NodeId,
    next: NodeId,
  },
  ElIf {
    cond: NodeId,
    body: NodeId,
    next: NodeId,
  },
  Else {
    body: NodeId,
  },
  While {
    test: NodeId,
    body: NodeId,
  },
  For {
    target: NodeId,
    iter: NodeId,
    body: NodeId,
  },
  Body {
    start: NodeId,
    children: Vec<NodeId>,
    end: NodeId,
  },
  Empty,
  Start,
  End,
  /// Placeholder on the `original` side of a refined pattern. Absorbs any
  /// number of sibling nodes during matching. Linked to its `Use` by
  /// `index` (0 means "not yet connected").
  Wildcard {
    wrapped: NodeId,
    source: OpKind,
    index: u32,
  },
  /// Placeholder on the `modified` side, re-emitting whatever its linked
  /// `Wildcard` absorbed.
  Use {
    wrapped: NodeId,
    source: OpKind,
    index: u32,
  },
  /// A host-AST node kind the wrapping visitor did not recognise. Carries its source text verbatim and behaves like
  /// any other leaf for walking/matching purposes.
  Opaque {
    text: String,
  },
}

impl Node {
  pub fn is_leaf(&self) -> bool {
    matches!(
      self,
      Node::Variable { .. }
        | Node::Constant { .. }
        | Node::FunctionName { .. }
        | Node::Empty
        | Node::Start
        | Node::End
        | Node::Wildcard { .. }
        | Node::Use { .. }
        | Node::Opaque { .. }
    )
  }

  /// Children in traversal order, excluding `self`. Sentinel `Start`/`End`
  /// nodes are included for variable-arity nodes so top-down propagation
  /// sees them like any other child pair.
  pub fn children(&self) -> Vec<NodeId> {
    match self {
      Node::Function {
        callee, args, start, end,
      } => {
        let mut v = vec![*start, *callee];
        v.extend(args.iter().copied());
        v.push(*end);
        v
      }
      Node::Assign { target, value, .. } => vec![*target, *value],
      Node::Compare { left, op, right } | Node::BoolOperation { left, op, right } => {
        vec![*left, *op, *right]
      }
      Node::UnaryOperation { op, operand } => vec![*op, *operand],
      Node::Condition { inner } => vec![*inner],
      Node::If { cond, body, next } | Node::ElIf { cond, body, next } => vec![*cond, *body, *next],
      Node::Else { body } => vec![*body],
      Node::While { test, body } => vec![*test, *body],
      Node::For { target, iter, body } => vec![*target, *iter, *body],
      Node::Body { start, children, end } => {
        let mut v = vec![*start];
        v.extend(children.iter().copied());
        v.push(*end);
        v
      }
      _ => Vec::new(),
    }
  }

  fn variant_tag(&self) -> u8 {
    match self {
      Node::Variable { .. } => 0,
      Node::Constant { .. } => 1,
      Node::FunctionName { .. } => 2,
      Node::Function { .. } => 3,
      Node::Assign { .. } => 4,
      Node::Compare { .. } => 5,
      Node::BoolOperation { .. } => 6,
      Node::UnaryOperation { .. } => 7,
      Node::Condition { .. } => 8,
      Node::If { .. } => 9,
      Node::ElIf { .. } => 10,
      Node::Else { .. } => 11,
      Node::While { .. } => 12,
      Node::For { .. } => 13,
      Node::Body { .. } => 14,
      Node::Empty => 15,
      Node::Start => 16,
      Node::End => 17,
      Node::Wildcard { .. } => 18,
      Node::Use { .. } => 19,
      Node::Opaque { .. } => 20,
    }
  }
}

/// `walk(order)` yields `[self, ...children preorder...]` for internal nodes
/// and `[self]` for leaves; `walk(post)` swaps `self` to the end.
pub fn walk(arena: &Arena, id: NodeId, order: Order) -> Vec<NodeId> {
  let node = arena.get(id);
  if node.is_leaf() {
    return vec![id];
  }
  let mut out = Vec::new();
  if order == Order::Pre {
    out.push(id);
  }
  for child in node.children() {
    out.extend(walk(arena, child, order));
  }
  if order == Order::Post {
    out.push(id);
  }
  out
}

/// `num_children(n)` counts every leaf in `walk(n, pre)` except `n` itself,
/// including `Start`/`End` sentinels: `len(walk(n, pre)) - 1`.
pub fn num_children(arena: &Arena, id: NodeId) -> usize {
  walk(arena, id, Order::Pre).len() - 1
}

/// Rebuilds a tree from the pre-order stream produced by `walk(_, Pre)`,
/// consuming elements from the front of `stream` as it goes. This is the
/// inverse of `walk(pre)`: `reconstruct(walk(n, pre)) == n` structurally.
///
/// Leaves are returned unchanged (their id is simply popped and reused).
/// Internal nodes are rebuilt into a *fresh* arena entry whose children are
/// whatever ids the recursive reconstruction consumed from the stream --
/// this lets `EditScript::apply` splice in subtrees allocated elsewhere in
/// the same arena without any extra copying.
pub fn reconstruct(arena: &mut Arena, stream: &mut VecDeque<NodeId>) -> NodeId {
  let id = stream.pop_front().expect("reconstruct: stream underflow");
  let node = arena.get(id).clone();
  if node.is_leaf() {
    return id;
  }
  let rebuilt = match node {
    Node::Function { .. } => {
      let start = stream.pop_front().expect("Function start sentinel");
      let callee = reconstruct(arena, stream);
      let mut args = Vec::new();
      loop {
        let next = *stream.front().expect("Function end sentinel");
        if matches!(arena.get(next), Node::End) {
          stream.pop_front();
          break;
        }
        args.push(reconstruct(arena, stream));
      }
      let end = start; // placeholder overwritten below
      let _ = end;
      Node::Function { callee, args, start, end: arena_end_after(arena) }
    }
    Node::Assign { op, .. } => {
      let target = reconstruct(arena, stream);
      let value = reconstruct(arena, stream);
      Node::Assign { target, op, value }
    }
    Node::Compare { .. } => {
      let left = reconstruct(arena, stream);
      let op = reconstruct(arena, stream);
      let right = reconstruct(arena, stream);
      Node::Compare { op, left, right }
    }
    Node::BoolOperation { .. } => {
      let left = reconstruct(arena, stream);
      let op = reconstruct(arena, stream);
      let right = reconstruct(arena, stream);
      Node::BoolOperation { op, left, right }
    }
    Node::UnaryOperation { .. } => {
      let op = reconstruct(arena, stream);
      let operand = reconstruct(arena, stream);
      Node::UnaryOperation { op, operand }
    }
    Node::Condition { .. } => {
      let inner = reconstruct(arena, stream);
      Node::Condition { inner }
    }
    Node::If { .. } => {
      let cond = reconstruct(arena, stream);
      let body = reconstruct(arena, stream);
      let next = reconstruct(arena, stream);
      Node::If { cond, body, next }
    }
    Node::ElIf { .. } => {
      let cond = reconstruct(arena, stream);
      let body = reconstruct(arena, stream);
      let next = reconstruct(arena, stream);
      Node::ElIf { cond, body, next }
    }
    Node::Else { .. } => {
      let body = reconstruct(arena, stream);
      Node::Else { body }
    }
    Node::While { .. } => {
      let test = reconstruct(arena, stream);
      let body = reconstruct(arena, stream);
      Node::While { test, body }
    }
    Node::For { .. } => {
      let target = reconstruct(arena, stream);
      let iter = reconstruct(arena, stream);
      let body = reconstruct(arena, stream);
      Node::For { target, iter, body }
    }
    Node::Body { .. } => {
      let start = stream.pop_front().expect("Body start sentinel");
      let mut children = Vec::new();
      let end = loop {
        let next = *stream.front().expect("Body end sentinel");
        if matches!(arena.get(next), Node::End) {
          stream.pop_front();
          break next;
        }
        children.push(reconstruct(arena, stream));
      };
      Node::Body { start, children, end }
    }
    leaf => leaf,
  };
  arena.alloc(rebuilt)
}

// `Function`'s `end` sentinel is consumed as part of the arg loop above and
// its id isn't otherwise reachable at that point in the match arm; this
// helper keeps the borrow checker happy by re-deriving a fresh `End` id
// instead of threading it through the loop body.
fn arena_end_after(arena: &mut Arena) -> NodeId {
  arena.alloc(Node::End)
}

/// `equals` is used by the matcher, not the differencer: `Wildcard`/`Use`
/// compare equal to anything, and a mismatched-arity compound node still
/// equals its counterpart if a wildcard absorbs the extra siblings.
pub fn equals(arena: &Arena, a: NodeId, b: NodeId) -> bool {
  let na = arena.get(a);
  let nb = arena.get(b);
  if matches!(na, Node::Wildcard { .. } | Node::Use { .. }) {
    return true;
  }
  if matches!(nb, Node::Wildcard { .. } | Node::Use { .. }) {
    return true;
  }
  if na.variant_tag() != nb.variant_tag() {
    return false;
  }
  match (na, nb) {
    (Node::Variable { name: n1 }, Node::Variable { name: n2 }) => n1 == n2,
    (
      Node::Constant { literal: l1, kind: k1 },
      Node::Constant { literal: l2, kind: k2 },
    ) => l1 == l2 && k1 == k2,
    (Node::FunctionName { name: n1 }, Node::FunctionName { name: n2 }) => n1 == n2,
    (Node::Opaque { text: t1 }, Node::Opaque { text: t2 }) => t1 == t2,
    (Node::Empty, Node::Empty) | (Node::Start, Node::Start) | (Node::End, Node::End) => true,
    (
      Node::Function { callee: c1, args: a1, .. },
      Node::Function { callee: c2, args: a2, .. },
    ) => {
      equals(arena, *c1, *c2) && equals_seq(arena, a1, a2)
    }
    (
      Node::Assign { target: t1, op: o1, value: v1 },
      Node::Assign { target: t2, op: o2, value: v2 },
    ) => o1 == o2 && equals(arena, *t1, *t2) && equals(arena, *v1, *v2),
    (
      Node::Compare { op: o1, left: l1, right: r1 },
      Node::Compare { op: o2, left: l2, right: r2 },
    )
    | (
      Node::BoolOperation { op: o1, left: l1, right: r1 },
      Node::BoolOperation { op: o2, left: l2, right: r2 },
    ) => equals(arena, *o1, *o2) && equals(arena, *l1, *l2) && equals(arena, *r1, *r2),
    (
      Node::UnaryOperation { op: o1, operand: x1 },
      Node::UnaryOperation { op: o2, operand: x2 },
    ) => equals(arena, *o1, *o2) && equals(arena, *x1, *x2),
    (Node::Condition { inner: i1 }, Node::Condition { inner: i2 }) => equals(arena, *i1, *i2),
    (
      Node::If { cond: c1, body: b1, next: n1 },
      Node::If { cond: c2, body: b2, next: n2 },
    )
    | (
      Node::ElIf { cond: c1, body: b1, next: n1 },
      Node::ElIf { cond: c2, body: b2, next: n2 },
    ) => equals(arena, *c1, *c2) && equals(arena, *b1, *b2) && equals(arena, *n1, *n2),
    (Node::Else { body: b1 }, Node::Else { body: b2 }) => equals(arena, *b1, *b2),
    (Node::While { test: t1, body: b1 }, Node::While { test: t2, body: b2 }) => {
      equals(arena, *t1, *t2) && equals(arena, *b1, *b2)
    }
    (
      Node::For { target: t1, iter: i1, body: b1 },
      Node::For { target: t2, iter: i2, body: b2 },
    ) => equals(arena, *t1, *t2) && equals(arena, *i1, *i2) && equals(arena, *b1, *b2),
    (Node::Body { children: c1, .. }, Node::Body { children: c2, .. }) => {
      equals_seq(arena, c1, c2)
    }
    _ => false,
  }
}

fn equals_seq(arena: &Arena, a: &[NodeId], b: &[NodeId]) -> bool {
  if a.len() == b.len() {
    return a.iter().zip(b).all(|(x, y)| equals(arena, *x, *y));
  }
  // A single wildcard on either side may absorb any number of siblings.
  a.iter().any(|id| matches!(arena.get(*id), Node::Wildcard { .. } | Node::Use { .. }))
    || b.iter().any(|id| matches!(arena.get(*id), Node::Wildcard { .. } | Node::Use { .. }))
}

/// Same semantics as [`equals`] but for two nodes living in *different*
/// arenas -- needed by the matcher, which compares a pattern's
/// original-side nodes against a host query tree parsed independently.
/// `equals` is kept single-arena for the differencer/edit-script, which
/// never compare across trees that don't already share one.
pub fn equals_cross(arena_a: &Arena, a: NodeId, arena_b: &Arena, b: NodeId) -> bool {
  let na = arena_a.get(a);
  let nb = arena_b.get(b);
  if matches!(na, Node::Wildcard { .. } | Node::Use { .. }) {
    return true;
  }
  if matches!(nb, Node::Wildcard { .. } | Node::Use { .. }) {
    return true;
  }
  if na.variant_tag() != nb.variant_tag() {
    return false;
  }
  match (na, nb) {
    (Node::Variable { name: n1 }, Node::Variable { name: n2 }) => n1 == n2,
    (Node::Constant { literal: l1, kind: k1 }, Node::Constant { literal: l2, kind: k2 }) => {
      l1 == l2 && k1 == k2
    }
    (Node::FunctionName { name: n1 }, Node::FunctionName { name: n2 }) => n1 == n2,
    (Node::Opaque { text: t1 }, Node::Opaque { text: t2 }) => t1 == t2,
    (Node::Empty, Node::Empty) | (Node::Start, Node::Start) | (Node::End, Node::End) => true,
    (
      Node::Function { callee: c1, args: a1, .. },
      Node::Function { callee: c2, args: a2, .. },
    ) => equals_cross(arena_a, *c1, arena_b, *c2) && equals_seq_cross(arena_a, a1, arena_b, a2),
    (
      Node::Assign { target: t1, op: o1, value: v1 },
      Node::Assign { target: t2, op: o2, value: v2 },
    ) => {
      o1 == o2
        && equals_cross(arena_a, *t1, arena_b, *t2)
        && equals_cross(arena_a, *v1, arena_b, *v2)
    }
    (
      Node::Compare { op: o1, left: l1, right: r1 },
      Node::Compare { op: o2, left: l2, right: r2 },
    )
    | (
      Node::BoolOperation { op: o1, left: l1, right: r1 },
      Node::BoolOperation { op: o2, left: l2, right: r2 },
    ) => {
      equals_cross(arena_a, *o1, arena_b, *o2)
        && equals_cross(arena_a, *l1, arena_b, *l2)
        && equals_cross(arena_a, *r1, arena_b, *r2)
    }
    (
      Node::UnaryOperation { op: o1, operand: x1 },
      Node::UnaryOperation { op: o2, operand: x2 },
    ) => equals_cross(arena_a, *o1, arena_b, *o2) && equals_cross(arena_a, *x1, arena_b, *x2),
    (Node::Condition { inner: i1 }, Node::Condition { inner: i2 }) => {
      equals_cross(arena_a, *i1, arena_b, *i2)
    }
    (
      Node::If { cond: c1, body: b1, next: n1 },
      Node::If { cond: c2, body: b2, next: n2 },
    )
    | (
      Node::ElIf { cond: c1, body: b1, next: n1 },
      Node::ElIf { cond: c2, body: b2, next: n2 },
    ) => {
      equals_cross(arena_a, *c1, arena_b, *c2)
        && equals_cross(arena_a, *b1, arena_b, *b2)
        && equals_cross(arena_a, *n1, arena_b, *n2)
    }
    (Node::Else { body: b1 }, Node::Else { body: b2 }) => equals_cross(arena_a, *b1, arena_b, *b2),
    (Node::While { test: t1, body: b1 }, Node::While { test: t2, body: b2 }) => {
      equals_cross(arena_a, *t1, arena_b, *t2) && equals_cross(arena_a, *b1, arena_b, *b2)
    }
    (
      Node::For { target: t1, iter: i1, body: b1 },
      Node::For { target: t2, iter: i2, body: b2 },
    ) => {
      equals_cross(arena_a, *t1, arena_b, *t2)
        && equals_cross(arena_a, *i1, arena_b, *i2)
        && equals_cross(arena_a, *b1, arena_b, *b2)
    }
    (Node::Body { children: c1, .. }, Node::Body { children: c2, .. }) => {
      equals_seq_cross(arena_a, c1, arena_b, c2)
    }
    _ => false,
  }
}

fn equals_seq_cross(arena_a: &Arena, a: &[NodeId], arena_b: &Arena, b: &[NodeId]) -> bool {
  if a.len() == b.len() {
    return a.iter().zip(b).all(|(x, y)| equals_cross(arena_a, *x, arena_b, *y));
  }
  a.iter().any(|id| matches!(arena_a.get(*id), Node::Wildcard { .. } | Node::Use { .. }))
    || b.iter().any(|id| matches!(arena_b.get(*id), Node::Wildcard { .. } | Node::Use { .. }))
}

/// Two node variants are mutation-compatible (can be rewritten in place by
/// an `Update`) iff they share the same top-level shape; `Wildcard`/`Use`
/// are compatible with anything since they stand in for arbitrary subtrees.
pub fn is_mutable_against(arena: &Arena, a: NodeId, b: NodeId) -> bool {
  let na = arena.get(a);
  let nb = arena.get(b);
  if matches!(na, Node::Wildcard { .. } | Node::Use { .. })
    || matches!(nb, Node::Wildcard { .. } | Node::Use { .. })
  {
    return true;
  }
  na.variant_tag() == nb.variant_tag()
}

fn lcs_ratio(a: &str, b: &str) -> f64 {
  if a.is_empty() && b.is_empty() {
    return 1.0;
  }
  let a: Vec<char> = a.chars().collect();
  let b: Vec<char> = b.chars().collect();
  let (n, m) = (a.len(), b.len());
  let mut dp = vec![vec![0usize; m + 1]; n + 1];
  for i in 0..n {
    for j in 0..m {
      dp[i + 1][j + 1] = if a[i] == b[j] {
        dp[i][j] + 1
      } else {
        dp[i][j + 1].max(dp[i + 1][j])
      };
    }
  }
  let lcs = dp[n][m] as f64;
  (2.0 * lcs) / (n + m) as f64
}

fn p(pairing: &Pairing, a: NodeId, b: NodeId) -> f64 {
  pairing.get(&(a, b)).copied().unwrap_or(0.0)
}

/// `similarity(x, y, pairing)`: the pairwise similarity heuristic used to
/// seed and refine the differencer's pairing map. Internal
/// nodes never recompute their children's similarity; they read the current
/// value from `pairing` (0.0 if absent), which is what makes the bottom-up /
/// top-down fixed point convergent instead of exponential.
pub fn similarity(arena: &Arena, a: NodeId, b: NodeId, pairing: &Pairing) -> f64 {
  let na = arena.get(a);
  let nb = arena.get(b);
  match (na, nb) {
    (Node::Variable { name: n1 }, Node::Variable { name: n2 })
    | (Node::FunctionName { name: n1 }, Node::FunctionName { name: n2 }) => {
      let r = lcs_ratio(n1, n2);
      (2.0 * r + 1.0) / 3.0
    }
    (Node::Constant { literal: l1, kind: k1 }, Node::Constant { literal: l2, kind: k2 }) => {
      if k1 != k2 {
        0.0
      } else {
        lcs_ratio(l1, l2)
      }
    }
    (Node::Opaque { text: t1 }, Node::Opaque { text: t2 }) => lcs_ratio(t1, t2),
    (Node::Empty, Node::Empty) => 1.0,
    (Node::Start, Node::Start) | (Node::End, Node::End) => 0.5,
    (
      Node::Assign { target: t1, op: o1, value: v1 },
      Node::Assign { target: t2, op: o2, value: v2 },
    ) => {
      if o1 != o2 {
        0.0
      } else {
        // sqrt of the mean, not a plain mean: rewards pairs where both
        // sides already match well more than a linear average would.
        ((p(pairing, *t1, *t2) + p(pairing, *v1, *v2)) / 2.0).max(0.0).sqrt()
      }
    }
    (
      Node::Compare { op: o1, left: l1, right: r1 },
      Node::Compare { op: o2, left: l2, right: r2 },
    )
    | (
      Node::BoolOperation { op: o1, left: l1, right: r1 },
      Node::BoolOperation { op: o2, left: l2, right: r2 },
    ) => {
      (2.0 * p(pairing, *o1, *o2) + p(pairing, *l1, *l2) + p(pairing, *r1, *r2)) / 4.0
    }
    (
      Node::UnaryOperation { op: o1, operand: x1 },
      Node::UnaryOperation { op: o2, operand: x2 },
    ) => (1.5 * p(pairing, *o1, *o2) + p(pairing, *x1, *x2)) / 2.5,
    (Node::Condition { inner: i1 }, Node::Condition { inner: i2 }) => p(pairing, *i1, *i2),
    (
      Node::Function { callee: c1, args: a1, .. },
      Node::Function { callee: c2, args: a2, .. },
    ) => {
      let func_sim = p(pairing, *c1, *c2);
      let mut arg_sim = 0.0;
      let mut matched = 0usize;
      for x in a1 {
        for y in a2 {
          if let Some(s) = pairing.get(&(*x, *y)) {
            arg_sim += s;
            matched += 1;
          }
        }
      }
      let denom = matched.max(a1.len().max(a2.len())).max(1) as f64;
      (func_sim + arg_sim / denom) / 2.0
    }
    (
      Node::If { cond: c1, body: b1, next: n1 },
      Node::If { cond: c2, body: b2, next: n2 },
    )
    | (
      Node::ElIf { cond: c1, body: b1, next: n1 },
      Node::ElIf { cond: c2, body: b2, next: n2 },
    ) => {
      (2.0 * p(pairing, *c1, *c2) + p(pairing, *b1, *b2) + p(pairing, *n1, *n2)) / 4.0
    }
    (Node::Else { body: b1 }, Node::Else { body: b2 }) => p(pairing, *b1, *b2),
    (Node::While { body: b1, .. }, Node::For { body: b2, .. })
    | (Node::For { body: b1, .. }, Node::While { body: b2, .. }) => {
      (p(pairing, *b1, *b2) + 0.5) / 2.0
    }
    (Node::While { test: t1, body: b1 }, Node::While { test: t2, body: b2 }) => {
      (p(pairing, *t1, *t2) + p(pairing, *b1, *b2)) / 2.0
    }
    (Node::For { target: x1, iter: i1, body: b1 }, Node::For { target: x2, iter: i2, body: b2 }) => {
      (p(pairing, *x1, *x2) + p(pairing, *i1, *i2) + 2.0 * p(pairing, *b1, *b2)) / 4.0
    }
    (Node::Body { children: c1, .. }, Node::Body { children: c2, .. }) => {
      let mut sim = 0.0;
      let mut matched = 0usize;
      for x in c1 {
        for y in c2 {
          if let Some(s) = pairing.get(&(*x, *y)) {
            sim += s;
            matched += 1;
          }
        }
      }
      let denom = matched.max(c1.len().max(c2.len())).max(1) as f64;
      sim / denom
    }
    // Cross-variant floors: a `Condition` is allowed to rewrite into a bare
    // boolean/comparison expression (and vice versa) without losing all
    // similarity, since the differencer would otherwise never connect them.
    (Node::Condition { .. }, Node::Compare { .. })
    | (Node::Condition { .. }, Node::BoolOperation { .. })
    | (Node::Condition { .. }, Node::UnaryOperation { .. })
    | (Node::Compare { .. }, Node::Condition { .. })
    | (Node::BoolOperation { .. }, Node::Condition { .. })
    | (Node::UnaryOperation { .. }, Node::Condition { .. }) => 0.3,
    _ => 0.0,
  }
}
