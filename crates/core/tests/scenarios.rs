//! The named scenarios structural correctness is pinned against, built on
//! hand-constructed trees (this crate never parses source text itself --
//! see `patterndiff-lang/tests` for the same scenarios driven through real
//! Python source).

use patterndiff_core::{
  node, Arena, ConstKind, Differencer, EditScript, Node, NodeId, Op, Order,
};

fn assign(arena: &mut Arena, name: &str, literal: &str) -> NodeId {
  let target = arena.alloc(Node::Variable { name: name.into() });
  let value = arena.alloc(Node::Constant { literal: literal.into(), kind: ConstKind::Number });
  arena.alloc(Node::Assign { target, op: "=".into(), value })
}

fn body(arena: &mut Arena, children: Vec<NodeId>) -> NodeId {
  let start = arena.alloc(Node::Start);
  let end = arena.alloc(Node::End);
  arena.alloc(Node::Body { start, children, end })
}

fn call(arena: &mut Arena, name: &str, args: Vec<NodeId>) -> NodeId {
  let callee = arena.alloc(Node::FunctionName { name: name.into() });
  let start = arena.alloc(Node::Start);
  let end = arena.alloc(Node::End);
  arena.alloc(Node::Function { callee, args, start, end })
}

fn compare(arena: &mut Arena, left: NodeId, op_text: &str, right: NodeId) -> NodeId {
  let op = arena.alloc(Node::Constant { literal: op_text.into(), kind: ConstKind::CmpOp });
  arena.alloc(Node::Compare { op, left, right })
}

#[test]
fn insert_at_leaf_produces_a_single_insert() {
  // Original: x = 1
  // Modified: x = 1; y = 2
  let mut arena = Arena::new();
  let x1 = assign(&mut arena, "x", "1");
  let original = body(&mut arena, vec![x1]);

  let x1b = assign(&mut arena, "x", "1");
  let y2 = assign(&mut arena, "y", "2");
  let modified = body(&mut arena, vec![x1b, y2]);

  let differencer = Differencer::new(0.1, 20);
  let pairing = differencer.connect_nodes(&arena, original, modified);
  let script = EditScript::generate(&arena, original, modified, &pairing, 0.5);

  let inserts: Vec<_> = script.ops().iter().filter(|op| matches!(op, Op::Insert { .. })).collect();
  assert_eq!(script.ops().len(), 1, "expected exactly one op, got {:?}", script.ops());
  assert_eq!(inserts.len(), 1);

  let rebuilt = script.apply(&mut arena, original).unwrap();
  assert!(node::equals(&arena, rebuilt, modified));
}

#[test]
fn leaf_update_replaces_a_single_constant() {
  // Original: if x > 10: f(x)
  // Modified: if x > 20: f(x)
  let mut arena = Arena::new();

  let x1 = arena.alloc(Node::Variable { name: "x".into() });
  let ten = arena.alloc(Node::Constant { literal: "10".into(), kind: ConstKind::Number });
  let cmp1 = compare(&mut arena, x1, ">", ten);
  let cond1 = arena.alloc(Node::Condition { inner: cmp1 });
  let arg1 = arena.alloc(Node::Variable { name: "x".into() });
  let fcall1 = call(&mut arena, "f", vec![arg1]);
  let body1 = body(&mut arena, vec![fcall1]);
  let next1 = arena.alloc(Node::Empty);
  let original = arena.alloc(Node::If { cond: cond1, body: body1, next: next1 });

  let x2 = arena.alloc(Node::Variable { name: "x".into() });
  let twenty = arena.alloc(Node::Constant { literal: "20".into(), kind: ConstKind::Number });
  let cmp2 = compare(&mut arena, x2, ">", twenty);
  let cond2 = arena.alloc(Node::Condition { inner: cmp2 });
  let arg2 = arena.alloc(Node::Variable { name: "x".into() });
  let fcall2 = call(&mut arena, "f", vec![arg2]);
  let body2 = body(&mut arena, vec![fcall2]);
  let next2 = arena.alloc(Node::Empty);
  let modified = arena.alloc(Node::If { cond: cond2, body: body2, next: next2 });

  let differencer = Differencer::new(0.1, 20);
  let pairing = differencer.connect_nodes(&arena, original, modified);
  let script = EditScript::generate(&arena, original, modified, &pairing, 0.3);

  assert_eq!(script.ops().len(), 1);
  match &script.ops()[0] {
    Op::Update { replacement, .. } => {
      assert!(matches!(
        arena.get(*replacement),
        Node::Constant { literal, kind: ConstKind::Number } if literal == "20"
      ));
    }
    other => panic!("expected a single Update, got {other:?}"),
  }

  let rebuilt = script.apply(&mut arena, original).unwrap();
  assert!(node::equals(&arena, rebuilt, modified));
}

#[test]
fn variable_rename_across_a_call_pairs_the_callee_at_full_similarity() {
  // Original: a = compute(b)
  // Modified: c = compute(b)
  let mut arena = Arena::new();

  let a = arena.alloc(Node::Variable { name: "a".into() });
  let arg1 = arena.alloc(Node::Variable { name: "b".into() });
  let call1 = call(&mut arena, "compute", vec![arg1]);
  let original = arena.alloc(Node::Assign { target: a, op: "=".into(), value: call1 });

  let c = arena.alloc(Node::Variable { name: "c".into() });
  let arg2 = arena.alloc(Node::Variable { name: "b".into() });
  let call2 = call(&mut arena, "compute", vec![arg2]);
  let modified = arena.alloc(Node::Assign { target: c, op: "=".into(), value: call2 });

  let differencer = Differencer::new(0.1, 20);
  let pairing = differencer.connect_nodes(&arena, original, modified);

  let callee1 = match arena.get(call1) {
    Node::Function { callee, .. } => *callee,
    _ => unreachable!(),
  };
  let callee2 = match arena.get(call2) {
    Node::Function { callee, .. } => *callee,
    _ => unreachable!(),
  };
  assert_eq!(pairing.get(&(callee1, callee2)), Some(&1.0));

  let script = EditScript::generate(&arena, original, modified, &pairing, 0.3);
  let updates: Vec<_> = script
    .ops()
    .iter()
    .filter_map(|op| match op {
      Op::Update { index, replacement } => Some((*index, *replacement)),
      _ => None,
    })
    .collect();
  assert_eq!(updates.len(), 1);
  let (_, replacement) = updates[0];
  assert!(matches!(arena.get(replacement), Node::Variable { name } if name == "c"));

  let rebuilt = script.apply(&mut arena, original).unwrap();
  assert!(node::equals(&arena, rebuilt, modified));
}

#[test]
fn walk_post_and_pre_agree_on_node_count() {
  let mut arena = Arena::new();
  let a = assign(&mut arena, "x", "1");
  let b = assign(&mut arena, "y", "2");
  let root = body(&mut arena, vec![a, b]);
  assert_eq!(
    node::walk(&arena, root, Order::Pre).len(),
    node::walk(&arena, root, Order::Post).len()
  );
}
