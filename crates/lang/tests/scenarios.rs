//! The same named scenarios as `patterndiff-core/tests/scenarios.rs`, this
//! time driven through real Python source via `tree-sitter-python` rather
//! than hand-built trees.

use patterndiff_core::{node, Arena, ConstKind, Differencer, EditScript, Node, Op, Order, Pattern, Recommender};
use patterndiff_lang::{parse_document, PythonParser};

#[test]
fn insert_at_leaf_produces_a_single_insert() {
  let differencer = Differencer::new(0.1, 20);
  let parser = PythonParser;
  let pattern = Pattern::create(&parser, &differencer, "x = 1\n", "x = 1\ny = 2\n").unwrap();

  let script = EditScript::generate(&pattern.arena, pattern.original, pattern.modified, &pattern.pairing, 0.5);
  assert_eq!(script.ops().len(), 1);
  assert!(matches!(script.ops()[0], Op::Insert { .. }));

  let mut arena = pattern.arena.clone();
  let rebuilt = script.apply(&mut arena, pattern.original).unwrap();
  assert!(node::equals(&arena, rebuilt, pattern.modified));
}

#[test]
fn leaf_update_replaces_a_single_constant() {
  let differencer = Differencer::new(0.1, 20);
  let parser = PythonParser;
  let pattern = Pattern::create(
    &parser,
    &differencer,
    "if x > 10:\n    f(x)\n",
    "if x > 20:\n    f(x)\n",
  )
  .unwrap();

  let script = EditScript::generate(&pattern.arena, pattern.original, pattern.modified, &pattern.pairing, 0.3);
  assert_eq!(script.ops().len(), 1);
  match &script.ops()[0] {
    Op::Update { replacement, .. } => {
      assert!(matches!(
        pattern.arena.get(*replacement),
        Node::Constant { literal, kind: ConstKind::Number } if literal == "20"
      ));
    }
    other => panic!("expected a single Update, got {other:?}"),
  }
}

#[test]
fn variable_rename_across_a_call_pairs_the_callee_exactly() {
  let differencer = Differencer::new(0.1, 20);
  let parser = PythonParser;
  let pattern = Pattern::create(&parser, &differencer, "a = compute(b)\n", "c = compute(b)\n").unwrap();

  let (callee1, callee2) = {
    let Node::Assign { value: v1, .. } = pattern.arena.get(pattern.original) else { panic!("expected Assign") };
    let Node::Assign { value: v2, .. } = pattern.arena.get(pattern.modified) else { panic!("expected Assign") };
    let Node::Function { callee: c1, .. } = pattern.arena.get(*v1) else { panic!("expected Function") };
    let Node::Function { callee: c2, .. } = pattern.arena.get(*v2) else { panic!("expected Function") };
    (*c1, *c2)
  };
  assert_eq!(pattern.pairing.get(&(callee1, callee2)), Some(&1.0));
}

#[test]
fn wildcard_pattern_matches_and_binds_the_full_subtree() {
  // Hand-build a refined pattern: If(Wildcard[1] absorbing a Compare, body foo()).
  let mut arena = Arena::new();
  let compare_placeholder = arena.alloc(Node::Empty);
  let wildcard = arena.alloc(Node::Wildcard {
    wrapped: compare_placeholder,
    source: patterndiff_core::OpKind::Update,
    index: 1,
  });
  let cond = arena.alloc(Node::Condition { inner: wildcard });
  let callee = arena.alloc(Node::FunctionName { name: "foo".into() });
  let call_start = arena.alloc(Node::Start);
  let call_end = arena.alloc(Node::End);
  let call = arena.alloc(Node::Function { callee, args: Vec::new(), start: call_start, end: call_end });
  let body_start = arena.alloc(Node::Start);
  let body_end = arena.alloc(Node::End);
  let body = arena.alloc(Node::Body { start: body_start, children: vec![call], end: body_end });
  let next = arena.alloc(Node::Empty);
  let original = arena.alloc(Node::If { cond, body, next });
  let modified = arena.alloc(Node::Empty);

  let pattern = Pattern { arena, original, modified, pairing: patterndiff_core::Pairing::new() };

  let (doc, root) = parse_document("if (x>10) and (y<20):\n    foo()\n").unwrap();
  let mut recommender = Recommender::new(&doc, root);
  recommender.subscribe(&pattern);
  let hits = recommender.run();

  assert_eq!(hits.len(), 1);
  let bound: Vec<_> = hits[0].blocks.iter().collect();
  assert_eq!(bound.len(), 1);
  let (index, captured) = bound[0];
  assert_eq!(index, 1);
  assert_eq!(captured.len(), 1);
  assert!(matches!(doc.arena.get(captured[0]), Node::BoolOperation { .. }));
}

#[test]
fn matcher_rejects_a_function_when_the_pattern_expects_an_if() {
  let mut pattern_arena = Arena::new();
  let cond_inner = pattern_arena.alloc(Node::Empty);
  let cond = pattern_arena.alloc(Node::Condition { inner: cond_inner });
  let body_start = pattern_arena.alloc(Node::Start);
  let body_end = pattern_arena.alloc(Node::End);
  let body = pattern_arena.alloc(Node::Body { start: body_start, children: Vec::new(), end: body_end });
  let next = pattern_arena.alloc(Node::Empty);
  let original = pattern_arena.alloc(Node::If { cond, body, next });
  let modified = pattern_arena.alloc(Node::Empty);
  let pattern = Pattern { arena: pattern_arena, original, modified, pairing: patterndiff_core::Pairing::new() };

  let (doc, root) = parse_document("foo()\n").unwrap();
  let mut recommender = Recommender::new(&doc, root);
  recommender.subscribe(&pattern);
  let hits = recommender.run();
  assert!(hits.is_empty());
}
