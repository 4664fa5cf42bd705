//! Python host-AST wrapper: the one concrete [`patterndiff_core::SourceParser`]
//! implementation in this workspace, turning `tree-sitter-python` parse
//! trees into the language-independent Node Model.
//!
//! One `visit_*` match arm per syntax construct the `Node` model
//! distinguishes; anything tree-sitter hands back that has no arm here
//! becomes a [`patterndiff_core::Node::Opaque`] leaf rather than a hard
//! failure.

mod error;
mod render;

pub use error::LangError;
pub use render::PythonRenderer;

use std::collections::HashMap;

use patterndiff_core::{Arena, CoreError, HostDocument, LineSpan, Node, NodeId, SourceParser};
use tree_sitter::{Node as TsNode, Parser};

/// Implements [`SourceParser`] for Python source text. Stateless: every call
/// builds a fresh `tree-sitter` parser, matching `ast.parse` being called
/// fresh per text in `pattern_creation.py`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonParser;

impl SourceParser for PythonParser {
  fn parse(&self, arena: &mut Arena, text: &str) -> Result<NodeId, CoreError> {
    let mut lines = HashMap::new();
    wrap_into(arena, text, &mut lines).map_err(|e| CoreError::Parse(e.to_string()))
  }
}

/// Parses `text` into a standalone [`HostDocument`] -- its own arena, the
/// root node, and a line-span per node -- for the matcher to scan. Unlike
/// [`PythonParser::parse`] (which writes into a caller-shared
/// arena so an original/modified pair lands in one [`Arena`]), a query
/// document never needs to share an arena with anything else.
pub fn parse_document(text: &str) -> Result<(HostDocument, NodeId), LangError> {
  let mut arena = Arena::new();
  let mut lines = HashMap::new();
  let root = wrap_into(&mut arena, text, &mut lines)?;
  let mut doc = HostDocument::new(arena, text.to_string());
  doc.lines = lines;
  Ok((doc, root))
}

fn make_parser() -> Result<Parser, LangError> {
  let mut parser = Parser::new();
  let language = tree_sitter_python::LANGUAGE.into();
  parser
    .set_language(&language)
    .map_err(|e| LangError::Parse(format!("failed to load python grammar: {e}")))?;
  Ok(parser)
}

fn wrap_into(
  arena: &mut Arena,
  text: &str,
  lines: &mut HashMap<NodeId, LineSpan>,
) -> Result<NodeId, LangError> {
  let mut parser = make_parser()?;
  let tree = parser
    .parse(text, None)
    .ok_or_else(|| LangError::Parse("tree-sitter returned no tree".into()))?;
  let root = tree.root_node();
  if root.has_error() {
    return Err(LangError::Parse(format!(
      "syntax error in source (row {}, col {})",
      root.end_position().row,
      root.end_position().column
    )));
  }
  let src = text.as_bytes();
  Ok(wrap_module(root, src, arena, lines))
}

fn record(node: &TsNode, id: NodeId, lines: &mut HashMap<NodeId, LineSpan>) {
  lines.insert(
    id,
    LineSpan {
      start_line: node.start_position().row + 1,
      end_line: node.end_position().row + 1,
    },
  );
}

fn text_of<'a>(node: TsNode, src: &'a [u8]) -> &'a str {
  node.utf8_text(src).unwrap_or("")
}

fn named_statements<'a>(node: TsNode<'a>) -> Vec<TsNode<'a>> {
  let mut cursor = node.walk();
  node
    .named_children(&mut cursor)
    .filter(|c| c.kind() != "comment")
    .collect()
}

fn wrap_module(
  module: TsNode,
  src: &[u8],
  arena: &mut Arena,
  lines: &mut HashMap<NodeId, LineSpan>,
) -> NodeId {
  wrap_block_like(module, src, arena, lines)
}

/// Wraps a `module` or `block` node into a [`Node::Body`]: `Start`/`End`
/// sentinels around each statement, matching `AstWrapper.visit_Module`'s
/// list-of-children shape.
fn wrap_block_like(
  block: TsNode,
  src: &[u8],
  arena: &mut Arena,
  lines: &mut HashMap<NodeId, LineSpan>,
) -> NodeId {
  let start = arena.alloc(Node::Start);
  let children = named_statements(block)
    .into_iter()
    .map(|stmt| wrap(stmt, src, arena, lines))
    .collect();
  let end = arena.alloc(Node::End);
  let id = arena.alloc(Node::Body { start, children, end });
  record(&block, id, lines);
  id
}

/// Wraps a single statement or expression node. Mirrors one `visit_*` arm
/// of `AstWrapper` per match branch; anything unrecognised becomes an
/// opaque leaf carrying its source text verbatim.
fn wrap(node: TsNode, src: &[u8], arena: &mut Arena, lines: &mut HashMap<NodeId, LineSpan>) -> NodeId {
  let id = match node.kind() {
    "expression_statement" => {
      let mut cursor = node.walk();
      if let Some(inner) = node.named_children(&mut cursor).next() {
        return wrap(inner, src, arena, lines);
      }
      arena.alloc(Node::Opaque { text: text_of(node, src).to_string() })
    }
    "identifier" => arena.alloc(Node::Variable { name: text_of(node, src).to_string() }),
    "integer" | "float" => {
      arena.alloc(Node::Constant { literal: text_of(node, src).to_string(), kind: patterndiff_core::ConstKind::Number })
    }
    "string" => {
      arena.alloc(Node::Constant { literal: text_of(node, src).to_string(), kind: patterndiff_core::ConstKind::String })
    }
    "true" | "false" | "none" => arena.alloc(Node::Constant {
      literal: text_of(node, src).to_string(),
      kind: patterndiff_core::ConstKind::Constant,
    }),
    "call" => wrap_call(node, src, arena, lines),
    "comparison_operator" => wrap_compare(node, src, arena, lines),
    "boolean_operator" => wrap_bool_op(node, src, arena, lines),
    "not_operator" => wrap_not(node, src, arena, lines),
    "unary_operator" => wrap_unary(node, src, arena, lines),
    "assignment" => wrap_assign(node, src, arena, lines),
    "augmented_assignment" => wrap_aug_assign(node, src, arena, lines),
    "if_statement" => wrap_if(node, src, arena, lines),
    "while_statement" => wrap_while(node, src, arena, lines),
    "for_statement" => wrap_for(node, src, arena, lines),
    "block" => return wrap_block_like(node, src, arena, lines),
    "parenthesized_expression" => {
      let mut cursor = node.walk();
      if let Some(inner) = node.named_children(&mut cursor).next() {
        return wrap(inner, src, arena, lines);
      }
      arena.alloc(Node::Opaque { text: text_of(node, src).to_string() })
    }
    _ => {
      tracing::debug!(kind = node.kind(), "unrecognised python node, wrapping as opaque");
      arena.alloc(Node::Opaque { text: text_of(node, src).to_string() })
    }
  };
  record(&node, id, lines);
  id
}

fn wrap_call(node: TsNode, src: &[u8], arena: &mut Arena, lines: &mut HashMap<NodeId, LineSpan>) -> NodeId {
  let func = node.child_by_field_name("function");
  let name = func.map(|f| text_of(f, src).to_string()).unwrap_or_default();
  let callee = arena.alloc(Node::FunctionName { name });
  let start = arena.alloc(Node::Start);
  let args = node
    .child_by_field_name("arguments")
    .map(|list| {
      let mut cursor = list.walk();
      list
        .named_children(&mut cursor)
        .map(|a| wrap(a, src, arena, lines))
        .collect()
    })
    .unwrap_or_default();
  let end = arena.alloc(Node::End);
  arena.alloc(Node::Function { callee, args, start, end })
}

fn operator_token<'a>(node: TsNode<'a>, src: &'a [u8]) -> &'a str {
  let mut cursor = node.walk();
  for child in node.children(&mut cursor) {
    if !child.is_named() {
      return text_of(child, src);
    }
  }
  ""
}

fn wrap_compare(node: TsNode, src: &[u8], arena: &mut Arena, lines: &mut HashMap<NodeId, LineSpan>) -> NodeId {
  let left = node.child(0).map(|n| wrap(n, src, arena, lines));
  let right = node.child(node.child_count().saturating_sub(1)).map(|n| wrap(n, src, arena, lines));
  let op_text = operator_token(node, src);
  let op = arena.alloc(Node::Constant { literal: op_text.to_string(), kind: patterndiff_core::ConstKind::CmpOp });
  let left = left.unwrap_or(op);
  let right = right.unwrap_or(op);
  arena.alloc(Node::Compare { op, left, right })
}

fn wrap_bool_op(node: TsNode, src: &[u8], arena: &mut Arena, lines: &mut HashMap<NodeId, LineSpan>) -> NodeId {
  let left_node = node.child_by_field_name("left");
  let right_node = node.child_by_field_name("right");
  let op_text = node
    .child_by_field_name("operator")
    .map(|n| text_of(n, src).to_string())
    .unwrap_or_else(|| operator_token(node, src).to_string());
  let op = arena.alloc(Node::Constant { literal: format!(" {op_text} "), kind: patterndiff_core::ConstKind::BoolOp });
  let left = left_node.map(|n| wrap(n, src, arena, lines)).unwrap_or(op);
  let right = right_node.map(|n| wrap(n, src, arena, lines)).unwrap_or(op);
  arena.alloc(Node::BoolOperation { op, left, right })
}

fn wrap_not(node: TsNode, src: &[u8], arena: &mut Arena, lines: &mut HashMap<NodeId, LineSpan>) -> NodeId {
  let operand = node
    .child_by_field_name("argument")
    .or_else(|| node.named_child(0))
    .map(|n| wrap(n, src, arena, lines));
  let op = arena.alloc(Node::Constant { literal: " not ".to_string(), kind: patterndiff_core::ConstKind::UnaryOp });
  let operand = operand.unwrap_or(op);
  arena.alloc(Node::UnaryOperation { op, operand })
}

fn wrap_unary(node: TsNode, src: &[u8], arena: &mut Arena, lines: &mut HashMap<NodeId, LineSpan>) -> NodeId {
  let operand = node
    .child_by_field_name("argument")
    .or_else(|| node.named_child(0))
    .map(|n| wrap(n, src, arena, lines));
  let op_text = operator_token(node, src);
  let op = arena.alloc(Node::Constant { literal: op_text.to_string(), kind: patterndiff_core::ConstKind::Operator });
  let operand = operand.unwrap_or(op);
  arena.alloc(Node::UnaryOperation { op, operand })
}

fn wrap_assign(node: TsNode, src: &[u8], arena: &mut Arena, lines: &mut HashMap<NodeId, LineSpan>) -> NodeId {
  let target_node = node.child_by_field_name("left");
  let value_node = node.child_by_field_name("right");
  let target = target_node.map(|n| wrap(n, src, arena, lines));
  let value = value_node.map(|n| wrap(n, src, arena, lines));
  let fallback = arena.alloc(Node::Empty);
  let target = target.unwrap_or(fallback);
  let value = value.unwrap_or(fallback);
  arena.alloc(Node::Assign { target, op: "=".to_string(), value })
}

fn wrap_aug_assign(node: TsNode, src: &[u8], arena: &mut Arena, lines: &mut HashMap<NodeId, LineSpan>) -> NodeId {
  let target_node = node.child_by_field_name("left");
  let value_node = node.child_by_field_name("right");
  let op_text = node
    .child_by_field_name("operator")
    .map(|n| text_of(n, src).to_string())
    .unwrap_or_else(|| "=".to_string());
  let target = target_node.map(|n| wrap(n, src, arena, lines));
  let value = value_node.map(|n| wrap(n, src, arena, lines));
  let fallback = arena.alloc(Node::Empty);
  let target = target.unwrap_or(fallback);
  let value = value.unwrap_or(fallback);
  arena.alloc(Node::Assign { target, op: op_text, value })
}

fn wrap_if(node: TsNode, src: &[u8], arena: &mut Arena, lines: &mut HashMap<NodeId, LineSpan>) -> NodeId {
  let test = node.child_by_field_name("condition").map(|n| wrap(n, src, arena, lines));
  let test = test.unwrap_or_else(|| arena.alloc(Node::Empty));
  let cond = arena.alloc(Node::Condition { inner: test });
  let body = node
    .child_by_field_name("consequence")
    .map(|n| wrap_block_like(n, src, arena, lines))
    .unwrap_or_else(|| wrap_block_like(node, src, arena, lines));

  let mut cursor = node.walk();
  let alternatives: Vec<TsNode> = node.children_by_field_name("alternative", &mut cursor).collect();
  let next = wrap_if_chain(&alternatives, 0, src, arena, lines);
  arena.alloc(Node::If { cond, body, next })
}

fn wrap_if_chain(
  alts: &[TsNode],
  index: usize,
  src: &[u8],
  arena: &mut Arena,
  lines: &mut HashMap<NodeId, LineSpan>,
) -> NodeId {
  let Some(alt) = alts.get(index) else {
    return arena.alloc(Node::Empty);
  };
  match alt.kind() {
    "elif_clause" => {
      let test = alt.child_by_field_name("condition").map(|n| wrap(n, src, arena, lines));
      let test = test.unwrap_or_else(|| arena.alloc(Node::Empty));
      let cond = arena.alloc(Node::Condition { inner: test });
      let body = alt
        .child_by_field_name("consequence")
        .map(|n| wrap_block_like(n, src, arena, lines))
        .unwrap_or_else(|| wrap_block_like(*alt, src, arena, lines));
      let next = wrap_if_chain(alts, index + 1, src, arena, lines);
      arena.alloc(Node::ElIf { cond, body, next })
    }
    "else_clause" => {
      let body = alt
        .child_by_field_name("body")
        .map(|n| wrap_block_like(n, src, arena, lines))
        .unwrap_or_else(|| wrap_block_like(*alt, src, arena, lines));
      arena.alloc(Node::Else { body })
    }
    _ => arena.alloc(Node::Empty),
  }
}

fn wrap_while(node: TsNode, src: &[u8], arena: &mut Arena, lines: &mut HashMap<NodeId, LineSpan>) -> NodeId {
  let test = node.child_by_field_name("condition").map(|n| wrap(n, src, arena, lines));
  let test = test.unwrap_or_else(|| arena.alloc(Node::Empty));
  let body = node
    .child_by_field_name("body")
    .map(|n| wrap_block_like(n, src, arena, lines))
    .unwrap_or_else(|| wrap_block_like(node, src, arena, lines));
  arena.alloc(Node::While { test, body })
}

fn wrap_for(node: TsNode, src: &[u8], arena: &mut Arena, lines: &mut HashMap<NodeId, LineSpan>) -> NodeId {
  let target = node.child_by_field_name("left").map(|n| wrap(n, src, arena, lines));
  let iter = node.child_by_field_name("right").map(|n| wrap(n, src, arena, lines));
  let fallback = arena.alloc(Node::Empty);
  let target = target.unwrap_or(fallback);
  let iter = iter.unwrap_or(fallback);
  let body = node
    .child_by_field_name("body")
    .map(|n| wrap_block_like(n, src, arena, lines))
    .unwrap_or_else(|| wrap_block_like(node, src, arena, lines));
  arena.alloc(Node::For { target, iter, body })
}

#[cfg(test)]
mod tests {
  use super::*;
  use patterndiff_core::{node, Order};

  #[test]
  fn wraps_a_simple_call_into_a_body_of_one_function() {
    let mut arena = Arena::new();
    let parser = PythonParser;
    let root = parser.parse(&mut arena, "foo(1)\n").unwrap();
    match arena.get(root) {
      Node::Body { children, .. } => {
        assert_eq!(children.len(), 1);
        assert!(matches!(arena.get(children[0]), Node::Function { .. }));
      }
      other => panic!("expected Body, got {other:?}"),
    }
  }

  #[test]
  fn wraps_an_if_statement_with_condition_and_body() {
    let mut arena = Arena::new();
    let parser = PythonParser;
    let root = parser.parse(&mut arena, "if x > 10:\n    f(x)\n").unwrap();
    let Node::Body { children, .. } = arena.get(root) else { panic!("expected body") };
    assert_eq!(children.len(), 1);
    match arena.get(children[0]) {
      Node::If { cond, next, .. } => {
        assert!(matches!(arena.get(*cond), Node::Condition { .. }));
        assert!(matches!(arena.get(*next), Node::Empty));
      }
      other => panic!("expected If, got {other:?}"),
    }
  }

  #[test]
  fn parse_document_tracks_line_spans() {
    let (doc, root) = parse_document("x = 1\ny = 2\n").unwrap();
    let stream = node::walk(&doc.arena, root, Order::Pre);
    assert!(stream.iter().any(|id| doc.line_span(*id).is_some()));
  }

  #[test]
  fn rejects_invalid_syntax() {
    let mut arena = Arena::new();
    let parser = PythonParser;
    assert!(parser.parse(&mut arena, "def (:\n").is_err());
  }
}
