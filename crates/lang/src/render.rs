//! Turns a wrapped [`Node`] subtree back into Python-ish source text, so a
//! pattern or a matched subtree can be rendered as readable code instead of
//! a raw tree dump. One recursive function handles every variant, matching
//! this crate's `wrap`/`visit_*` split on the parsing side.
//!
//! This is best-effort unparsing, not a byte-exact reprint of whatever text
//! originally produced the tree: indentation and parenthesisation are
//! synthesised fresh. That is sufficient for the emitters in
//! `patterndiff-store`, which only need a readable rendering of a matched
//! pattern's `modified` side.

use patterndiff_core::{Arena, Node, NodeId};
use patterndiff_store::Renderer;

/// The concrete [`Renderer`] for this crate's Python wrapping visitor.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonRenderer;

impl Renderer for PythonRenderer {
  fn render(&self, arena: &Arena, node: NodeId, resolve_use: &dyn Fn(u32) -> Option<String>) -> String {
    render_node(arena, node, resolve_use, 0)
  }
}

fn indent(level: usize) -> String {
  "    ".repeat(level)
}

fn render_node(arena: &Arena, id: NodeId, resolve_use: &dyn Fn(u32) -> Option<String>, level: usize) -> String {
  match arena.get(id) {
    Node::Variable { name } => name.clone(),
    Node::Constant { literal, .. } => literal.clone(),
    Node::FunctionName { name } => name.clone(),
    Node::Function { callee, args, .. } => {
      let callee_text = render_node(arena, *callee, resolve_use, level);
      let args_text: Vec<String> = args.iter().map(|&a| render_node(arena, a, resolve_use, level)).collect();
      format!("{callee_text}({})", args_text.join(", "))
    }
    Node::Assign { target, op, value } => {
      format!(
        "{} {} {}",
        render_node(arena, *target, resolve_use, level),
        op,
        render_node(arena, *value, resolve_use, level)
      )
    }
    Node::Compare { op, left, right } => {
      format!(
        "{} {} {}",
        render_node(arena, *left, resolve_use, level),
        render_node(arena, *op, resolve_use, level),
        render_node(arena, *right, resolve_use, level)
      )
    }
    // `op`'s literal already carries its surrounding spaces (wrapped as
    // `" and "`/`" or "`), so no extra spacing is added here.
    Node::BoolOperation { op, left, right } => {
      format!(
        "{}{}{}",
        render_node(arena, *left, resolve_use, level),
        render_node(arena, *op, resolve_use, level),
        render_node(arena, *right, resolve_use, level)
      )
    }
    Node::UnaryOperation { op, operand } => {
      format!("{}{}", render_node(arena, *op, resolve_use, level), render_node(arena, *operand, resolve_use, level))
    }
    Node::Condition { inner } => render_node(arena, *inner, resolve_use, level),
    Node::If { cond, body, next } => {
      let mut out = format!(
        "if {}:\n{}",
        render_node(arena, *cond, resolve_use, level),
        render_node(arena, *body, resolve_use, level + 1)
      );
      let tail = render_next(arena, *next, resolve_use, level);
      if !tail.is_empty() {
        out.push('\n');
        out.push_str(&tail);
      }
      out
    }
    Node::ElIf { cond, body, next } => {
      let mut out = format!(
        "{}elif {}:\n{}",
        indent(level),
        render_node(arena, *cond, resolve_use, level),
        render_node(arena, *body, resolve_use, level + 1)
      );
      let tail = render_next(arena, *next, resolve_use, level);
      if !tail.is_empty() {
        out.push('\n');
        out.push_str(&tail);
      }
      out
    }
    Node::Else { body } => format!("{}else:\n{}", indent(level), render_node(arena, *body, resolve_use, level + 1)),
    Node::While { test, body } => {
      format!("while {}:\n{}", render_node(arena, *test, resolve_use, level), render_node(arena, *body, resolve_use, level + 1))
    }
    Node::For { target, iter, body } => format!(
      "for {} in {}:\n{}",
      render_node(arena, *target, resolve_use, level),
      render_node(arena, *iter, resolve_use, level),
      render_node(arena, *body, resolve_use, level + 1)
    ),
    Node::Body { children, .. } => {
      if children.is_empty() {
        format!("{}pass", indent(level))
      } else {
        children
          .iter()
          .map(|&c| format!("{}{}", indent(level), render_node(arena, c, resolve_use, level)))
          .collect::<Vec<_>>()
          .join("\n")
      }
    }
    Node::Empty | Node::Start | Node::End => String::new(),
    Node::Wildcard { wrapped, .. } => render_node(arena, *wrapped, resolve_use, level),
    Node::Use { wrapped, index, .. } => {
      resolve_use(*index).unwrap_or_else(|| render_node(arena, *wrapped, resolve_use, level))
    }
    Node::Opaque { text } => text.clone(),
  }
}

/// `If`/`ElIf`'s `next` slot is `Empty` when there is no following clause,
/// so only `If`/`ElIf`/`Else` get a non-empty tail rendering.
fn render_next(arena: &Arena, id: NodeId, resolve_use: &dyn Fn(u32) -> Option<String>, level: usize) -> String {
  match arena.get(id) {
    Node::Empty => String::new(),
    Node::ElIf { .. } => render_node(arena, id, resolve_use, level),
    Node::Else { .. } => render_node(arena, id, resolve_use, level),
    _ => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::PythonParser;
  use patterndiff_core::SourceParser;

  #[test]
  fn renders_a_simple_assignment() {
    let mut arena = Arena::new();
    let root = PythonParser.parse(&mut arena, "x = 1\n").unwrap();
    let rendered = PythonRenderer.render(&arena, root, &|_| None);
    assert_eq!(rendered.trim(), "x = 1");
  }

  #[test]
  fn renders_an_if_with_a_function_call_body() {
    let mut arena = Arena::new();
    let root = PythonParser.parse(&mut arena, "if x > 10:\n    f(x)\n").unwrap();
    let rendered = PythonRenderer.render(&arena, root, &|_| None);
    assert!(rendered.contains("if x > 10:"));
    assert!(rendered.contains("f(x)"));
  }

  #[test]
  fn use_node_renders_its_resolved_text() {
    let mut arena = Arena::new();
    let wrapped = arena.alloc(Node::Empty);
    let use_node = arena.alloc(Node::Use { wrapped, source: patterndiff_core::OpKind::Update, index: 7 });
    let rendered = PythonRenderer.render(&arena, use_node, &|idx| (idx == 7).then(|| "y + 1".to_string()));
    assert_eq!(rendered, "y + 1");
  }
}
