//! Match emitters: the one-method `parse(match)` interface each of
//! `Counter`, `Xml` and `Readable` implements. A fourth, `Recommendation`,
//! renders the raw rewrite per hit with no line-merging, for programmatic
//! (e.g. JSON) consumers.

use std::collections::HashMap;

use patterndiff_core::{HostDocument, Hit};

use crate::render::Renderer;

fn render_hit(hit: &Hit<'_>, doc: &HostDocument, renderer: &dyn Renderer) -> String {
  let mut blocks_text: HashMap<u32, String> = HashMap::new();
  for (index, captured) in hit.blocks.iter() {
    let joined = captured
      .iter()
      .map(|&id| renderer.render(&doc.arena, id, &|_| None))
      .collect::<Vec<_>>()
      .join("; ");
    blocks_text.insert(index, joined);
  }
  renderer.render(&hit.pattern.arena, hit.pattern.modified, &|idx| blocks_text.get(&idx).cloned())
}

fn line_range(hit: &Hit<'_>, doc: &HostDocument) -> (usize, usize) {
  let start = doc.line_span(hit.root).map(|s| s.start_line).unwrap_or(1);
  let end = doc.line_span(hit.end).map(|s| s.end_line).unwrap_or(start);
  (start, end)
}

/// The `parse(match)` interface every emitter implements.
pub trait Emitter {
  fn parse(&mut self, hit: &Hit<'_>, doc: &HostDocument, renderer: &dyn Renderer);
}

/// Just counts matches. Mirrors `CounterPatternParser`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CounterEmitter {
  count: usize,
}

impl CounterEmitter {
  pub fn count(&self) -> usize {
    self.count
  }
}

impl Emitter for CounterEmitter {
  fn parse(&mut self, _hit: &Hit<'_>, _doc: &HostDocument, _renderer: &dyn Renderer) {
    self.count += 1;
  }
}

/// One reported change per match, keeping the original line range and the
/// rendered replacement. Shared by [`XmlEmitter`] and [`RecommendationEmitter`].
#[derive(Debug, Clone)]
pub struct Change {
  pub start_line: usize,
  pub end_line: usize,
  pub change_code: String,
}

/// Emits one `<change start_line=".." end_line=".." change_code="..">` per
/// match. Mirrors `XMLPatternParser`.
#[derive(Debug, Default, Clone)]
pub struct XmlEmitter {
  changes: Vec<Change>,
}

impl XmlEmitter {
  pub fn changes(&self) -> &[Change] {
    &self.changes
  }

  fn escape(text: &str) -> String {
    text
      .replace('&', "&amp;")
      .replace('<', "&lt;")
      .replace('>', "&gt;")
      .replace('"', "&quot;")
  }

  pub fn to_xml(&self) -> String {
    let mut out = String::from("<changes>\n");
    for change in &self.changes {
      out.push_str(&format!(
        "  <change start_line=\"{}\" end_line=\"{}\" change_code=\"{}\"/>\n",
        change.start_line,
        change.end_line,
        Self::escape(&change.change_code)
      ));
    }
    out.push_str("</changes>\n");
    out
  }
}

impl Emitter for XmlEmitter {
  fn parse(&mut self, hit: &Hit<'_>, doc: &HostDocument, renderer: &dyn Renderer) {
    let (start_line, end_line) = line_range(hit, doc);
    let change_code = render_hit(hit, doc, renderer);
    self.changes.push(Change { start_line, end_line, change_code });
  }
}

/// Collects the raw rewrite per hit with no line-merge -- useful for
/// programmatic consumers (e.g. the CLI's JSON output) that want the bare
/// recommendation rather than a line-merged diff. Mirrors
/// `StoreRecommendationsPatternParser`.
#[derive(Debug, Default, Clone)]
pub struct RecommendationEmitter {
  changes: Vec<Change>,
}

impl RecommendationEmitter {
  pub fn changes(&self) -> &[Change] {
    &self.changes
  }
}

impl Emitter for RecommendationEmitter {
  fn parse(&mut self, hit: &Hit<'_>, doc: &HostDocument, renderer: &dyn Renderer) {
    let (start_line, end_line) = line_range(hit, doc);
    let change_code = render_hit(hit, doc, renderer);
    self.changes.push(Change { start_line, end_line, change_code });
  }
}

/// Merges every hit's rendered replacement back into the original source by
/// line, preserving the leading indentation of the line it replaces.
/// Mirrors `ReadablePatternParser`/`get_recommended_code`.
#[derive(Debug, Default, Clone)]
pub struct ReadableEmitter {
  changes: Vec<Change>,
}

impl Emitter for ReadableEmitter {
  fn parse(&mut self, hit: &Hit<'_>, doc: &HostDocument, renderer: &dyn Renderer) {
    let (start_line, end_line) = line_range(hit, doc);
    let change_code = render_hit(hit, doc, renderer);
    self.changes.push(Change { start_line, end_line, change_code });
  }
}

impl ReadableEmitter {
  pub fn changes(&self) -> &[Change] {
    &self.changes
  }

  /// Re-renders `original_source` with every recorded hit's line range
  /// collapsed to a single replacement line, indented to match whatever the
  /// first replaced line was indented with.
  pub fn get_recommended_code(&self, original_source: &str) -> String {
    let lines: Vec<&str> = original_source.lines().collect();
    let mut out = Vec::with_capacity(lines.len());
    let mut i = 0usize;
    while i < lines.len() {
      let lineno = i + 1;
      if let Some(change) = self.changes.iter().find(|c| c.start_line == lineno) {
        let indent: String = lines[i].chars().take_while(|c| c.is_whitespace()).collect();
        out.push(format!("{indent}{}", change.change_code));
        i = change.end_line.max(lineno);
      } else {
        out.push(lines[i].to_string());
      }
      i += 1;
    }
    out.join("\n")
  }
}
