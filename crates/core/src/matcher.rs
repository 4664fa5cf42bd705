//! Streaming matcher & recommender: scans a host AST's pre-order stream
//! against every subscribed pattern. A `Recommender`/listener hierarchy
//! (factory listeners spawning active listeners, active listeners reporting
//! hits back up) is the natural shape for this, reimplemented here as a
//! flat state machine rather than a class hierarchy -- see the "observer
//! loop without callbacks" design note below.
//!
//! The exact bookkeeping of `counter`/`timeout` below is this crate's own,
//! chosen to keep the matcher both sound (no false hits) and complete (no
//! missed ones) under the snapshot-iteration rule described below.

use std::collections::HashMap;
use std::rc::Rc;

use crate::arena::{Arena, NodeId};
use crate::meta_var::WildcardBlocks;
use crate::node::{self, Node, Order};
use crate::pattern::Pattern;

/// A source line range, 1-indexed, inclusive on both ends. Populated by the
/// host-language wrapper (e.g. `patterndiff-lang`) from tree-sitter row
/// info; the core model itself carries no position data, so this lives
/// alongside the host arena rather than inside `Node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
  pub start_line: usize,
  pub end_line: usize,
}

/// A parsed query document: the host arena plus whatever the wrapper knows
/// about where each node came from in the original source text. This is
/// what `Recommender` scans and what the emitters in `patterndiff-store`
/// read back from to render a match.
#[derive(Debug, Clone, Default)]
pub struct HostDocument {
  pub arena: Arena,
  pub source: String,
  pub lines: HashMap<NodeId, LineSpan>,
}

impl HostDocument {
  pub fn new(arena: Arena, source: String) -> Self {
    Self { arena, source, lines: HashMap::new() }
  }

  pub fn stream(&self, root: NodeId) -> Vec<NodeId> {
    node::walk(&self.arena, root, Order::Pre)
  }

  pub fn line_span(&self, id: NodeId) -> Option<LineSpan> {
    self.lines.get(&id).copied()
  }
}

/// A single emitted match: which pattern fired, the host node the match
/// started and ended on (for the emitters' line-range reporting), and the
/// query subtrees each of the pattern's wildcards absorbed.
#[derive(Debug, Clone)]
pub struct Hit<'p> {
  pub pattern: &'p Pattern,
  pub root: NodeId,
  pub end: NodeId,
  pub blocks: WildcardBlocks,
}

#[derive(Clone)]
struct ActiveMatch<'p> {
  pattern: &'p Pattern,
  stream: Rc<Vec<NodeId>>,
  /// Index into `stream` of the next pattern position requiring a match.
  counter: usize,
  /// Remaining host ticks to silently skip while a wildcard absorbs a
  /// subtree (`num_children` of the node it started absorbing at).
  timeout: usize,
  root: NodeId,
  last_real: NodeId,
  blocks: HashMap<u32, Vec<NodeId>>,
}

enum ListenerState<'p> {
  Factory { pattern: &'p Pattern, stream: Rc<Vec<NodeId>> },
  Active(ActiveMatch<'p>),
}

enum Step<'p> {
  Continue,
  Spawn(ListenerState<'p>),
  Emit(Hit<'p>),
  Unsubscribe,
}

fn wildcard_index(node: &Node) -> Option<u32> {
  match node {
    Node::Wildcard { index, .. } => Some(*index),
    _ => None,
  }
}

fn is_sentinel(node: &Node) -> bool {
  matches!(node, Node::Start | Node::End)
}

impl<'p> ActiveMatch<'p> {
  fn step(&mut self, host: &Arena, node_id: NodeId) -> Step<'p> {
    if self.timeout > 0 {
      self.timeout -= 1;
      return Step::Continue;
    }

    let pattern_arena = &self.pattern.arena;
    let pat_id = self.stream[self.counter];
    let pat_node = pattern_arena.get(pat_id);

    // A wildcard position is checked before the general `equals_cross`
    // comparison: `equals_cross` already treats a pattern-side wildcard as
    // equal to anything, which would otherwise swallow this branch and
    // skip absorption entirely (the wildcard would "match" one node and
    // advance past it like any other leaf, instead of potentially
    // absorbing a whole subtree).
    if let Some(index) = wildcard_index(pat_node) {
      let lookahead = self.counter + 1;
      if lookahead < self.stream.len()
        && node::equals_cross(pattern_arena, self.stream[lookahead], host, node_id)
      {
        // The wildcard absorbed nothing more; the following pattern
        // position matches the current host node directly.
        self.last_real = node_id;
        self.counter += 2;
      } else {
        self.blocks.entry(index).or_default().push(node_id);
        self.timeout = node::num_children(host, node_id);
        self.last_real = node_id;
      }
    } else if node::equals_cross(pattern_arena, pat_id, host, node_id) {
      if !is_sentinel(pat_node) {
        self.last_real = node_id;
      }
      self.counter += 1;
    } else {
      return Step::Unsubscribe;
    }

    if self.counter >= self.stream.len() {
      let mut blocks = WildcardBlocks::new();
      for (&index, captured) in self.blocks.iter() {
        blocks.bind(index, captured.clone());
      }
      Step::Emit(Hit { pattern: self.pattern, root: self.root, end: self.last_real, blocks })
    } else {
      Step::Continue
    }
  }
}

/// Scans a host document's pre-order stream, one subscribed [`Pattern`] at a
/// time per factory listener, and returns every completed match.
pub struct Recommender<'p> {
  host: &'p Arena,
  stream: Vec<NodeId>,
  listeners: Vec<ListenerState<'p>>,
}

impl<'p> Recommender<'p> {
  pub fn new(doc: &'p HostDocument, root: NodeId) -> Self {
    Self { host: &doc.arena, stream: doc.stream(root), listeners: Vec::new() }
  }

  /// Subscribes a pattern's factory listener. Precomputes the pattern's
  /// original-side pre-order stream once, shared by every match this
  /// pattern later spawns.
  pub fn subscribe(&mut self, pattern: &'p Pattern) {
    let stream = Rc::new(node::walk(&pattern.arena, pattern.original, Order::Pre));
    self.listeners.push(ListenerState::Factory { pattern, stream });
  }

  /// Runs the scan to completion, notifying listeners in subscription order
  /// and iterating a per-tick snapshot so a listener spawned this tick is
  /// not itself notified until the next one.
  pub fn run(mut self) -> Vec<Hit<'p>> {
    let mut hits = Vec::new();

    for index in 0..self.stream.len() {
      let node_id = self.stream[index];
      let snapshot_len = self.listeners.len();
      let mut spawned = Vec::new();
      let mut remove = vec![false; snapshot_len];

      for i in 0..snapshot_len {
        let step = match &mut self.listeners[i] {
          ListenerState::Factory { pattern, stream } => {
            // Position 2: first real node after the `Body, Start` prelude.
            if stream.len() > 2 && node::equals_cross(&pattern.arena, stream[2], self.host, node_id) {
              Step::Spawn(ListenerState::Active(ActiveMatch {
                pattern: *pattern,
                stream: Rc::clone(stream),
                counter: 3,
                timeout: 0,
                root: node_id,
                last_real: node_id,
                blocks: HashMap::new(),
              }))
            } else {
              Step::Continue
            }
          }
          ListenerState::Active(active) => active.step(self.host, node_id),
        };

        match step {
          Step::Continue => {}
          Step::Spawn(listener) => spawned.push(listener),
          Step::Emit(hit) => {
            hits.push(hit);
            remove[i] = true;
          }
          Step::Unsubscribe => remove[i] = true,
        }
      }

      let mut kept = Vec::with_capacity(snapshot_len + spawned.len());
      for (i, listener) in self.listeners.drain(..).enumerate() {
        if !remove[i] {
          kept.push(listener);
        }
      }
      kept.extend(spawned);
      self.listeners = kept;
    }

    hits
  }
}
