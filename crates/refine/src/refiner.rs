//! The pattern refiner: repeatedly fuses the two nearest mined
//! patterns in a collection into one more general pattern, by replacing the
//! parts where they differ with linked `Wildcard`/`Use` placeholders.
//!
//! Every step below that needs to compare or splice nodes from two
//! different patterns first brings them into one shared, temporary
//! [`Fusion`] arena (see [`crate::merge`]) -- the arena-of-handles design
//! means a `NodeId` from one pattern's arena can't be compared against one
//! from another's directly.

use std::collections::{HashMap, VecDeque};

use patterndiff_core::meta_var::IndexAllocator;
use patterndiff_core::node::{self, Order};
use patterndiff_core::{Arena, Differencer, EditScript, Node, NodeId, Op, OpKind, Pairing, Pattern};

use crate::error::RefineError;
use crate::merge::clone_subtree;
use crate::optimiser::{self, Optimiser};

/// `first`/`second`'s original and modified trees, all reachable from one
/// shared [`Arena`]. `first`'s ids are unchanged from its own pattern;
/// `second`'s subtrees and pairing have been deep-copied and remapped in.
struct Fusion {
  arena: Arena,
  first_original: NodeId,
  first_modified: NodeId,
  second_original: NodeId,
  second_modified: NodeId,
  first_pairing: Pairing,
  second_pairing: Pairing,
}

fn build_fusion(first: &Pattern, second: &Pattern) -> Fusion {
  let mut arena = first.arena.clone();
  let mut memo: HashMap<NodeId, NodeId> = HashMap::new();

  let second_original = clone_subtree(&mut arena, &second.arena, second.original, &mut memo);
  let second_modified = clone_subtree(&mut arena, &second.arena, second.modified, &mut memo);

  let second_pairing = second
    .pairing
    .iter()
    .filter_map(|(&(a, b), &score)| match (memo.get(&a), memo.get(&b)) {
      (Some(&a), Some(&b)) => Some(((a, b), score)),
      _ => None,
    })
    .collect();

  Fusion {
    arena,
    first_original: first.original,
    first_modified: first.modified,
    second_original,
    second_modified,
    first_pairing: first.pairing.clone(),
    second_pairing,
  }
}

/// A not-yet-linked wildcard or use placeholder: which pre-order position
/// in the relevant stream it replaces, the node it wraps (for the linking
/// lookup), and which edit operation produced it.
struct Pending {
  stream_index: usize,
  wrapped: NodeId,
  source: OpKind,
  node_id: NodeId,
}

enum Placeholder {
  Wildcard,
  Use,
}

fn pending_from_edit_script(arena: &mut Arena, script: &EditScript, stream: &[NodeId], kind: Placeholder) -> Vec<Pending> {
  let mut out = Vec::with_capacity(script.ops().len());
  for op in script.ops() {
    let (stream_index, wrapped, source) = match op {
      Op::Insert { index, subtree } => (*index, subtree[0], OpKind::Insert),
      Op::Delete { index } => (*index, stream[*index], OpKind::Delete),
      Op::Update { index, .. } => (*index, stream[*index], OpKind::Update),
    };
    let node_id = match kind {
      Placeholder::Wildcard => arena.alloc(Node::Wildcard { wrapped, source, index: 0 }),
      Placeholder::Use => arena.alloc(Node::Use { wrapped, source, index: 0 }),
    };
    out.push(Pending { stream_index, wrapped, source, node_id });
  }
  out
}

fn pairing_counterpart(pairing: &Pairing, wrapped: NodeId) -> Option<NodeId> {
  pairing.iter().find_map(|(&(a, b), _)| {
    if a == wrapped {
      Some(b)
    } else if b == wrapped {
      Some(a)
    } else {
      None
    }
  })
}

/// Links each wildcard to the `Use` wrapping its paired counterpart,
/// assigning both a freshly allocated shared index. A
/// wildcard with no counterpart use is left at index 0, meaning "not yet
/// connected" -- its `Update` op is simply omitted from the edit script
/// spliced back in, so that position keeps its original node.
fn connect_wildcards_and_uses(arena: &mut Arena, alloc: &mut IndexAllocator, wildcards: &mut [Pending], uses: &mut [Pending], first_pairing: &Pairing, second_pairing: &Pairing) {
  for wildcard in wildcards.iter_mut() {
    let pairing = match wildcard.source {
      OpKind::Insert => second_pairing,
      OpKind::Delete | OpKind::Update => first_pairing,
    };
    let Some(counterpart) = pairing_counterpart(pairing, wildcard.wrapped) else { continue };
    let Some(use_pending) = uses.iter_mut().find(|u| u.wrapped == counterpart) else { continue };

    let index = alloc.alloc();
    if let Node::Wildcard { index: slot, .. } = arena.get_mut(wildcard.node_id) {
      *slot = index;
    }
    if let Node::Use { index: slot, .. } = arena.get_mut(use_pending.node_id) {
      *slot = index;
    }
  }
}

fn linked_index(arena: &Arena, node_id: NodeId) -> u32 {
  match arena.get(node_id) {
    Node::Wildcard { index, .. } | Node::Use { index, .. } => *index,
    _ => 0,
  }
}

fn splice_linked(stream: Vec<NodeId>, arena: &mut Arena, pending: &[Pending]) -> Result<Vec<NodeId>, RefineError> {
  let ops = pending
    .iter()
    .filter(|p| linked_index(arena, p.node_id) != 0)
    .map(|p| Op::Update { index: p.stream_index, replacement: p.node_id })
    .collect();
  Ok(EditScript::new(ops).apply_to_stream(arena, stream)?)
}

/// Fuses the two nearest mined patterns in a store into one more general
/// pattern. Stops when at most `min_count` patterns remain, or when the
/// closest remaining pair's edit distance is at or beyond `max_distance`.
/// Mirrors `PatternRefiner`.
pub struct Refiner {
  differencer: Differencer,
  sim_threshold: f64,
  min_count: usize,
  max_distance: Option<usize>,
  optimisers: Vec<Box<dyn Optimiser>>,
}

impl Refiner {
  pub fn new(differencer: Differencer, sim_threshold: f64, min_count: usize, max_distance: Option<usize>) -> Self {
    Self { differencer, sim_threshold, min_count: min_count.max(1), max_distance, optimisers: Vec::new() }
  }

  pub fn with_optimisers(mut self, optimisers: Vec<Box<dyn Optimiser>>) -> Self {
    self.optimisers = optimisers;
    self
  }

  fn distance(&self, first: &Pattern, second: &Pattern) -> Result<usize, RefineError> {
    let fusion = build_fusion(first, second);
    let org_pairing = self.differencer.connect_nodes(&fusion.arena, fusion.first_original, fusion.second_original);
    let mod_pairing = self.differencer.connect_nodes(&fusion.arena, fusion.first_modified, fusion.second_modified);
    let org_script = EditScript::generate(&fusion.arena, fusion.first_original, fusion.second_original, &org_pairing, self.sim_threshold);
    let mod_script = EditScript::generate(&fusion.arena, fusion.first_modified, fusion.second_modified, &mod_pairing, self.sim_threshold);
    let org_size = org_script.size(&fusion.arena, fusion.first_original)?;
    let mod_size = mod_script.size(&fusion.arena, fusion.first_modified)?;
    Ok(org_size + mod_size)
  }

  /// Finds the two nearest patterns by recomputing every pairwise distance
  /// fresh, matching `find_nearest_patterns`'s behavior of not caching
  /// distances across refinement rounds.
  fn find_nearest(&self, patterns: &[Pattern]) -> Result<Option<(usize, usize, usize)>, RefineError> {
    let mut best: Option<(usize, usize, usize)> = None;
    for i in 0..patterns.len() {
      for j in (i + 1)..patterns.len() {
        let distance = self.distance(&patterns[i], &patterns[j])?;
        let is_better = match best {
          Some((_, _, best_distance)) => distance < best_distance,
          None => true,
        };
        if is_better {
          best = Some((i, j, distance));
        }
      }
    }
    Ok(best)
  }

  fn fuse(&self, first: &Pattern, second: &Pattern) -> Result<Pattern, RefineError> {
    let mut fusion = build_fusion(first, second);
    let mut alloc = IndexAllocator::new();

    let org_pairing = self.differencer.connect_nodes(&fusion.arena, fusion.first_original, fusion.second_original);
    let org_script = EditScript::generate(&fusion.arena, fusion.first_original, fusion.second_original, &org_pairing, self.sim_threshold);
    let first_original_stream = node::walk(&fusion.arena, fusion.first_original, Order::Pre);
    let mut wildcards = pending_from_edit_script(&mut fusion.arena, &org_script, &first_original_stream, Placeholder::Wildcard);

    let mod_pairing = self.differencer.connect_nodes(&fusion.arena, fusion.first_modified, fusion.second_modified);
    let mod_script = EditScript::generate(&fusion.arena, fusion.first_modified, fusion.second_modified, &mod_pairing, self.sim_threshold);
    let first_modified_stream = node::walk(&fusion.arena, fusion.first_modified, Order::Pre);
    let mut uses = pending_from_edit_script(&mut fusion.arena, &mod_script, &first_modified_stream, Placeholder::Use);

    connect_wildcards_and_uses(&mut fusion.arena, &mut alloc, &mut wildcards, &mut uses, &fusion.first_pairing, &fusion.second_pairing);

    let mut original_stream = splice_linked(first_original_stream, &mut fusion.arena, &wildcards)?;
    let mut modified_stream = splice_linked(first_modified_stream, &mut fusion.arena, &uses)?;

    optimiser::run_chain(&self.optimisers, &mut fusion.arena, &mut alloc, &mut original_stream, &mut modified_stream);

    let mut original_queue: VecDeque<NodeId> = original_stream.into_iter().collect();
    let new_original = node::reconstruct(&mut fusion.arena, &mut original_queue);
    let mut modified_queue: VecDeque<NodeId> = modified_stream.into_iter().collect();
    let new_modified = node::reconstruct(&mut fusion.arena, &mut modified_queue);

    let pairing = self.differencer.connect_nodes(&fusion.arena, new_original, new_modified);

    Ok(Pattern { arena: fusion.arena, original: new_original, modified: new_modified, pairing })
  }

  /// Runs the refinement loop to a fixed point, returning the generalised
  /// pattern set. Mirrors `PatternRefiner.refine`.
  pub fn refine(&self, mut patterns: Vec<Pattern>) -> Result<Vec<Pattern>, RefineError> {
    loop {
      if patterns.len() <= self.min_count {
        break;
      }

      let Some((i, j, distance)) = self.find_nearest(&patterns)? else { break };
      if let Some(max_distance) = self.max_distance {
        if distance >= max_distance {
          break;
        }
      }

      tracing::info!(distance, remaining = patterns.len(), "fusing nearest pattern pair");

      let fused = self.fuse(&patterns[i], &patterns[j])?;

      let (hi, lo) = if i > j { (i, j) } else { (j, i) };
      patterns.remove(hi);
      patterns.remove(lo);
      patterns.push(fused);
    }

    Ok(patterns)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use patterndiff_core::ConstKind;

  fn assign(arena: &mut Arena, name: &str, literal: &str) -> NodeId {
    let target = arena.alloc(Node::Variable { name: name.into() });
    let value = arena.alloc(Node::Constant { literal: literal.into(), kind: ConstKind::Number });
    arena.alloc(Node::Assign { target, op: "=".into(), value })
  }

  fn pattern_from(name: &str, original_literal: &str, modified_literal: &str) -> Pattern {
    let mut arena = Arena::new();
    let original = assign(&mut arena, name, original_literal);
    let modified = assign(&mut arena, name, modified_literal);
    let differencer = Differencer::default();
    let pairing = differencer.connect_nodes(&arena, original, modified);
    Pattern { arena, original, modified, pairing }
  }

  #[test]
  fn stops_once_min_count_is_reached() {
    let patterns = vec![pattern_from("x", "1", "2"), pattern_from("y", "3", "4")];
    let refiner = Refiner::new(Differencer::default(), 0.5, 2, None);
    let refined = refiner.refine(patterns).unwrap();
    assert_eq!(refined.len(), 2);
  }

  #[test]
  fn fuses_two_similar_patterns_down_to_one() {
    let patterns = vec![pattern_from("x", "1", "2"), pattern_from("x", "3", "4")];
    let refiner = Refiner::new(Differencer::default(), 0.5, 1, None);
    let refined = refiner.refine(patterns).unwrap();
    assert_eq!(refined.len(), 1);
  }

  #[test]
  fn max_distance_stops_refinement_early() {
    let patterns = vec![pattern_from("x", "1", "2"), pattern_from("y", "3", "4")];
    let refiner = Refiner::new(Differencer::default(), 0.5, 1, Some(0));
    let refined = refiner.refine(patterns).unwrap();
    assert_eq!(refined.len(), 2);
  }
}
