//! The tree differencer: connects nodes in an `original`/
//! `modified` pair of trees by iteratively refining a similarity pairing map
//! until it converges, then collapsing it to a one-to-one matching.
//!
//! Leaf pairs seed the map, a bottom-up pass scores every inner-node pair
//! from the (now partially known) similarity of their descendants, and a
//! top-down pass re-weights each pair by how much of its parents' combined
//! "belief" it accounts for (a softmax over every pair touching either
//! node), decaying pairs whose parents don't agree. Bottom-up and top-down
//! alternate for up to `iterations` rounds (a hard cap), stopping
//! early the first round that leaves the pairing map unchanged.

use crate::arena::{Arena, NodeId};
use crate::node::{self, Order};
use crate::pairing::{self, Pairing};

/// `f` is the minimum similarity for a candidate pair to be recorded at
/// all; `iterations` bounds the bottom-up/top-down alternation. The
/// original implementation hardcodes both (`f=0.1`, 1000 rounds); both are
/// exposed here so [`crate::pattern::PatternCreator`] callers and the
/// mining config can tune them without forking the algorithm.
#[derive(Debug, Clone, Copy)]
pub struct Differencer {
  pub f: f64,
  pub iterations: usize,
}

impl Default for Differencer {
  fn default() -> Self {
    Self { f: 0.1, iterations: 1000 }
  }
}

impl Differencer {
  pub fn new(f: f64, iterations: usize) -> Self {
    Self { f, iterations }
  }

  /// Produces a deduplicated one-to-one [`Pairing`] between `original` and
  /// `modified`. This is the map the edit-script generator and the matcher
  /// both consume.
  pub fn connect_nodes(&self, arena: &Arena, original: NodeId, modified: NodeId) -> Pairing {
    let post_org = node::walk(arena, original, Order::Post);
    let post_mod = node::walk(arena, modified, Order::Post);
    let in_org = node::walk(arena, original, Order::Pre);
    let in_mod = node::walk(arena, modified, Order::Pre);

    let mut pairs = self.init_leaf_pairs(arena, &post_org, &post_mod);

    for _ in 0..self.iterations {
      let before = pairs.clone();
      self.bottom_up(arena, &post_org, &post_mod, &mut pairs);
      self.top_down(arena, &in_org, &in_mod, &mut pairs);
      if pairs == before {
        break;
      }
    }

    pairing::remove_duplicates(&pairs)
  }

  fn init_leaf_pairs(&self, arena: &Arena, post_org: &[NodeId], post_mod: &[NodeId]) -> Pairing {
    let mut pairs = Pairing::new();
    let leaves_first: Vec<NodeId> = post_org.iter().copied().filter(|&x| arena.get(x).is_leaf()).collect();
    let leaves_second: Vec<NodeId> = post_mod.iter().copied().filter(|&y| arena.get(y).is_leaf()).collect();
    for &x in &leaves_first {
      for &y in &leaves_second {
        let sim = node::similarity(arena, x, y, &pairs);
        if sim > self.f {
          pairs.insert((x, y), sim);
        }
      }
    }
    pairs
  }

  fn bottom_up(&self, arena: &Arena, post_org: &[NodeId], post_mod: &[NodeId], pairs: &mut Pairing) {
    let inner_first: Vec<NodeId> = post_org.iter().copied().filter(|&x| !arena.get(x).is_leaf()).collect();
    let inner_second: Vec<NodeId> = post_mod.iter().copied().filter(|&y| !arena.get(y).is_leaf()).collect();
    for &x in &inner_first {
      for &y in &inner_second {
        let sim = node::similarity(arena, x, y, pairs);
        if sim > self.f {
          pairs.insert((x, y), sim);
        }
      }
    }
  }

  fn top_down(&self, arena: &Arena, in_org: &[NodeId], in_mod: &[NodeId], pairs: &mut Pairing) {
    let inner_first: Vec<NodeId> = in_org.iter().copied().filter(|&x| !arena.get(x).is_leaf()).collect();
    let inner_second: Vec<NodeId> = in_mod.iter().copied().filter(|&y| !arena.get(y).is_leaf()).collect();

    for &x in &inner_first {
      for &y in &inner_second {
        let current_sim = parent_sim_softmax(x, y, pairs);
        if current_sim < 0.0 {
          continue;
        }
        let children_x = arena.get(x).children();
        let children_y = arena.get(y).children();
        for &child_x in &children_x {
          for &child_y in &children_y {
            let children_sim = pairs.get(&(child_x, child_y)).copied().unwrap_or(0.0);
            if children_sim == 0.0 {
              continue;
            }
            let mean = arithmetic_mean(current_sim, children_sim);
            if mean <= self.f {
              pairs.remove(&(child_x, child_y));
            } else {
              pairs.insert((child_x, child_y), mean);
            }
          }
        }
      }
    }
  }
}

fn arithmetic_mean(x: f64, y: f64) -> f64 {
  (x + y) / 2.0
}

/// Unused in the current differencer but kept as a documented alternative
/// to `arithmetic_mean`: the original source defines it but never calls it.
#[allow(dead_code)]
fn harmonic_mean(x: f64, y: f64) -> f64 {
  (2.0 * x * y) / (x + y)
}

/// How much of the combined "belief" touching either `first` or `second`
/// the specific pair `(first, second)` accounts for. Pairs with no entry in
/// `pairs` softmax to a weight of 1 against themselves (`exp(0) == 1`),
/// which the original treats as "no real signal" and maps to 0 rather than
/// a genuine small positive softmax weight.
fn parent_sim_softmax(first: NodeId, second: NodeId, pairs: &Pairing) -> f64 {
  let own = pairs.get(&(first, second)).copied().unwrap_or(0.0);
  let parents_sim = own.exp();
  if parents_sim == 1.0 {
    return 0.0;
  }
  let others_sim: f64 = pairs
    .iter()
    .filter(|((a, b), _)| *a == first || *b == second)
    .map(|(_, v)| v.exp())
    .sum();
  parents_sim / others_sim
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
  fn identical_trees_pair_every_node() {
    let mut arena = Arena::new();
    let a = assign(&mut arena, "x", "1");
    let b = assign(&mut arena, "x", "1");

    let differ = Differencer::new(0.1, 5);
    let pairs = differ.connect_nodes(&arena, a, b);

    assert!(pairs.contains_key(&(a, b)));
    assert_eq!(pairs.get(&(a, b)), Some(&1.0));
  }

  #[test]
  fn unrelated_trees_yield_no_strong_pairs() {
    let mut arena = Arena::new();
    let a = assign(&mut arena, "x", "1");
    let call_args = Vec::new();
    let callee = arena.alloc(Node::FunctionName { name: "unrelated".into() });
    let start = arena.alloc(Node::Start);
    let end = arena.alloc(Node::End);
    let b = arena.alloc(Node::Function { callee, args: call_args, start, end });

    let differ = Differencer::new(0.1, 5);
    let pairs = differ.connect_nodes(&arena, a, b);
    assert!(!pairs.contains_key(&(a, b)));
  }
}
